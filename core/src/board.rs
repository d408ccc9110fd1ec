//! Board primitives: construction, mine placement, flood-fill reveal and flag
//! bookkeeping. The rules engine reads boards but never builds cells itself.

use alloc::collections::VecDeque;
use core::ops::Index;

use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// A single grid cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    pub x: Coord,
    pub y: Coord,
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub adjacent_mines: u8,
}

impl CellState {
    pub const fn coords(&self) -> Coord2 {
        (self.x, self.y)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Result of revealing one cell, including any cascade.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Safe cells newly revealed by this call.
    pub revealed: CellCount,
    /// Adjacent mine count of the clicked cell.
    pub adjacent_mines: u8,
    pub hit_mine: bool,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        self.hit_mine || self.revealed > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<CellState>,
}

impl Board {
    pub fn empty(width: Coord, height: Coord) -> Self {
        let cells = Array2::from_shape_fn([width.into(), height.into()], |(x, y)| CellState {
            x: x as Coord,
            y: y as Coord,
            ..Default::default()
        });
        Self { cells }
    }

    pub fn width(&self) -> Coord {
        self.cells.dim().0 as Coord
    }

    pub fn height(&self) -> Coord {
        self.cells.dim().1 as Coord
    }

    pub fn size(&self) -> Coord2 {
        (self.width(), self.height())
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.width(), self.height())
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (width, height) = self.size();
        if coords.0 < width && coords.1 < height {
            Ok(coords)
        } else {
            Err(RulesError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<&CellState> {
        self.cells.get(coords.to_nd_index())
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellState> {
        self.cells.iter()
    }

    pub fn neighbors(&self, coords: Coord2) -> impl Iterator<Item = &CellState> {
        moore_neighbors(coords, self.size()).map(|pos| &self[pos])
    }

    pub fn mine_count(&self) -> CellCount {
        self.cells().filter(|cell| cell.is_mine).count() as CellCount
    }

    /// Number of flagged cells.
    pub fn count_flags(&self) -> CellCount {
        self.cells().filter(|cell| cell.is_flagged).count() as CellCount
    }

    /// Number of revealed cells, mines included.
    pub fn count_revealed(&self) -> CellCount {
        self.cells().filter(|cell| cell.is_revealed).count() as CellCount
    }

    /// Number of revealed cells that are not mines.
    pub fn count_revealed_safe(&self) -> CellCount {
        self.cells().filter(|cell| cell.is_revealed && !cell.is_mine).count() as CellCount
    }

    /// Places `mines` mines at random. When `safe_cell` is given, that cell is
    /// kept free and so are its neighbours if the board has room. Returns the
    /// number of mines actually placed.
    pub fn place_mines(&mut self, mines: CellCount, safe_cell: Option<Coord2>, seed: u64) -> CellCount {
        use rand::prelude::*;

        let size = self.size();
        let total_cells = self.total_cells();

        let mut excluded: HashSet<Coord2> = HashSet::new();
        if let Some(safe) = safe_cell.filter(|&pos| self.validate_coords(pos).is_ok()) {
            if mines + 1 > total_cells {
                log::warn!("Cannot keep first click safe, placing {} mines at random", mines);
            } else {
                excluded.insert(safe);
                let neighbors: Vec<_> = moore_neighbors(safe, size).collect();
                if usize::from(mines) + 1 + neighbors.len() <= usize::from(total_cells) {
                    excluded.extend(neighbors);
                } else {
                    log::warn!("Cannot keep first click neighbourhood clear, only the cell itself is safe");
                }
            }
        }

        let mut candidates: Vec<Coord2> = self
            .cells()
            .map(CellState::coords)
            .filter(|pos| !excluded.contains(pos))
            .collect();

        let wanted = usize::from(mines).min(candidates.len());
        if wanted < usize::from(mines) {
            log::warn!(
                "Board already full, requested {} mines but only fits {}",
                mines,
                candidates.len()
            );
        }

        // partial Fisher-Yates, the first `wanted` entries become mines
        let mut rng = SmallRng::seed_from_u64(seed);
        for i in 0..wanted {
            let j = rng.random_range(i..candidates.len());
            candidates.swap(i, j);
        }
        for &pos in &candidates[..wanted] {
            self.cells[pos.to_nd_index()].is_mine = true;
        }

        self.recount_adjacent();
        wanted as CellCount
    }

    /// Marks the given cells as mines, ignoring out-of-bounds entries.
    pub fn set_mines(&mut self, mines: &[Coord2]) {
        for &pos in mines {
            if let Some(cell) = self.cells.get_mut(pos.to_nd_index()) {
                cell.is_mine = true;
            }
        }
        self.recount_adjacent();
    }

    fn recount_adjacent(&mut self) {
        let size = self.size();
        let counts = Array2::from_shape_fn(self.cells.dim(), |(x, y)| {
            moore_neighbors((x as Coord, y as Coord), size)
                .filter(|&pos| self.cells[pos.to_nd_index()].is_mine)
                .count() as u8
        });
        for (cell, &count) in self.cells.iter_mut().zip(counts.iter()) {
            cell.adjacent_mines = count;
        }
    }

    /// Reveals a cell. With `cascade` on, zero cells flood-fill outward.
    ///
    /// Flagged and already revealed cells are left alone. A mine is reported
    /// through [`RevealOutcome::hit_mine`] and stays hidden, the caller decides
    /// whether that ends the game.
    pub fn reveal_cell(&mut self, coords: Coord2, cascade: bool) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        let cell = self[coords];

        if cell.is_revealed || cell.is_flagged {
            return Ok(RevealOutcome::default());
        }

        if cell.is_mine {
            log::debug!("Mine hit at {:?}", coords);
            return Ok(RevealOutcome {
                revealed: 0,
                adjacent_mines: cell.adjacent_mines,
                hit_mine: true,
            });
        }

        self.cells[coords.to_nd_index()].is_revealed = true;
        let mut revealed: CellCount = 1;
        log::trace!("Reveal cell at {:?}, mine count: {}", coords, cell.adjacent_mines);

        if cascade && cell.adjacent_mines == 0 {
            let size = self.size();
            let mut visited: HashSet<Coord2> = HashSet::new();
            visited.insert(coords);
            let mut to_visit: VecDeque<Coord2> = moore_neighbors(coords, size).collect();

            while let Some(visit) = to_visit.pop_front() {
                if !visited.insert(visit) {
                    continue;
                }

                let next = &mut self.cells[visit.to_nd_index()];
                if next.is_revealed || next.is_flagged || next.is_mine {
                    continue;
                }

                next.is_revealed = true;
                revealed += 1;
                log::trace!("Flood revealed cell at {:?}, mine count: {}", visit, next.adjacent_mines);

                if next.adjacent_mines == 0 {
                    to_visit.extend(moore_neighbors(visit, size).filter(|pos| !visited.contains(pos)));
                }
            }
        }

        Ok(RevealOutcome {
            revealed,
            adjacent_mines: cell.adjacent_mines,
            hit_mine: false,
        })
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];

        Ok(if cell.is_revealed {
            MarkOutcome::NoChange
        } else if cell.is_flagged {
            cell.is_flagged = false;
            MarkOutcome::Unflagged
        } else {
            cell.is_flagged = true;
            MarkOutcome::Flagged
        })
    }

    /// Reveals every mine, used once a game is lost.
    pub fn reveal_all_mines(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_mine) {
            cell.is_revealed = true;
        }
    }

    /// Undoes [`Self::reveal_all_mines`].
    pub fn conceal_mines(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_mine) {
            cell.is_revealed = false;
        }
    }

    /// Hides every cell again without touching mines or flags.
    pub fn hide_all(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.is_revealed = false;
        }
    }

    pub(crate) fn cell_mut(&mut self, coords: Coord2) -> Option<&mut CellState> {
        self.cells.get_mut(coords.to_nd_index())
    }
}

impl Index<Coord2> for Board {
    type Output = CellState;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

/// Win primitive: every safe cell has been revealed.
pub const fn check_win_condition(total_cells: CellCount, mines: CellCount, revealed_count: CellCount) -> bool {
    revealed_count == total_cells.saturating_sub(mines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        let mut board = Board::empty(size.0, size.1);
        board.set_mines(mines);
        board
    }

    #[test]
    fn empty_board_cells_know_their_position() {
        let board = Board::empty(4, 3);

        assert_eq!(board.size(), (4, 3));
        assert_eq!(board[(3, 2)].coords(), (3, 2));
        assert!(board.get((4, 0)).is_none());
    }

    #[test]
    fn place_mines_keeps_first_click_neighbourhood_clear() {
        let mut board = Board::empty(9, 9);

        let placed = board.place_mines(10, Some((4, 4)), 42);

        assert_eq!(placed, 10);
        assert_eq!(board.mine_count(), 10);
        assert!(!board[(4, 4)].is_mine);
        assert!(board.neighbors((4, 4)).all(|cell| !cell.is_mine));
        assert_eq!(board[(4, 4)].adjacent_mines, 0);
    }

    #[test]
    fn place_mines_is_deterministic_per_seed() {
        let mut a = Board::empty(16, 16);
        let mut b = Board::empty(16, 16);

        a.place_mines(40, Some((0, 0)), 7);
        b.place_mines(40, Some((0, 0)), 7);

        assert_eq!(a, b);
    }

    #[test]
    fn place_mines_on_crowded_board_only_protects_clicked_cell() {
        let mut board = Board::empty(3, 3);

        let placed = board.place_mines(8, Some((1, 1)), 1);

        assert_eq!(placed, 8);
        assert!(!board[(1, 1)].is_mine);
        assert_eq!(board[(1, 1)].adjacent_mines, 8);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut board = board((3, 3), &[(2, 2)]);

        let outcome = board.reveal_cell((0, 0), true).unwrap();

        assert_eq!(outcome.revealed, 8);
        assert!(!outcome.hit_mine);
        assert!(board[(1, 1)].is_revealed);
        assert_eq!(board[(1, 1)].adjacent_mines, 1);
        assert!(!board[(2, 2)].is_revealed);
        assert!(check_win_condition(9, 1, outcome.revealed));
    }

    #[test]
    fn reveal_without_cascade_opens_one_cell() {
        let mut board = board((3, 3), &[(2, 2)]);

        let outcome = board.reveal_cell((0, 0), false).unwrap();

        assert_eq!(outcome.revealed, 1);
        assert_eq!(board.count_revealed(), 1);
    }

    #[test]
    fn reveal_mine_reports_hit_and_keeps_cell_hidden() {
        let mut board = board((2, 2), &[(0, 0)]);

        let outcome = board.reveal_cell((0, 0), true).unwrap();

        assert!(outcome.hit_mine);
        assert_eq!(outcome.revealed, 0);
        assert!(!board[(0, 0)].is_revealed);
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        let mut board = board((4, 1), &[(3, 0)]);
        board.toggle_flag((1, 0)).unwrap();

        let outcome = board.reveal_cell((0, 0), true).unwrap();

        assert_eq!(outcome.revealed, 1);
        assert!(!board[(2, 0)].is_revealed);
    }

    #[test]
    fn toggle_flag_round_trips_and_ignores_revealed() {
        let mut board = board((3, 1), &[(2, 0)]);

        assert_eq!(board.toggle_flag((2, 0)).unwrap(), MarkOutcome::Flagged);
        assert_eq!(board.count_flags(), 1);
        assert_eq!(board.toggle_flag((2, 0)).unwrap(), MarkOutcome::Unflagged);
        assert_eq!(board.count_flags(), 0);

        board.reveal_cell((0, 0), false).unwrap();
        assert_eq!(board.toggle_flag((0, 0)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(board.toggle_flag((5, 0)), Err(RulesError::InvalidCoords));
    }

    #[test]
    fn reveal_all_mines_exposes_only_mines() {
        let mut board = board((3, 3), &[(0, 0), (2, 2)]);

        board.reveal_all_mines();

        assert_eq!(board.count_revealed(), 2);
        assert!(board[(2, 2)].is_revealed);
        assert!(!board[(1, 1)].is_revealed);
    }
}
