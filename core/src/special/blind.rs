use hashbrown::HashSet;

use crate::*;

/// Visibility for blind play: a cell can be seen when it is flagged or
/// touches a flag.
///
/// Recomputed from the whole board on every query.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlindVisibility;

impl BlindVisibility {
    pub fn is_cell_visible(board: &Board, coords: Coord2) -> bool {
        let Some(cell) = board.get(coords) else {
            return false;
        };
        cell.is_flagged || board.neighbors(coords).any(|neighbor| neighbor.is_flagged)
    }

    pub fn visible_cells(board: &Board) -> HashSet<Coord2> {
        let mut visible = HashSet::new();
        for flag in board.cells().filter(|cell| cell.is_flagged) {
            let coords = flag.coords();
            visible.insert(coords);
            visible.extend(moore_neighbors(coords, board.size()));
        }
        log::trace!("{} cells visible around flags", visible.len());
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_visible_without_flags() {
        let board = Board::empty(5, 5);

        assert!(BlindVisibility::visible_cells(&board).is_empty());
        assert!(!BlindVisibility::is_cell_visible(&board, (2, 2)));
    }

    #[test]
    fn flag_lights_up_its_neighbourhood() {
        let mut board = Board::empty(5, 5);
        board.toggle_flag((0, 0)).unwrap();
        board.toggle_flag((4, 4)).unwrap();

        let visible = BlindVisibility::visible_cells(&board);

        assert_eq!(visible.len(), 8);
        for coords in [(0, 0), (1, 1), (0, 1), (3, 3), (4, 4)] {
            assert!(visible.contains(&coords));
            assert!(BlindVisibility::is_cell_visible(&board, coords));
        }
        assert!(!BlindVisibility::is_cell_visible(&board, (2, 2)));
        assert!(!BlindVisibility::is_cell_visible(&board, (9, 9)));
    }

    #[test]
    fn unflagging_hides_again() {
        let mut board = Board::empty(3, 3);
        board.toggle_flag((1, 1)).unwrap();
        assert!(BlindVisibility::is_cell_visible(&board, (0, 0)));

        board.toggle_flag((1, 1)).unwrap();
        assert!(!BlindVisibility::is_cell_visible(&board, (0, 0)));
    }
}
