/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Milliseconds since the Unix epoch, as read from a [`Clock`](crate::Clock).
pub type Timestamp = u64;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Offsets of the eight Moore neighbours, row by row.
const MOORE_OFFSETS: [(i16, i16); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterates the in-bounds Moore neighbours of `center` on a board of `size`.
pub fn moore_neighbors(center: Coord2, size: Coord2) -> impl Iterator<Item = Coord2> {
    let (x, y) = (i16::from(center.0), i16::from(center.1));
    let (w, h) = (i16::from(size.0), i16::from(size.1));
    MOORE_OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        if (0..w).contains(&nx) && (0..h).contains(&ny) {
            Some((nx as Coord, ny as Coord))
        } else {
            None
        }
    })
}

/// Whether `a` and `b` are distinct cells touching by edge or corner.
pub fn is_moore_adjacent(a: Coord2, b: Coord2) -> bool {
    a != b && a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_cell_has_eight_neighbors() {
        assert_eq!(moore_neighbors((4, 4), (9, 9)).count(), 8);
    }

    #[test]
    fn corner_and_edge_neighbors_are_clipped() {
        let corner: Vec<_> = moore_neighbors((0, 0), (9, 9)).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1), (1, 1)]);
        assert_eq!(moore_neighbors((0, 4), (9, 9)).count(), 5);
        assert_eq!(moore_neighbors((8, 8), (9, 9)).count(), 3);
    }

    #[test]
    fn adjacency_excludes_self_and_distance_two() {
        assert!(is_moore_adjacent((3, 3), (4, 4)));
        assert!(is_moore_adjacent((3, 3), (3, 2)));
        assert!(!is_moore_adjacent((3, 3), (3, 3)));
        assert!(!is_moore_adjacent((3, 3), (5, 3)));
    }

    #[test]
    fn area_saturates() {
        assert_eq!(mult(16, 16), 256);
        assert_eq!(mult(255, 255), 65025);
    }
}
