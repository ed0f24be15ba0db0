//! # Board shapes
//!
//! A [`Topology`] answers every geometric question the rest of the engine
//! asks: which squares exist, how to step from one square to another, which
//! squares are adjacent, where the centre is, and how squares are named.
//!
//! Four shapes are supported:
//!
//! - Rectangular boards up to 16 by 16, `x` is the file and `y` the rank.
//! - The cylinder, a rectangular board whose files wrap around.
//! - The circular board of 4 rings (`x`, files `a` to `d`) by 16 sectors
//!   (`y`, ranks 1 to 16) where the sector index wraps around.
//! - Gliński's hexagonal board of 91 cells. `x` is the file `a` to `l`
//!   (there is no `j` file) and `y` is a doubled height, so the cell on
//!   rank `r` (counting from zero) of the file at offset `q` from the
//!   central `f` file has `y = 2r + |q|`.
//!
//! Any shape may be multiplied into several parallel boards for Alice Chess.

use serde::{Deserialize, Serialize};
use strum::EnumIs;

use crate::model::{Color, Square};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Serialize, Deserialize)]
pub enum Shape {
    RECTANGULAR,
    CYLINDER,
    CIRCULAR,
    HEXAGONAL,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topology {
    pub shape: Shape,
    /// Extent of the `x` axis.
    pub width: i8,
    /// Extent of the `y` axis.
    pub height: i8,
    /// Number of parallel boards.
    pub boards: u8,
}

const HEX_FILES: &[char] = &['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'k', 'l'];

#[rustfmt::skip]
const GRID_ORTHOGONALS: &[(i8, i8)] = &[(0, 1), (0, -1), (1, 0), (-1, 0)];
#[rustfmt::skip]
const GRID_DIAGONALS: &[(i8, i8)] = &[(1, 1), (1, -1), (-1, 1), (-1, -1)];
#[rustfmt::skip]
const GRID_KNIGHT: &[(i8, i8)] = &[
    (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];

#[rustfmt::skip]
const HEX_ORTHOGONALS: &[(i8, i8)] = &[(0, 2), (0, -2), (1, 1), (1, -1), (-1, 1), (-1, -1)];
#[rustfmt::skip]
const HEX_DIAGONALS: &[(i8, i8)] = &[(1, 3), (1, -3), (-1, 3), (-1, -3), (2, 0), (-2, 0)];
#[rustfmt::skip]
const HEX_KNIGHT: &[(i8, i8)] = &[
    (1, 5), (1, -5), (-1, 5), (-1, -5),
    (2, 4), (2, -4), (-2, 4), (-2, -4),
    (3, 1), (3, -1), (-3, 1), (-3, -1),
];

impl Topology {
    pub const STANDARD: Topology = Topology::rectangular(8, 8);

    pub const fn rectangular(width: i8, height: i8) -> Self {
        Self {
            shape: Shape::RECTANGULAR,
            width,
            height,
            boards: 1,
        }
    }

    pub const fn cylinder(width: i8, height: i8) -> Self {
        Self {
            shape: Shape::CYLINDER,
            width,
            height,
            boards: 1,
        }
    }

    pub const fn circular() -> Self {
        Self {
            shape: Shape::CIRCULAR,
            width: 4,
            height: 16,
            boards: 1,
        }
    }

    pub const fn hexagonal() -> Self {
        Self {
            shape: Shape::HEXAGONAL,
            width: 11,
            height: 21,
            boards: 1,
        }
    }

    /// The same shape, repeated over `boards` parallel boards.
    pub const fn with_boards(self, boards: u8) -> Self {
        Self { boards, ..self }
    }

    /// Is this square on the board?
    pub fn contains(&self, sq: Square) -> bool {
        if sq.board >= self.boards
            || sq.x < 0
            || sq.x >= self.width
            || sq.y < 0
            || sq.y >= self.height
        {
            return false;
        }
        match self.shape {
            Shape::HEXAGONAL => {
                let q = (sq.x - 5).abs();
                sq.y >= q && sq.y <= 20 - q && (sq.y - q) % 2 == 0
            }
            _ => true,
        }
    }

    /// Every square of every board, board by board, file by file.
    pub fn squares(&self) -> impl Iterator<Item = Square> + use<> {
        let topo = *self;
        (0..topo.boards).flat_map(move |b| {
            (0..topo.width).flat_map(move |x| {
                (0..topo.height)
                    .map(move |y| Square::new(b, x, y))
                    .filter(move |&sq| topo.contains(sq))
            })
        })
    }

    /// Total square count across all boards.
    pub fn square_count(&self) -> usize {
        self.squares().count()
    }

    /// Step from a square, honouring wrap-around.
    pub fn offset(&self, sq: Square, dx: i8, dy: i8) -> Option<Square> {
        let mut x = sq.x as i16 + dx as i16;
        let mut y = sq.y as i16 + dy as i16;
        match self.shape {
            Shape::CYLINDER => x = x.rem_euclid(self.width as i16),
            Shape::CIRCULAR => y = y.rem_euclid(self.height as i16),
            _ => {}
        }
        if !(0..self.width as i16).contains(&x) || !(0..self.height as i16).contains(&y) {
            return None;
        }
        let res = Square::new(sq.board, x as i8, y as i8);
        self.contains(res).then_some(res)
    }

    /// Squares along a line of travel, stopping at the edge or on
    /// returning to the origin of a wrapping board.
    pub fn ray(&self, from: Square, (dx, dy): (i8, i8)) -> impl Iterator<Item = Square> + use<> {
        let topo = *self;
        std::iter::successors(topo.offset(from, dx, dy), move |&sq| topo.offset(sq, dx, dy))
            .take_while(move |&sq| sq != from)
    }

    pub fn orthogonals(&self) -> &'static [(i8, i8)] {
        match self.shape {
            Shape::HEXAGONAL => HEX_ORTHOGONALS,
            _ => GRID_ORTHOGONALS,
        }
    }

    pub fn diagonals(&self) -> &'static [(i8, i8)] {
        match self.shape {
            Shape::HEXAGONAL => HEX_DIAGONALS,
            _ => GRID_DIAGONALS,
        }
    }

    pub fn knight_jumps(&self) -> &'static [(i8, i8)] {
        match self.shape {
            Shape::HEXAGONAL => HEX_KNIGHT,
            _ => GRID_KNIGHT,
        }
    }

    /// King steps: every orthogonal and diagonal neighbour.
    pub fn king_steps(&self) -> impl Iterator<Item = (i8, i8)> + use<> {
        self.orthogonals()
            .iter()
            .chain(self.diagonals().iter())
            .copied()
    }

    /// Squares adjacent to `sq` on the same board: 8 on square grids
    /// and 12 on the hexagonal board.
    pub fn neighbours(&self, sq: Square) -> impl Iterator<Item = Square> + use<> {
        let topo = *self;
        self.king_steps()
            .filter_map(move |(dx, dy)| topo.offset(sq, dx, dy))
    }

    /// Vertical displacement of a single pawn step.
    #[inline]
    pub fn forward(&self, color: Color) -> i8 {
        match self.shape {
            Shape::HEXAGONAL => 2 * color.sign(),
            _ => color.sign(),
        }
    }

    /// The two displacements of a pawn capture.
    pub fn pawn_captures(&self, color: Color) -> [(i8, i8); 2] {
        let s = color.sign();
        [(-1, s), (1, s)]
    }

    /// Number of cells in file `x`.
    #[inline]
    pub fn file_len(&self, x: i8) -> i8 {
        match self.shape {
            Shape::HEXAGONAL => 11 - (x - 5).abs(),
            _ => self.height,
        }
    }

    /// Zero-based rank of the square counted from the given side.
    pub fn relative_rank(&self, sq: Square, color: Color) -> i8 {
        let abs = match self.shape {
            Shape::HEXAGONAL => (sq.y - (sq.x - 5).abs()) / 2,
            _ => sq.y,
        };
        match color {
            Color::WHITE => abs,
            Color::BLACK => self.file_len(sq.x) - 1 - abs,
        }
    }

    /// Whether the shape has the concept of a first and last rank at all.
    #[inline]
    pub fn has_back_ranks(&self) -> bool {
        !self.shape.is_circular()
    }

    /// Promotion rank for pawns of the given color.
    pub fn is_last_rank(&self, sq: Square, color: Color) -> bool {
        self.has_back_ranks() && self.relative_rank(sq, color) == self.file_len(sq.x) - 1
    }

    pub fn is_first_rank(&self, sq: Square, color: Color) -> bool {
        self.has_back_ranks() && self.relative_rank(sq, color) == 0
    }

    /// Squares from which a pawn that has not yet moved may advance twice.
    pub fn is_pawn_home(&self, sq: Square, color: Color) -> bool {
        let rank = self.relative_rank(sq, color);
        match self.shape {
            Shape::CIRCULAR => false,
            Shape::HEXAGONAL => rank == 4 - (sq.x - 5).abs(),
            _ => rank <= 1,
        }
    }

    /// Where a pawn of this color starts out on file `x`.
    pub fn pawn_start(&self, board: u8, x: i8, color: Color) -> Option<Square> {
        let white_y = match self.shape {
            Shape::HEXAGONAL => 8 - (x - 5).abs(),
            Shape::CIRCULAR => 2,
            _ => 1,
        };
        let y = match (self.shape, color) {
            (_, Color::WHITE) => white_y,
            (Shape::HEXAGONAL, Color::BLACK) => 20 - white_y,
            (Shape::CIRCULAR, Color::BLACK) => 11 - white_y,
            (_, Color::BLACK) => self.height - 1 - white_y,
        };
        let sq = Square::new(board, x, y);
        self.contains(sq).then_some(sq)
    }

    /// Colour class of a square. Square grids have two, the hexagonal
    /// board has three.
    pub fn square_color(&self, sq: Square) -> u8 {
        match self.shape {
            Shape::HEXAGONAL => {
                let q = sq.x as i16 - 5;
                let r = (sq.y as i16 - q) / 2;
                (q - r).rem_euclid(3) as u8
            }
            _ => ((sq.x + sq.y) % 2) as u8,
        }
    }

    /// The centre squares of the first board.
    pub fn centre(&self) -> Vec<Square> {
        match self.shape {
            Shape::HEXAGONAL => {
                let f6 = Square::at(5, 10);
                std::iter::once(f6).chain(self.neighbours(f6).filter(|sq| {
                    HEX_ORTHOGONALS
                        .iter()
                        .any(|&(dx, dy)| sq.x == f6.x + dx && sq.y == f6.y + dy)
                }))
                .collect()
            }
            Shape::CIRCULAR => vec![
                Square::at(1, 5),
                Square::at(2, 5),
                Square::at(1, 6),
                Square::at(2, 6),
            ],
            _ => {
                let (cx, cy) = (self.width / 2, self.height / 2);
                vec![
                    Square::at(cx - 1, cy - 1),
                    Square::at(cx, cy - 1),
                    Square::at(cx - 1, cy),
                    Square::at(cx, cy),
                ]
            }
        }
    }

    /// Centre membership, on any board.
    pub fn is_centre(&self, sq: Square) -> bool {
        self.centre().contains(&sq.on_board(0))
    }

    /// The corresponding square on the next board in the Alice cycle.
    #[inline]
    pub fn next_board(&self, sq: Square) -> Square {
        sq.on_board((sq.board + 1) % self.boards.max(1))
    }

    /// Number of ranks shown in notation.
    #[inline]
    pub fn rank_count(&self) -> i8 {
        match self.shape {
            Shape::HEXAGONAL => 11,
            _ => self.height,
        }
    }

    pub fn file_char(&self, x: i8) -> char {
        match self.shape {
            Shape::HEXAGONAL => HEX_FILES.get(x as usize).copied().unwrap_or('?'),
            _ => (b'a' + x as u8) as char,
        }
    }

    pub fn file_index(&self, c: char) -> Option<i8> {
        let x = match self.shape {
            Shape::HEXAGONAL => HEX_FILES.iter().position(|&f| f == c)? as i8,
            _ => (c as u32).checked_sub('a' as u32)? as i8,
        };
        (0..self.width).contains(&x).then_some(x)
    }

    /// One-based rank number shown in notation.
    pub fn rank_number(&self, sq: Square) -> i8 {
        self.relative_rank(sq, Color::WHITE) + 1
    }

    /// Inverse of [`Topology::file_char`] and [`Topology::rank_number`].
    pub fn square_from(&self, board: u8, x: i8, rank: i8) -> Option<Square> {
        let y = match self.shape {
            Shape::HEXAGONAL => 2 * (rank - 1) + (x - 5).abs(),
            _ => rank - 1,
        };
        let sq = Square::new(board, x, y);
        self.contains(sq).then_some(sq)
    }

    /// Squares of the given board that carry this one-based rank number,
    /// ordered by file. Used by the row-wise snapshot format.
    pub fn rank_squares(&self, board: u8, rank: i8) -> Vec<Square> {
        (0..self.width)
            .filter_map(|x| self.square_from(board, x, rank))
            .collect()
    }

    /// Human readable square name, with a `'` per extra board.
    pub fn square_name(&self, sq: Square) -> String {
        let mut res = format!("{}{}", self.file_char(sq.x), self.rank_number(sq));
        for _ in 0..sq.board {
            res.push('\'');
        }
        res
    }

    /// Parse a square name as produced by [`Topology::square_name`].
    pub fn parse_square(&self, s: &str) -> Option<Square> {
        let board = s.chars().rev().take_while(|&c| c == '\'').count();
        let body = &s[..s.len() - board];
        let mut chars = body.chars();
        let file = self.file_index(chars.next()?)?;
        let rank: i8 = chars.as_str().parse().ok()?;
        self.square_from(u8::try_from(board).ok()?, file, rank)
    }
}

#[test]
fn square_counts() {
    assert_eq!(Topology::STANDARD.square_count(), 64);
    assert_eq!(Topology::rectangular(10, 8).square_count(), 80);
    assert_eq!(Topology::circular().square_count(), 64);
    assert_eq!(Topology::hexagonal().square_count(), 91);
    assert_eq!(Topology::STANDARD.with_boards(2).square_count(), 128);
}

#[test]
fn centres() {
    assert_eq!(Topology::STANDARD.centre().len(), 4);
    assert!(Topology::STANDARD.is_centre(Square::at(3, 3)));
    assert!(Topology::STANDARD.is_centre(Square::at(4, 4)));
    assert!(!Topology::STANDARD.is_centre(Square::at(2, 3)));
    assert_eq!(Topology::hexagonal().centre().len(), 7);
    assert_eq!(Topology::circular().centre().len(), 4);
}

#[test]
fn hexagonal_adjacency() {
    let hex = Topology::hexagonal();
    let f6 = Square::at(5, 10);
    assert_eq!(hex.neighbours(f6).count(), 12);
    assert_eq!(hex.knight_jumps().len(), 12);
    // a1 sits in a corner
    let a1 = hex.parse_square("a1").unwrap();
    assert_eq!(a1, Square::at(0, 5));
    assert_eq!(hex.neighbours(a1).count(), 5);
    assert_eq!(hex.square_name(f6), "f6");
    assert_eq!(hex.parse_square("f11"), Some(Square::at(5, 20)));
    assert_eq!(hex.parse_square("a7"), None);
    assert_eq!(hex.parse_square("j1"), None);
}

#[test]
fn hexagonal_bishops_keep_their_color() {
    let hex = Topology::hexagonal();
    let c1 = hex.parse_square("c1").unwrap();
    for &d in hex.diagonals() {
        for sq in hex.ray(c1, d) {
            assert_eq!(hex.square_color(sq), hex.square_color(c1));
        }
    }
    for sq in hex.neighbours(c1) {
        if hex.orthogonals().contains(&(sq.x - c1.x, sq.y - c1.y)) {
            assert_ne!(hex.square_color(sq), hex.square_color(c1));
        }
    }
}

#[test]
fn cylinder_wraps_files() {
    let cyl = Topology::cylinder(8, 8);
    assert_eq!(cyl.offset(Square::at(0, 0), -1, 0), Some(Square::at(7, 0)));
    assert_eq!(cyl.ray(Square::at(0, 0), (1, 0)).count(), 7);
    assert_eq!(cyl.offset(Square::at(0, 7), 0, 1), None);
    assert_eq!(Topology::STANDARD.ray(Square::at(0, 0), (1, 0)).count(), 7);
    assert_eq!(Topology::STANDARD.ray(Square::at(0, 0), (-1, 0)).count(), 0);
}

#[test]
fn circular_wraps_sectors() {
    let circ = Topology::circular();
    assert_eq!(circ.offset(Square::at(0, 15), 0, 1), Some(Square::at(0, 0)));
    assert_eq!(circ.offset(Square::at(3, 0), 1, 0), None);
    assert_eq!(circ.ray(Square::at(1, 4), (0, 1)).count(), 15);
    assert!(!circ.is_last_rank(Square::at(0, 15), Color::WHITE));
}

#[test]
fn square_names_round_trip() {
    for topo in [
        Topology::STANDARD.with_boards(2),
        Topology::rectangular(10, 8),
        Topology::hexagonal(),
        Topology::circular(),
    ] {
        for sq in topo.squares() {
            let name = topo.square_name(sq);
            assert_eq!(topo.parse_square(&name), Some(sq), "{name}");
        }
    }
    assert_eq!(Topology::STANDARD.square_name(Square::new(0, 4, 3)), "e4");
    assert_eq!(
        Topology::STANDARD.with_boards(2).square_name(Square::new(1, 4, 3)),
        "e4'"
    );
}

#[test]
fn promotion_ranks() {
    let std = Topology::STANDARD;
    assert!(std.is_last_rank(Square::at(0, 7), Color::WHITE));
    assert!(std.is_last_rank(Square::at(0, 0), Color::BLACK));
    let hex = Topology::hexagonal();
    assert!(hex.is_last_rank(hex.parse_square("a6").unwrap(), Color::WHITE));
    assert!(hex.is_last_rank(hex.parse_square("f11").unwrap(), Color::WHITE));
    assert!(hex.is_last_rank(hex.parse_square("f1").unwrap(), Color::BLACK));
    assert!(hex.is_pawn_home(hex.parse_square("b1").unwrap(), Color::WHITE));
    assert!(hex.is_pawn_home(hex.parse_square("f5").unwrap(), Color::WHITE));
    assert!(hex.is_pawn_home(hex.parse_square("f7").unwrap(), Color::BLACK));
    assert!(hex.is_pawn_home(hex.parse_square("b7").unwrap(), Color::BLACK));
}
