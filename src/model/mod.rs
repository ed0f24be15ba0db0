//! # The rules core
//!
//! Everything needed to play a game of chess under any combination of the
//! supported variants lives under this module, in dependency order:
//!
//! - [`topology`]: board shapes and their adjacency rules
//! - [`position`]: the piece arena and the transient game state
//! - [`movegen`] and [`castling`]: pseudo-legal destinations
//! - [`legality`]: king safety, paralysis and patrol
//! - [`moving`] and [`mutators`]: move execution and reversal
//! - [`outcome`]: game end detection
//! - [`vision`]: Dark Chess visibility
//! - [`game`] and [`premove`]: the history state machine

pub mod castling;
pub mod game;
pub mod hash;
pub mod legality;
pub mod movegen;
pub mod moving;
pub mod mutators;
pub mod outcome;
pub mod perft;
pub mod position;
pub mod premove;
pub mod setup;
pub mod topology;
pub mod variants;
pub mod vision;

use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumIter, IntoStaticStr, VariantArray};

/// Representation of the color of a player or piece.
///
/// Used extensively as an index into arrays of the
/// form `[<white value>, <black value>]`.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, VariantArray,
    Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Color {
    WHITE = 0,
    BLACK = 1,
}

impl Color {
    /// Opposing color.
    #[inline]
    pub fn opp(self) -> Self {
        match self {
            Self::WHITE => Self::BLACK,
            Self::BLACK => Self::WHITE,
        }
    }

    /// Direction of travel along the rank axis.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Self::WHITE => 1,
            Self::BLACK => -1,
        }
    }

    /// Associated array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }
}

/// Representation of the piece types.
///
/// The three compound pieces of the Capablanca family are included
/// alongside the six orthodox ones. Their FEN letters are `A` for the
/// cardinal (bishop-knight), `C` for the empress (rook-knight) and
/// `M` for the amazon (queen-knight).
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, VariantArray,
    IntoStaticStr, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum PieceType {
    PAWN = 0,
    KNIGHT = 1,
    BISHOP = 2,
    ROOK = 3,
    QUEEN = 4,
    KING = 5,
    CARDINAL = 6,
    EMPRESS = 7,
    AMAZON = 8,
}

/// Bit flags for the three primitive riders/leapers that every compound
/// piece is built out of.
pub const RIDES_ORTHOGONAL: u8 = 1;
pub const RIDES_DIAGONAL: u8 = 2;
pub const LEAPS_KNIGHT: u8 = 4;

impl PieceType {
    /// Use as an array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }

    /// Upper-case FEN letter.
    pub fn letter(self) -> char {
        use PieceType::*;
        match self {
            PAWN => 'P',
            KNIGHT => 'N',
            BISHOP => 'B',
            ROOK => 'R',
            QUEEN => 'Q',
            KING => 'K',
            CARDINAL => 'A',
            EMPRESS => 'C',
            AMAZON => 'M',
        }
    }

    /// Inverse of [`PieceType::letter`], case insensitive.
    pub fn from_letter(c: char) -> Option<Self> {
        use PieceType::*;
        Some(match c.to_ascii_uppercase() {
            'P' => PAWN,
            'N' => KNIGHT,
            'B' => BISHOP,
            'R' => ROOK,
            'Q' => QUEEN,
            'K' => KING,
            'A' => CARDINAL,
            'C' => EMPRESS,
            'M' => AMAZON,
            _ => return None,
        })
    }

    /// Material value used for the material-difference display.
    pub fn value(self) -> u32 {
        use PieceType::*;
        match self {
            PAWN => 1,
            KNIGHT | BISHOP => 3,
            ROOK => 5,
            QUEEN => 9,
            CARDINAL => 7,
            EMPRESS => 8,
            AMAZON => 12,
            KING => 0,
        }
    }

    /// Which primitive movements this piece type is composed of.
    ///
    /// Pawns and kings have bespoke movement and report no components.
    pub fn components(self) -> u8 {
        use PieceType::*;
        match self {
            PAWN | KING => 0,
            KNIGHT => LEAPS_KNIGHT,
            BISHOP => RIDES_DIAGONAL,
            ROOK => RIDES_ORTHOGONAL,
            QUEEN => RIDES_ORTHOGONAL | RIDES_DIAGONAL,
            CARDINAL => RIDES_DIAGONAL | LEAPS_KNIGHT,
            EMPRESS => RIDES_ORTHOGONAL | LEAPS_KNIGHT,
            AMAZON => RIDES_ORTHOGONAL | RIDES_DIAGONAL | LEAPS_KNIGHT,
        }
    }

    /// The piece type made out of exactly these components.
    pub fn from_components(bits: u8) -> Option<Self> {
        use PieceType::*;
        match bits & 0x7 {
            0 => None,
            RIDES_ORTHOGONAL => Some(ROOK),
            RIDES_DIAGONAL => Some(BISHOP),
            LEAPS_KNIGHT => Some(KNIGHT),
            3 => Some(QUEEN),
            5 => Some(EMPRESS),
            6 => Some(CARDINAL),
            _ => Some(AMAZON),
        }
    }

    /// Minor pieces for the purposes of insufficient material.
    #[inline]
    pub fn is_minor(self) -> bool {
        matches!(self, Self::KNIGHT | Self::BISHOP)
    }
}

/// A square on one of the boards of a game.
///
/// `board` selects among parallel boards; only Alice Chess uses
/// more than one. The meaning of `x` and `y` depends on the
/// [`topology::Topology`]: file and rank on rectangular boards,
/// ring and sector on the circular board, and file and doubled
/// height on the hexagonal board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Square {
    pub board: u8,
    pub x: i8,
    pub y: i8,
}

impl Square {
    #[inline]
    pub const fn new(board: u8, x: i8, y: i8) -> Self {
        Self { board, x, y }
    }

    /// A square on the first board.
    #[inline]
    pub const fn at(x: i8, y: i8) -> Self {
        Self::new(0, x, y)
    }

    #[inline]
    pub fn on_board(self, board: u8) -> Self {
        Self { board, ..self }
    }
}

/// Stable index of a piece within a [`position::Position`]'s arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PieceId(pub u16);

impl PieceId {
    #[inline]
    pub fn ix(self) -> usize {
        self.0 as usize
    }
}

/// Where a piece currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Board(Square),
    /// In the pocket of the given color, ready to be dropped.
    Pocket(Color),
}

impl Location {
    #[inline]
    pub fn square(self) -> Option<Square> {
        match self {
            Location::Board(sq) => Some(sq),
            Location::Pocket(_) => None,
        }
    }
}

/// A single piece record.
///
/// Pieces are never created or destroyed after a game starts. A capture
/// sets `location` to `None` or moves the piece into a pocket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceType,
    pub color: Color,
    pub location: Option<Location>,
    pub moved: bool,
    /// The type the piece had when it entered the game, restored when it
    /// returns to a Crazyhouse pocket.
    pub original: PieceType,
    /// Secondary movement granted by Absorption to royal kings.
    pub abilities: Option<PieceType>,
    /// Whether losing this piece loses the game.
    pub royal: bool,
}

impl Piece {
    #[inline]
    pub fn square(&self) -> Option<Square> {
        self.location.and_then(Location::square)
    }

    #[inline]
    pub fn is_on_board(&self) -> bool {
        self.square().is_some()
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.location.is_none()
    }

    /// Combined primitive components of type and abilities.
    pub fn components(&self) -> u8 {
        self.kind.components() | self.abilities.map(PieceType::components).unwrap_or(0)
    }

    /// Material value of the piece as displayed.
    pub fn value(&self) -> u32 {
        self.kind.value()
    }
}

/// Origin of a move: a board square, or a pocket drop of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveFrom {
    Square(Square),
    Pocket(PieceType),
}

/// The minimal wire-level description of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: MoveFrom,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl Move {
    #[inline]
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from: MoveFrom::Square(from),
            to,
            promotion: None,
        }
    }

    #[inline]
    pub fn promoting(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from: MoveFrom::Square(from),
            to,
            promotion: Some(promotion),
        }
    }

    #[inline]
    pub fn drop(kind: PieceType, to: Square) -> Self {
        Self {
            from: MoveFrom::Pocket(kind),
            to,
            promotion: None,
        }
    }

    #[inline]
    pub fn from_square(&self) -> Option<Square> {
        match self.from {
            MoveFrom::Square(sq) => Some(sq),
            MoveFrom::Pocket(_) => None,
        }
    }

    #[inline]
    pub fn is_drop(&self) -> bool {
        matches!(self.from, MoveFrom::Pocket(_))
    }
}

/// The two directions of castling.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, VariantArray, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum CastlingSide {
    /// Towards the highest file.
    KINGSIDE = 0,
    /// Towards the `a` file.
    QUEENSIDE = 1,
}

impl CastlingSide {
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }
}

#[test]
fn letters_round_trip() {
    for &pt in PieceType::VARIANTS {
        assert_eq!(PieceType::from_letter(pt.letter()), Some(pt));
        assert_eq!(
            PieceType::from_letter(pt.letter().to_ascii_lowercase()),
            Some(pt)
        );
    }
    assert_eq!(PieceType::from_letter('x'), None);
}

#[test]
fn compounds_are_unions_of_components() {
    use PieceType::*;
    assert_eq!(
        PieceType::from_components(ROOK.components() | BISHOP.components()),
        Some(QUEEN)
    );
    assert_eq!(
        PieceType::from_components(BISHOP.components() | KNIGHT.components()),
        Some(CARDINAL)
    );
    assert_eq!(
        PieceType::from_components(ROOK.components() | KNIGHT.components()),
        Some(EMPRESS)
    );
    assert_eq!(
        PieceType::from_components(QUEEN.components() | KNIGHT.components()),
        Some(AMAZON)
    );
    assert_eq!(PieceType::from_components(PAWN.components()), None);
}
