//! Errors for text that fails to describe a position or a move.
//!
//! Illegal moves are not errors. A well formed move the rules forbid is
//! simply not applied.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Syntax(String),
    #[error("expected {expected} boards, found {found}")]
    BoardCount { expected: usize, found: usize },
    #[error("expected {expected} ranks, found {found}")]
    RankCount { expected: usize, found: usize },
    #[error("rank {rank} should hold {expected} squares, found {found}")]
    RankWidth {
        rank: usize,
        expected: usize,
        found: usize,
    },
    #[error("no square named {0:?} on this board")]
    Square(String),
    #[error("castling right {0:?} has no king and rook to go with it")]
    CastlingRight(char),
    #[error("no pawn can have passed over {0}")]
    EnPassant(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveTextError {
    #[error("{0:?} is not a move")]
    Syntax(String),
    #[error("no square named {0:?} on this board")]
    Square(String),
    #[error("{0:?} is not a piece letter")]
    Piece(char),
}
