//! # Dark Chess visibility
//!
//! A player sees the squares their own pieces stand on and every square
//! those pieces could move to, capture on, or are blocked by when
//! advancing. Moves of the opponent are reported to them only as far as
//! they can see.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::{
    Color, Move, MoveFrom, PieceId, PieceType, Square,
    movegen::{GenMode, generate},
    position::Position,
};

/// Squares `color` can observe in `pos`.
pub fn visible_squares(pos: &Position, color: Color) -> IndexSet<Square> {
    let mut res = IndexSet::new();
    for piece in pos.on_board(color) {
        if let Some(sq) = piece.square() {
            res.insert(sq);
        }
        res.extend(generate(pos, piece.id, GenMode::VISIBLE));
    }
    res
}

/// A piece lost in a move, as seen by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCapture {
    pub square: Square,
    pub kind: PieceType,
}

/// A move with everything the viewer cannot see left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarkChessMove {
    pub color: Color,
    pub from: Option<Square>,
    pub to: Option<Square>,
    /// The moving piece, when its destination is visible.
    pub kind: Option<PieceType>,
    pub captures: Vec<RevealedCapture>,
    /// What the viewer sees once the move is made.
    pub visible: IndexSet<Square>,
}

impl DarkChessMove {
    /// Everything about a move, for its own player.
    pub fn full(before: &Position, after: &Position, mv: Move, casualties: &[PieceId]) -> Self {
        Self {
            visible: visible_squares(after, before.turn()),
            color: before.turn(),
            from: mv.from_square(),
            to: Some(mv.to),
            kind: moving_kind(before, mv),
            captures: casualties
                .iter()
                .filter_map(|&id| reveal(before, id))
                .collect(),
        }
    }

    /// Redact a move played from `before` to `after` for `viewer`.
    ///
    /// The viewer learns of squares they see once the move is made, and
    /// always of their own losses.
    pub fn redact(
        before: &Position,
        after: &Position,
        mv: Move,
        casualties: &[PieceId],
        viewer: Color,
    ) -> Self {
        if viewer == before.turn() {
            return Self::full(before, after, mv, casualties);
        }
        let seen = visible_squares(after, viewer);
        let to = seen.contains(&mv.to).then_some(mv.to);
        Self {
            color: before.turn(),
            from: mv.from_square().filter(|sq| seen.contains(sq)),
            to,
            kind: to.and_then(|_| moving_kind(before, mv)),
            captures: casualties
                .iter()
                .filter_map(|&id| reveal(before, id))
                .filter(|c| {
                    seen.contains(&c.square)
                        || before.at(c.square).is_some_and(|p| p.color == viewer)
                })
                .collect(),
            visible: seen,
        }
    }
}

fn moving_kind(before: &Position, mv: Move) -> Option<PieceType> {
    match mv.from {
        MoveFrom::Pocket(kind) => Some(kind),
        MoveFrom::Square(sq) => before.at(sq).map(|p| p.kind),
    }
}

fn reveal(before: &Position, id: PieceId) -> Option<RevealedCapture> {
    let piece = before.piece(id);
    Some(RevealedCapture {
        square: piece.square()?,
        kind: piece.kind,
    })
}
