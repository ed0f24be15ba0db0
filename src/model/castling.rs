//! Castling for rectangular boards, including Chess960 setups.
//!
//! The castling rook is never assumed to stand on a fixed file. It is
//! located by scanning outwards from the king for the nearest unmoved
//! rook of the same color. The king ends up on the second file from the
//! edge it castles towards and the rook right beside it on the inside,
//! which on an eight-file board is the familiar g/f and c/d.

use serde::{Deserialize, Serialize};

use crate::model::{
    CastlingSide, Color, Move, PieceId, PieceType, Square, legality, position::Position,
    variants::Variant,
};

/// Everything the executor needs to carry out one castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingPlan {
    pub side: CastlingSide,
    pub king: PieceId,
    pub rook: PieceId,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// The destination square the player indicates: the king's target
    /// square in orthodox chess, the rook's square under Chess960.
    pub gesture: Square,
}

/// The royal king of this color that may still castle.
pub fn castling_king(pos: &Position, color: Color) -> Option<PieceId> {
    let topo = pos.topology();
    pos.royals(color)
        .find(|p| {
            p.kind == PieceType::KING
                && !p.moved
                && p.square()
                    .is_some_and(|sq| topo.is_first_rank(sq, color))
        })
        .map(|p| p.id)
}

/// The nearest unmoved rook of the king's color on the given side.
pub fn castling_rook(pos: &Position, color: Color, side: CastlingSide) -> Option<PieceId> {
    let king = castling_king(pos, color)?;
    let from = pos.piece(king).square()?;
    let dx = match side {
        CastlingSide::KINGSIDE => 1,
        CastlingSide::QUEENSIDE => -1,
    };
    let width = pos.topology().width;
    let mut x = from.x + dx;
    while (0..width).contains(&x) {
        if let Some(p) = pos.at(Square::new(from.board, x, from.y)) {
            if p.color == color && p.kind == PieceType::ROOK && !p.moved {
                return Some(p.id);
            }
        }
        x += dx;
    }
    None
}

/// Castling moves available to a king.
///
/// With `guard` set the king may not start on, pass through or land on
/// an attacked square.
pub fn plans(pos: &Position, king: PieceId, guard: bool) -> Vec<CastlingPlan> {
    let variants = pos.variants();
    let piece = pos.piece(king);
    let color = piece.color;
    if !variants.allows_castling() || castling_king(pos, color) != Some(king) {
        return vec![];
    }
    let Some(king_from) = piece.square() else {
        return vec![];
    };
    let topo = pos.topology();
    let mut res = vec![];

    for side in [CastlingSide::KINGSIDE, CastlingSide::QUEENSIDE] {
        if !pos.castling(color, side) {
            continue;
        }
        let Some(rook) = castling_rook(pos, color, side) else {
            continue;
        };
        let Some(rook_from) = pos.piece(rook).square() else {
            continue;
        };
        let (kx, rx) = match side {
            CastlingSide::KINGSIDE => (topo.width - 2, topo.width - 3),
            CastlingSide::QUEENSIDE => (2, 3),
        };
        let king_to = Square::new(king_from.board, kx, king_from.y);
        let rook_to = Square::new(king_from.board, rx, king_from.y);

        let xs = [king_from.x, king_to.x, rook_from.x, rook_to.x];
        let lo = xs.iter().copied().min().unwrap_or(0);
        let hi = xs.iter().copied().max().unwrap_or(0);
        let clear = (lo..=hi).all(|x| {
            pos.id_at(Square::new(king_from.board, x, king_from.y))
                .is_none_or(|id| id == king || id == rook)
        });
        if !clear {
            continue;
        }

        if topo.boards > 1 {
            let landing_free = [king_to, rook_to]
                .into_iter()
                .all(|sq| pos.is_empty(topo.next_board(sq)));
            if !landing_free {
                continue;
            }
        }

        if guard {
            let (a, b) = (king_from.x.min(king_to.x), king_from.x.max(king_to.x));
            let safe = (a..=b).all(|x| {
                !legality::is_attacked(
                    pos,
                    Square::new(king_from.board, x, king_from.y),
                    color.opp(),
                )
            });
            if !safe {
                continue;
            }
        }

        let gesture = if variants.has(Variant::CHESS960) {
            rook_from
        } else {
            king_to
        };
        res.push(CastlingPlan {
            side,
            king,
            rook,
            king_from,
            king_to,
            rook_from,
            rook_to,
            gesture,
        });
    }
    res
}

/// The castling plan a move by this piece to `to` stands for.
///
/// Moving the king onto its own castling rook is always understood as
/// castling, as is the orthodox king gesture outside Chess960.
pub fn plan_for(pos: &Position, piece: PieceId, to: Square) -> Option<CastlingPlan> {
    plans(pos, piece, false)
        .into_iter()
        .find(|p| p.gesture == to || p.rook_from == to)
}

/// Rewrite a king-onto-rook gesture into the canonical gesture square so
/// it compares equal to the generated move.
pub fn normalize(pos: &Position, mv: Move) -> Move {
    let Some(from) = mv.from_square() else {
        return mv;
    };
    let Some(id) = pos.id_at(from) else {
        return mv;
    };
    match plan_for(pos, id, mv.to) {
        Some(plan) => Move { to: plan.gesture, ..mv },
        None => mv,
    }
}

/// Castling destinations for premoves: rights and rook presence only.
pub fn premove_squares(pos: &Position, king: PieceId) -> Vec<Square> {
    plans_ignoring_path(pos, king)
}

fn plans_ignoring_path(pos: &Position, king: PieceId) -> Vec<Square> {
    let piece = pos.piece(king);
    let color = piece.color;
    if !pos.variants().allows_castling() || castling_king(pos, color) != Some(king) {
        return vec![];
    }
    let Some(from) = piece.square() else {
        return vec![];
    };
    let topo = pos.topology();
    [CastlingSide::KINGSIDE, CastlingSide::QUEENSIDE]
        .into_iter()
        .filter(|&side| pos.castling(color, side))
        .filter_map(|side| {
            let rook = castling_rook(pos, color, side)?;
            if pos.variants().has(Variant::CHESS960) {
                pos.piece(rook).square()
            } else {
                let kx = match side {
                    CastlingSide::KINGSIDE => topo.width - 2,
                    CastlingSide::QUEENSIDE => 2,
                };
                Some(Square::new(from.board, kx, from.y))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{CastlingSide, Color, Move, Square, variants::VariantSet},
        notation::fen::parse_position,
    };

    use super::*;

    #[test]
    fn both_sides_when_clear() {
        let pos = parse_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", VariantSet::STANDARD)
            .unwrap();
        let king = castling_king(&pos, Color::WHITE).unwrap();
        let p = plans(&pos, king, true);
        assert_eq!(p.len(), 2);
        assert!(p.iter().any(|p| p.gesture == Square::at(6, 0)));
        assert!(p.iter().any(|p| p.gesture == Square::at(2, 0)));
        let q = p.iter().find(|p| p.side == CastlingSide::QUEENSIDE).unwrap();
        assert_eq!(q.rook_to, Square::at(3, 0));
    }

    #[test]
    fn attacked_path_forbids_castling() {
        let pos = parse_position("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1", VariantSet::STANDARD)
            .unwrap();
        let king = castling_king(&pos, Color::WHITE).unwrap();
        let p = plans(&pos, king, true);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].side, CastlingSide::QUEENSIDE);
    }

    #[test]
    fn chess960_rook_is_found_by_scanning() {
        let variants = VariantSet::STANDARD.with(Variant::CHESS960);
        let pos = parse_position("1r4kr/8/8/8/8/8/8/1R4KR w HBhb - 0 1", variants).unwrap();
        let king = castling_king(&pos, Color::WHITE).unwrap();
        assert_eq!(
            castling_rook(&pos, Color::WHITE, CastlingSide::QUEENSIDE)
                .map(|r| pos.piece(r).square()),
            Some(Some(Square::at(1, 0)))
        );
        let p = plans(&pos, king, true);
        assert_eq!(p.len(), 2);
        let short = p.iter().find(|p| p.side == CastlingSide::KINGSIDE).unwrap();
        assert_eq!(short.gesture, Square::at(7, 0));
        assert_eq!(short.king_to, Square::at(6, 0));
        assert_eq!(short.rook_to, Square::at(5, 0));
    }

    #[test]
    fn king_onto_rook_means_castling() {
        let pos = parse_position("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1", VariantSet::STANDARD)
            .unwrap();
        let mv = normalize(&pos, Move::new(Square::at(4, 0), Square::at(7, 0)));
        assert_eq!(mv.to, Square::at(6, 0));
    }
}
