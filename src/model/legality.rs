//! # Legality
//!
//! Narrowing pseudo-legal moves down to legal ones:
//!
//! - A move may not leave any of the mover's royal pieces attacked, unless
//!   the variants have no concept of check, in which case it merely may
//!   not destroy one of them.
//! - Under Madrasi a piece attacked by an enemy piece of its own type that
//!   it attacks in turn is paralysed. It can neither move nor give check,
//!   and it cannot be captured.
//! - Under Patrol a piece only captures or gives check while a friendly
//!   piece defends it.
//! - Under Antichess capturing is compulsory.

use crate::model::{
    Color, Move, MoveFrom, PieceId, PieceType, Square,
    movegen::{self, GenMode},
    moving::{make_move, unmake_move},
    position::Position,
    variants::Variant,
};

/// Madrasi paralysis.
pub fn is_paralysed(pos: &Position, id: PieceId) -> bool {
    if !pos.variants().has(Variant::MADRASI) {
        return false;
    }
    let piece = pos.piece(id);
    let Some(sq) = piece.square() else {
        return false;
    };
    movegen::pseudo(pos, piece, sq, GenMode::ATTACKED)
        .into_iter()
        .filter_map(|target| pos.at(target).map(|other| (target, other)))
        .any(|(target, other)| {
            other.color != piece.color
                && other.kind == piece.kind
                && movegen::pseudo(pos, other, target, GenMode::ATTACKED).contains(&sq)
        })
}

/// Whether another friendly piece defends this one.
pub fn is_patrolled(pos: &Position, id: PieceId) -> bool {
    let piece = pos.piece(id);
    let Some(sq) = piece.square() else {
        return false;
    };
    pos.on_board(piece.color)
        .filter(|p| p.id != id)
        .any(|p| movegen::generate(pos, p.id, GenMode::CONTROLLED).contains(&sq))
}

/// The squares a piece effectively attacks, accounting for paralysis and
/// patrol.
pub fn attacks(pos: &Position, id: PieceId) -> Vec<Square> {
    if pos.variants().has(Variant::PATROL) && !is_patrolled(pos, id) {
        return vec![];
    }
    movegen::generate(pos, id, GenMode::ATTACKED)
}

/// Is this square attacked by any piece of the given color?
pub fn is_attacked(pos: &Position, sq: Square, by: Color) -> bool {
    pos.on_board(by)
        .filter(|p| p.square().is_some_and(|from| from.board == sq.board))
        .any(|p| attacks(pos, p.id).contains(&sq))
}

/// Whether any royal piece of this color is attacked.
pub fn in_check(pos: &Position, color: Color) -> bool {
    pos.royals(color)
        .filter_map(|p| p.square())
        .any(|sq| is_attacked(pos, sq, color.opp()))
}

/// Whether this move takes something off the board.
pub fn is_capture(pos: &Position, mv: Move) -> bool {
    let MoveFrom::Square(from) = mv.from else {
        return false;
    };
    let Some(piece) = pos.at(from) else {
        return false;
    };
    if pos.variants().has(Variant::BENEDICT) {
        return false;
    }
    match pos.at(mv.to) {
        Some(target) => target.color != piece.color,
        None => {
            piece.kind == PieceType::PAWN
                && movegen::is_en_passant_target(pos, piece.color, mv.to)
        }
    }
}

/// All legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut scratch = pos.clone();
    let mut res: Vec<Move> = movegen::candidates(pos)
        .into_iter()
        .filter(|&mv| is_legal_candidate(&mut scratch, mv))
        .collect();
    if pos.variants().has(Variant::ANTICHESS) && res.iter().any(|&mv| is_capture(pos, mv)) {
        res.retain(|&mv| is_capture(pos, mv));
    }
    res
}

/// Whether the side to move has any legal move at all.
pub fn has_legal_move(pos: &Position) -> bool {
    let mut scratch = pos.clone();
    movegen::candidates(pos)
        .into_iter()
        .any(|mv| is_legal_candidate(&mut scratch, mv))
}

/// Legal destinations of a single piece.
pub fn legal_destinations(pos: &Position, id: PieceId) -> Vec<Square> {
    let Some(from) = pos.piece(id).square() else {
        return vec![];
    };
    let mut res: Vec<Square> = legal_moves(pos)
        .into_iter()
        .filter(|mv| mv.from == MoveFrom::Square(from))
        .map(|mv| mv.to)
        .collect();
    res.dedup();
    res
}

/// Check a pseudo-legal move by playing it out on a scratch position and
/// taking it back again.
fn is_legal_candidate(scratch: &mut Position, mv: Move) -> bool {
    let variants = scratch.variants();
    let mover = scratch.turn();

    if variants.has(Variant::MADRASI)
        && scratch
            .id_at(mv.to)
            .is_some_and(|id| is_paralysed(scratch, id))
    {
        return false;
    }

    if variants.has(Variant::PATROL) && is_capture(scratch, mv) {
        let patrolled = mv
            .from_square()
            .and_then(|sq| scratch.id_at(sq))
            .is_some_and(|id| is_patrolled(scratch, id));
        if !patrolled {
            return false;
        }
    }

    let royals_before = scratch.royals(mover).count();
    let (patch, report) = make_move(scratch, mv);

    let mut legal = scratch.royals(mover).count() >= royals_before;
    if legal && !variants.no_checks() {
        legal = !in_check(scratch, mover);
    }
    if legal && variants.has(Variant::PATROL) && scratch.piece(report.piece).is_on_board() {
        let gives_check = movegen::generate(scratch, report.piece, GenMode::ATTACKED)
            .into_iter()
            .any(|sq| scratch.at(sq).is_some_and(|p| p.royal && p.color != mover));
        if gives_check && !is_patrolled(scratch, report.piece) {
            legal = false;
        }
    }

    unmake_move(scratch, patch);
    legal
}
