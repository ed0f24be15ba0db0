//! # Standard algebraic notation
//!
//! Moves are named from the position they are played in:
//!
//! - Castling is `O-O` or `O-O-O`.
//! - Drops are `P@c4`.
//! - Pawn moves give the target square, captures prefixed by the file the
//!   pawn left (`exd5`), promotions suffixed by `=Q`.
//! - Other moves give the piece letter, then as much of the starting square
//!   as is needed to tell it apart from another piece of the same type that
//!   could move to the same square, then `x` for captures and the target.
//! - A check adds `+`, a mate `#`.

use crate::model::{
    CastlingSide, Move, MoveFrom, PieceType, castling,
    legality::{self, legal_moves},
    position::Position,
};

/// Render a legal move played in `pos`.
pub fn write_san(pos: &Position, mv: Move, check: bool, mate: bool) -> String {
    let mut res = san_body(pos, mv, &legal_moves(pos));
    if mate {
        res.push('#');
    } else if check {
        res.push('+');
    }
    res
}

/// Find the legal move a SAN text stands for. Check and mate suffixes are
/// optional.
pub fn find_san(pos: &Position, text: &str) -> Option<Move> {
    let wanted = text.trim().trim_end_matches(['+', '#', '!', '?']);
    let moves = legal_moves(pos);
    moves
        .iter()
        .copied()
        .find(|&mv| san_body(pos, mv, &moves) == wanted)
}

fn san_body(pos: &Position, mv: Move, legal: &[Move]) -> String {
    let topo = pos.topology();
    let to = topo.square_name(mv.to);
    let from = match mv.from {
        MoveFrom::Pocket(kind) => return format!("{}@{}", kind.letter(), to),
        MoveFrom::Square(sq) => sq,
    };
    let Some(piece) = pos.at(from) else {
        return format!("{}{}", topo.square_name(from), to);
    };

    if let Some(plan) = castling::plan_for(pos, piece.id, mv.to) {
        return match plan.side {
            CastlingSide::KINGSIDE => "O-O".to_string(),
            CastlingSide::QUEENSIDE => "O-O-O".to_string(),
        };
    }

    let capture = legality::is_capture(pos, mv);
    let mut res = String::new();
    if piece.kind == PieceType::PAWN {
        if capture {
            res.push(topo.file_char(from.x));
            res.push('x');
        }
        res.push_str(&to);
        if let Some(p) = mv.promotion {
            res.push('=');
            res.push(p.letter());
        }
        return res;
    }

    res.push(piece.kind.letter());
    let rivals: Vec<_> = legal
        .iter()
        .filter_map(|other| {
            let sq = other.from_square()?;
            (sq != from && other.to == mv.to && pos.at(sq)?.kind == piece.kind).then_some(sq)
        })
        .collect();
    if !rivals.is_empty() {
        let same_file = rivals.iter().any(|sq| sq.x == from.x);
        let same_rank = rivals
            .iter()
            .any(|&sq| topo.rank_number(sq) == topo.rank_number(from));
        if !same_file {
            res.push(topo.file_char(from.x));
        } else if !same_rank {
            res.push_str(&topo.rank_number(from).to_string());
        } else {
            res.push(topo.file_char(from.x));
            res.push_str(&topo.rank_number(from).to_string());
        }
    }
    if capture {
        res.push('x');
    }
    res.push_str(&to);
    res
}
