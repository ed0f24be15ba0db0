//! Coordinate move text as clients submit it: `e2e4`, `e7e8q` for a
//! promotion, `P@c4` for a drop. Squares on the second Alice board carry
//! a trailing `'`.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::MoveTextError,
    model::{Move, MoveFrom, PieceType, topology::Topology},
};

static COORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-l][0-9]{1,2}'*)-?([a-l][0-9]{1,2}'*)([a-z])?$").expect("coordinate pattern")
});

static DROP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])@([a-l][0-9]{1,2}'*)$").expect("drop pattern"));

pub fn parse_move(text: &str, topo: Topology) -> Result<Move, MoveTextError> {
    let text = text.trim();
    let square = |name: &str| {
        topo.parse_square(name)
            .ok_or_else(|| MoveTextError::Square(name.to_string()))
    };
    let piece = |letter: &str| {
        let c = letter.chars().next().unwrap_or(' ');
        PieceType::from_letter(c).ok_or(MoveTextError::Piece(c))
    };

    if let Some(caps) = DROP.captures(text) {
        return Ok(Move::drop(piece(&caps[1])?, square(&caps[2])?));
    }
    let caps = COORD
        .captures(text)
        .ok_or_else(|| MoveTextError::Syntax(text.to_string()))?;
    let from = square(&caps[1])?;
    let to = square(&caps[2])?;
    Ok(match caps.get(3) {
        Some(p) => Move::promoting(from, to, piece(p.as_str())?),
        None => Move::new(from, to),
    })
}

pub fn write_move(mv: Move, topo: Topology) -> String {
    let to = topo.square_name(mv.to);
    match mv.from {
        MoveFrom::Pocket(kind) => format!("{}@{}", kind.letter(), to),
        MoveFrom::Square(from) => {
            let mut res = format!("{}{}", topo.square_name(from), to);
            if let Some(p) = mv.promotion {
                res.push(p.letter().to_ascii_lowercase());
            }
            res
        }
    }
}
