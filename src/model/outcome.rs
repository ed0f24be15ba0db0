//! # Game end
//!
//! [`evaluate`] looks at a position right after a move and decides whether
//! the game is over. Triggers are checked in a fixed order, so when a move
//! satisfies several at once the first one names the result:
//!
//! 1. a side lost a royal piece (exploded under Atomic, captured otherwise)
//! 2. a royal piece reached the centre under King of the Hill
//! 3. a side gave its third check under Three-Check
//! 4. the Horde has nothing left on the board
//! 5. a side ran out of pieces under Antichess
//! 6. the side to move has no legal move
//! 7. neither side can mate any more
//! 8. a hundred plies passed without an irreversible move
//!
//! Threefold repetition is never automatic, it has to be claimed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs, EnumIter, IntoStaticStr};

use crate::model::{
    Color, Piece, PieceType,
    legality::{has_legal_move, in_check},
    position::Position,
    topology::Shape,
    variants::Variant,
};

#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs, EnumIter, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ResultReason {
    CHECKMATE,
    STALEMATE,
    KING_IN_THE_CENTER,
    KING_EXPLODED,
    KING_CAPTURED,
    NO_PIECES_LEFT,
    HORDE_DESTROYED,
    THREE_CHECKS,
    RESIGNATION,
    TIMEOUT,
    AGREED_DRAW,
    INSUFFICIENT_MATERIAL,
    THREEFOLD_REPETITION,
    FIFTY_MOVE_RULE,
    INSUFFICIENT_MATERIAL_AND_TIMEOUT,
}

/// The outcome of a finished game. A draw has no winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Option<Color>,
    pub reason: ResultReason,
}

impl GameResult {
    #[inline]
    pub fn win(winner: Color, reason: ResultReason) -> Self {
        Self {
            winner: Some(winner),
            reason,
        }
    }

    #[inline]
    pub fn draw(reason: ResultReason) -> Self {
        Self {
            winner: None,
            reason,
        }
    }
}

const BOTH: [Color; 2] = [Color::WHITE, Color::BLACK];

/// Whether the game ended with the move `mover` just made.
pub fn evaluate(pos: &Position, mover: Color) -> Option<GameResult> {
    use ResultReason::*;
    let variants = pos.variants();
    let order = [mover.opp(), mover];

    for color in order {
        let quota = pos.royal_quota(color) as usize;
        if quota > 0 && pos.royals(color).count() < quota {
            let reason = if variants.has(Variant::ATOMIC) {
                KING_EXPLODED
            } else {
                KING_CAPTURED
            };
            return Some(GameResult::win(color.opp(), reason));
        }
    }

    if variants.has(Variant::KING_OF_THE_HILL) {
        let topo = pos.topology();
        for color in [mover, mover.opp()] {
            if pos
                .royals(color)
                .filter_map(Piece::square)
                .any(|sq| topo.is_centre(sq))
            {
                return Some(GameResult::win(color, KING_IN_THE_CENTER));
            }
        }
    }

    if variants.has(Variant::THREE_CHECK) {
        for color in [mover, mover.opp()] {
            if pos.state().checks[color.ix()] >= 3 {
                return Some(GameResult::win(color, THREE_CHECKS));
            }
        }
    }

    if variants.has(Variant::HORDE) {
        for color in BOTH {
            if pos.royal_quota(color) == 0 && pos.on_board(color).next().is_none() {
                return Some(GameResult::win(color.opp(), HORDE_DESTROYED));
            }
        }
    }

    if variants.has(Variant::ANTICHESS) {
        let empty = BOTH.map(|c| pos.on_board(c).next().is_none());
        match empty {
            [true, true] if variants.has(Variant::ATOMIC) => {
                return Some(GameResult::draw(NO_PIECES_LEFT));
            }
            _ => {
                for color in [mover, mover.opp()] {
                    if empty[color.ix()] {
                        return Some(GameResult::win(color, NO_PIECES_LEFT));
                    }
                }
            }
        }
    }

    let turn = pos.turn();
    if !has_legal_move(pos) {
        return Some(if variants.has(Variant::ANTICHESS) {
            GameResult::win(turn, STALEMATE)
        } else if in_check(pos, turn) {
            GameResult::win(turn.opp(), CHECKMATE)
        } else {
            GameResult::draw(STALEMATE)
        });
    }

    if is_insufficient_material(pos) {
        return Some(GameResult::draw(INSUFFICIENT_MATERIAL));
    }

    if pos.state().halfmove >= 100 {
        return Some(GameResult::draw(FIFTY_MOVE_RULE));
    }

    None
}

/// Non-royal pieces still in play, pockets included.
fn officers(pos: &Position, color: Color) -> Vec<&Piece> {
    pos.pieces()
        .filter(|p| p.color == color && p.location.is_some() && !p.royal)
        .collect()
}

/// Whether neither side could ever deliver mate.
pub fn is_insufficient_material(pos: &Position) -> bool {
    let variants = pos.variants();
    if variants.changes_pieces() || variants.resurrects() || variants.has(Variant::HORDE) {
        return false;
    }
    let topo = pos.topology();
    let all: Vec<&Piece> = BOTH.iter().flat_map(|&c| officers(pos, c)).collect();

    if variants.has(Variant::ANTICHESS) {
        return BOTH.iter().all(|&c| {
            let mine: Vec<&Piece> = pos.on_board(c).collect();
            mine.len() == 1 && mine[0].kind == PieceType::KING
        });
    }
    if variants.has(Variant::ATOMIC) {
        return all.len() <= 1 && all.iter().all(|p| p.kind.is_minor());
    }
    if !matches!(topo.shape, Shape::RECTANGULAR | Shape::CYLINDER) {
        return all.is_empty();
    }
    if all.iter().any(|p| !p.kind.is_minor()) {
        return false;
    }
    if all.len() <= 1 {
        return true;
    }
    let mut bishop_shades = all.iter().map(|p| match (p.kind, p.square()) {
        (PieceType::BISHOP, Some(sq)) => Some(topo.square_color(sq)),
        _ => None,
    });
    let first = bishop_shades.next().flatten();
    first.is_some() && bishop_shades.all(|s| s == first)
}

/// Whether this side still has material that could ever mate, for
/// deciding a game lost on time.
pub fn has_mating_material(pos: &Position, color: Color) -> bool {
    let mine = officers(pos, color);
    match mine.as_slice() {
        [] => false,
        [only] => !only.kind.is_minor() || !officers(pos, color.opp()).is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Move, Square, moving::make_move, variants::VariantSet},
        notation::fen::parse_position,
    };

    fn after(fen: &str, variants: VariantSet, from: &str, to: &str) -> Option<GameResult> {
        let mut pos = parse_position(fen, variants).unwrap();
        let topo = pos.topology();
        let mover = pos.turn();
        make_move(
            &mut pos,
            Move::new(topo.parse_square(from).unwrap(), topo.parse_square(to).unwrap()),
        );
        evaluate(&pos, mover)
    }

    #[test]
    fn mate_and_stalemate() {
        let v = VariantSet::STANDARD;
        assert_eq!(
            after("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", v, "a1", "a8"),
            Some(GameResult::win(Color::WHITE, ResultReason::CHECKMATE))
        );
        assert_eq!(
            after("7k/8/5K2/8/8/8/8/6Q1 w - - 0 1", v, "g1", "g6"),
            Some(GameResult::draw(ResultReason::STALEMATE))
        );
        assert_eq!(after("7k/8/5K2/8/8/8/8/6Q1 w - - 0 1", v, "g1", "g2"), None);
    }

    #[test]
    fn king_of_the_hill() {
        let v = VariantSet::STANDARD.with(Variant::KING_OF_THE_HILL);
        assert_eq!(
            after("4k3/p7/8/8/8/4K3/8/8 w - - 0 1", v, "e3", "e4"),
            Some(GameResult::win(Color::WHITE, ResultReason::KING_IN_THE_CENTER))
        );
        assert_eq!(after("4k3/p7/8/8/8/4K3/8/8 w - - 0 1", v, "e3", "f3"), None);
    }

    #[test]
    fn third_check_wins() {
        let v = VariantSet::STANDARD.with(Variant::THREE_CHECK);
        assert_eq!(
            after("4k3/8/8/8/8/8/8/R3K3 w - - 0 1 +2+0", v, "a1", "a8"),
            Some(GameResult::win(Color::WHITE, ResultReason::THREE_CHECKS))
        );
    }

    #[test]
    fn horde_and_antichess_emptiness() {
        let v = VariantSet::STANDARD.with(Variant::HORDE);
        assert_eq!(after("4k3/8/8/8/8/8/3P4/8 b - - 0 1", v, "e8", "e7"), None);
        let mut pos = parse_position("4k3/8/8/8/8/8/4p3/3Q4 b - - 0 1", v).unwrap();
        make_move(&mut pos, Move::new(Square::at(4, 1), Square::at(3, 0)));
        assert_eq!(
            evaluate(&pos, Color::BLACK),
            Some(GameResult::win(Color::BLACK, ResultReason::HORDE_DESTROYED))
        );

        let v = VariantSet::STANDARD.with(Variant::ANTICHESS);
        assert_eq!(
            after("8/8/8/8/8/8/1p6/R7 b - - 0 1", v, "b2", "a1"),
            Some(GameResult::win(Color::WHITE, ResultReason::NO_PIECES_LEFT))
        );
    }

    #[test]
    fn one_exploded_king_of_two_loses() {
        let v = VariantSet::STANDARD
            .with(Variant::TWO_FAMILIES)
            .with(Variant::ATOMIC);
        let fen = "3rkk4/10/10/10/10/10/3P6/4KK4 b - - 0 1";
        assert_eq!(
            after(fen, v, "d8", "d2"),
            Some(GameResult::win(Color::BLACK, ResultReason::KING_EXPLODED))
        );
    }

    #[test]
    fn atomic_antichess_mutual_wipeout_draws() {
        let v = VariantSet::STANDARD
            .with(Variant::ANTICHESS)
            .with(Variant::ATOMIC);
        assert_eq!(
            after("8/8/8/8/8/1p6/R7/8 b - - 0 1", v, "b3", "a2"),
            Some(GameResult::draw(ResultReason::NO_PIECES_LEFT))
        );
    }

    #[test]
    fn antichess_stalemate_wins() {
        let v = VariantSet::STANDARD.with(Variant::ANTICHESS);
        assert_eq!(
            after("8/8/8/8/p7/8/P7/8 b - - 0 1", v, "a4", "a3"),
            Some(GameResult::win(Color::WHITE, ResultReason::STALEMATE))
        );
    }

    #[test]
    fn insufficient_material_tables() {
        let v = VariantSet::STANDARD;
        for (fen, dead) in [
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/3NK3 w - - 0 1", true),
            ("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1", true),
            ("4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/2NNK3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false),
        ] {
            assert_eq!(
                is_insufficient_material(&parse_position(fen, v).unwrap()),
                dead,
                "{fen}"
            );
        }
        let atomic = VariantSet::STANDARD.with(Variant::ATOMIC);
        assert!(is_insufficient_material(
            &parse_position("4k3/8/8/8/8/8/8/3BK3 w - - 0 1", atomic).unwrap()
        ));
        let crazy = VariantSet::STANDARD.with(Variant::CRAZYHOUSE);
        assert!(!is_insufficient_material(
            &parse_position("4k3/8/8/8/8/8/8/4K3 w - - 0 1", crazy).unwrap()
        ));
    }

    #[test]
    fn fifty_moves() {
        let v = VariantSet::STANDARD;
        assert_eq!(
            after("4k3/8/8/8/8/8/8/R3K3 w - - 99 80", v, "a1", "a2"),
            Some(GameResult::draw(ResultReason::FIFTY_MOVE_RULE))
        );
    }

    #[test]
    fn mating_material_for_timeouts() {
        let v = VariantSet::STANDARD;
        let pos = parse_position("4k3/8/8/8/8/8/8/3NK3 w - - 0 1", v).unwrap();
        assert!(!has_mating_material(&pos, Color::WHITE));
        assert!(!has_mating_material(&pos, Color::BLACK));
        let pos = parse_position("4k3/7p/8/8/8/8/8/3NK3 w - - 0 1", v).unwrap();
        assert!(has_mating_material(&pos, Color::WHITE));
    }
}
