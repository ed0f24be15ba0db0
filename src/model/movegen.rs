//! # Pseudo-legal move generation
//!
//! [`generate`] produces the destination squares of a single piece for one
//! of the [`GenMode`]s. Every piece type is built out of topology-aware
//! steps, leaps and slides, so compound pieces simply compose them.
//!
//! Nothing here considers whether the mover's royal pieces end up safe;
//! that is the job of [`crate::model::legality`].

use strum::{EnumIs, EnumIter, IntoStaticStr};

use crate::model::{
    Color, LEAPS_KNIGHT, Move, Piece, PieceId, PieceType, RIDES_DIAGONAL, RIDES_ORTHOGONAL,
    Square, castling, legality, position::Position, variants::Variant,
};

/// Why destinations are being asked for.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, EnumIter, IntoStaticStr)]
pub enum GenMode {
    /// Pseudo-legal destinations, castling and en passant included.
    FOR_MOVE,
    /// Squares the piece could capture on. Kings attack nothing under
    /// Atomic since they may not capture.
    ATTACKED,
    /// Like `ATTACKED` but kings always count, used for patrol.
    CONTROLLED,
    /// What the piece can see for Dark Chess: its moves, its attacks
    /// and the square that blocks a pawn's advance.
    VISIBLE,
    /// The movement pattern on an empty board.
    POSSIBLE,
    /// `POSSIBLE` plus pawn capture squares and castling targets.
    PREMOVES,
}

/// Destinations of a piece in the given mode, sorted and free of
/// duplicates. Pieces off the board have none.
pub fn generate(pos: &Position, id: PieceId, mode: GenMode) -> Vec<Square> {
    let piece = pos.piece(id);
    let Some(from) = piece.square() else {
        return vec![];
    };
    let variants = pos.variants();

    if matches!(mode, GenMode::FOR_MOVE | GenMode::ATTACKED) && legality::is_paralysed(pos, id)
    {
        return vec![];
    }

    let mut out = pseudo(pos, piece, from, mode);

    if mode.is_for_move() {
        let topo = pos.topology();
        let enemy_at = |sq: Square| pos.at(sq).is_some_and(|p| p.color != piece.color);
        if variants.has(Variant::BENEDICT) {
            out.retain(|&sq| pos.is_empty(sq));
        }
        if variants.has(Variant::ATOMIC) && piece.kind == PieceType::KING {
            out.retain(|&sq| !enemy_at(sq));
        }
        if topo.boards > 1 {
            out.retain(|&sq| {
                pos.at(topo.next_board(sq))
                    .is_none_or(|p| p.color != piece.color || p.id == id)
            });
        }
        for plan in castling::plans(pos, id, !variants.no_checks()) {
            out.push(plan.gesture);
        }
    }

    if mode.is_premoves() {
        out.extend(castling::premove_squares(pos, id));
    }

    out.sort_unstable();
    out.dedup();
    out
}

/// Movement of a piece standing on `from`, without paralysis, castling
/// or variant restrictions.
pub(crate) fn pseudo(pos: &Position, piece: &Piece, from: Square, mode: GenMode) -> Vec<Square> {
    let mut out = Vec::with_capacity(32);
    let topo = pos.topology();

    if mode.is_attacked() && piece.kind == PieceType::KING && pos.variants().has(Variant::ATOMIC) {
        return out;
    }

    match piece.kind {
        PieceType::PAWN => pawn(pos, piece, from, mode, &mut out),
        PieceType::KING => {
            let steps: Vec<_> = topo.king_steps().collect();
            leaps(pos, piece.color, from, &steps, mode, &mut out)
        }
        _ => {}
    }

    let comps = piece.components();
    if comps & RIDES_ORTHOGONAL != 0 {
        slides(pos, piece.color, from, topo.orthogonals(), mode, &mut out);
    }
    if comps & RIDES_DIAGONAL != 0 {
        slides(pos, piece.color, from, topo.diagonals(), mode, &mut out);
    }
    if comps & LEAPS_KNIGHT != 0 {
        leaps(pos, piece.color, from, topo.knight_jumps(), mode, &mut out);
    }
    out
}

fn leaps(
    pos: &Position,
    color: Color,
    from: Square,
    dirs: &[(i8, i8)],
    mode: GenMode,
    out: &mut Vec<Square>,
) {
    let topo = pos.topology();
    for &(dx, dy) in dirs {
        let Some(to) = topo.offset(from, dx, dy) else {
            continue;
        };
        match mode {
            GenMode::FOR_MOVE => {
                if pos.at(to).is_none_or(|p| p.color != color) {
                    out.push(to)
                }
            }
            _ => out.push(to),
        }
    }
}

fn slides(
    pos: &Position,
    color: Color,
    from: Square,
    dirs: &[(i8, i8)],
    mode: GenMode,
    out: &mut Vec<Square>,
) {
    let topo = pos.topology();
    let ignore_blockers = matches!(mode, GenMode::POSSIBLE | GenMode::PREMOVES);
    for &dir in dirs {
        for to in topo.ray(from, dir) {
            match pos.at(to) {
                None => out.push(to),
                Some(_) if ignore_blockers => out.push(to),
                Some(blocker) => {
                    if !mode.is_for_move() || blocker.color != color {
                        out.push(to);
                    }
                    break;
                }
            }
        }
    }
}

fn pawn(pos: &Position, piece: &Piece, from: Square, mode: GenMode, out: &mut Vec<Square>) {
    let topo = pos.topology();
    let color = piece.color;
    let fwd = topo.forward(color);
    let ignore_blockers = matches!(mode, GenMode::POSSIBLE | GenMode::PREMOVES);
    let pushes = !matches!(mode, GenMode::ATTACKED | GenMode::CONTROLLED);
    let hits = !matches!(mode, GenMode::FOR_MOVE | GenMode::POSSIBLE);

    if pushes {
        if let Some(one) = topo.offset(from, 0, fwd) {
            if ignore_blockers || pos.is_empty(one) {
                out.push(one);
                if !piece.moved && topo.is_pawn_home(from, color) {
                    if let Some(two) = topo.offset(one, 0, fwd) {
                        if ignore_blockers || pos.is_empty(two) {
                            out.push(two);
                        }
                    }
                }
            } else if mode.is_visible() {
                out.push(one);
            }
        }
        if pos.variants().has(Variant::RETREAT) {
            if let Some(back) = topo.offset(from, 0, -fwd) {
                if !topo.is_first_rank(back, color) && (ignore_blockers || pos.is_empty(back)) {
                    out.push(back);
                }
            }
        }
    }

    for (dx, dy) in topo.pawn_captures(color) {
        let Some(to) = topo.offset(from, dx, dy) else {
            continue;
        };
        if hits {
            out.push(to);
        } else if mode.is_for_move() {
            match pos.at(to) {
                Some(p) if p.color != color => out.push(to),
                None if is_en_passant_target(pos, color, to) => out.push(to),
                _ => {}
            }
        }
    }
}

/// Whether a pawn of `color` moving onto `to` would capture en passant.
pub fn is_en_passant_target(pos: &Position, color: Color, to: Square) -> bool {
    pos.en_passant().is_some_and(|ep| {
        ep.target == to
            && pos
                .at(ep.victim)
                .is_some_and(|p| p.color != color && p.kind == PieceType::PAWN)
    })
}

/// Pieces that may be promoted to.
pub fn promotion_options(pos: &Position) -> Vec<PieceType> {
    let variants = pos.variants();
    let mut res = vec![
        PieceType::QUEEN,
        PieceType::ROOK,
        PieceType::BISHOP,
        PieceType::KNIGHT,
    ];
    if variants.has(Variant::CAPABLANCA) {
        res.extend([PieceType::EMPRESS, PieceType::CARDINAL]);
    }
    if variants.has(Variant::ANTICHESS) {
        res.push(PieceType::KING);
    }
    res
}

/// Whether moving this piece to `to` asks for a promotion choice.
///
/// Under Frankfurt a pawn capturing a piece takes on its type instead.
pub fn needs_promotion(pos: &Position, id: PieceId, to: Square) -> bool {
    let piece = pos.piece(id);
    if piece.kind != PieceType::PAWN || !pos.topology().is_last_rank(to, piece.color) {
        return false;
    }
    !(pos.variants().has(Variant::FRANKFURT)
        && pos
            .at(to)
            .is_some_and(|p| p.color != piece.color && p.kind != PieceType::PAWN))
}

/// Squares a pocketed piece of this type may be dropped on.
pub fn drop_squares(pos: &Position, color: Color, kind: PieceType) -> Vec<Square> {
    let topo = pos.topology();
    topo.squares()
        .filter(|&sq| pos.is_empty(sq))
        .filter(|&sq| {
            kind != PieceType::PAWN
                || !(topo.is_first_rank(sq, Color::WHITE) || topo.is_last_rank(sq, Color::WHITE))
        })
        .filter(|&sq| topo.boards < 2 || pos.at(topo.next_board(sq)).is_none_or(|p| p.color != color))
        .collect()
}

/// Every pseudo-legal move for the side to move, promotions expanded and
/// drops included.
pub fn candidates(pos: &Position) -> Vec<Move> {
    let color = pos.turn();
    let mut res = vec![];
    let options = promotion_options(pos);
    for piece in pos.on_board(color) {
        let Some(from) = piece.square() else {
            continue;
        };
        for to in generate(pos, piece.id, GenMode::FOR_MOVE) {
            if needs_promotion(pos, piece.id, to) {
                res.extend(options.iter().map(|&p| Move::promoting(from, to, p)));
            } else {
                res.push(Move::new(from, to));
            }
        }
    }
    if pos.variants().has_pockets() {
        let mut kinds: Vec<PieceType> = pos.pocket(color).map(|p| p.kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        for kind in kinds {
            res.extend(
                drop_squares(pos, color, kind)
                    .into_iter()
                    .map(|to| Move::drop(kind, to)),
            );
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::variants::VariantSet, notation::fen::parse_position};

    fn destinations(fen: &str, variants: VariantSet, from: &str, mode: GenMode) -> Vec<String> {
        let pos = parse_position(fen, variants).unwrap();
        let topo = pos.topology();
        let id = pos.id_at(topo.parse_square(from).unwrap()).unwrap();
        generate(&pos, id, mode)
            .into_iter()
            .map(|sq| topo.square_name(sq))
            .collect()
    }

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn knights_and_pawns_from_the_start() {
        let mut n = destinations(START, VariantSet::STANDARD, "g1", GenMode::FOR_MOVE);
        n.sort();
        assert_eq!(n, ["f3", "h3"]);
        let mut p = destinations(START, VariantSet::STANDARD, "e2", GenMode::FOR_MOVE);
        p.sort();
        assert_eq!(p, ["e3", "e4"]);
        let mut a = destinations(START, VariantSet::STANDARD, "e2", GenMode::ATTACKED);
        a.sort();
        assert_eq!(a, ["d3", "f3"]);
    }

    #[test]
    fn blocked_pawns_still_see_their_blocker() {
        let fen = "4k3/8/8/8/4p3/4P3/8/4K3 w - - 0 1";
        let v = destinations(fen, VariantSet::STANDARD, "e3", GenMode::VISIBLE);
        assert!(v.contains(&"e4".to_string()));
        assert!(destinations(fen, VariantSet::STANDARD, "e3", GenMode::FOR_MOVE).is_empty());
        assert_eq!(
            destinations(fen, VariantSet::STANDARD, "e3", GenMode::POSSIBLE),
            ["e4"]
        );
    }

    #[test]
    fn en_passant_is_generated() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        let mut v = destinations(fen, VariantSet::STANDARD, "e5", GenMode::FOR_MOVE);
        v.sort();
        assert_eq!(v, ["d6", "e6"]);
    }

    #[test]
    fn retreat_adds_a_backward_step() {
        let fen = "4k3/8/8/8/4P3/8/8/4K3 w - - 0 1";
        let variants = VariantSet::STANDARD.with(Variant::RETREAT);
        let mut v = destinations(fen, variants, "e4", GenMode::FOR_MOVE);
        v.sort();
        assert_eq!(v, ["e3", "e5"]);
        let fen = "4k3/8/8/8/8/8/4P3/K7 w - - 0 1";
        let mut v = destinations(fen, variants, "e2", GenMode::FOR_MOVE);
        v.sort();
        assert_eq!(v, ["e3", "e4"]);
    }

    #[test]
    fn compound_pieces_compose() {
        let fen = "4k3/8/8/8/3M4/8/8/4K3 w - - 0 1";
        let amazon = destinations(fen, VariantSet::STANDARD, "d4", GenMode::FOR_MOVE);
        assert_eq!(amazon.len(), 27 + 8);
        let fen = "4k3/8/8/8/3A4/8/8/4K3 w - - 0 1";
        let cardinal = destinations(fen, VariantSet::STANDARD, "d4", GenMode::FOR_MOVE);
        assert_eq!(cardinal.len(), 13 + 8);
    }

    #[test]
    fn cylinder_rooks_wrap_around() {
        let fen = "k7/8/8/8/8/8/7K/R1N5 w - - 0 1";
        let variants = VariantSet::STANDARD.with(Variant::CYLINDER);
        let v = destinations(fen, variants, "a1", GenMode::FOR_MOVE);
        // the knight on c1 blocks the short way, the long way wraps
        assert!(v.contains(&"h1".to_string()));
        assert!(v.contains(&"d1".to_string()));
        assert!(!v.contains(&"c1".to_string()));
        assert_eq!(v.len(), 7 + 1 + 5);
    }

    #[test]
    fn atomic_kings_never_capture() {
        let fen = "4k3/8/8/8/8/8/4p3/4K3 w - - 0 1";
        let variants = VariantSet::STANDARD.with(Variant::ATOMIC);
        let v = destinations(fen, variants, "e1", GenMode::FOR_MOVE);
        assert!(!v.contains(&"e2".to_string()));
        assert!(destinations(fen, variants, "e1", GenMode::ATTACKED).is_empty());
        assert!(!destinations(fen, variants, "e1", GenMode::CONTROLLED).is_empty());
    }

    #[test]
    fn premoves_ignore_occupancy() {
        let v = destinations(START, VariantSet::STANDARD, "a1", GenMode::PREMOVES);
        assert_eq!(v.len(), 14);
        let p = destinations(START, VariantSet::STANDARD, "e2", GenMode::PREMOVES);
        assert_eq!(p.len(), 4);
        let k = destinations(START, VariantSet::STANDARD, "e1", GenMode::PREMOVES);
        assert!(k.contains(&"g1".to_string()) && k.contains(&"c1".to_string()));
    }

    #[test]
    fn pawn_drops_avoid_back_ranks() {
        let pos = parse_position(
            "4k3/8/8/8/8/8/8/4K3[P] w - - 0 1",
            VariantSet::STANDARD.with(Variant::CRAZYHOUSE),
        )
        .unwrap();
        let squares = drop_squares(&pos, Color::WHITE, PieceType::PAWN);
        assert_eq!(squares.len(), 48);
        assert_eq!(candidates(&pos).iter().filter(|m| m.is_drop()).count(), 48);
    }

    #[test]
    fn hexagonal_pieces() {
        let variants = VariantSet::STANDARD.with(Variant::HEXAGONAL);
        let fen = "1/3/5/7/9/5N5/11/11/11/11/11 w - - 0 1";
        let pos = parse_position(fen, variants).unwrap();
        let topo = pos.topology();
        let f6 = topo.parse_square("f6").unwrap();
        let id = pos.id_at(f6).unwrap();
        assert_eq!(generate(&pos, id, GenMode::FOR_MOVE).len(), 12);
    }
}
