//! # The mutator pipeline
//!
//! Every variant that changes what a move does is a [`Mutator`]. The
//! [`Pipeline`] for a game is assembled once from its variant set and
//! every move runs through it in a fixed order:
//!
//! 1. castling
//! 2. capture (en passant included)
//! 3. relocation of the moving piece
//! 4. promotion
//! 5. capture consequences: Atomic, Circe, Crazyhouse, Compensation,
//!    Absorption, Frankfurt; or instead the Benedict color flip
//! 6. the Alice board swap
//! 7. bookkeeping of the transient state

use std::fmt::Debug;

use strum::EnumIs;

use crate::model::{
    CastlingSide, Color, Location, MoveFrom, PieceId, PieceType, Square,
    castling,
    legality,
    movegen::{self, GenMode},
    moving::MoveContext,
    position::{EnPassant, Position},
    variants::{Variant, VariantSet},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum MutationResult {
    Skipped,
    Applied,
}

use MutationResult::*;

pub trait Mutator: Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult;
}

/// The ordered mutators of one game.
#[derive(Debug)]
pub struct Pipeline(Vec<Box<dyn Mutator>>);

impl Pipeline {
    pub fn for_variants(variants: VariantSet) -> Self {
        use Variant::*;
        let mut res: Vec<Box<dyn Mutator>> = vec![Box::new(CastlingResolver)];
        let benedict = variants.has(BENEDICT);
        if !benedict {
            res.push(Box::new(CaptureResolver));
        }
        res.push(Box::new(Relocator));
        res.push(Box::new(Promoter));
        if benedict {
            res.push(Box::new(BenedictConverter));
        } else {
            if variants.has(ATOMIC) {
                res.push(Box::new(AtomicBlast));
            }
            if variants.has(CIRCE) {
                res.push(Box::new(CirceRebirth));
            }
            if variants.has(CRAZYHOUSE) {
                res.push(Box::new(CrazyhousePocket));
            }
            if variants.has(COMPENSATION) {
                res.push(Box::new(CompensationPocket));
            }
            if variants.has(ABSORPTION) {
                res.push(Box::new(Absorber));
            }
            if variants.has(FRANKFURT) {
                res.push(Box::new(FrankfurtSwap));
            }
        }
        if variants.has(ALICE_CHESS) {
            res.push(Box::new(AliceTeleport));
        }
        res.push(Box::new(Bookkeeper));
        Self(res)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Mutator> {
        self.0.iter().map(|m| m.as_ref())
    }

    /// Mutator names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|m| m.name()).collect()
    }
}

/// Moves king and rook for a castling move.
#[derive(Debug)]
pub struct CastlingResolver;

impl Mutator for CastlingResolver {
    fn name(&self) -> &'static str {
        "castling"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let Some(plan) = ctx.castling else {
            return Skipped;
        };
        ctx.lift(plan.king);
        ctx.lift(plan.rook);
        ctx.relocate(plan.king, Some(Location::Board(plan.king_to)));
        ctx.relocate(plan.rook, Some(Location::Board(plan.rook_to)));
        ctx.modify(plan.king, |p| p.moved = true);
        ctx.modify(plan.rook, |p| p.moved = true);
        Applied
    }
}

/// Determines and removes the captured piece.
#[derive(Debug)]
pub struct CaptureResolver;

impl Mutator for CaptureResolver {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        if ctx.castling.is_some() || ctx.mv.is_drop() {
            return Skipped;
        }
        let to = ctx.mv.to;
        let mover = ctx.pos.piece(ctx.piece);
        let victim = match ctx.pos.at(to) {
            Some(target) if target.color != mover.color => Some(target.id),
            Some(target) => panic!(
                "{:?} would capture its own {:?} on {}",
                mover.kind,
                target.kind,
                ctx.pos.topology().square_name(to)
            ),
            None if mover.kind == PieceType::PAWN
                && movegen::is_en_passant_target(ctx.pos, mover.color, to) =>
            {
                ctx.pos.en_passant().and_then(|ep| ctx.pos.id_at(ep.victim))
            }
            None => None,
        };
        let Some(victim) = victim else {
            return Skipped;
        };
        ctx.kill(victim);
        ctx.captured = Some(victim);
        ctx.capture_square = Some(to);
        Applied
    }
}

/// Puts the moving piece on its destination, from the board or a pocket.
#[derive(Debug)]
pub struct Relocator;

impl Mutator for Relocator {
    fn name(&self) -> &'static str {
        "relocate"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        if ctx.castling.is_some() {
            return Skipped;
        }
        let to = ctx.mv.to;
        let topo = ctx.pos.topology();
        let piece = ctx.piece;
        ctx.relocate(piece, Some(Location::Board(to)));
        let moved = match ctx.mv.from {
            MoveFrom::Square(_) => true,
            MoveFrom::Pocket(kind) => {
                kind != PieceType::PAWN || !topo.is_pawn_home(to, ctx.mover)
            }
        };
        ctx.modify(piece, |p| p.moved = moved);
        Applied
    }
}

/// Promotes pawns reaching their last rank.
///
/// Under Frankfurt a pawn that captures a piece takes on its type rather
/// than promoting.
#[derive(Debug)]
pub struct Promoter;

impl Mutator for Promoter {
    fn name(&self) -> &'static str {
        "promote"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let piece = ctx.pos.piece(ctx.piece);
        let Some(sq) = piece.square() else {
            return Skipped;
        };
        if piece.kind != PieceType::PAWN || !ctx.pos.topology().is_last_rank(sq, piece.color) {
            return Skipped;
        }
        if ctx.pos.variants().has(Variant::FRANKFURT)
            && ctx
                .captured
                .is_some_and(|c| ctx.before(c).kind != PieceType::PAWN)
        {
            return Skipped;
        }
        let kind = ctx.mv.promotion.unwrap_or(PieceType::QUEEN);
        ctx.modify(ctx.piece, |p| p.kind = kind);
        ctx.promoted = Some(kind);
        Applied
    }
}

/// Atomic explosions: the capturing piece and every non-pawn next to the
/// capture square go down with the captured piece.
#[derive(Debug)]
pub struct AtomicBlast;

impl Mutator for AtomicBlast {
    fn name(&self) -> &'static str {
        "atomic"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let (Some(_), Some(centre)) = (ctx.captured, ctx.capture_square) else {
            return Skipped;
        };
        let mut victims = vec![ctx.piece];
        victims.extend(
            ctx.pos
                .topology()
                .neighbours(centre)
                .filter_map(|sq| ctx.pos.at(sq))
                .filter(|p| p.kind != PieceType::PAWN)
                .map(|p| p.id),
        );
        for id in victims {
            ctx.kill(id);
        }
        Applied
    }
}

/// Circe: every piece taken off by this move is reborn on its home
/// square if that is empty. Royal pieces are not reborn.
#[derive(Debug)]
pub struct CirceRebirth;

impl Mutator for CirceRebirth {
    fn name(&self) -> &'static str {
        "circe"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let mut result = Skipped;
        for id in ctx.casualties.clone() {
            let piece = ctx.pos.piece(id);
            if !piece.is_dead() || piece.royal {
                continue;
            }
            let died_on = if id == ctx.piece {
                Some(ctx.mv.to)
            } else {
                ctx.before(id).square()
            };
            let Some(died_on) = died_on else {
                continue;
            };
            let Some(home) = rebirth_square(ctx.pos, id, died_on) else {
                continue;
            };
            if !ctx.pos.is_empty(home) {
                continue;
            }
            ctx.relocate(id, Some(Location::Board(home)));
            ctx.modify(id, |p| p.moved = false);
            ctx.reborn.push(id);
            result = Applied;
        }
        result
    }
}

/// Where a piece that died on `died_on` would be reborn.
///
/// Pawns return to the start square of the file they died on. Other
/// pieces return to a home square of their type and color, preferring
/// one of the same square color and then the nearest file.
pub fn rebirth_square(pos: &Position, id: PieceId, died_on: Square) -> Option<Square> {
    let piece = pos.piece(id);
    let topo = pos.topology();
    if piece.kind == PieceType::PAWN {
        return topo.pawn_start(0, died_on.x, piece.color);
    }
    let shade = topo.square_color(died_on.on_board(0));
    pos.homes()
        .iter()
        .filter(|h| h.kind == piece.kind && h.color == piece.color)
        .min_by_key(|h| {
            (
                topo.square_color(h.square) != shade,
                (h.square.x - died_on.x).abs(),
            )
        })
        .map(|h| h.square)
}

/// Crazyhouse: the captured piece changes sides into the capturer's
/// pocket as its original type.
#[derive(Debug)]
pub struct CrazyhousePocket;

impl Mutator for CrazyhousePocket {
    fn name(&self) -> &'static str {
        "crazyhouse"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let Some(id) = ctx.captured else {
            return Skipped;
        };
        let piece = ctx.pos.piece(id);
        if !piece.is_dead() || piece.royal || piece.kind == PieceType::KING {
            return Skipped;
        }
        let mover = ctx.mover;
        ctx.modify(id, |p| {
            p.color = mover;
            p.kind = p.original;
            p.abilities = None;
            p.royal = false;
            p.moved = false;
        });
        ctx.relocate(id, Some(Location::Pocket(mover)));
        Applied
    }
}

/// Compensation: a captured officer goes back to its owner's pocket as
/// a pawn.
#[derive(Debug)]
pub struct CompensationPocket;

impl Mutator for CompensationPocket {
    fn name(&self) -> &'static str {
        "compensation"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let Some(id) = ctx.captured else {
            return Skipped;
        };
        let piece = ctx.pos.piece(id);
        if !piece.is_dead()
            || piece.royal
            || matches!(piece.kind, PieceType::PAWN | PieceType::KING)
        {
            return Skipped;
        }
        let owner = piece.color;
        ctx.modify(id, |p| {
            p.kind = PieceType::PAWN;
            p.original = PieceType::PAWN;
            p.abilities = None;
            p.moved = false;
        });
        ctx.relocate(id, Some(Location::Pocket(owner)));
        Applied
    }
}

/// Absorption: the capturer gains the movement of what it captured.
///
/// Pawns absorb nothing. Royal kings keep their type and collect the
/// absorbed movement as abilities.
#[derive(Debug)]
pub struct Absorber;

impl Mutator for Absorber {
    fn name(&self) -> &'static str {
        "absorption"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let Some(victim) = ctx.captured else {
            return Skipped;
        };
        let capturer = ctx.pos.piece(ctx.piece);
        if !capturer.is_on_board() || capturer.kind == PieceType::PAWN {
            return Skipped;
        }
        let gained = ctx.before(victim).components();
        if gained == 0 {
            return Skipped;
        }
        if capturer.kind == PieceType::KING {
            let abilities = PieceType::from_components(
                capturer.abilities.map(PieceType::components).unwrap_or(0) | gained,
            );
            if abilities == capturer.abilities {
                return Skipped;
            }
            ctx.modify(ctx.piece, |p| p.abilities = abilities);
        } else {
            let Some(kind) = PieceType::from_components(capturer.kind.components() | gained)
            else {
                return Skipped;
            };
            if kind == capturer.kind {
                return Skipped;
            }
            ctx.modify(ctx.piece, |p| p.kind = kind);
        }
        Applied
    }
}

/// Frankfurt: the capturer takes on the type of what it captured,
/// keeping its royalty. A capturer that would become a pawn on its last
/// rank keeps its own type.
#[derive(Debug)]
pub struct FrankfurtSwap;

impl Mutator for FrankfurtSwap {
    fn name(&self) -> &'static str {
        "frankfurt"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let Some(victim) = ctx.captured else {
            return Skipped;
        };
        let capturer = ctx.pos.piece(ctx.piece);
        let Some(sq) = capturer.square() else {
            return Skipped;
        };
        let kind = ctx.before(victim).kind;
        if kind == capturer.kind
            || (kind == PieceType::PAWN && ctx.pos.topology().is_last_rank(sq, capturer.color))
        {
            return Skipped;
        }
        ctx.modify(ctx.piece, |p| {
            p.kind = kind;
            p.abilities = None;
        });
        Applied
    }
}

/// Benedict: every enemy piece the moved piece now attacks changes sides.
#[derive(Debug)]
pub struct BenedictConverter;

impl Mutator for BenedictConverter {
    fn name(&self) -> &'static str {
        "benedict"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let mover = ctx.mover;
        let converts: Vec<PieceId> = movegen::generate(ctx.pos, ctx.piece, GenMode::ATTACKED)
            .into_iter()
            .filter_map(|sq| ctx.pos.at(sq))
            .filter(|p| p.color != mover)
            .map(|p| p.id)
            .collect();
        if converts.is_empty() {
            return Skipped;
        }
        for id in converts {
            ctx.modify(id, |p| p.color = mover);
            ctx.flipped.push(id);
        }
        Applied
    }
}

/// Alice Chess: the moved piece, and a castling rook, pass through to the
/// next board, capturing an enemy piece waiting there.
#[derive(Debug)]
pub struct AliceTeleport;

impl Mutator for AliceTeleport {
    fn name(&self) -> &'static str {
        "alice"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let mut travellers = vec![ctx.piece];
        if let Some(plan) = ctx.castling {
            travellers.push(plan.rook);
        }
        let topo = ctx.pos.topology();
        let mut result = Skipped;
        for id in travellers {
            let piece = ctx.pos.piece(id);
            let Some(sq) = piece.square() else {
                continue;
            };
            let color = piece.color;
            let target = topo.next_board(sq);
            if let Some(other) = ctx.pos.at(target) {
                if other.color == color {
                    panic!(
                        "alice transfer onto a friendly piece on {}",
                        topo.square_name(target)
                    );
                }
                let other = other.id;
                ctx.kill(other);
                ctx.captured.get_or_insert(other);
            }
            ctx.relocate(id, Some(Location::Board(target)));
            result = Applied;
        }
        result
    }
}

/// Updates the transient state once the pieces have settled: en passant,
/// the halfmove clock, check counters, castling rights and the turn.
#[derive(Debug)]
pub struct Bookkeeper;

impl Mutator for Bookkeeper {
    fn name(&self) -> &'static str {
        "bookkeeping"
    }

    fn apply(&self, ctx: &mut MoveContext<'_>) -> MutationResult {
        let variants = ctx.pos.variants();
        let topo = ctx.pos.topology();
        let mover = ctx.mover;
        let pawn_move = ctx.before(ctx.piece).kind == PieceType::PAWN && !ctx.mv.is_drop();

        let mut en_passant = None;
        if pawn_move && topo.boards == 1 {
            if let Some(from) = ctx.from {
                let fwd = topo.forward(mover);
                let middle = topo.offset(from, 0, fwd);
                let landing = middle.and_then(|m| topo.offset(m, 0, fwd));
                if landing == Some(ctx.mv.to) && ctx.landed() == Some(ctx.mv.to) {
                    en_passant = middle.map(|target| EnPassant {
                        target,
                        victim: ctx.mv.to,
                    });
                }
            }
        }
        // Only a target some enemy pawn could take on counts.
        let en_passant = en_passant.filter(|ep| {
            ctx.pos
                .on_board(mover.opp())
                .filter(|p| p.kind == PieceType::PAWN)
                .any(|p| {
                    p.square().is_some_and(|sq| {
                        movegen::pseudo(ctx.pos, p, sq, GenMode::ATTACKED).contains(&ep.target)
                    })
                })
        });

        let quiet_pawn = variants.has(Variant::RETREAT) || variants.has(Variant::CIRCE);
        let irreversible = ctx.captured.is_some()
            || !ctx.casualties.is_empty()
            || !ctx.flipped.is_empty()
            || ctx.mv.is_drop()
            || (pawn_move && !quiet_pawn);

        let gave_check =
            variants.has(Variant::THREE_CHECK) && legality::in_check(ctx.pos, mover.opp());

        let mut rights = ctx.pos.state().castling;
        for color in [Color::WHITE, Color::BLACK] {
            for side in [CastlingSide::KINGSIDE, CastlingSide::QUEENSIDE] {
                let right = &mut rights[color.ix()][side.ix()];
                *right = *right && castling::castling_rook(ctx.pos, color, side).is_some();
            }
        }

        let state = ctx.pos.state_mut();
        state.en_passant = en_passant;
        state.castling = rights;
        state.halfmove = if irreversible {
            0
        } else {
            state.halfmove.saturating_add(1)
        };
        if gave_check {
            state.checks[mover.ix()] = state.checks[mover.ix()].saturating_add(1);
        }
        if variants.has(Variant::MONSTER) && mover == Color::WHITE && state.monster_step == 0 {
            state.monster_step = 1;
        } else {
            state.monster_step = 0;
            state.turn = mover.opp();
            if mover == Color::BLACK {
                state.fullmove = state.fullmove.saturating_add(1);
            }
        }
        Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            Move,
            moving::{make_move, unmake_move},
        },
        notation::fen::parse_position,
    };

    fn play(fen: &str, variants: VariantSet, from: &str, to: &str) -> (Position, Position) {
        let before = parse_position(fen, variants).unwrap();
        let topo = before.topology();
        let mv = Move::new(
            topo.parse_square(from).unwrap(),
            topo.parse_square(to).unwrap(),
        );
        let mut after = before.clone();
        let (patch, _) = make_move(&mut after, mv);
        let mut reverted = after.clone();
        unmake_move(&mut reverted, patch);
        assert_eq!(reverted, before);
        (before, after)
    }

    fn kind_at(pos: &Position, name: &str) -> Option<(PieceType, Color)> {
        let sq = pos.topology().parse_square(name).unwrap();
        pos.at(sq).map(|p| (p.kind, p.color))
    }

    #[test]
    fn pipeline_order() {
        let v = VariantSet::STANDARD
            .with(Variant::FRANKFURT)
            .with(Variant::ATOMIC)
            .with(Variant::CIRCE)
            .with(Variant::ALICE_CHESS);
        assert_eq!(
            Pipeline::for_variants(v).names(),
            [
                "castling",
                "capture",
                "relocate",
                "promote",
                "atomic",
                "circe",
                "frankfurt",
                "alice",
                "bookkeeping"
            ]
        );
        let b = Pipeline::for_variants(VariantSet::STANDARD.with(Variant::BENEDICT));
        assert!(!b.names().contains(&"capture"));
        assert!(b.names().contains(&"benedict"));
    }

    #[test]
    fn atomic_explosion_spares_pawns() {
        let v = VariantSet::STANDARD.with(Variant::ATOMIC);
        let (_, after) = play("4k3/8/2np4/3r4/8/8/8/3QK3 w - - 0 1", v, "d1", "d5");
        assert_eq!(kind_at(&after, "d5"), None);
        assert_eq!(kind_at(&after, "c6"), None);
        assert_eq!(kind_at(&after, "d6"), Some((PieceType::PAWN, Color::BLACK)));
        assert_eq!(after.dead().count(), 3);
    }

    #[test]
    fn circe_rebirth_needs_an_empty_square() {
        let v = VariantSet::STANDARD.with(Variant::CIRCE);
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let (_, after) = play(fen, v, "e4", "d5");
        assert_eq!(kind_at(&after, "d7"), Some((PieceType::PAWN, Color::BLACK)));
        assert_eq!(after.dead().count(), 0);

        let fen = "4k3/3p4/8/3p4/4P3/8/8/4K3 w - - 0 2";
        let (_, after) = play(fen, v, "e4", "d5");
        assert_eq!(after.dead().count(), 1);
    }

    #[test]
    fn circe_officers_return_to_matching_home() {
        let v = VariantSet::STANDARD.with(Variant::CIRCE);
        let fen = "rnbqk1nr/pppp1ppp/8/8/8/4b3/PPPPQPPP/RNB1KBNR w KQkq - 0 3";
        let (_, after) = play(fen, v, "e2", "e3");
        // e3 is dark, like f8
        assert_eq!(kind_at(&after, "f8"), Some((PieceType::BISHOP, Color::BLACK)));
    }

    #[test]
    fn crazyhouse_pockets_the_original_type() {
        let v = VariantSet::STANDARD.with(Variant::CRAZYHOUSE);
        let (_, after) = play("4k3/8/8/3q~4/4P3/8/8/4K3 w - - 0 1", v, "e4", "d5");
        let pocket: Vec<_> = after.pocket(Color::WHITE).map(|p| p.kind).collect();
        assert_eq!(pocket, [PieceType::PAWN]);
    }

    #[test]
    fn compensation_returns_a_pawn_to_the_owner() {
        let v = VariantSet::STANDARD.with(Variant::COMPENSATION);
        let (_, after) = play("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1", v, "e4", "d5");
        let pocket: Vec<_> = after.pocket(Color::BLACK).map(|p| p.kind).collect();
        assert_eq!(pocket, [PieceType::PAWN]);
    }

    #[test]
    fn absorption_merges_movement() {
        let v = VariantSet::STANDARD.with(Variant::ABSORPTION);
        let (_, after) = play("4k3/8/8/3n4/8/8/8/3RK3 w - - 0 1", v, "d1", "d5");
        assert_eq!(kind_at(&after, "d5"), Some((PieceType::EMPRESS, Color::WHITE)));
        let (_, after) = play("4k3/8/8/8/8/8/3b4/4K3 w - - 0 1", v, "e1", "d2");
        let king = after.at(Square::at(3, 1)).unwrap();
        assert_eq!(king.kind, PieceType::KING);
        assert_eq!(king.abilities, Some(PieceType::BISHOP));
    }

    #[test]
    fn frankfurt_takes_the_captured_type() {
        let v = VariantSet::STANDARD.with(Variant::FRANKFURT);
        let (_, after) = play("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1", v, "e4", "d5");
        assert_eq!(kind_at(&after, "d5"), Some((PieceType::QUEEN, Color::WHITE)));
        let (_, after) = play("4k3/8/8/8/8/8/3r4/4K3 w - - 0 1", v, "e1", "d2");
        let royal = after.at(Square::at(3, 1)).unwrap();
        assert_eq!(royal.kind, PieceType::ROOK);
        assert!(royal.royal);
    }

    #[test]
    fn benedict_flips_attacked_pieces() {
        let v = VariantSet::STANDARD.with(Variant::BENEDICT);
        let fen = "4k3/8/8/1r1r4/8/8/8/3NK3 w - - 0 1";
        let (_, after) = play(fen, v, "d1", "c3");
        assert_eq!(kind_at(&after, "b5"), Some((PieceType::ROOK, Color::WHITE)));
        assert_eq!(kind_at(&after, "d5"), Some((PieceType::ROOK, Color::WHITE)));
        let (_, after) = play(fen, v, "d1", "e3");
        assert_eq!(kind_at(&after, "b5"), Some((PieceType::ROOK, Color::BLACK)));
        assert_eq!(kind_at(&after, "d5"), Some((PieceType::ROOK, Color::WHITE)));
    }

    #[test]
    fn alice_moves_change_boards() {
        let v = VariantSet::STANDARD.with(Variant::ALICE_CHESS);
        let (_, after) = play(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR|8/8/8/8/8/8/8/8 w KQkq - 0 1",
            v,
            "e2",
            "e4",
        );
        assert_eq!(kind_at(&after, "e4'"), Some((PieceType::PAWN, Color::WHITE)));
        assert_eq!(kind_at(&after, "e4"), None);
        assert_eq!(after.en_passant(), None);
    }

    #[test]
    fn monster_white_moves_twice() {
        let v = VariantSet::STANDARD.with(Variant::MONSTER);
        let (_, after) = play("rnbqkbnr/pppppppp/8/8/8/8/2PPPP2/4K3 w kq - 0 1", v, "e2", "e4");
        assert_eq!(after.turn(), Color::WHITE);
        assert_eq!(after.state().monster_step, 1);
    }

    #[test]
    fn reversible_pawn_moves_keep_the_clock() {
        let fen = "4k3/8/8/8/4P3/8/8/4K3 w - - 7 30";
        let v = VariantSet::STANDARD.with(Variant::RETREAT);
        let (_, after) = play(fen, v, "e4", "e3");
        assert_eq!(after.state().halfmove, 8);
        let v = VariantSet::STANDARD.with(Variant::CIRCE);
        let (_, after) = play(fen, v, "e4", "e5");
        assert_eq!(after.state().halfmove, 8);
        let (_, after) = play(fen, VariantSet::STANDARD, "e4", "e5");
        assert_eq!(after.state().halfmove, 0);
    }

    #[test]
    fn atomic_circe_rebirths_every_casualty() {
        let v = VariantSet::STANDARD
            .with(Variant::ATOMIC)
            .with(Variant::CIRCE);
        let (_, after) = play("4k3/8/6b1/7n/6p1/7R/8/4K3 w - - 0 1", v, "h3", "h5");
        assert_eq!(kind_at(&after, "h1"), Some((PieceType::ROOK, Color::WHITE)));
        assert_eq!(kind_at(&after, "g8"), Some((PieceType::KNIGHT, Color::BLACK)));
        assert_eq!(kind_at(&after, "c8"), Some((PieceType::BISHOP, Color::BLACK)));
        assert_eq!(kind_at(&after, "g4"), Some((PieceType::PAWN, Color::BLACK)));
        assert_eq!(kind_at(&after, "h5"), None);
        assert_eq!(kind_at(&after, "g6"), None);
        assert_eq!(after.dead().count(), 0);
    }

    #[test]
    fn en_passant_only_when_a_pawn_can_take() {
        let v = VariantSet::STANDARD;
        let (_, after) = play("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", v, "e2", "e4");
        assert_eq!(after.en_passant(), None);
        let (_, after) = play("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1", v, "e2", "e4");
        assert_eq!(
            after.en_passant().map(|ep| ep.target),
            after.topology().parse_square("e3")
        );
    }

    #[test]
    fn counters_saturate() {
        let v = VariantSet::STANDARD.with(Variant::THREE_CHECK);
        let (_, after) = play("4k3/8/8/8/8/8/8/R3K3 w - - 65535 9 +255+0", v, "a1", "a8");
        assert_eq!(after.state().checks, [255, 0]);
        assert_eq!(after.state().halfmove, u16::MAX);
        let (_, after) = play("4k3/8/8/8/8/8/8/4K3 b - - 0 65535", v, "e8", "e7");
        assert_eq!(after.state().fullmove, u16::MAX);
    }
}
