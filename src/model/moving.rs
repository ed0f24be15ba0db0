//! # Making and unmaking moves
//!
//! [`make_move`] runs a move through the position's mutator
//! [`Pipeline`](crate::model::mutators::Pipeline) and hands back an
//! [`InversePatch`]: plain data recording the prior state of every piece
//! the move touched, plus the prior transient state. [`unmake_move`]
//! applies it to restore the position exactly.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::{
    CastlingSide, Color, Location, Move, MoveFrom, Piece, PieceId, PieceType, Square,
    castling::{self, CastlingPlan},
    mutators::MutationResult,
    position::{Position, Transients},
};

/// Data-only undo record of a single move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InversePatch {
    /// Prior records of every piece the move touched.
    pub pieces: Vec<Piece>,
    pub state: Transients,
}

/// What a move did, for notation, history and the end evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub mover: Color,
    pub piece: PieceId,
    /// Type of the moving piece before the move.
    pub kind: PieceType,
    pub from: Option<Square>,
    pub castling: Option<CastlingSide>,
    pub captured: Option<PieceId>,
    /// Pieces that left the board because of this move.
    pub casualties: Vec<PieceId>,
    /// Pieces put back on the board by Circe.
    pub reborn: Vec<PieceId>,
    /// Pieces that changed color under Benedict.
    pub flipped: Vec<PieceId>,
    pub promoted: Option<PieceType>,
}

/// The state a move threads through the mutators.
pub struct MoveContext<'a> {
    pub pos: &'a mut Position,
    pub mv: Move,
    pub mover: Color,
    pub piece: PieceId,
    pub from: Option<Square>,
    pub castling: Option<CastlingPlan>,
    pub captured: Option<PieceId>,
    pub capture_square: Option<Square>,
    pub casualties: Vec<PieceId>,
    pub reborn: Vec<PieceId>,
    pub flipped: Vec<PieceId>,
    pub promoted: Option<PieceType>,
    saved: Vec<Piece>,
}

impl<'a> MoveContext<'a> {
    fn new(pos: &'a mut Position, mv: Move) -> Self {
        let mover = pos.turn();
        let piece = match mv.from {
            MoveFrom::Square(sq) => pos.id_at(sq).unwrap_or_else(|| {
                panic!("no piece to move on {}", pos.topology().square_name(sq))
            }),
            MoveFrom::Pocket(kind) => pos
                .pocket_piece(mover, kind)
                .unwrap_or_else(|| panic!("no {kind:?} in the {mover:?} pocket")),
        };
        let from = mv.from_square();
        let castling = from.and_then(|_| castling::plan_for(pos, piece, mv.to));
        Self {
            pos,
            mv,
            mover,
            piece,
            from,
            castling,
            captured: None,
            capture_square: None,
            casualties: vec![],
            reborn: vec![],
            flipped: vec![],
            promoted: None,
            saved: vec![],
        }
    }

    /// Remember a piece's record before its first modification.
    pub fn touch(&mut self, id: PieceId) {
        if !self.saved.iter().any(|p| p.id == id) {
            self.saved.push(self.pos.piece(id).clone());
        }
    }

    /// The record of a piece as it was before this move.
    pub fn before(&self, id: PieceId) -> &Piece {
        self.saved
            .iter()
            .find(|p| p.id == id)
            .unwrap_or_else(|| self.pos.piece(id))
    }

    /// Take a piece off the occupancy index ahead of relocating it.
    pub fn lift(&mut self, id: PieceId) {
        self.touch(id);
        self.pos.lift(id);
    }

    pub fn relocate(&mut self, id: PieceId, location: Option<Location>) {
        self.touch(id);
        self.pos.set_location(id, location);
    }

    /// Change anything but the location of a piece.
    pub fn modify(&mut self, id: PieceId, f: impl FnOnce(&mut Piece)) {
        self.touch(id);
        f(self.pos.piece_mut(id));
    }

    /// Remove a piece from play.
    pub fn kill(&mut self, id: PieceId) {
        self.relocate(id, None);
        if !self.casualties.contains(&id) {
            self.casualties.push(id);
        }
    }

    /// Current square of the moving piece, if it survived.
    pub fn landed(&self) -> Option<Square> {
        self.pos.piece(self.piece).square()
    }

    fn finish(self, state: Transients) -> (InversePatch, MoveReport) {
        let kind = self.before(self.piece).kind;
        let report = MoveReport {
            mover: self.mover,
            piece: self.piece,
            kind,
            from: self.from,
            castling: self.castling.map(|c| c.side),
            captured: self.captured,
            casualties: self.casualties,
            reborn: self.reborn,
            flipped: self.flipped,
            promoted: self.promoted,
        };
        (
            InversePatch {
                pieces: self.saved,
                state,
            },
            report,
        )
    }
}

/// Carry out a pseudo-legal move.
///
/// The move must be one the generator produced for this position. A move
/// from an empty square or an empty pocket is a programming error and
/// panics.
pub fn make_move(pos: &mut Position, mv: Move) -> (InversePatch, MoveReport) {
    let state = pos.state().clone();
    let pipeline = pos.pipeline_handle();
    let mut ctx = MoveContext::new(pos, mv);
    for mutator in pipeline.iter() {
        if let MutationResult::Applied = mutator.apply(&mut ctx) {
            trace!(mutator = mutator.name(), "applied");
        }
    }
    ctx.finish(state)
}

/// Revert a move with the patch [`make_move`] returned for it.
pub fn unmake_move(pos: &mut Position, patch: InversePatch) {
    for piece in &patch.pieces {
        pos.lift(piece.id);
    }
    for piece in patch.pieces {
        pos.restore(piece);
    }
    pos.set_state(patch.state);
}
