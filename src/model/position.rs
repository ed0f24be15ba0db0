//! # The position model
//!
//! A [`Position`] owns every [`Piece`] of the game in a single arena,
//! indexed by [`PieceId`], alongside a square to piece occupancy index and
//! the [`Transients`]: turn, castling rights, en passant, check counters and
//! move clocks.
//!
//! The arena never grows or shrinks once assembled. The sum of pieces on
//! the board, in pockets and dead always equals the count the game started
//! with, which is what makes rebirth and drop schemes possible.
//!
//! Only the move executor mutates a position. Previews and historical
//! views are explicit clones.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{
    CastlingSide, Color, Location, Piece, PieceId, PieceType, Square, mutators::Pipeline,
    topology::Topology, variants::VariantSet,
};

/// The en passant target square and the square of the pawn it threatens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnPassant {
    pub target: Square,
    pub victim: Square,
}

/// Everything about a position that isn't a piece.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transients {
    pub turn: Color,
    /// Indexed by color, then [`CastlingSide`].
    pub castling: [[bool; 2]; 2],
    pub en_passant: Option<EnPassant>,
    /// Checks given by each color, for Three-Check.
    pub checks: [u8; 2],
    /// Plies since the last irreversible move.
    pub halfmove: u16,
    pub fullmove: u16,
    /// Under Monster chess, how many moves white has made this turn.
    pub monster_step: u8,
}

impl Default for Transients {
    fn default() -> Self {
        Self {
            turn: Color::WHITE,
            castling: [[false; 2]; 2],
            en_passant: None,
            checks: [0; 2],
            halfmove: 0,
            fullmove: 1,
            monster_step: 0,
        }
    }
}

/// A square a piece type starts the game on, for rebirth purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Home {
    pub kind: PieceType,
    pub color: Color,
    pub square: Square,
}

#[derive(Debug, Clone)]
pub struct Position {
    variants: VariantSet,
    topology: Topology,
    pieces: Vec<Piece>,
    board: IndexMap<Square, PieceId>,
    state: Transients,
    royal_quota: [u8; 2],
    homes: Vec<Home>,
    pipeline: Arc<Pipeline>,
}

/// Positions compare by what stands on each square, what lies in the
/// pockets and among the dead, and the transient state. Piece ids, rebirth
/// homes and the mutator pipeline play no part.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.variants == other.variants
            && self.topology == other.topology
            && self.state == other.state
            && self.royal_quota == other.royal_quota
            && self.board.len() == other.board.len()
            && self
                .board
                .keys()
                .all(|&sq| self.at(sq).map(anonymous) == other.at(sq).map(anonymous))
            && same_men(self.off_board(), other.off_board())
    }
}

fn anonymous(p: &Piece) -> Piece {
    Piece {
        id: PieceId(0),
        ..p.clone()
    }
}

/// Multiset equality of two piece lists, ignoring ids.
fn same_men<'a>(a: impl Iterator<Item = &'a Piece>, b: impl Iterator<Item = &'a Piece>) -> bool {
    let a: Vec<Piece> = a.map(anonymous).collect();
    let mut b: Vec<Piece> = b.map(anonymous).collect();
    a.len() == b.len()
        && a.iter().all(|p| match b.iter().position(|q| q == p) {
            Some(i) => {
                b.swap_remove(i);
                true
            }
            None => false,
        })
}

impl Eq for Position {}

impl Position {
    /// Assemble a position from a complete set of pieces.
    ///
    /// Piece ids are reassigned to match their index. Panics if two
    /// pieces claim the same square, since that can only come from a
    /// corrupt setup.
    pub fn assemble(variants: VariantSet, mut pieces: Vec<Piece>, state: Transients) -> Self {
        let topology = variants.topology();
        let mut board = IndexMap::with_capacity(pieces.len());
        let mut royal_quota = [0u8; 2];
        for (ix, piece) in pieces.iter_mut().enumerate() {
            piece.id = PieceId(ix as u16);
            if piece.royal {
                royal_quota[piece.color.ix()] += 1;
            }
            if let Some(sq) = piece.square() {
                if board.insert(sq, piece.id).is_some() {
                    panic!("two pieces assembled onto {}", topology.square_name(sq));
                }
            }
        }
        Self {
            variants,
            topology,
            pieces,
            board,
            state,
            royal_quota,
            homes: vec![],
            pipeline: Arc::new(Pipeline::for_variants(variants)),
        }
    }

    pub fn with_homes(mut self, homes: Vec<Home>) -> Self {
        self.homes = homes;
        self
    }

    #[inline]
    pub fn variants(&self) -> VariantSet {
        self.variants
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn state(&self) -> &Transients {
        &self.state
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.state.turn
    }

    #[inline]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[inline]
    pub(crate) fn pipeline_handle(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }

    #[inline]
    pub fn homes(&self) -> &[Home] {
        &self.homes
    }

    /// Look up a piece by id.
    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.ix()]
    }

    /// All pieces, including pocketed and dead ones.
    #[inline]
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    #[inline]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn id_at(&self, sq: Square) -> Option<PieceId> {
        self.board.get(&sq).copied()
    }

    #[inline]
    pub fn at(&self, sq: Square) -> Option<&Piece> {
        self.id_at(sq).map(|id| self.piece(id))
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        !self.board.contains_key(&sq)
    }

    /// Pieces of a color currently on any board.
    pub fn on_board(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(move |p| p.color == color && p.is_on_board())
    }

    /// Number of occupied squares.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.board.len()
    }

    pub fn pocket(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(move |p| p.location == Some(Location::Pocket(color)))
    }

    /// Some pocketed piece of the given type, if any.
    pub fn pocket_piece(&self, color: Color, kind: PieceType) -> Option<PieceId> {
        self.pocket(color).find(|p| p.kind == kind).map(|p| p.id)
    }

    pub fn dead(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.is_dead())
    }

    /// Pocketed and dead pieces.
    fn off_board(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(|p| p.square().is_none())
    }

    /// Royal pieces of a color still on the board.
    pub fn royals(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.on_board(color).filter(|p| p.royal)
    }

    /// How many royal pieces this color started out with.
    #[inline]
    pub fn royal_quota(&self, color: Color) -> u8 {
        self.royal_quota[color.ix()]
    }

    #[inline]
    pub fn castling(&self, color: Color, side: CastlingSide) -> bool {
        self.state.castling[color.ix()][side.ix()]
    }

    #[inline]
    pub fn en_passant(&self) -> Option<EnPassant> {
        self.state.en_passant
    }

    /// Material on the board and in the pocket.
    pub fn material(&self, color: Color) -> u32 {
        self.pieces
            .iter()
            .filter(|p| p.color == color && p.location.is_some())
            .map(Piece::value)
            .sum()
    }

    #[inline]
    pub(crate) fn state_mut(&mut self) -> &mut Transients {
        &mut self.state
    }

    /// Mutable access to a piece for anything but its location.
    #[inline]
    pub(crate) fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.ix()]
    }

    /// Move a piece, keeping the occupancy index in agreement.
    ///
    /// Panics if the target square holds another piece.
    pub(crate) fn set_location(&mut self, id: PieceId, location: Option<Location>) {
        self.lift(id);
        if let Some(Location::Board(sq)) = location {
            if let Some(other) = self.board.insert(sq, id) {
                panic!(
                    "piece {:?} placed onto {} which holds {:?}",
                    id,
                    self.topology.square_name(sq),
                    other
                );
            }
        }
        self.pieces[id.ix()].location = location;
    }

    /// Take a piece off the occupancy index without touching its record.
    pub(crate) fn lift(&mut self, id: PieceId) {
        if let Some(sq) = self.pieces[id.ix()].square() {
            if self.board.get(&sq) == Some(&id) {
                self.board.swap_remove(&sq);
            }
        }
    }

    /// Overwrite a lifted piece with a saved record and index it again.
    pub(crate) fn restore(&mut self, saved: Piece) {
        let id = saved.id;
        self.pieces[id.ix()] = saved;
        if let Some(sq) = self.pieces[id.ix()].square() {
            if let Some(other) = self.board.insert(sq, id) {
                panic!(
                    "restoring {:?} onto {} which holds {:?}",
                    id,
                    self.topology.square_name(sq),
                    other
                );
            }
        }
    }

    pub(crate) fn set_state(&mut self, state: Transients) {
        self.state = state;
    }

    /// Whether every board piece is indexed and the index holds nothing else.
    pub fn is_consistent(&self) -> bool {
        let on_board = self.pieces.iter().filter(|p| p.is_on_board()).count();
        on_board == self.board.len()
            && self
                .board
                .iter()
                .all(|(&sq, &id)| self.piece(id).square() == Some(sq))
    }
}

#[cfg(test)]
pub(crate) fn test_piece(kind: PieceType, color: Color, sq: Square) -> Piece {
    Piece {
        id: PieceId(0),
        kind,
        color,
        location: Some(Location::Board(sq)),
        moved: false,
        original: kind,
        abilities: None,
        royal: kind == PieceType::KING,
    }
}

#[test]
fn assembling_indexes_every_piece() {
    use crate::model::variants::VariantSet;
    let pos = Position::assemble(
        VariantSet::STANDARD,
        vec![
            test_piece(PieceType::KING, Color::WHITE, Square::at(4, 0)),
            test_piece(PieceType::KING, Color::BLACK, Square::at(4, 7)),
            test_piece(PieceType::ROOK, Color::WHITE, Square::at(0, 0)),
        ],
        Transients::default(),
    );
    assert!(pos.is_consistent());
    assert_eq!(pos.at(Square::at(0, 0)).map(|p| p.kind), Some(PieceType::ROOK));
    assert_eq!(pos.piece(PieceId(2)).id, PieceId(2));
    assert_eq!(pos.royal_quota(Color::WHITE), 1);
    assert_eq!(pos.material(Color::WHITE), 5);
}

#[test]
fn equality_ignores_arena_order() {
    let king = test_piece(PieceType::KING, Color::WHITE, Square::at(4, 0));
    let mut queen = test_piece(PieceType::QUEEN, Color::BLACK, Square::at(3, 7));
    queen.location = Some(Location::Pocket(Color::BLACK));
    let a = Position::assemble(
        VariantSet::STANDARD,
        vec![king.clone(), queen.clone()],
        Transients::default(),
    );
    let b = Position::assemble(
        VariantSet::STANDARD,
        vec![queen.clone(), king.clone()],
        Transients::default(),
    );
    assert_eq!(a, b);

    queen.moved = true;
    let c = Position::assemble(VariantSet::STANDARD, vec![king, queen], Transients::default());
    assert_ne!(a, c);
}

#[test]
fn relocation_keeps_the_index_in_agreement() {
    let mut pos = Position::assemble(
        VariantSet::STANDARD,
        vec![
            test_piece(PieceType::KING, Color::WHITE, Square::at(4, 0)),
            test_piece(PieceType::QUEEN, Color::BLACK, Square::at(3, 7)),
        ],
        Transients::default(),
    );
    pos.set_location(PieceId(1), Some(Location::Pocket(Color::WHITE)));
    assert!(pos.is_empty(Square::at(3, 7)));
    assert_eq!(pos.pocket(Color::WHITE).count(), 1);
    pos.set_location(PieceId(1), Some(Location::Board(Square::at(3, 3))));
    assert_eq!(pos.id_at(Square::at(3, 3)), Some(PieceId(1)));
    pos.set_location(PieceId(1), None);
    assert_eq!(pos.dead().count(), 1);
    assert!(pos.is_consistent());
}

#[test]
#[should_panic]
fn double_occupancy_is_fatal() {
    let mut pos = Position::assemble(
        VariantSet::STANDARD,
        vec![
            test_piece(PieceType::KING, Color::WHITE, Square::at(4, 0)),
            test_piece(PieceType::QUEEN, Color::BLACK, Square::at(3, 7)),
        ],
        Transients::default(),
    );
    pos.set_location(PieceId(1), Some(Location::Board(Square::at(4, 0))));
}
