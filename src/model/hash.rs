//! # Zobrist hashing
//!
//! Position keys for the repetition table. The tables are drawn once from
//! a generator seeded with the digits of pi, so keys are stable between
//! runs and builds.
//!
//! Two positions hash alike when the same piece types of the same colors
//! stand on the same squares with the same extra abilities, the pockets
//! hold the same counts, and the side to move, castling rights, en passant
//! square, check counters and Monster step agree. Piece ids, moved flags
//! of pieces other than those implied by castling rights, and the clocks
//! do not take part.

use std::sync::LazyLock;

use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use strum::VariantArray;

use crate::model::{Color, Location, PieceType, Square, position::Position};

const BOARDS: usize = 2;
const FILES: usize = 16;
const HEIGHT: usize = 21;
const KINDS: usize = PieceType::VARIANTS.len();
const SQUARES: usize = BOARDS * FILES * HEIGHT;
const POCKET_DEPTH: usize = 32;

pub fn pi_rng() -> SmallRng {
    SmallRng::from_seed(*b"3.141592653589793238462643383279")
}

#[derive(Debug, Clone)]
pub struct ZobristTables {
    /// Indexed by square, then color, then piece type.
    pub men: Vec<u64>,
    /// Indexed like `men`, by the type whose moves a piece has gained.
    pub abilities: Vec<u64>,
    /// Indexed by color, then piece type, then count.
    pub pockets: Vec<u64>,
    pub castling: [[u64; 2]; 2],
    /// Indexed by square.
    pub en_passant: Vec<u64>,
    pub black_to_move: u64,
    /// Indexed by color, then checks given.
    pub checks: [[u64; 4]; 2],
    pub monster_step: u64,
}

impl ZobristTables {
    pub fn new() -> Self {
        let mut pi = pi_rng();
        let mut table = |len: usize| {
            let mut res = vec![0u64; len];
            pi.fill(&mut res[..]);
            res
        };
        let men = table(SQUARES * 2 * KINDS);
        let abilities = table(SQUARES * 2 * KINDS);
        let pockets = table(2 * KINDS * POCKET_DEPTH);
        let en_passant = table(SQUARES);

        let castling = [[pi.next_u64(), pi.next_u64()], [pi.next_u64(), pi.next_u64()]];
        let black_to_move = pi.next_u64();
        let mut checks = [[0; 4]; 2];
        for row in &mut checks {
            pi.fill(&mut row[..]);
        }
        let monster_step = pi.next_u64();

        Self {
            men,
            abilities,
            pockets,
            castling,
            en_passant,
            black_to_move,
            checks,
            monster_step,
        }
    }

    #[inline]
    fn square_ix(sq: Square) -> usize {
        (sq.board as usize % BOARDS) * FILES * HEIGHT
            + (sq.x as usize % FILES) * HEIGHT
            + sq.y as usize % HEIGHT
    }

    #[inline]
    fn man_ix(sq: Square, color: Color, kind: PieceType) -> usize {
        (Self::square_ix(sq) * 2 + color.ix()) * KINDS + kind.ix()
    }

    #[inline]
    pub fn hash_man(&self, sq: Square, color: Color, kind: PieceType) -> u64 {
        self.men[Self::man_ix(sq, color, kind)]
    }

    #[inline]
    pub fn hash_abilities(&self, sq: Square, color: Color, kind: PieceType) -> u64 {
        self.abilities[Self::man_ix(sq, color, kind)]
    }

    #[inline]
    pub fn hash_pocket(&self, color: Color, kind: PieceType, count: usize) -> u64 {
        self.pockets[(color.ix() * KINDS + kind.ix()) * POCKET_DEPTH + count % POCKET_DEPTH]
    }

    #[inline]
    pub fn hash_rights(&self, rights: [[bool; 2]; 2]) -> u64 {
        let mut res = 0;
        for c in 0..2 {
            for s in 0..2 {
                if rights[c][s] {
                    res ^= self.castling[c][s];
                }
            }
        }
        res
    }
}

impl Default for ZobristTables {
    fn default() -> Self {
        Self::new()
    }
}

pub static ZOBRIST: LazyLock<ZobristTables> = LazyLock::new(ZobristTables::new);

/// The repetition key of a position.
pub fn hash_position(pos: &Position) -> u64 {
    let z = &*ZOBRIST;
    let mut res = 0;
    let mut pockets = [[0usize; KINDS]; 2];

    for piece in pos.pieces() {
        match piece.location {
            Some(Location::Board(sq)) => {
                res ^= z.hash_man(sq, piece.color, piece.kind);
                if let Some(a) = piece.abilities {
                    res ^= z.hash_abilities(sq, piece.color, a);
                }
            }
            Some(Location::Pocket(color)) => pockets[color.ix()][piece.kind.ix()] += 1,
            None => {}
        }
    }
    for color in [Color::WHITE, Color::BLACK] {
        for kind in PieceType::VARIANTS {
            let n = pockets[color.ix()][kind.ix()];
            if n > 0 {
                res ^= z.hash_pocket(color, *kind, n);
            }
        }
    }

    let state = pos.state();
    res ^= z.hash_rights(state.castling);
    if let Some(ep) = state.en_passant {
        res ^= z.en_passant[ZobristTables::square_ix(ep.target)];
    }
    if state.turn == Color::BLACK {
        res ^= z.black_to_move;
    }
    for color in [Color::WHITE, Color::BLACK] {
        let given = state.checks[color.ix()].min(3) as usize;
        if given > 0 {
            res ^= z.checks[color.ix()][given];
        }
    }
    if state.monster_step > 0 {
        res ^= z.monster_step;
    }
    res
}
