//! # Starting layouts
//!
//! Every topology and variant combination has a canonical starting
//! position. Chess960 back ranks are numbered 0 to 959 after Scharnagl,
//! with 518 being the standard array.

use rand::Rng;

use crate::model::{
    CastlingSide, Color, Location, Piece, PieceId, PieceType, Square, castling,
    position::{Home, Position, Transients},
    topology::Shape,
    variants::{Variant, VariantSet},
};

use PieceType::*;

/// The Chess960 number of the standard back rank.
pub const STANDARD_960: u16 = 518;

const KNIGHT_TABLE: [[bool; 5]; 10] = {
    const N: bool = true;
    const E: bool = false;
    [
        [N, N, E, E, E],
        [N, E, N, E, E],
        [N, E, E, N, E],
        [N, E, E, E, N],
        [E, N, N, E, E],
        [E, N, E, N, E],
        [E, N, E, E, N],
        [E, E, N, N, E],
        [E, E, N, E, N],
        [E, E, E, N, N],
    ]
};

/// The back rank of a Chess960 layout by its Scharnagl number.
///
/// Numbers past 959 wrap around.
pub fn chess960_rank(index: u16) -> [PieceType; 8] {
    let mut n = (index % 960) as usize;
    let mut rank: [Option<PieceType>; 8] = [None; 8];

    rank[2 * (n % 4) + 1] = Some(BISHOP);
    n /= 4;
    rank[2 * (n % 4)] = Some(BISHOP);
    n /= 4;

    let queen = n % 6;
    n /= 6;
    place_nth_empty(&mut rank, queen, QUEEN);

    let knights = KNIGHT_TABLE[n];
    let empties: Vec<usize> = (0..8).filter(|&i| rank[i].is_none()).collect();
    for (slot, &file) in empties.iter().enumerate() {
        if knights[slot] {
            rank[file] = Some(KNIGHT);
        }
    }

    for kind in [ROOK, KING, ROOK] {
        place_nth_empty(&mut rank, 0, kind);
    }

    rank.map(|p| p.unwrap_or(PAWN))
}

fn place_nth_empty(rank: &mut [Option<PieceType>; 8], nth: usize, kind: PieceType) {
    if let Some(slot) = rank.iter_mut().filter(|p| p.is_none()).nth(nth) {
        *slot = Some(kind);
    }
}

/// A uniformly random Chess960 number.
pub fn random_chess960() -> u16 {
    rand::rng().random_range(0..960)
}

/// The starting position for a variant set.
///
/// `chess960` selects the back rank under Chess960 and is ignored
/// otherwise. Without it a random one is drawn.
pub fn start_position(variants: VariantSet, chess960: Option<u16>) -> Position {
    let index = if variants.has(Variant::CHESS960) {
        chess960.unwrap_or_else(random_chess960)
    } else {
        STANDARD_960
    };
    let pos = Position::assemble(variants, start_pieces(variants, index), Transients::default());
    let homes = homes_of(&pos);
    with_castling_rights(pos).with_homes(homes)
}

/// Home squares of the starting layout, for Circe.
pub fn canonical_homes(variants: VariantSet) -> Vec<Home> {
    let pos = Position::assemble(
        variants,
        start_pieces(variants, STANDARD_960),
        Transients::default(),
    );
    homes_of(&pos)
}

/// Home squares taken from the unmoved officers of a position.
pub fn homes_of(pos: &Position) -> Vec<Home> {
    pos.pieces()
        .filter(|p| !p.moved && p.kind != PAWN)
        .filter_map(|p| {
            let square = p.square()?;
            (square.board == 0).then_some(Home {
                kind: p.kind,
                color: p.color,
                square,
            })
        })
        .collect()
}

/// Grant every castling right the layout supports.
fn with_castling_rights(mut pos: Position) -> Position {
    let mut rights = [[false; 2]; 2];
    if pos.variants().allows_castling() {
        for color in [Color::WHITE, Color::BLACK] {
            for side in [CastlingSide::KINGSIDE, CastlingSide::QUEENSIDE] {
                rights[color.ix()][side.ix()] = castling::castling_king(&pos, color).is_some()
                    && castling::castling_rook(&pos, color, side).is_some();
            }
        }
    }
    pos.state_mut().castling = rights;
    pos
}

fn start_pieces(variants: VariantSet, index: u16) -> Vec<Piece> {
    let topo = variants.topology();
    let royal_kings = variants.kings_are_royal();
    let mut res = vec![];
    let mut put = |kind: PieceType, color: Color, sq: Square| {
        res.push(Piece {
            id: PieceId(0),
            kind,
            color,
            location: Some(Location::Board(sq)),
            moved: kind == PAWN && !topo.is_pawn_home(sq, color),
            original: kind,
            abilities: None,
            royal: kind == KING && royal_kings,
        });
    };

    match topo.shape {
        Shape::HEXAGONAL => {
            for (kind, names) in GLINSKI {
                for name in names.split(' ') {
                    if let Some(sq) = topo.parse_square(name) {
                        put(kind, Color::WHITE, sq);
                        put(kind, Color::BLACK, Square::at(sq.x, 20 - sq.y));
                    }
                }
            }
        }
        Shape::CIRCULAR => {
            let sectors: [[PieceType; 4]; 3] = [
                [ROOK, KNIGHT, BISHOP, KING],
                [ROOK, KNIGHT, BISHOP, QUEEN],
                [PAWN; 4],
            ];
            for (y, ring) in sectors.iter().enumerate() {
                for (x, &kind) in ring.iter().enumerate() {
                    let (x, y) = (x as i8, y as i8);
                    put(kind, Color::WHITE, Square::at(x, y));
                    put(kind, Color::BLACK, Square::at(x, 11 - y));
                }
            }
        }
        Shape::RECTANGULAR | Shape::CYLINDER => {
            let back = back_rank(variants, index);
            let top = topo.height - 1;
            for (x, &kind) in back.iter().enumerate() {
                let x = x as i8;
                put(kind, Color::BLACK, Square::at(x, top));
                put(PAWN, Color::BLACK, Square::at(x, top - 1));
            }
            if variants.has(Variant::HORDE) {
                for sq in topo.squares() {
                    let hole = sq.y == 4 && matches!(sq.x, 0 | 3 | 4 | 7);
                    if sq.y < 5 && !hole {
                        put(PAWN, Color::WHITE, sq);
                    }
                }
            } else if variants.has(Variant::MONSTER) {
                put(KING, Color::WHITE, Square::at(4, 0));
                for x in 2..6 {
                    put(PAWN, Color::WHITE, Square::at(x, 1));
                }
            } else {
                for (x, &kind) in back.iter().enumerate() {
                    let x = x as i8;
                    put(kind, Color::WHITE, Square::at(x, 0));
                    put(PAWN, Color::WHITE, Square::at(x, 1));
                }
            }
        }
    }

    res
}

/// White's Gliński setup by square; black mirrors it within each file.
const GLINSKI: [(PieceType, &str); 6] = [
    (KING, "g1"),
    (QUEEN, "e1"),
    (BISHOP, "f1 f2 f3"),
    (KNIGHT, "d1 h1"),
    (ROOK, "c1 i1"),
    (PAWN, "b1 c2 d3 e4 f5 g4 h3 i2 k1"),
];

fn back_rank(variants: VariantSet, index: u16) -> Vec<PieceType> {
    if variants.has(Variant::TWO_FAMILIES) {
        vec![ROOK, KNIGHT, BISHOP, QUEEN, KING, KING, QUEEN, BISHOP, KNIGHT, ROOK]
    } else if variants.has(Variant::CAPABLANCA) {
        vec![ROOK, KNIGHT, CARDINAL, BISHOP, QUEEN, KING, BISHOP, EMPRESS, KNIGHT, ROOK]
    } else {
        chess960_rank(index).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::legality::legal_moves;

    #[test]
    fn scharnagl_numbering() {
        assert_eq!(
            chess960_rank(STANDARD_960),
            [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK]
        );
        assert_eq!(
            chess960_rank(0),
            [BISHOP, BISHOP, QUEEN, KNIGHT, KNIGHT, ROOK, KING, ROOK]
        );
        for ix in 0..960 {
            let rank = chess960_rank(ix);
            let king = rank.iter().position(|&k| k == KING).unwrap();
            let rooks: Vec<_> = (0..8).filter(|&i| rank[i] == ROOK).collect();
            assert!(rooks[0] < king && king < rooks[1]);
            let bishops: Vec<_> = (0..8).filter(|&i| rank[i] == BISHOP).collect();
            assert_ne!(bishops[0] % 2, bishops[1] % 2);
        }
    }

    #[test]
    fn piece_counts_per_layout() {
        use Variant::*;
        for (variants, count, moves) in [
            (VariantSet::STANDARD, 32, Some(20)),
            (VariantSet::STANDARD.with(CAPABLANCA), 40, Some(28)),
            (VariantSet::STANDARD.with(HORDE), 52, Some(8)),
            (VariantSet::STANDARD.with(MONSTER), 21, Some(10)),
            (VariantSet::STANDARD.with(HEXAGONAL), 36, None),
            (VariantSet::STANDARD.with(CIRCULAR), 24, None),
            (VariantSet::STANDARD.with(ALICE_CHESS), 32, Some(20)),
        ] {
            let pos = start_position(variants, None);
            assert_eq!(pos.piece_count(), count, "{variants}");
            assert!(pos.is_consistent());
            if let Some(moves) = moves {
                assert_eq!(legal_moves(&pos).len(), moves, "{variants}");
            }
        }
    }

    #[test]
    fn castling_rights_follow_the_layout() {
        use Variant::*;
        let pos = start_position(VariantSet::STANDARD, None);
        assert_eq!(pos.state().castling, [[true; 2]; 2]);
        let pos = start_position(VariantSet::STANDARD.with(HORDE), None);
        assert_eq!(pos.state().castling, [[false; 2], [true; 2]]);
        let pos = start_position(VariantSet::STANDARD.with(TWO_FAMILIES), None);
        assert_eq!(pos.state().castling, [[false; 2]; 2]);
        assert_eq!(pos.royal_quota(Color::WHITE), 2);
        let pos = start_position(VariantSet::STANDARD.with(CHESS960), Some(0));
        assert_eq!(pos.state().castling, [[true; 2]; 2]);
    }

    #[test]
    fn antichess_kings_are_commoners() {
        let pos = start_position(VariantSet::STANDARD.with(Variant::ANTICHESS), None);
        assert_eq!(pos.royal_quota(Color::WHITE), 0);
        assert_eq!(pos.state().castling, [[false; 2]; 2]);
    }

    #[test]
    fn homes_cover_every_officer() {
        let homes = canonical_homes(VariantSet::STANDARD);
        assert_eq!(homes.len(), 16);
        assert!(homes.contains(&Home {
            kind: BISHOP,
            color: Color::BLACK,
            square: Square::at(5, 7)
        }));
    }
}
