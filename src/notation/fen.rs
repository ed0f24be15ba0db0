//! # Extended Forsyth-Edwards Notation
//!
//! A snapshot of a position is written as FEN, extended to cover every
//! board and variant the engine plays:
//!
//! - Ranks are listed top first. On the hexagonal and circular boards each
//!   row lists the cells of that rank number in file order, so rows differ
//!   in length.
//! - Empty runs may take two digits, up to the width of the board.
//! - A piece letter may be followed by `~` (it was once a pawn) or `<X>`
//!   (it entered the game as an `X`), then `*` (it is royal without being a
//!   king), `(X)` (it moves additionally like `X`) and `^` (see below).
//! - Pocketed pieces follow the board in square brackets, dead pieces in
//!   braces: `.../RNBQKBNR[Pn]{q}`.
//! - The boards of Alice Chess are separated by `|`.
//! - The turn is `w`, `b` or `w2` for the second half of a Monster turn.
//! - Castling rights are `KQkq`, or the files of the castling rooks under
//!   Chess960.
//! - Three-Check counters trail the move numbers as `+W+B`.
//!
//! Pawns that may still advance twice from their square and officers on
//! their back rank or a starting square of their type count as unmoved,
//! every other piece as moved. A `^` marks a piece for which that guess is
//! wrong.
//!
//! The standard starting position:
//! ```text
//! rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1
//! ```

use chumsky::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::SnapshotError,
    model::{
        CastlingSide, Color, Location, Piece, PieceId, PieceType, Square, castling,
        position::{EnPassant, Home, Position, Transients},
        setup,
        topology::Topology,
        variants::{Variant, VariantSet},
    },
    notation::{Parsable, Prs, colored_piece, describe, number},
};

/// Data a snapshot may carry apart from its FEN, overriding the fields
/// written there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingData {
    /// Indexed by color, then castling side.
    pub castling: Option<[[bool; 2]; 2]>,
    pub en_passant: Option<Square>,
    pub checks: Option<[u8; 2]>,
}

/// Everything needed to reconstruct a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub fen: String,
    pub variants: VariantSet,
    #[serde(default)]
    pub starting: Option<StartingData>,
    /// Rebirth squares of a Chess960 layout. Other layouts derive them
    /// from the variants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub homes: Vec<Home>,
}

impl Snapshot {
    pub fn of(pos: &Position) -> Self {
        let homes = if pos.variants().has(Variant::CHESS960) {
            pos.homes().to_vec()
        } else {
            vec![]
        };
        Self {
            fen: write_position(pos),
            variants: pos.variants(),
            starting: None,
            homes,
        }
    }

    /// Build the position this snapshot describes.
    pub fn position(&self) -> Result<Position, SnapshotError> {
        let mut pos = parse_position(&self.fen, self.variants)?;
        if !self.homes.is_empty() {
            pos = pos.with_homes(self.homes.clone());
        }
        if let Some(starting) = &self.starting {
            let topo = pos.topology();
            let turn = pos.turn();
            let en_passant = match starting.en_passant {
                Some(target) => Some(en_passant_for(topo, turn, target)?),
                None => pos.en_passant(),
            };
            let state = pos.state_mut();
            if let Some(castling) = starting.castling {
                state.castling = castling;
            }
            if let Some(checks) = starting.checks {
                state.checks = checks;
            }
            state.en_passant = en_passant;
        }
        Ok(pos)
    }
}

/// One cell token: a piece with its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    kind: PieceType,
    color: Color,
    original: Option<PieceType>,
    royal: bool,
    abilities: Option<PieceType>,
    /// The moved flag is the opposite of what the square suggests.
    flipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Man(Token),
    Empty(usize),
}

/// The FEN fields before they are checked against a topology.
#[derive(Debug, Clone)]
struct RawFen<'s> {
    boards: Vec<Vec<Vec<Cell>>>,
    pocket: Vec<Token>,
    dead: Vec<Token>,
    turn: (Color, u8),
    castling: Vec<char>,
    en_passant: Option<&'s str>,
    halfmove: u16,
    fullmove: u16,
    checks: Option<(u16, u16)>,
}

impl Parsable for Token {
    fn parser<'s>() -> impl Prs<'s, Self> {
        group((
            colored_piece(),
            choice((
                just('~').to(PieceType::PAWN),
                PieceType::parser().delimited_by(just('<'), just('>')),
            ))
            .or_not(),
            just('*').or_not().map(|m| m.is_some()),
            PieceType::parser()
                .delimited_by(just('('), just(')'))
                .or_not(),
            just('^').or_not().map(|m| m.is_some()),
        ))
        .map(|((kind, color), original, royal, abilities, flipped)| Token {
            kind,
            color,
            original,
            royal,
            abilities,
            flipped,
        })
    }
}

fn row<'s>() -> impl Prs<'s, Vec<Cell>> {
    choice((
        Token::parser().map(Cell::Man),
        text::digits(10)
            .at_least(1)
            .at_most(2)
            .to_slice()
            .try_map(|s: &str, span| match s.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Cell::Empty(n)),
                _ => Err(Rich::custom(span, "empty run must be positive")),
            }),
    ))
    .repeated()
    .collect()
}

fn board<'s>() -> impl Prs<'s, Vec<Vec<Cell>>> {
    row().separated_by(just('/')).at_least(1).collect()
}

fn tokens<'s>(open: char, close: char) -> impl Prs<'s, Vec<Token>> {
    Token::parser()
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(open), just(close))
        .or_not()
        .map(Option::unwrap_or_default)
}

fn turn<'s>() -> impl Prs<'s, (Color, u8)> {
    Color::parser().then(just('2').or_not().map(|s| s.map_or(0, |_| 1)))
}

fn castling_field<'s>() -> impl Prs<'s, Vec<char>> {
    choice((
        just('-').to(vec![]),
        any()
            .filter(|c: &char| c.is_ascii_alphabetic())
            .repeated()
            .at_least(1)
            .collect(),
    ))
    .labelled("castling rights")
}

fn en_passant_field<'s>() -> impl Prs<'s, Option<&'s str>> {
    choice((
        just('-').to(None),
        any()
            .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '\'')
            .repeated()
            .at_least(2)
            .to_slice()
            .map(Some),
    ))
    .labelled("en passant square")
}

fn raw_fen<'s>() -> impl Prs<'s, RawFen<'s>> {
    let gap = text::inline_whitespace().at_least(1);
    group((
        board().separated_by(just('|')).at_least(1).collect::<Vec<_>>(),
        tokens('[', ']'),
        tokens('{', '}'),
        gap.clone().ignore_then(turn()),
        gap.clone().ignore_then(castling_field()),
        gap.clone().ignore_then(en_passant_field()),
        gap.clone().ignore_then(number()).or_not(),
        gap.clone().ignore_then(number()).or_not(),
        gap.clone()
            .ignore_then(just('+').ignore_then(number()))
            .then(just('+').ignore_then(number()))
            .or_not(),
    ))
    .then_ignore(text::whitespace())
    .then_ignore(end())
    .map(
        |(boards, pocket, dead, turn, castling, en_passant, halfmove, fullmove, checks)| RawFen {
            boards,
            pocket,
            dead,
            turn,
            castling,
            en_passant,
            halfmove: halfmove.unwrap_or(0),
            fullmove: fullmove.unwrap_or(1),
            checks,
        },
    )
}

/// Parse a snapshot FEN for the given variants.
pub fn parse_position(text: &str, variants: VariantSet) -> Result<Position, SnapshotError> {
    let raw = raw_fen()
        .parse(text.trim())
        .into_result()
        .map_err(|errs| SnapshotError::Syntax(describe(errs)))?;
    build(raw, variants)
}

fn build(raw: RawFen<'_>, variants: VariantSet) -> Result<Position, SnapshotError> {
    let topo = variants.topology();
    let royal_kings = variants.kings_are_royal();
    let canonical = setup::canonical_homes(variants);
    let piece = |t: Token, location: Option<Location>| -> Piece {
        let presumed = location
            .and_then(Location::square)
            .is_some_and(|sq| presumed_moved(topo, &canonical, t.kind, t.color, sq));
        Piece {
            id: PieceId(0),
            kind: t.kind,
            color: t.color,
            location,
            moved: presumed != t.flipped,
            original: t.original.unwrap_or(t.kind),
            abilities: t.abilities,
            royal: t.royal || (t.kind == PieceType::KING && royal_kings),
        }
    };

    if raw.boards.len() != topo.boards as usize {
        return Err(SnapshotError::BoardCount {
            expected: topo.boards as usize,
            found: raw.boards.len(),
        });
    }

    let mut pieces = vec![];
    for (b, rows) in raw.boards.iter().enumerate() {
        let ranks = topo.rank_count() as usize;
        if rows.len() != ranks {
            return Err(SnapshotError::RankCount {
                expected: ranks,
                found: rows.len(),
            });
        }
        for (i, cells) in rows.iter().enumerate() {
            let rank = (ranks - i) as i8;
            let squares = topo.rank_squares(b as u8, rank);
            let found: usize = cells
                .iter()
                .map(|c| match c {
                    Cell::Man(_) => 1,
                    Cell::Empty(n) => *n,
                })
                .sum();
            if found != squares.len() {
                return Err(SnapshotError::RankWidth {
                    rank: rank as usize,
                    expected: squares.len(),
                    found,
                });
            }
            let mut file = squares.iter();
            for cell in cells {
                match *cell {
                    Cell::Man(t) => {
                        if let Some(&sq) = file.next() {
                            pieces.push(piece(t, Some(Location::Board(sq))));
                        }
                    }
                    Cell::Empty(n) => {
                        file.nth(n - 1);
                    }
                }
            }
        }
    }
    for &t in &raw.pocket {
        pieces.push(piece(t, Some(Location::Pocket(t.color))));
    }
    for &t in &raw.dead {
        pieces.push(piece(t, None));
    }

    let (turn, monster_step) = raw.turn;
    let state = Transients {
        turn,
        castling: [[false; 2]; 2],
        en_passant: None,
        checks: raw
            .checks
            .map_or([0; 2], |(w, b)| [w, b].map(|n| u8::try_from(n).unwrap_or(u8::MAX))),
        halfmove: raw.halfmove,
        fullmove: raw.fullmove,
        monster_step,
    };
    let mut pos = Position::assemble(variants, pieces, state);

    let mut rights = [[false; 2]; 2];
    for c in raw.castling {
        let color = if c.is_ascii_uppercase() {
            Color::WHITE
        } else {
            Color::BLACK
        };
        let side = match c.to_ascii_lowercase() {
            'k' => Some(CastlingSide::KINGSIDE),
            'q' => Some(CastlingSide::QUEENSIDE),
            f => castling::castling_king(&pos, color).and_then(|king| {
                let x = topo.file_index(f)?;
                let kx = pos.piece(king).square()?.x;
                Some(if x > kx {
                    CastlingSide::KINGSIDE
                } else {
                    CastlingSide::QUEENSIDE
                })
            }),
        };
        let Some(side) = side else {
            return Err(SnapshotError::CastlingRight(c));
        };
        if castling::castling_king(&pos, color).is_none()
            || castling::castling_rook(&pos, color, side).is_none()
        {
            return Err(SnapshotError::CastlingRight(c));
        }
        rights[color.ix()][side.ix()] = true;
    }
    pos.state_mut().castling = rights;

    if let Some(name) = raw.en_passant {
        let target = topo
            .parse_square(name)
            .ok_or_else(|| SnapshotError::Square(name.to_string()))?;
        pos.state_mut().en_passant = Some(en_passant_for(topo, turn, target)?);
    }

    let homes = if variants.has(Variant::CHESS960) {
        setup::homes_of(&pos)
    } else {
        setup::canonical_homes(variants)
    };
    Ok(pos.with_homes(homes))
}

/// Whether a piece standing on `sq` has moved, going by the square alone.
fn presumed_moved(
    topo: Topology,
    homes: &[Home],
    kind: PieceType,
    color: Color,
    sq: Square,
) -> bool {
    if kind == PieceType::PAWN {
        !topo.is_pawn_home(sq, color)
    } else {
        topo.relative_rank(sq, color) != 0
            && !homes
                .iter()
                .any(|h| h.kind == kind && h.color == color && h.square == sq)
    }
}

/// The pawn that just passed over `target`, moving for the other side.
fn en_passant_for(topo: Topology, turn: Color, target: Square) -> Result<EnPassant, SnapshotError> {
    topo.offset(target, 0, topo.forward(turn.opp()))
        .map(|victim| EnPassant { target, victim })
        .ok_or_else(|| SnapshotError::EnPassant(topo.square_name(target)))
}

fn write_token(res: &mut String, p: &Piece, royal_kings: bool, presumed: bool) {
    let letter = p.kind.letter();
    res.push(match p.color {
        Color::WHITE => letter,
        Color::BLACK => letter.to_ascii_lowercase(),
    });
    if p.original != p.kind {
        if p.original == PieceType::PAWN {
            res.push('~');
        } else {
            res.push('<');
            res.push(p.original.letter());
            res.push('>');
        }
    }
    if p.royal && !(p.kind == PieceType::KING && royal_kings) {
        res.push('*');
    }
    if let Some(a) = p.abilities {
        res.push('(');
        res.push(a.letter());
        res.push(')');
    }
    if p.moved != presumed {
        res.push('^');
    }
}

/// Write a position as snapshot FEN.
pub fn write_position(pos: &Position) -> String {
    let topo = pos.topology();
    let variants = pos.variants();
    let royal_kings = variants.kings_are_royal();
    let canonical = setup::canonical_homes(variants);
    let mut res = String::new();

    for b in 0..topo.boards {
        if b > 0 {
            res.push('|');
        }
        for rank in (1..=topo.rank_count()).rev() {
            if rank < topo.rank_count() {
                res.push('/');
            }
            let mut run = 0;
            for sq in topo.rank_squares(b, rank) {
                match pos.at(sq) {
                    Some(p) => {
                        if run > 0 {
                            res.push_str(&run.to_string());
                            run = 0;
                        }
                        let presumed = presumed_moved(topo, &canonical, p.kind, p.color, sq);
                        write_token(&mut res, p, royal_kings, presumed);
                    }
                    None => run += 1,
                }
            }
            if run > 0 {
                res.push_str(&run.to_string());
            }
        }
    }

    let pocketed: Vec<&Piece> = pos
        .pieces()
        .filter(|p| matches!(p.location, Some(Location::Pocket(_))))
        .collect();
    if variants.has_pockets() || !pocketed.is_empty() {
        res.push('[');
        for p in pocketed {
            write_token(&mut res, p, royal_kings, false);
        }
        res.push(']');
    }
    let dead: Vec<&Piece> = pos.dead().collect();
    if !dead.is_empty() {
        res.push('{');
        for p in dead {
            write_token(&mut res, p, royal_kings, false);
        }
        res.push('}');
    }

    let state = pos.state();
    res.push(' ');
    res.push(match state.turn {
        Color::WHITE => 'w',
        Color::BLACK => 'b',
    });
    if state.monster_step > 0 {
        res.push('2');
    }

    res.push(' ');
    let mut any_right = false;
    for color in [Color::WHITE, Color::BLACK] {
        for side in [CastlingSide::KINGSIDE, CastlingSide::QUEENSIDE] {
            if !pos.castling(color, side) {
                continue;
            }
            let letter = if variants.has(Variant::CHESS960) {
                castling::castling_rook(pos, color, side)
                    .and_then(|r| pos.piece(r).square())
                    .map(|sq| topo.file_char(sq.x))
            } else {
                None
            };
            let letter = letter.unwrap_or(match side {
                CastlingSide::KINGSIDE => 'k',
                CastlingSide::QUEENSIDE => 'q',
            });
            res.push(match color {
                Color::WHITE => letter.to_ascii_uppercase(),
                Color::BLACK => letter,
            });
            any_right = true;
        }
    }
    if !any_right {
        res.push('-');
    }

    res.push(' ');
    match state.en_passant {
        Some(ep) => res.push_str(&topo.square_name(ep.target)),
        None => res.push('-'),
    }

    res.push_str(&format!(" {} {}", state.halfmove, state.fullmove));
    if variants.has(Variant::THREE_CHECK) {
        res.push_str(&format!(" +{}+{}", state.checks[0], state.checks[1]));
    }
    res
}
