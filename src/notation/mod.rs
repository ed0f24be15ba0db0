//! # Text formats
//!
//! - [`fen`]: the extended FEN snapshot of a whole position
//! - [`san`]: algebraic move text as shown to players
//! - [`coord`]: coordinate move text as sent by clients

pub mod coord;
pub mod fen;
pub mod san;

use chumsky::{extra, prelude::*};

use crate::model::{Color, PieceType};

/// Shorthand for the parsers of this crate.
pub trait Prs<'s, T>: Parser<'s, &'s str, T, extra::Err<Rich<'s, char>>> + Clone {}

impl<'s, T, P> Prs<'s, T> for P where P: Parser<'s, &'s str, T, extra::Err<Rich<'s, char>>> + Clone {}

/// Types with a canonical text parser.
pub trait Parsable: Sized {
    fn parser<'s>() -> impl Prs<'s, Self>;
}

impl Parsable for Color {
    fn parser<'s>() -> impl Prs<'s, Self> {
        choice((just('w').to(Color::WHITE), just('b').to(Color::BLACK)))
            .labelled("w or b")
    }
}

impl Parsable for PieceType {
    fn parser<'s>() -> impl Prs<'s, Self> {
        one_of("PNBRQKACM")
            .map(|c| PieceType::from_letter(c).unwrap_or(PieceType::PAWN))
            .labelled("an upper case piece letter")
    }
}

/// A piece letter whose case gives its color.
pub fn colored_piece<'s>() -> impl Prs<'s, (PieceType, Color)> {
    one_of("PNBRQKACMpnbrqkacm")
        .map(|c: char| {
            let color = if c.is_ascii_uppercase() {
                Color::WHITE
            } else {
                Color::BLACK
            };
            (
                PieceType::from_letter(c).unwrap_or(PieceType::PAWN),
                color,
            )
        })
        .labelled("a piece letter")
}

/// A decimal number of at most five digits.
pub fn number<'s>() -> impl Prs<'s, u16> {
    text::int(10)
        .try_map(|s: &str, span| {
            s.parse::<u16>()
                .map_err(|_| Rich::custom(span, format!("{s} is out of range")))
        })
        .labelled("a number")
}

/// Render parser errors into one line.
pub(crate) fn describe(errs: Vec<Rich<'_, char>>) -> String {
    errs.into_iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[test]
fn piece_letters() {
    assert_eq!(
        colored_piece().parse("c").into_result(),
        Ok((PieceType::EMPRESS, Color::BLACK))
    );
    assert_eq!(
        PieceType::parser().parse("M").into_result(),
        Ok(PieceType::AMAZON)
    );
    assert!(PieceType::parser().parse("m").has_errors());
    assert_eq!(number().parse("518").into_result(), Ok(518));
}
