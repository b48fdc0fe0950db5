//! Note token scanning using winnow combinators.
//!
//! The grammar is deliberately greedy only on digit runs inside a
//! recognized accidental or duration, so malformed runs degrade to shorter
//! matches instead of failing the scan.

use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::model::{AccidentalGlyph, NoteToken};

type PResult<T> = winnow::ModalResult<T>;

/// Try to scan one note token at the head of `src`. Returns `None` when the
/// head is not a note; the caller falls back to single-character
/// passthrough.
pub fn parse_note_at(src: &str) -> Option<NoteToken<'_>> {
    let mut input = src;
    parse_note(&mut input).ok()
}

/// Parse a complete note token: accidental prefix, letter, octave marks,
/// duration.
pub fn parse_note<'a>(input: &mut &'a str) -> PResult<NoteToken<'a>> {
    let start = *input;

    let accidental = opt(parse_accidental).parse_next(input)?;
    let acc_len = start.len() - input.len();
    let acc_text = &start[..acc_len];

    let letter_char = one_of([
        'A', 'B', 'C', 'D', 'E', 'F', 'G', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    ])
    .parse_next(input)?;

    let octave_marks: &'a str = take_while(0.., [',', '\'']).parse_next(input)?;
    let duration: &'a str =
        take_while(0.., |c: char| c.is_ascii_digit() || c == '/').parse_next(input)?;

    let len = start.len() - input.len();
    Ok(NoteToken {
        accidental,
        acc_text,
        letter_char,
        octave_marks,
        duration,
        len,
    })
}

/// Parse an accidental prefix. Numeric forms come first so `^3` does not
/// stop at the bare `^`.
pub fn parse_accidental(input: &mut &str) -> PResult<AccidentalGlyph> {
    alt((
        parse_numeric_accidental,
        "^^".map(|_| AccidentalGlyph::DoubleSharp),
        "__".map(|_| AccidentalGlyph::DoubleFlat),
        "^/".map(|_| AccidentalGlyph::Fraction {
            sign: 1,
            num: 1,
            den: 2,
        }),
        "_/".map(|_| AccidentalGlyph::Fraction {
            sign: -1,
            num: 1,
            den: 2,
        }),
        "^".map(|_| AccidentalGlyph::Sharp),
        "_".map(|_| AccidentalGlyph::Flat),
        "=".map(|_| AccidentalGlyph::Natural),
    ))
    .parse_next(input)
}

/// `^k`, `_k`, `^-k`, and the fractional `^n/d` forms.
fn parse_numeric_accidental(input: &mut &str) -> PResult<AccidentalGlyph> {
    let direction = one_of(['^', '_']).parse_next(input)?;
    let neg = opt('-').parse_next(input)?.is_some();
    let num_str: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let den_str: Option<&str> = opt(preceded(
        '/',
        take_while(1.., |c: char| c.is_ascii_digit()),
    ))
    .parse_next(input)?;

    let mut sign: i32 = if direction == '^' { 1 } else { -1 };
    if neg {
        sign = -sign;
    }
    let num: u32 = num_str.parse().unwrap_or(u32::MAX);

    Ok(match den_str {
        Some(d) => AccidentalGlyph::Fraction {
            sign: sign as i8,
            num,
            den: d.parse().unwrap_or(u32::MAX),
        },
        None => AccidentalGlyph::Steps(sign.saturating_mul(num.min(i32::MAX as u32) as i32)),
    })
}
