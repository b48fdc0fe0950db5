//! 53-EDO comma arithmetic.
//!
//! Each of the 12 semitone positions maps to a cumulative comma offset
//! built from a fixed per-semitone width table that sums to 53 across the
//! octave. A semitone transposition moves a pitch by the width of the
//! semitone being crossed, measured from the current tonic's pitch class,
//! so the same nominal delta yields 4 or 5 commas depending on the key.

use crate::model::Letter;
use crate::parser::key::normalize_signed;

/// Commas in the semitone upward from pitch class `i`.
pub const COMMA_WIDTHS_UP: [i32; 12] = [4, 5, 4, 5, 4, 5, 4, 4, 5, 4, 5, 4];

/// Cumulative comma position of each semitone (C=0, C#=4, D=9, ... B=49).
pub const SEMITONE_COMMAS: [i32; 12] = [0, 4, 9, 13, 18, 22, 27, 31, 35, 40, 44, 49];

pub const COMMAS_PER_OCTAVE: i32 = 53;

/// Total comma shift for a transposition of `delta_steps` semitones from a
/// key whose tonic sits at `tonic_pc` (0..11). Accumulates the width of
/// every semitone crossed.
pub fn delta_commas(tonic_pc: i32, delta_steps: i32) -> i32 {
    let pc = tonic_pc.rem_euclid(12);
    let mut total = 0;
    if delta_steps > 0 {
        for i in 0..delta_steps {
            total += COMMA_WIDTHS_UP[((pc + i).rem_euclid(12)) as usize];
        }
    } else {
        for i in 1..=(-delta_steps) {
            total -= COMMA_WIDTHS_UP[((pc - i).rem_euclid(12)) as usize];
        }
    }
    total
}

/// Comma position of a natural letter within the octave.
pub fn letter_commas(letter: Letter) -> i32 {
    SEMITONE_COMMAS[letter.pc12() as usize]
}

/// Signed comma offset normalized to the symmetric range around zero.
pub fn normalize_commas(v: i32) -> i32 {
    normalize_signed(v, COMMAS_PER_OCTAVE)
}

/// Rank of a comma offset by how conventional it is as a written
/// accidental: the +4/-5 pair first, then -4/+5, then everything else.
pub fn pair_rank(micro: i32) -> i32 {
    match micro {
        4 | -5 => 0,
        -4 | 5 => 1,
        _ => 2,
    }
}

/// A (letter, comma-offset) spelling of a 53-EDO pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelling53 {
    pub letter: Letter,
    pub micro: i32,
}

/// Best letter spelling for a comma position in the octave, preferring the
/// conventional comma pairs, then the side of the transposition direction,
/// then the smallest offset, then letter order.
pub fn choose_spelling(id53: i32, delta_sign: i32) -> Spelling53 {
    let mut best: Option<(Spelling53, (i32, i32, i32, usize))> = None;
    for (idx, letter) in Letter::spelling_order().into_iter().enumerate() {
        let micro = normalize_commas(id53 - letter_commas(letter));
        let side = if delta_sign < 0 {
            i32::from(micro >= 0)
        } else if delta_sign > 0 {
            i32::from(micro <= 0)
        } else {
            0
        };
        let score = (pair_rank(micro), side, micro.abs(), idx);
        if best.as_ref().is_none_or(|(_, s)| score < *s) {
            best = Some((Spelling53 { letter, micro }, score));
        }
    }
    best.map(|(sp, _)| sp).unwrap_or(Spelling53 {
        letter: Letter::C,
        micro: normalize_commas(id53),
    })
}

/// Written prefix for a comma offset. A zero offset prints `=` when a
/// token is required at all.
pub fn micro_prefix(micro: i32, explicit: bool) -> String {
    if micro == 0 {
        return if explicit { "=".to_string() } else { String::new() };
    }
    if micro > 0 {
        format!("^{}", micro)
    } else {
        format!("_{}", -micro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_widths_sum_to_octave() {
        assert_eq!(COMMA_WIDTHS_UP.iter().sum::<i32>(), 53);
        // The cumulative table is the prefix sum of the widths.
        let mut acc = 0;
        for pc in 0..12 {
            assert_eq!(SEMITONE_COMMAS[pc], acc);
            acc += COMMA_WIDTHS_UP[pc];
        }
    }

    #[test]
    fn test_delta_commas_single_step() {
        // Up from C crosses the C..C# semitone: 4 commas.
        assert_eq!(delta_commas(0, 1), 4);
        // Up from C# crosses C#..D: 5 commas.
        assert_eq!(delta_commas(1, 1), 5);
        // Down to C crosses the same semitone backwards.
        assert_eq!(delta_commas(1, -1), -4);
        assert_eq!(delta_commas(0, -1), -COMMA_WIDTHS_UP[11]);
    }

    #[test]
    fn test_delta_commas_accumulates() {
        // A full octave in either direction is exactly 53 commas.
        assert_eq!(delta_commas(3, 12), 53);
        assert_eq!(delta_commas(3, -12), -53);
        // Two steps up from C: 4 + 5.
        assert_eq!(delta_commas(0, 2), 9);
        // Inverse of the two-step move lands back.
        assert_eq!(delta_commas(2, -2), -9);
    }

    #[test]
    fn test_letter_commas() {
        assert_eq!(letter_commas(Letter::C), 0);
        assert_eq!(letter_commas(Letter::D), 9);
        assert_eq!(letter_commas(Letter::B), 49);
    }

    #[test]
    fn test_choose_spelling_prefers_conventional_pair() {
        // Four commas above C: written as C +4 rather than D -5.
        let sp = choose_spelling(4, 1);
        assert_eq!((sp.letter, sp.micro), (Letter::C, 4));
        // Same position under downward motion: the flat-side member of the
        // pair, D -5, wins instead.
        let sp = choose_spelling(4, -1);
        assert_eq!((sp.letter, sp.micro), (Letter::D, -5));
    }

    #[test]
    fn test_micro_prefix() {
        assert_eq!(micro_prefix(4, true), "^4");
        assert_eq!(micro_prefix(-5, true), "_5");
        assert_eq!(micro_prefix(0, true), "=");
        assert_eq!(micro_prefix(0, false), "");
    }
}
