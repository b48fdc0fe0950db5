//! 12-EDO pitch model: absolute-step arithmetic and enharmonic spelling.
//!
//! The internal unit is the half semitone (24 steps per octave), which
//! makes quarter-tone glyphs exact. A printed accidental is at most a
//! whole tone (|steps| <= 4), which covers everything from `__` to `^^`
//! plus the three-quarter forms `^3/2`/`_3/2`.

use crate::model::{Letter, LetterMemo, LetterSteps};
use crate::parser::key::normalize_signed;
use crate::Prefer;

pub const STEPS_PER_SEMITONE: i32 = 2;
pub const STEPS_PER_OCTAVE: i32 = 24;

/// Half-steps above C for a natural letter.
pub fn letter_steps(letter: Letter) -> i32 {
    letter.pc12() * STEPS_PER_SEMITONE
}

/// Absolute pitch of a scanned note, in half-steps from octave zero.
///
/// Resolution order for the accidental in effect: the token's own
/// accidental, then the bar memory for the letter, then the key default.
/// An explicit accidental is recorded into the bar memory. No octave wrap
/// is applied, so accidentals may cross the B/C boundary.
pub fn absolute_steps(
    letter: Letter,
    octave: i32,
    explicit_acc: Option<i32>,
    key_default: &LetterSteps,
    bar: &mut LetterMemo,
) -> i32 {
    let acc = match explicit_acc {
        Some(a) => {
            bar.set(letter, a);
            a
        }
        None => bar.get(letter).unwrap_or(key_default.get(letter)),
    };
    octave * STEPS_PER_OCTAVE + letter_steps(letter) + acc
}

/// A chosen way to write a pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelling {
    pub letter: Letter,
    /// Accidental in half-steps, absolute (not relative to the key).
    pub acc: i32,
    pub octave: i32,
    /// Whether a glyph must be printed for this note.
    pub printed: bool,
}

/// Pick the best (letter, accidental, octave) for an absolute pitch.
///
/// Scoring, lexicographic: printed-accidental magnitude against the
/// letter's current default (bar memory over key default), side mismatch
/// with the active preference, absolute accidental magnitude, letter order.
/// A `preferred` letter short-circuits the search when it can represent the
/// pitch within the whole-tone bound.
pub fn choose_spelling(
    abs: i32,
    write_default: &LetterSteps,
    bar: &LetterMemo,
    prefer: Prefer,
    preferred: Option<Letter>,
) -> Spelling {
    if let Some(letter) = preferred {
        if let Some(sp) = spell_with_letter(abs, letter, write_default, bar) {
            return sp;
        }
    }

    let step = abs.rem_euclid(STEPS_PER_OCTAVE);
    let mut best: Option<(Spelling, (i32, i32, i32, usize))> = None;
    for (idx, letter) in Letter::spelling_order().into_iter().enumerate() {
        let acc = normalize_signed(step - letter_steps(letter), STEPS_PER_OCTAVE);
        if !(-4..=4).contains(&acc) {
            continue;
        }
        let effective = bar.get(letter).unwrap_or(write_default.get(letter));
        let printed = (acc - effective).abs();
        let side = match prefer {
            Prefer::Flat => i32::from(acc > 0),
            Prefer::Sharp => i32::from(acc < 0),
        };
        let score = (printed, side, acc.abs(), idx);
        if best.as_ref().is_none_or(|(_, s)| score < *s) {
            let octave = (abs - (letter_steps(letter) + acc)).div_euclid(STEPS_PER_OCTAVE);
            best = Some((
                Spelling {
                    letter,
                    acc,
                    octave,
                    printed: acc != effective,
                },
                score,
            ));
        }
    }
    // Every pitch class sits within a whole tone of some natural letter.
    best.map(|(sp, _)| sp).unwrap_or(Spelling {
        letter: Letter::C,
        acc: 0,
        octave: abs.div_euclid(STEPS_PER_OCTAVE),
        printed: false,
    })
}

/// Spell with a fixed letter, minimizing the printed then the absolute
/// accidental. Used when rewriting under a nonstandard key so tokens keep
/// their letter identity across the transposition.
fn spell_with_letter(
    abs: i32,
    letter: Letter,
    write_default: &LetterSteps,
    bar: &LetterMemo,
) -> Option<Spelling> {
    let effective = bar.get(letter).unwrap_or(write_default.get(letter));
    let mut best: Option<(Spelling, (i32, i32))> = None;
    for acc in -4..=4 {
        let numer = abs - (letter_steps(letter) + acc);
        if numer.rem_euclid(STEPS_PER_OCTAVE) != 0 {
            continue;
        }
        let octave = numer / STEPS_PER_OCTAVE;
        let score = ((acc - effective).abs(), acc.abs());
        if best.as_ref().is_none_or(|(_, s)| score < *s) {
            best = Some((
                Spelling {
                    letter,
                    acc,
                    octave,
                    printed: acc != effective,
                },
                score,
            ));
        }
    }
    best.map(|(sp, _)| sp)
}

/// Pick a (letter, accidental) for a pitch class alone, for key-field
/// accidental tokens where octave and bar state do not apply.
pub fn pick_step_spelling(step_in_octave: i32, prefer: Prefer) -> (Letter, i32) {
    let step = step_in_octave.rem_euclid(STEPS_PER_OCTAVE);
    let mut best: Option<(Letter, i32, (i32, i32, usize))> = None;
    for (idx, letter) in Letter::spelling_order().into_iter().enumerate() {
        let acc = normalize_signed(step - letter_steps(letter), STEPS_PER_OCTAVE);
        if !(-4..=4).contains(&acc) {
            continue;
        }
        let side = match prefer {
            Prefer::Flat => i32::from(acc > 0),
            Prefer::Sharp => i32::from(acc < 0),
        };
        let score = (acc.abs(), side, idx);
        if best.as_ref().is_none_or(|(_, _, s)| score < *s) {
            best = Some((letter, acc, score));
        }
    }
    best.map(|(l, a, _)| (l, a)).unwrap_or((Letter::C, 0))
}

/// Glyph for an absolute accidental value in half-steps.
pub fn accidental_glyph(half_steps: i32) -> &'static str {
    match half_steps {
        4 => "^^",
        3 => "^3/2",
        2 => "^",
        1 => "^/",
        0 => "=",
        -1 => "_/",
        -2 => "_",
        -3 => "_3/2",
        -4 => "__",
        _ => "",
    }
}

/// Render a spelling back to ABC text, with octave band 4 uppercase and 5
/// lowercase.
pub fn render_note(sp: &Spelling, duration: &str) -> String {
    let prefix = if sp.printed {
        accidental_glyph(sp.acc)
    } else {
        ""
    };
    let mut out = String::with_capacity(prefix.len() + duration.len() + 4);
    out.push_str(prefix);
    push_letter_and_marks(&mut out, sp.letter, sp.octave);
    out.push_str(duration);
    out
}

pub fn push_letter_and_marks(out: &mut String, letter: Letter, octave: i32) {
    if octave <= 4 {
        out.push(letter.as_char());
        for _ in octave..4 {
            out.push(',');
        }
    } else {
        out.push(letter.as_char().to_ascii_lowercase());
        for _ in 5..octave {
            out.push('\'');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn natural() -> LetterSteps {
        LetterSteps::default()
    }

    #[test]
    fn test_absolute_steps_plain() {
        let mut bar = LetterMemo::default();
        // Middle-band C.
        assert_eq!(absolute_steps(Letter::C, 4, None, &natural(), &mut bar), 96);
        // Lowercase band.
        assert_eq!(
            absolute_steps(Letter::C, 5, None, &natural(), &mut bar),
            120
        );
    }

    #[test]
    fn test_absolute_steps_bar_memory() {
        let mut bar = LetterMemo::default();
        let sharp_f = absolute_steps(Letter::F, 4, Some(2), &natural(), &mut bar);
        // Later F in the same bar inherits the sharp.
        let plain_f = absolute_steps(Letter::F, 4, None, &natural(), &mut bar);
        assert_eq!(sharp_f, plain_f);
        bar.clear();
        let after_bar = absolute_steps(Letter::F, 4, None, &natural(), &mut bar);
        assert_eq!(after_bar, sharp_f - 2);
    }

    #[test]
    fn test_key_default_applies() {
        let mut key = LetterSteps::default();
        key.set(Letter::F, 2);
        let mut bar = LetterMemo::default();
        let f = absolute_steps(Letter::F, 4, None, &key, &mut bar);
        assert_eq!(f, 96 + 10 + 2);
    }

    #[test]
    fn test_accidental_crosses_octave_boundary() {
        let mut bar = LetterMemo::default();
        // Cb spells the B a half step below the octave origin.
        let c_flat = absolute_steps(Letter::C, 4, Some(-2), &natural(), &mut bar);
        bar.clear();
        let b = absolute_steps(Letter::B, 3, None, &natural(), &mut bar);
        assert_eq!(c_flat, b);
    }

    #[test]
    fn test_choose_spelling_prefers_no_glyph() {
        // Db under a Db-major signature: bare D.
        let mut key = LetterSteps::default();
        for l in [Letter::B, Letter::E, Letter::A, Letter::D, Letter::G] {
            key.set(l, -2);
        }
        let bar = LetterMemo::default();
        let sp = choose_spelling(96 + 2, &key, &bar, Prefer::Flat, None);
        assert_eq!(sp.letter, Letter::D);
        assert_eq!(sp.acc, -2);
        assert!(!sp.printed);
        assert_eq!(sp.octave, 4);
    }

    #[test]
    fn test_choose_spelling_side_preference() {
        let bar = LetterMemo::default();
        let sp = choose_spelling(96 + 2, &natural(), &bar, Prefer::Flat, None);
        assert_eq!(sp.letter, Letter::D);
        assert_eq!(sp.acc, -2);
        let sp = choose_spelling(96 + 2, &natural(), &bar, Prefer::Sharp, None);
        assert_eq!(sp.letter, Letter::C);
        assert_eq!(sp.acc, 2);
    }

    #[test]
    fn test_choose_spelling_quarter_tone() {
        let bar = LetterMemo::default();
        // One half-step above D: prefer the flat-side spelling of E.
        let sp = choose_spelling(96 + 6, &natural(), &bar, Prefer::Flat, None);
        assert_eq!(sp.letter, Letter::E);
        assert_eq!(sp.acc, -2);
        let sp = choose_spelling(96 + 5, &natural(), &bar, Prefer::Flat, None);
        assert_eq!((sp.letter, sp.acc), (Letter::D, 1));
    }

    #[test]
    fn test_choose_spelling_bar_memory_suppresses_glyph() {
        let bar = {
            let mut b = LetterMemo::default();
            b.set(Letter::G, 0);
            b
        };
        let mut key = LetterSteps::default();
        key.set(Letter::G, -2);
        let sp = choose_spelling(96 + 14, &key, &bar, Prefer::Flat, None);
        assert_eq!(sp.letter, Letter::G);
        assert!(!sp.printed);
    }

    #[test]
    fn test_preferred_letter_kept() {
        let bar = LetterMemo::default();
        // F# with preferred letter F stays an F spelling.
        let sp = choose_spelling(96 + 12, &natural(), &bar, Prefer::Flat, Some(Letter::F));
        assert_eq!(sp.letter, Letter::F);
        assert_eq!(sp.acc, 2);
    }

    #[test]
    fn test_render_note_octaves() {
        let sp = Spelling {
            letter: Letter::D,
            acc: -2,
            octave: 4,
            printed: true,
        };
        assert_eq!(render_note(&sp, "2"), "_D2");
        let sp = Spelling {
            letter: Letter::C,
            acc: 0,
            octave: 6,
            printed: false,
        };
        assert_eq!(render_note(&sp, ""), "c'");
        let sp = Spelling {
            letter: Letter::B,
            acc: 0,
            octave: 2,
            printed: false,
        };
        assert_eq!(render_note(&sp, "/2"), "B,,/2");
    }

    #[test]
    fn test_accidental_glyphs() {
        assert_eq!(accidental_glyph(3), "^3/2");
        assert_eq!(accidental_glyph(-1), "_/");
        assert_eq!(accidental_glyph(0), "=");
    }

    #[test]
    fn test_roundtrip_spelling_encode() {
        // Decoding then re-encoding reproduces the absolute pitch.
        let key = natural();
        let bar = LetterMemo::default();
        for abs in 60..180 {
            let sp = choose_spelling(abs, &key, &bar, Prefer::Flat, None);
            let back = sp.octave * STEPS_PER_OCTAVE + letter_steps(sp.letter) + sp.acc;
            assert_eq!(back, abs, "abs {}", abs);
        }
    }
}
