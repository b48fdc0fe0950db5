//! Core types for the transposition engine.
//!
//! These types represent the pitch-bearing content the engine rewrites:
//! note tokens, accidental glyphs, and key descriptors. Everything else in
//! the input text passes through the serializer untouched.

use serde::{Deserialize, Serialize};

/// A natural note letter, A through G.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Letter {
    /// Parse from a note character (either case).
    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Letter::A => 'A',
            Letter::B => 'B',
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
        }
    }

    /// Array index, A = 0 .. G = 6.
    pub fn index(&self) -> usize {
        match self {
            Letter::A => 0,
            Letter::B => 1,
            Letter::C => 2,
            Letter::D => 3,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 6,
        }
    }

    /// Semitones above C (C=0, D=2, E=4, F=5, G=7, A=9, B=11).
    pub fn pc12(&self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Letters in spelling order, the deterministic tie-break order.
    pub fn spelling_order() -> [Letter; 7] {
        [
            Letter::C,
            Letter::D,
            Letter::E,
            Letter::F,
            Letter::G,
            Letter::A,
            Letter::B,
        ]
    }

    /// Position within [`Letter::spelling_order`].
    pub fn spelling_index(&self) -> usize {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    /// Letters in alphabetical order starting from `seed`, wrapping at G.
    pub fn rotated_from(seed: Letter) -> [Letter; 7] {
        const ALPHA: [Letter; 7] = [
            Letter::A,
            Letter::B,
            Letter::C,
            Letter::D,
            Letter::E,
            Letter::F,
            Letter::G,
        ];
        let start = seed.index();
        let mut out = [Letter::A; 7];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = ALPHA[(start + i) % 7];
        }
        out
    }
}

/// An accidental glyph as written in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccidentalGlyph {
    Sharp,
    Flat,
    DoubleSharp,
    DoubleFlat,
    Natural,
    /// `^n/d` or `_n/d`; the shorthand `^/` is 1/2. Value is `sign * n / d`
    /// semitones.
    Fraction { sign: i8, num: u32, den: u32 },
    /// `^k` / `_k`: a signed integer count of steps in the active EDO
    /// (semitones in 12-EDO, commas in 53-EDO).
    Steps(i32),
}

impl AccidentalGlyph {
    /// Value in half-semitone steps for the 12-EDO pitch model, when the
    /// glyph has an exact value on that grid.
    pub fn half_steps(&self) -> Option<i32> {
        match self {
            AccidentalGlyph::Sharp => Some(2),
            AccidentalGlyph::Flat => Some(-2),
            AccidentalGlyph::DoubleSharp => Some(4),
            AccidentalGlyph::DoubleFlat => Some(-4),
            AccidentalGlyph::Natural => Some(0),
            AccidentalGlyph::Fraction { sign, num, den } => {
                let num = 2 * u64::from(*num);
                let den = u64::from(*den).max(1);
                if num % den != 0 {
                    return None;
                }
                let value = (num / den).min(i32::MAX as u64) as i32;
                Some(i32::from(*sign) * value)
            }
            AccidentalGlyph::Steps(k) => Some(k.saturating_mul(2)),
        }
    }

    /// Comma offset for the 53-EDO pitch model. Symbolic semitone glyphs
    /// and fractions have no defined comma value.
    pub fn commas(&self) -> Option<i32> {
        match self {
            AccidentalGlyph::Natural => Some(0),
            AccidentalGlyph::Steps(k) => Some(*k),
            _ => None,
        }
    }
}

/// One note token scanned from a music line.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteToken<'a> {
    pub accidental: Option<AccidentalGlyph>,
    /// Accidental prefix exactly as written (empty when absent).
    pub acc_text: &'a str,
    /// The note letter as written; case selects the octave band.
    pub letter_char: char,
    pub octave_marks: &'a str,
    pub duration: &'a str,
    /// Total bytes consumed from the scan position.
    pub len: usize,
}

impl NoteToken<'_> {
    pub fn letter(&self) -> Letter {
        // The tokenizer only produces A-G characters.
        Letter::from_char(self.letter_char).unwrap_or(Letter::C)
    }

    /// Octave band 4 for uppercase, 5 for lowercase, shifted by marks.
    pub fn octave(&self) -> i32 {
        let base = if self.letter_char.is_ascii_uppercase() {
            4
        } else {
            5
        };
        let mut oct = base;
        for c in self.octave_marks.chars() {
            match c {
                '\'' => oct += 1,
                ',' => oct -= 1,
                _ => {}
            }
        }
        oct
    }
}

/// The seven diatonic modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode7 {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode7 {
    /// Parse a mode word, accepting the usual abbreviations. An empty word
    /// is ionian (a bare tonic).
    pub fn parse(s: &str) -> Option<Mode7> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "" | "maj" | "major" | "ion" | "ionian" => Some(Mode7::Ionian),
            "m" | "min" | "minor" | "aeo" | "aeolian" => Some(Mode7::Aeolian),
            "dor" | "dorian" => Some(Mode7::Dorian),
            "phr" | "phrygian" => Some(Mode7::Phrygian),
            "lyd" | "lydian" => Some(Mode7::Lydian),
            "mix" | "mixolydian" => Some(Mode7::Mixolydian),
            "loc" | "locrian" => Some(Mode7::Locrian),
            _ => None,
        }
    }

    /// Semitone offset from this mode's tonic to its relative major.
    pub fn relative_major_offset(&self) -> i32 {
        match self {
            Mode7::Ionian => 0,
            Mode7::Aeolian => 3,
            Mode7::Dorian => -2,
            Mode7::Phrygian => -4,
            Mode7::Lydian => -5,
            Mode7::Mixolydian => 5,
            Mode7::Locrian => 1,
        }
    }
}

/// Which side of the circle of fifths a key name or signature sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Sharp,
    Flat,
    Neutral,
}

/// Classification of a `K:` field body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// `K:none`, an empty body, or no key seen yet.
    None,
    /// A key the diatonic tables cannot fully describe; preserved verbatim
    /// unless it carries a tonic plus explicit overrides.
    Nonstandard,
    /// Tonic + one of the seven modes, no explicit accidentals.
    Standard,
}

/// Dense per-letter accidental values. Units depend on the active pitch
/// model: half-semitone steps in 12-EDO, commas in 53-EDO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LetterSteps([i32; 7]);

impl LetterSteps {
    pub fn get(&self, letter: Letter) -> i32 {
        self.0[letter.index()]
    }

    pub fn set(&mut self, letter: Letter, value: i32) {
        self.0[letter.index()] = value;
    }

    /// Overlay every entry present in `memo` on top of this map.
    pub fn overlaid(mut self, memo: &LetterMemo) -> LetterSteps {
        for letter in Letter::spelling_order() {
            if let Some(v) = memo.get(letter) {
                self.set(letter, v);
            }
        }
        self
    }
}

/// Sparse per-letter accidental values: `None` means "no entry". Used for
/// bar-scoped accidental memory and explicit key overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LetterMemo([Option<i32>; 7]);

impl LetterMemo {
    pub fn get(&self, letter: Letter) -> Option<i32> {
        self.0[letter.index()]
    }

    pub fn set(&mut self, letter: Letter, value: i32) {
        self.0[letter.index()] = Some(value);
    }

    pub fn clear(&mut self) {
        self.0 = [None; 7];
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// Parsed `K:` field body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub kind: KeyKind,
    /// Tonic letter and written accidental (-1 flat, 0 natural, +1 sharp).
    pub tonic: Option<(Letter, i8)>,
    pub mode: Option<Mode7>,
    /// Signed signature size, + = sharps. Zero for none/verbatim keys.
    pub signature_count: i8,
    pub side: Side,
    /// Diatonic signature defaults only (half-steps).
    pub base_default_acc: LetterSteps,
    /// Base defaults with explicit overrides overlaid (half-steps).
    pub default_acc: LetterSteps,
    /// Explicit per-letter overrides from the key body (half-steps).
    pub overrides: LetterMemo,
}

impl Default for KeyDescriptor {
    fn default() -> Self {
        KeyDescriptor {
            kind: KeyKind::None,
            tonic: None,
            mode: None,
            signature_count: 0,
            side: Side::Neutral,
            base_default_acc: LetterSteps::default(),
            default_acc: LetterSteps::default(),
            overrides: LetterMemo::default(),
        }
    }
}

impl KeyDescriptor {
    /// Tonic pitch class 0..11, when a tonic is present.
    pub fn tonic_pc(&self) -> Option<i32> {
        let (letter, acc) = self.tonic?;
        Some((letter.pc12() + i32::from(acc)).rem_euclid(12))
    }

    /// Side implied by the tonic's written accidental.
    pub fn tonic_side(&self) -> Side {
        match self.tonic {
            Some((_, 1)) => Side::Sharp,
            Some((_, -1)) => Side::Flat,
            _ => Side::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_pc12() {
        assert_eq!(Letter::C.pc12(), 0);
        assert_eq!(Letter::B.pc12(), 11);
        assert_eq!(Letter::from_char('f'), Some(Letter::F));
        assert_eq!(Letter::from_char('x'), None);
    }

    #[test]
    fn test_rotated_letters() {
        let seq = Letter::rotated_from(Letter::D);
        assert_eq!(seq[0], Letter::D);
        assert_eq!(seq[6], Letter::C);
    }

    #[test]
    fn test_glyph_half_steps() {
        assert_eq!(AccidentalGlyph::Sharp.half_steps(), Some(2));
        assert_eq!(AccidentalGlyph::DoubleFlat.half_steps(), Some(-4));
        let quarter = AccidentalGlyph::Fraction {
            sign: 1,
            num: 1,
            den: 2,
        };
        assert_eq!(quarter.half_steps(), Some(1));
        let three_quarter = AccidentalGlyph::Fraction {
            sign: -1,
            num: 3,
            den: 2,
        };
        assert_eq!(three_quarter.half_steps(), Some(-3));
        let inexact = AccidentalGlyph::Fraction {
            sign: 1,
            num: 3,
            den: 4,
        };
        assert_eq!(inexact.half_steps(), None);
        assert_eq!(AccidentalGlyph::Steps(-3).half_steps(), Some(-6));
    }

    #[test]
    fn test_glyph_commas() {
        assert_eq!(AccidentalGlyph::Steps(4).commas(), Some(4));
        assert_eq!(AccidentalGlyph::Natural.commas(), Some(0));
        assert_eq!(AccidentalGlyph::Sharp.commas(), None);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode7::parse("maj"), Some(Mode7::Ionian));
        assert_eq!(Mode7::parse(""), Some(Mode7::Ionian));
        assert_eq!(Mode7::parse("m"), Some(Mode7::Aeolian));
        assert_eq!(Mode7::parse("Mixolydian"), Some(Mode7::Mixolydian));
        assert_eq!(Mode7::parse("HP"), None);
    }

    #[test]
    fn test_letter_steps_overlay() {
        let mut base = LetterSteps::default();
        base.set(Letter::F, 2);
        let mut memo = LetterMemo::default();
        memo.set(Letter::F, 0);
        memo.set(Letter::C, -2);
        let merged = base.overlaid(&memo);
        assert_eq!(merged.get(Letter::F), 0);
        assert_eq!(merged.get(Letter::C), -2);
        assert_eq!(merged.get(Letter::G), 0);
    }
}
