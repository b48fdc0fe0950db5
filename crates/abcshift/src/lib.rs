//! ABC notation transposition engine.
//!
//! Transposes ABC text by a signed number of tuning steps while keeping
//! every byte of non-pitch content (comments, lyrics, decorations, inline
//! fields, chord qualities) exactly as written. Supports standard 12-EDO
//! tuning and the 53-EDO comma grid used for makam notation, selected by
//! the last `%%MIDI temperamentequal` directive in the document.
//!
//! # Example
//!
//! ```
//! use abcshift::{transpose, Options};
//!
//! let abc = "X:1\nK:Em\nE2 B2|";
//! let out = transpose(abc, -1, &Options::default()).unwrap();
//! assert_eq!(out, "X:1\nK:Ebm\nE2 B2|");
//! ```
//!
//! The engine is a pure function: no I/O, no state across calls, and
//! either a complete rewritten string or an error, never partial output.

pub mod chord;
pub mod comma;
pub mod engine;
pub mod model;
pub mod parser;
pub mod spell;

use serde::{Deserialize, Serialize};

pub use model::{
    AccidentalGlyph, KeyDescriptor, KeyKind, Letter, LetterMemo, LetterSteps, Mode7, NoteToken,
    Side,
};

/// Errors from the transposition engine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The detected octave division is not one the engine supports.
    #[error("unsupported EDO {0}: only 12 and 53 steps per octave are supported")]
    UnsupportedEdo(u32),
    /// A symbolic semitone accidental in 53-EDO input, where only numeric
    /// comma offsets (`^k`/`_k`) and `=` are meaningful.
    #[error("unsupported accidental '{glyph}' in {edo}-EDO: use numeric ^k/_k or '='")]
    UnsupportedAccidental { glyph: String, edo: u32 },
    /// The requested delta exceeds the configured limit.
    #[error("delta {delta} outside the configured range of +/-{max} steps")]
    DeltaOutOfRange { delta: i32, max: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// How note respelling treats key signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Spell against an empty signature with the configured preference.
    Chromatic,
    /// Spell against the renamed key's signature and side.
    Tonal,
    /// Tonal when any key occurrence carries a tonic, chromatic otherwise.
    #[default]
    Auto,
}

/// Which enharmonic side to lean toward when nothing else decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prefer {
    #[default]
    Flat,
    Sharp,
}

/// Engine options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub mode: Mode,
    pub prefer: Prefer,
    /// Transpose chord symbols inside quoted strings when they match the
    /// chord grammar.
    pub chords: bool,
    /// Reject deltas whose magnitude exceeds this limit. `None` accepts
    /// any integer; `Some(1)` reproduces the constrained single-step
    /// profile.
    pub max_abs_delta: Option<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            mode: Mode::Auto,
            prefer: Prefer::Flat,
            chords: true,
            max_abs_delta: None,
        }
    }
}

/// Transpose ABC text by `delta_steps` semitones.
///
/// A delta of zero returns the input unchanged, byte for byte. The step
/// unit is the semitone in both supported tunings; in 53-EDO each semitone
/// crossing moves pitches by the comma width of that semitone relative to
/// the key's tonic.
pub fn transpose(text: &str, delta_steps: i32, options: &Options) -> Result<String> {
    engine::transpose(text, delta_steps, options)
}
