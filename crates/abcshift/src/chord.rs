//! Chord-symbol transposition for quoted strings.
//!
//! Quoted text is rewritten only when it matches a chord grammar: a root
//! letter with an optional accidental, a quality suffix that contains no
//! uppercase note letters, and an optional slash bass. Anything else
//! (titles, annotations, lyrics cues) passes through untouched.

use crate::model::{Letter, Side};
use crate::parser::key::choose_tonic_name_by_pc;

/// Transpose a chord symbol by `delta` semitones, or return `None` when
/// the string is not a chord.
pub fn transpose_chord(symbol: &str, delta: i32) -> Option<String> {
    let (root, rest) = parse_root(symbol)?;
    let (quality, bass) = match rest.find('/') {
        Some(pos) => {
            let (q, b) = rest.split_at(pos);
            let (bass_root, bass_rest) = parse_root(&b[1..])?;
            if !bass_rest.is_empty() {
                return None;
            }
            (q, Some(bass_root))
        }
        None => (rest, None),
    };
    if !is_quality(quality) {
        return None;
    }

    let mut out = String::with_capacity(symbol.len() + 2);
    push_root(&mut out, &root, delta);
    out.push_str(quality);
    if let Some(bass) = bass {
        out.push('/');
        push_root(&mut out, &bass, delta);
    }
    Some(out)
}

struct ChordRoot {
    letter: Letter,
    lowercase: bool,
    acc: i32,
}

fn parse_root(s: &str) -> Option<(ChordRoot, &str)> {
    let first = s.chars().next()?;
    let letter = Letter::from_char(first).filter(|_| first.is_ascii_alphabetic())?;
    let lowercase = first.is_ascii_lowercase();
    let after_letter = &s[first.len_utf8()..];
    let (acc, rest) = match after_letter.chars().next() {
        Some(c @ ('#' | '♯')) => (1, &after_letter[c.len_utf8()..]),
        Some(c @ ('b' | '♭')) => (-1, &after_letter[c.len_utf8()..]),
        _ => (0, after_letter),
    };
    Some((
        ChordRoot {
            letter,
            lowercase,
            acc,
        },
        rest,
    ))
}

fn push_root(out: &mut String, root: &ChordRoot, delta: i32) {
    let pc = (root.letter.pc12() + root.acc + delta).rem_euclid(12);
    let side = match root.acc {
        1 => Side::Sharp,
        -1 => Side::Flat,
        _ => Side::Neutral,
    };
    let name = choose_tonic_name_by_pc(pc, delta, side);
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if root.lowercase {
            out.push(first.to_ascii_lowercase());
        } else {
            out.push(first);
        }
    }
    out.extend(chars);
}

/// Quality suffixes are built from known atoms; uppercase note letters
/// never appear, so running text is rejected.
fn is_quality(s: &str) -> bool {
    const WORDS: [&str; 6] = ["maj", "min", "dim", "aug", "sus", "add"];
    let mut rest = s;
    'outer: while !rest.is_empty() {
        let c = rest.chars().next().unwrap();
        if c.is_ascii_digit() {
            let n = rest.bytes().take_while(u8::is_ascii_digit).count();
            rest = &rest[n..];
            continue;
        }
        for word in WORDS {
            if let Some(r) = rest.strip_prefix(word) {
                rest = r;
                continue 'outer;
            }
        }
        match c {
            'm' | 'b' | '#' | '+' | '(' | ')' | '-' | 'o' | '°' | 'ø' | '♯' | '♭' => {
                rest = &rest[c.len_utf8()..];
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_roots() {
        assert_eq!(transpose_chord("G", 1).as_deref(), Some("G#"));
        assert_eq!(transpose_chord("G", -1).as_deref(), Some("Gb"));
        assert_eq!(transpose_chord("E", 1).as_deref(), Some("F"));
    }

    #[test]
    fn test_qualities_preserved() {
        assert_eq!(transpose_chord("Am7", -2).as_deref(), Some("Gm7"));
        assert_eq!(transpose_chord("Gmaj7", 2).as_deref(), Some("Amaj7"));
        assert_eq!(transpose_chord("Bdim", 1).as_deref(), Some("Cdim"));
        assert_eq!(transpose_chord("D7sus4", -1).as_deref(), Some("Db7sus4"));
        assert_eq!(transpose_chord("F#m7b5", 1).as_deref(), Some("Gm7b5"));
    }

    #[test]
    fn test_slash_bass() {
        assert_eq!(transpose_chord("D/F#", 1).as_deref(), Some("D#/G"));
        assert_eq!(transpose_chord("Am/C", -1).as_deref(), Some("Abm/B"));
    }

    #[test]
    fn test_accidental_roots() {
        assert_eq!(transpose_chord("Bb", 1).as_deref(), Some("B"));
        assert_eq!(transpose_chord("F#", -1).as_deref(), Some("F"));
        // Unicode accidentals normalize to ASCII.
        assert_eq!(transpose_chord("B♭m", -1).as_deref(), Some("Am"));
    }

    #[test]
    fn test_non_chords_rejected() {
        assert_eq!(transpose_chord("CDE", 1), None);
        assert_eq!(transpose_chord("dolce", 1), None);
        assert_eq!(transpose_chord("1st time", 1), None);
        assert_eq!(transpose_chord("", 1), None);
        assert_eq!(transpose_chord("G major", 1), None);
        assert_eq!(transpose_chord("D/verse", 1), None);
    }

    #[test]
    fn test_lowercase_root_keeps_case() {
        assert_eq!(transpose_chord("am7", -2).as_deref(), Some("gm7"));
    }
}
