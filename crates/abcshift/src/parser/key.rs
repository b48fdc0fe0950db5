//! Key field parsing and key renaming.
//!
//! A `K:` body is classified as standard (tonic + diatonic mode),
//! `none`, or nonstandard. Standard keys get a full signature from the
//! relative-major lookup; nonstandard keys still get a best-effort base
//! signature when their mode word is diatonic, so pitch semantics stay
//! stable across transpositions.

use std::cmp::Ordering;
use std::ops::Range;

use crate::model::{
    AccidentalGlyph, KeyDescriptor, KeyKind, Letter, LetterMemo, LetterSteps, Mode7, Side,
};
use crate::parser::note::parse_accidental;

pub const SHARP_TONIC_BY_PC: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
pub const FLAT_TONIC_BY_PC: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

const SHARP_MAJORS: [(i32, &str, i8); 8] = [
    (0, "C", 0),
    (7, "G", 1),
    (2, "D", 2),
    (9, "A", 3),
    (4, "E", 4),
    (11, "B", 5),
    (6, "F#", 6),
    (1, "C#", 7),
];
const FLAT_MAJORS: [(i32, &str, i8); 8] = [
    (0, "C", 0),
    (5, "F", 1),
    (10, "Bb", 2),
    (3, "Eb", 3),
    (8, "Ab", 4),
    (1, "Db", 5),
    (6, "Gb", 6),
    (11, "Cb", 7),
];

const SHARP_ORDER: [Letter; 7] = [
    Letter::F,
    Letter::C,
    Letter::G,
    Letter::D,
    Letter::A,
    Letter::E,
    Letter::B,
];
const FLAT_ORDER: [Letter; 7] = [
    Letter::B,
    Letter::E,
    Letter::A,
    Letter::D,
    Letter::G,
    Letter::C,
    Letter::F,
];

/// Normalize a signed value into the JS-style symmetric range around zero
/// (both endpoints of `±modulus/2` are representable).
pub fn normalize_signed(value: i32, modulus: i32) -> i32 {
    let half = modulus / 2;
    let mut v = value % modulus;
    while v > half {
        v -= modulus;
    }
    while v < -half {
        v += modulus;
    }
    v
}

/// An explicit accidental token inside a key body, with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAccToken {
    pub range: Range<usize>,
    pub letter_char: char,
    pub glyph: AccidentalGlyph,
}

/// Byte spans inside a key body that the transposer may rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyBodyLayout {
    /// Span of the tonic root (letter plus written accidental) within the
    /// body.
    pub tonic_root: Option<Range<usize>>,
    /// Explicit accidental tokens, in source order.
    pub acc_tokens: Vec<KeyAccToken>,
}

/// Parse a `K:` field body (everything after the colon, up to end of line
/// or `]`). Never fails: unrecognized bodies classify as nonstandard.
pub fn parse_key_field(body: &str) -> (KeyDescriptor, KeyBodyLayout) {
    let head_end = body.find('%').unwrap_or(body.len());
    let head = &body[..head_end];
    let trimmed = head.trim();

    if trimmed.is_empty() {
        return (KeyDescriptor::default(), KeyBodyLayout::default());
    }

    if starts_with_word_ignore_case(trimmed, "none") {
        let tokens = scan_key_acc_tokens(head);
        let overrides = overrides_from_tokens(&tokens);
        let desc = KeyDescriptor {
            kind: KeyKind::None,
            default_acc: LetterSteps::default().overlaid(&overrides),
            overrides,
            ..KeyDescriptor::default()
        };
        let layout = KeyBodyLayout {
            tonic_root: None,
            acc_tokens: tokens,
        };
        return (desc, layout);
    }

    if contains_bagpipe_token(head) {
        let desc = KeyDescriptor {
            kind: KeyKind::Nonstandard,
            ..KeyDescriptor::default()
        };
        return (desc, KeyBodyLayout::default());
    }

    // First whitespace-delimited token carries the tonic and possibly an
    // attached mode word (e.g. "Ebmin").
    let tok_start = head.len() - head.trim_start().len();
    let first_token = trimmed.split_whitespace().next().unwrap_or("");
    let bytes = first_token.as_bytes();

    let root_letter = match bytes.first().and_then(|b| {
        let c = *b as char;
        c.is_ascii_uppercase().then(|| Letter::from_char(c)).flatten()
    }) {
        Some(l) => l,
        None => {
            // Tonic not recognized: preserve verbatim.
            let desc = KeyDescriptor {
                kind: KeyKind::Nonstandard,
                ..KeyDescriptor::default()
            };
            return (desc, KeyBodyLayout::default());
        }
    };
    let (root_acc, root_len): (i8, usize) = match bytes.get(1) {
        Some(b'#') => (1, 2),
        Some(b'b') => (-1, 2),
        _ => (0, 1),
    };
    let rest_inline = &first_token[root_len..];

    // A detached mode word is the second token, but only a purely
    // alphabetic one is a mode candidate; tokens like clef=bass are
    // trailing material, not modes.
    let second = trimmed.split_whitespace().nth(1).unwrap_or("");
    let mode_raw = if !rest_inline.is_empty() {
        rest_inline
    } else if !second.is_empty() && second.chars().all(|c| c.is_ascii_alphabetic()) {
        second
    } else {
        ""
    };
    let mode = Mode7::parse(mode_raw);

    let acc_tokens = scan_key_acc_tokens(head);
    let has_explicit = !acc_tokens.is_empty() || contains_word_ignore_case(head, "exp");

    let tonic = Some((root_letter, root_acc));
    let tonic_pc = (root_letter.pc12() + i32::from(root_acc)).rem_euclid(12);
    let tonic_side = match root_acc {
        1 => Side::Sharp,
        -1 => Side::Flat,
        _ => Side::Neutral,
    };

    // Base diatonic signature, when the mode word is one of the seven.
    let base = mode.and_then(|m| {
        let pc_rel = (tonic_pc + m.relative_major_offset()).rem_euclid(12);
        let preferred = if tonic_side == Side::Neutral {
            Side::Flat
        } else {
            tonic_side
        };
        major_signature_for_pc(pc_rel, preferred)
    });
    let (signature_count, side, base_default_acc) = match &base {
        Some(sig) => (
            sig.signed_count(),
            sig.side,
            build_signature_acc(sig.signed_count()),
        ),
        None => (0, Side::Neutral, LetterSteps::default()),
    };

    let tonic_root = Some(tok_start..tok_start + root_len);

    if mode.is_some() && !has_explicit && base.is_some() {
        let desc = KeyDescriptor {
            kind: KeyKind::Standard,
            tonic,
            mode,
            signature_count,
            side,
            base_default_acc,
            default_acc: base_default_acc,
            overrides: LetterMemo::default(),
        };
        return (
            desc,
            KeyBodyLayout {
                tonic_root,
                acc_tokens: Vec::new(),
            },
        );
    }

    let overrides = overrides_from_tokens(&acc_tokens);
    let desc = KeyDescriptor {
        kind: KeyKind::Nonstandard,
        tonic,
        mode,
        signature_count,
        side,
        base_default_acc,
        default_acc: base_default_acc.overlaid(&overrides),
        overrides,
    };
    (
        desc,
        KeyBodyLayout {
            tonic_root,
            acc_tokens,
        },
    )
}

fn overrides_from_tokens(tokens: &[KeyAccToken]) -> LetterMemo {
    let mut memo = LetterMemo::default();
    for tok in tokens {
        if let (Some(letter), Some(steps)) =
            (Letter::from_char(tok.letter_char), tok.glyph.half_steps())
        {
            memo.set(letter, steps);
        }
    }
    memo
}

/// Scan a key-body head for explicit accidental tokens: a glyph followed by
/// a note letter, delimited by whitespace on the left and a non-alphanumeric
/// character on the right.
pub fn scan_key_acc_tokens(head: &str) -> Vec<KeyAccToken> {
    let mut tokens = Vec::new();
    let bytes = head.as_bytes();
    let mut i = 0;
    while i < head.len() {
        if !head.is_char_boundary(i) {
            i += 1;
            continue;
        }
        let at_boundary = i == 0 || matches!(bytes[i - 1], b' ' | b'\t');
        if !at_boundary {
            i += 1;
            continue;
        }
        let mut rest = &head[i..];
        let before = rest.len();
        if let Ok(glyph) = parse_accidental(&mut rest) {
            let glyph_len = before - rest.len();
            let letter_char = rest.chars().next().unwrap_or('\0');
            let after_ok = rest
                .chars()
                .nth(1)
                .is_none_or(|c| !c.is_ascii_alphanumeric());
            if Letter::from_char(letter_char).is_some()
                && letter_char.is_ascii_alphabetic()
                && after_ok
            {
                let end = i + glyph_len + 1;
                tokens.push(KeyAccToken {
                    range: i..end,
                    letter_char,
                    glyph,
                });
                i = end;
                continue;
            }
        }
        i += 1;
    }
    tokens
}

fn starts_with_word_ignore_case(s: &str, word: &str) -> bool {
    s.len() >= word.len()
        && s.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
        && s[word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric())
}

fn contains_word_ignore_case(s: &str, word: &str) -> bool {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|t| t.eq_ignore_ascii_case(word))
}

fn contains_bagpipe_token(s: &str) -> bool {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|t| t == "HP" || t == "Hp")
}

/// A major-key signature entry from the circle-of-fifths tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MajorSignature {
    pub name: &'static str,
    pub count: i8,
    pub side: Side,
}

impl MajorSignature {
    pub fn signed_count(&self) -> i8 {
        match self.side {
            Side::Flat => -self.count,
            _ => self.count,
        }
    }
}

/// Look up the major key with the given tonic pitch class on the sharp and
/// flat tables. When both sides carry the pitch class, `preferred` wins,
/// then flat.
pub fn major_signature_for_pc(pc: i32, preferred: Side) -> Option<MajorSignature> {
    let pc = pc.rem_euclid(12);
    let mut candidates = Vec::with_capacity(2);
    if let Some((_, name, count)) = SHARP_MAJORS.iter().find(|(p, _, _)| *p == pc) {
        candidates.push(MajorSignature {
            name,
            count: *count,
            side: if *count == 0 { Side::Neutral } else { Side::Sharp },
        });
    }
    if let Some((_, name, count)) = FLAT_MAJORS.iter().find(|(p, _, _)| *p == pc) {
        candidates.push(MajorSignature {
            name,
            count: *count,
            side: if *count == 0 { Side::Neutral } else { Side::Flat },
        });
    }
    match candidates.len() {
        0 => None,
        1 => Some(candidates[0]),
        _ => Some(
            candidates
                .iter()
                .copied()
                .find(|c| c.side == preferred)
                .or_else(|| candidates.iter().copied().find(|c| c.side == Side::Flat))
                .unwrap_or(candidates[0]),
        ),
    }
}

/// Per-letter defaults for a signed signature count, in half-steps.
pub fn build_signature_acc(signed_count: i8) -> LetterSteps {
    let mut acc = LetterSteps::default();
    let n = signed_count.unsigned_abs().min(7) as usize;
    if signed_count > 0 {
        for letter in &SHARP_ORDER[..n] {
            acc.set(*letter, 2);
        }
    } else if signed_count < 0 {
        for letter in &FLAT_ORDER[..n] {
            acc.set(*letter, -2);
        }
    }
    acc
}

/// Parse a tonic name from the rename tables ("C", "F#", "Eb").
pub fn parse_tonic_name(name: &str) -> (Letter, i8) {
    let mut chars = name.chars();
    let letter = chars
        .next()
        .and_then(Letter::from_char)
        .unwrap_or(Letter::C);
    let acc = match chars.next() {
        Some('#') => 1,
        Some('b') => -1,
        _ => 0,
    };
    (letter, acc)
}

fn side_of_name(name: &str) -> Side {
    if name.contains('#') {
        Side::Sharp
    } else if name.contains('b') {
        Side::Flat
    } else {
        Side::Neutral
    }
}

/// The renamed key chosen for a standard-key transposition.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamedKey {
    pub tonic_name: &'static str,
    pub tonic_side: Side,
    pub signature_count: i8,
    pub side: Side,
    pub default_acc: LetterSteps,
}

/// Pick the renamed tonic for a standard key moved by `delta` semitones.
///
/// Candidates are the sharp- and flat-spelled names of the new tonic pitch
/// class; selection order: fewest signature accidentals, then the side of
/// the transposition direction, then the original key's side, then flat,
/// then alphabetical.
pub fn choose_renamed_standard_key(
    tonic_pc: i32,
    mode: Mode7,
    delta: i32,
    original_side: Side,
) -> Option<RenamedKey> {
    let pc_new = (tonic_pc + delta).rem_euclid(12);
    let delta_bias = match delta.cmp(&0) {
        Ordering::Greater => Side::Sharp,
        Ordering::Less => Side::Flat,
        Ordering::Equal => Side::Neutral,
    };
    let pc_rel_maj = (pc_new + mode.relative_major_offset()).rem_euclid(12);

    struct Candidate {
        tonic_name: &'static str,
        tonic_side: Side,
        signature_count: i8,
        side: Side,
    }

    let mut candidates: Vec<Candidate> = Vec::with_capacity(2);
    let mut consider = |tonic_name: &'static str| {
        let tonic_side = side_of_name(tonic_name);
        let preferred = if tonic_side == Side::Neutral {
            if delta_bias != Side::Neutral {
                delta_bias
            } else if original_side != Side::Neutral {
                original_side
            } else {
                Side::Flat
            }
        } else {
            tonic_side
        };
        if let Some(sig) = major_signature_for_pc(pc_rel_maj, preferred) {
            // A spelled tonic whose relative major only exists on the other
            // side would need more than 7 accidentals (e.g. G# major):
            // discard it rather than borrow the enharmonic signature.
            if tonic_side != Side::Neutral
                && sig.side != Side::Neutral
                && sig.side != tonic_side
            {
                return;
            }
            let signed = sig.signed_count();
            if signed.abs() <= 7 {
                candidates.push(Candidate {
                    tonic_name,
                    tonic_side,
                    signature_count: signed,
                    side: sig.side,
                });
            }
        }
    };
    consider(SHARP_TONIC_BY_PC[pc_new as usize]);
    consider(FLAT_TONIC_BY_PC[pc_new as usize]);

    if candidates.is_empty() {
        return None;
    }

    let side_pick = |a: &Candidate, b: &Candidate, want: Side| -> Option<Ordering> {
        let a_has = a.tonic_side == want;
        let b_has = b.tonic_side == want;
        (a_has != b_has).then(|| if a_has { Ordering::Less } else { Ordering::Greater })
    };

    candidates.sort_by(|a, b| {
        let by_count = a.signature_count.abs().cmp(&b.signature_count.abs());
        if by_count != Ordering::Equal {
            return by_count;
        }
        if delta_bias != Side::Neutral {
            if let Some(ord) = side_pick(a, b, delta_bias) {
                return ord;
            }
        }
        if original_side != Side::Neutral {
            if let Some(ord) = side_pick(a, b, original_side) {
                return ord;
            }
        }
        if let Some(ord) = side_pick(a, b, Side::Flat) {
            return ord;
        }
        a.tonic_name.cmp(b.tonic_name)
    });

    let best = &candidates[0];
    Some(RenamedKey {
        tonic_name: best.tonic_name,
        tonic_side: best.tonic_side,
        signature_count: best.signature_count,
        side: best.side,
        default_acc: build_signature_acc(best.signature_count),
    })
}

/// Rename a bare tonic by pitch class: sharp names under an upward delta,
/// flat names downward, otherwise the original side, otherwise flat.
pub fn choose_tonic_name_by_pc(pc: i32, delta: i32, original_side: Side) -> &'static str {
    let pc = pc.rem_euclid(12) as usize;
    let sharp = SHARP_TONIC_BY_PC[pc];
    let flat = FLAT_TONIC_BY_PC[pc];
    if sharp == flat {
        return sharp;
    }
    if delta > 0 {
        return sharp;
    }
    if delta < 0 {
        return flat;
    }
    match original_side {
        Side::Sharp => sharp,
        _ => flat,
    }
}

/// Re-target a key override token: pick the letter from the rotated
/// sequence whose base-signature pitch sits closest to the target, and the
/// accidental (half-steps) that reaches it exactly.
pub fn choose_override_letter(
    target_step24: i32,
    seq: &[Letter; 7],
    base_acc: &LetterSteps,
    delta: i32,
) -> (Letter, i32) {
    let target = target_step24.rem_euclid(24);
    let mut best: Option<(Letter, i32, (i32, i32, usize))> = None;
    for letter in seq {
        let acc = normalize_signed(target - letter.pc12() * 2, 24);
        if !(-4..=4).contains(&acc) {
            continue;
        }
        let base_step = (letter.pc12() * 2 + base_acc.get(*letter)).rem_euclid(24);
        let signed = normalize_signed(target - base_step, 24);
        let dist = signed.abs().min(24 - signed.abs());
        let side_pref = if delta > 0 {
            i32::from(signed >= 0)
        } else if delta < 0 {
            i32::from(signed <= 0)
        } else {
            0
        };
        let score = (dist, side_pref, letter.spelling_index());
        if best.as_ref().is_none_or(|(_, _, s)| score < *s) {
            best = Some((*letter, acc, score));
        }
    }
    match best {
        Some((letter, acc, _)) => (letter, acc),
        None => (seq[0], normalize_signed(target - seq[0].pc12() * 2, 24)),
    }
}
