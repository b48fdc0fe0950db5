//! Transposition core: one top-to-bottom pass over the document.
//!
//! Lines keep their own terminators (LF, CR, or CRLF). Field lines pass
//! through except `K:`, which is rewritten in place. Music lines are
//! scanned left to right; only note tokens, key spans, and chord roots are
//! replaced, everything else is copied byte for byte.

use std::ops::Range;

use tracing::debug;

use crate::chord;
use crate::comma;
use crate::model::{KeyKind, Letter, LetterMemo, LetterSteps, Mode7, NoteToken, Side};
use crate::parser::key::{self, KeyAccToken};
use crate::parser;
use crate::parser::note::parse_note_at;
use crate::spell;
use crate::{Error, Mode, Options, Prefer, Result};

pub fn transpose(text: &str, delta: i32, opts: &Options) -> Result<String> {
    if delta == 0 {
        return Ok(text.to_string());
    }
    if let Some(max) = opts.max_abs_delta {
        if delta.unsigned_abs() > max {
            return Err(Error::DeltaOutOfRange { delta, max });
        }
    }
    match parser::detect_edo(text) {
        12 => Ok(transpose_12(text, delta, opts)),
        53 => transpose_53(text, delta, opts),
        n => Err(Error::UnsupportedEdo(n)),
    }
}

/// Split into (line, terminator) pairs, preserving LF/CR/CRLF per line.
fn split_lines(text: &str) -> Vec<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                parts.push((&text[last..i], "\n"));
                i += 1;
                last = i;
            }
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    parts.push((&text[last..i], "\r\n"));
                    i += 2;
                } else {
                    parts.push((&text[last..i], "\r"));
                    i += 1;
                }
                last = i;
            }
            _ => i += 1,
        }
    }
    parts.push((&text[last..], ""));
    parts
}

/// A field line starts with a letter and a colon, or a `%` comment.
fn is_field_line(line: &str) -> bool {
    let t = line.trim_start_matches([' ', '\t']);
    let b = t.as_bytes();
    b.first() == Some(&b'%') || (b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':')
}

/// Split a `K:` field line into (prefix through the colon, body).
fn split_key_line(line: &str) -> Option<(&str, &str)> {
    let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
    let t = &line[ws..];
    t.starts_with("K:")
        .then(|| (&line[..ws + 2], &line[ws + 2..]))
}

fn is_pseudo_directive(line: &str, name: &str) -> bool {
    let t = line.trim_start();
    let Some(rest) = t.strip_prefix("%%") else {
        return false;
    };
    let rest = rest.trim_start();
    let b = rest.as_bytes();
    if b.len() < name.len() || !b[..name.len()].eq_ignore_ascii_case(name.as_bytes()) {
        return false;
    }
    rest[name.len()..]
        .chars()
        .next()
        .is_none_or(|c| !c.is_ascii_alphanumeric())
}

/// Byte offset of `]` closing an inline field at `rest` (which starts with
/// `[`), when the bracket really opens a field.
fn inline_field_close(rest: &str) -> Option<usize> {
    let b = rest.as_bytes();
    if b.get(1).is_some_and(u8::is_ascii_alphabetic) && b.get(2) == Some(&b':') {
        rest[3..].find(']').map(|p| p + 3)
    } else {
        None
    }
}

fn apply_replacements(src: &str, mut reps: Vec<(Range<usize>, String)>) -> String {
    reps.sort_by_key(|(r, _)| r.start);
    let mut out = String::with_capacity(src.len() + 8);
    let mut pos = 0;
    for (range, text) in reps {
        out.push_str(&src[pos..range.start]);
        out.push_str(&text);
        pos = range.end;
    }
    out.push_str(&src[pos..]);
    out
}

fn side_prefer(side: Side, fallback: Prefer) -> Prefer {
    match side {
        Side::Sharp => Prefer::Sharp,
        Side::Flat => Prefer::Flat,
        Side::Neutral => fallback,
    }
}

fn cased(letter: Letter, lowercase: bool) -> char {
    if lowercase {
        letter.as_char().to_ascii_lowercase()
    } else {
        letter.as_char()
    }
}

/// Resolve `Mode::Auto`: tonal as soon as any key occurrence carries a
/// tonic, chromatic otherwise.
fn resolve_tonal(text: &str, opts: &Options) -> bool {
    match opts.mode {
        Mode::Chromatic => false,
        Mode::Tonal => true,
        Mode::Auto => any_keyed(text),
    }
}

fn any_keyed(text: &str) -> bool {
    let keyed = |body: &str| {
        let (desc, _) = key::parse_key_field(body);
        match desc.kind {
            KeyKind::Standard => true,
            KeyKind::Nonstandard => desc.tonic.is_some(),
            KeyKind::None => false,
        }
    };
    let mut in_text_block = false;
    for (line, _) in split_lines(text) {
        if is_pseudo_directive(line, "begintext") {
            in_text_block = true;
        }
        if in_text_block {
            if is_pseudo_directive(line, "endtext") {
                in_text_block = false;
            }
            continue;
        }
        if let Some((_, body)) = split_key_line(line) {
            if keyed(body) {
                return true;
            }
        } else if !is_field_line(line) {
            let mut rest = line;
            while let Some(pos) = rest.find("[K:") {
                let after = &rest[pos + 3..];
                match after.find(']') {
                    Some(close) => {
                        if keyed(&after[..close]) {
                            return true;
                        }
                        rest = &after[close + 1..];
                    }
                    None => break,
                }
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// 12-EDO
// ---------------------------------------------------------------------------

struct Ctx12 {
    read_acc: LetterSteps,
    write_acc: LetterSteps,
    read_bar: LetterMemo,
    write_bar: LetterMemo,
    prefer: Prefer,
    prefer_input_letter: bool,
    tonal: bool,
}

impl Ctx12 {
    fn new(tonal: bool, prefer: Prefer) -> Self {
        Ctx12 {
            read_acc: LetterSteps::default(),
            write_acc: LetterSteps::default(),
            read_bar: LetterMemo::default(),
            write_bar: LetterMemo::default(),
            prefer,
            prefer_input_letter: false,
            tonal,
        }
    }

    fn reset_bar(&mut self) {
        self.read_bar.clear();
        self.write_bar.clear();
    }
}

fn transpose_12(text: &str, delta: i32, opts: &Options) -> String {
    let tonal = resolve_tonal(text, opts);
    debug!(delta, tonal, "transposing in 12-EDO");
    let mut ctx = Ctx12::new(tonal, opts.prefer);
    let mut out = String::with_capacity(text.len() + 32);
    let mut in_text_block = false;

    for (line, nl) in split_lines(text) {
        if is_pseudo_directive(line, "begintext") {
            in_text_block = true;
        }
        if in_text_block {
            if is_pseudo_directive(line, "endtext") {
                in_text_block = false;
            }
            out.push_str(line);
            out.push_str(nl);
            continue;
        }
        if is_field_line(line) {
            match split_key_line(line) {
                Some((prefix, body)) => {
                    out.push_str(prefix);
                    out.push_str(&rewrite_key_body_12(body, delta, opts, &mut ctx));
                }
                None => out.push_str(line),
            }
            out.push_str(nl);
            continue;
        }
        out.push_str(&transpose_music_line_12(line, delta, opts, &mut ctx));
        out.push_str(nl);
    }
    out
}

fn transpose_music_line_12(line: &str, delta: i32, opts: &Options, ctx: &mut Ctx12) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut i = 0;
    while i < line.len() {
        let rest = &line[i..];
        match rest.as_bytes()[0] {
            b'%' => {
                out.push_str(rest);
                break;
            }
            b'"' => {
                if let Some(close) = rest[1..].find('"') {
                    let inner = &rest[1..close + 1];
                    match opts.chords.then(|| chord::transpose_chord(inner, delta)).flatten() {
                        Some(rewritten) => {
                            out.push('"');
                            out.push_str(&rewritten);
                            out.push('"');
                        }
                        None => out.push_str(&rest[..close + 2]),
                    }
                    i += close + 2;
                } else {
                    out.push('"');
                    i += 1;
                }
                continue;
            }
            b'!' => {
                if let Some(close) = rest[1..].find('!') {
                    out.push_str(&rest[..close + 2]);
                    i += close + 2;
                } else {
                    out.push('!');
                    i += 1;
                }
                continue;
            }
            b'|' => {
                ctx.reset_bar();
                out.push('|');
                i += 1;
                continue;
            }
            b':' if rest.as_bytes().get(1) == Some(&b':') => {
                ctx.reset_bar();
                out.push_str("::");
                i += 2;
                continue;
            }
            b'[' => {
                if let Some(close) = inline_field_close(rest) {
                    if rest[1..].starts_with("K:") {
                        out.push_str("[K:");
                        out.push_str(&rewrite_key_body_12(&rest[3..close], delta, opts, ctx));
                        out.push(']');
                    } else {
                        out.push_str(&rest[..close + 1]);
                    }
                    i += close + 1;
                    continue;
                }
                if rest.as_bytes().get(1).is_some_and(u8::is_ascii_digit) {
                    // Variant ending such as [1 — a bar boundary.
                    ctx.reset_bar();
                }
                out.push('[');
                i += 1;
                continue;
            }
            _ => {}
        }
        if let Some(tok) = parse_note_at(rest) {
            if let Some(rendered) = render_note_12(&tok, delta, ctx) {
                out.push_str(&rendered);
                i += tok.len;
                continue;
            }
        }
        let ch_len = rest.chars().next().map_or(1, char::len_utf8);
        out.push_str(&rest[..ch_len]);
        i += ch_len;
    }
    out
}

fn render_note_12(tok: &NoteToken, delta: i32, ctx: &mut Ctx12) -> Option<String> {
    let explicit = match &tok.accidental {
        // An accidental with no exact half-step value is not a note here;
        // the scan degrades to character passthrough.
        Some(glyph) => Some(glyph.half_steps()?),
        None => None,
    };
    let letter = tok.letter();
    let abs = spell::absolute_steps(
        letter,
        tok.octave(),
        explicit,
        &ctx.read_acc,
        &mut ctx.read_bar,
    );
    let target = abs + delta * spell::STEPS_PER_SEMITONE;
    let preferred = ctx.prefer_input_letter.then_some(letter);
    let sp = spell::choose_spelling(target, &ctx.write_acc, &ctx.write_bar, ctx.prefer, preferred);
    if sp.printed {
        ctx.write_bar.set(sp.letter, sp.acc);
    }
    Some(spell::render_note(&sp, tok.duration))
}

fn rewrite_key_body_12(body: &str, delta: i32, opts: &Options, ctx: &mut Ctx12) -> String {
    let (desc, layout) = key::parse_key_field(body);
    ctx.prefer_input_letter = false;

    match desc.kind {
        KeyKind::Standard => {
            ctx.read_acc = desc.default_acc;
            let mode = desc.mode.unwrap_or(Mode7::Ionian);
            let tonic_pc = desc.tonic_pc().unwrap_or(0);
            match key::choose_renamed_standard_key(tonic_pc, mode, delta, desc.side) {
                Some(renamed) => {
                    debug!(from = body.trim(), to = renamed.tonic_name, "key renamed");
                    if ctx.tonal {
                        ctx.write_acc = renamed.default_acc;
                        ctx.prefer = side_prefer(renamed.side, opts.prefer);
                    } else {
                        ctx.write_acc = LetterSteps::default();
                        ctx.prefer = opts.prefer;
                    }
                    match layout.tonic_root {
                        Some(range) => apply_replacements(
                            body,
                            vec![(range, renamed.tonic_name.to_string())],
                        ),
                        None => body.to_string(),
                    }
                }
                None => {
                    ctx.write_acc = ctx.read_acc;
                    body.to_string()
                }
            }
        }
        KeyKind::None => {
            ctx.read_acc = desc.default_acc;
            ctx.prefer = opts.prefer;
            let mut new_overrides = LetterMemo::default();
            let mut reps = Vec::new();
            for tok in &layout.acc_tokens {
                let Some(steps) = tok.glyph.half_steps() else {
                    continue;
                };
                let Some(letter) = Letter::from_char(tok.letter_char) else {
                    continue;
                };
                let step = (spell::letter_steps(letter) + steps + delta * spell::STEPS_PER_SEMITONE)
                    .rem_euclid(spell::STEPS_PER_OCTAVE);
                let (new_letter, new_acc) = spell::pick_step_spelling(step, opts.prefer);
                new_overrides.set(new_letter, new_acc);
                reps.push((tok.range.clone(), render_key_acc(new_letter, new_acc, tok)));
            }
            ctx.write_acc = LetterSteps::default().overlaid(&new_overrides);
            apply_replacements(body, reps)
        }
        KeyKind::Nonstandard => {
            ctx.read_acc = desc.default_acc;
            if desc.tonic.is_none() || desc.overrides.is_empty() {
                // Verbatim key: semantics only, no rewriting.
                ctx.write_acc = ctx.read_acc;
                return body.to_string();
            }
            // "Passport" key: rename the tonic and re-target each override.
            let pc0 = desc.tonic_pc().unwrap_or(0);
            let pc1 = (pc0 + delta).rem_euclid(12);
            let tonic1 = key::choose_tonic_name_by_pc(pc1, delta, desc.tonic_side());
            let (t1_letter, t1_acc) = key::parse_tonic_name(tonic1);
            let base1 = match desc.mode {
                Some(m) => {
                    let pc_rel = (pc1 + m.relative_major_offset()).rem_euclid(12);
                    let preferred = if t1_acc > 0 { Side::Sharp } else { Side::Flat };
                    key::major_signature_for_pc(pc_rel, preferred)
                        .map(|sig| key::build_signature_acc(sig.signed_count()))
                        .unwrap_or_default()
                }
                None => LetterSteps::default(),
            };
            let seq = Letter::rotated_from(t1_letter);

            let mut reps = Vec::new();
            if let Some(range) = layout.tonic_root.clone() {
                reps.push((range, tonic1.to_string()));
            }
            let mut new_overrides = LetterMemo::default();
            for tok in &layout.acc_tokens {
                let Some(steps) = tok.glyph.half_steps() else {
                    continue;
                };
                let Some(letter) = Letter::from_char(tok.letter_char) else {
                    continue;
                };
                let target = (spell::letter_steps(letter) + steps + delta * spell::STEPS_PER_SEMITONE)
                    .rem_euclid(spell::STEPS_PER_OCTAVE);
                let (new_letter, new_acc) =
                    key::choose_override_letter(target, &seq, &base1, delta);
                new_overrides.set(new_letter, new_acc);
                reps.push((tok.range.clone(), render_key_acc(new_letter, new_acc, tok)));
            }
            ctx.write_acc = if ctx.tonal {
                base1.overlaid(&new_overrides)
            } else {
                LetterSteps::default().overlaid(&new_overrides)
            };
            ctx.prefer = opts.prefer;
            ctx.prefer_input_letter = true;
            apply_replacements(body, reps)
        }
    }
}

fn render_key_acc(letter: Letter, acc: i32, source: &KeyAccToken) -> String {
    let mut text = spell::accidental_glyph(acc).to_string();
    text.push(cased(letter, source.letter_char.is_ascii_lowercase()));
    text
}

// ---------------------------------------------------------------------------
// 53-EDO
// ---------------------------------------------------------------------------

struct Ctx53 {
    delta_commas: i32,
    read_micro: LetterMemo,
    write_micro: LetterMemo,
    read_bar: LetterMemo,
    write_bar: LetterMemo,
}

impl Ctx53 {
    fn new(delta: i32) -> Self {
        Ctx53 {
            delta_commas: comma::delta_commas(0, delta),
            read_micro: LetterMemo::default(),
            write_micro: LetterMemo::default(),
            read_bar: LetterMemo::default(),
            write_bar: LetterMemo::default(),
        }
    }

    fn reset_bar(&mut self) {
        self.read_bar.clear();
        self.write_bar.clear();
    }
}

fn transpose_53(text: &str, delta: i32, opts: &Options) -> Result<String> {
    debug!(delta, "transposing in 53-EDO");
    let mut ctx = Ctx53::new(delta);
    let mut out = String::with_capacity(text.len() + 32);
    let mut in_text_block = false;

    for (line, nl) in split_lines(text) {
        if is_pseudo_directive(line, "begintext") {
            in_text_block = true;
        }
        if in_text_block {
            if is_pseudo_directive(line, "endtext") {
                in_text_block = false;
            }
            out.push_str(line);
            out.push_str(nl);
            continue;
        }
        if is_field_line(line) {
            match split_key_line(line) {
                Some((prefix, body)) => {
                    out.push_str(prefix);
                    out.push_str(&rewrite_key_body_53(body, delta, &mut ctx));
                }
                None => out.push_str(line),
            }
            out.push_str(nl);
            continue;
        }
        out.push_str(&transpose_music_line_53(line, delta, opts, &mut ctx)?);
        out.push_str(nl);
    }
    Ok(out)
}

fn rewrite_key_body_53(body: &str, delta: i32, ctx: &mut Ctx53) -> String {
    let (desc, layout) = key::parse_key_field(body);
    let pc0 = desc.tonic_pc().unwrap_or(0);
    ctx.delta_commas = comma::delta_commas(pc0, delta);

    let mut read_micro = LetterMemo::default();
    for tok in &layout.acc_tokens {
        if let (Some(letter), Some(commas)) =
            (Letter::from_char(tok.letter_char), tok.glyph.commas())
        {
            read_micro.set(letter, commas);
        }
    }
    ctx.read_micro = read_micro;

    let Some(tonic_range) = layout.tonic_root.clone() else {
        // No tonic to rename (K:none and verbatim keys).
        ctx.write_micro = ctx.read_micro;
        return body.to_string();
    };

    let pc1 = (pc0 + delta).rem_euclid(12);
    let tonic1 = key::choose_tonic_name_by_pc(pc1, delta, desc.tonic_side());
    debug!(from = body.trim(), to = tonic1, "53-EDO key renamed");
    let mut reps = vec![(tonic_range, tonic1.to_string())];

    let mut write_micro = LetterMemo::default();
    for tok in &layout.acc_tokens {
        let Some(commas) = tok.glyph.commas() else {
            continue;
        };
        let Some(letter) = Letter::from_char(tok.letter_char) else {
            continue;
        };
        let id0 = (comma::letter_commas(letter) + commas).rem_euclid(comma::COMMAS_PER_OCTAVE);
        let id1 = (id0 + ctx.delta_commas).rem_euclid(comma::COMMAS_PER_OCTAVE);
        let sp = comma::choose_spelling(id1, delta.signum());
        write_micro.set(sp.letter, sp.micro);
        let mut text = comma::micro_prefix(sp.micro, true);
        text.push(cased(sp.letter, tok.letter_char.is_ascii_lowercase()));
        reps.push((tok.range.clone(), text));
    }
    ctx.write_micro = write_micro;
    apply_replacements(body, reps)
}

fn transpose_music_line_53(
    line: &str,
    delta: i32,
    opts: &Options,
    ctx: &mut Ctx53,
) -> Result<String> {
    let mut out = String::with_capacity(line.len() + 8);
    let mut i = 0;
    while i < line.len() {
        let rest = &line[i..];
        match rest.as_bytes()[0] {
            b'%' => {
                out.push_str(rest);
                break;
            }
            b'"' => {
                if let Some(close) = rest[1..].find('"') {
                    let inner = &rest[1..close + 1];
                    match opts.chords.then(|| chord::transpose_chord(inner, delta)).flatten() {
                        Some(rewritten) => {
                            out.push('"');
                            out.push_str(&rewritten);
                            out.push('"');
                        }
                        None => out.push_str(&rest[..close + 2]),
                    }
                    i += close + 2;
                } else {
                    out.push('"');
                    i += 1;
                }
                continue;
            }
            b'!' => {
                if let Some(close) = rest[1..].find('!') {
                    out.push_str(&rest[..close + 2]);
                    i += close + 2;
                } else {
                    out.push('!');
                    i += 1;
                }
                continue;
            }
            b'|' => {
                ctx.reset_bar();
                out.push('|');
                i += 1;
                continue;
            }
            b':' if rest.as_bytes().get(1) == Some(&b':') => {
                ctx.reset_bar();
                out.push_str("::");
                i += 2;
                continue;
            }
            b'[' => {
                if let Some(close) = inline_field_close(rest) {
                    if rest[1..].starts_with("K:") {
                        out.push_str("[K:");
                        out.push_str(&rewrite_key_body_53(&rest[3..close], delta, ctx));
                        out.push(']');
                    } else {
                        out.push_str(&rest[..close + 1]);
                    }
                    i += close + 1;
                    continue;
                }
                if rest.as_bytes().get(1).is_some_and(u8::is_ascii_digit) {
                    ctx.reset_bar();
                }
                out.push('[');
                i += 1;
                continue;
            }
            _ => {}
        }
        if let Some(tok) = parse_note_at(rest) {
            out.push_str(&render_note_53(&tok, delta, ctx)?);
            i += tok.len;
            continue;
        }
        let ch_len = rest.chars().next().map_or(1, char::len_utf8);
        out.push_str(&rest[..ch_len]);
        i += ch_len;
    }
    Ok(out)
}

fn render_note_53(tok: &NoteToken, delta: i32, ctx: &mut Ctx53) -> Result<String> {
    let explicit = match &tok.accidental {
        Some(glyph) => match glyph.commas() {
            Some(commas) => Some(commas),
            None => {
                return Err(Error::UnsupportedAccidental {
                    glyph: tok.acc_text.to_string(),
                    edo: 53,
                })
            }
        },
        None => None,
    };
    let letter = tok.letter();
    let micro = match explicit {
        Some(commas) => {
            ctx.read_bar.set(letter, commas);
            commas
        }
        None => ctx
            .read_bar
            .get(letter)
            .or(ctx.read_micro.get(letter))
            .unwrap_or(0),
    };

    let abs = tok.octave() * comma::COMMAS_PER_OCTAVE + comma::letter_commas(letter) + micro;
    let abs2 = abs + ctx.delta_commas;
    let id2 = abs2.rem_euclid(comma::COMMAS_PER_OCTAVE);

    // Candidate A keeps the input letter; candidate B is the best spelling
    // by the comma-pair convention.
    let mut candidates = vec![comma::Spelling53 {
        letter,
        micro: comma::normalize_commas(id2 - comma::letter_commas(letter)),
    }];
    let best = comma::choose_spelling(id2, delta.signum());
    if best.letter != letter {
        candidates.push(best);
    }

    let mut chosen: Option<(comma::Spelling53, bool, (i32, i32, i32, i32))> = None;
    for cand in candidates {
        let default = ctx
            .write_bar
            .get(cand.letter)
            .or(ctx.write_micro.get(cand.letter))
            .unwrap_or(0);
        let needs_token = explicit.is_some() || cand.micro != default;
        let side = if delta < 0 {
            i32::from(cand.micro >= 0)
        } else if delta > 0 {
            i32::from(cand.micro <= 0)
        } else {
            0
        };
        let score = (
            i32::from(needs_token),
            comma::pair_rank(cand.micro),
            side,
            cand.micro.abs(),
        );
        if chosen.as_ref().is_none_or(|(_, _, s)| score < *s) {
            chosen = Some((cand, needs_token, score));
        }
    }
    let (cand, needs_token, _) = chosen.expect("candidate list is never empty");
    if needs_token {
        ctx.write_bar.set(cand.letter, cand.micro);
    }

    // The chosen letter's comma offset may wrap the octave boundary, so
    // the octave comes from the letter, not from the raw pitch.
    let octave = (abs2 - (comma::letter_commas(cand.letter) + cand.micro))
        .div_euclid(comma::COMMAS_PER_OCTAVE);
    let prefix = if needs_token {
        comma::micro_prefix(cand.micro, explicit.is_some() || cand.micro == 0)
    } else {
        String::new()
    };
    let mut out = prefix;
    spell::push_letter_and_marks(&mut out, cand.letter, octave);
    out.push_str(tok.duration);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_preserves_terminators() {
        let parts = split_lines("a\nb\r\nc\rd");
        assert_eq!(
            parts,
            vec![("a", "\n"), ("b", "\r\n"), ("c", "\r"), ("d", "")]
        );
    }

    #[test]
    fn test_field_line_detection() {
        assert!(is_field_line("K:C"));
        assert!(is_field_line("  T:Title"));
        assert!(is_field_line("% comment"));
        assert!(is_field_line("w:lyr-ics"));
        assert!(!is_field_line("CDE|"));
        assert!(!is_field_line("|:CDE"));
    }

    #[test]
    fn test_split_key_line() {
        assert_eq!(split_key_line("K:G mix"), Some(("K:", "G mix")));
        assert_eq!(split_key_line("  K:C"), Some(("  K:", "C")));
        assert_eq!(split_key_line("T:Name"), None);
    }

    #[test]
    fn test_inline_field_close() {
        assert_eq!(inline_field_close("[K:D]CDE"), Some(4));
        assert_eq!(inline_field_close("[P:1st Hane]"), Some(11));
        assert_eq!(inline_field_close("[CEG]"), None);
        assert_eq!(inline_field_close("[1"), None);
    }

    #[test]
    fn test_pseudo_directive() {
        assert!(is_pseudo_directive("%%begintext", "begintext"));
        assert!(is_pseudo_directive("%% BeginText something", "begintext"));
        assert!(!is_pseudo_directive("%%begintextual", "begintext"));
        assert!(!is_pseudo_directive("% begintext", "begintext"));
    }

    #[test]
    fn test_apply_replacements() {
        let out = apply_replacements(
            "K:Emin fast",
            vec![(2..3, "Eb".to_string())],
        );
        assert_eq!(out, "K:Ebmin fast");
    }
}
