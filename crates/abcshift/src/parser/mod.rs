//! Parsing layer: EDO directive detection, key fields, note tokens.

pub mod key;
pub mod note;

/// Scan the whole document for `%%MIDI temperamentequal N` directives
/// (case-insensitive). The last positive value wins; the default is 12.
///
/// Detection runs over the full text before any rewriting, so a directive
/// below the first note still counts.
pub fn detect_edo(text: &str) -> u32 {
    let mut last = None;
    for line in text.split(['\n', '\r']) {
        if let Some(n) = parse_temperament_line(line) {
            last = Some(n);
        }
    }
    last.unwrap_or(12)
}

fn parse_temperament_line(line: &str) -> Option<u32> {
    let rest = strip_prefix_ignore_case(line, "%%MIDI")?;
    let rest = strip_leading_ws(rest)?;
    let rest = strip_prefix_ignore_case(rest, "temperamentequal")?;
    let rest = strip_leading_ws(rest)?;
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    if !rest[digits_len..].trim().is_empty() {
        return None;
    }
    let n: u32 = rest[..digits_len].parse().ok()?;
    (n > 0).then_some(n)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let n = prefix.len();
    if s.len() >= n && s.as_bytes()[..n].eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&s[n..])
    } else {
        None
    }
}

fn strip_leading_ws(s: &str) -> Option<&str> {
    let n = s.bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
    if n == 0 {
        return None;
    }
    Some(&s[n..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_twelve() {
        assert_eq!(detect_edo("X:1\nK:C\nCDE\n"), 12);
    }

    #[test]
    fn test_directive_detected() {
        assert_eq!(detect_edo("%%MIDI temperamentequal 53\nK:C\n"), 53);
    }

    #[test]
    fn test_last_directive_wins() {
        let text = "%%MIDI temperamentequal 19\nK:C\nCDE\n%%MIDI temperamentequal 53\n";
        assert_eq!(detect_edo(text), 53);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_edo("%%midi TEMPERAMENTEQUAL 53\n"), 53);
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        assert_eq!(detect_edo("%%MIDI temperamentequal 53 cents\n"), 12);
        assert_eq!(detect_edo("%%MIDI temperamentequal 53  \n"), 53);
    }

    #[test]
    fn test_rejects_nonpositive() {
        assert_eq!(detect_edo("%%MIDI temperamentequal 0\n"), 12);
    }
}
