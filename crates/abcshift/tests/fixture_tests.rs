//! Fixture-based round-trip tests.
//!
//! Each .abc file in tests/fixtures/ must survive a zero-step call
//! byte-for-byte, an up-then-down semitone pair, and an octave pair.

use std::fs;
use std::path::Path;

use abcshift::{transpose, Options};

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.abc", name));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {}", name, e))
}

fn check_fixture(name: &str) {
    let text = load_fixture(name);
    let opts = Options::default();

    assert_eq!(
        transpose(&text, 0, &opts).unwrap(),
        text,
        "fixture {}: zero delta must be the identity",
        name
    );

    let up = transpose(&text, 1, &opts).unwrap();
    assert_ne!(up, text, "fixture {}: one step up must change pitches", name);
    assert_eq!(
        transpose(&up, -1, &opts).unwrap(),
        text,
        "fixture {}: up then down must round-trip",
        name
    );

    let octave = transpose(&text, 12, &opts).unwrap();
    assert_eq!(
        transpose(&octave, -12, &opts).unwrap(),
        text,
        "fixture {}: octave round-trip",
        name
    );
}

#[test]
fn test_fixture_simple_reel() {
    check_fixture("simple_reel");
}

#[test]
fn test_fixture_ornaments() {
    check_fixture("ornaments");
}

#[test]
fn test_fixture_lyrics_survive() {
    let text = load_fixture("simple_reel");
    let up = transpose(&text, 1, &Options::default()).unwrap();
    assert!(up.contains("w:la la la\n"));
    assert!(up.contains("T:The Test Reel\n"));
}

#[test]
fn test_fixture_ornament_spans_survive() {
    let text = load_fixture("ornaments");
    let up = transpose(&text, 1, &Options::default()).unwrap();
    assert!(up.contains("!trill!"));
    assert!(up.contains("\"annotation\""));
    assert!(up.contains("[P:fine]"));
    assert!(up.contains("% trailing comment"));
}
