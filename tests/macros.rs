use rstest::rstest;
use vi_engine::types::Mode;
use vi_engine::{EngineError, parse_keys};

mod support;
use support::{Harness, p};

#[test]
fn record_and_play() {
    let mut h = Harness::new("a\nb\nc");
    h.keys("qa");
    assert_eq!(h.engine.status(), "recording");
    h.keys("A!");
    assert_eq!(h.engine.status(), "-- INSERT -- recording");
    h.keys("<Esc>jq");
    assert_eq!(h.engine.status(), "Macro Recorded");
    assert_eq!(h.text(), "a!\nb\nc");
    assert_eq!(
        h.engine.macros().get('a').map(|m| m.to_notation()),
        Some("A!<Esc>j".to_string())
    );

    h.keys("@a");
    assert_eq!(h.text(), "a!\nb!\nc");
    assert_eq!(h.caret(), p(2, 0));
    h.keys("@@");
    assert_eq!(h.text(), "a!\nb!\nc!");
}

#[test]
fn playback_matches_live_typing() {
    let keys = "wdwx$p0~";
    let mut live = Harness::new("one two three four");
    live.keys(keys);

    let mut played = Harness::new("one two three four");
    played
        .engine
        .macros_mut()
        .define('m', parse_keys(keys).unwrap())
        .unwrap();
    played.keys("@m");
    assert_eq!(played.text(), live.text());
    assert_eq!(played.caret(), live.caret());
}

#[test]
fn self_invoking_macro_is_stopped() {
    let mut h = Harness::new("abcdef");
    h.engine
        .macros_mut()
        .define('a', parse_keys("x@a").unwrap())
        .unwrap();
    h.keys("@a");
    assert_eq!(h.text(), "bcdef");
    assert_eq!(
        h.engine.status(),
        EngineError::RecursiveMacro('a').to_string()
    );
    assert!(!h.engine.macros().is_playing());
}

#[test]
fn mutually_recursive_macros_are_stopped() {
    let mut h = Harness::new("abcdef");
    let macros = h.engine.macros_mut();
    macros.define('a', parse_keys("x@b").unwrap()).unwrap();
    macros.define('b', parse_keys("x@a").unwrap()).unwrap();
    h.keys("@a");
    assert_eq!(h.text(), "cdef");
}

#[rstest]
#[case("<C-c>")]
#[case("<C-[>")]
fn abort_chord_discards_recording(#[case] abort: &str) {
    let mut h = Harness::new("abc");
    h.keys("qax").keys(abort);
    assert!(!h.engine.macros().is_recording());
    assert!(h.engine.macros().get('a').is_none());
    assert_eq!(h.engine.status(), "");
    assert_eq!(h.text(), "bc");
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn bad_macro_names() {
    let mut h = Harness::new("abc");
    h.keys("@z");
    assert_eq!(h.engine.status(), "Invalid Macro Name 'z'");
    h.keys("@@");
    assert_eq!(h.engine.status(), "Invalid Macro Name '@'");
    h.keys("q!");
    assert_eq!(h.engine.status(), "Invalid Macro Name");
    assert!(!h.engine.macros().is_recording());
}

#[test]
fn recorded_macro_survives_re_recording_another() {
    let mut h = Harness::new("abcd");
    h.keys("qaxq").keys("qblq");
    assert_eq!(h.engine.macros().len(), 2);
    h.keys("@a");
    assert_eq!(h.text(), "bd");
}
