use vi_engine::types::Mode;
use vi_engine::{Engine, Register, parse_keys};

mod support;
use support::mock_buffer::MockBuffer;
use support::mock_clipboard::MockClipboard;
use support::{Harness, p};

#[test]
fn line_paste_below_and_above() {
    let mut h = Harness::new("a\nb");
    h.keys("yyp");
    assert_eq!(h.text(), "a\na\nb");
    assert_eq!(h.caret(), p(1, 0));

    let mut h = Harness::new("a\nb");
    h.keys("jyyP");
    assert_eq!(h.text(), "a\nb\nb");
    assert_eq!(h.caret(), p(1, 0));
}

#[test]
fn line_paste_after_last_line() {
    let mut h = Harness::new("a\nb");
    h.keys("yyjp");
    assert_eq!(h.text(), "a\nb\na");
    assert_eq!(h.caret(), p(2, 0));
}

#[test]
fn character_paste() {
    let mut h = Harness::new("abc");
    h.keys("ylp");
    assert_eq!(h.text(), "aabc");
    assert_eq!(h.caret(), p(0, 1));

    let mut h = Harness::new("abc");
    h.keys("ylP");
    assert_eq!(h.text(), "aabc");
    assert_eq!(h.caret(), p(0, 0));

    let mut h = Harness::new("abc");
    h.keys("yl3p");
    assert_eq!(h.text(), "aaaabc");
    assert_eq!(h.caret(), p(0, 3));
}

#[test]
fn empty_register_pastes_nothing() {
    let mut h = Harness::new("abc");
    h.keys("p");
    assert_eq!(h.text(), "abc");
    assert!(!h.engine.is_paste_pending());
}

#[test]
fn in_memory_register_never_leaves_a_paste_pending() {
    let mut engine = Engine::new();
    let mut buf = MockBuffer::new("abc");
    let mut reg = Register::new();
    engine.attach(&mut buf);

    engine.handle_keys(&mut buf, &mut reg, parse_keys("p").unwrap());
    assert!(!engine.is_paste_pending());
    assert_eq!(buf.contents(), "abc");

    engine.handle_keys(&mut buf, &mut reg, parse_keys("ylp").unwrap());
    assert!(!engine.is_paste_pending());
    assert_eq!(buf.contents(), "aabc");
    assert_eq!(reg.contents(), Some("a"));
}

#[test]
fn deferred_register_completes_later() {
    let mut h = Harness::new("abc");
    h.clipboard = MockClipboard::deferred();
    h.keys("p");
    assert!(h.engine.is_paste_pending());
    assert_eq!(h.text(), "abc");

    h.engine
        .complete_paste(&mut h.buf, &mut h.clipboard, Some("xy".to_string()));
    assert_eq!(h.text(), "axybc");
    assert!(!h.engine.is_paste_pending());

    h.keys("P");
    h.engine.complete_paste(&mut h.buf, &mut h.clipboard, None);
    assert!(!h.engine.is_paste_pending());
    assert_eq!(h.text(), "axybc");
}

#[test]
fn paste_over_selection_swaps_register() {
    let mut h = Harness::new("foo bar");
    h.clipboard = MockClipboard::with("XYZ");
    h.keys("vlp");
    assert_eq!(h.text(), "XYZo bar");
    assert_eq!(h.register(), Some("fo"));
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn line_paste_over_line_selection() {
    let mut h = Harness::new("a\nb\nc");
    h.clipboard = MockClipboard::with("x\n");
    h.keys("jVp");
    assert_eq!(h.text(), "a\nx\nc");
    assert_eq!(h.register(), Some("b\n"));
}

#[test]
fn delete_then_paste_moves_text() {
    let mut h = Harness::new("one\ntwo\nthree");
    h.keys("ddp");
    assert_eq!(h.text(), "two\none\nthree");
}
