use proptest::prelude::*;
use rstest::rstest;
use vi_engine::{KeyCode, KeyNotationError, KeyStroke, Modifiers, parse_keys, to_notation};

#[test]
fn mixed_sequence_round_trips() {
    let text = "<C-m>av2f<Space>34<Esc><M-Space><S-C-M-Down>";
    let keys = parse_keys(text).unwrap();
    assert_eq!(keys.len(), 11);
    assert_eq!(to_notation(&keys), text);

    assert_eq!(keys[0], KeyStroke::char('m').with_mods(Modifiers::CTRL));
    assert_eq!(keys[5], KeyStroke::char(' '));
    assert_eq!(
        keys[10],
        KeyStroke::key(KeyCode::Down).with_mods(Modifiers::all())
    );
}

#[rstest]
#[case("<lt>", KeyStroke::char('<'))]
#[case("<CR>", KeyStroke::key(KeyCode::Enter))]
#[case("<Enter>", KeyStroke::key(KeyCode::Enter))]
#[case("<BS>", KeyStroke::key(KeyCode::Backspace))]
#[case("<F5>", KeyStroke::key(KeyCode::F(5)))]
#[case("<C-BS>", KeyStroke::key(KeyCode::Backspace).with_mods(Modifiers::CTRL))]
#[case("<S-Tab>", KeyStroke::key(KeyCode::Tab).with_mods(Modifiers::SHIFT))]
fn named_keys(#[case] text: &str, #[case] expected: KeyStroke) {
    assert_eq!(parse_keys(text).unwrap(), vec![expected]);
}

#[rstest]
#[case("<C-S-x>", "<S-C-x>")]
#[case("<M-C-a>", "<C-M-a>")]
#[case("<CR>", "<Enter>")]
#[case(" x", "<Space>x")]
#[case("<q>", "q")]
fn other_spellings_render_canonically(#[case] text: &str, #[case] canonical: &str) {
    let keys = parse_keys(text).unwrap();
    assert_eq!(to_notation(&keys), canonical);
    assert_eq!(parse_keys(canonical).unwrap(), keys);
}

#[rstest]
#[case("<Esc")]
#[case("<>")]
#[case("<Nope>")]
fn malformed(#[case] text: &str) {
    assert!(parse_keys(text).is_err());
}

#[test]
fn unknown_name_is_reported() {
    assert_eq!(
        parse_keys("a<Bogus>"),
        Err(KeyNotationError::UnknownKey("Bogus".to_string()))
    );
}

fn keystroke() -> impl Strategy<Value = KeyStroke> {
    let code = prop_oneof![
        proptest::char::range('!', '~').prop_map(KeyCode::Char),
        Just(KeyCode::Char(' ')),
        Just(KeyCode::Esc),
        Just(KeyCode::Enter),
        Just(KeyCode::Backspace),
        Just(KeyCode::Tab),
        Just(KeyCode::Delete),
        Just(KeyCode::Left),
        Just(KeyCode::PageDown),
        (1u8..=12).prop_map(KeyCode::F),
    ];
    (code, 0u8..8).prop_map(|(code, bits)| {
        KeyStroke::key(code).with_mods(Modifiers::from_bits_truncate(bits))
    })
}

proptest! {
    #[test]
    fn notation_round_trips(keys in prop::collection::vec(keystroke(), 0..20)) {
        let text = to_notation(&keys);
        prop_assert_eq!(parse_keys(&text).unwrap(), keys);
    }
}
