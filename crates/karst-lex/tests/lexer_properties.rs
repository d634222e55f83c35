//! Property Tests for the Lexer

use std::io;

use karst_lex::{tokenize, Lexer, Token};
use proptest::prelude::*;

proptest! {
    #[test]
    fn any_i64_lexes_back_to_itself(n in any::<i64>()) {
        let tokens = tokenize(&n.to_string()).unwrap();
        prop_assert_eq!(tokens, vec![Token::Int(n)]);
    }

    #[test]
    fn simple_floats_lex_back_to_themselves(a in -10_000i32..10_000, b in 0u32..10_000) {
        let text = format!("{a}.{b}");
        let expected: f64 = text.parse().unwrap();
        let tokens = tokenize(&text).unwrap();
        prop_assert_eq!(tokens, vec![Token::Float(expected)]);
    }

    #[test]
    fn symbol_runs_lex_as_one_symbol(name in "[a-z*<=>?!][a-z0-9*<=>?!._-]{0,20}") {
        let tokens = tokenize(&name).unwrap();
        prop_assert_eq!(tokens, vec![Token::Symbol(name)]);
    }

    #[test]
    fn atmosphere_does_not_change_tokens(
        items in proptest::collection::vec(-1000i64..1000, 1..20),
    ) {
        let bare = items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let spaced = items
            .iter()
            .map(|i| format!("  {i}\t; noise\n"))
            .collect::<String>();
        prop_assert_eq!(tokenize(&bare).unwrap(), tokenize(&spaced).unwrap());
    }

    #[test]
    fn stream_and_text_agree_on_generated_lists(
        items in proptest::collection::vec(-1000i64..1000, 0..30),
    ) {
        let source = format!(
            "({})",
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
        );
        let text_tokens = tokenize(&source).unwrap();
        let reader = Box::new(io::Cursor::new(source));
        let stream_tokens: Vec<Token> = Lexer::from_reader(reader, 16)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(text_tokens, stream_tokens);
    }
}
