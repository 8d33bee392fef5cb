// src/tests/literal_tests.rs

//! tests for `literal.rs`

use ::test_case::test_case;

use crate::data::literal::{parse_literal, repr_bytes, repr_str, Literal, LITERAL_NESTING_MAX};

use std::io::ErrorKind;

#[test]
fn test_parse_literal_state_line() {
    let literal = parse_literal("{'file': b'/var/log/messages', 'offset': 7767698, 'inode': 32455445}").unwrap();
    assert_eq!(literal.dict_get("file"), Some(&Literal::Bytes(b"/var/log/messages".to_vec())));
    assert_eq!(literal.dict_get("offset").and_then(|l| l.as_int()), Some(7767698));
    assert_eq!(literal.dict_get("inode").and_then(|l| l.as_int()), Some(32455445));
    assert_eq!(literal.dict_get("missing"), None);
}

#[test_case("None", Literal::None)]
#[test_case("True", Literal::Bool(true))]
#[test_case(" False ", Literal::Bool(false); "whitespace")]
#[test_case("-17", Literal::Int(-17))]
#[test_case("1_000", Literal::Int(1000); "underscore")]
#[test_case("(1)", Literal::Int(1); "parenthesized")]
#[test_case("(1,)", Literal::Tuple(vec![Literal::Int(1)]); "tuple1")]
#[test_case("()", Literal::Tuple(vec![]); "tuple0")]
#[test_case("[1, 'a']", Literal::List(vec![Literal::Int(1), Literal::Str("a".to_string())]); "list")]
#[test_case(r#"'it\'s'"#, Literal::Str("it's".to_string()); "escaped quote")]
#[test_case(r#""tab\there""#, Literal::Str("tab\there".to_string()); "tab")]
#[test_case(r#"u'é'"#, Literal::Str("é".to_string()); "unicode prefix")]
#[test_case(r#"r'\d+'"#, Literal::Str("\\d+".to_string()); "raw")]
#[test_case(r#"b'\xff\x00a'"#, Literal::Bytes(vec![0xff, 0x00, b'a']); "bytes hex")]
#[test_case(r#"b'\101'"#, Literal::Bytes(vec![b'A']); "bytes octal")]
#[test_case("{}", Literal::Dict(vec![]); "empty dict")]
fn test_parse_literal(src: &str, expected: Literal) {
    assert_eq!(parse_literal(src).unwrap(), expected);
}

#[test_case(""; "empty")]
#[test_case("os.system('rm')"; "call")]
#[test_case("{'a': 1"; "unclosed dict")]
#[test_case("1 2"; "trailing")]
#[test_case("'unterminated"; "unterminated")]
#[test_case("x'abc'"; "bad prefix")]
#[test_case("b'é'"; "non-ascii bytes")]
#[test_case("1 + 1"; "operator")]
fn test_parse_literal_error(src: &str) {
    assert!(parse_literal(src).is_err(), "parsed {:?}", src);
}

fn nested(open: &str, close: &str, depth: usize) -> String {
    format!("{}1{}", open.repeat(depth), close.repeat(depth))
}

#[test_case("[", "]")]
#[test_case("(", ",)"; "tuple")]
#[test_case("{0: ", "}"; "dict")]
fn test_parse_literal_nesting(
    open: &str,
    close: &str,
) {
    assert!(parse_literal(&nested(open, close, LITERAL_NESTING_MAX)).is_ok());
    let err = parse_literal(&nested(open, close, LITERAL_NESTING_MAX + 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_parse_literal_deep_nesting_is_error() {
    // unterminated, far deeper than the stack would allow
    let src = "[".repeat(100_000);
    assert_eq!(parse_literal(&src).unwrap_err().kind(), ErrorKind::InvalidData);
}

#[test_case(b"/var/log/x", "b'/var/log/x'")]
#[test_case(b"a\xffb", "b'a\\xffb'"; "hex")]
#[test_case(b"it's", "b\"it's\""; "quote switch")]
#[test_case(b"a\\b\n", "b'a\\\\b\\n'"; "escapes")]
fn test_repr_bytes(data: &[u8], expected: &str) {
    assert_eq!(repr_bytes(data), expected);
}

#[test_case("file", "'file'")]
#[test_case("it's", "\"it's\""; "quote switch")]
#[test_case("both'\"", "'both\\'\"'"; "both quotes")]
fn test_repr_str(text: &str, expected: &str) {
    assert_eq!(repr_str(text), expected);
}

#[test]
fn test_literal_display_parses_back() {
    let literal = Literal::Dict(vec![
        (Literal::Str("file".to_string()), Literal::Bytes(b"/tmp/\xe4it's".to_vec())),
        (Literal::Str("offset".to_string()), Literal::Int(12)),
        (Literal::Str("inode".to_string()), Literal::Int(-1)),
    ]);
    let text = literal.to_string();
    assert_eq!(text, "{'file': b\"/tmp/\\xe4it's\", 'offset': 12, 'inode': -1}");
    assert_eq!(parse_literal(&text).unwrap(), literal);
}
