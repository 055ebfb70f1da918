use super::*;

#[test]
fn test_quote_literal_plain() {
    assert_eq!(quote_literal("widgets"), "'widgets'");
}

#[test]
fn test_quote_literal_escapes_quotes() {
    assert_eq!(quote_literal("o'brien"), "'o''brien'");
}

#[test]
fn test_column_list() {
    let cols = vec!["root_id".to_string(), "version".to_string()];
    assert_eq!(column_list(&cols), "root_id, version");
}
