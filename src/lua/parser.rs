//! Recursive-descent parser over the token stream
//!
//! Only the subset SavedVariables files use is accepted: tables keyed by
//! `["string"]` with string, integer, boolean, nil or table values.

use std::collections::HashMap;

use tracing::debug;

use super::lexer::{Token, TokenKind, tokenize};
use super::value::Value;
use crate::constants::savedvars::MAX_TABLE_DEPTH;
use crate::error::{ProfileError, Result};

/// Parse the table assigned to `variable` in `input`.
///
/// Falls back to the first `{` in the file when the assignment is missing.
pub fn parse_assignment(input: &str, variable: &str) -> Result<Value> {
    let mut parser = TableParser::new(tokenize(input));
    parser.seek_assignment(variable);
    parser.parse_table().map(Value::Table)
}

/// Cursor over one token stream; one instance per parse.
pub struct TableParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl TableParser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::eof());
        }
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ProfileError {
        ProfileError::MalformedTable {
            position: self.pos,
            message: message.into(),
        }
    }

    fn unexpected(&self, wanted: &str) -> ProfileError {
        self.error(format!("expected {wanted}, found {}", self.peek()))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek().kind != kind {
            return Err(self.unexpected(&kind.to_string()));
        }
        Ok(self.advance())
    }

    /// Position the cursor on the `{` that opens `variable = { ... }`.
    pub fn seek_assignment(&mut self, variable: &str) {
        let assignment = self.tokens.windows(2).position(|pair| {
            pair[0].kind == TokenKind::Ident
                && pair[0].value == variable
                && pair[1].kind == TokenKind::Equals
        });

        let from = match assignment {
            Some(index) => index + 2,
            None => {
                debug!(variable, "assignment not found, parsing from first table");
                0
            }
        };

        let eof = self.tokens.len() - 1;
        self.pos = self.tokens[from..]
            .iter()
            .position(|t| t.kind == TokenKind::LBrace)
            .map_or(eof, |offset| from + offset);
    }

    pub fn parse_table(&mut self) -> Result<HashMap<String, Value>> {
        self.parse_table_at(0)
    }

    fn parse_table_at(&mut self, depth: usize) -> Result<HashMap<String, Value>> {
        if depth >= MAX_TABLE_DEPTH {
            return Err(self.error(format!("tables nested deeper than {MAX_TABLE_DEPTH}")));
        }

        self.expect(TokenKind::LBrace)?;
        let mut table = HashMap::new();

        loop {
            match self.peek().kind {
                TokenKind::RBrace | TokenKind::Eof => break,
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.expect(TokenKind::String)?.value;
                    self.expect(TokenKind::RBracket)?;
                    self.expect(TokenKind::Equals)?;
                    let value = self.parse_value(depth)?;
                    table.insert(key, value);
                }
                _ => return Err(self.unexpected("'[' or '}'")),
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(table)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value> {
        match self.peek().kind {
            TokenKind::LBrace => self.parse_table_at(depth + 1).map(Value::Table),
            TokenKind::String => Ok(Value::String(self.advance().value)),
            TokenKind::Number => {
                let raw = self.peek().value.clone();
                let number = raw
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("number `{raw}` does not fit in 64 bits")))?;
                self.advance();
                Ok(Value::Integer(number))
            }
            TokenKind::Bool => Ok(Value::Bool(self.advance().value == "true")),
            TokenKind::Nil => {
                self.advance();
                Ok(Value::Nil)
            }
            _ => Err(self.unexpected("a value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = "AddonProfilesDB";

    fn table(entries: Vec<(&str, Value)>) -> Value {
        Value::Table(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Serialize a value back to SavedVariables text, keys in arbitrary order.
    fn render(value: &Value, out: &mut String) {
        match value {
            Value::String(s) => out.push_str(&format!("\"{s}\"")),
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Bool(b) => out.push_str(&b.to_string()),
            Value::Nil => out.push_str("nil"),
            Value::Table(t) => {
                out.push_str("{\n");
                for (key, value) in t {
                    out.push_str(&format!("[\"{key}\"] = "));
                    render(value, out);
                    out.push_str(",\n");
                }
                out.push('}');
            }
        }
    }

    fn malformed(input: &str) -> String {
        match parse_assignment(input, DB) {
            Err(ProfileError::MalformedTable { message, .. }) => message,
            other => panic!("expected MalformedTable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_nested_literals() {
        let input = r#"
AddonProfilesDB = {
	["global"] = {
		["activeProfile"] = "Default",
		["count"] = -3,
		["enabled"] = true,
		["gone"] = nil,
		["nested"] = {
			["deeper"] = { ["x"] = false },
		},
	},
}
"#;
        let value = parse_assignment(input, DB).unwrap();
        let expected = table(vec![(
            "global",
            table(vec![
                ("activeProfile", Value::String("Default".into())),
                ("count", Value::Integer(-3)),
                ("enabled", Value::Bool(true)),
                ("gone", Value::Nil),
                (
                    "nested",
                    table(vec![("deeper", table(vec![("x", Value::Bool(false))]))]),
                ),
            ]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_render_then_parse_is_equivalent() {
        let samples = vec![
            table(vec![]),
            table(vec![("a", Value::Integer(1)), ("b", Value::String("two".into()))]),
            table(vec![
                ("profiles", table(vec![
                    ("Default", table(vec![
                        ("addons", table(vec![
                            ("Ace3", Value::Bool(true)),
                            ("WeakAuras", Value::Bool(false)),
                        ])),
                        ("created", Value::Integer(1698765432)),
                    ])),
                    ("Empty", table(vec![])),
                ])),
                ("activeProfile", Value::String("Default".into())),
                ("nothing", Value::Nil),
            ]),
        ];

        for sample in samples {
            let mut text = format!("{DB} = ");
            render(&sample, &mut text);
            assert_eq!(parse_assignment(&text, DB).unwrap(), sample, "input:\n{text}");
        }
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let value = parse_assignment(r#"X = { ["k"] = 1, ["k"] = 2 }"#, "X").unwrap();
        assert_eq!(value, table(vec![("k", Value::Integer(2))]));
    }

    #[test]
    fn test_trailing_and_repeated_commas() {
        let value = parse_assignment(r#"X = { ,, ["a"] = 1,, }"#, "X").unwrap();
        assert_eq!(value, table(vec![("a", Value::Integer(1))]));
    }

    #[test]
    fn test_finds_named_assignment_among_others() {
        let input = r#"
OtherDB = { ["wrong"] = true }
AddonProfilesDB = { ["right"] = true }
"#;
        let value = parse_assignment(input, DB).unwrap();
        assert_eq!(value, table(vec![("right", Value::Bool(true))]));
    }

    #[test]
    fn test_missing_assignment_uses_first_table() {
        let value = parse_assignment(r#"-- header
SomethingElse = { ["a"] = "b" }"#, DB)
        .unwrap();
        assert_eq!(value, table(vec![("a", Value::String("b".into()))]));
    }

    #[test]
    fn test_no_table_at_all() {
        let message = malformed("AddonProfilesDB = nil");
        assert!(message.contains("end of input"), "{message}");
        malformed("");
    }

    #[test]
    fn test_unquoted_key_is_malformed() {
        let message = malformed("AddonProfilesDB = { version = 2 }");
        assert!(message.contains("identifier `version`"), "{message}");
    }

    #[test]
    fn test_numeric_key_is_malformed() {
        let message = malformed("AddonProfilesDB = { [1] = true }");
        assert!(message.contains("expected string"), "{message}");
    }

    #[test]
    fn test_list_entries_are_malformed() {
        malformed(r#"AddonProfilesDB = { "a", "b" }"#);
    }

    #[test]
    fn test_missing_value_is_malformed() {
        let message = malformed(r#"AddonProfilesDB = { ["a"] = }"#);
        assert!(message.contains("expected a value"), "{message}");
    }

    #[test]
    fn test_unclosed_table_is_malformed() {
        malformed(r#"AddonProfilesDB = { ["a"] = { ["b"] = 1 }"#);
    }

    #[test]
    fn test_out_of_range_number_is_malformed() {
        let message = malformed(r#"AddonProfilesDB = { ["a"] = 99999999999999999999 }"#);
        assert!(message.contains("64 bits"), "{message}");
    }

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_TABLE_DEPTH + 1;
        let mut input = String::from("AddonProfilesDB = ");
        for _ in 0..depth {
            input.push_str("{ [\"k\"] = ");
        }
        input.push('1');
        for _ in 0..depth {
            input.push_str(" }");
        }
        let message = malformed(&input);
        assert!(message.contains("nested deeper"), "{message}");
    }

    #[test]
    fn test_error_reports_token_position() {
        match parse_assignment("X = { [\"a\"] = 1, oops }", "X") {
            Err(ProfileError::MalformedTable { position, .. }) => assert_eq!(position, 9),
            other => panic!("expected MalformedTable, got {other:?}"),
        }
    }
}
