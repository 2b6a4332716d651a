//! Tokenizer for the SavedVariables literal-table grammar
//!
//! Never fails: bytes that match no rule are dropped, and problems surface
//! later in the parser as unexpected tokens.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Equals,
    String,
    Number,
    Bool,
    Nil,
    Ident,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Equals => "'='",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Bool => "boolean",
            TokenKind::Nil => "nil",
            TokenKind::Ident => "identifier",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A lexed token with its raw source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "string \"{}\"", self.value),
            TokenKind::Number | TokenKind::Bool | TokenKind::Ident => {
                write!(f, "{} `{}`", self.kind, self.value)
            }
            _ => self.kind.fmt(f),
        }
    }
}

/// Split `input` into tokens, always ending with [`TokenKind::Eof`].
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek_at(0) {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'-' if self.peek_at(1) == Some(b'-') => self.skip_comment(),
                b'{' => self.single(TokenKind::LBrace),
                b'}' => self.single(TokenKind::RBrace),
                b'[' => self.single(TokenKind::LBracket),
                b']' => self.single(TokenKind::RBracket),
                b',' => self.single(TokenKind::Comma),
                b'=' => self.single(TokenKind::Equals),
                b'"' => self.lex_string(),
                b'-' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
                c if c.is_ascii_digit() => self.lex_number(),
                c if c.is_ascii_alphabetic() => self.lex_ident(),
                _ => self.pos += 1,
            }
        }

        self.tokens.push(Token::eof());
        self.tokens
    }

    fn single(&mut self, kind: TokenKind) {
        let text = &self.src[self.pos..self.pos + 1];
        self.tokens.push(Token::new(kind, text));
        self.pos += 1;
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek_at(0) {
            if ch == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Escapes are skipped over, not decoded: `\"` stays in the value as two bytes.
    fn lex_string(&mut self) {
        self.pos += 1;
        let start = self.pos;

        while let Some(ch) = self.peek_at(0) {
            if ch == b'"' {
                break;
            }
            if ch == b'\\' {
                self.pos += 1;
            }
            self.pos += 1;
        }

        let end = self.pos.min(self.bytes.len());
        let value = String::from_utf8_lossy(&self.bytes[start..end]).into_owned();
        self.tokens.push(Token::new(TokenKind::String, value));
        self.pos = end + 1;
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        if self.peek_at(0) == Some(b'-') {
            self.pos += 1;
        }
        while self.peek_at(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.tokens
            .push(Token::new(TokenKind::Number, &self.src[start..self.pos]));
    }

    fn lex_ident(&mut self) {
        let start = self.pos;
        while self
            .peek_at(0)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }

        let word = &self.src[start..self.pos];
        let token = match word {
            "true" | "false" => Token::new(TokenKind::Bool, word),
            "nil" => Token::new(TokenKind::Nil, word),
            _ => Token::new(TokenKind::Ident, word),
        };
        self.tokens.push(token);
    }
}
