use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    Str,
    Keyword,
    Symbol,
    Eof,
}

/// The reserved word set. `mod` and `use` are deliberately absent: they are
/// recognized positionally by the parser so they stay usable as identifiers.
pub const KEYWORDS: [&str; 18] = [
    "fn", "let", "mut", "return", "enum", "struct", "true", "false", "if", "else", "while", "for",
    "in", "loop", "match", "break", "continue", "import",
];

/// For strings, `text` holds the unescaped value rather than the raw lexeme.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new<T: Into<String>>(kind: TokenKind, text: T, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    pub fn eof(line: usize, column: usize) -> Self {
        Token::new(TokenKind::Eof, "", line, column)
    }

    pub fn position(&self) -> String {
        format!("{}:{}", self.line, self.column)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Token({:?}, {:?}, {})", self.kind, self.text, self.position())
    }
}
