use super::token::{Token, TokenKind, KEYWORDS};
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::source::Source;
use log::trace;

/// Raised when the lexer hits a character it cannot start a token with. The
/// positioned diagnostic has already been reported by the time this surfaces;
/// the driver only needs to drop the file.
#[derive(Debug)]
pub struct LexError {
    pub message: String,
}

pub struct Lexer<'a> {
    source: &'a Source,
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

const SYMBOL_STARTS: &str = "(){}[],;=:+-*/&<>.!|'";

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Source) -> Self {
        Lexer {
            source,
            chars: source.contents.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn lex(mut self, diagnostics: &mut Diagnostics) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            let c = self.peek();

            if c == '\n' {
                self.index += 1;
                self.line += 1;
                self.column = 1;
                continue;
            }
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            if c == '/' && self.peek_next() == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
                continue;
            }
            if is_ident_start(c) {
                tokens.push(self.identifier());
                continue;
            }
            if c.is_ascii_digit() {
                tokens.push(self.number());
                continue;
            }
            if c == '"' {
                tokens.push(self.string());
                continue;
            }
            if SYMBOL_STARTS.contains(c) {
                tokens.push(self.symbol());
                continue;
            }

            let message = format!("Unexpected character '{}' at {}:{}", c, self.line, self.column);
            diagnostics.report(Diagnostic::new(&message, &self.source.path));
            return Err(LexError { message });
        }

        tokens.push(Token::eof(self.line, self.column));
        trace!(target: "lexer", "Lexed {} tokens from {}", tokens.len(), self.source.path.display());
        Ok(tokens)
    }

    fn identifier(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        text.push(self.advance());
        while let Some(c) = self.current() {
            if is_ident_part(c) {
                text.push(self.advance());
            } else {
                break;
            }
        }
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, text, line, column)
    }

    fn number(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(self.advance());
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, text, line, column)
    }

    /// String literals recognize `\n`, `\"`, and `\\`; any other backslash
    /// sequence passes through literally.
    fn string(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote
        let mut value = String::new();
        while let Some(c) = self.current() {
            if c == '"' {
                self.advance();
                break;
            }
            if c == '\\' {
                match self.peek_next() {
                    Some('n') => {
                        value.push('\n');
                        self.advance();
                        self.advance();
                        continue;
                    }
                    Some(escaped @ '"') | Some(escaped @ '\\') => {
                        value.push(escaped);
                        self.advance();
                        self.advance();
                        continue;
                    }
                    _ => {}
                }
            }
            value.push(self.advance());
        }
        Token::new(TokenKind::Str, value, line, column)
    }

    /// Maximal munch: two- and three-character operators win over their
    /// single-character prefixes.
    fn symbol(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let c = self.peek();
        let next = self.peek_next();

        let multi: Option<&str> = match (c, next) {
            ('=', Some('>')) => Some("=>"),
            ('.', Some('.')) => {
                if self.peek_at(2) == Some('=') {
                    Some("..=")
                } else {
                    Some("..")
                }
            }
            ('=', Some('=')) => Some("=="),
            ('!', Some('=')) => Some("!="),
            ('<', Some('=')) => Some("<="),
            ('>', Some('=')) => Some(">="),
            ('+', Some('=')) => Some("+="),
            ('-', Some('=')) => Some("-="),
            ('*', Some('=')) => Some("*="),
            ('/', Some('=')) => Some("/="),
            ('-', Some('>')) => Some("->"),
            ('&', Some('&')) => Some("&&"),
            ('|', Some('|')) => Some("||"),
            _ => None,
        };

        if let Some(symbol) = multi {
            for _ in 0..symbol.chars().count() {
                self.advance();
            }
            return Token::new(TokenKind::Symbol, symbol, line, column);
        }

        let single = self.advance();
        Token::new(TokenKind::Symbol, single.to_string(), line, column)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek(&self) -> char {
        self.chars[self.index]
    }

    fn peek_next(&self) -> Option<char> {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.index];
        self.index += 1;
        self.column += 1;
        c
    }

    fn is_at_end(&self) -> bool {
        self.index >= self.chars.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
