mod lexer;
mod token;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind, KEYWORDS};
