//! Error types for pageweave-parser

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("expected closing tag </{expected}>, found </{found}>")]
    MismatchedClosingTag { expected: String, found: String },

    #[error("invalid tag name \"{found}\"")]
    InvalidTagName { found: String },

    #[error("unterminated attribute value starting at offset {offset}")]
    UnterminatedAttribute { offset: usize },

    #[error("unterminated expression island starting at offset {offset}")]
    UnterminatedExpr { offset: usize },
}
