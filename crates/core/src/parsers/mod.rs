mod go;

pub use go::{unquote, GoParser};

use crate::models::{ImportHeader, Language};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to initialize parser: {0}")]
    InitError(String),
    #[error("Failed to parse source code: {0}")]
    ParseError(String),
    #[error("syntax error at line {line}")]
    Syntax { line: usize },
    #[error("cannot decode import path {literal} at line {line}")]
    Decode { literal: String, line: usize },
}

/// Trait for language-specific import header parsers
pub trait ImportParser {
    /// Parse source code and extract the import header
    fn parse(&mut self, source: &str) -> Result<ImportHeader, ParserError>;
}

/// Create a parser for the given language
pub fn create_parser(language: &Language) -> Result<Box<dyn ImportParser>, ParserError> {
    match language {
        Language::Go => Ok(Box::new(GoParser::new()?)),
    }
}
