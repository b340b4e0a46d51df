//! Lua and Mooc lexer, parser and AST.
//!
//! Source text becomes a located syntax tree. Mooc, a brace-delimited
//! dialect selected by the `.mooc` chunk suffix, is desugared into the same
//! tree: `switch`, `guard`, `class` and `import` become plain Lua
//! statements. Syntax errors are collected rather than returned, so a
//! broken file still yields as much of its tree as could be recovered.
//!
//! # Quick start
//!
//! ## Parse a chunk
//!
//! ```
//! use luaparse::{begin_analyze, Stat};
//!
//! let analysis = begin_analyze(b"local x = 1\nprint(x)\n", "main.lua");
//! assert!(!analysis.has_errors());
//! assert!(matches!(analysis.block.stats[0], Stat::LocalDecl(_)));
//! ```
//!
//! ## Collect errors
//!
//! ```
//! use luaparse::begin_analyze;
//!
//! let analysis = begin_analyze(b"x = = 1", "main.lua");
//! assert!(analysis.has_errors());
//! println!("{}", analysis.errors[0]);
//! ```
//!
//! ## Desugared Mooc
//!
//! ```
//! use luaparse::{begin_analyze, format};
//!
//! let analysis = begin_analyze(b"x += 2\n", "main.mooc");
//! assert_eq!(format(&analysis.block), "x = (x + (2))\n");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod config;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod token;

use std::path::Path;

use tracing::warn;

pub use ast::{
    Analysis, AssignStat, Attribute, BinaryOp, Block, ClassDecl, ClassKind, DoKind, Exp, ExpKind,
    ForIn, ForNumeric, FunctionCall, FunctionDef, IfStat, ImportDecl, LocalDecl, Param, Stat,
    SwitchDecl, UnaryOp,
};
pub use config::ParserConfig;
pub use formatter::{format, format_exp};
pub use lexer::{CommentInfo, CommentLine, CommentMap, LexError, LexErrorKind, Lexer};
pub use parser::{Abort, ParseError, Parser, TOO_MANY_ERRORS};
pub use token::{Dialect, Location, Token, TokenKind};

/// First error of a strict entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Parse a chunk. The dialect follows from `chunk_name`.
#[must_use]
pub fn begin_analyze(source: &[u8], chunk_name: &str) -> Analysis {
    Parser::new(source, chunk_name).begin_analyze()
}

/// Parse a single Lua expression, `None` if parsing had to stop.
#[must_use]
pub fn begin_analyze_exp(source: &[u8]) -> Option<Exp> {
    Parser::with_config(source, "", ParserConfig::default()).begin_analyze_exp()
}

/// Read and parse a file, using its path as the chunk name.
///
/// A read failure is reported as a single error with
/// [`ParseError::read_file_error`] set.
#[must_use]
pub fn analyze_file(path: impl AsRef<Path>) -> Analysis {
    let path = path.as_ref();
    let name = path.display().to_string();
    match std::fs::read(path) {
        Ok(source) => begin_analyze(&source, &name),
        Err(err) => {
            warn!(chunk = %name, %err, "cannot read chunk");
            Analysis {
                block: Block::default(),
                comments: CommentMap::new(),
                errors: vec![ParseError::read_file(format!("{name}: {err}"))],
            }
        }
    }
}

/// Tokenize a whole chunk, stopping at the first lexical error.
pub fn tokenize(source: &[u8], dialect: Dialect) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::new(source, dialect);
    lexer.skip_first_line_comment();
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if let Some(err) = lexer.take_errors().into_iter().next() {
            return Err(err.into());
        }
        if token.kind == TokenKind::Eof {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

/// Parse a chunk, failing on the first recorded error.
pub fn parse_str(source: &str, chunk_name: &str) -> Result<Block, Error> {
    let analysis = begin_analyze(source.as_bytes(), chunk_name);
    match analysis.errors.into_iter().next() {
        Some(err) => Err(err.into()),
        None => Ok(analysis.block),
    }
}
