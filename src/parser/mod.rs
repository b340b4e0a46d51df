//! Recursive-descent parser for Lua and Mooc chunks.
//!
//! A [`Parser`] owns its lexer, scope stack and error collector. Recoverable
//! problems are recorded and parsing carries on with a placeholder node;
//! only an [`Abort`] (error cap, nesting limit, broken desugaring) unwinds,
//! through `?`, back to [`Parser::begin_analyze`].

mod block;
mod error;
mod expr;
mod mooc;
pub mod scope;
mod stat;

pub use error::{Abort, ErrorCollector, PResult, ParseError, TOO_MANY_ERRORS};

use tracing::{debug, warn};

use crate::ast::{Analysis, Block, Exp};
use crate::config::ParserConfig;
use crate::lexer::Lexer;
use crate::token::{Dialect, Location, Token, TokenKind};

use scope::ScopeStack;

/// Parser for a single chunk.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    scopes: ScopeStack,
    errors: ErrorCollector,
    config: ParserConfig,
    chunk_name: String,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Parser with the defaults for the dialect implied by `chunk_name`.
    #[must_use]
    pub fn new(source: &'a [u8], chunk_name: &str) -> Self {
        Self::with_config(source, chunk_name, ParserConfig::for_chunk(chunk_name))
    }

    #[must_use]
    pub fn with_config(source: &'a [u8], chunk_name: &str, config: ParserConfig) -> Self {
        Self {
            lexer: Lexer::new(source, config.dialect),
            scopes: ScopeStack::new(chunk_name),
            errors: ErrorCollector::new(config.max_errors),
            config,
            chunk_name: chunk_name.to_string(),
            depth: 0,
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        self.errors.errors()
    }

    /// Parse the whole chunk.
    ///
    /// Never fails: on abort the block is empty and the errors gathered up
    /// to that point are returned.
    pub fn begin_analyze(&mut self) -> Analysis {
        debug!(chunk = %self.chunk_name, dialect = %self.config.dialect, "analyzing chunk");
        self.lexer.skip_first_line_comment();

        let block = match self.parse_chunk() {
            Ok(block) => block,
            Err(abort) => {
                warn!(chunk = %self.chunk_name, %abort, "analysis aborted");
                Block::default()
            }
        };

        debug!(
            chunk = %self.chunk_name,
            errors = self.errors.len(),
            statements = block.stats.len(),
            "analysis finished"
        );
        Analysis {
            block,
            comments: self.lexer.comments().clone(),
            errors: self.errors.errors().to_vec(),
        }
    }

    /// Parse one standalone expression; `None` on abort.
    pub fn begin_analyze_exp(&mut self) -> Option<Exp> {
        match self.parse_exp() {
            Ok(exp) => Some(exp),
            Err(abort) => {
                warn!(chunk = %self.chunk_name, %abort, "expression analysis aborted");
                None
            }
        }
    }

    fn parse_chunk(&mut self) -> PResult<Block> {
        let block = self.parse_block()?;
        self.next_of_kind(TokenKind::Eof)?;
        Ok(block)
    }

    // -- token helpers --

    fn peek(&mut self) -> TokenKind {
        self.lexer.lookahead_kind()
    }

    const fn is_mooc(&self) -> bool {
        matches!(self.config.dialect, Dialect::Mooc)
    }

    const fn now_loc(&self) -> Location {
        self.lexer.now_loc()
    }

    /// Move lexical errors that start before `line`/`column` into the
    /// collector. Errors of tokens still in the lookahead stay queued.
    fn sync_lex_errors(&mut self, line: usize, column: usize) -> PResult<()> {
        for err in self.lexer.take_errors_before(line, column) {
            self.errors.push(err.into())?;
        }
        Ok(())
    }

    fn next(&mut self) -> PResult<Token> {
        let token = self.lexer.next_token();
        if token.kind == TokenKind::Eof {
            self.sync_lex_errors(usize::MAX, usize::MAX)?;
        } else {
            self.sync_lex_errors(token.loc.end_line, token.loc.end_column)?;
        }
        Ok(token)
    }

    /// Consume a token, recording an error if it is not `expected`.
    fn next_of_kind(&mut self, expected: TokenKind) -> PResult<Token> {
        let token = self.next()?;
        if token.kind != expected {
            let message = format!("'{expected}' expected near '{}'", token.near());
            self.error(token.loc, message)?;
        }
        Ok(token)
    }

    fn next_identifier(&mut self) -> PResult<Token> {
        let token = self.next()?;
        if token.kind != TokenKind::Identifier {
            let message = format!("<name> expected near '{}'", token.near());
            self.error(token.loc, message)?;
        }
        Ok(token)
    }

    /// Consume the lookahead if it is `kind`.
    fn accept(&mut self, kind: TokenKind) -> PResult<Option<Token>> {
        if self.peek() == kind {
            self.next().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Record a syntax error after any lexical error starting at or before it.
    fn error(&mut self, loc: Location, message: impl Into<String>) -> PResult<()> {
        self.sync_lex_errors(loc.start_line, loc.start_column + 1)?;
        self.errors.insert(loc, message)
    }

    /// Record a broken internal invariant and stop.
    fn invariant(&mut self, loc: Location, message: &str) -> PResult<()> {
        self.error(loc, message)?;
        Err(Abort::Invariant(message.to_string()))
    }

    /// Track recursion depth. Every successful call pairs with [`Self::leave`].
    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > self.config.max_nesting {
            let loc = self.lexer.head_loc();
            self.error(loc, "chunk has too many syntax levels")?;
            return Err(Abort::TooDeep);
        }
        Ok(())
    }

    const fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.enter()?;
        let result = parse(self);
        self.leave();
        result
    }
}
