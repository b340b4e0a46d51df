use crate::lexer::LexError;
use crate::token::Location;

/// Suffix appended to the error that overflows the collector.
pub const TOO_MANY_ERRORS: &str = "(too many errors...)";

/// Diagnostic recorded while analysing a chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {}, column {}", loc.start_line, loc.start_column)]
pub struct ParseError {
    pub message: String,
    pub loc: Location,
    /// The chunk could not be read, as opposed to a syntax error.
    pub read_file_error: bool,
}

impl ParseError {
    #[must_use]
    pub fn syntax(message: impl Into<String>, loc: Location) -> Self {
        Self {
            message: message.into(),
            loc,
            read_file_error: false,
        }
    }

    #[must_use]
    pub fn read_file(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loc: Location::default(),
            read_file_error: true,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self::syntax(err.kind.to_string(), err.loc)
    }
}

/// Signal that stops the whole analysis.
///
/// Every parse function returns [`PResult`] and forwards this with `?`;
/// only the entry points turn it into a partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Abort {
    #[error("too many errors, stopped after {0}")]
    TooManyErrors(usize),
    #[error("internal parser invariant violated: {0}")]
    Invariant(String),
    #[error("chunk has too many syntax levels")]
    TooDeep,
}

pub type PResult<T> = Result<T, Abort>;

/// Bounded, ordered list of diagnostics.
#[derive(Debug, Clone)]
pub struct ErrorCollector {
    errors: Vec<ParseError>,
    max: usize,
}

impl ErrorCollector {
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self {
            errors: Vec::new(),
            max,
        }
    }

    /// Record an error. The one past the cap is stored with
    /// [`TOO_MANY_ERRORS`] appended and aborts the analysis.
    pub fn insert(&mut self, loc: Location, message: impl Into<String>) -> PResult<()> {
        self.push(ParseError::syntax(message, loc))
    }

    pub fn push(&mut self, mut err: ParseError) -> PResult<()> {
        if self.errors.len() < self.max {
            self.errors.push(err);
            return Ok(());
        }
        err.message.push_str(TOO_MANY_ERRORS);
        self.errors.push(err);
        Err(Abort::TooManyErrors(self.max))
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
