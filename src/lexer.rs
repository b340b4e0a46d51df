use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::token::{Dialect, Location, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Quoted string cut by a newline or the end of input.
    UnterminatedString,
    /// `[[ ... ]]` string without its closing bracket.
    UnfinishedLongString,
    /// `--[[ ... ]]` comment without its closing bracket.
    UnfinishedLongComment,
    /// Backslash sequence Lua does not define.
    InvalidEscape(String),
    /// `\ddd` escape above 255.
    EscapeTooLarge,
    /// Byte that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unfinished string"),
            Self::UnfinishedLongString => write!(f, "unfinished long string"),
            Self::UnfinishedLongComment => write!(f, "unfinished long comment"),
            Self::InvalidEscape(seq) => {
                write!(f, "invalid escape sequence '\\{seq}'")
            }
            Self::EscapeTooLarge => write!(f, "decimal escape too large"),
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected symbol near '{ch}'")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", loc.start_line, loc.start_column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub loc: Location,
}

/// One line of a comment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// A run of adjacent comments, keyed in [`CommentMap`] by its last line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInfo {
    pub lines: Vec<CommentLine>,
    pub loc: Location,
    /// No code precedes the comment on its first line.
    pub head: bool,
}

/// Free-floating comments by ending line.
pub type CommentMap = BTreeMap<usize, CommentInfo>;

/// Answer of a [`Lexer::lookahead_kinds`] classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Keep looking at the next token.
    Continue,
    /// Stop, the pattern matched.
    Accept,
    /// Stop, the pattern cannot match.
    Reject,
}

/// Lazy token producer with a lookahead buffer.
///
/// Lexical errors never stop scanning: they are queued and handed to the
/// parser through [`Lexer::take_errors`].
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    dialect: Dialect,
    lookahead: VecDeque<Token>,
    now: Location,
    pre: Location,
    last_code_line: usize,
    comments: CommentMap,
    last_comment: Option<(usize, bool)>,
    pending: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a [u8], dialect: Dialect) -> Self {
        let start = if input.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Self {
            input,
            pos: start,
            line: 1,
            col: 1,
            dialect,
            lookahead: VecDeque::new(),
            now: Location::default(),
            pre: Location::default(),
            last_code_line: 0,
            comments: CommentMap::new(),
            last_comment: None,
            pending: Vec::new(),
        }
    }

    /// Skip a leading `#` line (shebang). Only meaningful before the
    /// first token is read.
    pub fn skip_first_line_comment(&mut self) {
        if !self.lookahead.is_empty() || self.peek() != Some(b'#') {
            return;
        }
        while let Some(ch) = self.peek() {
            if ch == b'\n' || ch == b'\r' {
                break;
            }
            self.bump();
        }
    }

    /// Kind of the next token, without consuming it.
    pub fn lookahead_kind(&mut self) -> TokenKind {
        self.peek_nth(0).kind
    }

    /// The token `n` positions ahead (0 is the lookahead token).
    pub fn peek_nth(&mut self, n: usize) -> &Token {
        while self.lookahead.len() <= n {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        &self.lookahead[n]
    }

    /// Location of the lookahead token.
    pub fn head_loc(&mut self) -> Location {
        self.peek_nth(0).loc
    }

    /// Location of the last consumed token.
    #[must_use]
    pub const fn now_loc(&self) -> Location {
        self.now
    }

    /// Location of the token consumed before the last one.
    #[must_use]
    pub const fn pre_loc(&self) -> Location {
        self.pre
    }

    /// Whether the lookahead is `first` and the token after it `second`.
    pub fn lookahead_with(&mut self, first: TokenKind, second: TokenKind) -> bool {
        self.lookahead_kind() == first && self.peek_nth(1).kind == second
    }

    /// Multi-token disambiguation starting at a lookahead of kind `start`.
    ///
    /// Tokens after the lookahead are fed to `classify` until it accepts
    /// or rejects. End of input rejects.
    pub fn lookahead_kinds(
        &mut self,
        start: TokenKind,
        classify: impl Fn(TokenKind) -> Scan,
    ) -> bool {
        if self.lookahead_kind() != start {
            return false;
        }
        let mut n = 1;
        loop {
            let kind = self.peek_nth(n).kind;
            if kind == TokenKind::Eof {
                return false;
            }
            match classify(kind) {
                Scan::Continue => n += 1,
                Scan::Accept => return true,
                Scan::Reject => return false,
            }
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        let token = self
            .lookahead
            .pop_front()
            .unwrap_or_else(|| self.scan_token());
        self.pre = self.now;
        self.now = token.loc;
        token
    }

    /// Drain queued lexical errors.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.pending)
    }

    /// Drain the queued errors that start before `line`/`column`, leaving
    /// those raised for tokens still in the lookahead buffer.
    pub fn take_errors_before(&mut self, line: usize, column: usize) -> Vec<LexError> {
        let split = self
            .pending
            .partition_point(|err| (err.loc.start_line, err.loc.start_column) < (line, column));
        self.pending.drain(..split).collect()
    }

    #[must_use]
    pub const fn comments(&self) -> &CommentMap {
        &self.comments
    }

    #[must_use]
    pub fn into_comments(self) -> CommentMap {
        self.comments
    }

    // -- scanning --

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        let Some(ch) = self.peek() else {
            return;
        };
        self.pos += 1;
        match ch {
            b'\n' => self.newline(),
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
                self.newline();
            }
            _ => self.col += 1,
        }
    }

    const fn newline(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    const fn here(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    const fn loc_from(&self, start: (usize, usize)) -> Location {
        Location::new(start.0, start.1, self.line, self.col)
    }

    fn error(&mut self, kind: LexErrorKind, loc: Location) {
        self.pending.push(LexError { kind, loc });
    }

    fn slice(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.here();

        let Some(ch) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                text: String::new(),
                loc: self.loc_from(start),
            };
        };

        let token = match ch {
            b'"' | b'\'' => self.read_short_string(ch),
            b'[' if matches!(self.peek_at(1), Some(b'[' | b'=')) => {
                match self.long_bracket_level() {
                    Some(level) => self.read_long_string(level),
                    None => self.punct(TokenKind::LBracket, 1),
                }
            }
            b'0'..=b'9' => self.read_numeral(),
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.read_numeral(),
            c if is_ident_start(c) => self.read_name(),
            _ => self.read_punct(),
        };

        // Non-ASCII bytes are identifier characters, so an illegal byte is ASCII.
        let token = token.unwrap_or_else(|| {
            self.bump();
            let ch = char::from(ch);
            let loc = self.loc_from(start);
            self.error(LexErrorKind::UnexpectedCharacter(ch), loc);
            Token {
                kind: TokenKind::Illegal,
                text: ch.to_string(),
                loc,
            }
        });

        self.last_code_line = token.loc.end_line;
        token
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C => self.bump(),
                b'-' if self.peek_at(1) == Some(b'-') => self.read_comment(),
                _ => break,
            }
        }
    }

    fn read_comment(&mut self) {
        let start = self.here();
        self.bump();
        self.bump(); // --

        if self.peek() == Some(b'[') {
            if let Some(level) = self.long_bracket_level() {
                let content = self.read_long_bracket(level, LexErrorKind::UnfinishedLongComment);
                let loc = self.loc_from(start);
                self.record_comment(content, loc, false);
                return;
            }
        }

        let text_start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == b'\n' || ch == b'\r' {
                break;
            }
            self.bump();
        }
        let text = self.slice(text_start);
        let loc = self.loc_from(start);
        self.record_comment(text, loc, true);
    }

    fn record_comment(&mut self, text: String, loc: Location, single_line: bool) {
        let head = self.last_code_line != loc.start_line;
        let line = CommentLine {
            text,
            line: loc.start_line,
            column: loc.start_column,
        };

        // Adjacent whole-line comments form one run.
        if single_line && head {
            if let Some((last_line, true)) = self.last_comment {
                if last_line + 1 == loc.start_line {
                    if let Some(mut info) = self.comments.remove(&last_line) {
                        info.lines.push(line);
                        info.loc = Location::merge(&info.loc, &loc);
                        self.comments.insert(loc.end_line, info);
                        self.last_comment = Some((loc.end_line, true));
                        return;
                    }
                }
            }
        }

        self.comments.insert(
            loc.end_line,
            CommentInfo {
                lines: vec![line],
                loc,
                head,
            },
        );
        self.last_comment = Some((loc.end_line, single_line && head));
    }

    /// Level of a long bracket opening at the cursor (`[==[` is 2), if any.
    fn long_bracket_level(&self) -> Option<usize> {
        let mut level = 0;
        while self.peek_at(1 + level) == Some(b'=') {
            level += 1;
        }
        (self.peek_at(1 + level) == Some(b'[')).then_some(level)
    }

    /// Read `[=*[ ... ]=*]` and return its contents.
    fn read_long_bracket(&mut self, level: usize, unfinished: LexErrorKind) -> String {
        let start = self.here();
        for _ in 0..level + 2 {
            self.bump();
        }
        // A newline right after the opening bracket is skipped.
        if matches!(self.peek(), Some(b'\n' | b'\r')) {
            self.bump();
        }

        let content_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    let text = self.slice(content_start);
                    let loc = self.loc_from(start);
                    self.error(unfinished, loc);
                    return text;
                }
                Some(b']') if self.closes_long_bracket(level) => {
                    let text = self.slice(content_start);
                    for _ in 0..level + 2 {
                        self.bump();
                    }
                    return text;
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn closes_long_bracket(&self, level: usize) -> bool {
        (1..=level).all(|i| self.peek_at(i) == Some(b'=')) && self.peek_at(level + 1) == Some(b']')
    }

    fn read_long_string(&mut self, level: usize) -> Option<Token> {
        let start = self.here();
        let text = self.read_long_bracket(level, LexErrorKind::UnfinishedLongString);
        Some(Token {
            kind: TokenKind::String,
            text,
            loc: self.loc_from(start),
        })
    }

    fn read_short_string(&mut self, quote: u8) -> Option<Token> {
        let start = self.here();
        self.bump(); // opening quote

        let mut value: Vec<u8> = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n' | b'\r') => {
                    let loc = self.loc_from(start);
                    self.error(LexErrorKind::UnterminatedString, loc);
                    break;
                }
                Some(b'\\') => self.read_escape(&mut value),
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }

        Some(Token {
            kind: TokenKind::String,
            text: String::from_utf8_lossy(&value).into_owned(),
            loc: self.loc_from(start),
        })
    }

    fn read_escape(&mut self, value: &mut Vec<u8>) {
        let escape_start = self.here();
        self.bump(); // backslash
        let Some(ch) = self.peek() else {
            return;
        };

        let simple = match ch {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'r' => Some(b'\r'),
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b'f' => Some(0x0C),
            b'v' => Some(0x0B),
            b'\\' => Some(b'\\'),
            b'"' => Some(b'"'),
            b'\'' => Some(b'\''),
            _ => None,
        };
        if let Some(byte) = simple {
            value.push(byte);
            self.bump();
            return;
        }

        match ch {
            b'\n' | b'\r' => {
                value.push(b'\n');
                self.bump();
            }
            b'z' => {
                self.bump();
                while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                    self.bump();
                }
            }
            b'x' => {
                self.bump();
                let digits = self.take_while_max(2, |c| c.is_ascii_hexdigit());
                match u8::from_str_radix(&digits, 16) {
                    Ok(byte) if digits.len() == 2 => value.push(byte),
                    _ => {
                        let loc = self.loc_from(escape_start);
                        self.error(LexErrorKind::InvalidEscape(format!("x{digits}")), loc);
                    }
                }
            }
            b'0'..=b'9' => {
                let digits = self.take_while_max(3, |c| c.is_ascii_digit());
                match digits.parse::<u8>() {
                    Ok(byte) => value.push(byte),
                    Err(_) => {
                        let loc = self.loc_from(escape_start);
                        self.error(LexErrorKind::EscapeTooLarge, loc);
                    }
                }
            }
            b'u' if self.peek_at(1) == Some(b'{') => {
                self.bump();
                self.bump();
                let digits = self.take_while_max(8, |c| c.is_ascii_hexdigit());
                let decoded = u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .filter(|_| self.peek() == Some(b'}'));
                if let Some(c) = decoded {
                    self.bump();
                    let mut buf = [0; 4];
                    value.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                } else {
                    let loc = self.loc_from(escape_start);
                    self.error(LexErrorKind::InvalidEscape(format!("u{{{digits}")), loc);
                }
            }
            other => {
                self.bump();
                let loc = self.loc_from(escape_start);
                self.error(
                    LexErrorKind::InvalidEscape(char::from(other).to_string()),
                    loc,
                );
                value.push(other);
            }
        }
    }

    fn take_while_max(&mut self, max: usize, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.pos - start < max && self.peek().is_some_and(&pred) {
            self.bump();
        }
        self.slice(start)
    }

    fn read_numeral(&mut self) -> Option<Token> {
        let start = self.here();
        let start_pos = self.pos;

        let hex = self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X'));
        let expo: &[u8] = if hex { b"Pp" } else { b"Ee" };
        if hex {
            self.bump();
            self.bump();
        }

        while let Some(ch) = self.peek() {
            if expo.contains(&ch) {
                self.bump();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.bump();
                }
            } else if ch.is_ascii_hexdigit() || ch == b'.' {
                self.bump();
            } else {
                break;
            }
        }
        // Suffixes such as LL/ULL stay in the raw text.
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.bump();
        }

        Some(Token {
            kind: TokenKind::Number,
            text: self.slice(start_pos),
            loc: self.loc_from(start),
        })
    }

    fn read_name(&mut self) -> Option<Token> {
        let start = self.here();
        let start_pos = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let text = self.slice(start_pos);
        let kind = self
            .dialect
            .keyword(&text)
            .unwrap_or(TokenKind::Identifier);
        Some(Token {
            kind,
            text,
            loc: self.loc_from(start),
        })
    }

    fn punct(&mut self, kind: TokenKind, len: usize) -> Option<Token> {
        let start = self.here();
        let start_pos = self.pos;
        for _ in 0..len {
            self.bump();
        }
        Some(Token {
            kind,
            text: self.slice(start_pos),
            loc: self.loc_from(start),
        })
    }

    fn read_punct(&mut self) -> Option<Token> {
        let next = self.peek_at(1);
        let (kind, len) = match (self.peek()?, next) {
            (b'.', Some(b'.')) if self.peek_at(2) == Some(b'.') => (TokenKind::Vararg, 3),
            (b'.', Some(b'.')) => (TokenKind::Concat, 2),
            (b'.', _) => (TokenKind::Dot, 1),
            (b':', Some(b':')) => (TokenKind::DoubleColon, 2),
            (b':', _) => (TokenKind::Colon, 1),
            (b';', _) => (TokenKind::Semi, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b'[', _) => (TokenKind::LBracket, 1),
            (b']', _) => (TokenKind::RBracket, 1),
            (b'{', _) => (TokenKind::LBrace, 1),
            (b'}', _) => (TokenKind::RBrace, 1),
            (b'=', Some(b'=')) => (TokenKind::Equal, 2),
            (b'=', _) => (TokenKind::Assign, 1),
            (b'~', Some(b'=')) => (TokenKind::NotEqual, 2),
            (b'~', _) => (TokenKind::Tilde, 1),
            (b'<', Some(b'=')) => (TokenKind::LessEqual, 2),
            (b'<', Some(b'<')) => (TokenKind::ShiftLeft, 2),
            (b'<', _) => (TokenKind::Less, 1),
            (b'>', Some(b'=')) => (TokenKind::GreaterEqual, 2),
            (b'>', Some(b'>')) => (TokenKind::ShiftRight, 2),
            (b'>', _) => (TokenKind::Greater, 1),
            (b'/', Some(b'/')) => (TokenKind::DoubleSlash, 2),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'^', _) => (TokenKind::Caret, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'&', _) => (TokenKind::Ampersand, 1),
            (b'|', _) => (TokenKind::Pipe, 1),
            (b'#', _) => (TokenKind::Hash, 1),
            _ => return None,
        };
        self.punct(kind, len)
    }
}

const fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80
}

const fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
