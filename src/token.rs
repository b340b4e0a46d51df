use std::fmt;

/// Half-open source range.
///
/// Lines and columns are 1-based; `end_column` is one past the last
/// character. A default (all zero) location marks a synthetic node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Location {
    #[must_use]
    pub const fn new(
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Range from the start of `begin` to the end of `end`.
    #[must_use]
    pub const fn merge(begin: &Self, end: &Self) -> Self {
        Self {
            start_line: begin.start_line,
            start_column: begin.start_column,
            end_line: end.end_line,
            end_column: end.end_column,
        }
    }

    /// Range from the start of `begin` up to the start of `next`.
    #[must_use]
    pub const fn until(begin: &Self, next: &Self) -> Self {
        Self {
            start_line: begin.start_line,
            start_column: begin.start_column,
            end_line: next.start_line,
            end_column: next.start_column,
        }
    }

    /// True for locations attached to synthetic nodes.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.start_line == 0 && self.end_line == 0
    }

    /// Whether `other` lies inside this range.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        (self.start_line, self.start_column) <= (other.start_line, other.start_column)
            && (other.end_line, other.end_column) <= (self.end_line, self.end_column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Grammar variant selected for a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Baseline Lua 5.4 grammar.
    #[default]
    Lua,
    /// Brace-delimited superset with classes, imports, switch and guard.
    Mooc,
}

impl Dialect {
    /// File suffix that selects the Mooc grammar.
    pub const MOOC_SUFFIX: &'static str = ".mooc";

    /// Pick the dialect from a chunk (file) name.
    #[must_use]
    pub fn from_chunk_name(name: &str) -> Self {
        if name.ends_with(Self::MOOC_SUFFIX) {
            Self::Mooc
        } else {
            Self::Lua
        }
    }

    /// Resolve a word to its keyword kind in this dialect.
    #[must_use]
    pub fn keyword(self, word: &str) -> Option<TokenKind> {
        let kind = match word {
            "and" => TokenKind::And,
            "break" => TokenKind::Break,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "elseif" => TokenKind::Elseif,
            "end" => TokenKind::End,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "in" => TokenKind::In,
            "local" => TokenKind::Local,
            "nil" => TokenKind::Nil,
            "not" => TokenKind::Not,
            "or" => TokenKind::Or,
            "repeat" => TokenKind::Repeat,
            "return" => TokenKind::Return,
            "then" => TokenKind::Then,
            "true" => TokenKind::True,
            "until" => TokenKind::Until,
            "while" => TokenKind::While,
            _ if self == Self::Mooc => return Self::mooc_keyword(word),
            _ => return None,
        };
        Some(kind)
    }

    fn mooc_keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "case" => TokenKind::Case,
            "class" => TokenKind::Class,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "export" => TokenKind::Export,
            "extension" => TokenKind::Extension,
            "fn" => TokenKind::Fn,
            "from" => TokenKind::From,
            "guard" => TokenKind::Guard,
            "import" => TokenKind::Import,
            "public" => TokenKind::Public,
            "static" => TokenKind::Static,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lua => write!(f, "lua"),
            Self::Mooc => write!(f, "mooc"),
        }
    }
}

/// Token kinds produced by the lexer.
///
/// `Minus` is both subtraction and negation, `Tilde` both bitwise xor and
/// bitwise not; the parser decides from position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Byte sequence that cannot start any token.
    Illegal,
    Eof,
    /// `...`
    Vararg,
    /// `;`
    Semi,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    /// `=`
    Assign,
    /// `-`
    Minus,
    /// `~`
    Tilde,
    Plus,
    Star,
    Slash,
    /// `//`
    DoubleSlash,
    /// `^`
    Caret,
    Percent,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `>>`
    ShiftRight,
    /// `<<`
    ShiftLeft,
    /// `..`
    Concat,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `==`
    Equal,
    /// `~=`
    NotEqual,
    /// `#`
    Hash,
    And,
    Or,
    Not,
    Break,
    Case,
    Class,
    Continue,
    Defer,
    Default,
    Do,
    Else,
    Elseif,
    End,
    Export,
    Extension,
    False,
    Fn,
    For,
    From,
    Function,
    Goto,
    Guard,
    If,
    Import,
    In,
    Local,
    Nil,
    Public,
    Repeat,
    Return,
    Static,
    Struct,
    Switch,
    Then,
    True,
    Until,
    While,
    Identifier,
    /// Numeral, raw text kept for the parser to convert.
    Number,
    /// String literal, decoded contents in the token text.
    String,
}

impl TokenKind {
    /// Source spelling used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Illegal => "ILLEGAL",
            Self::Eof => "<eof>",
            Self::Vararg => "...",
            Self::Semi => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::DoubleColon => "::",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Assign => "=",
            Self::Minus => "-",
            Self::Tilde => "~",
            Self::Plus => "+",
            Self::Star => "*",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Caret => "^",
            Self::Percent => "%",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::ShiftRight => ">>",
            Self::ShiftLeft => "<<",
            Self::Concat => "..",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "~=",
            Self::Hash => "#",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Break => "break",
            Self::Case => "case",
            Self::Class => "class",
            Self::Continue => "continue",
            Self::Defer => "defer",
            Self::Default => "default",
            Self::Do => "do",
            Self::Else => "else",
            Self::Elseif => "elseif",
            Self::End => "end",
            Self::Export => "export",
            Self::Extension => "extension",
            Self::False => "false",
            Self::Fn => "fn",
            Self::For => "for",
            Self::From => "from",
            Self::Function => "function",
            Self::Goto => "goto",
            Self::Guard => "guard",
            Self::If => "if",
            Self::Import => "import",
            Self::In => "in",
            Self::Local => "local",
            Self::Nil => "nil",
            Self::Public => "public",
            Self::Repeat => "repeat",
            Self::Return => "return",
            Self::Static => "static",
            Self::Struct => "struct",
            Self::Switch => "switch",
            Self::Then => "then",
            Self::True => "true",
            Self::Until => "until",
            Self::While => "while",
            Self::Identifier => "identifier",
            Self::Number => "number literal",
            Self::String => "string literal",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: Location,
}

impl Token {
    /// Text shown after "near" in diagnostics.
    #[must_use]
    pub fn near(&self) -> &str {
        match self.kind {
            TokenKind::Eof => "<eof>",
            _ if self.text.is_empty() => self.kind.as_str(),
            _ => &self.text,
        }
    }
}
