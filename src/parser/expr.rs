use crate::ast::{BinaryOp, Exp, ExpKind, FunctionCall, FunctionDef, Param, UnaryOp};
use crate::lexer::Scan;
use crate::token::{Location, TokenKind};

use super::scope::ScopeKind;
use super::{PResult, Parser};

/// Operand limit for prefix operators: only `^` binds tighter.
const UNARY_PRIORITY: u8 = 10;

/// Classifier telling `{ a, b in ... }` from a table constructor.
const fn scan_anonymous_function(kind: TokenKind) -> Scan {
    match kind {
        TokenKind::Identifier | TokenKind::Vararg | TokenKind::Comma => Scan::Continue,
        TokenKind::In => Scan::Accept,
        _ => Scan::Reject,
    }
}

/// How a function literal opens and closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FunctionStyle {
    /// `(params) block end`
    Lua,
    /// `(params) { block }`
    Braced,
    /// `{ params in block }`
    Anonymous,
}

impl Parser<'_> {
    /// explist ::= exp {',' exp}
    pub(super) fn parse_exp_list(&mut self) -> PResult<Vec<Exp>> {
        let mut exps = vec![self.parse_exp()?];
        while self.accept(TokenKind::Comma)?.is_some() {
            exps.push(self.parse_exp()?);
        }
        Ok(exps)
    }

    pub(super) fn parse_exp(&mut self) -> PResult<Exp> {
        self.parse_sub_exp(0)
    }

    /// Precedence climbing: parse while the next operator binds tighter
    /// than `limit`.
    fn parse_sub_exp(&mut self, limit: u8) -> PResult<Exp> {
        self.nested(|p| p.parse_sub_exp_inner(limit))
    }

    fn parse_sub_exp_inner(&mut self, limit: u8) -> PResult<Exp> {
        let begin = self.lexer.head_loc();

        let mut exp = if let Some(op) = UnaryOp::from_token(self.peek()) {
            let op_token = self.next()?;
            let operand = self.parse_sub_exp(UNARY_PRIORITY)?;
            let loc = Location::merge(&op_token.loc, &self.now_loc());
            Exp::unary(op, operand, loc)
        } else {
            self.parse_primary()?
        };

        while let Some(op) = BinaryOp::from_token(self.peek()) {
            let mut priority = op.priority();
            if priority <= limit {
                break;
            }
            if op.is_right_assoc() {
                priority -= 1;
            }
            self.next()?;
            let right = self.parse_sub_exp(priority)?;
            let loc = Location::merge(&begin, &self.now_loc());
            exp = Exp::binary(op, exp, right, loc);
        }
        Ok(exp)
    }

    fn parse_primary(&mut self) -> PResult<Exp> {
        let literal = match self.peek() {
            TokenKind::Vararg => ExpKind::Vararg,
            TokenKind::Nil => ExpKind::Nil,
            TokenKind::True => ExpKind::True,
            TokenKind::False => ExpKind::False,
            TokenKind::String => {
                let token = self.next()?;
                return Ok(Exp::string(token.text, token.loc));
            }
            TokenKind::Number => return self.parse_number(),
            TokenKind::LBrace => {
                if self.is_mooc()
                    && self
                        .lexer
                        .lookahead_kinds(TokenKind::LBrace, scan_anonymous_function)
                {
                    let begin = self.lexer.head_loc();
                    return self.parse_function_exp(FunctionStyle::Anonymous, begin);
                }
                return self.parse_table();
            }
            TokenKind::Function if !self.is_mooc() => {
                let keyword = self.next()?;
                return self.parse_function_exp(FunctionStyle::Lua, keyword.loc);
            }
            TokenKind::Fn => {
                let keyword = self.next()?;
                return self.parse_function_exp(FunctionStyle::Braced, keyword.loc);
            }
            _ => return self.parse_prefix_exp(),
        };
        let token = self.next()?;
        Ok(Exp::new(literal, token.loc))
    }

    fn parse_number(&mut self) -> PResult<Exp> {
        let token = self.next()?;
        let kind = if let Some(value) = parse_integer(&token.text) {
            ExpKind::Integer(value)
        } else if let Some(value) = parse_float(&token.text) {
            ExpKind::Float(value)
        } else if let Some(value) = parse_suffixed_integer(&token.text) {
            ExpKind::Integer(value)
        } else {
            self.error(token.loc, format!("not a number: {}", token.text))?;
            return Ok(Exp::new(ExpKind::Float(0.0), Location::default()));
        };
        Ok(Exp::new(kind, token.loc))
    }

    fn parse_function_exp(&mut self, style: FunctionStyle, begin: Location) -> PResult<Exp> {
        let func = self.parse_function_body(style)?;
        let loc = Location::merge(&begin, &self.now_loc());
        Ok(Exp::new(ExpKind::Function(Box::new(func)), loc))
    }

    /// funcbody, starting after `function`/`fn` (or at `{` when anonymous).
    pub(super) fn parse_function_body(&mut self, style: FunctionStyle) -> PResult<FunctionDef> {
        self.nested(|p| p.parse_function_body_inner(style))
    }

    fn parse_function_body_inner(&mut self, style: FunctionStyle) -> PResult<FunctionDef> {
        if style == FunctionStyle::Anonymous {
            self.next_of_kind(TokenKind::LBrace)?;
        } else {
            self.next_of_kind(TokenKind::LParen)?;
        }
        let (params, is_vararg) = self.parse_params()?;
        match style {
            FunctionStyle::Lua => {
                self.next_of_kind(TokenKind::RParen)?;
            }
            FunctionStyle::Braced => {
                self.next_of_kind(TokenKind::RParen)?;
                self.next_of_kind(TokenKind::LBrace)?;
            }
            FunctionStyle::Anonymous => {
                self.next_of_kind(TokenKind::In)?;
            }
        }

        self.scopes.push(ScopeKind::Function, "function");
        let body = self.parse_block()?;
        self.scopes.pop();

        let close = if style == FunctionStyle::Lua {
            TokenKind::End
        } else {
            TokenKind::RBrace
        };
        self.next_of_kind(close)?;

        Ok(FunctionDef {
            params,
            is_vararg,
            is_method: false,
            body,
            class_name: None,
            func_name: None,
        })
    }

    /// parlist ::= namelist [',' '...'] | '...'
    fn parse_params(&mut self) -> PResult<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        match self.peek() {
            TokenKind::RParen => return Ok((params, false)),
            TokenKind::In if self.is_mooc() => return Ok((params, false)),
            TokenKind::Vararg => {
                self.next()?;
                return Ok((params, true));
            }
            _ => {}
        }

        let first = self.next_identifier()?;
        params.push(Param::new(first.text, first.loc));
        while self.accept(TokenKind::Comma)?.is_some() {
            if self.peek() == TokenKind::Identifier {
                let name = self.next()?;
                params.push(Param::new(name.text, name.loc));
            } else {
                self.next_of_kind(TokenKind::Vararg)?;
                return Ok((params, true));
            }
        }
        Ok((params, false))
    }

    /// tableconstructor ::= '{' [fieldlist] '}'
    fn parse_table(&mut self) -> PResult<Exp> {
        self.nested(Self::parse_table_inner)
    }

    fn parse_table_inner(&mut self) -> PResult<Exp> {
        let open = self.next_of_kind(TokenKind::LBrace)?;
        let mut keys = Vec::new();
        let mut values = Vec::new();

        while self.peek() != TokenKind::RBrace {
            let (key, value) = self.parse_field()?;
            keys.push(key);
            values.push(value);
            if !matches!(self.peek(), TokenKind::Comma | TokenKind::Semi) {
                break;
            }
            self.next()?;
        }
        self.next_of_kind(TokenKind::RBrace)?;
        let loc = Location::merge(&open.loc, &self.now_loc());

        if let Some(cap) = self.config.field_cap() {
            keys.truncate(cap);
            values.truncate(cap);
        }
        Ok(Exp::new(ExpKind::Table { keys, values }, loc))
    }

    /// field ::= '[' exp ']' '=' exp | Name '=' exp | exp
    fn parse_field(&mut self) -> PResult<(Option<Exp>, Exp)> {
        if self.accept(TokenKind::LBracket)?.is_some() {
            let key = self.parse_exp()?;
            self.next_of_kind(TokenKind::RBracket)?;
            self.next_of_kind(TokenKind::Assign)?;
            let value = self.parse_exp()?;
            return Ok((Some(key), value));
        }

        if self.is_mooc() {
            if self
                .lexer
                .lookahead_with(TokenKind::String, TokenKind::Assign)
                || self
                    .lexer
                    .lookahead_with(TokenKind::Number, TokenKind::Assign)
            {
                let key = self.parse_exp()?;
                self.next_of_kind(TokenKind::Assign)?;
                let value = self.parse_exp()?;
                return Ok((Some(key), value));
            }
            if self
                .lexer
                .lookahead_with(TokenKind::Assign, TokenKind::Identifier)
            {
                self.next()?;
                let name = self.next_identifier()?;
                let key = Exp::string(name.text.as_str(), name.loc);
                return Ok((Some(key), Exp::name(name.text, name.loc)));
            }
        }

        let exp = self.parse_exp()?;
        if let ExpKind::Name(name) = &exp.kind {
            if self.accept(TokenKind::Assign)?.is_some() {
                let key = Exp::string(name.as_str(), exp.loc);
                let value = self.parse_exp()?;
                return Ok((Some(key), value));
            }
        }
        Ok((None, exp))
    }

    /// prefixexp ::= Name | '(' exp ')', followed by field access, indexing
    /// and calls.
    pub(super) fn parse_prefix_exp(&mut self) -> PResult<Exp> {
        let exp = match self.peek() {
            TokenKind::Identifier => {
                let token = self.next()?;
                Exp::name(token.text, token.loc)
            }
            TokenKind::LParen => {
                let open = self.next()?;
                let inner = self.nested(Self::parse_exp)?;
                self.next_of_kind(TokenKind::RParen)?;
                Exp::paren(inner, Location::merge(&open.loc, &self.now_loc()))
            }
            _ => {
                let token = self.next()?;
                let message = format!("unexpected symbol near '{}'", token.near());
                self.error(token.loc, message)?;
                return Ok(Exp::bad(token.loc));
            }
        };
        self.finish_prefix_exp(exp)
    }

    fn finish_prefix_exp(&mut self, mut exp: Exp) -> PResult<Exp> {
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.next()?;
                    let name = self.next_identifier()?;
                    exp = Exp::field(exp, &name.text, name.loc);
                }
                TokenKind::LBracket => {
                    self.next()?;
                    let key = self.parse_exp()?;
                    self.next_of_kind(TokenKind::RBracket)?;
                    let loc = Location::merge(&exp.loc, &self.now_loc());
                    exp = Exp::index(exp, key, loc);
                }
                TokenKind::Colon if self.is_method_call() => {
                    self.next()?;
                    let name = self.next_identifier()?;
                    let args = self.parse_args()?;
                    let loc = Location::merge(&exp.loc, &self.now_loc());
                    let call = FunctionCall {
                        callee: exp,
                        method: Some(Param::new(name.text, name.loc)),
                        args,
                    };
                    exp = Exp::call(call, loc);
                }
                TokenKind::LParen => exp = self.finish_call(exp)?,
                TokenKind::String | TokenKind::LBrace if !self.is_mooc() => {
                    exp = self.finish_call(exp)?;
                }
                _ => return Ok(exp),
            }
        }
    }

    fn finish_call(&mut self, callee: Exp) -> PResult<Exp> {
        let args = self.parse_args()?;
        let loc = Location::merge(&callee.loc, &self.now_loc());
        let call = FunctionCall {
            callee,
            method: None,
            args,
        };
        Ok(Exp::call(call, loc))
    }

    /// Whether the `:` at the lookahead starts a method call.
    ///
    /// Lua always treats it so. Mooc needs `obj:name(` written without
    /// spaces around the colon, leaving `case x: f()` alone.
    fn is_method_call(&mut self) -> bool {
        if !self.is_mooc() {
            return true;
        }
        let prev = self.now_loc();
        let colon = self.lexer.peek_nth(0).loc;
        let name = self.lexer.peek_nth(1);
        let (name_kind, name_loc) = (name.kind, name.loc);
        let paren = self.lexer.peek_nth(2).kind;

        touches(&prev, &colon)
            && touches(&colon, &name_loc)
            && name_kind == TokenKind::Identifier
            && paren == TokenKind::LParen
    }

    /// args ::= '(' [explist] ')' | tableconstructor | LiteralString
    fn parse_args(&mut self) -> PResult<Vec<Exp>> {
        if !self.is_mooc() {
            match self.peek() {
                TokenKind::String => {
                    let token = self.next()?;
                    return Ok(vec![Exp::string(token.text, token.loc)]);
                }
                TokenKind::LBrace => return Ok(vec![self.parse_table()?]),
                _ => {}
            }
        }

        self.next_of_kind(TokenKind::LParen)?;
        let args = if self.peek() == TokenKind::RParen {
            Vec::new()
        } else {
            self.parse_exp_list()?
        };
        self.next_of_kind(TokenKind::RParen)?;
        Ok(args)
    }
}

/// `b` starts exactly where `a` ends.
const fn touches(a: &Location, b: &Location) -> bool {
    a.end_line == b.start_line && a.end_column == b.start_column
}

/// Decimal or hex integer. Decimal overflow is left to the float path;
/// hex wraps around like Lua.
fn parse_integer(text: &str) -> Option<i64> {
    if let Some(hex) = strip_hex_prefix(text) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = hex.chars().fold(0u64, |acc, c| {
            acc.wrapping_mul(16)
                .wrapping_add(u64::from(c.to_digit(16).unwrap_or(0)))
        });
        return Some(wrap_signed(value));
    }
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Decimal or hex float.
fn parse_float(text: &str) -> Option<f64> {
    if let Some(hex) = strip_hex_prefix(text) {
        return parse_hex_float(hex);
    }
    let valid = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !valid || !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_hex_float(hex: &str) -> Option<f64> {
    let (mantissa, exponent) = match hex.find(['p', 'P']) {
        Some(pos) => (&hex[..pos], hex[pos + 1..].parse::<i32>().ok()?),
        None => (hex, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0.0_f64;
    for c in int_part.chars() {
        value = value.mul_add(16.0, f64::from(c.to_digit(16)?));
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value = f64::from(c.to_digit(16)?).mul_add(scale, value);
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exponent))
}

/// LuaJIT `LL`/`ULL` integer literals.
fn parse_suffixed_integer(text: &str) -> Option<i64> {
    let upper = text.to_ascii_uppercase();
    let digits = upper
        .strip_suffix("ULL")
        .or_else(|| upper.strip_suffix("LL"))?;
    let original = &text[..digits.len()];
    if strip_hex_prefix(original).is_some() {
        return parse_integer(original);
    }
    if original.is_empty() || !original.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    original
        .parse::<i64>()
        .ok()
        .or_else(|| original.parse::<u64>().ok().map(wrap_signed))
}

const fn wrap_signed(value: u64) -> i64 {
    i64::from_ne_bytes(value.to_ne_bytes())
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("0xff"), Some(255));
        assert_eq!(parse_integer("0xffffffffffffffff"), Some(-1));
        assert_eq!(parse_integer("1e3"), None);
        assert_eq!(parse_integer("99999999999999999999"), None);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn floats() {
        assert_eq!(parse_float("3.5"), Some(3.5));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("0x1p4"), Some(16.0));
        assert_eq!(parse_float("0x.8"), Some(0.5));
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("3..2"), None);
    }

    #[test]
    fn luajit_suffixes() {
        assert_eq!(parse_suffixed_integer("10LL"), Some(10));
        assert_eq!(parse_suffixed_integer("10ull"), Some(10));
        assert_eq!(parse_suffixed_integer("0x10LL"), Some(16));
        assert_eq!(parse_suffixed_integer("LL"), None);
        assert_eq!(parse_suffixed_integer("3x"), None);
    }

    #[test]
    fn anonymous_function_scan() {
        assert_eq!(scan_anonymous_function(TokenKind::Comma), Scan::Continue);
        assert_eq!(scan_anonymous_function(TokenKind::In), Scan::Accept);
        assert_eq!(scan_anonymous_function(TokenKind::Assign), Scan::Reject);
    }
}
