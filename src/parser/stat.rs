use std::mem;

use crate::ast::{
    AssignStat, Attribute, BinaryOp, Block, DoKind, Exp, ExpKind, ForIn, ForNumeric, IfStat,
    LocalDecl, Param, Stat,
};
use crate::builder::compound_assign;
use crate::token::{Location, TokenKind};

use super::expr::FunctionStyle;
use super::scope::ScopeKind;
use super::{PResult, Parser};

/// Target of a function statement, `a.b.c:m` or `Class.m`.
struct FuncName {
    target: Exp,
    is_method: bool,
    class_name: Option<String>,
    func_name: String,
}

/// Operators that may precede `=` in a compound assignment.
const fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Concat => BinaryOp::Concat,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::Caret => BinaryOp::Pow,
        _ => return None,
    };
    Some(op)
}

impl Parser<'_> {
    pub(super) fn parse_stat(&mut self) -> PResult<Stat> {
        if self.is_mooc() {
            self.nested(Self::parse_mooc_stat)
        } else {
            self.nested(Self::parse_lua_stat)
        }
    }

    fn parse_lua_stat(&mut self) -> PResult<Stat> {
        match self.peek() {
            TokenKind::Semi | TokenKind::Illegal => {
                self.next()?;
                Ok(Stat::Empty)
            }
            TokenKind::Break => self.parse_break(),
            TokenKind::DoubleColon => self.parse_label(),
            TokenKind::Goto => self.parse_goto(),
            TokenKind::Do => self.parse_do(DoKind::Do),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Function => {
                let begin = self.lexer.head_loc();
                let stat = self.parse_function_stat(begin, Attribute::Regular, false)?;
                Ok(Stat::Assign(stat))
            }
            TokenKind::Local => {
                let local = self.next()?;
                if self.peek() == TokenKind::Function {
                    self.parse_local_function(local.loc)
                } else {
                    self.parse_local_decl(local.loc)
                }
            }
            _ => self.parse_assign_or_call(false),
        }
    }

    // -- bodies --

    /// Consume the token that opens a body: `lua_opener` or `{`.
    fn open_body(&mut self, lua_opener: TokenKind) -> PResult<()> {
        let opener = if self.is_mooc() {
            TokenKind::LBrace
        } else {
            lua_opener
        };
        self.next_of_kind(opener)?;
        Ok(())
    }

    /// Consume `end` or `}`.
    fn close_body(&mut self) -> PResult<()> {
        let closer = if self.is_mooc() {
            TokenKind::RBrace
        } else {
            TokenKind::End
        };
        self.next_of_kind(closer)?;
        Ok(())
    }

    pub(super) fn parse_scoped_block(&mut self, kind: ScopeKind, name: &str) -> PResult<Block> {
        self.scopes.push(kind, name);
        let block = self.parse_block()?;
        self.scopes.pop();
        Ok(block)
    }

    // -- simple statements --

    pub(super) fn parse_break(&mut self) -> PResult<Stat> {
        let token = self.next()?;
        if self
            .scopes
            .find_before(ScopeKind::Loop, ScopeKind::Function)
            .is_none()
        {
            self.error(token.loc, "break should be inside loop for/while/repeat")?;
        }
        Ok(Stat::Break { loc: token.loc })
    }

    /// '::' Name '::'
    pub(super) fn parse_label(&mut self) -> PResult<Stat> {
        let open = self.next()?;
        let name = self.next_identifier()?;
        self.next_of_kind(TokenKind::DoubleColon)?;
        Ok(Stat::Label {
            name: name.text,
            loc: Location::merge(&open.loc, &self.now_loc()),
        })
    }

    pub(super) fn parse_goto(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        let name = self.next_identifier()?;
        Ok(Stat::Goto {
            name: name.text,
            loc: Location::merge(&keyword.loc, &name.loc),
        })
    }

    // -- compound statements --

    /// `do block end`, `do { block }` or `defer { block }`.
    pub(super) fn parse_do(&mut self, kind: DoKind) -> PResult<Stat> {
        let keyword = self.next()?;
        if self.is_mooc() {
            self.next_of_kind(TokenKind::LBrace)?;
        }

        let body = match kind {
            DoKind::Do => self.parse_scoped_block(ScopeKind::Do, "do")?,
            DoKind::Defer => {
                if self
                    .scopes
                    .find_before(ScopeKind::Function, ScopeKind::Function)
                    .is_none()
                {
                    self.error(keyword.loc, "defer should be inside function body")?;
                }
                self.parse_scoped_block(ScopeKind::Function, "defer")?
            }
        };

        self.close_body()?;
        Ok(Stat::Do {
            kind,
            body,
            loc: Location::merge(&keyword.loc, &self.now_loc()),
        })
    }

    pub(super) fn parse_while(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        let cond = self.parse_exp()?;
        self.open_body(TokenKind::Do)?;
        let body = self.parse_scoped_block(ScopeKind::Loop, "while")?;
        self.close_body()?;
        Ok(Stat::While {
            cond,
            body,
            loc: Location::merge(&keyword.loc, &self.now_loc()),
        })
    }

    /// `repeat block until exp`, Mooc wraps the block in braces.
    pub(super) fn parse_repeat(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        if self.is_mooc() {
            self.next_of_kind(TokenKind::LBrace)?;
        }
        let body = self.parse_scoped_block(ScopeKind::Loop, "repeat")?;
        if self.is_mooc() {
            self.next_of_kind(TokenKind::RBrace)?;
        }
        self.next_of_kind(TokenKind::Until)?;
        let cond = self.parse_exp()?;
        Ok(Stat::Repeat {
            body,
            cond,
            loc: Location::merge(&keyword.loc, &self.now_loc()),
        })
    }

    /// if exp then block {elseif exp then block} [else block] end
    pub(super) fn parse_if(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        let mut stat = IfStat::new(keyword.loc);

        let cond = self.parse_exp()?;
        let body = self.parse_if_branch()?;
        stat = stat.branch(cond, body);

        while self.accept(TokenKind::Elseif)?.is_some() {
            let cond = self.parse_exp()?;
            let body = self.parse_if_branch()?;
            stat = stat.branch(cond, body);
        }

        if let Some(other) = self.accept(TokenKind::Else)? {
            let cond = Exp::truth(other.loc);
            if self.is_mooc() {
                self.next_of_kind(TokenKind::LBrace)?;
            }
            let body = self.parse_scoped_block(ScopeKind::If, "if")?;
            if self.is_mooc() {
                self.next_of_kind(TokenKind::RBrace)?;
            }
            stat = stat.branch(cond, body);
        }

        if !self.is_mooc() {
            self.next_of_kind(TokenKind::End)?;
        }
        stat.loc = Location::merge(&keyword.loc, &self.now_loc());
        Ok(Stat::If(stat))
    }

    /// `then block` in Lua, `{ block }` in Mooc.
    fn parse_if_branch(&mut self) -> PResult<Block> {
        self.open_body(TokenKind::Then)?;
        let body = self.parse_scoped_block(ScopeKind::If, "if")?;
        if self.is_mooc() {
            self.next_of_kind(TokenKind::RBrace)?;
        }
        Ok(body)
    }

    pub(super) fn parse_for(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        let name = self.next_identifier()?;
        let var = Param::new(name.text, name.loc);
        if self.peek() == TokenKind::Assign {
            self.finish_for_numeric(keyword.loc, var)
        } else {
            self.finish_for_in(keyword.loc, var)
        }
    }

    /// for Name '=' exp ',' exp [',' exp] do block end
    fn finish_for_numeric(&mut self, begin: Location, var: Param) -> PResult<Stat> {
        self.next_of_kind(TokenKind::Assign)?;
        let init = self.parse_exp()?;
        self.next_of_kind(TokenKind::Comma)?;
        let limit = self.parse_exp()?;
        let step = if self.accept(TokenKind::Comma)?.is_some() {
            self.parse_exp()?
        } else {
            Exp::integer(1, Location::default())
        };

        self.open_body(TokenKind::Do)?;
        let body = self.parse_scoped_block(ScopeKind::Loop, "for")?;
        self.close_body()?;

        Ok(Stat::ForNumeric(Box::new(ForNumeric {
            var,
            init,
            limit,
            step,
            body,
            loc: Location::merge(&begin, &self.now_loc()),
        })))
    }

    /// for namelist in explist do block end
    fn finish_for_in(&mut self, begin: Location, first: Param) -> PResult<Stat> {
        let mut vars = vec![first];
        while self.accept(TokenKind::Comma)?.is_some() {
            let name = self.next_identifier()?;
            vars.push(Param::new(name.text, name.loc));
        }
        self.next_of_kind(TokenKind::In)?;
        let iterables = self.parse_exp_list()?;

        self.open_body(TokenKind::Do)?;
        let body = self.parse_scoped_block(ScopeKind::Loop, "for")?;
        self.close_body()?;

        Ok(Stat::ForIn(ForIn {
            vars,
            iterables,
            body,
            loc: Location::merge(&begin, &self.now_loc()),
        }))
    }

    // -- functions --

    /// `function funcname funcbody` (or `[static] fn ...` in Mooc) as an
    /// assignment to the function name.
    pub(super) fn parse_function_stat(
        &mut self,
        begin: Location,
        attribute: Attribute,
        is_static: bool,
    ) -> PResult<AssignStat> {
        if is_static {
            self.next()?;
        }
        let (keyword, style) = if self.is_mooc() {
            (TokenKind::Fn, FunctionStyle::Braced)
        } else {
            (TokenKind::Function, FunctionStyle::Lua)
        };
        let keyword = self.next_of_kind(keyword)?;

        let name = self.parse_func_name(is_static)?;
        let self_loc = self.now_loc();
        let mut func = self.parse_function_body(style)?;
        if name.is_method {
            func.params.insert(0, Param::new("self", self_loc));
            func.is_method = true;
        }
        func.class_name = name.class_name;
        func.func_name = Some(name.func_name);

        let now = self.now_loc();
        let value = Exp::new(
            ExpKind::Function(Box::new(func)),
            Location::merge(&keyword.loc, &now),
        );
        let loc = Location::merge(&begin, &now);
        Ok(AssignStat::new(name.target, value, loc).attribute(attribute))
    }

    /// funcname ::= Name {'.' Name} [':' Name]
    ///
    /// Inside a Mooc class body the single name is a member of the class.
    fn parse_func_name(&mut self, is_static: bool) -> PResult<FuncName> {
        if self.is_mooc() {
            if let Some(class) = self.scopes.current_class().map(str::to_string) {
                let name = self.next_identifier()?;
                let owner = Exp::name(class.as_str(), name.loc);
                return Ok(FuncName {
                    target: Exp::field(owner, &name.text, name.loc),
                    is_method: !is_static,
                    class_name: Some(class),
                    func_name: name.text,
                });
            }
        }

        let first = self.next_identifier()?;
        let mut func_name = first.text.clone();
        let mut class_name = None;
        let mut target = Exp::name(first.text, first.loc);

        while self.accept(TokenKind::Dot)?.is_some() {
            let name = self.next_identifier()?;
            target = Exp::field(target, &name.text, name.loc);
            class_name = Some(mem::replace(&mut func_name, name.text));
        }

        let mut is_method = false;
        if self.accept(TokenKind::Colon)?.is_some() {
            let name = self.next_identifier()?;
            target = Exp::field(target, &name.text, name.loc);
            class_name = Some(mem::replace(&mut func_name, name.text));
            is_method = true;
        }

        Ok(FuncName {
            target,
            is_method,
            class_name,
            func_name,
        })
    }

    /// `local function Name funcbody`, after `local`.
    pub(super) fn parse_local_function(&mut self, begin: Location) -> PResult<Stat> {
        let style = if self.is_mooc() {
            FunctionStyle::Braced
        } else {
            FunctionStyle::Lua
        };
        self.next()?;
        let name = self.next_identifier()?;
        let mut func = self.parse_function_body(style)?;
        func.func_name = Some(name.text.clone());
        Ok(Stat::LocalFunction {
            name: Param::new(name.text, name.loc),
            func: Box::new(func),
            loc: Location::merge(&begin, &self.now_loc()),
        })
    }

    // -- locals --

    /// `local namelist [= explist]`, after `local`.
    pub(super) fn parse_local_decl(&mut self, begin: Location) -> PResult<Stat> {
        let (names, attributes) = self.parse_attrib_names()?;
        let values = if self.accept(TokenKind::Assign)?.is_some() {
            self.parse_exp_list()?
        } else {
            Vec::new()
        };
        Ok(Stat::LocalDecl(LocalDecl {
            names,
            attributes,
            values,
            loc: Location::merge(&begin, &self.now_loc()),
        }))
    }

    /// namelist ::= Name attrib {',' Name attrib}
    pub(super) fn parse_attrib_names(&mut self) -> PResult<(Vec<Param>, Vec<Attribute>)> {
        let mut names = Vec::new();
        let mut attributes = Vec::new();
        let mut has_close = false;
        loop {
            let name = self.next_identifier()?;
            let attribute = self.parse_attrib()?;
            if attribute == Attribute::Close {
                if has_close {
                    let loc = self.now_loc();
                    self.error(loc, "more than one to-be-closed variable in local list")?;
                }
                has_close = true;
            }
            names.push(Param::new(name.text, name.loc));
            attributes.push(attribute);
            if self.accept(TokenKind::Comma)?.is_none() {
                return Ok((names, attributes));
            }
        }
    }

    /// attrib ::= ['<' Name '>']
    fn parse_attrib(&mut self) -> PResult<Attribute> {
        if self.accept(TokenKind::Less)?.is_none() {
            return Ok(Attribute::Regular);
        }
        let name = self.next_identifier()?;
        let attribute = match name.text.as_str() {
            "const" => Attribute::Const,
            "close" => Attribute::Close,
            other => {
                let message = format!("unrecognized local variable attribute '{other}'");
                self.error(name.loc, message)?;
                Attribute::Regular
            }
        };
        self.next_of_kind(TokenKind::Greater)?;
        Ok(attribute)
    }

    // -- assignment and calls --

    /// varlist '=' explist | functioncall, plus compound assignment.
    pub(super) fn parse_assign_or_call(&mut self, export: bool) -> PResult<Stat> {
        let begin = self.lexer.head_loc();
        let exp = self.parse_prefix_exp()?;
        if exp.is_bad() {
            return Ok(Stat::Empty);
        }
        let first = match exp.kind {
            ExpKind::Call(call) => {
                return Ok(Stat::Call {
                    call,
                    loc: Location::merge(&begin, &self.now_loc()),
                });
            }
            kind => Exp::new(kind, exp.loc),
        };

        let mut stat = self.finish_assign(begin, first)?;
        if export {
            if let Stat::Assign(assign) = &mut stat {
                assign.attribute = Attribute::Export;
            }
        }
        Ok(stat)
    }

    /// Everything after the first target of an assignment.
    pub(super) fn finish_assign(&mut self, begin: Location, first: Exp) -> PResult<Stat> {
        let mut targets = vec![self.check_var(first)?];
        while self.accept(TokenKind::Comma)?.is_some() {
            let exp = self.parse_prefix_exp()?;
            targets.push(self.check_var(exp)?);
        }

        if let Some(op) = compound_op(self.peek()) {
            if targets.len() == 1 {
                return self.finish_compound_assign(begin, op, targets);
            }
            if !self.is_mooc() {
                self.next()?;
                if self.accept(TokenKind::Assign)?.is_some() {
                    self.parse_exp_list()?;
                }
                let loc = Location::merge(&begin, &self.now_loc());
                self.error(loc, "compound assignment needs exactly one target")?;
                return Ok(Stat::Empty);
            }
        }

        if self.accept(TokenKind::Assign)?.is_some() {
            let values = self.parse_exp_list()?;
            return Ok(Stat::Assign(AssignStat {
                targets,
                values,
                attribute: Attribute::Regular,
                loc: Location::merge(&begin, &self.now_loc()),
            }));
        }

        if self.is_mooc() {
            return Ok(Stat::LocalDecl(self.implicit_local(begin, targets)));
        }

        let near = self.lexer.peek_nth(0).near().to_string();
        let loc = self.lexer.head_loc();
        self.error(loc, format!("'=' expected near '{near}'"))?;
        Ok(Stat::Empty)
    }

    /// `x op= exp` as `x = x op (exp)`; `targets` holds exactly one entry.
    fn finish_compound_assign(
        &mut self,
        begin: Location,
        op: BinaryOp,
        mut targets: Vec<Exp>,
    ) -> PResult<Stat> {
        self.next()?;
        if self.peek() != TokenKind::Assign {
            let loc = Location::merge(&begin, &self.now_loc());
            self.error(loc, "expression cannot be used as a statement")?;
            return Ok(Stat::Empty);
        }
        self.next()?;
        let value = self.parse_exp()?;
        let loc = Location::merge(&begin, &self.now_loc());
        let Some(target) = targets.pop() else {
            return Ok(Stat::Empty);
        };
        Ok(Stat::Assign(compound_assign(op, target, value, loc)))
    }

    /// Mooc `a, b` on its own declares exported names.
    fn implicit_local(&self, begin: Location, targets: Vec<Exp>) -> LocalDecl {
        let mut decl = LocalDecl::new(Location::merge(&begin, &self.now_loc()));
        for target in targets {
            if let ExpKind::Name(name) = target.kind {
                decl = decl.bind(Param::new(name, target.loc), Attribute::Export);
            }
        }
        decl
    }

    /// var ::= Name | prefixexp '[' exp ']' | prefixexp '.' Name
    fn check_var(&mut self, exp: Exp) -> PResult<Exp> {
        match exp.kind {
            ExpKind::Name(_) | ExpKind::Index { .. } | ExpKind::Bad => Ok(exp),
            _ => {
                self.error(exp.loc, "cannot assign to this expression")?;
                Ok(Exp::bad(exp.loc))
            }
        }
    }
}
