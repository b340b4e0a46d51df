//! Mooc-only statements and their Lua desugarings.

use crate::ast::{
    AssignStat, Attribute, ClassDecl, ClassKind, DoKind, Exp, FunctionCall, IfStat, ImportDecl,
    LocalDecl, Param, Stat, SwitchDecl,
};
use crate::builder::{
    CLASS_PARENT, ImportSource, SWITCH_SUBJECT, continue_label, import_member, negate,
    switch_case,
};
use crate::token::{Location, TokenKind};

use super::scope::ScopeKind;
use super::{PResult, Parser};

impl Parser<'_> {
    pub(super) fn parse_mooc_stat(&mut self) -> PResult<Stat> {
        match self.peek() {
            TokenKind::Semi | TokenKind::Illegal => {
                self.next()?;
                Ok(Stat::Empty)
            }
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::DoubleColon => self.parse_label(),
            TokenKind::Goto => self.parse_goto(),
            TokenKind::Do => self.parse_do(DoKind::Do),
            TokenKind::Defer => self.parse_do(DoKind::Defer),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::If => self.parse_if(),
            TokenKind::Guard => self.parse_guard(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::For => self.parse_for(),
            kind @ (TokenKind::Fn | TokenKind::Static) => {
                let begin = self.lexer.head_loc();
                let is_static = kind == TokenKind::Static;
                let stat = self.parse_function_stat(begin, Attribute::Regular, is_static)?;
                Ok(Stat::Assign(stat))
            }
            TokenKind::Local => {
                let local = self.next()?;
                match self.peek() {
                    TokenKind::Class | TokenKind::Struct => self.parse_class(local.loc, false),
                    TokenKind::Fn => self.parse_local_function(local.loc),
                    _ => self.parse_local_decl(local.loc),
                }
            }
            TokenKind::Class | TokenKind::Struct | TokenKind::Extension => {
                let begin = self.lexer.head_loc();
                self.parse_class(begin, false)
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::Export => self.parse_export(),
            _ => self.parse_assign_or_call(false),
        }
    }

    /// `continue` jumps to the label appended to the innermost loop body.
    fn parse_continue(&mut self) -> PResult<Stat> {
        let token = self.next()?;
        let depth = self.scopes.loop_depth();
        let in_loop = match self.scopes.find_before(ScopeKind::Loop, ScopeKind::Function) {
            Some(marker) => {
                marker.count = 1;
                true
            }
            None => false,
        };
        let name = if in_loop {
            continue_label(depth)
        } else {
            self.error(token.loc, "continue should be inside loop for/while/repeat")?;
            "continue".to_string()
        };
        Ok(Stat::Goto {
            name,
            loc: token.loc,
        })
    }

    /// guard exp else { block } as `if not (exp) { block }`.
    fn parse_guard(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        let cond = self.parse_exp()?;
        let cond = negate(cond, Location::merge(&keyword.loc, &self.now_loc()));
        self.next_of_kind(TokenKind::Else)?;
        self.next_of_kind(TokenKind::LBrace)?;

        self.scopes.push(ScopeKind::Guard, "guard");
        let body = self.parse_block()?;
        let transfers = body.returns.is_some()
            || self.scopes.current().count > 0
            || matches!(body.stats.last(), Some(Stat::Goto { .. } | Stat::Break { .. }));
        if !transfers {
            let loc = self.now_loc();
            self.error(
                loc,
                "guard should transfer control with return/break/goto/continue",
            )?;
        }
        self.scopes.pop();
        self.next_of_kind(TokenKind::RBrace)?;

        let loc = Location::merge(&keyword.loc, &self.now_loc());
        Ok(Stat::If(IfStat::new(loc).branch(cond, body)))
    }

    /// switch exp { case a, b: block ... default: block }
    fn parse_switch(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;
        let value = self.parse_exp()?;
        let subject = LocalDecl::new(Location::merge(&keyword.loc, &self.now_loc()))
            .bind(Param::new(SWITCH_SUBJECT, keyword.loc), Attribute::Regular)
            .value(value);

        let open = self.next_of_kind(TokenKind::LBrace)?;
        let mut cases = IfStat::new(open.loc);
        while let Some(case) = self.accept(TokenKind::Case)? {
            let labels = self.parse_exp_list()?;
            let cond = switch_case(labels).unwrap_or_else(|| Exp::bad(case.loc));
            self.next_of_kind(TokenKind::Colon)?;
            let body = self.parse_scoped_block(ScopeKind::If, "if")?;
            cases = cases.branch(cond, body);
        }
        if let Some(default) = self.accept(TokenKind::Default)? {
            self.next_of_kind(TokenKind::Colon)?;
            let body = self.parse_scoped_block(ScopeKind::If, "if")?;
            cases = cases.branch(Exp::truth(default.loc), body);
        }
        self.next_of_kind(TokenKind::RBrace)?;

        let now = self.now_loc();
        cases.loc = Location::merge(&open.loc, &now);
        Ok(Stat::Switch(Box::new(SwitchDecl {
            subject,
            cases,
            loc: Location::merge(&keyword.loc, &now),
        })))
    }

    /// class Name [: Super] { members }
    ///
    /// Produces `Name = {}`, `local Self = Name`, `local Super = Super`,
    /// `local __st = Super` and one `Name.member = ...` assignment per member.
    fn parse_class(&mut self, begin: Location, exported: bool) -> PResult<Stat> {
        let keyword = self.next()?;
        let kind = match keyword.kind {
            TokenKind::Struct => ClassKind::Struct,
            TokenKind::Extension => ClassKind::Extension,
            _ => ClassKind::Class,
        };
        let name = self.next_identifier()?;

        let super_class = if let Some(colon) = self.accept(TokenKind::Colon)? {
            if kind == ClassKind::Struct {
                self.error(colon.loc, "struct can not inherit")?;
            }
            let parent = self.next_identifier()?;
            Exp::name(parent.text, parent.loc)
        } else {
            Exp::nil(self.now_loc())
        };

        let header = Location::merge(&name.loc, &self.now_loc());
        let attribute = if exported || kind == ClassKind::Extension {
            Attribute::Export
        } else {
            Attribute::Regular
        };
        let class = AssignStat::new(
            Exp::name(name.text.as_str(), name.loc),
            Exp::empty_table(name.loc),
            header,
        )
        .attribute(attribute);
        let vars = vec![
            LocalDecl::new(header)
                .bind(Param::new("Self", name.loc), Attribute::Regular)
                .value(Exp::name(name.text.as_str(), name.loc)),
            LocalDecl::new(header)
                .bind(Param::new("Super", name.loc), Attribute::Regular)
                .value(super_class.clone()),
            LocalDecl::new(header)
                .bind(Param::new(CLASS_PARENT, name.loc), Attribute::Regular)
                .value(super_class.clone()),
        ];

        self.next_of_kind(TokenKind::LBrace)?;
        self.scopes.push(ScopeKind::Class, &name.text);
        let members = self.parse_class_members(&name.text)?;
        self.scopes.pop();
        self.next_of_kind(TokenKind::RBrace)?;

        Ok(Stat::Class(Box::new(ClassDecl {
            kind,
            class,
            super_class,
            vars,
            members,
            loc: Location::merge(&begin, &self.now_loc()),
        })))
    }

    fn parse_class_members(&mut self, class: &str) -> PResult<Vec<AssignStat>> {
        let mut members = Vec::new();
        loop {
            match self.peek() {
                kind @ (TokenKind::Fn | TokenKind::Static) => {
                    let begin = self.lexer.head_loc();
                    let is_static = kind == TokenKind::Static;
                    members.push(self.parse_function_stat(begin, Attribute::Regular, is_static)?);
                }
                TokenKind::Identifier => {
                    let field = self.next()?;
                    let target =
                        Exp::field(Exp::name(class, field.loc), &field.text, field.loc);
                    if let Stat::Assign(assign) = self.finish_assign(field.loc, target)? {
                        members.push(assign);
                    }
                }
                _ => return Ok(members),
            }
        }
    }

    /// `import "lib"` or `import a, b from src [{ keys }]`.
    fn parse_import(&mut self) -> PResult<Stat> {
        let keyword = self.next()?;

        if self.peek() == TokenKind::String {
            let lib = self.next()?;
            return Ok(Stat::Import(ImportDecl::Require {
                call: FunctionCall::require(&lib.text, keyword.loc, lib.loc),
                loc: Location::merge(&keyword.loc, &lib.loc),
            }));
        }

        let begin = self.lexer.head_loc();
        let (names, attributes) = self.parse_attrib_names()?;
        let from = self.next_of_kind(TokenKind::From)?;

        let source_token = self.next()?;
        let source = match source_token.kind {
            TokenKind::String => ImportSource::Library(source_token.text),
            TokenKind::Identifier => ImportSource::Table(source_token.text),
            _ => {
                let message = format!(
                    "invalid library name near '{}', should be string or name",
                    source_token.near()
                );
                self.error(source_token.loc, message)?;
                ImportSource::Table(String::new())
            }
        };

        let values = if self.accept(TokenKind::LBrace)?.is_some() {
            let values = self.parse_import_keys(&source, &names)?;
            self.next_of_kind(TokenKind::RBrace)?;
            if values.len() != names.len() {
                let loc = Location::merge(&begin, &self.now_loc());
                self.invariant(
                    loc,
                    "import name list and value list should have the same length",
                )?;
            }
            values
        } else {
            let value = match &source {
                ImportSource::Library(lib) => Exp::call(
                    FunctionCall::require(lib, from.loc, source_token.loc),
                    Location::merge(&from.loc, &source_token.loc),
                ),
                ImportSource::Table(table) => Exp::name(table.as_str(), source_token.loc),
            };
            vec![value]
        };

        Ok(Stat::Import(ImportDecl::Bind(LocalDecl {
            names,
            attributes,
            values,
            loc: Location::merge(&begin, &self.now_loc()),
        })))
    }

    /// `{ k1, k2 }` after an import source. An empty list reuses the names.
    fn parse_import_keys(
        &mut self,
        source: &ImportSource,
        names: &[Param],
    ) -> PResult<Vec<Exp>> {
        let mut values = Vec::new();
        let mut first = true;
        loop {
            if let Some(key) = self.accept(TokenKind::Identifier)? {
                values.push(import_member(source, &key.text, key.loc));
            } else if first {
                let loc = self.now_loc();
                values.extend(names.iter().map(|name| import_member(source, &name.name, loc)));
            }
            first = false;
            if self.accept(TokenKind::Comma)?.is_none() {
                return Ok(values);
            }
        }
    }

    /// `export *`, `export fn`, `export class` or an exported assignment.
    fn parse_export(&mut self) -> PResult<Stat> {
        let export = self.next()?;
        match self.peek() {
            TokenKind::Star => {
                self.next()?;
                Ok(Stat::ExportAll {
                    loc: Location::merge(&export.loc, &self.now_loc()),
                })
            }
            TokenKind::Fn => {
                let stat = self.parse_function_stat(export.loc, Attribute::Export, false)?;
                Ok(Stat::Assign(stat))
            }
            TokenKind::Class | TokenKind::Struct => self.parse_class(export.loc, true),
            _ => self.parse_assign_or_call(true),
        }
    }
}
