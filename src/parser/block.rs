use crate::ast::{Block, Exp, Stat};
use crate::builder::continue_label;
use crate::token::{Location, TokenKind};

use super::scope::ScopeKind;
use super::{PResult, Parser};

impl Parser<'_> {
    /// block ::= {stat} [retstat]
    pub(super) fn parse_block(&mut self) -> PResult<Block> {
        self.nested(Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> PResult<Block> {
        let head = self.lexer.head_loc();
        let before = self.now_loc();

        let stats = self.parse_stats()?;
        let returns = self.parse_returns()?;

        let after = self.now_loc();
        let loc = if after == before {
            Location::until(&head, &head)
        } else {
            Location::merge(&head, &after)
        };
        Ok(Block {
            stats,
            returns,
            loc,
        })
    }

    fn parse_stats(&mut self) -> PResult<Vec<Stat>> {
        let mut stats = Vec::new();
        loop {
            let kind = self.peek();
            if self.is_block_end(kind) {
                break;
            }
            let stat = self.parse_stat()?;
            if !stat.is_empty() {
                stats.push(stat);
            }
        }

        let current = self.scopes.current();
        if current.kind == ScopeKind::Loop && current.count > 0 {
            stats.push(Stat::Label {
                name: continue_label(self.scopes.loop_depth()),
                loc: self.now_loc(),
            });
        }
        Ok(stats)
    }

    /// retstat ::= return [explist] [';']
    fn parse_returns(&mut self) -> PResult<Option<Vec<Exp>>> {
        if self.peek() != TokenKind::Return {
            return Ok(None);
        }

        let current = self.scopes.current_mut();
        if matches!(current.kind, ScopeKind::Do | ScopeKind::Guard) {
            current.count = 1;
        }

        self.next()?;
        let next = self.peek();
        if next == TokenKind::Eof || self.is_block_end(next) {
            return Ok(Some(Vec::new()));
        }
        if self.accept(TokenKind::Semi)?.is_some() {
            return Ok(Some(Vec::new()));
        }

        let exps = self.parse_exp_list()?;
        self.accept(TokenKind::Semi)?;
        Ok(Some(exps))
    }

    /// Tokens that end a statement list in the current dialect.
    fn is_block_end(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Return | TokenKind::Eof => true,
            TokenKind::RBrace | TokenKind::Case | TokenKind::Default => self.is_mooc(),
            TokenKind::End | TokenKind::Else | TokenKind::Elseif | TokenKind::Until => {
                !self.is_mooc()
            }
            _ => false,
        }
    }
}
