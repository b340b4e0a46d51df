use crate::token::Dialect;

/// Tunables for a [`Parser`](crate::Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub dialect: Dialect,
    /// Errors kept before the analysis aborts.
    pub max_errors: usize,
    /// Lua table constructors are cut to this many fields. Mooc ignores it.
    pub table_field_limit: usize,
    /// Deepest block/expression recursion accepted.
    pub max_nesting: usize,
}

impl ParserConfig {
    pub const DEFAULT_MAX_ERRORS: usize = 30;
    pub const DEFAULT_TABLE_FIELD_LIMIT: usize = 1000;
    pub const DEFAULT_MAX_NESTING: usize = 200;

    #[must_use]
    pub const fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            max_errors: Self::DEFAULT_MAX_ERRORS,
            table_field_limit: Self::DEFAULT_TABLE_FIELD_LIMIT,
            max_nesting: Self::DEFAULT_MAX_NESTING,
        }
    }

    /// Defaults with the dialect picked from the chunk name.
    #[must_use]
    pub fn for_chunk(chunk_name: &str) -> Self {
        Self::for_dialect(Dialect::from_chunk_name(chunk_name))
    }

    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub const fn max_errors(mut self, max: usize) -> Self {
        self.max_errors = max;
        self
    }

    #[must_use]
    pub const fn table_field_limit(mut self, limit: usize) -> Self {
        self.table_field_limit = limit;
        self
    }

    #[must_use]
    pub const fn max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Field cap applied to table constructors, if any.
    #[must_use]
    pub const fn field_cap(&self) -> Option<usize> {
        match self.dialect {
            Dialect::Lua => Some(self.table_field_limit),
            Dialect::Mooc => None,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::for_dialect(Dialect::Lua)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.max_errors, 30);
        assert_eq!(config.field_cap(), Some(1000));
        assert_eq!(config.max_nesting, 200);
    }

    #[test]
    fn mooc_never_truncates() {
        let config = ParserConfig::for_chunk("main.mooc").table_field_limit(5);
        assert_eq!(config.dialect, Dialect::Mooc);
        assert_eq!(config.field_cap(), None);
    }

    #[test]
    fn builder_chain() {
        let config = ParserConfig::for_dialect(Dialect::Lua)
            .max_errors(3)
            .max_nesting(10)
            .dialect(Dialect::Mooc);
        assert_eq!(config.max_errors, 3);
        assert_eq!(config.max_nesting, 10);
        assert_eq!(config.dialect, Dialect::Mooc);
    }
}
