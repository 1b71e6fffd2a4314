//! Compiler configuration (SPEC_FULL.md §D).
//!
//! Deliberately lighter than a dynamic, hot-reloading config manager —
//! nothing here needs multi-source layering, just a couple of knobs a
//! caller sets once before compiling.

/// The target SQL dialect. DuckDB is the only one FlatQuack emits today;
/// the enum exists so a second dialect doesn't require an API break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    DuckDb,
}

/// Compile-time knobs for [`crate::compile_with_options`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Recursion guard on FHIRPath expression trees (spec.md §5). Default
    /// matches spec.md's stated default of 256.
    pub max_recursion_depth: usize,
    pub dialect: SqlDialect,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 256,
            dialect: SqlDialect::default(),
        }
    }
}

impl CompileOptions {
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = CompileOptions::default();
        assert_eq!(opts.max_recursion_depth, 256);
        assert_eq!(opts.dialect, SqlDialect::DuckDb);
    }

    #[test]
    fn builder_overrides() {
        let opts = CompileOptions::default().with_max_recursion_depth(32);
        assert_eq!(opts.max_recursion_depth, 32);
    }
}
