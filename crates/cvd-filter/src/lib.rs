//! # cvd-filter — the dashboard's filter language
//!
//! Turns a typed condition such as `confirmed > 100 AND state = WI` into a
//! decision function over case records.
//!
//! ```text
//! query text ──▶ lexer ──▶ parser ──▶ ConditionTree ──▶ compile ──▶ Fn(&Record) -> bool
//!                            │
//!                            └─ ParameterRegistry / ComparatorSet validate each term
//! ```
//!
//! Parsing and compiling are synchronous and pure. The catalogs are built
//! once and only read afterwards, so one [`FilterEngine`] can serve any
//! number of callers.

pub mod comparator;
pub mod condition;
pub mod error;
pub mod lexer;
pub mod parameter;
pub mod parser;
pub mod predicate;

pub use comparator::{Comparator, ComparatorSet};
pub use condition::{ConditionEntity, ConditionTree, FilterCondition, LogicalOp};
pub use error::{FilterSyntaxError, FilterSyntaxErrorReason, Result};
pub use parameter::{Parameter, ParameterRegistry, TypedValue, ValueKind};
pub use parser::Parser;
pub use predicate::{compile, convert, FieldValue, Predicate, Record};

/// Owns the parameter and comparator catalogs and parses queries against
/// them.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    parameters: ParameterRegistry,
    comparators: ComparatorSet,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::with_catalogs(ParameterRegistry::new(), ComparatorSet::new())
    }

    pub fn with_catalogs(parameters: ParameterRegistry, comparators: ComparatorSet) -> Self {
        Self {
            parameters,
            comparators,
        }
    }

    pub fn parameters(&self) -> &ParameterRegistry {
        &self.parameters
    }

    pub fn comparators(&self) -> &ComparatorSet {
        &self.comparators
    }

    pub fn parser(&self) -> Parser<'_> {
        Parser::new(&self.parameters, &self.comparators)
    }

    /// Parse a submitted query. Blank input is the empty condition.
    pub fn parse(&self, input: &str) -> Result<FilterCondition> {
        self.parser().parse_condition(input)
    }

    /// Parse and compile in one step.
    pub fn predicate<R>(&self, input: &str) -> Result<Predicate<R>>
    where
        R: Record + ?Sized + 'static,
    {
        let condition = self.parse(input)?;
        Ok(convert(&condition))
    }
}
