//! # Conditions
//!
//! A [`ConditionEntity`] is one validated `parameter comparator value`
//! triple. A [`ConditionTree`] chains entities with AND/OR strictly left to
//! right, and a [`FilterCondition`] is what a submitted query becomes: the
//! tree (or nothing) plus the text the user typed.

use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::comparator::Comparator;
use crate::error::{FilterSyntaxError, FilterSyntaxErrorReason, Result};
use crate::parameter::{Parameter, TypedValue};

/// A single `parameter comparator value` condition.
///
/// The value has been cast successfully when the entity exists; a value that
/// fails its parameter's rule never produces an entity.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionEntity {
    parameter: Parameter,
    comparator: Comparator,
    raw: String,
    value: TypedValue,
}

impl ConditionEntity {
    pub fn new(parameter: Parameter, comparator: Comparator, raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();

        if parameter.kind().is_textual() && comparator.is_ordering() {
            return Err(FilterSyntaxError::new(
                FilterSyntaxErrorReason::UnsupportedComparator,
                format!("Parameter: {}, Comparator: {}", parameter, comparator),
            ));
        }

        let value = parameter.cast(&raw)?;

        Ok(Self {
            parameter,
            comparator,
            raw,
            value,
        })
    }

    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// The value exactly as written in the query.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }
}

// Identity is the (parameter, comparator, raw) triple; `value` is derived
// from it.
impl PartialEq for ConditionEntity {
    fn eq(&self, other: &Self) -> bool {
        self.parameter == other.parameter
            && self.comparator == other.comparator
            && self.raw == other.raw
    }
}

impl Eq for ConditionEntity {}

impl Hash for ConditionEntity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parameter.hash(state);
        self.comparator.hash(state);
        self.raw.hash(state);
    }
}

impl std::fmt::Display for ConditionEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.parameter.keyword(),
            self.comparator.symbol(),
            self.raw
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Match `AND`/`OR` in any letter case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }
}

impl std::fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Conditions joined by AND/OR.
///
/// There is no operator precedence: `a AND b OR c` is `(a AND b) OR c`.
/// Trees built with [`ConditionTree::leaf`] and [`ConditionTree::then`] are
/// always left-deep, so rendering them back to text is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionTree {
    Leaf(ConditionEntity),
    Node {
        left: Box<ConditionTree>,
        op: LogicalOp,
        right: Box<ConditionTree>,
    },
}

impl ConditionTree {
    pub fn leaf(entity: ConditionEntity) -> Self {
        Self::Leaf(entity)
    }

    /// Append `entity` on the right, joined by `op`.
    pub fn then(self, op: LogicalOp, entity: ConditionEntity) -> Self {
        Self::Node {
            left: Box::new(self),
            op,
            right: Box::new(Self::Leaf(entity)),
        }
    }

    /// Leaves in source order.
    pub fn leaves(&self) -> Vec<&ConditionEntity> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ConditionEntity>) {
        match self {
            Self::Leaf(entity) => out.push(entity),
            Self::Node { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }
}

impl std::fmt::Display for ConditionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(entity) => write!(f, "{}", entity),
            Self::Node { left, op, right } => write!(f, "{} {} {}", left, op, right),
        }
    }
}

/// A submitted query. An empty query filters nothing out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCondition {
    source: String,
    tree: Option<ConditionTree>,
}

impl FilterCondition {
    pub fn new(source: impl Into<String>, tree: ConditionTree) -> Self {
        Self {
            source: source.into(),
            tree: Some(tree),
        }
    }

    /// The always-true condition.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> Option<&ConditionTree> {
        self.tree.as_ref()
    }

    /// The query text as the user typed it.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_none()
    }
}

impl std::fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tree {
            Some(tree) => write!(f, "{}", tree),
            None => f.write_str("None"),
        }
    }
}
