//! # Filter Query Parser
//!
//! Parses query text into a [`ConditionTree`].
//!
//! Grammar:
//! ```text
//! query := term ( (AND | OR) term )*
//! term  := PARAMETER COMPARATOR VALUE
//! ```
//!
//! There is no grouping and no precedence: terms combine left to right, so
//! `a AND b OR c` means `(a AND b) OR c`. A VALUE runs up to the next
//! `AND`/`OR` keyword and may span several words (`county = Eau Claire`).

use crate::comparator::ComparatorSet;
use crate::condition::{ConditionEntity, ConditionTree, FilterCondition, LogicalOp};
use crate::error::{FilterSyntaxError, FilterSyntaxErrorReason, Result};
use crate::lexer::{self, Token, TokenKind};
use crate::parameter::ParameterRegistry;

/// Parses queries against borrowed, read-only catalogs.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    parameters: &'r ParameterRegistry,
    comparators: &'r ComparatorSet,
}

impl<'r> Parser<'r> {
    pub fn new(parameters: &'r ParameterRegistry, comparators: &'r ComparatorSet) -> Self {
        Self {
            parameters,
            comparators,
        }
    }

    /// Parse a non-empty query. The first failure is returned; nothing is
    /// partially accepted.
    pub fn parse(&self, input: &str) -> Result<ConditionTree> {
        let tokens = lexer::tokenize(input)?;
        let mut cursor = Cursor {
            input,
            tokens: &tokens,
            pos: 0,
        };

        let mut tree = ConditionTree::leaf(self.parse_term(&mut cursor)?);

        // A term only stops at a logical keyword or at the end.
        while let Some(token) = cursor.next() {
            let op = logical_op(token).ok_or_else(|| cursor.incomplete(token.span.start))?;
            if cursor.peek().is_none() {
                return Err(cursor.incomplete(token.span.start));
            }
            tree = tree.then(op, self.parse_term(&mut cursor)?);
        }

        Ok(tree)
    }

    /// Parse a submitted query. Blank text is the empty, always-true filter.
    pub fn parse_condition(&self, input: &str) -> Result<FilterCondition> {
        if input.trim().is_empty() {
            return Ok(FilterCondition::none());
        }
        let tree = self.parse(input)?;
        Ok(FilterCondition::new(input, tree))
    }

    fn parse_term(&self, cursor: &mut Cursor<'_, '_>) -> Result<ConditionEntity> {
        let start = cursor.offset();

        let parameter = match cursor.next() {
            Some(token) if token.kind == TokenKind::Word && logical_op(token).is_none() => {
                self.parameters.resolve(token.text)?
            }
            _ => return Err(cursor.incomplete(start)),
        };

        // A word with no letters or digits (`~`, `≥`) stands where a
        // comparator belongs and is reported as one.
        let comparator = match cursor.next() {
            Some(token) if token.kind == TokenKind::Symbol || is_glyph(token) => {
                self.comparators.resolve(token.text)?
            }
            _ => return Err(cursor.incomplete(start)),
        };

        let mut value_span: Option<(usize, usize)> = None;
        while let Some(token) = cursor.peek() {
            if logical_op(token).is_some() {
                break;
            }
            let from = value_span.map_or(token.span.start, |(from, _)| from);
            value_span = Some((from, token.span.end));
            cursor.next();
        }

        let (from, to) = value_span.ok_or_else(|| cursor.incomplete(start))?;
        ConditionEntity::new(parameter, comparator, &cursor.input[from..to])
    }
}

fn logical_op(token: &Token<'_>) -> Option<LogicalOp> {
    match token.kind {
        TokenKind::Word => LogicalOp::from_keyword(token.text),
        TokenKind::Symbol => None,
    }
}

fn is_glyph(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Word && !token.text.chars().any(char::is_alphanumeric)
}

struct Cursor<'a, 't> {
    input: &'a str,
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'a, 't> Cursor<'a, 't> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Byte offset of the next token, or the end of input.
    fn offset(&self) -> usize {
        self.peek().map_or(self.input.len(), |t| t.span.start)
    }

    /// `INCOMPLETE_EXPRESSION` quoting the input from `from` up to the
    /// last consumed token.
    fn incomplete(&self, from: usize) -> FilterSyntaxError {
        let to = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(from, |t| t.span.end)
            .max(from);
        FilterSyntaxError::new(
            FilterSyntaxErrorReason::IncompleteExpression,
            format!("Expression: {}", &self.input[from..to]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparator;
    use crate::parameter::{Parameter, TypedValue};
    use FilterSyntaxErrorReason as Reason;

    fn parse(input: &str) -> Result<ConditionTree> {
        let parameters = ParameterRegistry::new();
        let comparators = ComparatorSet::new();
        Parser::new(&parameters, &comparators).parse(input)
    }

    fn reason(input: &str) -> Reason {
        parse(input).unwrap_err().reason()
    }

    #[test]
    fn test_single_term() {
        let tree = parse("confirmed > 100").unwrap();
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].parameter(), Parameter::Confirmed);
        assert_eq!(leaves[0].comparator(), Comparator::Gt);
        assert_eq!(leaves[0].value(), &TypedValue::Count(100));
    }

    #[test]
    fn test_and_of_two_terms() {
        let tree = parse("confirmed > 100 AND state = WI").unwrap();
        match &tree {
            ConditionTree::Node { op, .. } => assert_eq!(*op, LogicalOp::And),
            ConditionTree::Leaf(_) => panic!("expected a node"),
        }
        assert_eq!(tree.to_string(), "confirmed > 100 AND state = WI");
    }

    #[test]
    fn test_left_to_right_grouping() {
        let tree = parse("confirmed > 1 AND fatal > 1 OR state = WI").unwrap();
        match tree {
            ConditionTree::Node { left, op, right } => {
                assert_eq!(op, LogicalOp::Or);
                assert!(matches!(*right, ConditionTree::Leaf(_)));
                assert!(matches!(
                    *left,
                    ConditionTree::Node {
                        op: LogicalOp::And,
                        ..
                    }
                ));
            }
            ConditionTree::Leaf(_) => panic!("expected a node"),
        }
    }

    #[test]
    fn test_keywords_any_case_and_glued_comparators() {
        let tree = parse("Confirmed>=100 and STATE=wi or deaths!=0").unwrap();
        assert_eq!(
            tree.to_string(),
            "confirmed >= 100 AND state = wi OR fatal != 0"
        );
    }

    #[test]
    fn test_multi_word_value_kept_verbatim() {
        let tree = parse("county = Eau  Claire AND state = WI").unwrap();
        assert_eq!(tree.leaves()[0].raw(), "Eau  Claire");
    }

    #[test]
    fn test_parentheses_rejected() {
        assert_eq!(reason("(confirmed > 100)"), Reason::ParenthesesNotAllowed);
        assert_eq!(reason("(((("), Reason::ParenthesesNotAllowed);
        // Reported even when an earlier term is already invalid.
        assert_eq!(reason("bogus > 1 AND (x"), Reason::ParenthesesNotAllowed);
    }

    #[test]
    fn test_incomplete_expressions() {
        assert_eq!(reason("confirmed >"), Reason::IncompleteExpression);
        assert_eq!(reason("confirmed 100"), Reason::IncompleteExpression);
        assert_eq!(reason("confirmed > 100 AND"), Reason::IncompleteExpression);
        assert_eq!(reason("AND confirmed > 100"), Reason::IncompleteExpression);
        assert_eq!(reason("confirmed > 1 AND OR fatal > 1"), Reason::IncompleteExpression);
        assert_eq!(reason("> 100"), Reason::IncompleteExpression);
        assert_eq!(reason(""), Reason::IncompleteExpression);
        assert_eq!(reason("state = AND fatal > 1"), Reason::IncompleteExpression);
    }

    #[test]
    fn test_incomplete_context_quotes_term() {
        let err = parse("fatal > 2 AND confirmed >").unwrap_err();
        assert_eq!(err.context(), "Expression: confirmed >");

        let err = parse("fatal > 2 OR").unwrap_err();
        assert_eq!(err.context(), "Expression: OR");
    }

    #[test]
    fn test_unknown_parameter_and_comparator() {
        let err = parse("recovered > 5").unwrap_err();
        assert_eq!(err.reason(), Reason::UnknownParameter);
        assert_eq!(err.context(), "Parameter: recovered");

        let err = parse("confirmed => 5").unwrap_err();
        assert_eq!(err.reason(), Reason::UnknownComparator);
        assert_eq!(err.context(), "Comparator: =>");

        assert_eq!(reason("confirmed == 5"), Reason::UnknownComparator);

        let err = parse("confirmed ≥ 5").unwrap_err();
        assert_eq!(err.reason(), Reason::UnknownComparator);
        assert_eq!(err.context(), "Comparator: ≥");
        assert_eq!(reason("county ~ Dane"), Reason::UnknownComparator);
        assert_eq!(reason("confirmed 100"), Reason::IncompleteExpression);
        assert_eq!(reason("confirmed <> 5"), Reason::UnknownComparator);
    }

    #[test]
    fn test_value_errors_propagate_verbatim() {
        let err = parse("state = WI AND confirmed > -5").unwrap_err();
        assert_eq!(err, Parameter::Confirmed.cast("-5").unwrap_err());

        assert_eq!(reason("lat > 91"), Reason::LatitudeOverRange);
        assert_eq!(reason("date = yesterday"), Reason::DateUnparsable);
        assert_eq!(reason("state < WI"), Reason::UnsupportedComparator);
    }

    #[test]
    fn test_missing_logical_operator_folds_into_value() {
        let err = parse("confirmed > 100 fatal > 3").unwrap_err();
        assert_eq!(err.reason(), Reason::CaseNumberUncastable);
        assert_eq!(err.context(), "Parameter: confirmed (100 fatal > 3)");
    }

    #[test]
    fn test_first_failure_wins() {
        let err = parse("confirmed > x AND lat > 200").unwrap_err();
        assert_eq!(err.reason(), Reason::CaseNumberUncastable);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "confirmed > 100 AND state = WI OR deathrate <= 2.5";
        assert_eq!(parse(input).unwrap(), parse(input).unwrap());
        let bad = "confirmed > 100 AND";
        assert_eq!(parse(bad).unwrap_err(), parse(bad).unwrap_err());
    }

    #[test]
    fn test_blank_condition_is_empty() {
        let parameters = ParameterRegistry::new();
        let comparators = ComparatorSet::new();
        let parser = Parser::new(&parameters, &comparators);

        assert!(parser.parse_condition("   ").unwrap().is_empty());

        let condition = parser.parse_condition("confirmed>100").unwrap();
        assert_eq!(condition.source(), "confirmed>100");
        assert_eq!(condition.to_string(), "confirmed > 100");
    }
}
