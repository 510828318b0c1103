//! Lexer for filter queries.
//!
//! Splits a query into words and comparator symbols, keeping byte spans so
//! the parser can hand values to casting exactly as they were typed.

use std::ops::Range;

use crate::error::{FilterSyntaxError, FilterSyntaxErrorReason, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of characters that are neither whitespace nor comparator symbols.
    Word,
    /// A run of `=`, `!`, `<`, `>`. Whether it names a comparator is decided
    /// by the parser.
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

fn is_symbol_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>')
}

fn is_grouping(c: char) -> bool {
    matches!(c, '(' | ')')
}

/// Tokenize `input`. Symbol runs are taken greedily, so `<=` is one token
/// and `<==` is one (invalid) token rather than `<=` followed by `=`.
///
/// Fails on the first parenthesis, before anything else is checked.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if is_grouping(ch) {
            return Err(FilterSyntaxError::new(
                FilterSyntaxErrorReason::ParenthesesNotAllowed,
                format!(
                    "Symbol '{}' at position {}",
                    ch,
                    input[..start].chars().count()
                ),
            ));
        }

        let symbol = is_symbol_char(ch);
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || is_grouping(c) || is_symbol_char(c) != symbol {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }

        tokens.push(Token {
            kind: if symbol {
                TokenKind::Symbol
            } else {
                TokenKind::Word
            },
            text: &input[start..end],
            span: start..end,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        tokenize(input).unwrap().iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_splits_on_whitespace() {
        assert_eq!(texts("  confirmed  >\t100 "), vec!["confirmed", ">", "100"]);
    }

    #[test]
    fn test_symbols_split_glued_words() {
        assert_eq!(texts("confirmed>=100"), vec!["confirmed", ">=", "100"]);
        assert_eq!(texts("fatal!=-3"), vec!["fatal", "!=", "-3"]);
    }

    #[test]
    fn test_symbol_runs_are_greedy() {
        let tokens = tokenize("a <== b").unwrap();
        assert_eq!(tokens[1].text, "<==");
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
    }

    #[test]
    fn test_spans_index_the_input() {
        let input = "county = Eau Claire";
        let tokens = tokenize(input).unwrap();
        assert_eq!(&input[tokens[2].span.start..tokens[3].span.end], "Eau Claire");
    }

    #[test]
    fn test_parenthesis_rejected_with_position() {
        let err = tokenize("confirmed > 1 AND (state = WI").unwrap_err();
        assert_eq!(err.reason(), FilterSyntaxErrorReason::ParenthesesNotAllowed);
        assert_eq!(err.context(), "Symbol '(' at position 18");
    }

    #[test]
    fn test_empty_input_has_no_tokens() {
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
