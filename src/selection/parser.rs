//! Selection expression parsing.
//!
//! Grammar (a subset of dbt node selection):
//!
//! ```text
//! expr      := term (WS term)*          union
//! term      := criterion ("," criterion)*  intersection
//! criterion := [N] "+"? [method ":"] value "+"? [N]
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::pattern::GlobPattern;
use crate::error::{DbtdefsError, Result};

/// How far a graph operator walks. `None` is unbounded.
pub type Depth = Option<usize>;

/// Selection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `fqn:` (also the default)
    Fqn,
    /// `tag:`
    Tag,
    /// `resource_type:`
    ResourceType,
    /// `package:`
    Package,
    /// `path:`
    Path,
}

impl Method {
    fn parse(name: &str, selector: &str) -> Result<Self> {
        match name {
            "fqn" => Ok(Method::Fqn),
            "tag" => Ok(Method::Tag),
            "resource_type" => Ok(Method::ResourceType),
            "package" => Ok(Method::Package),
            "path" => Ok(Method::Path),
            other => Err(DbtdefsError::InvalidSelector {
                selector: selector.to_string(),
                message: format!("unknown method '{}'", other),
            }),
        }
    }
}

/// One `method:value` with optional graph operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub method: Method,
    pub value: String,
    pub pattern: GlobPattern,
    /// Leading `+`: include ancestors.
    pub parents: Option<Depth>,
    /// Trailing `+`: include descendants.
    pub children: Option<Depth>,
}

/// Comma-joined criteria; a node must satisfy all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub criteria: Vec<Criterion>,
}

/// Whitespace-separated terms; a node may satisfy any of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionExpr {
    pub terms: Vec<Term>,
}

impl SelectionExpr {
    /// Parse an expression. An empty string selects nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use dbtdefs::selection::SelectionExpr;
    ///
    /// let expr = SelectionExpr::parse("tag:nightly,+orders fqn:*").unwrap();
    /// assert_eq!(expr.terms.len(), 2);
    /// assert_eq!(expr.terms[0].criteria.len(), 2);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let terms = input
            .split_whitespace()
            .map(Term::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { terms })
    }

    /// Whether the expression selects nothing.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Term {
    fn parse(input: &str) -> Result<Self> {
        let criteria = input
            .split(',')
            .map(|part| {
                if part.is_empty() {
                    Err(DbtdefsError::InvalidSelector {
                        selector: input.to_string(),
                        message: "empty criterion".to_string(),
                    })
                } else {
                    Criterion::parse(part)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { criteria })
    }
}

/// `[depth]+` prefix, body, `+[depth]` suffix.
static OPERATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d*)\+)?(.*?)(?:\+(\d*))?$").expect("OPERATOR_REGEX must compile")
});

fn parse_depth(digits: &str, selector: &str) -> Result<Depth> {
    if digits.is_empty() {
        return Ok(None);
    }
    digits
        .parse::<usize>()
        .map(Some)
        .map_err(|e| DbtdefsError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("bad depth '{}': {}", digits, e),
        })
}

impl Criterion {
    /// Parse a single criterion such as `2+tag:nightly+`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: &str| DbtdefsError::InvalidSelector {
            selector: input.to_string(),
            message: message.to_string(),
        };

        let caps = OPERATOR_REGEX
            .captures(input)
            .ok_or_else(|| invalid("unparseable criterion"))?;

        let parents = match caps.get(1) {
            Some(m) => Some(parse_depth(m.as_str(), input)?),
            None => None,
        };
        let children = match caps.get(3) {
            Some(m) => Some(parse_depth(m.as_str(), input)?),
            None => None,
        };

        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let (method, value) = match body.split_once(':') {
            Some((name, value)) => (Method::parse(name, input)?, value),
            None => (Method::Fqn, body),
        };

        if value.is_empty() {
            return Err(invalid("missing value"));
        }

        Ok(Self {
            method,
            value: value.to_string(),
            pattern: GlobPattern::new(value)?,
            parents,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_value_defaults_to_fqn() {
        let c = Criterion::parse("orders").unwrap();
        assert_eq!(c.method, Method::Fqn);
        assert_eq!(c.value, "orders");
        assert_eq!(c.parents, None);
        assert_eq!(c.children, None);
    }

    #[test]
    fn method_prefix_is_parsed() {
        let c = Criterion::parse("tag:daily_partition").unwrap();
        assert_eq!(c.method, Method::Tag);
        assert_eq!(c.value, "daily_partition");
    }

    #[test]
    fn fqn_star() {
        let c = Criterion::parse("fqn:*").unwrap();
        assert_eq!(c.method, Method::Fqn);
        assert!(c.pattern.matches("anything"));
    }

    #[test]
    fn unbounded_graph_operators() {
        let c = Criterion::parse("+orders+").unwrap();
        assert_eq!(c.parents, Some(None));
        assert_eq!(c.children, Some(None));
        assert_eq!(c.value, "orders");
    }

    #[test]
    fn bounded_graph_operators() {
        let c = Criterion::parse("2+tag:nightly+1").unwrap();
        assert_eq!(c.parents, Some(Some(2)));
        assert_eq!(c.children, Some(Some(1)));
        assert_eq!(c.method, Method::Tag);
        assert_eq!(c.value, "nightly");
    }

    #[test]
    fn trailing_digits_without_plus_are_part_of_value() {
        let c = Criterion::parse("model2").unwrap();
        assert_eq!(c.value, "model2");
        assert_eq!(c.children, None);
    }

    #[test]
    fn unknown_method_is_error() {
        let err = Criterion::parse("bogus:x").unwrap_err();
        assert!(err.to_string().contains("unknown method 'bogus'"));
    }

    #[test]
    fn missing_value_is_error() {
        assert!(Criterion::parse("tag:").is_err());
        assert!(Criterion::parse("+").is_err());
    }

    #[test]
    fn empty_expression_selects_nothing() {
        let expr = SelectionExpr::parse("   ").unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn union_and_intersection() {
        let expr = SelectionExpr::parse("tag:a,package:p  fqn:x").unwrap();
        assert_eq!(expr.terms.len(), 2);
        assert_eq!(expr.terms[0].criteria.len(), 2);
        assert_eq!(expr.terms[1].criteria.len(), 1);
    }

    #[test]
    fn dangling_comma_is_error() {
        assert!(SelectionExpr::parse("tag:a,").is_err());
    }
}
