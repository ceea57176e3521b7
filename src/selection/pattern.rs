//! Shell-style wildcard patterns.

use regex::Regex;

use crate::error::{DbtdefsError, Result};

/// A compiled `*`/`?` wildcard pattern, anchored at both ends.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a pattern. Everything but `*` and `?` is literal.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                c => re.push_str(&regex::escape(&c.to_string())),
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| DbtdefsError::InvalidSelector {
            selector: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether the whole input matches.
    pub fn matches(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern has no wildcards.
    pub fn is_literal(&self) -> bool {
        !self.source.contains(['*', '?'])
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
