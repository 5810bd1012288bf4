//! Host pattern parsing and range expansion
//!
//! Inventories may abbreviate a run of numbered hosts as `prefix[start:end]`,
//! e.g. `web[01:20]`. A leading zero on the start bound pads every expanded
//! index to the width of that bound; without one, indices are plain decimal.

use crate::error::{HostkeysError, Result};
use std::fmt;

/// Largest number of hosts a single range may expand to
pub const MAX_RANGE_HOSTS: u64 = 100_000;

/// A host entry from an inventory group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// A single concrete host name
    Literal(String),

    /// An inclusive numeric range of host names
    Range {
        prefix: String,
        start: u64,
        end: u64,
        /// Zero-padding width, set when the start bound had a leading zero
        width: Option<usize>,
    },
}

impl HostPattern {
    /// Parse a host pattern.
    ///
    /// Only text with a `:` between the first `[` and the first `]` after it is
    /// treated as a range; anything else is a literal host name. A range must
    /// close the pattern and may span at most [`MAX_RANGE_HOSTS`] hosts.
    pub fn parse(pattern: &str) -> Result<Self> {
        let literal = || Ok(HostPattern::Literal(pattern.to_string()));

        let Some((prefix, rest)) = pattern.split_once('[') else {
            return literal();
        };
        let Some((body, suffix)) = rest.split_once(']') else {
            return literal();
        };
        if !body.contains(':') {
            return literal();
        }
        if !suffix.is_empty() {
            return Err(HostkeysError::invalid_range(
                pattern,
                format!("unexpected text after ']': '{}'", suffix),
            ));
        }

        let bounds: Vec<&str> = body.split(':').collect();
        let [start_token, end_token] = bounds.as_slice() else {
            return Err(HostkeysError::invalid_range(
                pattern,
                format!("expected [start:end], found [{}]", body),
            ));
        };

        let start = parse_bound(pattern, "start", start_token)?;
        let end = parse_bound(pattern, "end", end_token)?;
        let width = start_token.starts_with('0').then_some(start_token.len());

        if end >= start && end - start >= MAX_RANGE_HOSTS {
            return Err(HostkeysError::invalid_range(
                pattern,
                format!("range spans more than {} hosts", MAX_RANGE_HOSTS),
            ));
        }

        Ok(HostPattern::Range {
            prefix: prefix.to_string(),
            start,
            end,
            width,
        })
    }

    /// Concrete host names denoted by this pattern, in ascending order
    pub fn expand(&self) -> Vec<String> {
        match self {
            HostPattern::Literal(name) => vec![name.clone()],
            HostPattern::Range {
                prefix,
                start,
                end,
                width,
            } => (*start..=*end)
                .map(|i| match *width {
                    Some(width) => format!("{prefix}{i:0width$}"),
                    None => format!("{prefix}{i}"),
                })
                .collect(),
        }
    }

    /// Number of hosts the pattern expands to
    pub fn len(&self) -> u64 {
        match self {
            HostPattern::Literal(_) => 1,
            HostPattern::Range { start, end, .. } => {
                if end < start {
                    0
                } else {
                    (end - start).saturating_add(1)
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPattern::Literal(name) => write!(f, "{}", name),
            HostPattern::Range {
                prefix,
                start,
                end,
                width,
            } => {
                let width = width.unwrap_or(0);
                write!(f, "{prefix}[{start:0width$}:{end:0width$}]")
            }
        }
    }
}

fn parse_bound(pattern: &str, which: &str, token: &str) -> Result<u64> {
    if token.is_empty() {
        return Err(HostkeysError::invalid_range(
            pattern,
            format!("missing {} bound", which),
        ));
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HostkeysError::invalid_range(
            pattern,
            format!("{} bound '{}' is not a non-negative integer", which, token),
        ));
    }
    token.parse::<u64>().map_err(|e| {
        HostkeysError::invalid_range(pattern, format!("{} bound '{}': {}", which, token, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_pattern(pattern: &str) -> Result<Vec<String>> {
        Ok(HostPattern::parse(pattern)?.expand())
    }

    #[test]
    fn test_literal_expands_to_itself() {
        for name in ["db", "db01.example.com", "10.0.0.5", ""] {
            assert_eq!(expand_pattern(name).unwrap(), vec![name.to_string()]);
        }
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(
            expand_pattern("node[01:03]").unwrap(),
            vec!["node01", "node02", "node03"]
        );
    }

    #[test]
    fn test_unpadded_range() {
        assert_eq!(
            expand_pattern("node[1:3]").unwrap(),
            vec!["node1", "node2", "node3"]
        );
    }

    #[test]
    fn test_padding_width_follows_start_token() {
        let hosts = expand_pattern("web[008:011]").unwrap();
        assert_eq!(hosts, vec!["web008", "web009", "web010", "web011"]);
        assert!(hosts.iter().all(|h| h.len() == "web".len() + 3));
    }

    #[test]
    fn test_zero_start_pads_to_one_digit() {
        assert_eq!(
            expand_pattern("n[0:11]").unwrap().last().unwrap(),
            "n11"
        );
        assert_eq!(expand_pattern("n[0:2]").unwrap(), vec!["n0", "n1", "n2"]);
    }

    #[test]
    fn test_indices_wider_than_padding_are_not_truncated() {
        assert_eq!(
            expand_pattern("h[08:100]").unwrap().last().unwrap(),
            "h100"
        );
    }

    #[test]
    fn test_range_count() {
        let pattern = HostPattern::parse("app[5:24]").unwrap();
        assert_eq!(pattern.len(), 20);
        assert_eq!(pattern.expand().len(), 20);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let pattern = HostPattern::parse("node[05:02]").unwrap();
        assert!(pattern.is_empty());
        assert!(pattern.expand().is_empty());
    }

    #[test]
    fn test_single_element_range() {
        assert_eq!(expand_pattern("db[7:7]").unwrap(), vec!["db7"]);
    }

    #[test]
    fn test_text_after_range_is_rejected() {
        for name in ["web[1:2].example.com", "web[01:02]a", "web[1:2]]"] {
            let err = HostPattern::parse(name).unwrap_err();
            assert!(
                matches!(err, HostkeysError::InvalidRangeSpec { ref reason, .. } if reason.contains("after ']'")),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_full_width_range_length_does_not_overflow() {
        let pattern = HostPattern::Range {
            prefix: "n".into(),
            start: 0,
            end: u64::MAX,
            width: None,
        };
        assert_eq!(pattern.len(), u64::MAX);
        assert!(!pattern.is_empty());
    }

    #[test]
    fn test_oversized_ranges_are_rejected() {
        for name in ["n[0:18446744073709551615]", "n[0:99999999999]", "n[1:100001]"] {
            let err = HostPattern::parse(name).unwrap_err();
            assert!(
                matches!(err, HostkeysError::InvalidRangeSpec { ref reason, .. } if reason.contains("more than")),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_largest_allowed_range() {
        let pattern = HostPattern::parse("n[1:100000]").unwrap();
        assert_eq!(pattern.len(), MAX_RANGE_HOSTS);
        assert_eq!(pattern.expand().len() as u64, MAX_RANGE_HOSTS);
    }

    #[test]
    fn test_incomplete_brackets_are_literal() {
        for name in ["node[01", "node[0102]", "node:01", "node]01:02[", "node[01]:02"] {
            assert_eq!(
                HostPattern::parse(name).unwrap(),
                HostPattern::Literal(name.to_string()),
                "{name}"
            );
        }
    }

    #[test]
    fn test_malformed_bounds_are_rejected() {
        for name in ["node[a:f]", "node[1:x]", "node[:3]", "node[1:]", "node[1:2:3]", "node[+1:3]", "node[ 1:3]"] {
            let err = HostPattern::parse(name).unwrap_err();
            assert!(
                matches!(err, HostkeysError::InvalidRangeSpec { ref pattern, .. } if pattern == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_overflowing_bound_is_rejected() {
        let err = HostPattern::parse("node[1:99999999999999999999999]").unwrap_err();
        assert!(matches!(err, HostkeysError::InvalidRangeSpec { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(HostPattern::parse("node[01:03]").unwrap().to_string(), "node[01:03]");
        assert_eq!(HostPattern::parse("db").unwrap().to_string(), "db");
    }
}
