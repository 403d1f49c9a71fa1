//! Citation keys and their display ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

/// The token NotebookLM shows for collapsed citation runs.
pub const ELLIPSIS: &str = "...";

/// Identifier of one distinct citation marker value on the page.
///
/// Numeric keys sort ascending; sentinel keys (the ellipsis token or any
/// other non-numeric marker text) sort after every numeric key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CitationKey {
    Numeric(u32),
    Sentinel(String),
}

impl CitationKey {
    /// Parse marker text. Surrounding whitespace is ignored.
    ///
    /// Returns `None` for empty text.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<u32>() {
                return Some(CitationKey::Numeric(n));
            }
        }
        Some(CitationKey::Sentinel(trimmed.to_string()))
    }

    /// The ellipsis sentinel.
    pub fn ellipsis() -> Self {
        CitationKey::Sentinel(ELLIPSIS.to_string())
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            CitationKey::Numeric(n) => Some(*n),
            CitationKey::Sentinel(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CitationKey::Numeric(_))
    }
}

impl Ord for CitationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CitationKey::Numeric(a), CitationKey::Numeric(b)) => a.cmp(b),
            (CitationKey::Numeric(_), CitationKey::Sentinel(_)) => Ordering::Less,
            (CitationKey::Sentinel(_), CitationKey::Numeric(_)) => Ordering::Greater,
            (CitationKey::Sentinel(a), CitationKey::Sentinel(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for CitationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationKey::Numeric(n) => write!(f, "{}", n),
            CitationKey::Sentinel(s) => f.write_str(s),
        }
    }
}

impl FromStr for CitationKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CitationKey::parse(s).ok_or_else(|| EngineError::InvalidKey(s.to_string()))
    }
}

impl From<u32> for CitationKey {
    fn from(n: u32) -> Self {
        CitationKey::Numeric(n)
    }
}

// Keys travel as plain strings, matching the messaging boundary and the
// persisted override map.
impl Serialize for CitationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CitationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CitationKey::parse(&raw).ok_or_else(|| serde::de::Error::custom("empty citation key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(CitationKey::parse(" 12 "), Some(CitationKey::Numeric(12)));
    }

    #[test]
    fn test_parse_sentinel() {
        assert_eq!(CitationKey::parse("..."), Some(CitationKey::ellipsis()));
        assert_eq!(
            CitationKey::parse("a1"),
            Some(CitationKey::Sentinel("a1".to_string()))
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(CitationKey::parse("   "), None);
        assert!("".parse::<CitationKey>().is_err());
    }

    #[test]
    fn test_parse_overflow_is_sentinel() {
        let key = CitationKey::parse("99999999999").unwrap();
        assert!(!key.is_numeric());
    }

    #[test]
    fn test_ordering_numeric_then_sentinel() {
        let mut keys: Vec<CitationKey> = ["2", "10", "...", "1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["1", "2", "10", "..."]);
    }

    #[test]
    fn test_serde_as_string() {
        let key = CitationKey::Numeric(7);
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"7\"");

        let back: CitationKey = serde_json::from_str("\"...\"").unwrap();
        assert_eq!(back, CitationKey::ellipsis());
    }

    #[test]
    fn test_serde_rejects_empty() {
        assert!(serde_json::from_str::<CitationKey>("\"\"").is_err());
    }
}
