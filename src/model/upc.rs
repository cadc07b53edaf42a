//! Canonical UPC keys.
//!
//! UPC codes reach the system as JSON strings, JSON numbers and spreadsheet
//! cells (integers, sometimes floats such as `123.0`). Each code keeps the
//! text it arrived with, which is what gets written to labels and shown to
//! annotators, plus a join key used for equality, hashing and ordering:
//!
//! - surrounding whitespace is removed
//! - purely numeric codes are keyed as a decimal integer without leading
//!   zeros (`"00123"`, `123`, `123.0` and `"123.0"` are the same key)
//! - anything else is keyed by its trimmed text

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A product code: source text plus canonical join key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "String")]
pub struct Upc {
    text: String,
    key: String,
}

impl Upc {
    /// Parse a textual code. Returns None for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
            key: canonical_digits(trimmed).unwrap_or_else(|| trimmed.to_string()),
        })
    }

    fn numeric(digits: String) -> Self {
        Self {
            text: digits.clone(),
            key: digits,
        }
    }

    /// Canonicalize a JSON value (string or number). Null, booleans and
    /// containers are not codes.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(Self::numeric(u.to_string()))
                } else if let Some(f) = n.as_f64().filter(|f| is_integral(*f)) {
                    Some(Self::numeric(format!("{f:.0}")))
                } else {
                    Self::parse(&n.to_string())
                }
            }
            _ => None,
        }
    }

    /// The code as it appeared in its source, trimmed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Join key: equal for every spelling of the same product.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Upc {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Upc {}

impl Hash for Upc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Upc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Upc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Integral, non-negative and exactly representable.
fn is_integral(f: f64) -> bool {
    f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 9_007_199_254_740_992.0
}

/// Join key for numeric codes: `"00123"` and `"123.000"` give `"123"`.
fn canonical_digits(text: &str) -> Option<String> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b == b'0')
    {
        return None;
    }
    let stripped = whole.trim_start_matches('0');
    Some(if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    })
}

impl fmt::Display for Upc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<serde_json::Value> for Upc {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_value(&value).ok_or_else(|| format!("not a UPC code: {value}"))
    }
}

impl From<Upc> for String {
    fn from(upc: Upc) -> Self {
        upc.text
    }
}
