//! Keys used to index containers in the resource tree.
//!
//! Request paths are always text, but structured data is frequently keyed by
//! small integers. A path segment made entirely of ASCII digits is therefore
//! coerced to an integer key before lookup.

use std::fmt;

/// A container key: either an integer or a string.
///
/// Integer keys order before string keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Coerce a single path segment into a key.
    ///
    /// Non-empty all-digit segments become [`Key::Int`]. Everything else,
    /// including the empty segment and digit runs too large for `i64`, stays
    /// a string key.
    ///
    /// ```
    /// use rested_core::Key;
    ///
    /// assert_eq!(Key::from_segment("2"), Key::Int(2));
    /// assert_eq!(Key::from_segment("users"), Key::Str("users".into()));
    /// assert_eq!(Key::from_segment(""), Key::Str(String::new()));
    /// ```
    pub fn from_segment(segment: &str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = segment.parse::<i64>() {
                return Self::Int(n);
            }
        }
        Self::Str(segment.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_become_integers() {
        assert_eq!(Key::from_segment("0"), Key::Int(0));
        assert_eq!(Key::from_segment("42"), Key::Int(42));
        assert_eq!(Key::from_segment("007"), Key::Int(7));
    }

    #[test]
    fn mixed_segments_stay_strings() {
        assert_eq!(Key::from_segment("2a"), Key::from("2a"));
        assert_eq!(Key::from_segment("-1"), Key::from("-1"));
        assert_eq!(Key::from_segment("1.5"), Key::from("1.5"));
        assert_eq!(Key::from_segment(" 1"), Key::from(" 1"));
    }

    #[test]
    fn non_ascii_digits_stay_strings() {
        // Arabic-Indic digit two
        assert_eq!(Key::from_segment("\u{0662}"), Key::from("\u{0662}"));
    }

    #[test]
    fn empty_segment_is_empty_string() {
        assert_eq!(Key::from_segment(""), Key::Str(String::new()));
    }

    #[test]
    fn overflowing_digits_stay_strings() {
        let huge = "99999999999999999999999";
        assert_eq!(Key::from_segment(huge), Key::from(huge));
    }

    #[test]
    fn integers_order_before_strings() {
        let mut keys = vec![Key::from("b"), Key::from(10), Key::from("a"), Key::from(2)];
        keys.sort();
        assert_eq!(keys, vec![Key::from(2), Key::from(10), Key::from("a"), Key::from("b")]);
    }

    #[test]
    fn display_round_trips_text() {
        assert_eq!(Key::Int(12).to_string(), "12");
        assert_eq!(Key::from("users").to_string(), "users");
    }
}
