//! Coupon code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponCodeError {
    /// The input is empty after trimming.
    #[error("coupon code cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("coupon code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The string key a coupon is applied by.
///
/// Codes are trimmed on parse and compared exactly afterwards, so the code
/// stored on a coupon line item matches the code in the coupon store.
///
/// ## Examples
///
/// ```
/// use auto_coupon_core::CouponCode;
///
/// let code = CouponCode::parse("  SAVE10 ").unwrap();
/// assert_eq!(code.as_str(), "SAVE10");
///
/// assert!(CouponCode::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// Maximum length of a coupon code.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `CouponCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, CouponCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CouponCodeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(CouponCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `CouponCode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CouponCode {
    type Err = CouponCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CouponCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CouponCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CouponCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let code = CouponCode::parse("\tSAVE10\n").unwrap();
        assert_eq!(code, "SAVE10");
    }

    #[test]
    fn test_parse_keeps_case() {
        assert_ne!(
            CouponCode::parse("save10").unwrap(),
            CouponCode::parse("SAVE10").unwrap()
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(CouponCode::parse(""), Err(CouponCodeError::Empty)));
        assert!(matches!(
            CouponCode::parse("   "),
            Err(CouponCodeError::Empty)
        ));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "x".repeat(CouponCode::MAX_LENGTH + 1);
        assert!(matches!(
            CouponCode::parse(&long),
            Err(CouponCodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_rejects_blank_code() {
        let result: Result<CouponCode, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());

        let code: CouponCode = serde_json::from_str("\" WELCOME \"").unwrap();
        assert_eq!(code.as_str(), "WELCOME");
    }
}
