//! Postal code (CEP) validation.

use std::fmt;

/// Number of digits in a CEP.
pub const CEP_LENGTH: usize = 8;

/// Returns true iff `code` is exactly eight ASCII decimal digits.
///
/// No normalization is applied: surrounding whitespace or a hyphen
/// (`"01001-000"`) makes the code invalid.
pub fn is_valid_cep(code: &str) -> bool {
    code.len() == CEP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// A validated postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cep(String);

impl Cep {
    /// Validate `code` and wrap it. Returns `None` when the format is wrong.
    pub fn parse(code: &str) -> Option<Self> {
        is_valid_cep(code).then(|| Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cep {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
