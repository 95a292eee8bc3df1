//! Shopify shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The host is not under `myshopify.com`.
    #[error("shop must be a myshopify.com domain")]
    WrongSuffix,
    /// The store handle contains characters Shopify never issues.
    #[error("shop handle contains invalid characters")]
    InvalidHandle,
}

/// A Shopify shop domain such as `gallery-north.myshopify.com`.
///
/// Parsing lowercases the input, strips an `https://` scheme and a trailing
/// slash, and then requires `<handle>.myshopify.com` where the handle is made
/// of ASCII letters, digits and hyphens and does not start with a hyphen.
///
/// ## Examples
///
/// ```
/// use showroom_core::ShopDomain;
///
/// let shop = ShopDomain::parse("https://Gallery-North.myshopify.com/").unwrap();
/// assert_eq!(shop.as_str(), "gallery-north.myshopify.com");
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("evil.com").is_err());
/// assert!(ShopDomain::parse("a.b.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a shop domain (DNS name limit).
    pub const MAX_LENGTH: usize = 253;

    const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, not a
    /// `myshopify.com` host or has an invalid store handle.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let lowered = s.trim().to_ascii_lowercase();
        let host = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered)
            .trim_end_matches('/')
            .to_string();

        if host.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if host.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let handle = host
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::WrongSuffix)?;

        let valid_handle = !handle.is_empty()
            && !handle.starts_with('-')
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');

        if !valid_handle {
            return Err(ShopDomainError::InvalidHandle);
        }

        Ok(Self(host))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}
