//! Newtype IDs for type-safe entity references.
//!
//! Catalog ids are random UUIDs generated by the server at creation time.
//! They are handed out in preview links, so parsing is strict: anything that
//! is not a UUID can never name a catalog.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid [`CatalogId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid catalog id: {0}")]
pub struct CatalogIdError(String);

/// Identifier of a saved catalog.
///
/// ```
/// use showroom_core::CatalogId;
///
/// let id = CatalogId::generate();
/// assert_eq!(CatalogId::parse(&id.to_string()), Ok(id));
/// assert!(CatalogId::parse("not-a-uuid").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(Uuid);

impl CatalogId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse an id from its hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogIdError`] if the input is not a UUID.
    pub fn parse(s: &str) -> Result<Self, CatalogIdError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CatalogIdError(s.to_owned()))
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for CatalogId {
    type Err = CatalogIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for CatalogId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<CatalogId> for Uuid {
    fn from(id: CatalogId) -> Self {
        id.0
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for CatalogId {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Uuid as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for CatalogId {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
        let id = <Uuid as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self(id))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for CatalogId {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Uuid as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
