//! Asset visibility.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public/private visibility flag attached to an asset at upload time and
/// enforced at fetch time. Stored as backend-native object metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Public,
    Private,
}

impl AccessType {
    /// Metadata value persisted on the object.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Public => "public",
            AccessType::Private => "private",
        }
    }

    /// Decode a metadata value read back from the provider.
    ///
    /// Unknown or missing values fail closed to private.
    pub fn from_metadata_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("public") => AccessType::Public,
            _ => AccessType::Private,
        }
    }
}

impl Default for AccessType {
    fn default() -> Self {
        AccessType::Private
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_metadata_fails_closed() {
        assert_eq!(
            AccessType::from_metadata_value(None),
            AccessType::Private
        );
        assert_eq!(
            AccessType::from_metadata_value(Some("internal")),
            AccessType::Private
        );
        assert_eq!(
            AccessType::from_metadata_value(Some("Public")),
            AccessType::Public
        );
    }
}
