//! Storage backend selection.

use std::fmt;
use std::str::FromStr;

/// The closed set of supported object-storage providers. Selected once at
/// process start from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Gcs,
    Azure,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" => Ok(StorageBackend::S3),
            "gcs" | "gcp" => Ok(StorageBackend::Gcs),
            "azure" | "azureblob" => Ok(StorageBackend::Azure),
            other => Err(format!(
                "unknown storage backend '{}' (expected s3, gcs, or azure)",
                other
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Gcs => "gcs",
            StorageBackend::Azure => "azure",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_names() {
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "GCS".parse::<StorageBackend>().unwrap(),
            StorageBackend::Gcs
        );
        assert_eq!(
            "azure".parse::<StorageBackend>().unwrap(),
            StorageBackend::Azure
        );
        assert!("ftp".parse::<StorageBackend>().is_err());
    }
}
