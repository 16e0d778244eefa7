//! Per-backend header translation.
//!
//! Each provider stores caller-supplied CORS (and, for Azure and GCS,
//! content-disposition) headers in its proprietary metadata namespace. The
//! tables are identical in shape and differ only in the namespace prefix.
//! They are process-wide read-only constants with no lifecycle beyond start.

use std::collections::HashMap;

use assetgate_core::models::presign::HeaderField;
use assetgate_core::AccessType;

use crate::traits::{StorageError, StorageResult};

/// Metadata key carrying the access type, within the provider namespace.
const ACCESS_METADATA_KEY: &str = "access";

/// Standard headers every provider signs or stores through dedicated fields
/// rather than generic metadata.
const DEDICATED_CONTENT_HEADERS: &[&str] = &[
    "cache-control",
    "content-disposition",
    "content-encoding",
    "content-length",
    "content-md5",
    "content-type",
];

/// Standard names rewritten into every provider's metadata namespace.
const COMMON_MAPPED_HEADERS: &[&str] = &[
    "access-control-allow-origin",
    "access-control-expose-headers",
    "access-control-max-age",
    "access-control-allow-credentials",
    "access-control-allow-methods",
    "access-control-allow-headers",
];

/// Static bidirectional name-rewrite table between standard headers and one
/// provider's proprietary metadata-header names. Lookup is case-insensitive;
/// output names are canonical lowercase; unmapped names pass through.
#[derive(Debug, Clone)]
pub struct HeaderTranslator {
    meta_prefix: &'static str,
    mapped: Vec<&'static str>,
}

impl HeaderTranslator {
    pub fn s3() -> Self {
        HeaderTranslator {
            meta_prefix: "x-amz-meta-",
            mapped: COMMON_MAPPED_HEADERS.to_vec(),
        }
    }

    pub fn gcs() -> Self {
        let mut mapped = COMMON_MAPPED_HEADERS.to_vec();
        mapped.push("content-disposition");
        HeaderTranslator {
            meta_prefix: "x-goog-meta-",
            mapped,
        }
    }

    pub fn azure() -> Self {
        let mut mapped = COMMON_MAPPED_HEADERS.to_vec();
        mapped.push("content-disposition");
        HeaderTranslator {
            meta_prefix: "x-ms-meta-",
            mapped,
        }
    }

    pub fn meta_prefix(&self) -> &'static str {
        self.meta_prefix
    }

    /// Proprietary header name carrying the access type.
    pub fn access_type_header(&self) -> String {
        format!("{}{}", self.meta_prefix, ACCESS_METADATA_KEY)
    }

    fn mapped_standard_name(&self, name: &str) -> Option<&'static str> {
        self.mapped
            .iter()
            .find(|mapped| mapped.eq_ignore_ascii_case(name))
            .copied()
    }

    /// Apply the table in the standard-to-proprietary direction.
    /// Pure function of its input; unmapped names pass through unchanged.
    pub fn standard_to_proprietary(
        &self,
        headers: HashMap<String, String>,
    ) -> HashMap<String, String> {
        headers
            .into_iter()
            .map(|(name, value)| match self.mapped_standard_name(&name) {
                Some(standard) => (format!("{}{}", self.meta_prefix, standard), value),
                None => (name, value),
            })
            .collect()
    }

    /// Apply the table in the proprietary-to-standard direction.
    pub fn proprietary_to_standard(
        &self,
        headers: HashMap<String, String>,
    ) -> HashMap<String, String> {
        headers
            .into_iter()
            .map(|(name, value)| {
                let lowered = name.to_ascii_lowercase();
                match lowered
                    .strip_prefix(self.meta_prefix)
                    .and_then(|rest| self.mapped_standard_name(rest))
                {
                    Some(standard) => (standard.to_string(), value),
                    None => (name, value),
                }
            })
            .collect()
    }

    /// Read the access type from provider response headers; default private.
    pub fn read_access_type(&self, headers: &HashMap<String, String>) -> AccessType {
        let wanted = self.access_type_header();
        let value = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&wanted))
            .map(|(_, value)| value.as_str());
        AccessType::from_metadata_value(value)
    }

    /// Assemble the exact ordered header list a presigned PUT must carry.
    ///
    /// Dedicated content headers stay standard (the provider signs or stores
    /// them out-of-band), table-mapped headers move into the metadata
    /// namespace, any other header becomes generic object metadata, and the
    /// access type is injected as one additional metadata header. The output
    /// is sorted by name so the contract is deterministic.
    pub fn put_headers(
        &self,
        access: AccessType,
        headers: &HashMap<String, String>,
    ) -> StorageResult<Vec<HeaderField>> {
        let mut fields = Vec::with_capacity(headers.len() + 1);

        for (name, value) in headers {
            let lowered = name.to_ascii_lowercase();
            if lowered == "content-length" && value.parse::<u64>().is_err() {
                return Err(StorageError::InvalidHeader(format!(
                    "content-length is not numeric: {:?}",
                    value
                )));
            }

            let output_name = if let Some(standard) = self.mapped_standard_name(&lowered) {
                format!("{}{}", self.meta_prefix, standard)
            } else if DEDICATED_CONTENT_HEADERS.contains(&lowered.as_str()) {
                lowered
            } else {
                // Unrecognized, unconsumed headers become generic metadata.
                format!("{}{}", self.meta_prefix, lowered)
            };

            fields.push(HeaderField {
                name: output_name,
                value: value.clone(),
            });
        }

        fields.push(HeaderField {
            name: self.access_type_header(),
            value: access.as_str().to_string(),
        });

        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_round_trip_preserves_mapped_header() {
        let translator = HeaderTranslator::azure();
        let input = headers(&[
            ("Content-Disposition", "attachment"),
            ("Content-Type", "image/png"),
            ("X-Unrelated", "keep"),
        ]);
        let proprietary = translator.standard_to_proprietary(input);
        assert_eq!(
            proprietary.get("x-ms-meta-content-disposition").unwrap(),
            "attachment"
        );
        // Content-Type is not in the Azure table and passes through unchanged.
        assert_eq!(proprietary.get("Content-Type").unwrap(), "image/png");

        let standard = translator.proprietary_to_standard(proprietary);
        assert_eq!(standard.get("content-disposition").unwrap(), "attachment");
        assert_eq!(standard.get("Content-Type").unwrap(), "image/png");
        assert_eq!(standard.get("X-Unrelated").unwrap(), "keep");
    }

    #[test]
    fn test_s3_table_leaves_content_disposition_alone() {
        let translator = HeaderTranslator::s3();
        let proprietary =
            translator.standard_to_proprietary(headers(&[("content-disposition", "inline")]));
        assert_eq!(proprietary.get("content-disposition").unwrap(), "inline");
    }

    #[test]
    fn test_translation_is_pure_and_repeatable() {
        let translator = HeaderTranslator::gcs();
        let input = headers(&[
            ("access-control-allow-origin", "*"),
            ("x-custom", "v"),
        ]);
        let first = translator.standard_to_proprietary(input.clone());
        let second = translator.standard_to_proprietary(input);
        assert_eq!(first, second);
        assert_eq!(
            first.get("x-goog-meta-access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn test_put_headers_injects_access_and_routes_namespaces() {
        let translator = HeaderTranslator::s3();
        let input = headers(&[
            ("Content-Type", "image/png"),
            ("content-length", "1024"),
            ("access-control-allow-origin", "*"),
            ("x-app-purpose", "avatar"),
        ]);
        let fields = translator
            .put_headers(AccessType::Private, &input)
            .unwrap();

        let get = |name: &str| {
            fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.value.as_str())
        };
        assert_eq!(get("content-type"), Some("image/png"));
        assert_eq!(get("content-length"), Some("1024"));
        assert_eq!(get("x-amz-meta-access-control-allow-origin"), Some("*"));
        assert_eq!(get("x-amz-meta-x-app-purpose"), Some("avatar"));
        assert_eq!(get("x-amz-meta-access"), Some("private"));
    }

    #[test]
    fn test_put_headers_rejects_non_numeric_content_length() {
        let translator = HeaderTranslator::s3();
        let input = headers(&[("content-length", "lots")]);
        assert!(matches!(
            translator.put_headers(AccessType::Public, &input),
            Err(StorageError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_read_access_type_defaults_private() {
        let translator = HeaderTranslator::gcs();
        assert_eq!(
            translator.read_access_type(&headers(&[("x-goog-meta-access", "public")])),
            AccessType::Public
        );
        assert_eq!(
            translator.read_access_type(&headers(&[("x-goog-meta-access", "sorta")])),
            AccessType::Private
        );
        assert_eq!(
            translator.read_access_type(&headers(&[])),
            AccessType::Private
        );
    }
}
