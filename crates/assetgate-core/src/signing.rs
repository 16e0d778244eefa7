//! First-party capability-URL signing.
//!
//! Issues stateless, short-lived signed URLs for the gateway's own endpoints
//! (notably the browser-facing upload form) from one shared secret, with no
//! session store. The scheme is a fixed HMAC-SHA256 over a canonical request:
//!
//! ```text
//! METHOD \n escapedPath \n canonicalQuery \n host:<effective host> \n \n host \n UNSIGNED-PAYLOAD
//! ```
//!
//! `canonicalQuery` excludes the signature parameter, percent-encodes names
//! and values, and sorts parameters lexicographically. The string to sign is
//! `HMAC-SHA256 \n <date> \n hex(sha256(canonicalRequest))` and the signature
//! is appended as a final query parameter.
//!
//! Verification recomputes the MAC from the date embedded in the query and
//! compares in constant time; the expiry window is checked only after the MAC
//! matches, so tampered and expired URLs are indistinguishable to a client
//! probing before the MAC check. There is no replay protection or revocation
//! beyond expiry.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const ALGORITHM: &str = "HMAC-SHA256";
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub const PARAM_ALGORITHM: &str = "algorithm";
pub const PARAM_DATE: &str = "date";
pub const PARAM_EXPIRES: &str = "expires";
pub const PARAM_SIGNED_HEADERS: &str = "signedheaders";
pub const PARAM_SIGNATURE: &str = "signature";

/// Unreserved characters per RFC 3986; everything else is percent-encoded in
/// canonical query names/values. Slashes in the path are preserved separately.
const ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    /// Envelope malformed or MAC mismatch.
    #[error("invalid signature")]
    InvalidSignature,
    /// MAC verified, but `now` is beyond `date + expires`.
    #[error("expired signature")]
    ExpiredSignature,
}

/// HMAC-SHA256 signer/verifier over one shared secret.
#[derive(Clone)]
pub struct RequestSigner {
    secret: Vec<u8>,
}

impl RequestSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        RequestSigner {
            secret: secret.into(),
        }
    }

    /// Attach a signature envelope to the given query parameters.
    ///
    /// Returns the full query pair list: the caller's parameters, the four
    /// envelope parameters, and the signature appended last.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
        host: &str,
        now: DateTime<Utc>,
        expires_secs: u64,
    ) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = query.to_vec();
        params.push((PARAM_ALGORITHM.into(), ALGORITHM.into()));
        params.push((PARAM_DATE.into(), now.format(DATE_FORMAT).to_string()));
        params.push((PARAM_EXPIRES.into(), expires_secs.to_string()));
        params.push((PARAM_SIGNED_HEADERS.into(), "host".into()));

        let date = now.format(DATE_FORMAT).to_string();
        let signature = self.compute_signature(method, path, &params, host, &date);
        params.push((PARAM_SIGNATURE.into(), signature));
        params
    }

    /// Verify a signature envelope on the given request.
    ///
    /// The MAC is recomputed from the date embedded in the query, not from
    /// wall-clock now; `now` is used only for the expiry check, which runs
    /// strictly after the constant-time MAC comparison.
    pub fn verify(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
        host: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SigningError> {
        let lookup = |name: &str| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let algorithm = lookup(PARAM_ALGORITHM).ok_or(SigningError::InvalidSignature)?;
        if algorithm != ALGORITHM {
            return Err(SigningError::InvalidSignature);
        }
        let date = lookup(PARAM_DATE)
            .ok_or(SigningError::InvalidSignature)?
            .to_string();
        let expires = lookup(PARAM_EXPIRES).ok_or(SigningError::InvalidSignature)?;
        let claimed = lookup(PARAM_SIGNATURE).ok_or(SigningError::InvalidSignature)?;

        let expected = self.compute_signature(method, path, query, host, &date);

        let claimed_bytes = hex::decode(claimed).map_err(|_| SigningError::InvalidSignature)?;
        let expected_bytes = hex::decode(&expected).expect("computed signature is valid hex");
        if claimed_bytes.ct_eq(&expected_bytes).unwrap_u8() != 1 {
            return Err(SigningError::InvalidSignature);
        }

        // Only a URL with a valid MAC gets a distinguishable expiry answer.
        let signed_at = NaiveDateTime::parse_from_str(&date, DATE_FORMAT)
            .map_err(|_| SigningError::InvalidSignature)?
            .and_utc();
        let expires_secs: i64 = expires
            .parse()
            .map_err(|_| SigningError::InvalidSignature)?;
        let deadline = signed_at + ChronoDuration::seconds(expires_secs);
        if now > deadline {
            return Err(SigningError::ExpiredSignature);
        }

        Ok(())
    }

    fn compute_signature(
        &self,
        method: &str,
        path: &str,
        params: &[(String, String)],
        host: &str,
        date: &str,
    ) -> String {
        let canonical = canonical_request(method, path, params, host);
        let hashed = hex::encode(Sha256::digest(canonical.as_bytes()));
        let string_to_sign = format!("{}\n{}\n{}", ALGORITHM, date, hashed);

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC accepts any key size");
        mac.update(string_to_sign.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Build the canonical request byte form the signature is computed over.
fn canonical_request(method: &str, path: &str, params: &[(String, String)], host: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n{}\n{}",
        method,
        escape_path(path),
        canonical_query(params),
        format_args!("host:{}", host),
        "host",
        "UNSIGNED-PAYLOAD"
    )
}

/// Percent-encode each path segment, preserving slashes.
fn escape_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode names and values, drop the signature parameter, and sort
/// lexicographically by encoded name (then value, for deterministic output).
fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .filter(|(name, _)| name != PARAM_SIGNATURE)
        .map(|(name, value)| {
            (
                utf8_percent_encode(name, ENCODE_SET).to_string(),
                utf8_percent_encode(value, ENCODE_SET).to_string(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Host the signature binds to: a trusted forwarded host when present and
/// configured trusted, else the literal Host header.
pub fn effective_host<'a>(
    host: &'a str,
    forwarded_host: Option<&'a str>,
    trust_forwarded_host: bool,
) -> &'a str {
    match forwarded_host {
        Some(forwarded) if trust_forwarded_host && !forwarded.is_empty() => forwarded,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> RequestSigner {
        RequestSigner::new(b"test-secret-test-secret-test-secret!".to_vec())
    }

    fn signed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 24, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_sign_then_verify_succeeds() {
        let params = signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        assert!(signer()
            .verify("POST", "/upload_form", &params, "gateway.test", signed_at())
            .is_ok());
    }

    #[test]
    fn test_signature_is_the_final_parameter() {
        let params = signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        assert_eq!(params.last().unwrap().0, PARAM_SIGNATURE);
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let mut params =
            signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        let sig = &mut params.last_mut().unwrap().1;
        let flipped = if sig.ends_with('0') { "1" } else { "0" };
        sig.truncate(sig.len() - 1);
        sig.push_str(flipped);
        assert_eq!(
            signer().verify("POST", "/upload_form", &params, "gateway.test", signed_at()),
            Err(SigningError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_date_is_invalid() {
        let mut params =
            signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        for (name, value) in params.iter_mut() {
            if name == PARAM_DATE {
                *value = "2024-05-24T12:00:01Z".to_string();
            }
        }
        assert_eq!(
            signer().verify("POST", "/upload_form", &params, "gateway.test", signed_at()),
            Err(SigningError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_path_is_invalid() {
        let params = signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        assert_eq!(
            signer().verify("POST", "/upload_form2", &params, "gateway.test", signed_at()),
            Err(SigningError::InvalidSignature)
        );
    }

    #[test]
    fn test_different_host_is_invalid() {
        let params = signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        assert_eq!(
            signer().verify("POST", "/upload_form", &params, "attacker.test", signed_at()),
            Err(SigningError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_is_reported_as_expired_not_invalid() {
        let params = signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        let later = signed_at() + ChronoDuration::seconds(901);
        assert_eq!(
            signer().verify("POST", "/upload_form", &params, "gateway.test", later),
            Err(SigningError::ExpiredSignature)
        );
    }

    #[test]
    fn test_at_exact_deadline_is_still_valid() {
        let params = signer().sign("POST", "/upload_form", &[], "gateway.test", signed_at(), 900);
        let deadline = signed_at() + ChronoDuration::seconds(900);
        assert!(signer()
            .verify("POST", "/upload_form", &params, "gateway.test", deadline)
            .is_ok());
    }

    #[test]
    fn test_extra_query_parameters_participate_in_signature() {
        let base = vec![("prefix".to_string(), "avatars/".to_string())];
        let params = signer().sign(
            "POST",
            "/upload_form",
            &base,
            "gateway.test",
            signed_at(),
            900,
        );
        // Dropping a signed parameter breaks the MAC.
        let without_prefix: Vec<_> = params
            .iter()
            .filter(|(name, _)| name != "prefix")
            .cloned()
            .collect();
        assert_eq!(
            signer().verify(
                "POST",
                "/upload_form",
                &without_prefix,
                "gateway.test",
                signed_at()
            ),
            Err(SigningError::InvalidSignature)
        );
    }

    #[test]
    fn test_canonical_query_sorts_and_excludes_signature() {
        let params = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
            (PARAM_SIGNATURE.to_string(), "deadbeef".to_string()),
        ];
        assert_eq!(canonical_query(&params), "a=1&b=2");
    }

    #[test]
    fn test_escape_path_preserves_slashes() {
        assert_eq!(escape_path("/a b/c"), "/a%20b/c");
    }

    #[test]
    fn test_effective_host_requires_trust() {
        assert_eq!(
            effective_host("internal:3000", Some("public.test"), true),
            "public.test"
        );
        assert_eq!(
            effective_host("internal:3000", Some("public.test"), false),
            "internal:3000"
        );
        assert_eq!(effective_host("internal:3000", None, true), "internal:3000");
    }
}
