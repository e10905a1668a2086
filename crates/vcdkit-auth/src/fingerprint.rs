//! Connection fingerprinting
//!
//! A [`Fingerprint`] is the SHA-256 of every identity-bearing field of a
//! [`ConnectionConfig`], rendered as lowercase hex. It is the session cache
//! key: two configurations share a session iff their fingerprints match.
//!
//! Field order is fixed. Reordering it changes every fingerprint.

use std::fmt;

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use super::config::ConnectionConfig;

/// Separates fields in the hash input. Never part of a real field value.
const FIELD_SEPARATOR: u8 = 0;

/// Length of a rendered fingerprint (SHA-256 as hex)
pub const FINGERPRINT_LEN: usize = 64;

/// Opaque cache key derived from a [`ConnectionConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hex representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, for log lines
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of `config`
///
/// Pure and total. The `insecure` flag participates so that a session built
/// with relaxed TLS is never handed to a caller that asked for verification.
#[must_use]
pub fn fingerprint(config: &ConnectionConfig) -> Fingerprint {
    let insecure = if config.insecure { "true" } else { "false" };
    let fields: [&str; 11] = [
        &config.user,
        config.password.expose_secret(),
        config.token.expose_secret(),
        config.api_token.expose_secret(),
        &config.api_token_file,
        &config.service_account_token_file,
        &config.sys_org,
        &config.org,
        &config.vdc,
        &config.href,
        insecure,
    ];

    let mut hasher = Sha256::new();
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            hasher.update([FIELD_SEPARATOR]);
        }
        hasher.update(field.as_bytes());
    }

    Fingerprint(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};

    fn sample() -> ConnectionConfig {
        ConnectionConfig::builder()
            .user("admin")
            .password("pw")
            .sys_org("system")
            .href("https://host/api")
            .build()
    }

    #[test]
    fn test_fixed_length_lowercase_hex() {
        let fp = fingerprint(&sample());
        assert_eq!(fp.as_str().len(), FINGERPRINT_LEN);
        assert!(
            fp.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert_eq!(fp.short().len(), 12);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(fingerprint(&sample()), fingerprint(&sample()));
        assert_eq!(sample().fingerprint(), fingerprint(&sample()));
    }

    #[test]
    fn test_known_digest_of_empty_config() {
        // Ten separators followed by "false"
        let mut expected_input = vec![FIELD_SEPARATOR; 10];
        expected_input.extend_from_slice(b"false");
        let expected = hex::encode(Sha256::digest(&expected_input));

        assert_eq!(fingerprint(&ConnectionConfig::default()).as_str(), expected);
    }

    #[test]
    fn test_adjacent_fields_do_not_alias() {
        // "ab" + "" must differ from "a" + "b"
        let left = ConnectionConfig {
            user: "ab".into(),
            password: "".into(),
            ..ConnectionConfig::default()
        };
        let right = ConnectionConfig {
            user: "a".into(),
            password: "b".into(),
            ..ConnectionConfig::default()
        };
        assert_ne!(fingerprint(&left), fingerprint(&right));
    }

    #[test]
    fn test_same_value_in_different_fields_differs() {
        let as_token = ConnectionConfig {
            token: "secret".into(),
            ..sample()
        };
        let as_api_token = ConnectionConfig {
            api_token: "secret".into(),
            ..sample()
        };
        assert_ne!(fingerprint(&as_token), fingerprint(&as_api_token));
    }

    #[test]
    fn test_insecure_flag_participates() {
        let strict = sample();
        let relaxed = ConnectionConfig {
            insecure: true,
            ..sample()
        };
        assert_ne!(fingerprint(&strict), fingerprint(&relaxed));
    }
}
