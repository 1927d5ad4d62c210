//! Secure credential handling using the secrecy crate
//!
//! Credentials (the PostgreSQL connection string) are held in `Secret<T>`,
//! which zeroes memory on drop and redacts `Debug` output. The value has to
//! be read explicitly with `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use arcport::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let dsn = secret_string("postgresql://u:p@localhost/arc".to_string());
//! assert!(dsn.expose_secret().starts_with("postgresql://"));
//! println!("{:?}", dsn); // Secret([REDACTED ...])
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for SecretValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
pub type SecretString = Secret<SecretValue>;

/// Create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Replace the credentials of a connection URL with `***`
///
/// Used whenever a connection string has to appear in logs or output.
pub fn redact_credentials(connection_string: &str) -> String {
    match connection_string.rsplit_once('@') {
        Some((prefix, host)) => {
            let scheme = prefix.split_once("://").map(|(s, _)| s).unwrap_or("postgresql");
            format!("{scheme}://***@{host}")
        }
        None => connection_string.to_string(),
    }
}
