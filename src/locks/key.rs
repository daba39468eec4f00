//! Resource keys and the per-request options that carry them.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Identifier of a remote resource whose mutating calls must not overlap.
///
/// The value is opaque (a store ID, a certificate ID, ...). Only emptiness is
/// rejected.
///
/// # Example
///
/// ```rust
/// use api_client::ResourceKey;
///
/// let key = ResourceKey::new("store-7Hk2").unwrap();
/// assert_eq!(key.as_ref(), "store-7Hk2");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Creates a new resource key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyResourceKey`] if `key` is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyResourceKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ResourceKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// Per-request options passed down to the transport.
///
/// A request that mutates a named remote resource attaches the resource's key
/// here. The transport serializes mutating requests that carry the same key
/// and leaves everything else unserialized.
///
/// Options are built once and then only read; attaching a key returns a new
/// value.
///
/// # Example
///
/// ```rust
/// use api_client::{RequestOptions, ResourceKey};
///
/// let base = RequestOptions::new();
/// let keyed = base.clone().with_resource_key(ResourceKey::new("cert-42").unwrap());
///
/// assert!(base.resource_key().is_none());
/// assert_eq!(keyed.resource_key().map(AsRef::as_ref), Some("cert-42"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    resource_key: Option<ResourceKey>,
}

impl RequestOptions {
    /// Creates options with no resource key attached.
    #[must_use]
    pub const fn new() -> Self {
        Self { resource_key: None }
    }

    /// Returns these options with `key` attached.
    #[must_use]
    pub fn with_resource_key(self, key: ResourceKey) -> Self {
        Self {
            resource_key: Some(key),
        }
    }

    /// Returns the attached resource key, if any.
    #[must_use]
    pub const fn resource_key(&self) -> Option<&ResourceKey> {
        self.resource_key.as_ref()
    }
}

impl From<ResourceKey> for RequestOptions {
    fn from(key: ResourceKey) -> Self {
        Self::new().with_resource_key(key)
    }
}
