//! # Opaque Identifiers
//!
//! The engine never interprets wallet, NFT, collection, or tenant identifiers
//! beyond equality, ordering, and hashing. They are always caller-supplied
//! strings; the engine must never decode them as blockchain addresses.

use std::fmt;

/// Declares a newtype wrapper around `String` with the common set of traits
/// every opaque identifier needs (equality, ordering, hashing, display).
///
/// Ordering is significant: the Cycle Enumerator's tie-break rule (ascending
/// wallet identifier, then ascending NFT identifier) depends on `Ord` being
/// plain lexicographic string ordering.
macro_rules! opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Builds an identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns whether the identifier is empty (always invalid input).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(TenantId, "Opaque tenant identifier; the unit of data isolation.");
opaque_id!(WalletId, "Tenant-scoped, tenant-opaque wallet identifier.");
opaque_id!(NftId, "Tenant-scoped, tenant-opaque NFT identifier.");
opaque_id!(CollectionId, "Tenant-opaque NFT collection identifier.");
