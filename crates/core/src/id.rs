// SPDX-License-Identifier: MIT

//! String-backed identifier newtypes.
//!
//! Unlike identifiers minted at runtime elsewhere in this ecosystem, a
//! [`PackageId`]/[`JobId`] here is always *given* by configuration (the
//! config file's `id` key, conventionally reused as the worker's `job_id`),
//! never randomly generated. `string_id!` is deliberately simpler than a
//! random-ID generator: it just wraps an owned `String` with the trait
//! impls needed to use the id as a map key or compare against a `&str`.
#[macro_export]
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifies a declared mirror target. Stable across restarts; comes
    /// from the config file's `packages.<id>` key.
    pub struct PackageId;
}

string_id! {
    /// Identifies a worker-tracked job. Conventionally equal to the
    /// [`PackageId`] of the package the job syncs.
    pub struct JobId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
