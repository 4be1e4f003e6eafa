//! Macros for reducing boilerplate in identifier types.
//!
//! Provides `name_type!`, which defines a string newtype with the ordering,
//! hashing, serde and borrowing behaviour shared by every identifier stored in
//! a snapshot.
//!
//! # Examples
//!
//! ```rust
//! use tracker_index::name_type;
//!
//! name_type! {
//!     /// Example identifier
//!     pub struct RegionName;
//! }
//!
//! let region = RegionName::from("Forest");
//! assert_eq!(region.as_str(), "Forest");
//! ```
//!
//! `Borrow<str>` is implemented so maps keyed by the newtype can be queried
//! with a plain `&str`.

/// Defines a string identifier newtype used as a snapshot key.
#[macro_export]
macro_rules! name_type {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            /// Creates the identifier from any string-like value.
            #[must_use]
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrows the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}
