//! Document and view-model layer.
//!
//! # Responsibility
//! - Define the raw `Document` shape read from the document store.
//! - Decode raw documents into the view models dashboard pages render.
//!
//! # Invariants
//! - Every entity keeps the `DocPath` of the document it came from.
//! - Unknown status strings decode to an `Other` variant, never an error.

/// Declares a status enum with a snake_case wire spelling, optional aliases
/// and an `Other` catch-all for values written by older clients.
macro_rules! wire_status {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            /// Parses a stored value, tolerating case, spaces and dashes.
            pub fn parse(raw: &str) -> Self {
                let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                match normalized.as_str() {
                    $($wire $(| $alias)* => Self::$variant,)+
                    _ => Self::Other(raw.trim().to_string()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value.as_str(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::parse(&raw))
            }
        }
    };
}

pub mod booking;
pub mod coupon;
pub mod customer;
pub mod document;
pub mod inventory;
pub mod partner;
pub mod payment;
pub mod review;
pub mod subscription;
pub mod ticket;
