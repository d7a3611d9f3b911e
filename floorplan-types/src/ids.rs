//! Entity and StateField ids.
//!
//! Fresh ids are UUID v7, so ids minted later sort later. On disk both are
//! plain strings: an entity record is keyed by its `EntityId` and points at
//! its parent by one, and state-backed fields refer to their StateField by
//! `StateId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mints an id that sorts after every id minted before it.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Reads the string form found in dumped records.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id! {
    /// Names one entity within a document.
    ///
    /// Survives dump and load unchanged unless the load remaps ids, as a
    /// paste into the source document does.
    EntityId
}

uuid_id! {
    /// Stable identifier of a StateField.
    ///
    /// Assigned once when the field is created and never changed afterwards;
    /// it is the key under which the field's value is dumped and under which
    /// entity records reference it.
    StateId
}
