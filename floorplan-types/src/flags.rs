//! Entity flags and dirty kinds.
//!
//! Both are bitsets. They serialize as their raw integer bits so dumps stay
//! compact; unknown bits written by newer versions are retained on load.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Per-entity state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u32 {
        const SELECTED = 2;
        /// Marked removed. Removed entities stay in the document so that
        /// undo can resurrect them.
        const REMOVED = 4;
        /// Frozen entities reject field edits.
        const FROZEN = 8;
        const HIDDEN = 16;
        const UNSELECTABLE = 32;
        const EDIT_LIGHT = 64;
        /// Locked entities reject field edits.
        const LOCKED = 128;
    }
}

impl EntityFlags {
    /// Flags that block field edits through requests.
    pub const EDIT_BLOCKING: Self = Self::FROZEN.union(Self::LOCKED);

    /// Returns true if the entity is marked removed.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.contains(Self::REMOVED)
    }
}

impl Serialize for EntityFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for EntityFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

/// What kind of derived data a change invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyKind {
    Display,
    Geometry,
    Material,
    Position,
    Preview,
}

impl fmt::Display for DirtyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Display => "display",
            Self::Geometry => "geometry",
            Self::Material => "material",
            Self::Position => "position",
            Self::Preview => "preview",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// A set of [`DirtyKind`]s pending recomputation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyKinds: u8 {
        const DISPLAY = 1;
        const GEOMETRY = 1 << 1;
        const MATERIAL = 1 << 2;
        const POSITION = 1 << 3;
        const PREVIEW = 1 << 4;
    }
}

impl From<DirtyKind> for DirtyKinds {
    fn from(kind: DirtyKind) -> Self {
        match kind {
            DirtyKind::Display => Self::DISPLAY,
            DirtyKind::Geometry => Self::GEOMETRY,
            DirtyKind::Material => Self::MATERIAL,
            DirtyKind::Position => Self::POSITION,
            DirtyKind::Preview => Self::PREVIEW,
        }
    }
}

impl Serialize for DirtyKinds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for DirtyKinds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_truncate(u8::deserialize(deserializer)?))
    }
}
