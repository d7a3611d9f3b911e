//! Field declarations.
//!
//! Every entity class declares its fields as a list of [`FieldSpec`]s, parent
//! class fields first. A spec says where the value lives (a shareable
//! [`StateField`](crate::StateField) or a direct scalar on the entity), what
//! its default is, what values it accepts and what a change to it dirties.

use floorplan_types::DirtyKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Tolerance used by the nearly-equal check on numeric values.
pub const NUMBER_TOLERANCE: f64 = 1e-6;

/// Compares two values, treating numbers within [`NUMBER_TOLERANCE`] as equal.
#[must_use]
pub fn values_nearly_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() <= NUMBER_TOLERANCE,
        _ => a == b,
    }
}

/// Where a field's value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStorage {
    /// In a StateField, dumped by reference and shareable across entities.
    State,
    /// Directly on the entity, dumped inline.
    Scalar,
}

/// Default value of a field, usable in `const` field tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Bool(bool),
    Number(f64),
    Text(&'static str),
}

impl FieldDefault {
    /// Converts the default into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String((*s).to_string()),
        }
    }
}

/// Value constraint checked on set, on create and by `verify`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Anything goes.
    #[default]
    Any,
    /// A finite number.
    Number,
    /// A finite number `>= 0`.
    NonNegative,
    /// A finite number `> 0`.
    Positive,
    /// A finite number within `[min, max]`.
    Range { min: f64, max: f64 },
    Bool,
    Text,
}

impl Constraint {
    /// Checks `value` against the constraint.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value is rejected.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let number = || match value.as_f64() {
            Some(n) if n.is_finite() => Ok(n),
            _ => Err(format!("expected a finite number, got {value}")),
        };
        match *self {
            Self::Any => Ok(()),
            Self::Number => number().map(|_| ()),
            Self::NonNegative => match number()? {
                n if n >= 0.0 => Ok(()),
                n => Err(format!("expected a non-negative number, got {n}")),
            },
            Self::Positive => match number()? {
                n if n > 0.0 => Ok(()),
                n => Err(format!("expected a positive number, got {n}")),
            },
            Self::Range { min, max } => match number()? {
                n if (min..=max).contains(&n) => Ok(()),
                n => Err(format!("expected a number in [{min}, {max}], got {n}")),
            },
            Self::Bool if value.is_boolean() => Ok(()),
            Self::Bool => Err(format!("expected a boolean, got {value}")),
            Self::Text if value.is_string() => Ok(()),
            Self::Text => Err(format!("expected a string, got {value}")),
        }
    }
}

/// Declaration of one field of an entity class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub storage: FieldStorage,
    pub default: FieldDefault,
    pub constraint: Constraint,
    /// What a change to this field dirties on its owner, if anything.
    pub dirties: Option<DirtyKind>,
}

impl FieldSpec {
    /// Declares a StateField-backed field.
    #[must_use]
    pub const fn state(name: &'static str, default: FieldDefault) -> Self {
        Self {
            name,
            storage: FieldStorage::State,
            default,
            constraint: Constraint::Any,
            dirties: None,
        }
    }

    /// Declares a direct scalar field.
    #[must_use]
    pub const fn scalar(name: &'static str, default: FieldDefault) -> Self {
        Self {
            name,
            storage: FieldStorage::Scalar,
            default,
            constraint: Constraint::Any,
            dirties: None,
        }
    }

    /// Sets the value constraint.
    #[must_use]
    pub const fn constrained(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Sets the dirty kind raised on change.
    #[must_use]
    pub const fn dirties(mut self, kind: DirtyKind) -> Self {
        self.dirties = Some(kind);
        self
    }

    /// Returns the default value as JSON.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.default.to_value()
    }

    /// Returns true if the field is StateField-backed.
    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self.storage, FieldStorage::State)
    }
}

/// Typed handle to a field, for reading values without string plumbing.
///
/// ```ignore
/// pub const X_LENGTH: FieldKey<f64> = FieldKey::new("XLength");
/// let x: f64 = doc.get(id, X_LENGTH)?;
/// ```
pub struct FieldKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FieldKey<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for FieldKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldKey<T> {}

impl<T> fmt::Debug for FieldKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldKey").field(&self.name).finish()
    }
}
