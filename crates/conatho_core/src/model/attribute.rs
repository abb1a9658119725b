//! Attribute type system.
//!
//! # Responsibility
//! - Define the closed datatype set (`Number`, `String`, `Data`).
//! - Model attribute values as an explicit sum type instead of three
//!   mutually exclusive nullable columns.
//!
//! # Invariants
//! - An attribute holds at most one value and its shape matches the
//!   declared datatype of its type.
//! - Attribute types are immutable once created.

use crate::model::entity::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned attribute type identifier.
pub type AttributeTypeId = i64;

/// Store-assigned attribute identifier.
pub type AttributeId = i64;

/// Closed set of attribute datatypes. Discriminants are the stored tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datatype {
    /// 64-bit signed integer.
    Number,
    /// UTF-8 text.
    String,
    /// Raw bytes.
    Data,
}

impl Datatype {
    pub fn to_db(self) -> i64 {
        match self {
            Self::Number => 0,
            Self::String => 1,
            Self::Data => 2,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Number),
            1 => Some(Self::String),
            2 => Some(Self::Data),
            _ => None,
        }
    }
}

impl Display for Datatype {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Data => "data",
        };
        f.write_str(label)
    }
}

/// Document-wide attribute key definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeType {
    pub id: AttributeTypeId,
    /// Not unique; two types may share a name.
    pub name: String,
    pub datatype: Datatype,
}

/// Attribute payload, tagged by shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Number(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl AttributeValue {
    /// Datatype this value shape belongs to.
    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Number(_) => Datatype::Number,
            Self::Text(_) => Datatype::String,
            Self::Bytes(_) => Datatype::Data,
        }
    }

    /// Zero value for a datatype, used when an attribute was never populated.
    pub fn zero(datatype: Datatype) -> Self {
        match datatype {
            Datatype::Number => Self::Number(0),
            Datatype::String => Self::Text(String::new()),
            Datatype::Data => Self::Bytes(Vec::new()),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Attribute read model: one attribute row joined with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub entity: EntityId,
    pub type_id: AttributeTypeId,
    /// Name of the attribute type.
    pub name: String,
    pub datatype: Datatype,
    /// `None` until the attribute is first populated.
    pub value: Option<AttributeValue>,
}

impl Attribute {
    /// Current value, or the datatype's zero value when unset.
    pub fn value_or_zero(&self) -> AttributeValue {
        self.value
            .clone()
            .unwrap_or_else(|| AttributeValue::zero(self.datatype))
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeValue, Datatype};

    #[test]
    fn datatype_tags_are_stable() {
        for datatype in [Datatype::Number, Datatype::String, Datatype::Data] {
            assert_eq!(Datatype::from_db(datatype.to_db()), Some(datatype));
        }
        assert_eq!(Datatype::Number.to_db(), 0);
        assert_eq!(Datatype::Data.to_db(), 2);
        assert_eq!(Datatype::from_db(7), None);
    }

    #[test]
    fn value_shape_maps_to_datatype() {
        assert_eq!(AttributeValue::from(42i64).datatype(), Datatype::Number);
        assert_eq!(AttributeValue::from("x").datatype(), Datatype::String);
        assert_eq!(AttributeValue::from(vec![1u8]).datatype(), Datatype::Data);
        assert_eq!(
            AttributeValue::zero(Datatype::String),
            AttributeValue::Text(String::new())
        );
    }
}
