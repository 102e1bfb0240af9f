//! The document model.
//!
//! On the wire a document is a flat JSON object. In memory it is a common
//! header (`type`, `_id`, `_rev`, `put_at`) plus a [`DocBody`] whose variant
//! is decided by the type: configurations, messages and schedules have
//! typed bodies, every other type is free-form workflow state. Each body
//! keeps fields it does not know about in an extension map, so decoding
//! and re-encoding a stored document loses nothing.

use std::fmt;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::TypeError;
use crate::keys::{pointer_key, revision_key};
use crate::names::{validate_doc_id, validate_type_name};
use crate::schedule::ScheduleFlavour;

/// A JSON object.
pub type Fields = serde_json::Map<String, Value>;

/// Id of the engine configuration document.
pub const ENGINE_CONFIGURATION_ID: &str = "engine";

const TYPE_FIELD: &str = "type";
const ID_FIELD: &str = "_id";
const REV_FIELD: &str = "_rev";
const PUT_AT_FIELD: &str = "put_at";

/// Logical collection name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocType(String);

impl DocType {
    pub const CONFIGURATIONS: &'static str = "configurations";
    pub const MSGS: &'static str = "msgs";
    pub const SCHEDULES: &'static str = "schedules";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn configurations() -> Self {
        Self::new(Self::CONFIGURATIONS)
    }

    pub fn msgs() -> Self {
        Self::new(Self::MSGS)
    }

    pub fn schedules() -> Self {
        Self::new(Self::SCHEDULES)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unversioned types store the document directly at `type/id` and have
    /// no revision history.
    pub fn is_unversioned(&self) -> bool {
        Self::is_unversioned_name(&self.0)
    }

    pub fn is_unversioned_name(name: &str) -> bool {
        name == Self::MSGS || name == Self::SCHEDULES
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DocType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Engine configuration: arbitrary settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(flatten)]
    pub settings: Fields,
}

/// An in-flight message for the engine's workers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub action: String,
    #[serde(flatten)]
    pub fields: Fields,
}

/// A timer entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub flavour: ScheduleFlavour,
    /// The spec in normalized text form, which [`crate::ScheduleSpec::parse`]
    /// reads back: durations as `1h30m`, instants as RFC 3339.
    pub original: String,
    /// Firing time, formatted by [`crate::timestamp::format_utc`].
    pub at: String,
    /// Reference to the entity that owns the timer.
    pub owner: String,
    /// Message to emit when the timer fires.
    #[serde(default)]
    pub msg: Value,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Type-specific part of a [`Document`].
#[derive(Clone, Debug, PartialEq)]
pub enum DocBody {
    Configuration(Configuration),
    Message(Message),
    Schedule(Schedule),
    /// Workflow state of any other type.
    State(Fields),
}

impl DocBody {
    /// Flatten into one JSON object. Typed fields are inserted after the
    /// extension map, so they win over a same-named extension entry.
    fn to_fields(&self) -> Result<Fields, TypeError> {
        Ok(match self {
            Self::Configuration(c) => c.settings.clone(),
            Self::Message(m) => {
                let mut fields = m.fields.clone();
                fields.insert("action".into(), Value::String(m.action.clone()));
                fields
            }
            Self::Schedule(s) => {
                let flavour = serde_json::to_value(s.flavour)
                    .map_err(|e| TypeError::Serialization(e.to_string()))?;
                let mut fields = s.extra.clone();
                fields.insert("flavour".into(), flavour);
                fields.insert("original".into(), Value::String(s.original.clone()));
                fields.insert("at".into(), Value::String(s.at.clone()));
                fields.insert("owner".into(), Value::String(s.owner.clone()));
                fields.insert("msg".into(), s.msg.clone());
                fields
            }
            Self::State(fields) => fields.clone(),
        })
    }

    fn from_fields(doc_type: &str, fields: Fields) -> Result<Self, TypeError> {
        fn typed<T: serde::de::DeserializeOwned>(fields: Fields) -> Result<T, TypeError> {
            serde_json::from_value(Value::Object(fields))
                .map_err(|e| TypeError::Serialization(e.to_string()))
        }

        Ok(match doc_type {
            DocType::CONFIGURATIONS => Self::Configuration(typed(fields)?),
            DocType::MSGS => Self::Message(typed(fields)?),
            DocType::SCHEDULES => Self::Schedule(typed(fields)?),
            _ => Self::State(fields),
        })
    }
}

/// A stored document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub doc_type: DocType,
    pub id: String,
    /// The revision the holder believes is current. `None` for documents
    /// that were never stored and for unversioned types.
    pub rev: Option<u64>,
    /// Write timestamp, stamped by the store on every write.
    pub put_at: Option<String>,
    pub body: DocBody,
}

impl Document {
    pub fn new(doc_type: impl Into<DocType>, id: impl Into<String>, body: DocBody) -> Self {
        Self {
            doc_type: doc_type.into(),
            id: id.into(),
            rev: None,
            put_at: None,
            body,
        }
    }

    /// Free-form workflow state.
    pub fn state(doc_type: impl Into<DocType>, id: impl Into<String>, fields: Fields) -> Self {
        Self::new(doc_type, id, DocBody::State(fields))
    }

    pub fn with_rev(mut self, rev: u64) -> Self {
        self.rev = Some(rev);
        self
    }

    /// Check that type and id can be used as key segments.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_type_name(self.doc_type.as_str())?;
        validate_doc_id(&self.id)
    }

    /// `type/id`.
    pub fn pointer_key(&self) -> String {
        pointer_key(self.doc_type.as_str(), &self.id)
    }

    /// `type/id/rev`, where an explicit `rev` overrides the document's own
    /// `_rev` (missing `_rev` counts as 0).
    pub fn revision_key(&self, rev: Option<u64>) -> String {
        let rev = rev.or(self.rev).unwrap_or(0);
        revision_key(self.doc_type.as_str(), &self.id, rev)
    }

    /// Look up a body field by name, whether typed or in an extension map.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.body.to_fields().ok()?.remove(name)
    }

    /// Flatten into the wire JSON object.
    pub fn to_fields(&self) -> Result<Fields, TypeError> {
        let mut fields = self.body.to_fields()?;
        fields.insert(TYPE_FIELD.into(), Value::String(self.doc_type.to_string()));
        fields.insert(ID_FIELD.into(), Value::String(self.id.clone()));
        match self.rev {
            Some(rev) => fields.insert(REV_FIELD.into(), Value::from(rev)),
            None => fields.remove(REV_FIELD),
        };
        match &self.put_at {
            Some(put_at) => fields.insert(PUT_AT_FIELD.into(), Value::String(put_at.clone())),
            None => fields.remove(PUT_AT_FIELD),
        };
        Ok(fields)
    }

    /// Rebuild from the wire JSON object.
    pub fn from_fields(mut fields: Fields) -> Result<Self, TypeError> {
        let doc_type = match fields.remove(TYPE_FIELD) {
            Some(Value::String(s)) => DocType::from(s),
            Some(other) => return Err(not_a_string(TYPE_FIELD, &other)),
            None => return Err(TypeError::MissingField(TYPE_FIELD)),
        };
        let id = match fields.remove(ID_FIELD) {
            Some(Value::String(s)) => s,
            Some(other) => return Err(not_a_string(ID_FIELD, &other)),
            None => return Err(TypeError::MissingField(ID_FIELD)),
        };
        let rev = match fields.remove(REV_FIELD) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| TypeError::InvalidField {
                field: REV_FIELD,
                reason: format!("expected a non-negative integer, got {value}"),
            })?),
        };
        let put_at = match fields.remove(PUT_AT_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => return Err(not_a_string(PUT_AT_FIELD, &other)),
        };
        let body = DocBody::from_fields(doc_type.as_str(), fields)?;
        Ok(Self {
            doc_type,
            id,
            rev,
            put_at,
            body,
        })
    }
}

fn not_a_string(field: &'static str, value: &Value) -> TypeError {
    TypeError::InvalidField {
        field,
        reason: format!("expected a string, got {value}"),
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_fields()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Fields::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(D::Error::custom)
    }
}
