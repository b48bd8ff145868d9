//! Serialized interface records
//!
//! The immutable input an [`InterfaceDescriptor`](crate::InterfaceDescriptor)
//! is constructed from. Identity strings are kept raw here and parsed at
//! construction time.

use schem_asset::PointerRef;
use schem_core::{Error, NameHash, Result};
use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueType};

/// One declared property of an interface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    /// Precomputed name hash
    pub id: NameHash,
    pub name: String,
    /// Inline textual value; empty when unset
    #[serde(default)]
    pub value: String,
    /// Pointer reference; takes precedence over `value` when not null
    #[serde(default)]
    pub value_ref: PointerRef<Value>,
    /// Declared type, used to coerce textual writes
    #[serde(default)]
    pub value_type: ValueType,
}

impl DataField {
    /// Field with a name hashed from `name` and no value
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            id: NameHash::from_name(name),
            name: name.to_string(),
            value: String::new(),
            value_ref: PointerRef::Null,
            value_type,
        }
    }

    /// Set the inline textual value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the pointer reference
    pub fn with_ref(mut self, value_ref: PointerRef<Value>) -> Self {
        self.value_ref = value_ref;
        self
    }
}

/// One declared event of an interface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicEvent {
    pub id: NameHash,
    #[serde(default)]
    pub name: String,
}

impl DynamicEvent {
    pub fn new(name: &str) -> Self {
        Self {
            id: NameHash::from_name(name),
            name: name.to_string(),
        }
    }
}

/// One declared link of an interface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicLink {
    pub id: NameHash,
    #[serde(default)]
    pub name: String,
}

impl DynamicLink {
    pub fn new(name: &str) -> Self {
        Self {
            id: NameHash::from_name(name),
            name: name.to_string(),
        }
    }
}

/// Serialized interface descriptor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceDescriptorData {
    /// Instance guid, unparsed
    pub instance_guid: String,
    pub fields: Vec<DataField>,
    pub input_events: Vec<DynamicEvent>,
    pub output_events: Vec<DynamicEvent>,
    pub input_links: Vec<DynamicLink>,
    pub output_links: Vec<DynamicLink>,
}

impl InterfaceDescriptorData {
    /// Empty record with the given instance guid
    pub fn new(instance_guid: impl Into<String>) -> Self {
        Self {
            instance_guid: instance_guid.into(),
            ..Default::default()
        }
    }

    /// Parse a record from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Message(format!("Invalid interface record: {}", e)))
    }

    /// Find a field by hash
    pub fn field(&self, id: NameHash) -> Option<&DataField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn with_field(mut self, field: DataField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_input_event(mut self, name: &str) -> Self {
        self.input_events.push(DynamicEvent::new(name));
        self
    }

    pub fn with_output_event(mut self, name: &str) -> Self {
        self.output_events.push(DynamicEvent::new(name));
        self
    }

    pub fn with_input_link(mut self, name: &str) -> Self {
        self.input_links.push(DynamicLink::new(name));
        self
    }

    pub fn with_output_link(mut self, name: &str) -> Self {
        self.output_links.push(DynamicLink::new(name));
        self
    }
}
