//! Form normalization.
//!
//! Turns either intake wire shape into the one canonical `ClientRecord` every
//! downstream step consumes. Normalization never fails: anything it cannot
//! interpret yields empty fields, because a malformed submission still has to
//! be acknowledged to the queue.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::intake::form_schema::{ColumnTarget, FormSchema, SchemaDrift};

/// Decoded payload, discriminated by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawClientData {
    /// Ordered values whose meaning is fixed by position
    Positional(Vec<JsonValue>),
    /// Named fields plus an optional `answers` map
    Keyed(Map<String, JsonValue>),
    /// Neither shape (scalars, null)
    Unrecognized,
}

impl RawClientData {
    /// Classify a decoded payload.
    ///
    /// A bare array, or an object whose `sequence_field` holds an array, is
    /// positional. Any other object is keyed.
    pub fn from_value(value: JsonValue, sequence_field: &str) -> Self {
        match value {
            JsonValue::Array(values) => RawClientData::Positional(values),
            JsonValue::Object(mut map) => match map.remove(sequence_field) {
                Some(JsonValue::Array(values)) => RawClientData::Positional(values),
                Some(other) => {
                    map.insert(sequence_field.to_string(), other);
                    RawClientData::Keyed(map)
                }
                None => RawClientData::Keyed(map),
            },
            _ => RawClientData::Unrecognized,
        }
    }

    pub fn shape(&self) -> FormShape {
        match self {
            RawClientData::Positional(_) => FormShape::Positional,
            RawClientData::Keyed(_) => FormShape::Keyed,
            RawClientData::Unrecognized => FormShape::Unrecognized,
        }
    }
}

/// Which wire shape a submission arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormShape {
    Positional,
    Keyed,
    Unrecognized,
}

/// Canonical client record.
///
/// `name` and `email` are always present, empty when unrecoverable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub timeline: String,
    /// Question key -> answer text
    #[serde(default)]
    pub answers: IndexMap<String, String>,
}

impl ClientRecord {
    /// Something to call the client in logs and reports.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.email.is_empty() {
            &self.email
        } else {
            "Unknown client"
        }
    }
}

/// Normalization result with diagnostics.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub record: ClientRecord,
    pub shape: FormShape,
    /// Mismatches between a positional row and the column table
    pub drift: Vec<SchemaDrift>,
}

/// Maps raw submissions onto `ClientRecord`.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    schema: FormSchema,
}

impl Normalizer {
    pub fn new(schema: FormSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Classify a decoded payload using this normalizer's sequence field.
    pub fn classify(&self, payload: JsonValue) -> RawClientData {
        RawClientData::from_value(payload, &self.schema.sequence_field)
    }

    /// Produce the canonical record. Never fails.
    pub fn normalize(&self, raw: RawClientData) -> ClientRecord {
        self.inspect(raw).record
    }

    /// Produce the canonical record along with shape and drift diagnostics.
    ///
    /// Drift is logged at `warn`; the record is still produced.
    pub fn inspect(&self, raw: RawClientData) -> Normalized {
        let shape = raw.shape();
        match raw {
            RawClientData::Positional(values) => {
                let drift = self.schema.check_drift(&values);
                for d in &drift {
                    tracing::warn!("Positional form does not match schema: {}", d);
                }
                Normalized {
                    record: self.map_positional(&values),
                    shape,
                    drift,
                }
            }
            RawClientData::Keyed(map) => Normalized {
                record: map_keyed(&map),
                shape,
                drift: Vec::new(),
            },
            RawClientData::Unrecognized => {
                tracing::warn!("Unrecognized form payload shape; using empty client record");
                Normalized {
                    record: ClientRecord::default(),
                    shape,
                    drift: Vec::new(),
                }
            }
        }
    }

    fn map_positional(&self, values: &[JsonValue]) -> ClientRecord {
        let mut record = ClientRecord::default();

        for column in &self.schema.columns {
            // Out-of-range columns resolve to empty
            let text = values.get(column.index).map(value_text).unwrap_or_default();
            match column.target() {
                ColumnTarget::Name => record.name = text,
                ColumnTarget::Email => record.email = text,
                ColumnTarget::Phone => record.phone = text,
                ColumnTarget::Timeline => record.timeline = text,
                ColumnTarget::Answer(key) => {
                    record.answers.insert(key, text);
                }
            }
        }

        record
    }
}

fn map_keyed(map: &Map<String, JsonValue>) -> ClientRecord {
    let field = |key: &str| map.get(key).map(value_text).unwrap_or_default();

    let answers = match map.get("answers") {
        Some(JsonValue::Object(answers)) => answers
            .iter()
            .map(|(k, v)| (k.clone(), value_text(v)))
            .collect(),
        _ => IndexMap::new(),
    };

    ClientRecord {
        name: field("name"),
        email: field("email"),
        phone: field("phone"),
        timeline: field("timeline"),
        answers,
    }
}

/// Textual form of a JSON value: strings as-is, null as empty, everything else
/// in its JSON rendering.
pub fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
