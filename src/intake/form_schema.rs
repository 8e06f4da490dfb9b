//! Positional form schema and drift detection.
//!
//! The legacy intake form delivers answers as a bare list of values whose
//! meaning is fixed by column position. This module holds that column table,
//! loads overrides from YAML, and checks incoming rows for signs that the
//! upstream form's column order has changed.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::intake::normalizer::value_text;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Column order of the upstream intake form.
const DEFAULT_COLUMNS: [(usize, &str); 10] = [
    (0, "submitted_at"),
    (1, "email"),
    (2, "phone"),
    (3, "name"),
    (4, "timeline"),
    (5, "property_type"),
    (6, "rooms"),
    (7, "style"),
    (8, "budget"),
    (9, "notes"),
];

/// Largest column position a schema may map.
pub const MAX_COLUMN_INDEX: usize = 1024;

fn default_sequence_field() -> String {
    "values".to_string()
}

/// Where a column's value lands in the canonical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    Name,
    Email,
    Phone,
    Timeline,
    Answer(String),
}

/// One entry of the positional table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Zero-based position in the value list
    pub index: usize,

    /// `name`, `email`, `phone`, `timeline`, or any other answer key
    pub key: String,
}

impl ColumnDef {
    pub fn new(index: usize, key: impl Into<String>) -> Self {
        Self { index, key: key.into() }
    }

    pub fn target(&self) -> ColumnTarget {
        match self.key.as_str() {
            "name" => ColumnTarget::Name,
            "email" => ColumnTarget::Email,
            "phone" => ColumnTarget::Phone,
            "timeline" => ColumnTarget::Timeline,
            other => ColumnTarget::Answer(other.to_string()),
        }
    }
}

/// Evidence that a positional row does not match the column table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaDrift {
    /// Fewer values than mapped columns
    ShortRow { expected: usize, actual: usize },
    /// More values than mapped columns; extras are ignored
    LongRow { expected: usize, actual: usize },
    /// The email column holds something that is not an email address
    EmailColumnMismatch { index: usize, value: String },
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDrift::ShortRow { expected, actual } => {
                write!(f, "row has {} values, form schema expects {}", actual, expected)
            }
            SchemaDrift::LongRow { expected, actual } => write!(
                f,
                "row has {} values, form schema maps only {}; extra values ignored",
                actual, expected
            ),
            SchemaDrift::EmailColumnMismatch { index, value } => write!(
                f,
                "column {} should hold an email address but contains '{}'",
                index, value
            ),
        }
    }
}

/// Column table for positional intake rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Name of the object field carrying the value list, when the list is
    /// wrapped in an object instead of sent bare.
    #[serde(default = "default_sequence_field")]
    pub sequence_field: String,

    pub columns: Vec<ColumnDef>,
}

impl Default for FormSchema {
    fn default() -> Self {
        Self {
            sequence_field: default_sequence_field(),
            columns: DEFAULT_COLUMNS
                .iter()
                .map(|(index, key)| ColumnDef::new(*index, *key))
                .collect(),
        }
    }
}

impl FormSchema {
    /// Load and validate a schema from a YAML file.
    ///
    /// # Example
    /// ```ignore
    /// use interior_intake::intake::FormSchema;
    ///
    /// let schema = FormSchema::load_from_file("config/form_schema.yaml")?;
    /// println!("Expecting {} values per row", schema.expected_len());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a schema from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Reject tables that would silently misassign fields.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut indices = HashSet::new();
        let mut keys = HashSet::new();

        for column in &self.columns {
            if column.index > MAX_COLUMN_INDEX {
                return Err(SchemaError::IndexOutOfRange {
                    index: column.index,
                    max: MAX_COLUMN_INDEX,
                });
            }
            if !indices.insert(column.index) {
                return Err(SchemaError::DuplicateIndex(column.index));
            }
            if !keys.insert(column.key.as_str()) {
                return Err(SchemaError::DuplicateKey(column.key.clone()));
            }
        }

        for required in ["name", "email"] {
            if !keys.contains(required) {
                return Err(SchemaError::MissingField(required));
            }
        }

        Ok(())
    }

    /// Number of values a complete row carries.
    pub fn expected_len(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.index.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Position of the column bound to `target`, if any.
    pub fn index_of(&self, target: &ColumnTarget) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| &c.target() == target)
            .map(|c| c.index)
    }

    /// Compare a row against the table.
    ///
    /// An empty row is not drift: it is an empty submission and normalizes to
    /// an all-empty record.
    pub fn check_drift(&self, row: &[JsonValue]) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();
        if row.is_empty() {
            return drift;
        }

        let expected = self.expected_len();
        if row.len() < expected {
            drift.push(SchemaDrift::ShortRow { expected, actual: row.len() });
        } else if row.len() > expected {
            drift.push(SchemaDrift::LongRow { expected, actual: row.len() });
        }

        if let Some(index) = self.index_of(&ColumnTarget::Email) {
            let value = row.get(index).map(value_text).unwrap_or_default();
            if !value.is_empty() && !email_regex().is_match(value.trim()) {
                drift.push(SchemaDrift::EmailColumnMismatch { index, value });
            }
        }

        drift
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_default_schema_is_valid() {
        let schema = FormSchema::default();
        schema.validate().unwrap();

        assert_eq!(schema.expected_len(), 10);
        assert_eq!(schema.index_of(&ColumnTarget::Name), Some(3));
        assert_eq!(schema.index_of(&ColumnTarget::Email), Some(1));
        assert_eq!(schema.index_of(&ColumnTarget::Phone), Some(2));
        assert_eq!(schema.sequence_field, "values");
    }

    #[test]
    fn test_column_targets() {
        assert_eq!(ColumnDef::new(0, "name").target(), ColumnTarget::Name);
        assert_eq!(ColumnDef::new(0, "timeline").target(), ColumnTarget::Timeline);
        assert_eq!(
            ColumnDef::new(0, "style").target(),
            ColumnTarget::Answer("style".to_string())
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "sequence_field: row\ncolumns:\n  - {{index: 0, key: name}}\n  - {{index: 1, key: email}}\n  - {{index: 4, key: budget}}"
        )
        .unwrap();

        let schema = FormSchema::load_from_file(file.path()).unwrap();

        assert_eq!(schema.sequence_field, "row");
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.expected_len(), 5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = FormSchema::load_from_file("/nonexistent/form_schema.yaml").unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }

    #[test]
    fn test_sequence_field_defaults() {
        let schema =
            FormSchema::from_yaml_str("columns:\n  - {index: 0, key: name}\n  - {index: 1, key: email}")
                .unwrap();
        assert_eq!(schema.sequence_field, "values");
    }

    #[test]
    fn test_validate_rejects_inconsistent_tables() {
        let dup_index = "columns:\n  - {index: 0, key: name}\n  - {index: 0, key: email}";
        assert!(matches!(
            FormSchema::from_yaml_str(dup_index).unwrap_err(),
            SchemaError::DuplicateIndex(0)
        ));

        let dup_key = "columns:\n  - {index: 0, key: name}\n  - {index: 1, key: name}";
        assert!(matches!(
            FormSchema::from_yaml_str(dup_key).unwrap_err(),
            SchemaError::DuplicateKey(_)
        ));

        let no_email = "columns:\n  - {index: 0, key: name}";
        assert!(matches!(
            FormSchema::from_yaml_str(no_email).unwrap_err(),
            SchemaError::MissingField("email")
        ));

        assert!(matches!(
            FormSchema::from_yaml_str("columns: [").unwrap_err(),
            SchemaError::Parse(_)
        ));
    }

    #[test]
    fn test_validate_rejects_huge_index() {
        let huge = "columns:\n  - {index: 18446744073709551615, key: name}\n  - {index: 1, key: email}";
        assert!(matches!(
            FormSchema::from_yaml_str(huge).unwrap_err(),
            SchemaError::IndexOutOfRange { index: usize::MAX, max: MAX_COLUMN_INDEX }
        ));

        let unchecked = FormSchema {
            sequence_field: "values".to_string(),
            columns: vec![ColumnDef::new(usize::MAX, "name")],
        };
        assert_eq!(unchecked.expected_len(), usize::MAX);
    }

    #[test]
    fn test_check_drift_full_row_is_clean() {
        let schema = FormSchema::default();
        let row = vec![
            json!("2024-05-01 10:00"),
            json!("anna@example.com"),
            json!("+48 600 100 200"),
            json!("Anna Kowalska"),
            json!("3-6 months"),
            json!("apartment"),
            json!(3),
            json!("scandinavian"),
            json!("$10,000-15,000"),
            json!(""),
        ];
        assert!(schema.check_drift(&row).is_empty());
    }

    #[test]
    fn test_check_drift_reports_short_row() {
        let schema = FormSchema::default();
        let row = vec![json!("ts"), json!("anna@example.com")];
        assert_eq!(
            schema.check_drift(&row),
            vec![SchemaDrift::ShortRow { expected: 10, actual: 2 }]
        );
    }

    #[test]
    fn test_check_drift_reports_shifted_email_column() {
        let schema = FormSchema::default();
        // Upstream inserted a column before email
        let mut row: Vec<JsonValue> = vec![json!("ts"), json!("Yes"), json!("anna@example.com")];
        row.extend((0..8).map(|_| json!("")));

        let drift = schema.check_drift(&row);
        assert!(drift.contains(&SchemaDrift::LongRow { expected: 10, actual: 11 }));
        assert!(drift.contains(&SchemaDrift::EmailColumnMismatch {
            index: 1,
            value: "Yes".to_string()
        }));
    }

    #[test]
    fn test_check_drift_empty_row() {
        assert!(FormSchema::default().check_drift(&[]).is_empty());
    }
}
