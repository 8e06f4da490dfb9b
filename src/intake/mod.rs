//! Client intake normalization.
//!
//! Converts the two intake wire shapes (positional value lists and keyed
//! field maps) into one canonical client record.

pub mod form_schema;
pub mod normalizer;

// Re-export key types
pub use form_schema::{ColumnDef, ColumnTarget, FormSchema, SchemaDrift};
pub use normalizer::{value_text, ClientRecord, FormShape, Normalized, Normalizer, RawClientData};
