use crate::error::ParseError;
use crate::fields::FieldSet;
use std::str::FromStr;

/// Key under which the nested policy stores the encoded persistent fields.
pub const NESTED_FIELDS_KEY: &str = "coreFields";

/// How persistent fields are combined with an entry's own fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Persistent fields first, entry fields over them, metadata last.
    #[default]
    Flat,
    /// Entry fields stay flat; persistent fields are encoded into a single
    /// value under [`NESTED_FIELDS_KEY`].
    Nested,
}

impl FromStr for MergePolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(MergePolicy::Flat),
            "nested" => Ok(MergePolicy::Nested),
            _ => Err(ParseError::new("merge policy", s)),
        }
    }
}

/// Encodes the persistent field block for [`MergePolicy::Nested`].
pub trait FieldsEncoder: Send + Sync {
    fn encode(&self, fields: &FieldSet) -> Result<String, serde_json::Error>;
}

/// Encodes the persistent block as a compact JSON object string.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl FieldsEncoder for JsonEncoder {
    fn encode(&self, fields: &FieldSet) -> Result<String, serde_json::Error> {
        serde_json::to_string(fields)
    }
}
