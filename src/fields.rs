use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::field::{Field, Visit};

/// Flat mapping from field name to a structured value.
pub type FieldSet = BTreeMap<String, Value>;

/// Persistent fields attached to a reporting core.
///
/// Fields are only ever added or overwritten; the last value merged for a
/// name wins. Readers and writers may race from any thread.
#[derive(Debug, Default)]
pub struct FieldAccumulator {
    fields: RwLock<FieldSet>,
}

impl FieldAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `incoming` into the stored set, overwriting existing names.
    pub fn merge<I, K>(&self, incoming: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut fields = self.fields.write();
        for (name, value) in incoming {
            fields.insert(name.into(), value);
        }
    }

    /// Owned copy of the current contents.
    pub fn snapshot(&self) -> FieldSet {
        self.fields.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }
}

/// Records `tracing` fields into a [`FieldSet`].
///
/// When built with [`FieldVisitor::with_message`] the implicit `message`
/// field is captured separately instead of being stored as a field.
pub struct FieldVisitor<'a> {
    fields: &'a mut FieldSet,
    message: Option<&'a mut Option<String>>,
}

impl<'a> FieldVisitor<'a> {
    pub fn new(fields: &'a mut FieldSet) -> Self {
        FieldVisitor { fields, message: None }
    }

    pub fn with_message(fields: &'a mut FieldSet, message: &'a mut Option<String>) -> Self {
        FieldVisitor {
            fields,
            message: Some(message),
        }
    }

    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }

    fn capture_message(&mut self, field: &Field, text: impl FnOnce() -> String) -> bool {
        match &mut self.message {
            Some(message) if field.name() == "message" => {
                **message = Some(text());
                true
            }
            _ => false,
        }
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if !self.capture_message(field, || value.to_string()) {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    // Values outside the 64-bit range keep their digits as a string.
    fn record_i128(&mut self, field: &Field, value: i128) {
        let value = i64::try_from(value).map_or_else(|_| Value::String(value.to_string()), Value::from);
        self.insert(field, value);
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        let value = u64::try_from(value).map_or_else(|_| Value::String(value.to_string()), Value::from);
        self.insert(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        // Formatted messages (`info!("x = {}", x)`) arrive here.
        if !self.capture_message(field, || format!("{:?}", value)) {
            self.insert(field, Value::String(format!("{:?}", value)));
        }
    }
}
