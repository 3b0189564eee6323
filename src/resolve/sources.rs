//! Live data made available to a resolution pass.
//!
//! Everything here is synchronous: asynchronous fetching (saving, options
//! loading, instance data) is the host's concern and must be settled before
//! `resolve` is invoked. Two channels of form data are exposed: the general
//! (possibly debounced) channel used for expression evaluation, and a fresh
//! channel used exclusively for repeating-row counts and row identities, so a
//! growing or shrinking array is never mis-counted while unrelated fields are
//! mid-edit.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;
use uuid::Uuid;

use crate::foundation::binding::DataBinding;

/// Reserved key carrying the synthetic per-row identity on array elements.
pub const ROW_ID_KEY: &str = "__rowId";

/// Named data models, each a JSON tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    models: BTreeMap<String, Value>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_model(&mut self, data_type: impl Into<String>, value: Value) {
        self.models.insert(data_type.into(), value);
    }

    pub fn model(&self, data_type: &str) -> Option<&Value> {
        self.models.get(data_type)
    }

    /// Reads the value at a field path like `Orders.items[2].name`.
    pub fn value_at(&self, data_type: &str, field: &str) -> Option<&Value> {
        let binding = DataBinding::from_str(field).ok()?;
        let mut cur = self.models.get(data_type)?;
        for part in binding.parts() {
            cur = cur.get(&part.base)?;
            if let Some(idx) = part.index {
                cur = cur.get(idx)?;
            }
        }
        Some(cur)
    }

    /// Current length of the array at `field`, or 0 when absent/non-array.
    pub fn row_count(&self, data_type: &str, field: &str) -> usize {
        match self.value_at(data_type, field) {
            Some(Value::Array(rows)) => rows.len(),
            _ => 0,
        }
    }

    /// The synthetic row identity of element `index` in the array at `field`.
    ///
    /// This is the stable per-row key attached by the data layer, not the
    /// index: it survives insertion, removal and reordering of other rows.
    pub fn row_uuid(&self, data_type: &str, field: &str, index: usize) -> Option<String> {
        let rows = self.value_at(data_type, field)?.as_array()?;
        rows.get(index)?
            .get(ROW_ID_KEY)?
            .as_str()
            .map(str::to_owned)
    }

    /// Attaches a fresh uuid under [`ROW_ID_KEY`] to every array element (of
    /// object shape) that does not have one yet, recursively. Idempotent:
    /// existing row ids are never overwritten.
    pub fn ensure_row_ids(&mut self) {
        for model in self.models.values_mut() {
            ensure_row_ids_in(model);
        }
    }
}

fn ensure_row_ids_in(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(obj) = item {
                    obj.entry(ROW_ID_KEY.to_owned())
                        .or_insert_with(|| Value::from(Uuid::new_v4().to_string()));
                }
                ensure_row_ids_in(item);
            }
        }
        Value::Object(obj) => {
            for v in obj.values_mut() {
                ensure_row_ids_in(v);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceContext {
    pub instance_id: String,
    pub instance_owner_party_id: String,
    pub app_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessContext {
    pub task_id: Option<String>,
    pub task_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    pub can_read: bool,
    pub can_write: bool,
    pub can_instantiate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    pub value: String,
    pub label: String,
}

/// Everything a resolution pass may consult.
pub struct DataSources<'a> {
    /// General channel for expression evaluation (possibly debounced).
    pub form_data: &'a FormData,
    /// Fresh channel for row counts and row identities.
    pub fresh_data: &'a FormData,
    /// Data type used by `["dataModel", path]` without an explicit type.
    pub default_data_type: &'a str,
    pub language: &'a str,
    pub text_resources: &'a BTreeMap<String, String>,
    pub instance: Option<&'a InstanceContext>,
    pub process: Option<&'a ProcessContext>,
    pub auth: Option<&'a AuthContext>,
    /// Computed option lists, keyed by option id.
    pub options: &'a BTreeMap<String, Vec<OptionDef>>,
    /// Hidden-state oracle. Visibility may depend on already-resolved
    /// expressions, so the host stages this: the oracle answers from the
    /// previous pass while the current one runs.
    pub hidden_oracle: Option<&'a dyn Fn(&str) -> bool>,
}

impl<'a> DataSources<'a> {
    pub fn new(form_data: &'a FormData, fresh_data: &'a FormData, default_data_type: &'a str) -> Self {
        static EMPTY_TEXTS: BTreeMap<String, String> = BTreeMap::new();
        static EMPTY_OPTIONS: BTreeMap<String, Vec<OptionDef>> = BTreeMap::new();
        Self {
            form_data,
            fresh_data,
            default_data_type,
            language: "nb",
            text_resources: &EMPTY_TEXTS,
            instance: None,
            process: None,
            auth: None,
            options: &EMPTY_OPTIONS,
            hidden_oracle: None,
        }
    }

    pub fn is_hidden(&self, component_id: &str) -> bool {
        self.hidden_oracle.is_some_and(|f| f(component_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn persons() -> FormData {
        let mut fd = FormData::new();
        fd.insert_model(
            "Model",
            json!({
                "Persons": [
                    { "name": "Ada" },
                    { "name": "Brendan" },
                ],
                "title": "hello"
            }),
        );
        fd
    }

    #[test]
    fn value_at_walks_indices() {
        let fd = persons();
        assert_eq!(
            fd.value_at("Model", "Persons[1].name"),
            Some(&json!("Brendan"))
        );
        assert_eq!(fd.value_at("Model", "Persons[2].name"), None);
        assert_eq!(fd.value_at("Other", "Persons"), None);
    }

    #[test]
    fn row_count_is_zero_for_non_arrays() {
        let fd = persons();
        assert_eq!(fd.row_count("Model", "Persons"), 2);
        assert_eq!(fd.row_count("Model", "title"), 0);
        assert_eq!(fd.row_count("Model", "missing"), 0);
    }

    #[test]
    fn ensure_row_ids_is_idempotent() {
        let mut fd = persons();
        fd.ensure_row_ids();
        let first = fd.row_uuid("Model", "Persons", 0).unwrap();
        fd.ensure_row_ids();
        assert_eq!(fd.row_uuid("Model", "Persons", 0).unwrap(), first);
        assert_ne!(first, fd.row_uuid("Model", "Persons", 1).unwrap());
    }

    #[test]
    fn row_uuid_survives_removal_of_earlier_rows() {
        let mut fd = persons();
        fd.ensure_row_ids();
        let second = fd.row_uuid("Model", "Persons", 1).unwrap();

        let rows = fd
            .models
            .get_mut("Model")
            .and_then(|m| m.get_mut("Persons"))
            .and_then(Value::as_array_mut)
            .unwrap();
        rows.remove(0);

        assert_eq!(fd.row_uuid("Model", "Persons", 0).unwrap(), second);
    }
}
