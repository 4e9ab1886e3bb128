//! Field descriptors and the registry that orders them

use serde::{Deserialize, Serialize};

/// Primitive kind of a field's input control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Number,
    Date,
    File,
}

/// How a field is rendered and mutated
///
/// Fixed for the lifetime of a descriptor; this is the dispatch tag for
/// the renderer and for `RowStore::set_field`, not a runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// free text/number/date control, written to a plain field
    Input,
    /// numeric control paired with a one-shot fetch trigger
    AutoPost,
    /// read-only display of a formula result
    Calculate,
    /// file selection, stored as a display name
    FileInput,
}

/// One field of the inspection form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// identifier, unique within a well-formed registry
    pub item: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub display_name: String,
    pub component_type: ComponentType,
    #[serde(default)]
    pub required: bool,
    /// arithmetic expression over other items, only for `Calculate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// display grouping flag, irrelevant to evaluation
    #[serde(default, rename = "isInspectionData")]
    pub is_inspection_data: bool,
}

/// The ordered field descriptors of one form
///
/// Loaded once and immutable afterwards; shared by reference between the
/// renderer, the row store and the evaluator.
#[derive(Debug, Clone)]
pub struct Registry {
    fields: Vec<FieldDescriptor>,
}

impl Registry {
    /// Wrap an ordered descriptor list
    ///
    /// Duplicate items are tolerated (malformed configs exist in the
    /// wild): the first definition wins for lookup, the rest are logged.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.item == field.item) {
                tracing::warn!("duplicate descriptor item '{}', first definition wins", field.item);
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// First descriptor named `item`
    pub fn get(&self, item: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.item == item)
    }

    /// Descriptors whose values live in `custom_fields`
    pub fn custom(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| {
            matches!(
                f.component_type,
                ComponentType::AutoPost | ComponentType::Calculate
            )
        })
    }

    /// Descriptors re-evaluated on every row mutation
    pub fn calculated(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| f.component_type == ComponentType::Calculate)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field(item: &str, component_type: ComponentType) -> FieldDescriptor {
        FieldDescriptor {
            item: item.to_string(),
            kind: InputKind::Number,
            display_name: item.to_string(),
            component_type,
            required: false,
            formula: None,
            is_inspection_data: false,
        }
    }

    #[test]
    fn first_definition_wins() {
        let mut snd = field("a", ComponentType::Calculate);
        snd.display_name = "second".to_string();
        let reg = Registry::new(vec![field("a", ComponentType::AutoPost), snd]);
        assert_eq!(reg.get("a").unwrap().component_type, ComponentType::AutoPost);
    }

    #[test]
    fn custom_selects_auto_post_and_calculate() {
        let reg = Registry::new(vec![
            field("lot", ComponentType::Input),
            field("a", ComponentType::AutoPost),
            field("f", ComponentType::Calculate),
            field("doc", ComponentType::FileInput),
        ]);
        let custom: Vec<_> = reg.custom().map(|f| f.item.as_str()).collect();
        assert_eq!(custom, vec!["a", "f"]);
        assert_eq!(reg.calculated().count(), 1);
    }
}
