//! Final payload assembly and required-field validation
//!
//! No network call here: the assembled records are handed back as JSON
//! values for whatever collaborator posts them.

use serde_json::Value;
use thiserror::Error;

use crate::form::descriptor::{ComponentType, Registry};
use crate::form::row::FormRow;

/// A required `input` field left empty, blocking submission
#[derive(Debug, Error, PartialEq, Eq)]
#[error("row {row}: required field '{item}' is empty")]
pub struct ValidationError {
    pub row: usize,
    pub item: String,
}

/// Check every required `input` field of every row
///
/// All failures are returned together so they can be surfaced inline
/// per field rather than one at a time.
pub fn validate(registry: &Registry, rows: &[FormRow]) -> Vec<ValidationError> {
    let mut errs = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        for field in registry.fields() {
            if field.component_type != ComponentType::Input || !field.required {
                continue;
            }
            let value = match field.item.as_str() {
                "productLot" => &row.product_lot,
                "inspector" => &row.inspector,
                "inspectionDate" => &row.inspection_date,
                _ => continue,
            };
            if value.is_empty() {
                errs.push(ValidationError {
                    row: index,
                    item: field.item.clone(),
                });
            }
        }
    }
    errs
}

/// Serialize all rows into submission records, raw inputs and computed
/// results together
pub fn assemble(registry: &Registry, rows: &[FormRow]) -> Result<Vec<Value>, Vec<ValidationError>> {
    let errs = validate(registry, rows);
    if !errs.is_empty() {
        return Err(errs);
    }
    Ok(rows
        .iter()
        .map(|row| serde_json::to_value(row).unwrap_or_else(|e| panic!("row serialization: {}", e)))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::form::descriptor::{FieldDescriptor, InputKind};
    use crate::form::row::{FieldPath, FieldValue, RowStore};

    fn registry() -> Registry {
        let mut lot = field("productLot", ComponentType::Input, None);
        lot.required = true;
        Registry::new(vec![
            lot,
            field("custom_field1", ComponentType::AutoPost, None),
            field("custom_field2", ComponentType::AutoPost, None),
            field(
                "formula",
                ComponentType::Calculate,
                Some("custom_field1 * custom_field2"),
            ),
            field("doc", ComponentType::FileInput, None),
        ])
    }

    fn field(item: &str, component_type: ComponentType, formula: Option<&str>) -> FieldDescriptor {
        FieldDescriptor {
            item: item.to_string(),
            kind: InputKind::Number,
            display_name: item.to_string(),
            component_type,
            required: false,
            formula: formula.map(str::to_string),
            is_inspection_data: false,
        }
    }

    fn set(store: &mut RowStore, reg: &Registry, path: &str, value: FieldValue) {
        store
            .set_field(reg, 0, &FieldPath::parse(path), value)
            .unwrap();
    }

    #[test]
    fn assembled_record_holds_raw_and_computed() {
        let reg = registry();
        let mut store = RowStore::new(&reg);
        set(&mut store, &reg, "productLot", FieldValue::Text("L1".to_string()));
        set(&mut store, &reg, "custom_fields.custom_field1", FieldValue::Number(4.0));
        set(&mut store, &reg, "custom_fields.custom_field2", FieldValue::Number(5.0));
        set(&mut store, &reg, "doc", FieldValue::Text("scan.csv".to_string()));

        let records = assemble(&reg, store.rows()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["productLot"], "L1");
        assert_eq!(records[0]["custom_fields"]["custom_field1"], 4.0);
        assert_eq!(records[0]["custom_fields"]["formula"], 20.0);
        // attachments are flattened to the plain field path
        assert_eq!(records[0]["doc"], "scan.csv");
    }

    #[test]
    fn empty_required_field_blocks_submission() {
        let reg = registry();
        let mut store = RowStore::new(&reg);
        store.append_row(&reg);
        store
            .set_field(
                &reg,
                0,
                &FieldPath::parse("productLot"),
                FieldValue::Text("L1".to_string()),
            )
            .unwrap();

        let errs = assemble(&reg, store.rows()).unwrap_err();
        assert_eq!(
            errs,
            vec![ValidationError {
                row: 1,
                item: "productLot".to_string()
            }]
        );
    }
}
