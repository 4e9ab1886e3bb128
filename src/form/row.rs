//! Row state: creation, mutation, reactive recomputation
//!
//! The store owns every row; the registry is passed in by reference for
//! defaults and formula lookup. Each mutation replaces the addressed row
//! wholesale, then re-evaluates all of its `calculate` fields against a
//! snapshot of the bindings taken before the pass.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::form::descriptor::{ComponentType, Registry};
use crate::formula::{self, Bindings, EvalError};

/// Placeholder measurement assigned by the auto-post trigger
pub const AUTO_POST_VALUE: f64 = 100.0;

/// One independent inspection record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormRow {
    #[serde(rename = "productLot")]
    pub product_lot: String,
    pub inspector: String,
    #[serde(rename = "inspectionDate")]
    pub inspection_date: String,
    /// values of all `auto_post` and `calculate` fields
    pub custom_fields: Bindings,
    /// file display names keyed by their `file_input` item
    #[serde(flatten)]
    pub attachments: BTreeMap<String, String>,
}

/// Address of one field within a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// a top-level field (`productLot`, `inspector`, ..., or a file item)
    Plain(String),
    /// `custom_fields.<id>`
    Custom(String),
}

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        match path.strip_prefix("custom_fields.") {
            Some(item) => Self::Custom(item.to_string()),
            None => Self::Plain(path.to_string()),
        }
    }
}

/// Raw value carried by an edit event
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Numeric reading of the control value; non-numeric text parses to 0
    fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no row at index {0}")]
    NoSuchRow(usize),
    #[error("field '{0}' is computed and cannot be edited")]
    ReadOnly(String),
}

/// A `calculate` field whose formula failed; the previous value was kept
#[derive(Debug)]
pub struct EvalWarning {
    pub row: usize,
    pub item: String,
    pub error: EvalError,
}

/// Owns every row of the form
#[derive(Debug)]
pub struct RowStore {
    rows: Vec<FormRow>,
    warnings: Vec<EvalWarning>,
}

impl RowStore {
    /// A store holding a single default row
    pub fn new(registry: &Registry) -> Self {
        Self {
            rows: vec![Self::create_row(registry)],
            warnings: Vec::new(),
        }
    }

    /// A fresh row: empty strings, today's date, every custom field at 0
    pub fn create_row(registry: &Registry) -> FormRow {
        FormRow {
            product_lot: String::new(),
            inspector: String::new(),
            inspection_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            custom_fields: registry.custom().map(|f| (f.item.clone(), 0.0)).collect(),
            attachments: BTreeMap::new(),
        }
    }

    pub fn append_row(&mut self, registry: &Registry) {
        self.rows.push(Self::create_row(registry));
    }

    pub fn rows(&self) -> &[FormRow] {
        &self.rows
    }

    /// Evaluation warnings from the most recent mutation of each row
    pub fn warnings(&self) -> &[EvalWarning] {
        &self.warnings
    }

    /// Apply one edit event, then re-evaluate every `calculate` field of
    /// the addressed row
    ///
    /// The row is replaced wholesale so observers can detect the change
    /// by identity; other rows are never touched.
    pub fn set_field(
        &mut self,
        registry: &Registry,
        index: usize,
        path: &FieldPath,
        value: FieldValue,
    ) -> Result<(), StoreError> {
        let mut row = self
            .rows
            .get(index)
            .ok_or(StoreError::NoSuchRow(index))?
            .clone();
        match path {
            FieldPath::Custom(item) => {
                let computed = registry
                    .get(item)
                    .map(|f| f.component_type == ComponentType::Calculate)
                    .unwrap_or(false);
                if computed {
                    return Err(StoreError::ReadOnly(item.clone()));
                }
                row.custom_fields.insert(item.clone(), value.as_number());
            }
            FieldPath::Plain(name) => {
                let value = match value {
                    FieldValue::Text(s) => s,
                    FieldValue::Number(n) => n.to_string(),
                };
                match name.as_str() {
                    "productLot" => row.product_lot = value,
                    "inspector" => row.inspector = value,
                    "inspectionDate" => row.inspection_date = value,
                    _ => {
                        row.attachments.insert(name.clone(), value);
                    }
                }
            }
        }
        self.recompute(registry, index, &mut row);
        self.rows[index] = row;
        Ok(())
    }

    /// Fire the auto-post trigger of `item` on row `index`
    pub fn auto_post(
        &mut self,
        registry: &Registry,
        index: usize,
        item: &str,
    ) -> Result<(), StoreError> {
        self.set_field(
            registry,
            index,
            &FieldPath::Custom(item.to_string()),
            FieldValue::Number(AUTO_POST_VALUE),
        )
    }

    // Conservative: every calculate field re-runs on any change of the
    // row, no dependency pruning. Row sizes are single-digit.
    fn recompute(&mut self, registry: &Registry, index: usize, row: &mut FormRow) {
        self.warnings.retain(|w| w.row != index);
        let bindings = row.custom_fields.clone();
        for field in registry.calculated() {
            let formula = match &field.formula {
                Some(f) => f,
                None => continue,
            };
            match formula::evaluate(formula, &bindings) {
                Ok(result) => {
                    row.custom_fields.insert(field.item.clone(), result);
                }
                Err(error) => {
                    // previous value kept
                    tracing::warn!("formula for '{}' failed: {}", field.item, error);
                    self.warnings.push(EvalWarning {
                        row: index,
                        item: field.item.clone(),
                        error,
                    });
                }
            }
        }
    }
}
