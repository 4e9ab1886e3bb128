//! Text rendering of the form grid
//!
//! One line per row, one column per descriptor; the component type
//! decides what each cell displays. Computed values are shown exactly as
//! evaluated, so `inf` and `NaN` reach the screen unmodified.

use std::fmt;

use crate::form::descriptor::{ComponentType, FieldDescriptor, Registry};
use crate::form::row::{EvalWarning, FormRow};

pub struct FormView<'d> {
    registry: &'d Registry,
    rows: &'d [FormRow],
    warnings: &'d [EvalWarning],
}

struct BoxFmt {
    width: usize,
    text: String,
}

struct ColFmt {
    width: usize,
    label: BoxFmt,
    boxes: Vec<BoxFmt>,
}

struct GridFmt {
    labels: ColFmt,
    columns: Vec<ColFmt>,
}

impl<'d> FormView<'d> {
    pub fn from(registry: &'d Registry, rows: &'d [FormRow], warnings: &'d [EvalWarning]) -> Self {
        Self {
            registry,
            rows,
            warnings,
        }
    }

    fn label(field: &FieldDescriptor) -> BoxFmt {
        let marker = match field.component_type {
            ComponentType::Input => "",
            ComponentType::AutoPost => " [auto]",
            ComponentType::Calculate => " [calc]",
            ComponentType::FileInput => " [file]",
        };
        BoxFmt::from(format!("{}{}", field.display_name, marker))
    }

    fn cell(field: &FieldDescriptor, row: &FormRow) -> BoxFmt {
        match field.component_type {
            ComponentType::Input => {
                let value = match field.item.as_str() {
                    "productLot" => &row.product_lot,
                    "inspector" => &row.inspector,
                    "inspectionDate" => &row.inspection_date,
                    _ => return BoxFmt::from(String::new()),
                };
                if value.is_empty() && field.required {
                    BoxFmt::from("(required)".to_string())
                } else {
                    BoxFmt::from(value.clone())
                }
            }
            ComponentType::AutoPost | ComponentType::Calculate => {
                BoxFmt::number(row.custom_fields.get(&field.item).copied().unwrap_or(0.0))
            }
            ComponentType::FileInput => {
                BoxFmt::from(row.attachments.get(&field.item).cloned().unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for FormView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols = self
            .registry
            .fields()
            .iter()
            .map(|fd| ColFmt::with_label(Self::label(fd)))
            .collect();
        let mut grid = GridFmt::with_columns(cols);
        for (index, row) in self.rows.iter().enumerate() {
            grid.push_line(
                BoxFmt::from(format!("row {}", index)),
                self.registry
                    .fields()
                    .iter()
                    .map(|fd| Self::cell(fd, row))
                    .collect(),
            );
        }
        write!(f, "{}", grid)?;
        for warn in self.warnings {
            writeln!(f, "! row {} '{}': {}", warn.row, warn.item, warn.error)?;
        }
        Ok(())
    }
}

impl BoxFmt {
    fn from(text: String) -> Self {
        let width = text.chars().count();
        Self { text, width }
    }

    fn number(n: f64) -> Self {
        Self::from(format!("{}", n))
    }
}

impl ColFmt {
    fn with_label(label: BoxFmt) -> Self {
        Self {
            width: label.width,
            label,
            boxes: Vec::new(),
        }
    }

    fn push(&mut self, b: BoxFmt) {
        self.width = self.width.max(b.width);
        self.boxes.push(b);
    }
}

impl GridFmt {
    fn with_columns(columns: Vec<ColFmt>) -> Self {
        Self {
            labels: ColFmt::with_label(BoxFmt::from(String::new())),
            columns,
        }
    }

    fn push_line(&mut self, label: BoxFmt, boxes: Vec<BoxFmt>) {
        assert_eq!(boxes.len(), self.columns.len());
        self.labels.push(label);
        for (col, b) in self.columns.iter_mut().zip(boxes) {
            col.push(b);
        }
    }
}

impl fmt::Display for GridFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {:w$} ", self.labels.label.text, w = self.labels.width)?;
        for col in &self.columns {
            write!(f, "| {:w$} ", col.label.text, w = col.width)?;
        }
        writeln!(f)?;
        write!(f, "-{:-<w$}-", "", w = self.labels.width)?;
        for col in &self.columns {
            write!(f, "+-{:-<w$}-", "", w = col.width)?;
        }
        writeln!(f)?;
        for line in 0..self.labels.boxes.len() {
            write!(f, " {:w$} ", self.labels.boxes[line].text, w = self.labels.width)?;
            for col in &self.columns {
                write!(f, "| {:>w$} ", col.boxes[line].text, w = col.width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::form::row::{FieldPath, FieldValue, RowStore};
    use crate::load;

    #[test]
    fn grid_shows_labels_and_values() {
        let reg = load::builtin();
        let mut store = RowStore::new(&reg);
        store
            .set_field(
                &reg,
                0,
                &FieldPath::parse("custom_fields.inspectionData1"),
                FieldValue::Number(4.0),
            )
            .unwrap();
        store
            .set_field(
                &reg,
                0,
                &FieldPath::parse("custom_fields.inspectionData2"),
                FieldValue::Number(5.0),
            )
            .unwrap();
        let view = format!("{}", FormView::from(&reg, store.rows(), store.warnings()));
        assert!(view.contains("Measurement 1 [auto]"));
        assert!(view.contains("Computed result [calc]"));
        assert!(view.contains("row 0"));
        assert!(view.contains("20"));
        // required inputs left empty are flagged inline
        assert!(view.contains("(required)"));
    }
}
