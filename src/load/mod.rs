//! Registry acquisition
//!
//! The registry comes either from the builtin static form or from a JSON
//! file holding an array of descriptors
//! (`[{item, type, display_name, component_type, ...}]`). Remote transport
//! is a collaborator's concern: anything able to produce the JSON text can
//! feed `parse_registry`.

use thiserror::Error;

use crate::form::descriptor::{ComponentType, FieldDescriptor, InputKind, Registry};

/// Registry acquisition failed; the form must show a terminal error
/// state, with no partial rendering and no retry
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read registry '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registry '{path}' is not a valid descriptor list: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a JSON array of field descriptors
pub fn parse_registry(contents: &str) -> Result<Registry, serde_json::Error> {
    let fields: Vec<FieldDescriptor> = serde_json::from_str(contents)?;
    Ok(Registry::new(fields))
}

/// Read and parse the registry file at `path`
pub fn read_registry(path: &str) -> Result<Registry, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_registry(&contents).map_err(|source| LoadError::Malformed {
        path: path.to_string(),
        source,
    })
}

/// The static seven-field inspection form shipped as a default
pub fn builtin() -> Registry {
    fn field(
        item: &str,
        kind: InputKind,
        display_name: &str,
        component_type: ComponentType,
    ) -> FieldDescriptor {
        FieldDescriptor {
            item: item.to_string(),
            kind,
            display_name: display_name.to_string(),
            component_type,
            required: true,
            formula: None,
            is_inspection_data: false,
        }
    }
    let mut fields = vec![
        field("productLot", InputKind::Text, "Product lot", ComponentType::Input),
        field("inspector", InputKind::Text, "Inspector", ComponentType::Input),
        field("inspectionDate", InputKind::Date, "Inspection date", ComponentType::Input),
        field("inspectionData1", InputKind::Number, "Measurement 1", ComponentType::AutoPost),
        field("inspectionData2", InputKind::Number, "Measurement 2", ComponentType::AutoPost),
        field("formula", InputKind::Text, "Computed result", ComponentType::Calculate),
        field("inspectionFile", InputKind::File, "Data file", ComponentType::FileInput),
    ];
    fields[3].is_inspection_data = true;
    fields[4].is_inspection_data = true;
    fields[5].formula = Some("inspectionData1 * inspectionData2".to_string());
    Registry::new(fields)
}
