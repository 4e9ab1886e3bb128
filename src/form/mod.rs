//! Form state: field descriptors, row store, submission assembly

pub mod descriptor;
pub mod row;
pub mod submit;
