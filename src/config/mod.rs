//! Application manifest loading and validation

pub mod manifest;
pub mod validation;

pub use manifest::AppManifest;
