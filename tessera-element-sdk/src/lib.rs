//! tessera-element-sdk: SDK for authoring Tessera element plugins
//!
//! Provides the typed package descriptor and scaffolding helpers plugin
//! authors use to produce a `package.json` the host's discoverer accepts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessera_element_sdk::prelude::*;
//!
//! let manifest = ElementManifest::new("acme.gauge-x", "Gauge X", "dist/index.js")
//!     .description("A radial gauge")
//!     .category(ElementCategory::Data)
//!     .icon("Star")
//!     .size(200.0, 100.0);
//!
//! let descriptor = PackageDescriptor::new("@acme/element-gauge-x", "1.0.0", manifest);
//! write_descriptor("elements/gauge-x", &descriptor).unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use tessera_element_api::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{descriptor_json, write_descriptor, PackageDescriptor, SdkError};
    pub use tessera_element_api::{
        ComponentRef, ElementCategory, ElementManifest, ElementSize, LayoutMode,
        ELEMENT_PLUGIN_TYPE, MANIFEST_FIELD, SCHEMA_VERSION,
    };
}

/// Errors that can occur while scaffolding a package
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Failed to serialize package descriptor: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Typed package descriptor for an element package.
///
/// Serializes the manifest under the reserved `tesseraElement` field, the
/// shape the host's discoverer reads back from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,

    #[serde(rename = "tesseraElement")]
    pub element: ElementManifest,
}

impl PackageDescriptor {
    /// Create a descriptor for a manifest
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        element: ElementManifest,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            element,
        }
    }
}

/// Render a descriptor as pretty-printed `package.json` content
pub fn descriptor_json(descriptor: &PackageDescriptor) -> Result<String, SdkError> {
    serde_json::to_string_pretty(descriptor).map_err(SdkError::Serialize)
}

/// Write a descriptor to `<package_dir>/package.json`, creating the
/// directory if needed. Returns the path of the written file.
pub fn write_descriptor(
    package_dir: impl AsRef<Path>,
    descriptor: &PackageDescriptor,
) -> Result<PathBuf, SdkError> {
    let dir = package_dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| SdkError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(DESCRIPTOR_FILE);
    let json = descriptor_json(descriptor)?;
    fs::write(&path, json).map_err(|source| SdkError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
