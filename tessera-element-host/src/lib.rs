//! tessera-element-host: host-side runtime for Tessera element plugins
//!
//! This crate scans the filesystem for element packages, validates their
//! manifests, and maintains the in-memory registry the host consults when
//! rendering and placing elements. The bundle loader that actually imports
//! plugin code is a separate concern; it only writes its results back into
//! registry entries via [`ElementRegistry::record_load_success`] and
//! [`ElementRegistry::record_load_failure`].

pub mod discovery;
pub mod registry;
pub mod validation;
pub mod watcher;

pub use discovery::{
    default_element_dirs, discover, DiscoveredElement, DiscoveryResult, SkippedCandidate,
};
pub use registry::{
    DistributionTier, ElementEntry, ElementRegistry, RefreshOutcome, RegistryConfig,
};
pub use validation::{validate_descriptor, validate_manifest, ValidationReport};
pub use watcher::{ElementWatcher, WatcherConfig, WatcherError};

pub use tessera_element_api::{
    ComponentRef, ElementCategory, ElementManifest, ElementSize, LayoutMode, DESCRIPTOR_FILE,
    ELEMENT_PLUGIN_TYPE, MANIFEST_FIELD,
};
