//! Element registry
//!
//! The registry is the host's single source of truth for which element
//! plugins exist. It is an explicitly owned object (no module-level
//! singleton): the host creates one per process, passes it to consumers,
//! and rebuilds it on demand. Every rebuild replaces the whole entry map in
//! one swap, so readers only ever observe a complete map.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tessera_element_api::{ComponentRef, ElementManifest};

use crate::discovery::{self, DiscoveredElement, SkippedCandidate};

/// Hook invoked once per element accepted during a build
pub type FoundHook = Box<dyn Fn(&DiscoveredElement) + Send>;

/// Hook invoked once per candidate skipped during a build
pub type SkippedHook = Box<dyn Fn(&SkippedCandidate) + Send>;

/// Configuration the registry is built over
///
/// Fixed for the lifetime of the registry; every refresh re-reads the same
/// elements directory and re-applies the same official-package set.
pub struct RegistryConfig {
    elements_dir: PathBuf,
    official_packages: HashSet<String>,
    on_element_found: Option<FoundHook>,
    on_element_skipped: Option<SkippedHook>,
}

impl RegistryConfig {
    /// Configuration scanning the given elements directory
    pub fn new(elements_dir: impl Into<PathBuf>) -> Self {
        Self {
            elements_dir: elements_dir.into(),
            official_packages: HashSet::new(),
            on_element_found: None,
            on_element_skipped: None,
        }
    }

    /// Package names whose elements are classified as officially
    /// distributed
    pub fn official_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.official_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Observe every element accepted during a build
    pub fn on_element_found(mut self, hook: impl Fn(&DiscoveredElement) + Send + 'static) -> Self {
        self.on_element_found = Some(Box::new(hook));
        self
    }

    /// Observe every candidate skipped during a build
    pub fn on_element_skipped(
        mut self,
        hook: impl Fn(&SkippedCandidate) + Send + 'static,
    ) -> Self {
        self.on_element_skipped = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("elements_dir", &self.elements_dir)
            .field("official_packages", &self.official_packages)
            .field("on_element_found", &self.on_element_found.is_some())
            .field("on_element_skipped", &self.on_element_skipped.is_some())
            .finish()
    }
}

/// How an element package reached the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionTier {
    /// Shipped by the Tessera project itself
    Official,
    /// Third-party
    Community,
}

impl DistributionTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Community => "community",
        }
    }
}

impl std::fmt::Display for DistributionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime record for one registered element type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementEntry {
    pub manifest: ElementManifest,
    pub package_name: String,
    pub version: String,
    pub tier: DistributionTier,

    /// Set by the bundle loader once the plugin code has been imported
    pub loaded: bool,
    pub renderer: Option<ComponentRef>,
    pub properties_panel: Option<ComponentRef>,
    pub error: Option<String>,
}

impl ElementEntry {
    fn from_discovered(element: DiscoveredElement, tier: DistributionTier) -> Self {
        Self {
            manifest: element.manifest,
            package_name: element.package_name,
            version: element.version,
            tier,
            loaded: false,
            renderer: None,
            properties_panel: None,
            error: None,
        }
    }
}

/// Summary counts of one registry build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub found: usize,
    pub skipped: usize,
}

/// In-memory registry of element plugins, keyed by element type.
///
/// Construction performs one synchronous build, so a registry is never in
/// an empty-and-unbuilt state. Entries are enumerated in sorted element-type
/// order, which keeps repeated builds over an unchanged tree identical.
pub struct ElementRegistry {
    config: RegistryConfig,
    entries: BTreeMap<String, ElementEntry>,
}

impl ElementRegistry {
    /// Build a registry over the configured elements directory
    pub fn new(config: RegistryConfig) -> Self {
        let mut registry = Self {
            config,
            entries: BTreeMap::new(),
        };
        registry.refresh();
        registry
    }

    /// Re-scan the elements directory and rebuild the registry.
    ///
    /// The new map is built off to the side and swapped in whole once the
    /// scan completes; observers are replayed once per found/skipped item
    /// of the fresh scan. Entries absent from the new scan disappear, and
    /// loader state (`loaded`, component refs, `error`) resets.
    pub fn refresh(&mut self) -> RefreshOutcome {
        let scan = discovery::discover(&self.config.elements_dir);
        let mut fresh = BTreeMap::new();

        for element in scan.elements {
            let tier = self.classify(&element.package_name);
            tracing::info!(
                element = %element.manifest.element_type,
                package = %element.package_name,
                version = %element.version,
                tier = %tier,
                "Element plugin registered"
            );
            if let Some(hook) = &self.config.on_element_found {
                hook(&element);
            }
            fresh.insert(
                element.manifest.element_type.clone(),
                ElementEntry::from_discovered(element, tier),
            );
        }

        for candidate in &scan.skipped {
            tracing::warn!(
                path = %candidate.path.display(),
                reason = %candidate.reason,
                "Element plugin skipped"
            );
            if let Some(hook) = &self.config.on_element_skipped {
                hook(candidate);
            }
        }

        let outcome = RefreshOutcome {
            found: fresh.len(),
            skipped: scan.skipped.len(),
        };
        self.entries = fresh;
        outcome
    }

    /// Look up an entry by element type
    pub fn get(&self, element_type: &str) -> Option<&ElementEntry> {
        self.entries.get(element_type)
    }

    /// Whether an element type is registered
    pub fn has(&self, element_type: &str) -> bool {
        self.entries.contains_key(element_type)
    }

    /// All entries, in sorted element-type order
    pub fn entries(&self) -> Vec<&ElementEntry> {
        self.entries.values().collect()
    }

    /// All registered element types, sorted
    pub fn element_types(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered elements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no elements
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directory this registry scans
    pub fn elements_dir(&self) -> &Path {
        &self.config.elements_dir
    }

    /// Record a successful dynamic import for an element.
    ///
    /// Called by the bundle loader; the registry itself never populates
    /// component references. Returns false when the element type is
    /// unknown.
    pub fn record_load_success(
        &mut self,
        element_type: &str,
        renderer: ComponentRef,
        properties_panel: ComponentRef,
    ) -> bool {
        match self.entries.get_mut(element_type) {
            Some(entry) => {
                entry.loaded = true;
                entry.renderer = Some(renderer);
                entry.properties_panel = Some(properties_panel);
                entry.error = None;
                tracing::info!(element = %element_type, "Element plugin loaded");
                true
            }
            None => false,
        }
    }

    /// Record a failed dynamic import for an element.
    ///
    /// Returns false when the element type is unknown.
    pub fn record_load_failure(&mut self, element_type: &str, error: impl Into<String>) -> bool {
        match self.entries.get_mut(element_type) {
            Some(entry) => {
                let error = error.into();
                entry.loaded = false;
                entry.renderer = None;
                entry.properties_panel = None;
                tracing::warn!(element = %element_type, error = %error, "Element plugin failed to load");
                entry.error = Some(error);
                true
            }
            None => false,
        }
    }

    fn classify(&self, package_name: &str) -> DistributionTier {
        if self.config.official_packages.contains(package_name) {
            DistributionTier::Official
        } else {
            DistributionTier::Community
        }
    }
}
