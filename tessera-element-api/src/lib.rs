//! tessera-element-api: Shared types for the Tessera element-plugin system
//!
//! This crate defines the manifest contract between the Tessera host and
//! third-party element packages. An element package is an npm-style package
//! whose `package.json` carries an element manifest under the reserved
//! `tesseraElement` field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Manifest schema version for compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Reserved field in a package descriptor that holds the element manifest
pub const MANIFEST_FIELD: &str = "tesseraElement";

/// Discriminator value marking a manifest as a UI-element plugin
/// (as opposed to other plugin kinds sharing the same descriptor field)
pub const ELEMENT_PLUGIN_TYPE: &str = "element";

/// Package descriptor file name at the root of each element package
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Version string assumed when a package descriptor omits one
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Upper bound on manifest description length
pub const MAX_DESCRIPTION_LEN: usize = 120;

/// Palette category an element appears under in the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    Basic,
    Data,
    Charts,
    Controls,
    Media,
}

impl ElementCategory {
    /// All recognized categories, in palette order
    pub const ALL: [ElementCategory; 5] = [
        Self::Basic,
        Self::Data,
        Self::Charts,
        Self::Controls,
        Self::Media,
    ];

    /// Canonical name as it appears in manifests
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Data => "Data",
            Self::Charts => "Charts",
            Self::Controls => "Controls",
            Self::Media => "Media",
        }
    }

    /// Parse a manifest category name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas layout mode an element declares support for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Free placement with explicit coordinates
    Absolute,
    /// Snap-to-grid placement
    Grid,
    /// Document-flow placement
    Flow,
}

impl LayoutMode {
    /// All recognized layout modes
    pub const ALL: [LayoutMode; 3] = [Self::Absolute, Self::Grid, Self::Flow];

    /// Canonical token as it appears in manifests
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Grid => "grid",
            Self::Flow => "flow",
        }
    }

    /// Parse a manifest layout-mode token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == token)
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default size an element is placed at, in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementSize {
    pub width: f64,
    pub height: f64,
}

/// Opaque reference to a host-side component implementation.
///
/// The registry core never resolves these; the host's bundle loader writes
/// them into registry entries after a dynamic import and maps them back to
/// real UI components on the rendering side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRef(String);

impl ComponentRef {
    /// Create a component reference from a host-side handle
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The underlying handle string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element manifest embedded in a package descriptor under
/// [`MANIFEST_FIELD`]
///
/// Field names follow the on-disk camelCase schema. A manifest read from an
/// untrusted descriptor must pass structural validation before being
/// deserialized into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementManifest {
    /// Plugin-kind discriminator, always [`ELEMENT_PLUGIN_TYPE`]
    #[serde(rename = "type")]
    pub plugin_type: String,

    /// Entry-point path relative to the package root (e.g. "dist/index.js")
    pub entry: String,

    /// Element identifier: kebab-case ("gauge-x") or dot-namespaced
    /// kebab-case ("acme.gauge-x")
    pub element_type: String,

    /// Human-readable name shown in the host palette
    pub display_name: String,

    /// Short description, at most [`MAX_DESCRIPTION_LEN`] characters
    pub description: String,

    /// Palette category
    pub category: ElementCategory,

    /// Icon name resolved against the host icon set
    pub icon: String,

    /// Whether the element consumes live sensor-style data feeds
    pub sensor_bound: bool,

    /// Size the element is created at
    pub default_size: ElementSize,

    /// Initial property values for new instances
    pub default_properties: Map<String, Value>,

    /// Layout modes the element supports
    #[serde(default = "default_layout_modes")]
    pub layout_modes: Vec<LayoutMode>,
}

fn default_layout_modes() -> Vec<LayoutMode> {
    vec![LayoutMode::Absolute]
}

impl ElementManifest {
    /// Create a manifest with defaults suitable for a basic element.
    ///
    /// The description defaults to the display name; use the builder
    /// methods to fill in the rest.
    pub fn new(
        element_type: impl Into<String>,
        display_name: impl Into<String>,
        entry: impl Into<String>,
    ) -> Self {
        let display_name = display_name.into();
        Self {
            plugin_type: ELEMENT_PLUGIN_TYPE.to_owned(),
            entry: entry.into(),
            element_type: element_type.into(),
            description: display_name.clone(),
            display_name,
            category: ElementCategory::Basic,
            icon: "Box".to_owned(),
            sensor_bound: false,
            default_size: ElementSize {
                width: 120.0,
                height: 80.0,
            },
            default_properties: Map::new(),
            layout_modes: default_layout_modes(),
        }
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the palette category
    pub fn category(mut self, category: ElementCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the icon name
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Mark the element as consuming live sensor data
    pub fn sensor_bound(mut self) -> Self {
        self.sensor_bound = true;
        self
    }

    /// Set the default size
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.default_size = ElementSize { width, height };
        self
    }

    /// Add a default property value
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_properties.insert(key.into(), value.into());
        self
    }

    /// Declare the supported layout modes
    pub fn layout_modes(mut self, modes: Vec<LayoutMode>) -> Self {
        self.layout_modes = modes;
        self
    }

    /// Namespace portion of the element type, if it is dot-namespaced
    pub fn namespace(&self) -> Option<&str> {
        self.element_type.split_once('.').map(|(ns, _)| ns)
    }
}

/// Check a single kebab-case segment: lowercase alphanumeric runs separated
/// by single hyphens, starting with a letter.
pub fn is_kebab(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    let mut prev_hyphen = false;
    for c in chars {
        match c {
            'a'..='z' | '0'..='9' => prev_hyphen = false,
            '-' if !prev_hyphen => prev_hyphen = true,
            _ => return false,
        }
    }
    !prev_hyphen
}

/// Check an element identifier against both accepted patterns: a legacy
/// single-segment kebab-case name, or the namespaced `<namespace>.<name>`
/// form with two kebab-case segments.
pub fn is_valid_element_type(s: &str) -> bool {
    match s.split_once('.') {
        Some((namespace, name)) => is_kebab(namespace) && is_kebab(name),
        None => is_kebab(s),
    }
}
