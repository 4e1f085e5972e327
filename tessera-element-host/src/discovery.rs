//! Filesystem discovery of element packages
//!
//! Scans an elements directory for candidate packages, validates their
//! manifests, and partitions the outcome into accepted elements and skipped
//! candidates with reasons. Discovery never fails as a whole: every problem
//! with an individual candidate degrades to a skip entry or a silent pass,
//! and a missing or unreadable directory yields empty results.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tessera_element_api::{
    ElementManifest, DEFAULT_VERSION, DESCRIPTOR_FILE, ELEMENT_PLUGIN_TYPE, MANIFEST_FIELD,
};

use crate::validation::validate_manifest;

/// Dependency-cache directory excluded from the direct scan and searched
/// for installed element packages instead
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Reserved scope for first-party element packages inside the dependency
/// cache
pub const DEPENDENCY_SCOPE: &str = "@tessera";

/// Name prefix of scoped element packages (`@tessera/element-*`)
pub const SCOPED_PREFIX: &str = "element-";

/// Name prefix of unscoped element packages (`tessera-element-*`)
pub const UNSCOPED_PREFIX: &str = "tessera-element-";

/// A valid element package found during a scan
///
/// Immutable per scan; the next scan rebuilds these from scratch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredElement {
    /// Package name from the descriptor, or the directory base name when
    /// the descriptor omits one
    pub package_name: String,

    /// Package version, or [`DEFAULT_VERSION`] when omitted
    pub version: String,

    /// Absolute path of the package directory
    pub path: PathBuf,

    /// Entry-point path copied from the manifest
    pub entry: String,

    /// The validated manifest
    pub manifest: ElementManifest,
}

/// A candidate that declared itself an element plugin but was rejected
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCandidate {
    pub path: PathBuf,
    pub reason: String,
}

/// Partitioned outcome of one scan
#[derive(Debug, Default, Serialize)]
pub struct DiscoveryResult {
    /// Elements that passed validation
    pub elements: Vec<DiscoveredElement>,

    /// Candidates rejected with a reason
    pub skipped: Vec<SkippedCandidate>,
}

impl DiscoveryResult {
    /// Returns true when no candidate had to be skipped
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Total number of element-plugin candidates inspected
    pub fn total_found(&self) -> usize {
        self.elements.len() + self.skipped.len()
    }
}

/// Scan an elements directory for element packages.
///
/// Three location classes are searched, in order: immediate subdirectories
/// of `root` (except the dependency cache), scoped packages under
/// `root/node_modules/@tessera/element-*`, and unscoped packages under
/// `root/node_modules/tessera-element-*`. Within a class, candidates are
/// visited in filesystem enumeration order, which is platform-dependent.
/// When two candidates declare the same element type, the first one wins.
pub fn discover(root: impl AsRef<Path>) -> DiscoveryResult {
    let root = root.as_ref();
    let mut result = DiscoveryResult::default();
    let mut seen_types = HashSet::new();

    let candidates = candidate_dirs(root);
    tracing::debug!(
        root = %root.display(),
        candidates = candidates.len(),
        "Scanning for element packages"
    );

    for dir in candidates {
        inspect_candidate(&dir, &mut result, &mut seen_types);
    }

    result
}

/// Enumerate candidate package directories across the three location
/// classes. Unreadable directories contribute nothing.
fn candidate_dirs(root: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for dir in subdirs(root) {
        if dir_name(&dir) != DEPENDENCY_DIR {
            candidates.push(dir);
        }
    }

    let deps = root.join(DEPENDENCY_DIR);
    for dir in subdirs(&deps.join(DEPENDENCY_SCOPE)) {
        if dir_name(&dir).starts_with(SCOPED_PREFIX) {
            candidates.push(dir);
        }
    }
    for dir in subdirs(&deps) {
        if dir_name(&dir).starts_with(UNSCOPED_PREFIX) {
            candidates.push(dir);
        }
    }

    candidates
}

fn inspect_candidate(
    dir: &Path,
    result: &mut DiscoveryResult,
    seen_types: &mut HashSet<String>,
) {
    let descriptor_path = dir.join(DESCRIPTOR_FILE);
    if !descriptor_path.is_file() {
        // Not a package at all, just directory noise.
        return;
    }

    let raw = match fs::read_to_string(&descriptor_path) {
        Ok(raw) => raw,
        Err(e) => {
            skip(result, dir, format!("Failed to read {DESCRIPTOR_FILE}: {e}"));
            return;
        }
    };

    let descriptor: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            skip(result, dir, format!("Invalid JSON in {DESCRIPTOR_FILE}: {e}"));
            return;
        }
    };

    // Packages without the reserved field, or carrying a different plugin
    // kind, legitimately live in the same directories. Not candidates.
    let Some(manifest_value) = descriptor.get(MANIFEST_FIELD) else {
        return;
    };
    if manifest_value.get("type").and_then(Value::as_str) != Some(ELEMENT_PLUGIN_TYPE) {
        return;
    }

    let report = validate_manifest(manifest_value);
    if !report.is_valid() {
        skip(result, dir, report.joined());
        return;
    }

    let manifest: ElementManifest = match serde_json::from_value(manifest_value.clone()) {
        Ok(m) => m,
        Err(e) => {
            skip(result, dir, format!("Malformed manifest: {e}"));
            return;
        }
    };

    if !seen_types.insert(manifest.element_type.clone()) {
        skip(
            result,
            dir,
            format!(
                "duplicate element type '{}': already registered by an earlier package",
                manifest.element_type
            ),
        );
        return;
    }

    let package_name = descriptor
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| dir_name(dir).to_owned());
    let version = descriptor
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_VERSION)
        .to_owned();

    result.elements.push(DiscoveredElement {
        package_name,
        version,
        path: dir.to_path_buf(),
        entry: manifest.entry.clone(),
        manifest,
    });
}

fn skip(result: &mut DiscoveryResult, dir: &Path, reason: String) {
    result.skipped.push(SkippedCandidate {
        path: dir.to_path_buf(),
        reason,
    });
}

/// Immediate subdirectories of `dir`; empty when the directory is missing
/// or unreadable.
fn subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect()
}

fn dir_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Default element directories for the current platform
pub fn default_element_dirs(app_name: &str) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    // User-local element packages
    if let Some(data_dir) = dirs::data_local_dir() {
        dirs.push(data_dir.join(app_name).join("elements"));
    }

    // Project-local elements
    dirs.push(PathBuf::from("elements"));

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GAUGE_DESCRIPTOR: &str = r#"{
        "name": "t",
        "version": "1.0.0",
        "tesseraElement": {
            "type": "element",
            "entry": "dist/index.js",
            "elementType": "gauge-x",
            "displayName": "Gauge X",
            "description": "d",
            "category": "Data",
            "icon": "Star",
            "sensorBound": false,
            "defaultSize": {"width": 200, "height": 100},
            "defaultProperties": {}
        }
    }"#;

    fn write_package(root: &Path, relative: &str, descriptor: &str) {
        let dir = root.join(relative);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DESCRIPTOR_FILE), descriptor).unwrap();
    }

    fn descriptor_with_type(name: &str, element_type: &str) -> String {
        GAUGE_DESCRIPTOR
            .replace("\"t\"", &format!("\"{name}\""))
            .replace("gauge-x", element_type)
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn test_scan_nonexistent_root_yields_empty() {
        let result = discover("/nonexistent/path/to/elements");
        assert!(result.elements.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn test_valid_package_discovered() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "gauge", GAUGE_DESCRIPTOR);

        let result = discover(temp.path());
        assert_eq!(result.elements.len(), 1);
        assert!(result.skipped.is_empty());

        let element = &result.elements[0];
        assert_eq!(element.manifest.element_type, "gauge-x");
        assert_eq!(element.package_name, "t");
        assert_eq!(element.version, "1.0.0");
        assert_eq!(element.entry, "dist/index.js");
        assert_eq!(element.path, temp.path().join("gauge"));
    }

    #[test]
    fn test_all_three_location_classes_scanned() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "direct", &descriptor_with_type("a", "el-a"));
        write_package(
            temp.path(),
            "node_modules/@tessera/element-b",
            &descriptor_with_type("@tessera/element-b", "el-b"),
        );
        write_package(
            temp.path(),
            "node_modules/tessera-element-c",
            &descriptor_with_type("tessera-element-c", "el-c"),
        );

        let result = discover(temp.path());
        assert_eq!(result.elements.len(), 3);
        assert!(result.is_clean());
        assert_eq!(result.total_found(), 3);
    }

    #[test]
    fn test_dependency_cache_prefix_filtering() {
        let temp = TempDir::new().unwrap();
        // Non-matching prefixes in the dependency cache are ignored even
        // when they carry a valid manifest.
        write_package(
            temp.path(),
            "node_modules/some-library",
            &descriptor_with_type("some-library", "el-lib"),
        );
        write_package(
            temp.path(),
            "node_modules/@tessera/theme-dark",
            &descriptor_with_type("theme-dark", "el-theme"),
        );

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn test_directory_without_descriptor_is_silent() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("assets")).unwrap();

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn test_invalid_json_reported() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "broken", "{not json at all");

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("Invalid JSON"));
    }

    #[test]
    fn test_unreadable_descriptor_reported() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("mojibake");
        fs::create_dir_all(&dir).unwrap();
        // Invalid UTF-8 makes read_to_string fail even when the test runs
        // with enough privileges to ignore file permissions.
        fs::write(dir.join(DESCRIPTOR_FILE), [0xFF, 0xFE, 0xFD]).unwrap();

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("Failed to read"));
        assert_eq!(result.skipped[0].path, dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_descriptor_reported() {
        use std::os::unix::fs::PermissionsExt;

        // Permission bits do not bind the superuser, so this only proves
        // anything when running unprivileged.
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("locked");
        fs::create_dir_all(&dir).unwrap();
        let descriptor = dir.join(DESCRIPTOR_FILE);
        fs::write(&descriptor, GAUGE_DESCRIPTOR).unwrap();
        fs::set_permissions(&descriptor, fs::Permissions::from_mode(0o000)).unwrap();

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("Failed to read"));
    }

    #[test]
    fn test_other_plugin_kind_is_silent() {
        let temp = TempDir::new().unwrap();
        write_package(
            temp.path(),
            "theme",
            r#"{"name": "theme", "version": "1.0.0", "tesseraElement": {"type": "theme"}}"#,
        );

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn test_package_without_reserved_field_is_silent() {
        let temp = TempDir::new().unwrap();
        write_package(
            temp.path(),
            "lodash",
            r#"{"name": "lodash", "version": "4.17.21"}"#,
        );

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn test_invalid_manifest_reported_with_joined_errors() {
        let temp = TempDir::new().unwrap();
        let descriptor = GAUGE_DESCRIPTOR
            .replace("\"Data\"", "\"Nonexistent\"")
            .replace("\"Star\"", "\"\"");
        write_package(temp.path(), "bad", &descriptor);

        let result = discover(temp.path());
        assert!(result.elements.is_empty());
        assert_eq!(result.skipped.len(), 1);
        let reason = &result.skipped[0].reason;
        assert!(reason.contains("category"));
        assert!(reason.contains("icon"));
        assert!(reason.contains("; "));
    }

    #[test]
    fn test_duplicate_element_type_first_wins() {
        let temp = TempDir::new().unwrap();
        // Direct subdirectories are scanned before the dependency cache,
        // so the direct package wins regardless of enumeration order.
        write_package(temp.path(), "first", &descriptor_with_type("first-pkg", "gauge-x"));
        write_package(
            temp.path(),
            "node_modules/tessera-element-second",
            &descriptor_with_type("second-pkg", "gauge-x"),
        );

        let result = discover(temp.path());
        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.elements[0].package_name, "first-pkg");
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].reason.contains("duplicate"));
    }

    #[test]
    fn test_name_and_version_fallbacks() {
        let temp = TempDir::new().unwrap();
        let descriptor = r#"{
            "tesseraElement": {
                "type": "element",
                "entry": "dist/index.js",
                "elementType": "bare-widget",
                "displayName": "Bare",
                "description": "d",
                "category": "Basic",
                "icon": "Box",
                "sensorBound": false,
                "defaultSize": {"width": 100, "height": 100},
                "defaultProperties": {}
            }
        }"#;
        write_package(temp.path(), "bare-widget-dir", descriptor);

        let result = discover(temp.path());
        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.elements[0].package_name, "bare-widget-dir");
        assert_eq!(result.elements[0].version, DEFAULT_VERSION);
    }

    #[test]
    fn test_scan_result_serializes_for_host_ui() {
        let temp = TempDir::new().unwrap();
        write_package(temp.path(), "gauge", GAUGE_DESCRIPTOR);
        write_package(temp.path(), "broken", "{not json");

        let value = serde_json::to_value(discover(temp.path())).unwrap();
        assert_eq!(value["elements"][0]["packageName"], "t");
        assert_eq!(value["elements"][0]["manifest"]["elementType"], "gauge-x");
        assert!(value["skipped"][0]["reason"]
            .as_str()
            .unwrap()
            .contains("Invalid JSON"));
    }

    #[test]
    fn test_default_element_dirs() {
        let dirs = default_element_dirs("tessera");
        assert!(!dirs.is_empty());
        assert!(dirs.iter().any(|d| d.ends_with("elements")));
    }
}
