//! Structural validation of element manifests
//!
//! Manifests arrive as untrusted JSON authored by third parties, so they are
//! checked field by field against the schema before any typed
//! deserialization happens. All checks run independently and errors
//! accumulate: an author fixing one field at a time sees every remaining
//! problem in a single pass, not one per attempt.

use serde_json::Value;
use tessera_element_api::{
    is_valid_element_type, ElementCategory, LayoutMode, ELEMENT_PLUGIN_TYPE, MANIFEST_FIELD,
    MAX_DESCRIPTION_LEN,
};

/// Outcome of validating a manifest candidate
///
/// The candidate is valid iff `errors` is empty; there is no partial
/// acceptance.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// One message per violated field
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns true when no structural errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// All error messages joined into a single diagnostic line
    pub fn joined(&self) -> String {
        self.errors.join("; ")
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

/// Validate an arbitrary parsed value against the element manifest schema.
///
/// Pure and deterministic: the same input always produces the same report,
/// and nothing is mutated or read from the environment.
pub fn validate_manifest(candidate: &Value) -> ValidationReport {
    let Some(manifest) = candidate.as_object() else {
        return ValidationReport::rejected("manifest must be a JSON object");
    };

    let mut errors = Vec::new();

    if manifest.get("type").and_then(Value::as_str) != Some(ELEMENT_PLUGIN_TYPE) {
        errors.push(format!("'type' must be \"{ELEMENT_PLUGIN_TYPE}\""));
    }

    check_non_empty_string(manifest.get("entry"), "entry", &mut errors);

    match manifest.get("elementType").and_then(Value::as_str) {
        Some(id) if is_valid_element_type(id) => {}
        Some(id) => errors.push(format!(
            "'elementType' must be kebab-case (\"gauge-x\") or dot-namespaced \
             kebab-case (\"acme.gauge-x\"), got \"{id}\""
        )),
        None => errors.push("'elementType' must be a string".to_owned()),
    }

    check_non_empty_string(manifest.get("displayName"), "displayName", &mut errors);
    check_non_empty_string(manifest.get("icon"), "icon", &mut errors);

    match manifest.get("description").and_then(Value::as_str) {
        Some(d) if d.is_empty() => errors.push("'description' must not be empty".to_owned()),
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => errors.push(format!(
            "'description' must be at most {MAX_DESCRIPTION_LEN} characters"
        )),
        Some(_) => {}
        None => errors.push("'description' must be a non-empty string".to_owned()),
    }

    match manifest.get("category").and_then(Value::as_str) {
        Some(name) if ElementCategory::from_name(name).is_some() => {}
        _ => {
            let allowed: Vec<&str> = ElementCategory::ALL.iter().map(|c| c.as_str()).collect();
            errors.push(format!(
                "'category' must be one of: {}",
                allowed.join(", ")
            ));
        }
    }

    if !matches!(manifest.get("sensorBound"), Some(Value::Bool(_))) {
        errors.push("'sensorBound' must be a boolean".to_owned());
    }

    match manifest.get("defaultSize") {
        Some(Value::Object(size)) => {
            for dimension in ["width", "height"] {
                match size.get(dimension).and_then(Value::as_f64) {
                    Some(v) if v > 0.0 => {}
                    Some(_) => errors.push(format!("'defaultSize.{dimension}' must be positive")),
                    None => errors.push(format!("'defaultSize.{dimension}' must be a number")),
                }
            }
        }
        _ => errors.push("'defaultSize' must be an object with numeric width and height".to_owned()),
    }

    if !matches!(manifest.get("defaultProperties"), Some(Value::Object(_))) {
        errors.push("'defaultProperties' must be an object (not an array)".to_owned());
    }

    if let Some(modes) = manifest.get("layoutModes") {
        match modes.as_array() {
            Some(items) => {
                let unsupported: Vec<String> = items
                    .iter()
                    .filter(|v| v.as_str().and_then(LayoutMode::from_token).is_none())
                    .map(Value::to_string)
                    .collect();
                if !unsupported.is_empty() {
                    errors.push(format!(
                        "'layoutModes' contains unsupported values: {}",
                        unsupported.join(", ")
                    ));
                }
            }
            None => errors.push("'layoutModes' must be an array of layout-mode tokens".to_owned()),
        }
    }

    ValidationReport { errors }
}

/// Validate the element manifest embedded in a full package descriptor.
///
/// Returns a single "missing field" error when the reserved field is absent
/// or not an object; otherwise delegates to [`validate_manifest`].
pub fn validate_descriptor(descriptor: &Value) -> ValidationReport {
    match descriptor.get(MANIFEST_FIELD) {
        Some(manifest) if manifest.is_object() => validate_manifest(manifest),
        _ => ValidationReport::rejected(format!(
            "package descriptor has no '{MANIFEST_FIELD}' object"
        )),
    }
}

fn check_non_empty_string(value: Option<&Value>, field: &str, errors: &mut Vec<String>) {
    match value.and_then(Value::as_str) {
        Some("") => errors.push(format!("'{field}' must not be empty")),
        Some(_) => {}
        None => errors.push(format!("'{field}' must be a non-empty string")),
    }
}
