//! JSON Schema for the BackSlide settings file.

use crate::settings::SettingsData;

/// Generates a JSON Schema for the settings document.
///
/// The schema includes every key with its type, description and default value.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(SettingsData);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert(
            "$id".to_string(),
            serde_json::json!("https://raw.githubusercontent.com/codeisland/backslide/main/backslide.schema.json"),
        );
        obj.insert("title".to_string(), serde_json::json!("BackSlide settings"));
    }

    schema
}

/// Generates the settings schema as a pretty-printed JSON string.
#[must_use]
pub fn generate_schema_json() -> String {
    let schema = generate_schema();
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
