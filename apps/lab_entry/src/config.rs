use std::{collections::HashMap, fs, path::Path};

use order_core::submission::DEFAULT_ORDER_CREATED_MESSAGE;

/// Concept view requested with every category load.
pub const DEFAULT_CONCEPT_REPRESENTATION: &str = concat!(
    "custom:(uuid,display,names:(name,conceptNameType,locale),set,",
    "setMembers:(uuid,display,names:(name,conceptNameType,locale),set))"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub concept_representation: String,
    pub patient_id: String,
    pub locale: String,
    pub command_queue_capacity: usize,
    pub event_queue_capacity: usize,
    pub log_filter: String,
    pub order_created_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concept_representation: DEFAULT_CONCEPT_REPRESENTATION.into(),
            patient_id: "demo-patient".into(),
            locale: "en".into(),
            command_queue_capacity: 256,
            event_queue_capacity: 2048,
            log_filter: "info".into(),
            order_created_message: DEFAULT_ORDER_CREATED_MESSAGE.into(),
        }
    }
}

/// Defaults, then `path` (flat `key = "value"` TOML), then `APP__*` variables.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_overrides(&mut settings, |key| file_cfg.get(key).cloned());
        } else {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings file");
        }
    }

    apply_overrides(&mut settings, |key| {
        std::env::var(format!("APP__{}", key.to_ascii_uppercase())).ok()
    });

    settings
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("concept_representation") {
        settings.concept_representation = v;
    }
    if let Some(v) = lookup("patient_id") {
        settings.patient_id = v;
    }
    if let Some(v) = lookup("locale") {
        settings.locale = v;
    }
    if let Some(v) = lookup("command_queue_capacity") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.command_queue_capacity = parsed.max(1);
        }
    }
    if let Some(v) = lookup("event_queue_capacity") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_queue_capacity = parsed.max(1);
        }
    }
    if let Some(v) = lookup("log_filter") {
        settings.log_filter = v;
    }
    if let Some(v) = lookup("order_created_message") {
        settings.order_created_message = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
