use super::{apply_overrides, load_settings, Settings, DEFAULT_CONCEPT_REPRESENTATION};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("lab_entry_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("lab_entry.toml");
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_file_keeps_defaults() {
    let settings = load_settings(std::path::Path::new("/nonexistent/lab_entry.toml"));
    assert_eq!(settings.concept_representation, DEFAULT_CONCEPT_REPRESENTATION);
    assert_eq!(settings.command_queue_capacity, 256);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_settings_file(
        r#"
patient_id = "patient-42"
locale = "fr"
event_queue_capacity = "64"
"#,
    );

    let settings = load_settings(&path);
    assert_eq!(settings.patient_id, "patient-42");
    assert_eq!(settings.locale, "fr");
    assert_eq!(settings.event_queue_capacity, 64);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn unparseable_numbers_keep_previous_value() {
    let mut settings = Settings::default();
    let overrides: HashMap<&str, &str> =
        [("command_queue_capacity", "lots"), ("event_queue_capacity", "0")].into();

    apply_overrides(&mut settings, |key| overrides.get(key).map(|v| v.to_string()));

    assert_eq!(settings.command_queue_capacity, 256);
    assert_eq!(settings.event_queue_capacity, 1);
}
