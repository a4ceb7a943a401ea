use super::*;

use std::{
    env, fs,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!(
        "predict_client_config_test_{suffix}_{}",
        NEXT_DIR.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join(DEFAULT_CONFIG_FILE);
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/predict_client.toml"), no_env);
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(
        settings.endpoint_url().expect("url").as_str(),
        "http://127.0.0.1:5000/predict"
    );
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
server_url = "http://marks.internal:8080"
payload_encoding = "json"
result_label = "Predicted Final Marks: "
request_timeout_secs = "30"
"#,
    );

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.server_url, "http://marks.internal:8080");
    assert_eq!(settings.encoding, PayloadEncoding::Json);
    assert_eq!(settings.result_label, "Predicted Final Marks: ");
    assert_eq!(settings.request_timeout_secs, Some(30));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let path = temp_config(r#"server_url = "http://from-file:1""#);

    let settings = load_settings_from(&path, |key| match key {
        "PREDICT_SERVER_URL" => Some("http://from-env:2".to_string()),
        "APP__SERVER_URL" => Some("http://from-app-env:3".to_string()),
        "APP__ENDPOINT_PATH" => Some("/v2/predict".to_string()),
        _ => None,
    });
    assert_eq!(settings.server_url, "http://from-app-env:3");
    assert_eq!(
        settings.endpoint_url().expect("url").as_str(),
        "http://from-app-env:3/v2/predict"
    );

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn invalid_values_keep_previous_setting() {
    let settings = load_settings_from(Path::new("/nonexistent/predict_client.toml"), |key| {
        match key {
            "APP__PAYLOAD_ENCODING" => Some("xml".to_string()),
            "APP__REQUEST_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        }
    });
    assert_eq!(settings.encoding, PayloadEncoding::Multipart);
    assert_eq!(settings.request_timeout_secs, None);
}

#[test]
fn zero_timeout_means_no_timeout() {
    let settings = load_settings_from(Path::new("/nonexistent/predict_client.toml"), |key| {
        (key == "APP__REQUEST_TIMEOUT_SECS").then(|| "0".to_string())
    });
    assert_eq!(settings.request_timeout_secs, None);
}

#[test]
fn rejects_unparseable_server_url() {
    let settings = ClientSettings {
        server_url: "not a url".into(),
        ..ClientSettings::default()
    };
    assert!(settings.endpoint_url().is_err());
}
