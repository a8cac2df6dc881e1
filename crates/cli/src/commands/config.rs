use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JsonValue;
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// Config keys with the environment variables that can override them.
const FIELDS: &[(&str, &[&str])] = &[
    ("database.url", &["MYSHOP_DATABASE_URL"]),
    ("database.max_connections", &["MYSHOP_DATABASE_MAX_CONNECTIONS"]),
    ("database.timeout_secs", &["MYSHOP_DATABASE_TIMEOUT_SECS"]),
    ("storage.backend", &["MYSHOP_STORAGE_BACKEND"]),
    ("server.bind_address", &["MYSHOP_SERVER_BIND_ADDRESS"]),
    ("server.port", &["MYSHOP_SERVER_PORT"]),
    ("server.graceful_shutdown_secs", &["MYSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ("server.image_dir", &["MYSHOP_SERVER_IMAGE_DIR"]),
    ("cart.session_name", &["MYSHOP_CART_SESSION_NAME"]),
    ("cart.session_ttl_hours", &["MYSHOP_CART_SESSION_TTL_HOURS"]),
    ("logging.level", &["MYSHOP_LOGGING_LEVEL", "MYSHOP_LOG_LEVEL"]),
    ("logging.format", &["MYSHOP_LOGGING_FORMAT", "MYSHOP_LOG_FORMAT"]),
];

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: JsonValue,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    command: &'static str,
    status: &'static str,
    config_file: Option<String>,
    fields: Vec<ConfigField>,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let effective = match serde_json::to_value(&config) {
        Ok(value) => value,
        Err(error) => {
            return CommandResult::failure("config", "serialization", error.to_string(), 1);
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = FIELDS
        .iter()
        .map(|&(key, env_keys)| ConfigField {
            key,
            value: json_path(&effective, key).cloned().unwrap_or(JsonValue::Null),
            source: field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
        })
        .collect();

    let report = ConfigReport {
        command: "config",
        status: "ok",
        config_file: config_file_path.map(|path| path.display().to_string()),
        fields,
    };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("config", "serialization", error.to_string(), 1),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("myshop.toml"), PathBuf::from("config/myshop.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn json_path<'a>(root: &'a JsonValue, key_path: &str) -> Option<&'a JsonValue> {
    key_path.split('.').try_fold(root, |current, key| current.get(key))
}
