#![allow(clippy::option_if_let_else)]

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

pub(crate) static WORKSPACE_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let mut current = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    loop {
        if current.join("Cargo.toml").exists() {
            let cargo_toml = std::fs::read_to_string(current.join("Cargo.toml"))
                .expect("Failed to read Cargo.toml");
            if cargo_toml.contains("[workspace]") {
                return current;
            }
        }

        current = current
            .parent()
            .expect("Could not find workspace root")
            .to_path_buf();
    }
});

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn test_data_path() -> PathBuf {
    WORKSPACE_ROOT.join("test_data")
}

/// Get the path to a test fixture file relative to the test_data directory
///
/// ## Arguments
/// * `name` - The relative path to the fixture file (e.g., "schema/sports.json")
pub fn fixture_path(name: &str) -> PathBuf {
    test_data_path().join(name)
}

/// Read the contents of a test fixture file
pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture '{}': {}", path.display(), e))
}

/// Deserialize a JSON fixture (schema catalogs, compiled type information)
pub fn load_json_fixture<T: DeserializeOwned>(name: &str) -> Result<T, FixtureError> {
    let path = fixture_path(name);
    let text = std::fs::read_to_string(&path).map_err(|source| FixtureError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FixtureError::Json { path, source })
}

/// List all fixtures with the given extension in a subdirectory of test_data
pub fn list_fixtures(subdir: &str, extension: &str) -> Vec<String> {
    let dir_path = test_data_path().join(subdir);

    let mut names: Vec<String> = std::fs::read_dir(&dir_path)
        .unwrap_or_else(|e| panic!("Failed to read directory '{}': {}", dir_path.display(), e))
        .filter_map(|entry| {
            entry.ok().and_then(|e| {
                let path = e.path();
                if path.extension()?.to_str()? == extension {
                    path.file_name()?.to_str().map(String::from)
                } else {
                    None
                }
            })
        })
        .collect();
    names.sort();
    names
}

/// Install a tracing subscriber that writes through the test harness. Safe to call from
/// every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
