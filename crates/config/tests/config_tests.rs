//! Loader tests for the `dailink-config` crate.
//!
//! These cover default handling, file discovery, environment overrides,
//! and failure reporting.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use dailink_config::{load, AppConfig, HscConfig, HttpConfig, UnipileConfig};

const ENV_VARS_TO_RESET: &[&str] = &[
    "DAILINK_CONFIG",
    "DAILINK__AUTH__ALLOW_REGISTRATION",
    "DAILINK__AUTH__SESSION_TTL_SECONDS",
    "DAILINK__DATABASE__MAX_CONNECTIONS",
    "DAILINK__DATABASE__URL",
    "DAILINK__HTTP__ADDRESS",
    "DAILINK__HTTP__PORT",
    "DAILINK__HSC__PAGE_DELAY_MS",
    "DAILINK__HSC__MAX_PAGES",
    "DAILINK__UNIPILE__API_KEY",
    "DAILINK__UNIPILE__BASE_URL",
    "UNIPILE_API_KEY",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

fn isolated() -> (TempDir, TestContext) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());
    (temp_dir, ctx)
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let (_dir, _ctx) = isolated();

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.http.address, defaults.http.address);
    assert_eq!(config.http.port, defaults.http.port);
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(config.database.max_connections, defaults.database.max_connections);
    assert_eq!(config.auth.session_ttl_seconds, defaults.auth.session_ttl_seconds);
    assert!(config.auth.allow_registration);
    assert_eq!(config.unipile.base_url, defaults.unipile.base_url);
    assert!(config.unipile.api_key.is_none());
    assert_eq!(config.hsc.page_size, defaults.hsc.page_size);
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let (dir, _ctx) = isolated();

    write_config_file(dir.path(), "dailink.toml", "[http]\nport = 4242\n");
    write_config_file(dir.path(), "config/dailink.toml", "[http]\nport = 5151\n");

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.http.port, 4242);
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let (dir, _ctx) = isolated();

    write_config_file(
        dir.path(),
        "dailink.toml",
        r#"
        [hsc]
        page_delay_ms = 0

        [database]
        max_connections = 50
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(config.hsc.page_delay_ms, 0);
    assert_eq!(config.hsc.page_size, HscConfig::default().page_size);
    assert_eq!(config.database.max_connections, 50);
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(config.http.port, defaults.http.port);
}

#[test]
#[serial]
fn load_honours_explicit_config_path() {
    let (dir, mut ctx) = isolated();

    write_config_file(dir.path(), "elsewhere/custom.toml", "[http]\naddress = \"0.0.0.0\"\n");
    ctx.set_var(
        "DAILINK_CONFIG",
        dir.path().join("elsewhere/custom.toml").display().to_string(),
    );

    let config = load().expect("configuration load should use DAILINK_CONFIG");
    assert_eq!(config.http.address, "0.0.0.0");
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let (dir, mut ctx) = isolated();

    write_config_file(dir.path(), "dailink.toml", "[http]\nport = 3030\n");
    ctx.set_var("DAILINK__HTTP__PORT", "8080");
    ctx.set_var("DAILINK__UNIPILE__API_KEY", "unipile-test-key");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.http.port, 8080);
    assert_eq!(config.unipile.api_key.as_deref(), Some("unipile-test-key"));
}

#[test]
#[serial]
fn load_clamps_zero_max_pages() {
    let (_dir, mut ctx) = isolated();
    ctx.set_var("DAILINK__HSC__MAX_PAGES", "0");

    let config = load().expect("configuration load should succeed");
    assert_eq!(config.hsc.max_pages, 1);
}

#[test]
#[serial]
fn load_errors_on_invalid_toml_contents() {
    let (dir, _ctx) = isolated();

    write_config_file(dir.path(), "dailink.toml", "[http]\nport = \"not-a-number\n");

    let error = load().expect_err("invalid TOML should cause load to fail");
    let message = error.to_string();
    assert!(
        message.contains("invalid configuration") || message.contains("unable to build configuration"),
        "unexpected error message: {message}"
    );
}

#[test]
#[serial]
fn unipile_key_falls_back_to_environment() {
    let (_dir, mut ctx) = isolated();
    ctx.set_var("UNIPILE_API_KEY", "from-env");

    let config = UnipileConfig::default();
    assert_eq!(config.resolved_api_key().as_deref(), Some("from-env"));

    let explicit = UnipileConfig {
        api_key: Some("from-config".into()),
        ..UnipileConfig::default()
    };
    assert_eq!(explicit.resolved_api_key().as_deref(), Some("from-config"));
}

#[test]
fn unipile_debug_output_redacts_api_key() {
    let config = UnipileConfig {
        api_key: Some("super-secret".into()),
        ..UnipileConfig::default()
    };

    let rendered = format!("{config:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn http_config_defaults_match_expected_host_and_port() {
    let defaults = HttpConfig::default();
    assert_eq!(defaults.address, "127.0.0.1");
    assert_eq!(defaults.port, 7080);
}
