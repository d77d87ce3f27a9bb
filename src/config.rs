//! Configuration Management
//!
//! Settings for the `gce` command: an optional JSON file under the user's
//! config directory, environment variables, and the gcloud CLI's own
//! properties as the last resort.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Zone used when nothing else names one
pub const DEFAULT_ZONE: &str = "us-central1-a";

/// Environment variables consulted for the project, in order
const PROJECT_ENV_VARS: &[&str] = &["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"];

/// Environment variable consulted for the zone
const ZONE_ENV_VAR: &str = "CLOUDSDK_COMPUTE_ZONE";

/// User configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default project ID
    #[serde(default)]
    pub project: Option<String>,
    /// Default zone
    #[serde(default)]
    pub zone: Option<String>,
    /// Base URL override for the Compute API (emulators, mirrors)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gce").join("config.json"))
    }

    /// Load configuration from the default location
    ///
    /// A missing file is an empty configuration; a malformed one is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Get effective project (CLI > config > environment > gcloud)
    ///
    /// A malformed `--project` value is an error; malformed values from the
    /// other sources are skipped with a warning.
    pub fn effective_project(&self, flag: Option<&str>) -> Result<Option<String>> {
        self.resolve_project(flag, |key| std::env::var(key).ok(), &GcloudProperties::load_default())
    }

    /// Get effective zone (CLI > config > environment > gcloud > default)
    pub fn effective_zone(&self, flag: Option<&str>) -> String {
        self.resolve_zone(flag, |key| std::env::var(key).ok(), &GcloudProperties::load_default())
    }

    /// Get effective endpoint override (CLI > config)
    pub fn effective_endpoint(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string).or_else(|| self.endpoint.clone())
    }

    fn resolve_project<F>(&self, flag: Option<&str>, env: F, gcloud: &GcloudProperties) -> Result<Option<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Security: Validate project ID format before using it in request paths
        if let Some(project) = flag {
            if !validate_project_id(project) {
                bail!("Invalid project ID {:?}", project);
            }
            return Ok(Some(project.to_string()));
        }

        let candidates = self
            .project
            .clone()
            .into_iter()
            .map(|p| ("config file", p))
            .chain(PROJECT_ENV_VARS.iter().filter_map(|key| env(*key).map(|p| (*key, p))))
            .chain(gcloud.get("core", "project").map(|p| ("gcloud properties", p.to_string())));

        for (origin, project) in candidates {
            if validate_project_id(&project) {
                return Ok(Some(project));
            }
            tracing::warn!("Invalid project ID format in {}", origin);
        }

        Ok(None)
    }

    fn resolve_zone<F>(&self, flag: Option<&str>, env: F, gcloud: &GcloudProperties) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        flag.map(str::to_string)
            .or_else(|| self.zone.clone())
            .or_else(|| env(ZONE_ENV_VAR))
            .or_else(|| gcloud.get("compute", "zone").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_ZONE.to_string())
    }
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    (6..=30).contains(&project.len())
        && project.starts_with(|c: char| c.is_ascii_lowercase())
        && !project.ends_with('-')
        && project.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Properties read from the gcloud CLI configuration directory
///
/// Values from the active named configuration override the legacy
/// `properties` file.
#[derive(Debug, Clone, Default)]
pub struct GcloudProperties {
    sections: HashMap<String, HashMap<String, String>>,
}

impl GcloudProperties {
    /// Get the gcloud configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
            return Some(PathBuf::from(path));
        }

        // Default to ~/.config/gcloud on Linux/macOS
        dirs::config_dir().map(|p| p.join("gcloud"))
    }

    /// Load from the default gcloud directory; empty when there is none
    pub fn load_default() -> Self {
        let active = std::env::var("CLOUDSDK_ACTIVE_CONFIG_NAME").ok();
        Self::config_dir()
            .map(|dir| Self::load(&dir, active.as_deref()))
            .unwrap_or_default()
    }

    /// Load `properties` and the active configuration from `dir`
    ///
    /// `active` overrides the name stored in `dir/active_config`.
    pub fn load(dir: &Path, active: Option<&str>) -> Self {
        let mut properties = std::fs::read_to_string(dir.join("properties"))
            .map(|content| Self::parse(&content))
            .unwrap_or_default();

        let active = active
            .map(str::to_string)
            .or_else(|| std::fs::read_to_string(dir.join("active_config")).ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        if let Some(name) = active {
            // Security: Validate config name to prevent path traversal
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                tracing::warn!("Invalid characters in active gcloud configuration name");
                return properties;
            }

            let path = dir.join("configurations").join(format!("config_{}", name));
            if let Ok(content) = std::fs::read_to_string(&path) {
                properties.merge(Self::parse(&content));
            }
        }

        properties
    }

    /// Parse an INI-style gcloud properties document
    pub fn parse(content: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            // Security: Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = Some(name.trim().to_string());
                continue;
            }

            let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) else {
                continue;
            };

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.to_string());
        }

        Self { sections }
    }

    /// Look up `key` in `[section]`
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    fn merge(&mut self, other: Self) {
        for (section, values) in other.sections {
            self.sections.entry(section).or_default().extend(values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_validate_project_id() {
        assert!(validate_project_id("my-project-123"));
        assert!(!validate_project_id("short"));
        assert!(!validate_project_id("1starts-with-digit"));
        assert!(!validate_project_id("ends-with-hyphen-"));
        assert!(!validate_project_id("Upper-Case-Project"));
        assert!(!validate_project_id("../../etc/passwd"));
    }

    #[test]
    fn test_parse_properties() {
        let props = GcloudProperties::parse(
            "# comment\n[core]\naccount = me@example.com\nproject = my-project-123\n\n[compute]\nzone = europe-west1-b\nregion=\n",
        );
        assert_eq!(props.get("core", "project"), Some("my-project-123"));
        assert_eq!(props.get("compute", "zone"), Some("europe-west1-b"));
        assert_eq!(props.get("compute", "region"), None);
        assert_eq!(props.get("core", "zone"), None);
    }

    #[test]
    fn test_active_configuration_overrides_properties() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("properties"), "[core]\nproject = legacy-project\n").unwrap();
        std::fs::write(dir.path().join("active_config"), "work\n").unwrap();
        std::fs::create_dir(dir.path().join("configurations")).unwrap();
        std::fs::write(
            dir.path().join("configurations").join("config_work"),
            "[core]\nproject = work-project\n[compute]\nzone = asia-east1-a\n",
        )
        .unwrap();

        let props = GcloudProperties::load(dir.path(), None);
        assert_eq!(props.get("core", "project"), Some("work-project"));
        assert_eq!(props.get("compute", "zone"), Some("asia-east1-a"));

        let props = GcloudProperties::load(dir.path(), Some("missing"));
        assert_eq!(props.get("core", "project"), Some("legacy-project"));
    }

    #[test]
    fn test_active_configuration_name_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("properties"), "[core]\nproject = legacy-project\n").unwrap();

        let props = GcloudProperties::load(dir.path(), Some("../../secrets"));
        assert_eq!(props.get("core", "project"), Some("legacy-project"));
    }

    #[test]
    fn test_project_precedence() {
        let gcloud = GcloudProperties::parse("[core]\nproject = gcloud-project\n");
        let env = |key: &str| (key == "GOOGLE_CLOUD_PROJECT").then(|| "env-project".to_string());

        let config = Config {
            project: Some("config-project".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolve_project(Some("flag-project"), env, &gcloud).unwrap().as_deref(), Some("flag-project"));
        assert_eq!(config.resolve_project(None, env, &gcloud).unwrap().as_deref(), Some("config-project"));

        let empty = Config::default();
        assert_eq!(empty.resolve_project(None, env, &gcloud).unwrap().as_deref(), Some("env-project"));
        assert_eq!(empty.resolve_project(None, no_env, &gcloud).unwrap().as_deref(), Some("gcloud-project"));
        assert_eq!(empty.resolve_project(None, no_env, &GcloudProperties::default()).unwrap(), None);
    }

    #[test]
    fn test_invalid_project_flag_is_rejected() {
        let gcloud = GcloudProperties::parse("[core]\nproject = gcloud-project\n");
        let config = Config::default();

        for flag in ["../../etc", "Upper-Case-Project", "p?x=1", "short"] {
            let err = config.resolve_project(Some(flag), no_env, &gcloud).unwrap_err();
            assert!(err.to_string().contains("Invalid project ID"));
        }
    }

    #[test]
    fn test_invalid_project_falls_through() {
        let gcloud = GcloudProperties::parse("[core]\nproject = gcloud-project\n");
        let config = Config {
            project: Some("BAD".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolve_project(None, no_env, &gcloud).unwrap().as_deref(), Some("gcloud-project"));
    }

    #[test]
    fn test_zone_precedence() {
        let gcloud = GcloudProperties::parse("[compute]\nzone = europe-west4-a\n");
        let env = |key: &str| (key == ZONE_ENV_VAR).then(|| "us-east1-b".to_string());
        let empty = Config::default();

        assert_eq!(empty.resolve_zone(Some("asia-east1-c"), env, &gcloud), "asia-east1-c");
        assert_eq!(empty.resolve_zone(None, env, &gcloud), "us-east1-b");
        assert_eq!(empty.resolve_zone(None, no_env, &gcloud), "europe-west4-a");
        assert_eq!(empty.resolve_zone(None, no_env, &GcloudProperties::default()), DEFAULT_ZONE);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"project": "my-project-123", "endpoint": "http://localhost:9090"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.project.as_deref(), Some("my-project-123"));
        assert_eq!(config.zone, None);
        assert_eq!(config.effective_endpoint(None).as_deref(), Some("http://localhost:9090"));
        assert_eq!(config.effective_endpoint(Some("http://other")).as_deref(), Some("http://other"));

        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
