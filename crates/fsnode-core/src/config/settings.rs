//! Library configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the same behaviour as [`Config::default`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level configuration.
///
/// ```toml
/// [directory]
/// mode = "750"
///
/// [mime]
/// defaults = true
///
/// [mime.types]
/// log = "text/x-log"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub mime: MimeConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::NotReadable`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed or the
    ///   directory mode is not an octal number.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::NotReadable(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        config.directory.parsed_mode()?;
        Ok(config)
    }

    /// Permission bits applied to directories created with
    /// [`crate::DirectoryEntry::create_with`].
    pub fn directory_mode(&self) -> u32 {
        self.directory
            .parsed_mode()
            .unwrap_or(DEFAULT_DIRECTORY_MODE)
    }
}

/// Directory creation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Octal permission bits, e.g. `"755"` or `"0o700"`.
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl DirectoryConfig {
    fn parsed_mode(&self) -> CoreResult<u32> {
        parse_mode(&self.mode)
            .ok_or_else(|| CoreError::ConfigParse(format!("invalid directory mode: {}", self.mode)))
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
        }
    }
}

/// MIME registry seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimeConfig {
    /// Seed the registry with the built-in extension table.
    #[serde(default = "default_true")]
    pub defaults: bool,
    /// Extra `extension = "type"` pairs, applied after the defaults and
    /// overriding them.
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

impl Default for MimeConfig {
    fn default() -> Self {
        Self {
            defaults: true,
            types: BTreeMap::new(),
        }
    }
}

const DEFAULT_DIRECTORY_MODE: u32 = 0o755;

/// Parses an octal mode string, with or without a `0o`/`0` prefix.
fn parse_mode(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    let mode = u32::from_str_radix(digits, 8).ok()?;
    (mode <= 0o7777).then_some(mode)
}

fn default_true() -> bool {
    true
}

fn default_mode() -> String {
    "755".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_directory() {
        let config = Config::default();
        assert_eq!(config.directory.mode, "755");
        assert_eq!(config.directory_mode(), 0o755);
    }

    #[test]
    fn default_config_mime() {
        let config = Config::default();
        assert!(config.mime.defaults);
        assert!(config.mime.types.is_empty());
    }

    #[test]
    fn load_full_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[directory]
mode = "0o700"

[mime]
defaults = false

[mime.types]
log = "text/x-log"
md = "text/x-markdown"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.directory_mode(), 0o700);
        assert!(!config.mime.defaults);
        assert_eq!(config.mime.types.len(), 2);
        assert_eq!(config.mime.types["log"], "text/x-log");
    }

    #[test]
    fn load_partial_toml_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[mime.types]\nlog = \"text/plain\"\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert!(config.mime.defaults);
        assert_eq!(config.directory_mode(), 0o755);
    }

    #[test]
    fn load_empty_toml_uses_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.directory.mode, Config::default().directory.mode);
        assert!(config.mime.defaults);
    }

    #[test]
    fn load_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nonexistent.toml"));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn load_invalid_toml_returns_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid [[[toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result.unwrap_err(), CoreError::ConfigParse(_)));
    }

    #[test]
    fn load_rejects_non_octal_mode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[directory]\nmode = \"789\"\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result.unwrap_err(), CoreError::ConfigParse(_)));
    }

    #[test]
    fn parse_mode_variants() {
        assert_eq!(parse_mode("755"), Some(0o755));
        assert_eq!(parse_mode("0755"), Some(0o755));
        assert_eq!(parse_mode("0o700"), Some(0o700));
        assert_eq!(parse_mode(" 644 "), Some(0o644));
        assert_eq!(parse_mode(""), None);
        assert_eq!(parse_mode("rwx"), None);
        assert_eq!(parse_mode("77777"), None);
    }
}
