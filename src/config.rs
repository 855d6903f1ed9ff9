use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use toml::{Table, Value};
use tracing::debug;

use crate::client::ClientOptions;

const CONFIG_ENV: &str = "WEBCLIENT_CACHE_CONFIG_DIR";
const CONFIG_FILE: &str = "config.toml";
const CLIENT_SECTION: &str = "client";

/// Section name as found in deployed files, spelled with a Cyrillic "с" (U+0441).
pub const ACCEPT_CERTIFICATES_CYRILLIC: &str = "A\u{0441}ceptCertificates";
pub const ACCEPT_CERTIFICATES: &str = "AcceptCertificates";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to determine configuration directory")]
    MissingDirectory,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("section `{0}` must contain only string values")]
    InvalidSection(String),
}

/// Hierarchical configuration exposing named sections of scalar children.
pub trait ConfigSource {
    /// Child values of `name` in declaration order, or `None` when the section is absent.
    fn section(&self, name: &str) -> Result<Option<Vec<String>>, ConfigError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomlConfig {
    table: Table,
}

impl TomlConfig {
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(contents.parse::<Table>()?))
    }

    /// Options for built clients, from the optional `[client]` table.
    pub fn client_options(&self) -> Result<ClientOptions, ConfigError> {
        match self.table.get(CLIENT_SECTION) {
            Some(value) => Ok(value.clone().try_into()?),
            None => Ok(ClientOptions::default()),
        }
    }
}

impl ConfigSource for TomlConfig {
    fn section(&self, name: &str) -> Result<Option<Vec<String>>, ConfigError> {
        let invalid = || ConfigError::InvalidSection(name.to_string());
        let values: Vec<&Value> = match self.table.get(name) {
            None => return Ok(None),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Table(children)) => children.values().collect(),
            Some(_) => return Err(invalid()),
        };

        values
            .into_iter()
            .map(|value| value.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Collect accepted certificate thumbprints from both spellings of the section.
///
/// The Cyrillic-spelled section is read first, then the Latin one. Missing
/// sections contribute nothing.
pub fn allowed_thumbprints(source: &dyn ConfigSource) -> Result<Vec<String>, ConfigError> {
    let mut thumbprints = Vec::new();
    for name in [ACCEPT_CERTIFICATES_CYRILLIC, ACCEPT_CERTIFICATES] {
        if let Some(values) = source.section(name)? {
            debug!(section = name, count = values.len(), "read thumbprint section");
            thumbprints.extend(values);
        }
    }
    Ok(thumbprints)
}

/// Locates and reads the `config.toml` that lists trusted certificates.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use `$WEBCLIENT_CACHE_CONFIG_DIR/config.toml`, or the platform config directory.
    pub fn new() -> Result<Self, ConfigError> {
        let dir = match env::var_os(CONFIG_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("dev", "webclient-cache", "webclient-cache")
                .ok_or(ConfigError::MissingDirectory)?
                .config_dir()
                .to_path_buf(),
        };
        Ok(Self::in_dir(dir))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(CONFIG_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration file, treating a missing file as empty.
    pub fn load(&self) -> Result<TomlConfig, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => TomlConfig::parse(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no configuration file");
                Ok(TomlConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn thumbprints(contents: &str) -> Vec<String> {
        allowed_thumbprints(&TomlConfig::parse(contents).unwrap()).unwrap()
    }

    #[test]
    fn reads_latin_section() {
        let found = thumbprints(
            r#"
            AcceptCertificates = ["AA11", "BB22"]
            "#,
        );
        assert_eq!(found, vec!["AA11", "BB22"]);
    }

    #[test]
    fn reads_cyrillic_section() {
        let found = thumbprints(
            "[\"A\u{0441}ceptCertificates\"]\nfirst = \"CC33\"\nsecond = \"DD44\"\n",
        );
        assert_eq!(found, vec!["CC33", "DD44"]);
    }

    #[test]
    fn concatenates_both_sections_cyrillic_first() {
        let found = thumbprints(
            "AcceptCertificates = [\"LATIN1\", \"LATIN2\"]\n\
             \"A\u{0441}ceptCertificates\" = [\"CYR1\", \"CYR2\"]\n",
        );
        assert_eq!(found, vec!["CYR1", "CYR2", "LATIN1", "LATIN2"]);
    }

    #[test]
    fn missing_sections_yield_empty_list() {
        assert!(thumbprints("other = 1").is_empty());
        assert!(thumbprints("").is_empty());
    }

    #[test]
    fn rejects_non_string_children() {
        let config = TomlConfig::parse("AcceptCertificates = [1, 2]").unwrap();
        let err = allowed_thumbprints(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSection(name) if name == ACCEPT_CERTIFICATES));

        let config = TomlConfig::parse("AcceptCertificates = \"AA11\"").unwrap();
        assert!(allowed_thumbprints(&config).is_err());
    }

    #[test]
    fn reads_client_options() {
        let config = TomlConfig::parse(
            r#"
            [client]
            timeout_secs = 30
            user_agent = "search-indexer"
            "#,
        )
        .unwrap();
        let options = config.client_options().unwrap();
        assert_eq!(options.timeout_secs, Some(30));
        assert_eq!(options.user_agent, "search-indexer");

        let defaults = TomlConfig::default().client_options().unwrap();
        assert_eq!(defaults, ClientOptions::default());
    }

    #[test]
    fn loads_config_from_directory() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::in_dir(dir.path());
        fs::write(manager.path(), "AcceptCertificates = [\"AA11\"]\n").unwrap();

        let config = manager.load().unwrap();

        assert_eq!(allowed_thumbprints(&config).unwrap(), vec!["AA11"]);
        assert_eq!(manager.path(), dir.path().join("config.toml"));
    }

    #[test]
    fn missing_config_file_is_empty() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::in_dir(dir.path());

        let config = manager.load().unwrap();

        assert_eq!(config, TomlConfig::default());
        assert!(allowed_thumbprints(&config).unwrap().is_empty());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::in_dir(dir.path());
        fs::write(manager.path(), "AcceptCertificates = [").unwrap();

        match manager.load().unwrap_err() {
            ConfigError::TomlDe(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
