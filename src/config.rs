//! The mash configuration file (`config.toml`).

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Name of the configuration file inside the mash home directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// An error that can occur while loading the configuration file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Could not read config file ({0}): {1}")]
    IOError(PathBuf, std::io::Error),

    #[error("Could not parse config file ({0}): {1}")]
    #[diagnostic(help("see `mash --help` for the available settings"))]
    ParseError(PathBuf, toml::de::Error),
}

/// Settings that can be stored in the configuration file. Command line
/// flags and environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MashConfig {
    /// Name of the ROS distribution
    pub rosdistro: Option<String>,

    /// Directory the recipes are written to
    pub build_base: Option<PathBuf>,

    /// URL of the rosdistro index
    pub rosdistro_index_url: Option<String>,

    /// Additional rosdep YAML files, they take precedence over the system
    /// source lists
    #[serde(default)]
    pub rosdep_sources: Vec<String>,

    /// Directories searched for packages
    #[serde(default)]
    pub base_paths: Vec<PathBuf>,
}

/// The mash home directory, `$MASH_HOME` or `~/.mash`.
pub fn mash_home() -> Option<PathBuf> {
    std::env::var_os("MASH_HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".mash")))
}

impl MashConfig {
    /// Read a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs_err::read_to_string(path)
            .map_err(|e| ConfigError::IOError(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Load the configuration from `config_file` if given, otherwise from
    /// the mash home directory. Only an explicitly requested file has to
    /// exist.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_home(config_file, mash_home().as_deref())
    }

    fn load_with_home(config_file: Option<&Path>, home: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(config_file) = config_file {
            tracing::debug!("loading config from {}", config_file.display());
            return Self::from_path(config_file);
        }

        match home.map(|home| home.join(CONFIG_FILE_NAME)) {
            Some(path) if path.is_file() => {
                tracing::debug!("loading config from {}", path.display());
                Self::from_path(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
rosdistro = "jazzy"
build-base = "recipes"
rosdistro-index-url = "file:///srv/rosdistro/index-v4.yaml"
rosdep-sources = ["/srv/rosdep/openembedded.yaml"]
base-paths = ["src", "vendor"]
"#;

    #[test]
    fn test_parse_config() {
        let config: MashConfig = toml::from_str(CONFIG).unwrap();
        assert_eq!(
            config,
            MashConfig {
                rosdistro: Some("jazzy".into()),
                build_base: Some("recipes".into()),
                rosdistro_index_url: Some("file:///srv/rosdistro/index-v4.yaml".into()),
                rosdep_sources: vec!["/srv/rosdep/openembedded.yaml".into()],
                base_paths: vec!["src".into(), "vendor".into()],
            }
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs_err::write(&path, "ros-distro = \"jazzy\"\n").unwrap();
        assert!(matches!(
            MashConfig::from_path(&path),
            Err(ConfigError::ParseError(..))
        ));
    }

    #[test]
    fn test_load_from_home() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(
            MashConfig::load_with_home(None, Some(home.path())).unwrap(),
            MashConfig::default()
        );

        fs_err::write(home.path().join(CONFIG_FILE_NAME), CONFIG).unwrap();
        let config = MashConfig::load_with_home(None, Some(home.path())).unwrap();
        assert_eq!(config.rosdistro.as_deref(), Some("jazzy"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            MashConfig::load_with_home(Some(&missing), None),
            Err(ConfigError::IOError(..))
        ));
    }
}
