//! rosdep source lists (`sources.list.d/*.list`).
use std::path::Path;

use crate::RosdepError;

/// Directory searched for source lists when `ROSDEP_SOURCE_PATH` is not set.
pub const DEFAULT_SOURCES_LIST_DIR: &str = "/etc/ros/rosdep/sources.list.d";

/// One `yaml <url> [tags...]` entry of a source list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub url: String,
    pub tags: Vec<String>,
}

impl DataSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tags: Vec::new(),
        }
    }

    /// A source applies when every one of its tags names the platform or
    /// the distro.
    pub fn applies_to(&self, platform: &str, distro: &str) -> bool {
        self.tags
            .iter()
            .all(|tag| tag == platform || tag == distro)
    }
}

/// Parse the contents of a source list.
pub fn parse_sources_list(contents: &str) -> Vec<DataSource> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let kind = fields.next()?;
            let Some(url) = fields.next() else {
                tracing::warn!("ignoring source list line without a URL: {line}");
                return None;
            };
            if kind != "yaml" {
                tracing::debug!("skipping {kind} source {url}");
                return None;
            }
            Some(DataSource {
                url: url.to_string(),
                tags: fields.map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Read all `*.list` files of `dir` in file name order. A missing directory
/// yields no sources.
pub fn load_sources_dir(dir: &Path) -> Result<Vec<DataSource>, RosdepError> {
    if !dir.is_dir() {
        tracing::debug!("rosdep sources directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut lists = fs_err::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    lists.retain(|path| path.extension().is_some_and(|ext| ext == "list"));
    lists.sort();

    let mut sources = Vec::new();
    for list in lists {
        tracing::debug!("reading rosdep source list {}", list.display());
        sources.extend(parse_sources_list(&fs_err::read_to_string(&list)?));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
# os-specific listings first
yaml https://raw.githubusercontent.com/ros/rosdistro/master/rosdep/osx-homebrew.yaml osx

# generic
yaml https://raw.githubusercontent.com/ros/rosdistro/master/rosdep/base.yaml
yaml file:///etc/ros/rosdep/openembedded.yaml openembedded jazzy
gbpdistro https://raw.githubusercontent.com/ros/rosdistro/master/releases/fuerte.yaml fuerte
";

    #[test]
    fn test_parse_sources_list() {
        let sources = parse_sources_list(LIST);
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].tags, vec!["osx"]);
        assert_eq!(
            sources[1],
            DataSource::new("https://raw.githubusercontent.com/ros/rosdistro/master/rosdep/base.yaml")
        );
        assert_eq!(sources[2].tags, vec!["openembedded", "jazzy"]);
    }

    #[test]
    fn test_applies_to() {
        let sources = parse_sources_list(LIST);
        let applying: Vec<_> = sources
            .iter()
            .filter(|source| source.applies_to("openembedded", "jazzy"))
            .map(|source| source.url.as_str())
            .collect();
        assert_eq!(
            applying,
            vec![
                "https://raw.githubusercontent.com/ros/rosdistro/master/rosdep/base.yaml",
                "file:///etc/ros/rosdep/openembedded.yaml",
            ]
        );
        assert!(!sources[2].applies_to("openembedded", "humble"));
    }

    #[test]
    fn test_load_sources_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("20-default.list"), LIST).unwrap();
        fs_err::write(dir.path().join("10-local.list"), "yaml /opt/local.yaml\n").unwrap();
        fs_err::write(dir.path().join("README"), "yaml /ignored.yaml\n").unwrap();

        let sources = load_sources_dir(dir.path()).unwrap();
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].url, "/opt/local.yaml");

        assert!(load_sources_dir(&dir.path().join("missing")).unwrap().is_empty());
    }
}
