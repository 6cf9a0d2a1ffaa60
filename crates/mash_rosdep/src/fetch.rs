//! Reading of YAML documents from URLs or from disk.
use std::path::PathBuf;

use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::RosdepError;

/// A place a document can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(Url),
    Path(PathBuf),
}

impl Location {
    /// Parse a URL, `file://` URLs and anything that is not a URL become a
    /// path.
    pub fn parse(location: &str) -> Result<Self, RosdepError> {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Location::Path)
                .map_err(|_| RosdepError::InvalidLocation(location.to_string())),
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Location::Url(url)),
            Ok(_) => Err(RosdepError::InvalidLocation(location.to_string())),
            Err(_) => Ok(Location::Path(PathBuf::from(location))),
        }
    }

    /// Resolve `reference` relative to this location.
    pub fn join(&self, reference: &str) -> Result<Self, RosdepError> {
        if Url::parse(reference).is_ok() {
            return Self::parse(reference);
        }
        match self {
            Location::Url(url) => url
                .join(reference)
                .map(Location::Url)
                .map_err(|_| RosdepError::InvalidLocation(reference.to_string())),
            Location::Path(path) => Ok(Location::Path(
                path.parent()
                    .map(|parent| parent.join(reference))
                    .unwrap_or_else(|| PathBuf::from(reference)),
            )),
        }
    }

    /// Read the document as text.
    pub async fn read(&self, client: &ClientWithMiddleware) -> Result<String, RosdepError> {
        match self {
            Location::Url(url) => {
                tracing::debug!("downloading {url}");
                let response = client.get(url.clone()).send().await?.error_for_status()?;
                Ok(response.text().await?)
            }
            Location::Path(path) => {
                tracing::debug!("reading {}", path.display());
                Ok(fs_err::read_to_string(path)?)
            }
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{url}"),
            Location::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read and deserialize a YAML document.
pub async fn read_yaml<T: serde::de::DeserializeOwned>(
    client: &ClientWithMiddleware,
    location: &Location,
) -> Result<T, RosdepError> {
    let text = location.read(client).await?;
    serde_yaml::from_str(&text).map_err(|source| RosdepError::Yaml {
        location: location.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            Location::parse("https://example.com/index-v4.yaml").unwrap(),
            Location::Url(Url::parse("https://example.com/index-v4.yaml").unwrap())
        );
        assert_eq!(
            Location::parse("file:///etc/ros/base.yaml").unwrap(),
            Location::Path(PathBuf::from("/etc/ros/base.yaml"))
        );
        assert_eq!(
            Location::parse("rosdep/base.yaml").unwrap(),
            Location::Path(PathBuf::from("rosdep/base.yaml"))
        );
        assert!(Location::parse("ftp://example.com/base.yaml").is_err());
    }

    #[test]
    fn test_join() {
        let index = Location::parse("https://example.com/rosdistro/index-v4.yaml").unwrap();
        assert_eq!(
            index.join("jazzy/distribution.yaml").unwrap().to_string(),
            "https://example.com/rosdistro/jazzy/distribution.yaml"
        );

        let index = Location::parse("/srv/rosdistro/index-v4.yaml").unwrap();
        assert_eq!(
            index.join("jazzy/distribution.yaml").unwrap(),
            Location::Path(PathBuf::from("/srv/rosdistro/jazzy/distribution.yaml"))
        );
        assert_eq!(
            index.join("https://example.com/other.yaml").unwrap().to_string(),
            "https://example.com/other.yaml"
        );
    }
}
