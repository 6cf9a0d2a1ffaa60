//! The rosdistro index and distribution files, used to find the packages
//! released as part of a distribution.
use std::collections::BTreeMap;

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::{
    RosdepError,
    fetch::{Location, read_yaml},
};

/// Index used when `ROSDISTRO_INDEX_URL` is not set.
pub const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/ros/rosdistro/master/index-v4.yaml";

/// `index-v4.yaml` (REP 153)
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionIndex {
    #[serde(skip)]
    location: Option<Location>,
    #[serde(default)]
    pub distributions: BTreeMap<String, DistributionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionEntry {
    /// Distribution files, relative to the index
    #[serde(default)]
    pub distribution: Vec<String>,
    pub distribution_status: Option<String>,
    pub distribution_type: Option<String>,
}

impl DistributionIndex {
    pub async fn fetch(client: &ClientWithMiddleware, index_url: &str) -> Result<Self, RosdepError> {
        let location = Location::parse(index_url)?;
        let mut index: DistributionIndex = read_yaml(client, &location).await?;
        index.location = Some(location);
        Ok(index)
    }

    /// Locations of the distribution files of `distro`.
    pub fn distribution_files(&self, distro: &str) -> Result<Vec<Location>, RosdepError> {
        let entry = self
            .distributions
            .get(distro)
            .ok_or_else(|| RosdepError::UnknownDistro {
                distro: distro.to_string(),
                index: self
                    .location
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            })?;

        entry
            .distribution
            .iter()
            .map(|file| match &self.location {
                Some(location) => location.join(file),
                None => Location::parse(file),
            })
            .collect()
    }
}

/// A `distribution.yaml` file, or several of them merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Distribution {
    #[serde(default)]
    pub repositories: BTreeMap<String, Repository>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Repository {
    pub release: Option<ReleaseRepository>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseRepository {
    /// Packages released from the repository. Empty means a single package
    /// named like the repository.
    #[serde(default)]
    pub packages: Vec<String>,
    pub url: Option<String>,
    pub version: Option<String>,
}

impl Distribution {
    /// Fetch and merge the distribution files of `distro`. Repositories of
    /// later files replace those of earlier files.
    pub async fn fetch(
        client: &ClientWithMiddleware,
        index: &DistributionIndex,
        distro: &str,
    ) -> Result<Self, RosdepError> {
        let mut merged = Distribution::default();
        for file in index.distribution_files(distro)? {
            let distribution: Distribution = read_yaml(client, &file).await?;
            tracing::debug!(
                "{} repositories in distribution file {file}",
                distribution.repositories.len()
            );
            merged.merge(distribution);
        }
        Ok(merged)
    }

    pub fn merge(&mut self, other: Distribution) {
        self.repositories.extend(other.repositories);
    }

    /// Names of the released packages, split into those whose repository
    /// has a release version and those without.
    pub fn release_packages(&self) -> (Vec<String>, Vec<String>) {
        let mut versioned = Vec::new();
        let mut unversioned = Vec::new();

        for (repository_name, repository) in &self.repositories {
            let Some(release) = &repository.release else {
                continue;
            };

            let packages = if release.packages.is_empty() {
                vec![repository_name.clone()]
            } else {
                release.packages.clone()
            };

            if release.version.is_some() {
                versioned.extend(packages);
            } else {
                unversioned.extend(packages);
            }
        }

        versioned.sort();
        unversioned.sort();
        (versioned, unversioned)
    }
}

/// Fetch the packages released in `distro`, see
/// [`Distribution::release_packages`].
pub async fn release_packages(
    client: &ClientWithMiddleware,
    index_url: &str,
    distro: &str,
) -> Result<(Vec<String>, Vec<String>), RosdepError> {
    let index = DistributionIndex::fetch(client, index_url).await?;
    let distribution = Distribution::fetch(client, &index, distro).await?;
    Ok(distribution.release_packages())
}
