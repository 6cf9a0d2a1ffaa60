//! Discovery, selection and ordering of the ROS packages in a workspace.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
};

use mash_package_xml::{PACKAGE_MANIFEST, PackageMetadata};
use miette::Diagnostic;
use petgraph::{Direction, graph::DiGraph};
use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

/// Marker files that exclude a directory from discovery.
const IGNORE_MARKERS: &[&str] = &["COLCON_IGNORE", "AMENT_IGNORE", "CATKIN_IGNORE"];

#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("Found a dependency cycle between the packages: {}", .0.join(", "))]
    #[diagnostic(help("remove one of the dependencies or select fewer packages"))]
    DependencyCycle(Vec<String>),

    #[error("Invalid package name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A package found in one of the base paths.
#[derive(Debug, Clone)]
pub struct DiscoveredPackage {
    /// Directory containing the manifest
    pub path: PathBuf,
    pub manifest: PackageMetadata,
}

impl DiscoveredPackage {
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(PACKAGE_MANIFEST)
    }

    /// The package type as shown to the user, e.g. `ros.ament_cmake`
    pub fn package_type(&self) -> String {
        format!("ros.{}", self.manifest.build_type)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
}

fn is_ignored(path: &Path) -> bool {
    IGNORE_MARKERS
        .iter()
        .any(|marker| path.join(marker).exists())
}

fn display_path(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}

/// Find all packages below `base_paths`. Directories containing an ignore
/// marker, hidden directories and `build_base` are skipped, and package
/// directories are not searched for further packages.
pub fn discover_packages(base_paths: &[PathBuf], build_base: &Path) -> Vec<DiscoveredPackage> {
    let build_base = build_base.canonicalize().ok();
    let mut seen_dirs = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut packages = Vec::new();

    for base_path in base_paths {
        if !base_path.is_dir() {
            tracing::warn!("base path {} is not a directory", base_path.display());
            continue;
        }

        let mut walker = WalkDir::new(base_path).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("could not search for packages: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if (entry.depth() > 0 && is_hidden(path))
                || is_ignored(path)
                || build_base.as_ref() == Some(&canonical)
            {
                walker.skip_current_dir();
                continue;
            }

            let manifest = path.join(PACKAGE_MANIFEST);
            if !manifest.is_file() {
                continue;
            }
            walker.skip_current_dir();

            if !seen_dirs.insert(canonical) {
                continue;
            }

            match PackageMetadata::from_path(&manifest) {
                Ok(metadata) => {
                    if !seen_names.insert(metadata.name.clone()) {
                        tracing::warn!(
                            "ignoring duplicate package {} in {}",
                            metadata.name,
                            path.display()
                        );
                        continue;
                    }
                    tracing::debug!("found package {} in {}", metadata.name, path.display());
                    packages.push(DiscoveredPackage {
                        path: display_path(path),
                        manifest: metadata,
                    });
                }
                Err(e) => tracing::warn!("skipping {}: {e}", manifest.display()),
            }
        }
    }

    packages
}

/// Sort packages so that every package comes after its dependencies. Ties
/// are broken by name.
pub fn topological_order(
    packages: Vec<DiscoveredPackage>,
) -> Result<Vec<DiscoveredPackage>, DiscoveryError> {
    let mut graph = DiGraph::<DiscoveredPackage, ()>::new();
    let indices: HashMap<String, _> = packages
        .into_iter()
        .map(|package| (package.name().to_string(), graph.add_node(package)))
        .collect();

    for (name, &index) in &indices {
        let dependencies: BTreeSet<String> = graph[index]
            .manifest
            .all_dependencies()
            .map(str::to_string)
            .collect();
        for dependency in dependencies {
            match indices.get(&dependency) {
                Some(&dependency) if dependency != index => {
                    graph.add_edge(dependency, index, ());
                }
                Some(_) => tracing::debug!("{name} depends on itself"),
                None => {}
            }
        }
    }

    let mut in_degree: HashMap<_, usize> = graph
        .node_indices()
        .map(|node| (node, graph.neighbors_directed(node, Direction::Incoming).count()))
        .collect();
    let mut ready: BTreeMap<String, _> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(&node, _)| (graph[node].name().to_string(), node))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some((_, node)) = ready.pop_first() {
        order.push(node);
        for dependent in graph.neighbors_directed(node, Direction::Outgoing) {
            if let Some(degree) = in_degree.get_mut(&dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(graph[dependent].name().to_string(), dependent);
                }
            }
        }
    }

    if order.len() != graph.node_count() {
        let emitted: HashSet<_> = order.iter().collect();
        let mut cycle: Vec<String> = graph
            .node_indices()
            .filter(|node| !emitted.contains(node))
            .map(|node| graph[node].name().to_string())
            .collect();
        cycle.sort();
        return Err(DiscoveryError::DependencyCycle(cycle));
    }

    Ok(order.into_iter().map(|node| graph[node].clone()).collect())
}

/// Package selection given on the command line.
#[derive(Debug, Default, Clone)]
pub struct PackageSelection {
    pub select: Vec<String>,
    pub skip: Vec<String>,
    pub up_to: Vec<String>,
    pub select_regex: Vec<Regex>,
    pub skip_regex: Vec<Regex>,
}

/// The result of applying a [`PackageSelection`].
#[derive(Debug)]
pub enum Selected<'a> {
    Package(&'a DiscoveredPackage),
    /// A package was requested by name but not discovered.
    Missing(String),
}

impl PackageSelection {
    pub fn new(
        select: Vec<String>,
        skip: Vec<String>,
        up_to: Vec<String>,
        select_regex: &[String],
        skip_regex: &[String],
    ) -> Result<Self, DiscoveryError> {
        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            select,
            skip,
            up_to,
            select_regex: compile(select_regex)?,
            skip_regex: compile(skip_regex)?,
        })
    }

    fn selects_subset(&self) -> bool {
        !self.select.is_empty() || !self.up_to.is_empty() || !self.select_regex.is_empty()
    }

    /// Apply the selection to `packages`, keeping their order. Names that
    /// were requested but not discovered are reported after the packages.
    pub fn apply<'a>(&self, packages: &'a [DiscoveredPackage]) -> Vec<Selected<'a>> {
        let by_name: HashMap<&str, &DiscoveredPackage> = packages
            .iter()
            .map(|package| (package.name(), package))
            .collect();

        let mut selected: HashSet<&str> = HashSet::new();
        if self.selects_subset() {
            selected.extend(
                self.select
                    .iter()
                    .map(String::as_str)
                    .filter(|name| by_name.contains_key(name)),
            );
            selected.extend(
                packages
                    .iter()
                    .map(DiscoveredPackage::name)
                    .filter(|name| self.select_regex.iter().any(|re| re.is_match(name))),
            );

            // everything the requested packages depend on, recursively
            let mut stack: Vec<&'a DiscoveredPackage> = self
                .up_to
                .iter()
                .filter_map(|name| by_name.get(name.as_str()).copied())
                .collect();
            let mut visited = HashSet::new();
            while let Some(package) = stack.pop() {
                if !visited.insert(package.name()) {
                    continue;
                }
                selected.insert(package.name());
                stack.extend(
                    package
                        .manifest
                        .all_dependencies()
                        .filter_map(|dep| by_name.get(dep).copied()),
                );
            }
        } else {
            selected.extend(packages.iter().map(DiscoveredPackage::name));
        }

        selected.retain(|name| {
            !self.skip.iter().any(|skip| skip == name)
                && !self.skip_regex.iter().any(|re| re.is_match(name))
        });

        let mut result: Vec<Selected<'a>> = packages
            .iter()
            .filter(|package| selected.contains(package.name()))
            .map(Selected::Package)
            .collect();

        let mut missing = BTreeSet::new();
        for name in self.select.iter().chain(&self.up_to) {
            if !by_name.contains_key(name.as_str()) {
                missing.insert(name.clone());
            }
        }
        result.extend(missing.into_iter().map(Selected::Missing));
        result
    }
}
