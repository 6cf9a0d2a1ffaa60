//! The data that makes up a single BitBake recipe.
use mash_package_xml::PackageMetadata;

use crate::{
    license::normalize_license,
    naming::{KeyResolver, NameResolver},
};

/// The dependency categories of a recipe, in the order they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyCategory {
    Build,
    Buildtool,
    BuildExport,
    BuildtoolExport,
    Exec,
    Test,
}

impl DependencyCategory {
    pub const ALL: [DependencyCategory; 6] = [
        DependencyCategory::Build,
        DependencyCategory::Buildtool,
        DependencyCategory::BuildExport,
        DependencyCategory::BuildtoolExport,
        DependencyCategory::Exec,
        DependencyCategory::Test,
    ];

    /// The BitBake variable holding the dependencies of this category.
    pub fn variable_name(self) -> &'static str {
        match self {
            DependencyCategory::Build => "ROS_BUILD_DEPENDS",
            DependencyCategory::Buildtool => "ROS_BUILDTOOL_DEPENDS",
            DependencyCategory::BuildExport => "ROS_EXPORT_DEPENDS",
            DependencyCategory::BuildtoolExport => "ROS_BUILDTOOL_EXPORT_DEPENDS",
            DependencyCategory::Exec => "ROS_EXEC_DEPENDS",
            DependencyCategory::Test => "ROS_TEST_DEPENDS",
        }
    }

    /// Buildtools run on the build host and need the native variant.
    pub fn is_native(self) -> bool {
        matches!(
            self,
            DependencyCategory::Buildtool | DependencyCategory::BuildtoolExport
        )
    }

    fn upstream(self, package: &PackageMetadata) -> &[String] {
        match self {
            DependencyCategory::Build => &package.build_depends,
            DependencyCategory::Buildtool => &package.buildtool_depends,
            DependencyCategory::BuildExport => &package.build_export_depends,
            DependencyCategory::BuildtoolExport => &package.buildtool_export_depends,
            DependencyCategory::Exec => &package.exec_depends,
            DependencyCategory::Test => &package.test_depends,
        }
    }
}

/// Resolved dependency names, kept in manifest order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dependencies {
    pub build: Vec<String>,
    pub build_export: Vec<String>,
    pub buildtool: Vec<String>,
    pub buildtool_export: Vec<String>,
    pub exec: Vec<String>,
    pub test: Vec<String>,
}

impl Dependencies {
    pub fn get(&self, category: DependencyCategory) -> &[String] {
        match category {
            DependencyCategory::Build => &self.build,
            DependencyCategory::Buildtool => &self.buildtool,
            DependencyCategory::BuildExport => &self.build_export,
            DependencyCategory::BuildtoolExport => &self.buildtool_export,
            DependencyCategory::Exec => &self.exec,
            DependencyCategory::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, category: DependencyCategory) -> &mut Vec<String> {
        match category {
            DependencyCategory::Build => &mut self.build,
            DependencyCategory::Buildtool => &mut self.buildtool,
            DependencyCategory::BuildExport => &mut self.build_export,
            DependencyCategory::BuildtoolExport => &mut self.buildtool_export,
            DependencyCategory::Exec => &mut self.exec,
            DependencyCategory::Test => &mut self.test,
        }
    }
}

/// Where the sources of a package come from.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GitMetadata {
    /// Value of `SRC_URI`
    pub source_uri: Option<String>,
    /// Commit hash used as `SRCREV`
    pub source_revision: Option<String>,
    pub branch: Option<String>,
    /// Name of the repository the package lives in, used as `ROS_CN`
    pub repository_name: Option<String>,
    pub tag_name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeMetadata {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub description: String,
    pub homepage: Option<String>,
    /// "Name <email>" of the first author
    pub author: Option<String>,
    /// "Name <email>" of the first maintainer
    pub maintainer: Option<String>,
    pub section: Option<String>,

    pub distro: String,

    pub licenses: Vec<String>,
    /// Line of the `<license>` element in `package.xml`
    pub license_line: usize,
    /// md5 of that line
    pub license_md5: String,

    pub dependencies: Dependencies,

    pub git: GitMetadata,
    /// Path of the package inside its repository, `/` separated. Empty when
    /// the package is the repository root.
    pub package_subpath: String,

    pub build_type: String,
}

impl RecipeMetadata {
    /// Build the recipe metadata of `package`, resolving its dependencies
    /// with `names`.
    pub fn import<R: KeyResolver>(package: &PackageMetadata, names: &NameResolver<'_, R>) -> Self {
        let mut dependencies = Dependencies::default();
        for category in DependencyCategory::ALL {
            let is_native = category.is_native();
            *dependencies.get_mut(category) = category
                .upstream(package)
                .iter()
                .map(|dep| names.resolve(dep, is_native))
                .collect();
        }

        RecipeMetadata {
            name: package.name.clone(),
            version: package.version.clone(),
            summary: None,
            description: package.description.clone(),
            homepage: package.homepage.clone(),
            author: non_empty(package.author_name())
                .map(|name| person(name, non_empty(package.author_email()))),
            maintainer: maintainer(
                non_empty(package.upstream_name()),
                non_empty(package.upstream_email()),
            ),
            section: None,
            distro: names.context().distro.clone(),
            licenses: package
                .upstream_license
                .iter()
                .map(|license| normalize_license(license))
                .collect(),
            license_line: package.license_line,
            license_md5: package.license_md5.clone(),
            dependencies,
            git: GitMetadata::default(),
            package_subpath: String::new(),
            build_type: package.build_type.clone(),
        }
    }

    pub fn with_git(mut self, git: GitMetadata) -> Self {
        self.git = git;
        self
    }

    pub fn with_package_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.package_subpath = subpath.into();
        self
    }

    /// File name of the recipe, e.g. `my-package_1.0.0.bb`
    pub fn recipe_file_name(&self) -> String {
        format!("{}_{}.bb", self.name.replace('_', "-"), self.version)
    }

    /// The license expression used for `LICENSE`
    pub fn license_expression(&self) -> String {
        self.licenses.join(" & ")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn person(name: &str, email: Option<&str>) -> String {
    match email {
        Some(email) => format!("{name} <{email}>"),
        None => name.to_string(),
    }
}

// A maintainer without a name is still identified by the email.
fn maintainer(name: Option<&str>, email: Option<&str>) -> Option<String> {
    match (name, email) {
        (Some(name), email) => Some(person(name, email)),
        (None, Some(email)) => Some(email.to_string()),
        (None, None) => None,
    }
}
