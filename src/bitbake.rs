//! The `bitbake` verb: one recipe per selected package.

use std::path::{Path, PathBuf};

use mash_git::{Git, GitProvenance};
use mash_recipe::{
    GitMetadata, KeyResolver, NameResolver, PLATFORM, RecipeMetadata, ResolutionContext,
    write_recipe,
};
use mash_rosdep::{RosdepDatabase, load_sources_dir};
use miette::IntoDiagnostic;

use crate::{
    discovery::{DiscoveredPackage, Selected, discover_packages, topological_order},
    opt::BitbakeData,
    tool_configuration::Configuration,
};

/// The line printed for every selected package
fn package_line(package: &DiscoveredPackage) -> String {
    format!(
        "{:<30}\t{:<30}\t({})",
        package.name(),
        package.path.display().to_string(),
        package.package_type()
    )
}

fn git_metadata(provenance: GitProvenance) -> GitMetadata {
    GitMetadata {
        source_uri: provenance.src_uri,
        source_revision: provenance.commit,
        branch: provenance.branch,
        repository_name: provenance.repository_name,
        tag_name: provenance.tag,
    }
}

/// Generate and write the recipe of `package` to `build_base`, returning the
/// path of the recipe.
pub fn generate_recipe<R: KeyResolver>(
    package: &DiscoveredPackage,
    names: &NameResolver<'_, R>,
    git: Option<&Git>,
    build_base: &Path,
) -> std::io::Result<PathBuf> {
    let mut recipe = RecipeMetadata::import(&package.manifest, names);

    if let Some(git) = git {
        match GitProvenance::discover(git, &package.path, &names.context().distro) {
            Ok(provenance) => {
                let subpath = provenance.package_subpath(&package.path);
                recipe = recipe
                    .with_package_subpath(subpath)
                    .with_git(git_metadata(provenance));
            }
            Err(e) => tracing::warn!(
                "could not open git repository for package {}: {e}",
                package.name()
            ),
        }
    }

    write_recipe(build_base, &recipe)
}

/// Load the rosdep database from the user sources followed by the system
/// source lists that apply to `distro`.
async fn load_rosdep_database(
    data: &BitbakeData,
    configuration: &Configuration,
) -> miette::Result<RosdepDatabase> {
    let mut sources = data.rosdep_sources.clone();
    sources.extend(
        load_sources_dir(&data.rosdep_source_path)
            .into_diagnostic()?
            .into_iter()
            .filter(|source| source.applies_to(PLATFORM, &data.rosdistro)),
    );

    if sources.is_empty() {
        tracing::warn!(
            "no rosdep sources found in {}, external dependencies are named by convention",
            data.rosdep_source_path.display()
        );
    }

    let database = RosdepDatabase::load(&configuration.client, &sources).await;
    tracing::debug!("{} rosdep keys from {} sources", database.len(), sources.len());
    Ok(database)
}

/// Generate the recipes of all selected packages.
pub async fn run_bitbake(data: BitbakeData, configuration: &Configuration) -> miette::Result<()> {
    let (released_packages, _) = mash_rosdep::release_packages(
        &configuration.client,
        &data.rosdistro_index_url,
        &data.rosdistro,
    )
    .await
    .map_err(|e| miette::miette!("Could not read the {} release: {e}", data.rosdistro))?;
    tracing::debug!(
        "{} packages are released in {}",
        released_packages.len(),
        data.rosdistro
    );

    let database = load_rosdep_database(&data, configuration).await?;
    let context =
        ResolutionContext::new(data.rosdistro.as_str()).with_internal_packages(released_packages);
    let names = NameResolver::new(&context, &database);

    let packages = topological_order(discover_packages(&data.base_paths, &data.build_base))?;
    let build_base = std::path::absolute(&data.build_base).into_diagnostic()?;

    let git = Git::find()
        .map_err(|e| tracing::warn!("{e}, recipes will not contain source information"))
        .ok();

    for selected in data.selection.apply(&packages) {
        let package = match selected {
            Selected::Package(package) => package,
            Selected::Missing(name) => {
                println!("\t- No ROS package manifest found for {name}");
                continue;
            }
        };

        let _span = tracing::info_span!("package", name = package.name()).entered();
        println!("{}", package_line(package));
        println!(
            "\t- ROS package manifest: {}",
            package.manifest_path().display()
        );

        let recipe = generate_recipe(package, &names, git.as_ref(), &build_base).map_err(|e| {
            miette::miette!("Could not write the recipe of {}: {e}", package.name())
        })?;
        println!("\t- Bitbake recipe: {}", recipe.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::process::Command;

    use mash_package_xml::PackageMetadata;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0"?>
<?xml-model href="http://download.ros.org/schema/package_format3.xsd" schematypens="http://www.w3.org/2001/XMLSchema"?>
<package format="3">
  <name>demo_nodes_cpp</name>
  <version>0.33.5</version>
  <description>C++ nodes which were previously in the ros2/examples repository.</description>
  <maintainer email="aditya@example.com">Aditya Pande</maintainer>
  <license>Apache License 2.0</license>
  <url type="website">https://github.com/ros2/demos</url>
  <buildtool_depend>ament_cmake</buildtool_depend>
  <depend>rclcpp</depend>
  <depend>yaml_cpp_vendor</depend>
  <exec_depend>python3-yaml</exec_depend>
  <export>
    <build_type>ament_cmake</build_type>
  </export>
</package>
"#;

    const ROSDEP: &str = r#"
python3-yaml:
  openembedded: [python3-pyyaml@meta-python]
"#;

    fn package(root: &Path) -> DiscoveredPackage {
        let path = root.join("demos").join("demo_nodes_cpp");
        fs_err::create_dir_all(&path).unwrap();
        fs_err::write(path.join("package.xml"), MANIFEST).unwrap();
        DiscoveredPackage {
            manifest: PackageMetadata::from_path(path.join("package.xml")).unwrap(),
            path,
        }
    }

    fn generate(root: &Path, git: Option<&Git>) -> String {
        let database = RosdepDatabase::from_documents([ROSDEP]).unwrap();
        let context = ResolutionContext::new("jazzy")
            .with_internal_packages(["ament_cmake", "rclcpp", "demo_nodes_cpp"]);
        let names = NameResolver::new(&context, &database);

        let package = package(root);
        let build_base = root.join("build_mash");
        let recipe = generate_recipe(&package, &names, git, &build_base).unwrap();
        assert_eq!(
            recipe,
            build_base
                .join("demo_nodes_cpp")
                .join("demo-nodes-cpp_0.33.5.bb")
        );
        fs_err::read_to_string(recipe).unwrap()
    }

    fn section<'a>(recipe: &'a str, start: &str) -> Vec<&'a str> {
        recipe
            .lines()
            .skip_while(|line| !line.starts_with(start))
            .take_while(|line| !line.is_empty())
            .collect()
    }

    #[test]
    fn test_generate_recipe_without_git() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = generate(dir.path(), None);

        assert_eq!(
            section(&recipe, "DESCRIPTION"),
            vec![
                "DESCRIPTION = \"C++ nodes which were previously in the ros2/examples repository.\"",
                "AUTHOR = \"Aditya Pande <aditya@example.com>\"",
                "HOMEPAGE = \"https://github.com/ros2/demos\"",
                "LICENSE = \"Apache-2.0\"",
                "LIC_FILES_CHKSUM = \"file://package.xml;beginline=8;endline=8;md5=12c26a18c7f493fdc7e8a93b16b7c04f\"",
            ]
        );
        assert_eq!(
            section(&recipe, "ROS_BUILD_DEPENDS"),
            vec![
                "ROS_BUILD_DEPENDS = \"\\",
                "    rclcpp\\",
                "    yaml-cpp-vendor\\",
                "\"",
            ]
        );
        assert_eq!(
            section(&recipe, "ROS_BUILDTOOL_DEPENDS"),
            vec!["ROS_BUILDTOOL_DEPENDS = \"\\", "    ament-cmake-native\\", "\""]
        );
        assert_eq!(
            section(&recipe, "ROS_EXEC_DEPENDS"),
            vec![
                "ROS_EXEC_DEPENDS = \"\\",
                "    rclcpp\\",
                "    yaml-cpp-vendor\\",
                "    python3-pyyaml\\",
                "\"",
            ]
        );
        assert_eq!(
            section(&recipe, "ROS_BRANCH"),
            vec![
                "ROS_BRANCH ?= \"branch=\"",
                "SRC_URI = \"\"",
                "SRCREV = \"\"",
                "S = \"${WORKDIR}/git\"",
            ]
        );
        assert!(recipe.starts_with("# Recipe created by mash\n"));
        assert!(recipe.contains("\ninherit ros_distro_jazzy\n"));
    }

    #[test]
    fn test_generate_recipe_with_git() {
        let Ok(git) = Git::find() else {
            eprintln!("git is not installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        package(dir.path());

        let repo = dir.path().join("demos");
        for args in [
            vec!["init", "-q"],
            vec!["symbolic-ref", "HEAD", "refs/heads/jazzy"],
            vec!["add", "."],
            vec![
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
                "commit",
                "-q",
                "-m",
                "initial",
            ],
            vec!["remote", "add", "origin", "git@github.com:ros2/demos.git"],
        ] {
            let status = Command::new("git")
                .args(&args)
                .current_dir(&repo)
                .status()
                .unwrap();
            assert!(status.success());
        }

        let recipe = generate(dir.path(), Some(&git));
        let source = section(&recipe, "ROS_BRANCH");
        assert_eq!(source[0], "ROS_BRANCH ?= \"branch=jazzy\"");
        assert_eq!(
            source[1],
            "SRC_URI = \"git://git@github.com/ros2/demos.git;${ROS_BRANCH};protocol=ssh\""
        );
        assert_eq!(source[3], "S = \"${WORKDIR}/git/demo_nodes_cpp\"");
        assert!(recipe.contains("\nROS_CN = \"demos\"\n"));
    }

    #[test]
    #[traced_test]
    fn test_package_outside_of_a_repository() {
        let Ok(git) = Git::find() else {
            eprintln!("git is not installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let recipe = generate(dir.path(), Some(&git));

        assert!(logs_contain("could not open git repository for package demo_nodes_cpp"));
        assert!(recipe.contains("\nSRC_URI = \"\"\n"));
    }

    #[test]
    fn test_package_line() {
        let dir = tempfile::tempdir().unwrap();
        let package = DiscoveredPackage {
            path: PathBuf::from("src/demos/demo_nodes_cpp"),
            ..package(dir.path())
        };
        assert_eq!(
            package_line(&package),
            "demo_nodes_cpp                \tsrc/demos/demo_nodes_cpp      \t(ros.ament_cmake)"
        );
    }
}
