use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::metadata::{DependencyCategory, RecipeMetadata};

const RECIPE_HEADER: &str = "\
# Recipe created by mash
#
# Copyright (c) 2025 Open Source Robotics Foundation, Inc.
";

const TEST_DEPENDS_NOTE: &str =
    "# Currently informational only -- see http://www.ros.org/reps/rep-0149.html#dependency-tags.";

const RECIPE_DEPENDS: &str = r#"DEPENDS = "${ROS_BUILD_DEPENDS} ${ROS_BUILDTOOL_DEPENDS}"
# Bitbake doesn't support the "export" concept, so build them as if we needed
# them to build this package (even though we actually don't) so that they're
# guaranteed to have been staged should this package appear in another's
# DEPENDS.
DEPENDS += "${ROS_EXPORT_DEPENDS} ${ROS_BUILDTOOL_EXPORT_DEPENDS}"

RDEPENDS:${PN} += "${ROS_EXEC_DEPENDS}"
"#;

const INDENT: &str = "    ";

/// Write a variable in the line-continuation form, one item per line.
fn write_multiline<'a>(
    f: &mut fmt::Formatter,
    name: &str,
    items: impl IntoIterator<Item = &'a str>,
) -> fmt::Result {
    let mut items = items.into_iter().peekable();
    if items.peek().is_none() {
        return writeln!(f, "{name} = \"\"");
    }

    writeln!(f, "{name} = \"\\")?;
    for item in items {
        writeln!(f, "{INDENT}{item}\\")?;
    }
    writeln!(f, "\"")
}

fn or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

impl fmt::Display for RecipeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{RECIPE_HEADER}")?;
        writeln!(f, "inherit ros_distro_{}", self.distro)?;
        writeln!(f, "inherit mash_generated")?;
        writeln!(f)?;

        if let Some(summary) = &self.summary {
            writeln!(f, "SUMMARY = \"{summary}\"")?;
        }

        if self.description.contains('\n') {
            write_multiline(f, "DESCRIPTION", self.description.lines().map(str::trim))?;
        } else {
            writeln!(f, "DESCRIPTION = \"{}\"", self.description)?;
        }

        writeln!(f, "AUTHOR = \"{}\"", or_empty(&self.maintainer))?;
        if let Some(author) = &self.author {
            writeln!(f, "ROS_AUTHOR = \"{author}\"")?;
        }
        writeln!(f, "HOMEPAGE = \"{}\"", or_empty(&self.homepage))?;
        if let Some(section) = &self.section {
            writeln!(f, "SECTION = \"{section}\"")?;
        }
        writeln!(f, "LICENSE = \"{}\"", self.license_expression())?;
        writeln!(
            f,
            "LIC_FILES_CHKSUM = \"file://package.xml;beginline={line};endline={line};md5={md5}\"",
            line = self.license_line,
            md5 = self.license_md5,
        )?;
        writeln!(f)?;

        writeln!(f, "ROS_CN = \"{}\"", or_empty(&self.git.repository_name))?;
        writeln!(f, "ROS_BPN = \"{}\"", self.name)?;
        writeln!(f)?;

        for category in DependencyCategory::ALL {
            if category == DependencyCategory::Test {
                writeln!(f, "{TEST_DEPENDS_NOTE}")?;
            }
            write_multiline(
                f,
                category.variable_name(),
                self.dependencies.get(category).iter().map(String::as_str),
            )?;
            writeln!(f)?;
        }

        writeln!(f, "{RECIPE_DEPENDS}")?;

        writeln!(f, "ROS_BRANCH ?= \"branch={}\"", or_empty(&self.git.branch))?;
        writeln!(f, "SRC_URI = \"{}\"", or_empty(&self.git.source_uri))?;
        writeln!(f, "SRCREV = \"{}\"", or_empty(&self.git.source_revision))?;
        if self.package_subpath.is_empty() {
            writeln!(f, "S = \"${{WORKDIR}}/git\"")?;
        } else {
            writeln!(f, "S = \"${{WORKDIR}}/git/{}\"", self.package_subpath)?;
        }
        writeln!(f)?;

        writeln!(f, "ROS_BUILD_TYPE = \"{}\"", self.build_type)?;
        writeln!(f)?;
        writeln!(f, "inherit ros_${{ROS_BUILD_TYPE}}")
    }
}

/// Render the recipe text of `recipe`.
pub fn render(recipe: &RecipeMetadata) -> String {
    recipe.to_string()
}

/// Write a recipe to "{build_base}/{package_name}/{recipe_file_name}" and
/// return the path that was written.
pub fn write_recipe(build_base: &Path, recipe: &RecipeMetadata) -> std::io::Result<PathBuf> {
    let directory = build_base.join(&recipe.name);
    fs_err::create_dir_all(&directory)?;

    let path = directory.join(recipe.recipe_file_name());
    tracing::debug!("writing recipe to {}", path.display());
    fs_err::write(&path, render(recipe))?;
    Ok(path)
}
