//! Parser for ROS package manifests (`package.xml`).
//!
//! Supports manifest formats 1 ([REP 127](https://www.ros.org/reps/rep-0127.html)),
//! 2 ([REP 140](https://www.ros.org/reps/rep-0140.html)) and
//! 3 ([REP 149](https://www.ros.org/reps/rep-0149.html)). The parsed
//! [`PackageMetadata`] is the upstream view of a package that recipe
//! generation starts from.

use std::{borrow::Cow, path::Path, str::FromStr};

use md5::{Digest, Md5};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

/// The file name of a ROS package manifest
pub const PACKAGE_MANIFEST: &str = "package.xml";

/// The build type catkin_pkg assumes when a manifest does not export one
pub const DEFAULT_BUILD_TYPE: &str = "catkin";

#[derive(Debug, thiserror::Error)]
pub enum PackageXmlError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("The root element must be <package>, found <{0}>")]
    NotAPackage(String),

    #[error("Unsupported package format '{0}'")]
    UnsupportedFormat(String),

    #[error("Missing required element <{0}>")]
    MissingElement(&'static str),
}

/// A maintainer or author of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// The name as written in the element text
    pub name: String,
    /// The `email` attribute, if any
    pub email: Option<String>,
}

/// Upstream metadata of a single ROS package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Manifest format (1, 2 or 3)
    pub format: u8,
    pub name: String,
    pub version: String,
    /// The description, with its inner line breaks kept
    pub description: String,
    /// First `website` url of the manifest
    pub homepage: Option<String>,
    pub authors: Vec<Person>,
    pub maintainers: Vec<Person>,
    /// License strings in declaration order
    pub upstream_license: Vec<String>,
    /// 1-based line of the first `<license` element in the manifest
    pub license_line: usize,
    /// md5 of the license line, including its line break
    pub license_md5: String,
    pub build_depends: Vec<String>,
    pub build_export_depends: Vec<String>,
    pub buildtool_depends: Vec<String>,
    pub buildtool_export_depends: Vec<String>,
    pub exec_depends: Vec<String>,
    /// Format 1 only; already folded into `build_export_depends` and `exec_depends`
    pub run_depends: Vec<String>,
    pub test_depends: Vec<String>,
    pub doc_depends: Vec<String>,
    /// Value of `<export><build_type>`
    pub build_type: String,
}

impl PackageMetadata {
    /// Read and parse the manifest at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PackageXmlError> {
        let contents = fs_err::read_to_string(path.as_ref())?;
        contents.parse()
    }

    /// Name of the first author
    pub fn author_name(&self) -> Option<&str> {
        self.authors.first().map(|p| p.name.as_str())
    }

    /// Email of the first author
    pub fn author_email(&self) -> Option<&str> {
        self.authors.first().and_then(|p| p.email.as_deref())
    }

    /// Name of the first maintainer
    pub fn upstream_name(&self) -> Option<&str> {
        self.maintainers.first().map(|p| p.name.as_str())
    }

    /// Email of the first maintainer
    pub fn upstream_email(&self) -> Option<&str> {
        self.maintainers.first().and_then(|p| p.email.as_deref())
    }

    /// Names of every dependency of this package, regardless of category
    pub fn all_dependencies(&self) -> impl Iterator<Item = &str> {
        [
            &self.build_depends,
            &self.build_export_depends,
            &self.buildtool_depends,
            &self.buildtool_export_depends,
            &self.exec_depends,
            &self.test_depends,
            &self.doc_depends,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
    }
}

impl FromStr for PackageMetadata {
    type Err = PackageXmlError;

    fn from_str(xml: &str) -> Result<Self, Self::Err> {
        let mut package = ManifestParser::default().parse(xml)?;

        if package.name.is_empty() {
            return Err(PackageXmlError::MissingElement("name"));
        }
        if package.version.is_empty() {
            return Err(PackageXmlError::MissingElement("version"));
        }
        if package.description.is_empty() {
            return Err(PackageXmlError::MissingElement("description"));
        }

        let (line, md5) =
            license_checksum(xml).ok_or(PackageXmlError::MissingElement("license"))?;
        if package.upstream_license.is_empty() {
            return Err(PackageXmlError::MissingElement("license"));
        }
        package.license_line = line;
        package.license_md5 = md5;

        if package.build_type.is_empty() {
            package.build_type = DEFAULT_BUILD_TYPE.to_string();
        }

        Ok(package)
    }
}

/// Locate the first license line and compute its checksum the way BitBake
/// does for `LIC_FILES_CHKSUM` with `beginline` and `endline` set to it.
///
/// The line is hashed with its raw line ending, so a `\r` of a CRLF file is
/// part of the checksum.
fn license_checksum(xml: &str) -> Option<(usize, String)> {
    let (index, line) = xml
        .split('\n')
        .enumerate()
        .find(|(_, line)| line.contains("<license"))?;

    let mut hasher = Md5::new();
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
    Some((index + 1, hex::encode(hasher.finalize())))
}

/// Element currently open directly below `<package>`
#[derive(Default)]
struct OpenElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
}

impl OpenElement {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct ManifestParser {
    package: PackageMetadata,
    depth: usize,
    current: Option<OpenElement>,
    export_text: Option<String>,
}

impl ManifestParser {
    fn parse(mut self, xml: &str) -> Result<PackageMetadata, PackageXmlError> {
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event()? {
                Event::Start(start) => self.open(&start)?,
                Event::Empty(start) => {
                    self.open(&start)?;
                    self.close()?;
                }
                Event::End(_) => self.close()?,
                Event::Text(text) => self.push_text(&text.unescape()?),
                Event::CData(data) => self.push_text(&String::from_utf8_lossy(&data)),
                Event::Eof => break,
                _ => {}
            }
        }

        if self.package.format == 0 {
            return Err(PackageXmlError::NotAPackage(String::new()));
        }

        Ok(self.package)
    }

    fn open(&mut self, start: &BytesStart) -> Result<(), PackageXmlError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        match self.depth {
            0 => {
                if tag != "package" {
                    return Err(PackageXmlError::NotAPackage(tag));
                }
                let attributes = collect_attributes(start)?;
                let format = attributes
                    .iter()
                    .find(|(k, _)| k == "format")
                    .map_or("1", |(_, v)| v.as_str());
                self.package.format = match format {
                    "1" => 1,
                    "2" => 2,
                    "3" => 3,
                    other => return Err(PackageXmlError::UnsupportedFormat(other.to_string())),
                };
            }
            1 => {
                self.current = Some(OpenElement {
                    tag,
                    attributes: collect_attributes(start)?,
                    text: String::new(),
                });
            }
            2 if self.is_in_export() && tag == "build_type" => {
                self.export_text = Some(String::new());
            }
            _ => {}
        }

        self.depth += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PackageXmlError> {
        self.depth = self.depth.saturating_sub(1);

        match self.depth {
            1 => {
                if let Some(element) = self.current.take() {
                    self.finish_element(element);
                }
            }
            2 => {
                if let Some(build_type) = self.export_text.take() {
                    if self.package.build_type.is_empty() {
                        self.package.build_type = build_type.trim().to_string();
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_text(&mut self, text: &Cow<'_, str>) {
        if let Some(export_text) = self.export_text.as_mut() {
            export_text.push_str(text);
        } else if let Some(current) = self.current.as_mut() {
            current.text.push_str(text);
        }
    }

    fn is_in_export(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.tag == "export")
    }

    fn finish_element(&mut self, element: OpenElement) {
        let package = &mut self.package;
        let value = element.text.trim().to_string();

        match element.tag.as_str() {
            "name" => package.name = value,
            "version" => package.version = value,
            "description" => package.description = value,
            "license" => package.upstream_license.push(value),
            "url" => {
                let is_website = element.attribute("type").is_none_or(|t| t == "website");
                if is_website && package.homepage.is_none() && !value.is_empty() {
                    package.homepage = Some(value);
                }
            }
            "maintainer" => package.maintainers.push(Person {
                name: value,
                email: element.attribute("email").map(str::to_string),
            }),
            "author" => package.authors.push(Person {
                name: value,
                email: element.attribute("email").map(str::to_string),
            }),
            "depend" => {
                package.build_depends.push(value.clone());
                package.build_export_depends.push(value.clone());
                package.exec_depends.push(value);
            }
            "build_depend" => package.build_depends.push(value),
            "build_export_depend" => package.build_export_depends.push(value),
            "buildtool_depend" => package.buildtool_depends.push(value),
            "buildtool_export_depend" => package.buildtool_export_depends.push(value),
            "exec_depend" => package.exec_depends.push(value),
            "run_depend" => {
                package.build_export_depends.push(value.clone());
                package.exec_depends.push(value.clone());
                package.run_depends.push(value);
            }
            "test_depend" => package.test_depends.push(value),
            "doc_depend" => package.doc_depends.push(value),
            "export" => {}
            other => tracing::trace!("ignoring manifest element <{other}>"),
        }
    }
}

fn collect_attributes(start: &BytesStart) -> Result<Vec<(String, String)>, PackageXmlError> {
    start
        .attributes()
        .map(|attribute| {
            let attribute = attribute?;
            Ok((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                attribute.unescape_value()?.into_owned(),
            ))
        })
        .collect()
}
