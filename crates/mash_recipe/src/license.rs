//! Mapping of free-text license names found in `package.xml` to SPDX
//! identifiers.

/// Free-text license name to SPDX identifier.
///
/// The values of this table are the identifiers we consider canonical, see
/// [`is_recognized`].
static LICENSE_MAP: &[(&str, &str)] = &[
    ("Apache 2.0", "Apache-2.0"),
    ("Apache-2.0", "Apache-2.0"),
    ("Apache 2.0 License", "Apache-2.0"),
    ("Apache License 2.0", "Apache-2.0"),
    ("Apache License, Version 2.0", "Apache-2.0"),
    ("Apache Software License 2.0", "Apache-2.0"),
    ("BSD", "BSD-3-Clause"),
    ("BSD License", "BSD-3-Clause"),
    ("BSD 3-Clause", "BSD-3-Clause"),
    ("BSD-3-Clause", "BSD-3-Clause"),
    ("BSD 3-Clause License", "BSD-3-Clause"),
    ("BSD-2-Clause", "BSD-2-Clause"),
    ("BSD 2-Clause License", "BSD-2-Clause"),
    ("Boost Software License 1.0", "BSL-1.0"),
    ("BSL-1.0", "BSL-1.0"),
    ("Eclipse Distribution License 1.0", "EDL-1.0"),
    ("Eclipse Public License 2.0", "EPL-2.0"),
    ("GNU General Public License v2.0", "GPL-2.0-only"),
    ("GPLv2", "GPL-2.0-only"),
    ("GPL-2.0-only", "GPL-2.0-only"),
    ("GPLv3", "GPL-3.0-only"),
    ("GPL-3.0-only", "GPL-3.0-only"),
    ("LGPLv2.1", "LGPL-2.1-only"),
    ("LGPL-2.1", "LGPL-2.1-only"),
    ("LGPL-2.1-only", "LGPL-2.1-only"),
    ("LGPL-2.1-or-later", "LGPL-2.1-or-later"),
    ("LGPLv3", "LGPL-3.0-only"),
    ("LGPL-3.0-only", "LGPL-3.0-only"),
    ("MIT", "MIT"),
    ("MIT License", "MIT"),
    ("Mozilla Public License 2.0", "MPL-2.0"),
    ("MPL-2.0", "MPL-2.0"),
    ("Zlib", "Zlib"),
];

/// Returns `true` if `license` already is one of the canonical identifiers
/// of the license table.
pub fn is_recognized(license: &str) -> bool {
    LICENSE_MAP.iter().any(|(_, spdx)| *spdx == license)
}

/// Look `license` up in the license table.
///
/// Returns an empty string when no mapping is known.
pub fn normalize(license: &str) -> &'static str {
    LICENSE_MAP
        .iter()
        .find(|(name, _)| *name == license)
        .map_or("", |(_, spdx)| spdx)
}

/// Turn a `package.xml` license string into the identifier used in the
/// recipe. Unknown licenses are passed through unchanged.
pub fn normalize_license(license: &str) -> String {
    if is_recognized(license) {
        return license.to_string();
    }

    let mapped = normalize(license);
    if !mapped.is_empty() {
        tracing::debug!("mapped license \"{license}\" to \"{mapped}\"");
        return mapped.to_string();
    }

    if spdx::license_id(license).is_some() {
        tracing::debug!("keeping SPDX license \"{license}\" that is not in the license table");
    } else {
        tracing::warn!(
            "could not determine an SPDX identifier for license \"{license}\", using it as is"
        );
    }
    license.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tracing_test::traced_test;

    #[test]
    fn test_every_mapping_is_recognized() {
        for (name, _) in LICENSE_MAP {
            assert!(
                is_recognized(normalize(name)),
                "{name} maps to an identifier that is not recognized"
            );
        }
    }

    #[rstest]
    #[case("Apache-2.0", true)]
    #[case("BSD-3-Clause", true)]
    #[case("EDL-1.0", true)]
    #[case("Apache 2.0", false)]
    #[case("Apache License 2.0", false)]
    #[case("apache-2.0", false)]
    fn test_is_recognized(#[case] license: &str, #[case] recognized: bool) {
        assert_eq!(is_recognized(license), recognized);
    }

    #[rstest]
    #[case("Apache 2.0", "Apache-2.0")]
    #[case("Apache License 2.0", "Apache-2.0")]
    #[case("Eclipse Distribution License 1.0", "EDL-1.0")]
    #[case("Eclipse Public License 2.0", "EPL-2.0")]
    #[case("GNU General Public License v2.0", "GPL-2.0-only")]
    #[case("Some Proprietary License", "")]
    fn test_normalize(#[case] license: &str, #[case] expected: &str) {
        assert_eq!(normalize(license), expected);
    }

    #[test]
    fn test_normalize_license_keeps_canonical_identifiers() {
        assert_eq!(normalize_license("LGPL-2.1-or-later"), "LGPL-2.1-or-later");
        assert_eq!(normalize_license("Apache 2.0 License"), "Apache-2.0");
    }

    #[test]
    #[traced_test]
    fn test_unknown_license_passes_through_with_warning() {
        assert_eq!(normalize_license("Custom License v42"), "Custom License v42");
        assert!(logs_contain("could not determine an SPDX identifier"));
    }

    #[test]
    #[traced_test]
    fn test_spdx_license_outside_table_passes_through_silently() {
        assert_eq!(normalize_license("ISC"), "ISC");
        assert!(!logs_contain("could not determine an SPDX identifier"));
    }
}
