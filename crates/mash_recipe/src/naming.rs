//! Resolution of ROS dependency names to OpenEmbedded recipe names.
use std::{collections::HashSet, fmt::Display};

/// The release train used when none is configured.
pub const DEFAULT_DISTRO: &str = "rolling";

/// The platform identifier we ask the key resolver about.
pub const PLATFORM: &str = "openembedded";

/// Suffix of recipes that run on the build host.
pub const NATIVE_SUFFIX: &str = "-native";

/// Looks up the system packages that provide a rosdep key.
pub trait KeyResolver {
    /// The error returned when a key cannot be resolved.
    type Error: Display;

    /// Returns the candidate packages for `key` on the given platform.
    fn resolve(
        &self,
        key: &str,
        os_name: &str,
        os_version: &str,
        distro: &str,
    ) -> Result<Vec<String>, Self::Error>;
}

/// Everything that stays the same while resolving the dependencies of all
/// packages of a run.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Release train, e.g. `jazzy`
    pub distro: String,
    /// Platform passed to the key resolver
    pub platform: String,
    /// Packages that are released as part of the distribution itself and are
    /// therefore named by convention
    pub internal_packages: HashSet<String>,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new(DEFAULT_DISTRO)
    }
}

impl ResolutionContext {
    /// Create a context for `distro` without any internal packages.
    pub fn new(distro: impl Into<String>) -> Self {
        Self {
            distro: distro.into(),
            platform: PLATFORM.to_string(),
            internal_packages: HashSet::new(),
        }
    }

    /// Replace the set of internal packages.
    pub fn with_internal_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.internal_packages = packages.into_iter().map(Into::into).collect();
        self
    }
}

/// How a dependency name was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The dependency is released with the distribution.
    Internal(String),
    /// The key resolver knows the dependency.
    External(String),
    /// Nothing knew about the dependency, the name is derived by convention.
    Fallback { name: String, reason: String },
}

impl Resolution {
    /// The resolved recipe name, without any native suffix.
    pub fn name(&self) -> &str {
        match self {
            Resolution::Internal(name)
            | Resolution::External(name)
            | Resolution::Fallback { name, .. } => name,
        }
    }

    fn into_name(self) -> String {
        match self {
            Resolution::Internal(name)
            | Resolution::External(name)
            | Resolution::Fallback { name, .. } => name,
        }
    }
}

/// Convert a ROS package name to the OpenEmbedded naming convention.
pub fn to_oe_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// Resolves dependency names of a package against a shared context.
pub struct NameResolver<'a, R> {
    context: &'a ResolutionContext,
    resolver: &'a R,
}

impl<'a, R: KeyResolver> NameResolver<'a, R> {
    pub fn new(context: &'a ResolutionContext, resolver: &'a R) -> Self {
        Self { context, resolver }
    }

    pub fn context(&self) -> &ResolutionContext {
        self.context
    }

    /// Resolve `name` to a recipe name, appending [`NATIVE_SUFFIX`] when the
    /// dependency has to run on the build host.
    ///
    /// This never fails: a dependency nobody knows about is named by
    /// convention and a warning is emitted.
    pub fn resolve(&self, name: &str, is_native: bool) -> String {
        let mut resolved = self.resolution(name).into_name();
        if is_native {
            resolved.push_str(NATIVE_SUFFIX);
        }
        resolved
    }

    /// Run the resolution chain for `name`.
    pub fn resolution(&self, name: &str) -> Resolution {
        self.internal(name)
            .map(Ok)
            .unwrap_or_else(|| self.external(name))
            .unwrap_or_else(|reason| self.fallback(name, reason))
    }

    fn internal(&self, name: &str) -> Option<Resolution> {
        self.context
            .internal_packages
            .contains(name)
            .then(|| Resolution::Internal(to_oe_name(name)))
    }

    fn external(&self, name: &str) -> Result<Resolution, String> {
        let candidates = self
            .resolver
            .resolve(name, &self.context.platform, "", &self.context.distro)
            .map_err(|e| e.to_string())?;

        let first = candidates
            .first()
            .ok_or_else(|| "no candidates were returned".to_string())?;

        // Candidates may carry the layer providing them, e.g. `foo@meta-oe`
        let recipe = first.split('@').next().unwrap_or_default();
        if recipe.is_empty() {
            return Err(format!("candidate \"{first}\" has no recipe name"));
        }
        Ok(Resolution::External(recipe.to_string()))
    }

    fn fallback(&self, name: &str, reason: String) -> Resolution {
        let fallback = to_oe_name(name);
        tracing::warn!(
            "could not resolve dependency \"{name}\" for {} on {}: {reason}; using \"{fallback}\"",
            self.context.distro,
            self.context.platform,
        );
        Resolution::Fallback {
            name: fallback,
            reason,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use rstest::rstest;
    use tracing_test::traced_test;

    /// A key resolver backed by a fixed table.
    #[derive(Default)]
    pub(crate) struct TableResolver {
        pub(crate) keys: HashMap<String, Vec<String>>,
    }

    impl TableResolver {
        pub(crate) fn with(mut self, key: &str, candidates: &[&str]) -> Self {
            self.keys.insert(
                key.to_string(),
                candidates.iter().map(|c| c.to_string()).collect(),
            );
            self
        }
    }

    impl KeyResolver for TableResolver {
        type Error = String;

        fn resolve(
            &self,
            key: &str,
            os_name: &str,
            _os_version: &str,
            _distro: &str,
        ) -> Result<Vec<String>, Self::Error> {
            self.keys
                .get(key)
                .cloned()
                .ok_or_else(|| format!("no rule for {key} on {os_name}"))
        }
    }

    #[test]
    fn test_internal_name_wins_over_resolver() {
        let context = ResolutionContext::new("jazzy").with_internal_packages(["Some_Pkg"]);
        let resolver = TableResolver::default().with("Some_Pkg", &["other-name"]);
        let names = NameResolver::new(&context, &resolver);

        assert_eq!(
            names.resolution("Some_Pkg"),
            Resolution::Internal("some-pkg".to_string())
        );
        assert_eq!(names.resolve("Some_Pkg", false), "some-pkg");
    }

    #[rstest]
    #[case::internal("rclcpp", "rclcpp-native")]
    #[case::external("cmake", "cmake-native")]
    #[case::layered("gamma", "libgamma-dev-native")]
    #[case::fallback("Unknown_Tool", "unknown-tool-native")]
    fn test_native_suffix_on_every_path(#[case] name: &str, #[case] expected: &str) {
        let context = ResolutionContext::default().with_internal_packages(["rclcpp"]);
        let resolver = TableResolver::default()
            .with("cmake", &["cmake"])
            .with("gamma", &["libgamma-dev@meta-foo"]);
        let names = NameResolver::new(&context, &resolver);

        assert_eq!(names.resolve(name, true), expected);
        assert_eq!(format!("{}-native", names.resolve(name, false)), expected);
    }

    #[test]
    fn test_external_candidate_is_used_verbatim_up_to_the_layer() {
        let context = ResolutionContext::default();
        let resolver = TableResolver::default()
            .with("python3-yaml", &["Python3_PyYAML@meta-python", "other"])
            .with("tinyxml2", &["libtinyxml2@meta-oe@extra"]);
        let names = NameResolver::new(&context, &resolver);

        assert_eq!(names.resolve("python3-yaml", false), "Python3_PyYAML");
        assert_eq!(names.resolve("tinyxml2", false), "libtinyxml2");
    }

    #[test]
    #[traced_test]
    fn test_fallback_never_fails() {
        let context = ResolutionContext::default();
        let resolver = TableResolver::default()
            .with("empty", &[])
            .with("layer_only", &["@meta-oe"]);
        let names = NameResolver::new(&context, &resolver);

        assert_eq!(names.resolve("Not_Known", false), "not-known");
        assert_eq!(names.resolve("empty", false), "empty");
        assert_eq!(names.resolve("layer_only", false), "layer-only");
        assert!(matches!(
            names.resolution("Not_Known"),
            Resolution::Fallback { .. }
        ));
        assert!(logs_contain("could not resolve dependency \"Not_Known\""));
        assert!(logs_contain("no candidates were returned"));
    }

    #[test]
    fn test_internal_set_and_external_mix() {
        let context = ResolutionContext::default().with_internal_packages(["beta"]);
        let resolver = TableResolver::default().with("gamma", &["libgamma-dev@meta-foo"]);
        let names = NameResolver::new(&context, &resolver);

        let resolved: Vec<_> = ["beta", "gamma"]
            .iter()
            .map(|dep| names.resolve(dep, false))
            .collect();
        assert_eq!(resolved, vec!["beta", "libgamma-dev"]);
    }
}
