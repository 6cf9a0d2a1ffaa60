//! BitBake recipe generation for ROS packages: license normalization,
//! dependency name resolution, the recipe model and its text format.

mod license;
mod metadata;
mod naming;
mod serialize;

pub use self::license::{is_recognized, normalize, normalize_license};
pub use self::metadata::{Dependencies, DependencyCategory, GitMetadata, RecipeMetadata};
pub use self::naming::{
    DEFAULT_DISTRO, KeyResolver, NATIVE_SUFFIX, NameResolver, PLATFORM, Resolution,
    ResolutionContext, to_oe_name,
};
pub use serialize::{render, write_recipe};
