//! Command-line options.

use std::path::PathBuf;

use clap::{Parser, ValueEnum, crate_version};
use clap_complete::{Generator, shells};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use mash_recipe::DEFAULT_DISTRO;
use mash_rosdep::{DEFAULT_INDEX_URL, DEFAULT_SOURCES_LIST_DIR, DataSource};

use crate::{
    config::MashConfig,
    discovery::{DiscoveryError, PackageSelection},
};

/// Directory the recipes are written to when nothing else is configured.
pub const DEFAULT_BUILD_BASE: &str = "build_mash";

/// Application subcommands.
#[derive(Parser)]
pub enum SubCommands {
    /// Generate Bitbake recipes for ROS 2 packages
    Bitbake(BitbakeOpts),

    /// Generate shell completion script
    Completion(ShellCompletion),
}

/// Shell completion options.
#[derive(Parser)]
pub struct ShellCompletion {
    /// Specifies the shell for which the completions should be generated
    #[arg(short, long)]
    pub shell: Shell,
}

/// Defines the shells for which we can provide completions
#[allow(clippy::enum_variant_names)]
#[derive(ValueEnum, Clone, Debug, Copy, Eq, Hash, PartialEq)]
pub enum Shell {
    /// Bourne Again SHell (bash)
    Bash,
    /// Elvish shell
    Elvish,
    /// Friendly Interactive SHell (fish)
    Fish,
    /// PowerShell
    Powershell,
    /// Z SHell (zsh)
    Zsh,
}

impl Generator for Shell {
    fn file_name(&self, name: &str) -> String {
        match self {
            Shell::Bash => shells::Bash.file_name(name),
            Shell::Elvish => shells::Elvish.file_name(name),
            Shell::Fish => shells::Fish.file_name(name),
            Shell::Powershell => shells::PowerShell.file_name(name),
            Shell::Zsh => shells::Zsh.file_name(name),
        }
    }

    fn generate(&self, cmd: &clap::Command, buf: &mut dyn std::io::Write) {
        match self {
            Shell::Bash => shells::Bash.generate(cmd, buf),
            Shell::Elvish => shells::Elvish.generate(cmd, buf),
            Shell::Fish => shells::Fish.generate(cmd, buf),
            Shell::Powershell => shells::PowerShell.generate(cmd, buf),
            Shell::Zsh => shells::Zsh.generate(cmd, buf),
        }
    }
}

#[derive(Parser)]
#[clap(version = crate_version!(), about)]
pub struct App {
    /// Subcommand, `bitbake` when omitted.
    #[clap(subcommand)]
    pub subcommand: Option<SubCommands>,

    /// Options of the `bitbake` subcommand when it is omitted.
    #[command(flatten)]
    pub bitbake: BitbakeOpts,

    /// Enable verbose logging.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// The mash configuration file to use
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,
}

/// Package selection options, they behave like the ones of colcon.
#[derive(Parser, Clone, Debug, Default)]
pub struct PackageSelectionOpts {
    /// Only process the packages with these names
    #[arg(long, num_args = 1.., help_heading = "Package selection")]
    pub packages_select: Vec<String>,

    /// Skip the packages with these names
    #[arg(long, num_args = 1.., help_heading = "Package selection")]
    pub packages_skip: Vec<String>,

    /// Only process these packages and everything they depend on
    #[arg(long, num_args = 1.., help_heading = "Package selection")]
    pub packages_up_to: Vec<String>,

    /// Only process the packages whose name matches one of these patterns
    #[arg(long, num_args = 1.., help_heading = "Package selection")]
    pub packages_select_regex: Vec<String>,

    /// Skip the packages whose name matches one of these patterns
    #[arg(long, num_args = 1.., help_heading = "Package selection")]
    pub packages_skip_regex: Vec<String>,
}

/// Options of the `bitbake` subcommand.
#[derive(Parser, Clone, Debug, Default)]
pub struct BitbakeOpts {
    /// The base directory for build files (default: build_mash)
    #[arg(long)]
    pub build_base: Option<PathBuf>,

    /// Name of rosdistro
    #[arg(long, env = "ROSDISTRO")]
    pub rosdistro: Option<String>,

    /// The base paths to recursively crawl for packages (default: .)
    #[arg(long, num_args = 1..)]
    pub base_paths: Vec<PathBuf>,

    #[command(flatten)]
    pub selection: PackageSelectionOpts,

    /// URL of the rosdistro index
    #[arg(long, env = "ROSDISTRO_INDEX_URL")]
    pub rosdistro_index_url: Option<String>,

    /// Additional rosdep YAML file or URL. Can be given multiple times and
    /// takes precedence over the system sources.
    #[arg(long = "rosdep-source")]
    pub rosdep_sources: Vec<String>,

    /// Directory with the rosdep source lists
    #[arg(long, env = "ROSDEP_SOURCE_PATH", hide = true)]
    pub rosdep_source_path: Option<PathBuf>,
}

/// The settings of a `bitbake` run, with the configuration file applied.
#[derive(Debug, Clone)]
pub struct BitbakeData {
    pub build_base: PathBuf,
    pub rosdistro: String,
    pub base_paths: Vec<PathBuf>,
    pub selection: PackageSelection,
    pub rosdistro_index_url: String,
    /// Sources given by the user, before the system sources
    pub rosdep_sources: Vec<DataSource>,
    pub rosdep_source_path: PathBuf,
}

impl BitbakeData {
    pub fn from_opts_and_config(
        opts: BitbakeOpts,
        config: MashConfig,
    ) -> Result<Self, DiscoveryError> {
        let selection = PackageSelection::new(
            opts.selection.packages_select,
            opts.selection.packages_skip,
            opts.selection.packages_up_to,
            &opts.selection.packages_select_regex,
            &opts.selection.packages_skip_regex,
        )?;

        let rosdistro = opts.rosdistro.or(config.rosdistro).unwrap_or_else(|| {
            tracing::warn!("no rosdistro given, using {DEFAULT_DISTRO}");
            DEFAULT_DISTRO.to_string()
        });

        let base_paths = if !opts.base_paths.is_empty() {
            opts.base_paths
        } else if !config.base_paths.is_empty() {
            config.base_paths
        } else {
            vec![PathBuf::from(".")]
        };

        let rosdep_sources = if opts.rosdep_sources.is_empty() {
            config.rosdep_sources
        } else {
            opts.rosdep_sources
        };

        Ok(Self {
            build_base: opts
                .build_base
                .or(config.build_base)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_BASE)),
            rosdistro,
            base_paths,
            selection,
            rosdistro_index_url: opts
                .rosdistro_index_url
                .or(config.rosdistro_index_url)
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            rosdep_sources: rosdep_sources.into_iter().map(DataSource::new).collect(),
            rosdep_source_path: opts
                .rosdep_source_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCES_LIST_DIR)),
        })
    }
}
