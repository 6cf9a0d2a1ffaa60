//! mash generates BitBake recipes for the ROS 2 packages of a workspace.

pub mod bitbake;
pub mod config;
pub mod console_utils;
pub mod discovery;
pub mod opt;
pub mod tool_configuration;

use std::path::Path;

use config::MashConfig;
use miette::IntoDiagnostic;
use opt::{BitbakeData, BitbakeOpts};
use tool_configuration::Configuration;

/// Run the `bitbake` verb with the options of the command line, falling back
/// to the configuration file for everything that is not given.
pub async fn bitbake_from_args(
    opts: BitbakeOpts,
    config_file: Option<&Path>,
) -> miette::Result<()> {
    let config = MashConfig::load(config_file)?;
    let data = BitbakeData::from_opts_and_config(opts, config)?;
    let configuration = Configuration::new().into_diagnostic()?;

    bitbake::run_bitbake(data, &configuration).await
}
