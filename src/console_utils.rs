//! Log output of the mash binary.

use std::str::FromStr;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt::{
        FmtContext, FormatEvent, FormatFields,
        format::{self, Format},
    },
    registry::LookupSpan,
};

/// Environment variable overriding the log filter.
pub const LOG_LEVEL_ENV: &str = "MASH_LOG_LEVEL";

const MASH_TARGETS: &[&str] = &[
    "mash",
    "mash_git",
    "mash_package_xml",
    "mash_recipe",
    "mash_rosdep",
];

/// Prints info messages of mash itself without any decoration and all other
/// events in the default format.
pub struct TracingFormatter;

impl<S, N> FormatEvent<S, N> for TracingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        if *metadata.level() == tracing_core::metadata::Level::INFO
            && metadata.target().starts_with("mash")
        {
            ctx.format_fields(writer.by_ref(), event)?;
            writeln!(writer)
        } else {
            Format::default()
                .without_time()
                .format_event(ctx, writer, event)
        }
    }
}

/// Constructs the [`EnvFilter`] for the requested verbosity. A filter in
/// `MASH_LOG_LEVEL` replaces it.
pub fn get_default_env_filter(verbose: clap_verbosity_flag::log::LevelFilter) -> EnvFilter {
    if let Ok(filter) = std::env::var(LOG_LEVEL_ENV) {
        match EnvFilter::try_new(&filter) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("ignoring invalid {LOG_LEVEL_ENV}={filter}: {e}"),
        }
    }
    env_filter_for_level(verbose)
}

fn env_filter_for_level(verbose: clap_verbosity_flag::log::LevelFilter) -> EnvFilter {
    use clap_verbosity_flag::log::LevelFilter;
    let level = match verbose {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    };
    let others = if verbose >= LevelFilter::Trace {
        "info"
    } else {
        "warn"
    };

    let mut result = EnvFilter::new(others);
    for target in MASH_TARGETS {
        if let Ok(directive) = Directive::from_str(&format!("{target}={level}")) {
            result = result.add_directive(directive);
        }
    }
    result
}
