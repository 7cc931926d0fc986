//! CLI logging setup
//!
//! Per-hook level control on top of `tracing-subscriber`.

use crate::config::LogConfig;
use std::io;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};
use vuepart_config::Hook;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored multi-line output
    Pretty,
    /// One line per event
    Compact,
    /// JSON lines for tool integration
    Json,
}

/// Filter routing each hook target to its configured level
pub fn targets(log_config: &LogConfig) -> Targets {
    [Hook::Resolve, Hook::Load, Hook::Transform]
        .into_iter()
        .fold(
            Targets::new()
                .with_default(log_config.global)
                .with_target("vuepart", log_config.global),
            |targets, hook| targets.with_target(hook.target(), log_config.level_for_hook(hook)),
        )
}

/// Initialize logging to stderr; stdout is reserved for command output
pub fn init(log_config: &LogConfig, format: LogFormat) {
    let layer = create_format_layer(format, io::stderr).with_filter(targets(log_config));
    tracing_subscriber::registry().with(layer).init();
}

fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
