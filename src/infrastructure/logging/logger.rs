use super::rotation::RotatingFileWriter;
use super::secret_scrubbing::{RedactingMakeWriter, SharedScrubber};
use crate::domain::models::{
    ConsoleStream, FormatStyle, FormatterConfig, HandlerConfig, LogConfig, LogLevel,
    RotationInterval,
};
use anyhow::{Context, Result};
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Logger installed from `PkgBot.log_config`
///
/// Holds the worker guards of the non-blocking file writers; dropping it
/// flushes and stops them.
pub struct LoggerImpl {
    _guards: Vec<WorkerGuard>,
}

impl LoggerImpl {
    /// Install the global subscriber described by `config`.
    ///
    /// Every handler writes through the shared scrubber, so configured secrets
    /// never reach a console or a log file. Replacing the scrubber after a
    /// reload applies to the following events.
    ///
    /// # Errors
    /// Returns an error if a log file cannot be opened or a global subscriber
    /// is already installed.
    pub fn init(config: &LogConfig, scrubber: &SharedScrubber) -> Result<Self> {
        let (layers, guards) = build_layers(config, scrubber)?;

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .context("a global tracing subscriber is already installed")?;

        tracing::info!(
            handlers = config.handlers.len(),
            loggers = config.loggers.len(),
            redacted_values = scrubber.current().literal_count(),
            "logger initialized"
        );

        Ok(Self { _guards: guards })
    }
}

/// Subscriber used before `log_config` is known: `RUST_LOG` or `warn`,
/// written to `writer`.
pub fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
}

/// One filtered layer per handler, plus the guards of their background writers.
pub fn build_layers(
    config: &LogConfig,
    scrubber: &SharedScrubber,
) -> Result<(Vec<BoxedLayer>, Vec<WorkerGuard>)> {
    let mut layers = Vec::with_capacity(config.handlers.len());
    let mut guards = Vec::new();

    for (name, handler) in &config.handlers {
        let formatter = handler
            .formatter()
            .and_then(|f| config.formatters.get(f))
            .cloned()
            .unwrap_or_default();

        let layer = match handler {
            HandlerConfig::Console { stream, .. } => match stream {
                ConsoleStream::Stdout => fmt_layer(
                    &formatter,
                    RedactingMakeWriter::new(io::stdout, scrubber.clone()),
                    io::stdout().is_terminal(),
                ),
                ConsoleStream::Stderr => fmt_layer(
                    &formatter,
                    RedactingMakeWriter::new(io::stderr, scrubber.clone()),
                    io::stderr().is_terminal(),
                ),
            },
            HandlerConfig::RotatingFile {
                filename,
                max_bytes,
                backup_count,
                ..
            } => {
                let file = RotatingFileWriter::open(filename, *max_bytes, *backup_count)
                    .with_context(|| format!("handler '{name}'"))?;
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                guards.push(guard);
                fmt_layer(
                    &formatter,
                    RedactingMakeWriter::new(non_blocking, scrubber.clone()),
                    false,
                )
            }
            HandlerConfig::TimedRotatingFile {
                filename,
                when,
                backup_count,
                ..
            } => {
                let appender = timed_appender(filename, *when, *backup_count)
                    .with_context(|| format!("handler '{name}'"))?;
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                guards.push(guard);
                fmt_layer(
                    &formatter,
                    RedactingMakeWriter::new(non_blocking, scrubber.clone()),
                    false,
                )
            }
        };

        layers.push(
            layer
                .with_filter(handler_targets(config, name, handler.level()))
                .boxed(),
        );
    }

    Ok((layers, guards))
}

fn fmt_layer<W>(formatter: &FormatterConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let timer = ChronoLocal::new(
        formatter
            .datefmt
            .clone()
            .unwrap_or_else(|| DEFAULT_DATEFMT.to_string()),
    );

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_timer(timer)
        .with_target(formatter.include_target);

    match formatter.style {
        FormatStyle::Text => layer.with_ansi(ansi).boxed(),
        FormatStyle::Json => layer
            .json()
            .with_ansi(false)
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        FormatStyle::Pretty => layer
            .pretty()
            .with_ansi(ansi)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

fn timed_appender(
    filename: &Path,
    when: RotationInterval,
    backup_count: u32,
) -> Result<RollingFileAppender> {
    let directory = filename
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = filename
        .file_name()
        .and_then(|n| n.to_str())
        .context("log filename must end in a valid UTF-8 file name")?;

    let rotation = match when {
        RotationInterval::Minutely => Rotation::MINUTELY,
        RotationInterval::Hourly => Rotation::HOURLY,
        RotationInterval::Daily => Rotation::DAILY,
        RotationInterval::Never => Rotation::NEVER,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix);
    if backup_count > 0 {
        builder = builder.max_log_files(backup_count as usize);
    }

    builder
        .build(directory)
        .with_context(|| format!("failed to create rolling log in {}", directory.display()))
}

const fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}

/// Which targets reach `handler`, and at what level.
///
/// A logger routes to a handler it names directly, or to the root handlers
/// when it propagates. The effective level is the stricter of the logger
/// level and the handler level. Loggers without a level inherit the root
/// level, which defaults to WARNING.
pub fn handler_targets(config: &LogConfig, handler: &str, handler_level: Option<LogLevel>) -> Targets {
    let cap = level_filter(handler_level.unwrap_or(LogLevel::Trace));
    let root_level = level_filter(
        config
            .root
            .as_ref()
            .and_then(|root| root.level)
            .unwrap_or(LogLevel::Warn),
    );
    let root_routes = config
        .root
        .as_ref()
        .is_some_and(|root| root.handlers.iter().any(|h| h == handler));

    let default = if root_routes {
        root_level.min(cap)
    } else {
        LevelFilter::OFF
    };

    config
        .loggers
        .iter()
        .fold(Targets::new().with_default(default), |targets, (name, logger)| {
            let level = logger.level.map_or(root_level, level_filter);
            let direct = logger.handlers.iter().any(|h| h == handler);
            let effective = if direct || (logger.propagate && root_routes) {
                level.min(cap)
            } else {
                LevelFilter::OFF
            };
            targets.with_target(name.clone(), effective)
        })
}
