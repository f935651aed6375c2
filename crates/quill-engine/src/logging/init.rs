use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses `env_logger` directives, e.g. `"warn"` or
/// `"quill_engine::journal=trace"`. When unset, `RUST_LOG` is consulted.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        if builder(config).try_init().is_err() {
            // Another logger was installed by the host; keep using it.
            return;
        }

        log::debug!("logging initialized");
    });
}

fn builder(config: LoggingConfig) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
        Some(filter) => {
            builder.parse_filters(&filter);
        }
        None => {
            builder.filter_level(log::LevelFilter::Warn);
        }
    }

    // The target already names the emitting module.
    builder
        .write_style(config.write_style)
        .format_module_path(false)
        .format_timestamp(None);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let config = LoggingConfig::default().with_filter("quill_engine=debug");
        init_logging(config.clone());
        init_logging(config);
        log::debug!("still alive");
    }

    #[test]
    fn explicit_filter_wins() {
        let logger = builder(LoggingConfig::default().with_filter("quill_engine::journal=trace")).build();
        assert_eq!(logger.filter(), log::LevelFilter::Trace);

        let logger = builder(LoggingConfig::default().with_filter("error")).build();
        assert_eq!(logger.filter(), log::LevelFilter::Error);
    }
}
