use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

const APP_TARGET: &str = "loanlens";

/// Level for this crate's own events. `--verbose` opens everything up to debug.
fn app_targets(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    Targets::new().with_target(APP_TARGET, level)
}

/// `RUST_LOG` wins when it parses; otherwise mirror the verbosity flag.
fn env_directives(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "off" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Installs the global subscriber. Silent unless `verbose` or `RUST_LOG` asks for output.
/// Events go to stderr so table and JSON output on stdout stay clean.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_targets(verbose))
        .with(env_directives(verbose, rust_log.as_deref()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_app_targets_follow_verbosity() {
        assert!(app_targets(true).would_enable("loanlens::core::amortization", &Level::DEBUG));
        assert!(!app_targets(true).would_enable("loanlens", &Level::TRACE));
        assert!(!app_targets(false).would_enable("loanlens", &Level::ERROR));
    }

    #[test]
    fn test_env_directives_fallback() {
        assert_eq!(env_directives(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            env_directives(false, Some("loanlens=info")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
        assert_eq!(
            env_directives(true, Some("loanlens=loudest")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }
}
