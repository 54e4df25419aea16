//! Logging bootstrap
//!
//! Output format is chosen by `LOG_FORMAT` (`json` for log shippers, text
//! otherwise). Filtering follows `RUST_LOG` and defaults to `info`, for
//! example `RUST_LOG=ql_platform=debug,tower_http=info`.
//!
//! Request context travels in spans, so every event logged while handling a
//! request carries the span fields:
//!
//! ```rust,ignore
//! let span = tracing::info_span!("register", correlation_id = %ctx.correlation_id);
//! use_case.execute(command, &ctx).instrument(span).await
//! ```

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber for `service_name`.
///
/// Calling it twice in one process panics inside `tracing-subscriber`, so
/// binaries call it once at the top of `main`.
pub fn init_logging(service_name: &str) {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = build_filter();

    if json {
        init_json_logging(env_filter);
    } else {
        init_text_logging(env_filter);
    }

    tracing::info!(service = service_name, json, "Logging initialized");
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_json_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .init();
}

fn init_text_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::new(DEFAULT_FILTER);
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_directive_filter_parses() {
        let filter = EnvFilter::new("ql_platform=debug,tower_http=info");
        assert!(filter.to_string().contains("ql_platform=debug"));
    }
}
