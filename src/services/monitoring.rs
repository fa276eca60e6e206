// src/services/monitoring.rs
//! Optional Sentry error tracking
//!
//! Sentry is initialised before the tracing subscriber so that the
//! `sentry_tracing` layer installed in `main` forwards warnings and errors.

use std::borrow::Cow;
use std::env;
use tracing::info;

pub fn init_sentry(dsn: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn.map(str::trim).filter(|d| !d.is_empty())?;

    let traces_sample_rate = env::var("SENTRY_TRACES_SAMPLE_RATE")
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(0.0);

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(Cow::Owned(
                env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            )),
            traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events, info and debug become breadcrumbs
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_dsn_means_no_client() {
        assert!(init_sentry(None).is_none());
        assert!(init_sentry(Some("  ")).is_none());
    }
}
