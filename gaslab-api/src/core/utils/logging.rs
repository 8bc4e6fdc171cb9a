use tracing_subscriber::{
    fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Build the log filter, preferring `RUST_LOG` when it is set.
pub fn get_log_env(log_level: String) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "gaslab={},gaslab_api={}",
            log_level, log_level
        ))
    })
}

/// Install the process-wide subscriber. Calling this more than once is harmless, later calls
/// keep the first subscriber.
pub fn init_global_logger(log_level: String) {
    let filter = get_log_env(log_level);
    let registry = Registry::default()
        .with(filter)
        .with(fmt::layer().with_span_events(FmtSpan::NONE));
    registry.try_init().ok();
}

pub fn global_info_logger() {
    init_global_logger("INFO".to_string())
}

pub fn global_debug_logger() {
    init_global_logger("DEBUG".to_string())
}
