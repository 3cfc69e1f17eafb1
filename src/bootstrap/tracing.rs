//! Tracing configuration for the pairing simulator
//!
//! Logs go to stderr so the JSON report on stdout stays machine readable.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Build the default filter directives for tracing
///
/// ## Behavior / 行为
/// - **Development**: debug for the pairing crates
/// - **Production**: info everywhere
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        "info".to_string(),
        format!("cp_core={level}"),
        format!("cp_app={level}"),
        format!("cp_infra={level}"),
        format!("classic_pairing_lib={level}"),
    ]
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` overrides the default directives.
///
/// ## Errors / 错误
///
/// Returns `Err` if a subscriber is already registered.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(is_development()).join(",")));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
