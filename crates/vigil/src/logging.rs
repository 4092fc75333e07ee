use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber for internal diagnostics.
///
/// `RUST_LOG` is honoured; `vigil=info` is added on top so the services'
/// own events show by default.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vigil=info".parse()?))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
