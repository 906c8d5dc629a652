//! Entitlement gateway binary.

// crates.io
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::net::TcpListener;
// self
use entitlement_gateway::{
	cli::Cli,
	config::Settings,
	credential::RefreshOutcome,
	obs,
	server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	obs::init_tracing(&cli.log_level, cli.log_format).wrap_err("Failed to set up tracing.")?;

	let settings = Settings::load(&cli.config)
		.wrap_err_with(|| format!("Failed to load settings from {}.", cli.config.display()))?;
	let state = AppState::from_settings(&settings).wrap_err("Failed to assemble the gateway.")?;

	match state.proxy().credentials().ensure_fresh().await {
		Ok(RefreshOutcome::Degraded(e)) =>
			tracing::warn!(error = %e, "Initial credential fetch failed; retrying on first request."),
		Ok(outcome) if outcome.is_refreshed() => tracing::info!("Initial credential fetched."),
		Ok(_) => {},
		Err(e) => return Err(e).wrap_err("Credential invariant broken at startup."),
	}

	let address = cli.bind_address();
	let listener =
		TcpListener::bind(&address).await.wrap_err_with(|| format!("Failed to bind {address}."))?;

	tracing::info!(
		version = env!("CARGO_PKG_VERSION"),
		address = %address,
		tenant = %settings.tenant,
		"Starting entitlement gateway."
	);

	let shutdown = state.shutdown().clone();

	server::serve(listener, state).await.wrap_err("Server failed.")?;

	if shutdown.is_fatal() {
		return Err(eyre!("Stopped after a fatal error."));
	}

	tracing::info!("Gateway shutdown complete.");

	Ok(())
}
