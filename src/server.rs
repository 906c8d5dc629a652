//! Inbound HTTP surface: router, shared state, and graceful shutdown.
//!
//! A fatal error raised while serving a request flags [`Shutdown`]; the server then stops
//! accepting connections, drains in-flight requests, and the binary exits non-zero.

mod handler;
mod page;

pub use handler::*;

// std
use std::{
	net::SocketAddr,
	sync::atomic::{AtomicBool, Ordering},
};
// crates.io
use axum::{Router, http::StatusCode, routing::get};
use tokio::{net::TcpListener, signal, sync::Notify};
// self
use crate::{
	_prelude::*,
	config::Settings,
	credential::{CredentialHolder, TokenExchange},
	error::ConfigError,
	http::ReqwestHttpClient,
	lookup::LookupProxy,
};

/// Only accepted value of the `version` query parameter.
pub const API_VERSION: &str = "0.2";
/// Body returned when `version` is absent or unsupported.
pub const INVALID_VERSION_MESSAGE: &str = "Error: invalid version or no version specified";
/// Body returned for every downstream or internal failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "request was not successful";

/// Process-wide stop signal shared between handlers and the serve loop.
#[derive(Debug, Default)]
pub struct Shutdown {
	notify: Notify,
	fatal: AtomicBool,
}
impl Shutdown {
	/// Records a fatal error and asks the server to stop.
	pub fn trigger_fatal(&self) {
		self.fatal.store(true, Ordering::SeqCst);
		self.notify.notify_one();
	}

	/// Returns `true` once a fatal error has been recorded.
	pub fn is_fatal(&self) -> bool {
		self.fatal.load(Ordering::SeqCst)
	}

	/// Resolves after [`Shutdown::trigger_fatal`]; a trigger before the wait is not lost.
	pub async fn wait(&self) {
		self.notify.notified().await;
	}
}

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	proxy: Arc<LookupProxy>,
	index_page: Arc<str>,
	invalid_identity_status: StatusCode,
	shutdown: Arc<Shutdown>,
}
impl AppState {
	/// Wires the transport, credential holder, and lookup proxy from validated settings.
	pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(settings.request_timeout())?;
		let exchange = TokenExchange::new(http_client.clone(), settings)?;
		let credentials = Arc::new(CredentialHolder::new(exchange));
		let proxy = LookupProxy::new(credentials, http_client, settings)?;

		Self::new(Arc::new(proxy), settings)
	}

	/// Builds state around an existing proxy.
	pub fn new(proxy: Arc<LookupProxy>, settings: &Settings) -> Result<Self, ConfigError> {
		let status = settings.invalid_identity_status;
		let invalid_identity_status =
			StatusCode::from_u16(status).map_err(|_| ConfigError::InvalidStatus { status })?;

		Ok(Self {
			proxy,
			index_page: page::render_index(settings.external_base()).into(),
			invalid_identity_status,
			shutdown: Default::default(),
		})
	}

	/// Lookup proxy used by `/ece/getPlans`.
	pub fn proxy(&self) -> &Arc<LookupProxy> {
		&self.proxy
	}

	/// Stop signal observed by [`serve`].
	pub fn shutdown(&self) -> &Arc<Shutdown> {
		&self.shutdown
	}
}

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(handler::index))
		.route("/healthz", get(handler::healthz))
		.route("/ece/getPlans", get(handler::get_plans))
		.with_state(state)
}

/// Serves until Ctrl-C, SIGTERM, or a fatal error, then drains in-flight requests.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
	let shutdown = state.shutdown.clone();

	axum::serve(listener, router(state).into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(shutdown_signal(shutdown))
		.await
}

async fn shutdown_signal(shutdown: Arc<Shutdown>) {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to install the Ctrl-C handler.");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to install the SIGTERM handler.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => tracing::info!("Shutdown signal received."),
		() = terminate => tracing::info!("Shutdown signal received."),
		() = shutdown.wait() => tracing::error!("Fatal error; shutting down."),
	}
}
