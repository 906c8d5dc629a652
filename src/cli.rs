//! Command-line interface.

// std
use std::{net::SocketAddr, path::PathBuf};
// crates.io
use clap::Parser;
// self
use crate::obs::LogFormat;

/// Directory entitlement gateway.
#[derive(Debug, Parser)]
#[command(name = "entitlement-gateway", version, about, long_about = None)]
pub struct Cli {
	/// Path to the JSON settings file.
	#[arg(short, long, env = "ENTITLEMENT_GATEWAY_CONFIG", default_value = "config.json")]
	pub config: PathBuf,

	/// Host to bind to.
	#[arg(long, env = "ENTITLEMENT_GATEWAY_HOST", default_value = "0.0.0.0")]
	pub host: String,

	/// Port to listen on.
	#[arg(short, long, env = "ENTITLEMENT_GATEWAY_PORT", default_value_t = 8080)]
	pub port: u16,

	/// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence.
	#[arg(long, env = "ENTITLEMENT_GATEWAY_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	/// Log line format.
	#[arg(long, env = "ENTITLEMENT_GATEWAY_LOG_FORMAT", value_enum, default_value_t)]
	pub log_format: LogFormat,
}
impl Cli {
	/// `host:port` string handed to the listener.
	pub fn bind_address(&self) -> String {
		match self.host.parse::<std::net::IpAddr>() {
			Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
			Err(_) => format!("{}:{}", self.host, self.port),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_the_deployment_layout() {
		let cli = Cli::try_parse_from(["entitlement-gateway"]).expect("Defaults should parse.");

		assert_eq!(cli.config, PathBuf::from("config.json"));
		assert_eq!(cli.bind_address(), "0.0.0.0:8080");
		assert_eq!(cli.log_level, "info");
		assert_eq!(cli.log_format, LogFormat::Text);
	}

	#[test]
	fn overrides_are_applied() {
		let cli = Cli::try_parse_from([
			"entitlement-gateway",
			"--config",
			"/etc/gateway.json",
			"--host",
			"::1",
			"--port",
			"9000",
			"--log-format",
			"json",
		])
		.expect("Overrides should parse.");

		assert_eq!(cli.config, PathBuf::from("/etc/gateway.json"));
		assert_eq!(cli.bind_address(), "[::1]:9000");
		assert_eq!(cli.log_format, LogFormat::Json);
	}

	#[test]
	fn host_names_are_passed_through() {
		let cli = Cli::try_parse_from(["entitlement-gateway", "--host", "localhost"])
			.expect("Host name should parse.");

		assert_eq!(cli.bind_address(), "localhost:8080");
	}
}
