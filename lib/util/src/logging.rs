use serde::Deserialize;
use std::fmt::Display;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default)]
pub enum LogLevel {
	Trace,
	Debug,
	#[default]
	Info,
	Warn,
	Error,
}

impl Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Trace => write!(f, "trace"),
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warn => write!(f, "warn"),
			Self::Error => write!(f, "error"),
		}
	}
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub enum LoggingPreset {
	#[default]
	Default,
	Verbose,
	Develop,
	Trace,
}

impl LoggingPreset {
	pub fn get_config(&self) -> LoggingConfig {
		match self {
			Self::Default => LoggingConfig {
				other: LogLevel::Warn,
				http: LogLevel::Warn,

				util: LogLevel::Warn,
				audiofile: LogLevel::Info,
				archive: LogLevel::Info,
				cli: LogLevel::Info,
			},

			Self::Verbose => LoggingConfig {
				other: LogLevel::Warn,
				http: LogLevel::Warn,

				util: LogLevel::Info,
				audiofile: LogLevel::Debug,
				archive: LogLevel::Debug,
				cli: LogLevel::Debug,
			},

			Self::Develop => LoggingConfig {
				other: LogLevel::Debug,
				http: LogLevel::Warn,

				util: LogLevel::Debug,
				audiofile: LogLevel::Trace,
				archive: LogLevel::Trace,
				cli: LogLevel::Trace,
			},

			Self::Trace => LoggingConfig {
				other: LogLevel::Trace,
				http: LogLevel::Debug,

				util: LogLevel::Trace,
				audiofile: LogLevel::Trace,
				archive: LogLevel::Trace,
				cli: LogLevel::Trace,
			},
		}
	}
}

pub struct LoggingConfig {
	other: LogLevel,
	http: LogLevel,

	util: LogLevel,
	audiofile: LogLevel,
	archive: LogLevel,
	cli: LogLevel,
}

impl LoggingConfig {
	fn directives(&self) -> String {
		[
			//
			// Non-configurable sources
			//
			format!("rustls={}", LogLevel::Warn),
			format!("h2={}", LogLevel::Warn),
			//
			// Configurable sources
			//
			format!("hyper={}", self.http),
			format!("hyper_util={}", self.http),
			format!("reqwest={}", self.http),
			format!("ferry_util={}", self.util),
			format!("ferry_audiofile={}", self.audiofile),
			format!("ferry_archive={}", self.archive),
			format!("ferry={}", self.cli),
			self.other.to_string(),
		]
		.join(",")
	}
}

impl From<LoggingConfig> for EnvFilter {
	fn from(value: LoggingConfig) -> Self {
		// Every directive above is well-formed,
		// so nothing is dropped here.
		EnvFilter::builder().parse_lossy(value.directives())
	}
}
