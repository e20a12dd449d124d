use serde::de::DeserializeOwned;
use std::{env::VarError, io::ErrorKind, path::PathBuf};
use thiserror::Error;

/// An error we can encounter while loading configuration
#[derive(Debug, Error)]
pub enum EnvLoadError {
	/// We found a `.env` but could not read it
	#[error("i/o error while reading .env")]
	IoError(#[from] std::io::Error),

	/// A variable in `.env` isn't valid unicode
	#[error("invalid environment variable")]
	VarError(#[from] VarError),

	/// `.env` is malformed
	#[error("line parse error: `{on_line}` at char {at_char}")]
	LineParse { on_line: String, at_char: usize },

	#[error("other dotenvy error")]
	Other(#[source] dotenvy::Error),

	/// A required variable is not set
	#[error("missing value {0}")]
	MissingValue(String),

	/// A variable is set, but has a bad value
	#[error("parse error: {0}")]
	OtherParseError(String),
}

impl From<envy::Error> for EnvLoadError {
	fn from(value: envy::Error) -> Self {
		match value {
			envy::Error::MissingValue(name) => Self::MissingValue(name.to_owned()),
			envy::Error::Custom(message) => Self::OtherParseError(message),
		}
	}
}

/// A config, and where we got it from
pub enum LoadedEnv<T> {
	/// We loaded config from `.env` and env vars
	FoundFile { config: T, path: PathBuf },

	/// We could not find `.env` and only loaded env vars
	OnlyVars(T),
}

impl<T> LoadedEnv<T> {
	pub fn get_config(&self) -> &T {
		match self {
			Self::FoundFile { config, .. } | Self::OnlyVars(config) => config,
		}
	}
}

/// Load `.env` into the environment, if there is one.
/// Returns the path we loaded.
fn load_dotenv() -> Result<Option<PathBuf>, EnvLoadError> {
	return match dotenvy::dotenv() {
		Ok(path) => Ok(Some(path)),
		Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
		Err(dotenvy::Error::Io(err)) => Err(err.into()),
		Err(dotenvy::Error::EnvVar(err)) => Err(err.into()),
		Err(dotenvy::Error::LineParse(on_line, at_char)) => {
			Err(EnvLoadError::LineParse { on_line, at_char })
		}
		Err(err) => Err(EnvLoadError::Other(err)),
	};
}

/// Load the configuration type `T` from the current environment,
/// including the `.env` if it exists.
///
/// Variables that are already set take precedence over `.env`.
pub fn load_env<T: DeserializeOwned>() -> Result<LoadedEnv<T>, EnvLoadError> {
	let path = load_dotenv()?;
	let config = envy::from_env::<T>()?;

	return Ok(match path {
		Some(path) => LoadedEnv::FoundFile { config, path },
		None => LoadedEnv::OnlyVars(config),
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Deserialize)]
	struct TestConfig {
		test_name: String,
		#[serde(default)]
		test_size: usize,
	}

	#[test]
	fn envy_errors() {
		let vars = vec![("TEST_SIZE".to_owned(), "12".to_owned())];
		let err = envy::from_iter::<_, TestConfig>(vars).map_err(EnvLoadError::from);
		assert!(matches!(err, Err(EnvLoadError::MissingValue(x)) if x == "test_name"));

		let vars = vec![
			("TEST_NAME".to_owned(), "a".to_owned()),
			("TEST_SIZE".to_owned(), "many".to_owned()),
		];
		let err = envy::from_iter::<_, TestConfig>(vars).map_err(EnvLoadError::from);
		assert!(matches!(err, Err(EnvLoadError::OtherParseError(_))));

		let vars = vec![("TEST_NAME".to_owned(), "a".to_owned())];
		let config = envy::from_iter::<_, TestConfig>(vars).unwrap();
		assert_eq!(config.test_name, "a");
		assert_eq!(config.test_size, 0);
	}
}
