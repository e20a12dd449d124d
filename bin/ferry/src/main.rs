use anyhow::Result;
use clap::{Parser, Subcommand};
use config::FerryConfig;
use ferry_util::{load_env, LoadedEnv};
use std::path::PathBuf;
use tracing::info;

mod archive;
mod config;
mod flac;
mod source;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Print the metadata blocks of a flac file
	Flac {
		/// A local path or an http(s) url
		source: String,

		/// Print json instead of text
		#[arg(long)]
		json: bool,

		/// Include a data url for every picture
		#[arg(long)]
		picture_urls: bool,
	},

	/// Print the exact size of a tar archive of a local directory
	TarSize { dir: PathBuf },

	/// Unpack a tar archive into a directory.
	/// Use `-` to read the archive from stdin.
	Untar { archive: String, target: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config_res = match load_env::<FerryConfig>() {
		Ok(x) => x,

		#[expect(clippy::print_stderr)]
		Err(err) => {
			eprintln!("Error while loading .env: {err}");
			std::process::exit(1);
		}
	};

	let config = config_res.get_config().clone();

	// Our output goes to stdout, logs go elsewhere
	tracing_subscriber::fmt()
		.with_env_filter(config.ferry_loglevel.get_config())
		.with_writer(std::io::stderr)
		.without_time()
		.with_ansi(true)
		.init();

	// Do this now, logging wasn't available earlier
	match config_res {
		LoadedEnv::FoundFile { config, path } => {
			info!(message = "Loaded config from .env", ?path, ?config);
		}
		LoadedEnv::OnlyVars(config) => {
			info!(
				message = "No `.env` found, loaded config from environment",
				?config
			);
		}
	};

	match args.command {
		Commands::Flac {
			source,
			json,
			picture_urls,
		} => flac::run(&config, &source, json, picture_urls).await,
		Commands::TarSize { dir } => archive::tar_size(dir).await,
		Commands::Untar { archive, target } => archive::untar(&config, &archive, target).await,
	}
}
