#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod cmd;

#[derive(Parser)]
#[command(name = "nestopt", about = "Inspect optional values over nested tensor structures")]
struct Cli {
	/// Log debug events to stderr (overridden by RUST_LOG).
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Infer the descriptor of a value literal.
	Describe(cmd::describe::Args),
	/// Wrap a value literal (or nothing) into an optional.
	Wrap(cmd::wrap::Args),
	/// Send an optional through the wire codec and compare.
	Roundtrip(cmd::roundtrip::Args),
	/// Zero-fill an optional.
	Zeros(cmd::zeros::Args),
	/// Add two optionals leafwise.
	Add(cmd::add::Args),
	/// Compare two descriptors.
	Check(cmd::check::Args),
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run(command: Commands) -> nestopt::nest::Result<()> {
	match command {
		Commands::Describe(args) => cmd::describe::run(args),
		Commands::Wrap(args) => cmd::wrap::run(args),
		Commands::Roundtrip(args) => cmd::roundtrip::run(args),
		Commands::Zeros(args) => cmd::zeros::run(args),
		Commands::Add(args) => cmd::add::run(args),
		Commands::Check(args) => cmd::check::run(args),
	}
}

fn init_tracing(verbose: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "nestopt=debug" } else { "warn" }));
	let layer = fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true);
	tracing_subscriber::registry().with(filter).with(layer).init();
}
