use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use hibp_range_server::{DEFAULT_LISTEN, Error, ServerConfig};
use hibp_rangedb::{BuildConfig, BuildStats};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hibp-range")]
#[command(about = "Build and serve a Have I Been Pwned k-anonymity range database")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate lookup database from ordered-by-hash txt file
    #[command(
        after_help = "Example: hibp-range generate pwned-passwords-ordered-by-hash.txt pwned-passwords.db"
    )]
    Generate {
        /// Corpus sorted by hash, one SHA-1 per line
        corpus: PathBuf,

        /// Database file to write (overwritten)
        db: PathBuf,

        /// Disable progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// Start Have I Been Pwned password API
    #[command(after_help = "Example: hibp-range serve pwned-passwords.db")]
    Serve {
        /// Database built by `generate`
        db: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = DEFAULT_LISTEN)]
        listen: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_target(false)
        .init();

    match cli.command {
        Command::Generate { corpus, db, no_progress } => generate(corpus, db, no_progress).await,
        Command::Serve { db, listen } => {
            hibp_range_server::run(ServerConfig { db_path: db, listen }).await
        }
    }
}

async fn generate(corpus: PathBuf, db: PathBuf, no_progress: bool) -> Result<(), Error> {
    let progress_counter = Arc::new(AtomicU64::new(0));

    let spinner = if !no_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {pos} hashes ({per_sec}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Some(pb)
    } else {
        None
    };

    // Spawn progress updater task
    let progress_task = spinner.clone().map(|pb| {
        let counter = Arc::clone(&progress_counter);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;
                pb.set_position(counter.load(Ordering::Relaxed));
            }
        })
    });

    // The build is sequential blocking I/O; keep it off the runtime threads.
    let counter = Arc::clone(&progress_counter);
    let result = tokio::task::spawn_blocking(move || {
        hibp_rangedb::generate(&corpus, &db, &BuildConfig::default(), Some(counter.as_ref()))
    })
    .await;

    if let Some(task) = progress_task {
        task.abort();
    }

    let outcome = result.map_err(Error::from).and_then(|r| r.map_err(Error::from));
    if let Some(pb) = &spinner {
        finish_spinner(pb, &outcome);
    }
    outcome.map(|_| ())
}

/// Leaves the spinner in its final state, whether the build finished or not.
fn finish_spinner(pb: &ProgressBar, outcome: &Result<BuildStats, Error>) {
    match outcome {
        Ok(stats) => {
            pb.set_position(stats.records as u64);
            pb.finish_with_message("done");
        }
        Err(_) => pb.abandon_with_message("failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_done() {
        let pb = ProgressBar::hidden();
        let stats = BuildStats { records: 42, prefixes_present: 3, elapsed: Duration::ZERO };
        finish_spinner(&pb, &Ok(stats));
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 42);
        assert_eq!(pb.message(), "done");
    }

    #[tokio::test]
    async fn test_spinner_failed_on_panicked_build() {
        let join_err = tokio::task::spawn_blocking(|| panic!("build panicked"))
            .await
            .unwrap_err();
        let pb = ProgressBar::hidden();
        finish_spinner(&pb, &Err(Error::Task(join_err)));
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "failed");
    }

    #[test]
    fn test_spinner_failed_on_build_error() {
        let pb = ProgressBar::hidden();
        finish_spinner(&pb, &Err(Error::Db(hibp_rangedb::Error::TooManyRecords)));
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "failed");
    }
}
