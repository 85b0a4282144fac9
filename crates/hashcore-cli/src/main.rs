use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::Parser;
use hashcore::{CancelToken, Context, Digest, HashError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::App;
use crate::tracker::{ProgressTracker, ProgressTrackerConfig, Tracker};

mod app;
mod tracker;

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Hashed(Digest),
    Mismatch { expected: Digest, actual: Digest },
}

fn main() -> ExitCode {
    let app = App::parse();
    init_logging(&app.log_level);

    match run(&app) {
        Ok(Outcome::Hashed(digest)) => {
            println!("{digest}  {}", app.path.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::Mismatch { expected, actual }) => {
            eprintln!(
                "{}: digest mismatch (expected {expected}, got {actual})",
                app.path.display()
            );
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("hashcore: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(app: &App) -> anyhow::Result<Outcome> {
    let expected = app
        .expect
        .as_deref()
        .map(Digest::from_hex)
        .transpose()
        .context("invalid --expect value")?;

    let mut ctx = Context::open(&app.path, app.options())
        .with_context(|| format!("cannot hash {}", app.path.display()))?;

    let tracker = ProgressTracker::new(ProgressTrackerConfig {
        len:    ctx.total(),
        hidden: app.quiet,
    });

    // dropping the sender stops the timer early
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let timer = app
        .timeout_ms
        .map(|ms| spawn_timeout(ctx.cancel_token(), Duration::from_millis(ms), done_rx));

    let outcome = ctx.process(|progress| tracker.update(progress));
    drop(done_tx);
    if let Some(timer) = timer {
        let _ = timer.join();
    }

    match outcome {
        Ok(()) => tracker.finish(None),
        Err(HashError::Cancelled { processed, total }) => {
            tracker.abandon("cancelled".to_string());
            ctx.cleanup()?;
            bail!("timed out after hashing {processed} of {total} bytes");
        }
        Err(e) => {
            tracker.abandon("failed".to_string());
            ctx.cleanup()?;
            return Err(e).context("hashing failed");
        }
    }

    let actual = ctx.finalize()?;
    tracing::info!(digest = %actual, bytes = ctx.processed(), "hashed");

    match expected {
        Some(expected) if expected != actual => Ok(Outcome::Mismatch { expected, actual }),
        _ => Ok(Outcome::Hashed(actual)),
    }
}

fn spawn_timeout(
    token: CancelToken,
    timeout: Duration,
    done: mpsc::Receiver<()>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(mpsc::RecvTimeoutError::Timeout) = done.recv_timeout(timeout) {
            tracing::debug!(?timeout, "timeout reached, cancelling");
            token.cancel();
        }
    })
}
