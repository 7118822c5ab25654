//! mpls-packet-gen: periodic MPLS-over-UDP encapsulated ICMP echo sender

use mplsgen_cli::{logging, Cli};
use mplsgen_core::{DryRunTransmitter, Error, RawIpTransmitter, Transmitter};
use mplsgen_emitter::{Emitter, EmitterContext};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Resolves after `timeout`, or never
async fn timeout_elapsed(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Map the Ctrl-C listener outcome; a listener that cannot be installed is an error
fn interrupted(signal: io::Result<()>) -> mplsgen_core::Result<()> {
    match signal {
        Ok(()) => {
            info!("Interrupted, stopping");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Unable to listen for Ctrl-C");
            Err(Error::Io(e))
        }
    }
}

async fn run(cli: Cli) -> mplsgen_core::Result<()> {
    let config = Arc::new(cli.to_config()?);

    let transmitter: Box<dyn Transmitter> = if cli.dry_run {
        Box::new(DryRunTransmitter::new())
    } else {
        Box::new(RawIpTransmitter::open()?)
    };

    let emitter = Emitter::new(config, transmitter, std::io::stdout())?;
    let ctx = EmitterContext::new();
    let mut handle = emitter.spawn(ctx.clone());

    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            ctx.stop();
            interrupted(signal).map(|()| None)
        }
        _ = timeout_elapsed(cli.timeout()) => {
            info!(timeout_secs = cli.timeout, "Timeout reached, stopping");
            ctx.stop();
            Ok(None)
        }
        result = handle.wait() => Ok(Some(result)),
    };

    let stats = match finished {
        Ok(Some(result)) => result?,
        Ok(None) => handle.join().await?,
        Err(e) => {
            handle.join().await?;
            return Err(e);
        }
    };

    info!(%stats, "Done");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();
    logging::init(cli.log_level());

    if let Err(e) = run(cli).await {
        error!(error = %e, "mpls-packet-gen failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_by_ctrl_c() {
        assert!(interrupted(Ok(())).is_ok());
    }

    #[test]
    fn test_signal_listener_failure_is_an_error() {
        let result = interrupted(Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "signal handler unavailable",
        )));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
