//! Command dispatch: bridges CLI args -> bridge operations -> output formatting.

pub mod config_cmd;
pub mod probe;
pub mod snapshot;
pub mod watch;

use flichub_api::TcpLink;
use flichub_core::{Bridge, BridgeConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::{self, CliError};

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, config: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Snapshot(args) => snapshot::handle(config, &args, global).await,
        Command::Watch(args) => watch::handle(config, &args, global).await,
        Command::Probe => probe::handle(config, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Set up a bridge for one request, run `f`, shut it down.
async fn with_bridge<T, F, Fut>(config: BridgeConfig, f: F) -> Result<T, CliError>
where
    F: FnOnce(Bridge<TcpLink>) -> Fut,
    Fut: Future<Output = Result<T, flichub_core::CoreError>>,
{
    let address = config.address.clone();
    let link = TcpLink::new(config.request_timeout);
    Bridge::oneshot(config, link, f)
        .await
        .map_err(error::at_address(&address))
}
