use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use votings_common::{
    format_ether, utils::{security::generate_seed, time::current_time}, Address, LedgerError,
};
use votings_ledger::{
    InMemoryTransfers, LedgerEvent, Operation, Request, Response, RoundSnapshot, SharedLedger,
    ValueTransfer, VotingId, VotingLedger,
};

use crate::cli::{Cli, Commands};
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::journal::JournalTransfer;

/// Runs one command and returns what should be printed.
pub async fn run(cli: Cli) -> Result<String> {
    let Cli { config, caller, at, command } = cli;
    let timestamp = at.unwrap_or_else(current_time);

    let operation = match command {
        Commands::Deploy { owner } => return deploy(&config, &owner),
        Commands::Keygen => return keygen(),
        Commands::Rounds => return list_rounds(&config).await,
        Commands::Events { round } => return list_events(&config, round).await,
        Commands::CreateRound => Operation::CreateRound,
        Commands::GetRound { id } => Operation::GetRound { id },
        Commands::CastStake { id, candidate, value } => Operation::CastStake { id, candidate, value },
        Commands::CloseRound { id } => Operation::CloseRound { id },
        Commands::ShowCommission => Operation::ShowCommission,
        Commands::WithdrawCommission => Operation::WithdrawCommission,
    };

    let node = load_node(&config)?;
    let owner = node.config.owner.clone();
    let request = Request::new(caller.unwrap_or_default(), timestamp, operation);
    info!("▶️ {} by '{}' at {}", request.operation.name(), request.caller, timestamp);

    // The file lock blocks, so the whole call runs off the async workers.
    let response = tokio::task::spawn_blocking(move || execute_locked(&node, &request))
        .await
        .map_err(|e| NodeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
    Ok(render(&response, &owner))
}

/// Config plus its paths resolved against the config directory.
struct LoadedNode {
    config: NodeConfig,
    state_path: PathBuf,
    lock_path: PathBuf,
    payout_journal: PathBuf,
}

fn load_node(config_path: &Path) -> Result<LoadedNode> {
    let config = NodeConfig::load_from_file(config_path).map_err(|e| {
        NodeError::Config(format!("{}: {} (run `votings deploy` first)", config_path.display(), e))
    })?;
    let state_path = NodeConfig::resolve(config_path, &config.state_path);
    Ok(LoadedNode {
        lock_path: state_path.with_extension("lock"),
        state_path,
        payout_journal: NodeConfig::resolve(config_path, &config.payout_journal),
        config,
    })
}

/// Load, execute and save under an exclusive lock on the state, so concurrent
/// `votings` processes apply their calls one at a time.
///
/// Payouts are staged in memory and journaled only once the new state is on
/// disk. If the journal refuses a payout the previous state is written back
/// and the call fails with `TransferFailed`.
fn execute_locked(node: &LoadedNode, request: &Request) -> Result<Response> {
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&node.lock_path)?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _held = lock.write()?;

    let before = VotingLedger::load_from_file(&node.state_path)?;
    let mut ledger = before.clone();
    let mut staged = InMemoryTransfers::new();
    let response = ledger.execute(request, &mut staged)?;
    if ledger == before {
        return Ok(response);
    }
    ledger.save_to_file(&node.state_path)?;

    let mut journal = JournalTransfer::new(&node.payout_journal);
    for payout in staged.payouts() {
        if let Err(e) = journal.transfer(&payout.to, payout.amount) {
            warn!("💸 Journaling payout of {} failed, restoring state: {}", format_ether(payout.amount), e);
            before.save_to_file(&node.state_path)?;
            return Err(LedgerError::TransferFailed(e.to_string()).into());
        }
    }
    Ok(response)
}

fn deploy(config_path: &Path, owner: &str) -> Result<String> {
    if config_path.exists() {
        return Err(NodeError::Config(format!(
            "{} already exists; refusing to redeploy over it",
            config_path.display()
        )));
    }
    let owner = Address::try_from(owner)
        .map_err(|e| NodeError::Config(format!("owner '{}': {}", owner, e)))?;

    let config = NodeConfig::new(owner.clone());
    let state_path = NodeConfig::resolve(config_path, &config.state_path);

    VotingLedger::new(owner).save_to_file(&state_path)?;
    config.save_to_file(config_path)?;

    Ok(format!("Votings deployed to: {}", state_path.display()))
}

fn keygen() -> Result<String> {
    let seed = generate_seed();
    let address = Address::from_seed(&seed)
        .map_err(|e| NodeError::Config(format!("key derivation failed: {}", e)))?;
    Ok(format!("Address: {}\nSecret: {}", address, hex::encode(seed)))
}

async fn list_rounds(config_path: &Path) -> Result<String> {
    let node = load_node(config_path)?;
    let ledger = SharedLedger::load(&node.state_path).await?.snapshot().await;

    let lines: Vec<String> = ledger
        .rounds()
        .map(|round| render_round(&round.snapshot()))
        .collect();
    if lines.is_empty() {
        return Ok("No rounds yet".to_string());
    }
    Ok(lines.join("\n\n"))
}

async fn list_events(config_path: &Path, round: Option<u64>) -> Result<String> {
    let node = load_node(config_path)?;
    let ledger = SharedLedger::load(&node.state_path).await?.snapshot().await;

    let events: Vec<&LedgerEvent> = match round {
        Some(id) => ledger.events_for(VotingId(id)).collect(),
        None => ledger.events().iter().collect(),
    };
    let lines = events
        .into_iter()
        .map(|e| serde_json::to_string(e).map_err(LedgerError::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

fn render_round(snap: &RoundSnapshot) -> String {
    format!(
        "Round {}\n  created:    {}\n  completed:  {}\n  candidates: {}\n  budget:     {} ETH",
        snap.id,
        format_timestamp(snap.created),
        snap.completed,
        snap.candidates,
        format_ether(snap.budget)
    )
}

fn render(response: &Response, owner: &Address) -> String {
    match response {
        Response::Created(id) => format!("Round {} created", id),
        Response::Round(snap) => render_round(snap),
        Response::Staked => "Stake recorded".to_string(),
        Response::Closed { commission } => {
            format!("Round closed, commission {} ETH", format_ether(*commission))
        }
        Response::Commission(amount) => format!("{} ETH", format_ether(*amount)),
        Response::Withdrawn(amount) => format!("Withdrew {} ETH to {}", format_ether(*amount), owner),
    }
}
