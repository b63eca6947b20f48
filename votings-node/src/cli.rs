use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "votings")]
#[command(about = "Paid voting rounds with an owner commission")]
pub struct Cli {
    /// Node config, written by `deploy`.
    #[arg(long, global = true, default_value = "votings/config.json")]
    pub config: PathBuf,

    /// Address the call is made as.
    #[arg(long, global = true)]
    pub caller: Option<String>,

    /// Call timestamp in UNIX seconds (defaults to now).
    #[arg(long, global = true)]
    pub at: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an empty ledger owned by OWNER
    Deploy {
        #[arg(long)]
        owner: String,
    },
    /// Open a new voting round (owner only)
    #[command(alias = "add-voting")]
    CreateRound,
    /// Show a round
    #[command(alias = "get-voting")]
    GetRound {
        id: Option<String>,
    },
    /// Stake VALUE ether on CANDIDATE in round ID
    #[command(alias = "vote")]
    CastStake {
        id: Option<String>,
        candidate: Option<String>,
        #[arg(long)]
        value: Option<String>,
    },
    /// Close a matured round and credit the commission (owner only)
    #[command(alias = "close-voting")]
    CloseRound {
        id: Option<String>,
    },
    /// Print the accrued commission (owner only)
    ShowCommission,
    /// Pay the accrued commission to the owner (owner only)
    #[command(alias = "withdraw")]
    WithdrawCommission,
    /// List every round
    Rounds,
    /// Print the event journal, optionally for one round
    Events {
        #[arg(long)]
        round: Option<u64>,
    },
    /// Generate a fresh identity
    Keygen,
}
