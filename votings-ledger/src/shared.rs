use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use votings_common::{Amount, CallContext, Result};

use crate::ledger::VotingLedger;
use crate::request::{Request, Response};
use crate::round::{RoundSnapshot, VotingId};
use crate::transfer::ValueTransfer;

/// Cloneable handle that serializes access to one ledger.
///
/// Each mutation runs under a single write guard, including the transfer
/// inside a withdrawal, so callers racing on the same ledger observe a
/// single total order.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<VotingLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: VotingLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub async fn create_round(&self, ctx: &CallContext) -> Result<VotingId> {
        self.inner.write().await.create_round(ctx)
    }

    pub async fn get_round(&self, id: VotingId) -> Result<RoundSnapshot> {
        self.inner.read().await.get_round(id)
    }

    pub async fn cast_stake(&self, ctx: &CallContext, id: VotingId, candidate: &str, amount: Amount) -> Result<()> {
        self.inner.write().await.cast_stake(ctx, id, candidate, amount)
    }

    pub async fn close_round(&self, ctx: &CallContext, id: VotingId) -> Result<Amount> {
        self.inner.write().await.close_round(ctx, id)
    }

    pub async fn show_commission(&self, ctx: &CallContext) -> Result<Amount> {
        self.inner.read().await.show_commission(ctx)
    }

    pub async fn withdraw_commission(&self, ctx: &CallContext, transfers: &mut dyn ValueTransfer) -> Result<Amount> {
        self.inner.write().await.withdraw_commission(ctx, transfers)
    }

    pub async fn execute(&self, request: &Request, transfers: &mut dyn ValueTransfer) -> Result<Response> {
        self.inner.write().await.execute(request, transfers)
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> VotingLedger {
        self.inner.read().await.clone()
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.inner.read().await.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(VotingLedger::from_json(&data)?))
    }
}
