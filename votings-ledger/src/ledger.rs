use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use votings_common::{format_ether, Address, Amount, CallContext, LedgerError, Result};

use crate::commission::{commission_for, CommissionAccount};
use crate::constants::MATURATION_PERIOD_SECS;
use crate::events::LedgerEvent;
use crate::round::{RoundSnapshot, VotingId, VotingRound};
use crate::transfer::ValueTransfer;

/// The voting ledger: every round ever created, the owner's commission
/// balance and the journal of what happened.
///
/// Operations validate everything before mutating, so an `Err` leaves the
/// ledger exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingLedger {
    owner: Address,
    next_voting_id: u64,
    /// Indexed by voting id.
    rounds: Vec<VotingRound>,
    commission: CommissionAccount,
    /// Total value ever staked into the ledger.
    received: Amount,
    events: Vec<LedgerEvent>,
}

impl VotingLedger {
    pub fn new(owner: Address) -> Self {
        info!("🗳️ Voting ledger created for owner {}", owner);
        Self {
            owner,
            next_voting_id: 0,
            rounds: Vec::new(),
            commission: CommissionAccount::default(),
            received: 0,
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Id the next created round will get; equals the number of rounds.
    pub fn next_voting_id(&self) -> VotingId {
        VotingId(self.next_voting_id)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &VotingRound> {
        self.rounds.iter()
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn events_for(&self, id: VotingId) -> impl Iterator<Item = &LedgerEvent> {
        self.events.iter().filter(move |e| e.voting() == Some(id))
    }

    /// Value the ledger currently holds: every stake received minus commission paid out.
    pub fn escrow_balance(&self) -> Amount {
        self.received.saturating_sub(self.commission.withdrawn())
    }

    pub fn commission_account(&self) -> &CommissionAccount {
        &self.commission
    }

    fn ensure_owner(&self, ctx: &CallContext, operation: &str) -> Result<()> {
        if ctx.caller != self.owner {
            warn!("⛔ {} rejected: {} is not the owner", operation, ctx.caller);
            return Err(LedgerError::Unauthorized(ctx.caller.to_string()));
        }
        Ok(())
    }

    /// Full round, open or closed.
    pub fn round(&self, id: VotingId) -> Result<&VotingRound> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.rounds.get(idx))
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// A round that still accepts stakes.
    pub(crate) fn open_round(&self, id: VotingId) -> Result<&VotingRound> {
        let round = self.round(id)?;
        if round.is_completed() {
            return Err(LedgerError::AlreadyCompleted(id.0));
        }
        Ok(round)
    }

    fn round_mut(&mut self, id: VotingId) -> Result<&mut VotingRound> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.rounds.get_mut(idx))
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Opens a new round stamped with the call's timestamp. Owner only.
    pub fn create_round(&mut self, ctx: &CallContext) -> Result<VotingId> {
        self.ensure_owner(ctx, "create_round")?;

        let id = VotingId(self.next_voting_id);
        let next = self
            .next_voting_id
            .checked_add(1)
            .ok_or_else(|| LedgerError::Overflow("voting id".to_string()))?;

        self.rounds.push(VotingRound::new(id, ctx.timestamp));
        self.next_voting_id = next;
        self.events.push(LedgerEvent::RoundCreated { id, created: ctx.timestamp });

        info!("🆕 Voting {} created at {}", id, ctx.timestamp);
        Ok(id)
    }

    pub fn get_round(&self, id: VotingId) -> Result<RoundSnapshot> {
        let snapshot = self.round(id)?.snapshot();
        debug!("Voting {} read: {:?}", id, snapshot);
        Ok(snapshot)
    }

    /// Records the caller's paid vote for `candidate` and keeps the value in escrow.
    ///
    /// # Errors
    /// - [`LedgerError::NotFound`] if the round does not exist.
    /// - [`LedgerError::AlreadyCompleted`] if the round is closed.
    /// - [`LedgerError::InvalidStake`] if `amount` is zero.
    /// - [`LedgerError::InvalidCandidate`] if `candidate` is malformed or is the caller.
    /// - [`LedgerError::DuplicateVote`] if the caller already voted in this round.
    pub fn cast_stake(&mut self, ctx: &CallContext, id: VotingId, candidate: &str, amount: Amount) -> Result<()> {
        let round = self.open_round(id)?;

        if amount == 0 {
            return Err(LedgerError::InvalidStake);
        }

        let candidate = Address::try_from(candidate)
            .map_err(|e| LedgerError::InvalidCandidate(format!("'{}': {}", candidate, e)))?;
        if candidate == ctx.caller {
            return Err(LedgerError::InvalidCandidate(format!("{} cannot vote for themselves", candidate)));
        }
        if round.has_voted(&ctx.caller) {
            return Err(LedgerError::DuplicateVote { id: id.0, voter: ctx.caller.to_string() });
        }

        let received = self
            .received
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow("escrowed value".to_string()))?;

        self.round_mut(id)?
            .record_stake(ctx.caller.clone(), candidate.clone(), amount)?;
        self.received = received;

        info!(
            "🗳️ {} staked {} on {} in voting {}",
            ctx.caller,
            format_ether(amount),
            candidate,
            id
        );
        self.events.push(LedgerEvent::StakeCast {
            id,
            voter: ctx.caller.clone(),
            candidate,
            amount,
        });
        Ok(())
    }

    /// Closes a round that has matured and holds stakes, crediting the
    /// commission. Owner only; `ctx.timestamp` is the closing time.
    pub fn close_round(&mut self, ctx: &CallContext, id: VotingId) -> Result<Amount> {
        self.ensure_owner(ctx, "close_round")?;

        let round = self.round(id)?;
        if round.is_completed() {
            return Err(LedgerError::AlreadyCompleted(id.0));
        }
        if round.budget() == 0 {
            return Err(LedgerError::EmptyBudget(id.0));
        }
        if round.age_at(ctx.timestamp) < MATURATION_PERIOD_SECS {
            return Err(LedgerError::TooEarly {
                id: id.0,
                remaining: round.matures_at().saturating_sub(ctx.timestamp),
            });
        }

        let budget = round.budget();
        let commission = commission_for(budget);
        self.commission.check_credit(commission)?;

        self.round_mut(id)?.close(ctx.timestamp, commission);
        self.commission.credit(commission)?;

        info!(
            "🔒 Voting {} closed: budget {} | commission {}",
            id,
            format_ether(budget),
            format_ether(commission)
        );
        self.events.push(LedgerEvent::RoundClosed {
            id,
            budget,
            commission,
            closed_at: ctx.timestamp,
        });
        Ok(commission)
    }

    /// Commission currently owed to the owner. Owner only.
    pub fn show_commission(&self, ctx: &CallContext) -> Result<Amount> {
        self.ensure_owner(ctx, "show_commission")?;
        Ok(self.commission.accrued())
    }

    /// Pays the whole accrued commission to the owner through `transfers`.
    ///
    /// The balance is only cleared once the transfer succeeded; a failed
    /// transfer leaves it in place for a later attempt.
    pub fn withdraw_commission(&mut self, ctx: &CallContext, transfers: &mut dyn ValueTransfer) -> Result<Amount> {
        self.ensure_owner(ctx, "withdraw_commission")?;

        let amount = self.commission.accrued();
        if amount == 0 {
            return Err(LedgerError::NothingToWithdraw);
        }

        if let Err(e) = transfers.transfer(&self.owner, amount) {
            warn!("💸 Commission payout of {} failed: {}", format_ether(amount), e);
            return Err(LedgerError::TransferFailed(e.to_string()));
        }
        self.commission.settle();

        info!("💸 Commission {} withdrawn to {}", format_ether(amount), self.owner);
        self.events.push(LedgerEvent::CommissionWithdrawn {
            to: self.owner.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Re-checks every bookkeeping invariant; used after loading a snapshot.
    pub fn verify_invariants(&self) -> Result<()> {
        if self.next_voting_id != self.rounds.len() as u64 {
            return Err(LedgerError::Corrupted(format!(
                "next voting id {} but {} rounds stored",
                self.next_voting_id,
                self.rounds.len()
            )));
        }

        let mut closed_budgets: Amount = 0;
        let mut budgets: Amount = 0;
        let mut closed_commission: Amount = 0;
        for (idx, round) in self.rounds.iter().enumerate() {
            if round.id().0 != idx as u64 {
                return Err(LedgerError::Corrupted(format!(
                    "round at position {} carries id {}",
                    idx,
                    round.id()
                )));
            }
            round.check_consistency()?;

            let overflow = || LedgerError::Corrupted("budget totals overflow".to_string());
            budgets = budgets.checked_add(round.budget()).ok_or_else(overflow)?;
            if let crate::round::RoundStatus::Closed { commission, .. } = round.status() {
                if commission != commission_for(round.budget()) {
                    return Err(LedgerError::Corrupted(format!(
                        "voting {} credited {} instead of its commission",
                        round.id(),
                        commission
                    )));
                }
                closed_budgets = closed_budgets.checked_add(round.budget()).ok_or_else(overflow)?;
                closed_commission = closed_commission.checked_add(commission).ok_or_else(overflow)?;
            }
        }

        self.commission.check_consistency()?;
        if self.commission.credited() != closed_commission {
            return Err(LedgerError::Corrupted(format!(
                "commission credited {} but closed votings owe {} (closed budgets {})",
                self.commission.credited(),
                closed_commission,
                closed_budgets
            )));
        }
        if self.received != budgets {
            return Err(LedgerError::Corrupted(format!(
                "received {} but budgets sum to {}",
                self.received, budgets
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{InMemoryTransfers, TransferError};
    use votings_common::parse_ether;

    const T0: u64 = 1_700_000_000;

    fn addr(seed: u8) -> Address {
        Address::from_seed(&[seed; 32]).unwrap()
    }

    fn ctx(seed: u8) -> CallContext {
        CallContext::new(addr(seed), T0)
    }

    fn eth(s: &str) -> Amount {
        parse_ether(s).unwrap()
    }

    fn ledger() -> VotingLedger {
        VotingLedger::new(addr(1))
    }

    #[test]
    fn test_deployment_state() {
        let ledger = ledger();
        assert_eq!(ledger.owner(), &addr(1));
        assert_eq!(ledger.next_voting_id(), VotingId(0));
        assert_eq!(ledger.show_commission(&ctx(1)).unwrap(), 0);
        ledger.verify_invariants().unwrap();
    }

    #[test]
    fn test_owner_creates_rounds_densely() {
        let mut ledger = ledger();
        for expected in 0..5 {
            assert_eq!(ledger.create_round(&ctx(1)).unwrap(), VotingId(expected));
        }
        assert_eq!(ledger.next_voting_id(), VotingId(5));

        let snap = ledger.get_round(VotingId(1)).unwrap();
        assert_eq!(snap, RoundSnapshot { id: 1, created: T0, completed: false, candidates: 0, budget: 0 });
    }

    #[test]
    fn test_non_owner_cannot_create() {
        let mut ledger = ledger();
        let err = ledger.create_round(&ctx(2)).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
        assert_eq!(ledger.next_voting_id(), VotingId(0));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_get_missing_round() {
        let mut ledger = ledger();
        ledger.create_round(&ctx(1)).unwrap();
        assert!(matches!(ledger.get_round(VotingId(10)), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_stake_updates_budget_and_candidates() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();

        ledger.cast_stake(&ctx(1), id, &addr(2), eth("0.01")).unwrap();
        let snap = ledger.get_round(id).unwrap();
        assert_eq!(snap.candidates, 1);
        assert_eq!(snap.budget, 10_000_000_000_000_000);

        ledger.cast_stake(&ctx(2), id, &addr(4), eth("0.01")).unwrap();
        assert_eq!(ledger.get_round(id).unwrap().candidates, 2);

        ledger.cast_stake(&ctx(3), id, &addr(4), eth("0.03")).unwrap();
        let round = ledger.round(id).unwrap();
        assert_eq!(round.candidates(), 2);
        assert_eq!(round.budget(), eth("0.05"));
        assert_eq!(round.stake_of(&addr(4)), eth("0.04"));
        assert_eq!(ledger.escrow_balance(), eth("0.05"));
        ledger.verify_invariants().unwrap();
    }

    #[test]
    fn test_stake_guards_in_order() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();

        assert!(matches!(
            ledger.cast_stake(&ctx(1), VotingId(10), &addr(2), eth("0.01")),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.cast_stake(&ctx(1), id, &addr(2), 0),
            Err(LedgerError::InvalidStake)
        ));
        assert!(matches!(
            ledger.cast_stake(&ctx(1), id, "abcdef", eth("0.01")),
            Err(LedgerError::InvalidCandidate(_))
        ));
        assert!(matches!(
            ledger.cast_stake(&ctx(2), id, &addr(2), eth("0.01")),
            Err(LedgerError::InvalidCandidate(_))
        ));

        ledger.cast_stake(&ctx(1), id, &addr(2), eth("0.01")).unwrap();
        let err = ledger.cast_stake(&ctx(1), id, &addr(3), eth("0.01")).unwrap_err();
        assert_eq!(err, LedgerError::DuplicateVote { id: 0, voter: addr(1).to_string() });

        let snap = ledger.get_round(id).unwrap();
        assert_eq!(snap.budget, eth("0.01"));
        assert_eq!(snap.candidates, 1);
        assert_eq!(ledger.events().len(), 2);
    }

    #[test]
    fn test_close_guards() {
        let mut ledger = ledger();
        let empty = ledger.create_round(&ctx(1)).unwrap();
        let funded = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(1), funded, &addr(2), eth("0.01")).unwrap();

        let later = ctx(1).at(T0 + MATURATION_PERIOD_SECS);

        assert!(matches!(ledger.close_round(&ctx(2).at(T0 + MATURATION_PERIOD_SECS), funded), Err(LedgerError::Unauthorized(_))));
        assert!(matches!(ledger.close_round(&later, VotingId(10)), Err(LedgerError::NotFound(_))));
        assert_eq!(ledger.close_round(&later, empty), Err(LedgerError::EmptyBudget(0)));
        assert_eq!(
            ledger.close_round(&ctx(1).at(T0 + MATURATION_PERIOD_SECS - 1), funded),
            Err(LedgerError::TooEarly { id: 1, remaining: 1 })
        );
        assert!(!ledger.get_round(funded).unwrap().completed);

        assert_eq!(ledger.close_round(&later, funded).unwrap(), eth("0.001"));
        assert!(ledger.get_round(funded).unwrap().completed);
        assert_eq!(ledger.close_round(&later, funded), Err(LedgerError::AlreadyCompleted(1)));
    }

    #[test]
    fn test_clock_before_creation_is_too_early() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(3), id, &addr(2), 1).unwrap();

        let err = ledger.close_round(&ctx(1).at(T0 - 10), id).unwrap_err();
        assert_eq!(err, LedgerError::TooEarly { id: 0, remaining: MATURATION_PERIOD_SECS + 10 });
    }

    #[test]
    fn test_closed_round_rejects_stakes() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(1), id, &addr(2), eth("0.01")).unwrap();
        ledger.close_round(&ctx(1).at(T0 + MATURATION_PERIOD_SECS), id).unwrap();

        let err = ledger.cast_stake(&ctx(2).at(T0 + 4 * 86_400), id, &addr(1), eth("0.01")).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyCompleted(0));
        assert_eq!(ledger.get_round(id).unwrap().budget, eth("0.01"));
    }

    #[test]
    fn test_commission_accrues_and_withdraws() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(1), id, &addr(2), eth("0.01")).unwrap();
        ledger.cast_stake(&ctx(2), id, &addr(1), eth("0.01")).unwrap();
        ledger.close_round(&ctx(1).at(T0 + 4 * 86_400), id).unwrap();

        assert_eq!(ledger.show_commission(&ctx(1)).unwrap(), eth("0.002"));
        assert!(matches!(ledger.show_commission(&ctx(2)), Err(LedgerError::Unauthorized(_))));

        let mut transfers = InMemoryTransfers::new();
        assert!(matches!(
            ledger.withdraw_commission(&ctx(2), &mut transfers),
            Err(LedgerError::Unauthorized(_))
        ));
        assert_eq!(ledger.withdraw_commission(&ctx(1), &mut transfers).unwrap(), eth("0.002"));
        assert_eq!(transfers.received(&addr(1)), eth("0.002"));
        assert_eq!(ledger.show_commission(&ctx(1)).unwrap(), 0);
        assert_eq!(ledger.escrow_balance(), eth("0.018"));

        assert_eq!(
            ledger.withdraw_commission(&ctx(1), &mut transfers),
            Err(LedgerError::NothingToWithdraw)
        );
        assert_eq!(transfers.payouts().len(), 1);
        ledger.verify_invariants().unwrap();
    }

    #[test]
    fn test_failed_transfer_keeps_commission() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(3), id, &addr(2), eth("1")).unwrap();
        ledger.close_round(&ctx(1).at(T0 + MATURATION_PERIOD_SECS), id).unwrap();

        let mut transfers = InMemoryTransfers::new();
        transfers.fail_next(TransferError::Rejected(addr(1).to_string()));
        let err = ledger.withdraw_commission(&ctx(1), &mut transfers).unwrap_err();
        assert!(matches!(err, LedgerError::TransferFailed(_)));
        assert_eq!(ledger.show_commission(&ctx(1)).unwrap(), eth("0.1"));

        assert_eq!(ledger.withdraw_commission(&ctx(1), &mut transfers).unwrap(), eth("0.1"));
        assert_eq!(transfers.received(&addr(1)), eth("0.1"));
    }

    #[test]
    fn test_huge_budget_still_closes() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(3), id, &addr(2), u128::MAX).unwrap();

        let commission = ledger.close_round(&ctx(1).at(T0 + MATURATION_PERIOD_SECS), id).unwrap();
        assert_eq!(commission, u128::MAX / 10);
        assert_eq!(ledger.show_commission(&ctx(1)).unwrap(), u128::MAX / 10);
        ledger.verify_invariants().unwrap();
    }

    #[test]
    fn test_reads_are_idempotent() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(3), id, &addr(2), eth("0.5")).unwrap();

        assert_eq!(ledger.get_round(id).unwrap(), ledger.get_round(id).unwrap());
        assert_eq!(ledger.show_commission(&ctx(1)).unwrap(), ledger.show_commission(&ctx(1)).unwrap());
    }

    #[test]
    fn test_events_follow_the_lifecycle() {
        let mut ledger = ledger();
        let a = ledger.create_round(&ctx(1)).unwrap();
        let b = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(3), a, &addr(2), 7).unwrap();
        ledger.cast_stake(&ctx(3), b, &addr(2), 9).unwrap();
        ledger.close_round(&ctx(1).at(T0 + MATURATION_PERIOD_SECS), a).unwrap();

        let for_a: Vec<_> = ledger.events_for(a).collect();
        assert_eq!(for_a.len(), 3);
        assert!(matches!(for_a[0], LedgerEvent::RoundCreated { .. }));
        assert!(matches!(for_a[2], LedgerEvent::RoundClosed { budget: 7, commission: 0, .. }));
        assert_eq!(ledger.events_for(b).count(), 2);
    }

    #[test]
    fn test_invariants_catch_tampering() {
        let mut ledger = ledger();
        let id = ledger.create_round(&ctx(1)).unwrap();
        ledger.cast_stake(&ctx(3), id, &addr(2), 100).unwrap();
        ledger.verify_invariants().unwrap();

        let mut tampered = ledger.clone();
        tampered.next_voting_id = 4;
        assert!(matches!(tampered.verify_invariants(), Err(LedgerError::Corrupted(_))));

        let mut tampered = ledger.clone();
        tampered.received = 1;
        assert!(matches!(tampered.verify_invariants(), Err(LedgerError::Corrupted(_))));
    }
}
