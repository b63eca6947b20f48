use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use votings_common::{Address, Amount, LedgerError, Result};

use crate::constants::MATURATION_PERIOD_SECS;

/// Sequence number of a voting. Dense, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VotingId(pub u64);

impl VotingId {
    /// Resolves a raw id argument. A missing, blank or non-numeric id is
    /// reported the same way as an id that does not exist.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        match raw {
            Some(s) => s
                .parse::<u64>()
                .map(VotingId)
                .map_err(|_| LedgerError::NotFound(format!("malformed voting id '{}'", s))),
            None => Err(LedgerError::NotFound("no voting id given".to_string())),
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VotingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a voting. `Open` is entered on creation and `Closed` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Closed {
        closed_at: u64,
        /// Commission credited to the owner when the voting closed.
        commission: Amount,
    },
}

impl RoundStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, RoundStatus::Closed { .. })
    }
}

/// Public view of a voting, as returned by `get_round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub id: u64,
    pub created: u64,
    pub completed: bool,
    pub candidates: u64,
    pub budget: Amount,
}

/// One paid voting campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingRound {
    id: VotingId,
    created: u64,
    status: RoundStatus,
    candidate_count: u64,
    budget: Amount,
    /// Voter -> the candidate they staked on.
    voters: BTreeMap<Address, Address>,
    /// Candidate -> cumulative stake received.
    stakes: BTreeMap<Address, Amount>,
}

impl VotingRound {
    pub(crate) fn new(id: VotingId, created: u64) -> Self {
        Self {
            id,
            created,
            status: RoundStatus::Open,
            candidate_count: 0,
            budget: 0,
            voters: BTreeMap::new(),
            stakes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> VotingId {
        self.id
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_closed()
    }

    pub fn candidates(&self) -> u64 {
        self.candidate_count
    }

    pub fn budget(&self) -> Amount {
        self.budget
    }

    pub fn stake_of(&self, candidate: &Address) -> Amount {
        self.stakes.get(candidate).copied().unwrap_or(0)
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains_key(voter)
    }

    /// The candidate `voter` staked on, if they voted.
    pub fn vote_of(&self, voter: &Address) -> Option<&Address> {
        self.voters.get(voter)
    }

    pub fn voters(&self) -> impl Iterator<Item = (&Address, &Address)> {
        self.voters.iter()
    }

    pub fn stakes(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.stakes.iter().map(|(candidate, amount)| (candidate, *amount))
    }

    /// Candidate holding the largest stake. Ties go to the smaller address.
    pub fn leader(&self) -> Option<(&Address, Amount)> {
        self.stakes()
            .filter(|(_, amount)| *amount > 0)
            .fold(None, |best, (candidate, amount)| match best {
                Some((_, top)) if top >= amount => best,
                _ => Some((candidate, amount)),
            })
    }

    /// Earliest timestamp at which the voting may be closed.
    pub fn matures_at(&self) -> u64 {
        self.created.saturating_add(MATURATION_PERIOD_SECS)
    }

    /// Seconds elapsed since creation; an instant before creation counts as zero.
    pub fn age_at(&self, now: u64) -> u64 {
        now.saturating_sub(self.created)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            id: self.id.0,
            created: self.created,
            completed: self.is_completed(),
            candidates: self.candidate_count,
            budget: self.budget,
        }
    }

    /// Books a stake. Guards on status, value, candidate and duplicates are the
    /// ledger's job; this only refuses arithmetic overflow, before touching anything.
    ///
    /// Returns `true` when `candidate` received its first stake.
    pub(crate) fn record_stake(&mut self, voter: Address, candidate: Address, amount: Amount) -> Result<bool> {
        let prior = self.stake_of(&candidate);
        let new_stake = prior
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("stake of {} in voting {}", candidate, self.id)))?;
        let new_budget = self
            .budget
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("budget of voting {}", self.id)))?;

        let first_stake = prior == 0;
        if first_stake {
            self.candidate_count += 1;
        }
        self.stakes.insert(candidate.clone(), new_stake);
        self.budget = new_budget;
        self.voters.insert(voter, candidate);
        Ok(first_stake)
    }

    pub(crate) fn close(&mut self, closed_at: u64, commission: Amount) {
        self.status = RoundStatus::Closed { closed_at, commission };
    }

    /// Checks the bookkeeping of this voting against itself.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        let corrupted = |msg: String| Err(LedgerError::Corrupted(format!("voting {}: {}", self.id, msg)));

        let total = self
            .stakes
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v));
        if total != Some(self.budget) {
            return corrupted(format!("budget {} does not match the sum of stakes", self.budget));
        }

        let nonzero = self.stakes.values().filter(|v| **v > 0).count() as u64;
        if nonzero != self.candidate_count {
            return corrupted(format!(
                "candidate count {} but {} candidates hold stake",
                self.candidate_count, nonzero
            ));
        }

        for (voter, candidate) in &self.voters {
            if voter == candidate {
                return corrupted(format!("{} voted for themselves", voter));
            }
            if self.stake_of(candidate) == 0 {
                return corrupted(format!("{} voted for {} who holds no stake", voter, candidate));
            }
        }

        if self.stakes.len() > self.voters.len() {
            return corrupted("more staked candidates than voters".to_string());
        }

        Ok(())
    }
}
