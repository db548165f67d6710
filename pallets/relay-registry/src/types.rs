use crate::pallet::{Config, Error};
use alloc::vec::Vec;
use frame::prelude::*;
use relay_primitives::RegistryConfig;

/// A registered unit of delegatable work.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct Relay<AccountId, Balance, BlockNumber> {
  /// Account the relay target executor dispatches to
  pub target: AccountId,
  /// Compute handed to the execute hook on every commit
  pub compute_budget: u64,
  /// Funds available to pay relayers
  pub balance: Balance,
  /// Relayer of the most recent commit
  pub last_executor: Option<AccountId>,
  /// Block at which the relay stops being executable; `None` while never canceled
  pub valid_until: Option<BlockNumber>,
  /// Client owning cancellation and withdrawal rights
  pub admin: AccountId,
  /// Total paid out to relayers
  pub amount_spent: Balance,
}

impl<AccountId, Balance, BlockNumber: PartialOrd> Relay<AccountId, Balance, BlockNumber> {
  pub fn is_canceled(&self) -> bool {
    self.valid_until.is_some()
  }

  /// Executable at block `now`.
  pub fn is_active_at(&self, now: &BlockNumber) -> bool {
    match &self.valid_until {
      None => true,
      Some(deadline) => deadline > now,
    }
  }

  /// Past the deadline, so funds may be withdrawn.
  pub fn is_expired_at(&self, now: &BlockNumber) -> bool {
    matches!(&self.valid_until, Some(deadline) if deadline <= now)
  }
}

/// Roster entry of a relayer.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct RelayerInfo<AccountId, Balance> {
  /// Account entitled to withdraw the accrued balance
  pub payee: AccountId,
  /// Set only by a roster replace
  pub active: bool,
  /// Earned and not yet withdrawn
  pub balance: Balance,
}

/// Pricing inputs resolved for one check or commit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PaymentParams<Balance> {
  pub compute_limit: u64,
  pub adjusted_price: u128,
  pub exchange_rate: u128,
  /// Payment if the whole compute limit is consumed
  pub max_payment: Balance,
}

/// Result of a successful eligibility simulation.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct CheckOutcome<Balance> {
  /// Payload the relayer should commit with
  pub perform_payload: Vec<u8>,
  pub max_payment: Balance,
  pub compute_limit: u64,
  pub adjusted_price: u128,
  pub exchange_rate: u128,
}

/// Why an eligibility simulation failed.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub enum CheckRelayError {
  /// Rejected by the registry
  Registry(DispatchError),
  /// The target's eligibility hook aborted with this reason
  TargetCheckReverted(DispatchError),
}

impl From<DispatchError> for CheckRelayError {
  fn from(error: DispatchError) -> Self {
    Self::Registry(error)
  }
}

impl<T: Config> From<Error<T>> for CheckRelayError {
  fn from(error: Error<T>) -> Self {
    Self::Registry(error.into())
  }
}

/// Aggregate registry state for off-chain readers.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct RegistrySnapshot<AccountId, Balance> {
  pub nonce: u64,
  pub owner_balance: Balance,
  pub expected_balance: Balance,
  pub num_relays: u32,
  pub paused: bool,
  pub config: RegistryConfig<AccountId, Balance>,
  pub relayers: Vec<AccountId>,
}
