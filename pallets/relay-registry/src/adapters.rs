//! Adapter traits for the relay registry
//!
//! The registry never touches balances, oracles or client code directly. Runtimes wire in a
//! settlement ledger, two price feeds and a relay target executor through these traits.

use alloc::vec::Vec;
use frame::prelude::*;
use relay_primitives::{CallMode, RelayRequest};

/// Fungible store holding the settlement token.
///
/// The registry keeps every relay and relayer balance in a single custody account and only
/// asks the ledger to move funds in or out of it.
pub trait SettlementLedger<AccountId, Balance> {
  fn transfer(from: &AccountId, to: &AccountId, amount: Balance) -> DispatchResult;

  fn balance_of(who: &AccountId) -> Balance;

  /// Upper bound on any single payment.
  fn total_supply() -> Balance;
}

/// Last value reported by a price feed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FeedReading {
  /// Reported value; non-positive readings are treated as unusable
  pub value: i128,
  /// Unix time, in seconds, of the last update
  pub updated_at: u64,
}

/// Oracle reporting a single value.
pub trait PriceFeed {
  fn latest_value() -> FeedReading;
}

/// Metered compute handed to a relay target.
///
/// Targets charge the meter for the work they do. A charge that would cross the limit pins
/// consumption at the limit and fails with [`DispatchError::Exhausted`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ComputeMeter {
  limit: u64,
  consumed: u64,
}

impl ComputeMeter {
  pub fn new(limit: u64) -> Self {
    Self { limit, consumed: 0 }
  }

  pub fn charge(&mut self, units: u64) -> DispatchResult {
    let next = self.consumed.saturating_add(units);
    if next > self.limit {
      self.consumed = self.limit;
      return Err(DispatchError::Exhausted);
    }
    self.consumed = next;
    Ok(())
  }

  pub fn consumed(&self) -> u64 {
    self.consumed
  }

  pub fn remaining(&self) -> u64 {
    self.limit.saturating_sub(self.consumed)
  }
}

/// Client-side capability set a relay points at.
///
/// `perform_relay` runs with the registry's authority but the registry does not guarantee it
/// is the only caller, so implementations must validate `request` themselves.
pub trait RelayTarget<AccountId, Signature> {
  /// Whether `target` can be dispatched to at all.
  fn is_executable(target: &AccountId) -> bool;

  /// Eligibility hook. Returns whether work is needed and the payload to perform it with.
  ///
  /// Targets should refuse anything but [`CallMode::DryRun`].
  fn check_relay(
    target: &AccountId,
    request: &RelayRequest<AccountId>,
    check_payload: &[u8],
    signature: &Signature,
    mode: CallMode,
    meter: &mut ComputeMeter,
  ) -> Result<(bool, Vec<u8>), DispatchError>;

  /// Execute hook.
  fn perform_relay(
    target: &AccountId,
    request: &RelayRequest<AccountId>,
    perform_payload: &[u8],
    meter: &mut ComputeMeter,
  ) -> DispatchResult;
}

/// No targets: nothing is executable.
impl<AccountId, Signature> RelayTarget<AccountId, Signature> for () {
  fn is_executable(_: &AccountId) -> bool {
    false
  }

  fn check_relay(
    _: &AccountId,
    _: &RelayRequest<AccountId>,
    _: &[u8],
    _: &Signature,
    _: CallMode,
    _: &mut ComputeMeter,
  ) -> Result<(bool, Vec<u8>), DispatchError> {
    Err(DispatchError::Unavailable)
  }

  fn perform_relay(
    _: &AccountId,
    _: &RelayRequest<AccountId>,
    _: &[u8],
    _: &mut ComputeMeter,
  ) -> DispatchResult {
    Err(DispatchError::Unavailable)
  }
}
