use crate::params;
use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};
use sp_arithmetic::Perbill;

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

/// Signed client request that authorizes a relayer to act on the client's behalf.
///
/// The client signs the structured digest of these fields. `nonce` must equal the
/// registry's stored nonce for `from`, so a request can be committed at most once.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct RelayRequest<AccountId> {
  /// Client that signed the request
  pub from: AccountId,
  /// Account the request is addressed to
  pub to: AccountId,
  /// Replay counter of `from`
  pub nonce: u64,
  /// Opaque call data interpreted by the relay target
  pub data: Vec<u8>,
}

/// How an eligibility check is being invoked.
///
/// Checks are only answered in `DryRun` mode, which the caller uses to promise the call
/// is a simulation whose effects are discarded.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum CallMode {
  /// Simulation; state changes are rolled back
  DryRun,
  /// On-chain execution
  Commit,
}

/// Payee entry of a relayer roster update.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo,
)]
pub enum PayeeUpdate<AccountId> {
  /// Set the payee; must match the relayer's existing payee if it has one
  Set(AccountId),
  /// Leave the relayer's existing payee untouched
  Keep,
}

/// Runtime-adjustable registry configuration.
#[derive(
  Clone,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub struct RegistryConfig<AccountId, Balance> {
  /// Premium charged on top of raw compute cost
  pub payment_premium: Perbill,
  /// Flat fee per commit, in millionths of a whole settlement token
  pub flat_fee_micro: u32,
  /// Blocks per relayer turn; informational, not enforced
  pub block_count_per_turn: u32,
  /// Compute limit for eligibility checks
  pub check_compute_limit: u64,
  /// Maximum feed age in seconds before falling back; zero disables the check
  pub staleness_seconds: u64,
  /// Multiplier applied to the feed price to form the price ceiling
  pub price_ceiling_multiplier: u16,
  /// Spend a relay must reach before withdrawing without a cancellation fee
  pub min_relay_spend: Balance,
  /// Largest compute budget a relay may be given
  pub max_perform_compute: u64,
  /// Compute price used when the price feed is stale or non-positive
  pub fallback_compute_price: u128,
  /// Exchange rate used when the rate feed is stale or non-positive
  pub fallback_exchange_rate: u128,
  /// Delegated registration authority
  pub registrar: Option<AccountId>,
}

impl<AccountId, Balance: Default> Default for RegistryConfig<AccountId, Balance> {
  fn default() -> Self {
    Self {
      payment_premium: params::DEFAULT_PAYMENT_PREMIUM,
      flat_fee_micro: params::DEFAULT_FLAT_FEE_MICRO,
      block_count_per_turn: params::DEFAULT_BLOCK_COUNT_PER_TURN,
      check_compute_limit: params::DEFAULT_CHECK_COMPUTE_LIMIT,
      staleness_seconds: params::DEFAULT_STALENESS_SECONDS,
      price_ceiling_multiplier: params::DEFAULT_PRICE_CEILING_MULTIPLIER,
      min_relay_spend: Balance::default(),
      max_perform_compute: params::DEFAULT_MAX_PERFORM_COMPUTE,
      fallback_compute_price: params::DEFAULT_FALLBACK_COMPUTE_PRICE,
      fallback_exchange_rate: params::DEFAULT_FALLBACK_EXCHANGE_RATE,
      registrar: None,
    }
  }
}
