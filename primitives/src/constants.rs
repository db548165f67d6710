//! Relay Registry Constants
//!
//! Pallet identifiers, signing-domain tags, and the default economic parameters of the
//! registry. Runtimes pick these up through their `parameter_types!` so every configuration
//! starts from the same numbers.

/// Balance type alias for the settlement token
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// The relay registry holds all relay and relayer funds under the account derived from
/// this id via `PalletId::into_account_truncating()`.
pub mod pallet_ids {
  /// Relay registry custody account
  pub const RELAY_REGISTRY_PALLET_ID: &[u8; 8] = b"relayreg";
}

/// Tags mixed into the structured digest a client signs over a relay request.
pub mod domain {
  /// Human-readable name of the signing domain
  pub const DOMAIN_NAME: &[u8] = b"RelayRegistry";

  /// Version of the signing domain; bump when the request layout changes
  pub const DOMAIN_VERSION: &[u8] = b"1";

  /// Type tag of the domain separator
  pub const DOMAIN_TYPE_TAG: &[u8] = b"RelayDomain(name,version,genesis,registry)";

  /// Type tag of a relay request
  pub const REQUEST_TYPE_TAG: &[u8] = b"RelayRequest(from,to,nonce,data)";

  /// Prefix of the final digest, shared with the common structured-data convention
  pub const DIGEST_PREFIX: &[u8; 2] = b"\x19\x01";
}

/// Registry parameters.
///
/// Compute units are abstract metering units charged by relay targets. Prices are quoted in
/// base units of the native fee asset per compute unit; exchange rates in base units of
/// the native fee asset per whole settlement token.
pub mod params {
  use super::Balance;
  use sp_arithmetic::Perbill;

  /// Smallest compute budget a relay may be registered with.
  pub const MIN_PERFORM_COMPUTE: u64 = 2_300;

  /// Blocks a relay stays executable after its admin cancels it.
  pub const CANCELLATION_DELAY: u32 = 50;

  /// Compute a commit must bring on top of the relay budget before the target is dispatched.
  ///
  /// Keeps relayers from being griefed by targets that run right up to the limit.
  pub const PERFORM_COMPUTE_CUSHION: u64 = 5_000;

  /// Compute billed on every commit for the registry's own bookkeeping.
  pub const REGISTRY_COMPUTE_OVERHEAD: u64 = 80_000;

  /// Parts-per-billion base used by the fee engine.
  pub const PPB_BASE: u128 = 1_000_000_000;

  /// Scale from a millionth of a whole settlement token to base units (10^12).
  pub const FLAT_FEE_SCALE: u128 = 1_000_000_000_000;

  /// Base units per whole settlement token (10^18).
  pub const UNIT: Balance = 1_000_000_000_000_000_000;

  /// Default premium charged over raw compute cost (25%).
  pub const DEFAULT_PAYMENT_PREMIUM: Perbill = Perbill::from_percent(25);

  /// Default flat fee per commit, in millionths of a token (0.01 token).
  pub const DEFAULT_FLAT_FEE_MICRO: u32 = 10_000;

  /// Default informational turn length, in blocks.
  pub const DEFAULT_BLOCK_COUNT_PER_TURN: u32 = 20;

  /// Default compute limit for eligibility checks.
  pub const DEFAULT_CHECK_COMPUTE_LIMIT: u64 = 2_500_000;

  /// Default feed staleness window, in seconds (~12 hours).
  pub const DEFAULT_STALENESS_SECONDS: u64 = 43_200;

  /// Default multiplier applied to the feed price to form the price ceiling.
  pub const DEFAULT_PRICE_CEILING_MULTIPLIER: u16 = 2;

  /// Default largest compute budget a relay may request.
  pub const DEFAULT_MAX_PERFORM_COMPUTE: u64 = 5_000_000;

  /// Default compute price used while the price feed is stale (200 * 10^9).
  pub const DEFAULT_FALLBACK_COMPUTE_PRICE: u128 = 200_000_000_000;

  /// Default exchange rate used while the rate feed is stale (0.02 * 10^18).
  pub const DEFAULT_FALLBACK_EXCHANGE_RATE: u128 = 20_000_000_000_000_000;
}
