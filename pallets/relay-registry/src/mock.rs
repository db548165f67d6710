use crate as pallet_relay_registry;
use crate::{ComputeMeter, FeedReading, PriceFeed, RelayTarget, SettlementLedger};
use codec::{Decode, DecodeWithMemTracking, Encode};
use core::cell::RefCell;
use core::time::Duration;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, ord_parameter_types, parameter_types,
  storage::unhashed,
  traits::{
    ConstU32, ConstU64, ConstU128, Get, UnixTime,
    fungible::{Inspect, Mutate},
    tokens::Preservation,
  },
};
use polkadot_sdk::frame_system::{self, EnsureSignedBy};
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult, Perbill,
  testing::H256,
  traits::{BlakeTwo256, IdentifyAccount, IdentityLookup, Lazy, Verify},
};
use relay_primitives::{
  CallMode, RegistryConfig, RelayRequest, pallet_ids::RELAY_REGISTRY_PALLET_ID, params,
};
use scale_info::TypeInfo;

type Block = frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;
pub type Balance = u128;

pub const OWNER: AccountId = 1;
pub const REGISTRAR: AccountId = 2;
pub const ADMIN: AccountId = 3;
pub const FUNDER: AccountId = 4;
pub const RELAYER_ONE: AccountId = 10;
pub const RELAYER_TWO: AccountId = 11;
pub const RELAYER_THREE: AccountId = 12;
pub const PAYEE_ONE: AccountId = 20;
pub const PAYEE_TWO: AccountId = 21;
pub const PAYEE_THREE: AccountId = 22;
pub const CLIENT: AccountId = 30;
pub const LEDGER: AccountId = 99;
pub const TARGET: AccountId = 100;
pub const NOT_A_TARGET: AccountId = 101;

pub const UNIT: Balance = params::UNIT;
pub const INITIAL_BALANCE: Balance = 1_000_000 * UNIT;

pub const NOW_SECS: u64 = 1_700_000_000;
pub const COMPUTE_PRICE: u128 = 1_000_000_000;
pub const EXCHANGE_RATE: u128 = 1_000_000_000_000_000_000;
pub const FALLBACK_COMPUTE_PRICE: u128 = 5_000_000_000;
pub const FALLBACK_EXCHANGE_RATE: u128 = 2_000_000_000_000_000_000;
pub const STALENESS_SECONDS: u64 = 3_600;
pub const MAX_PERFORM_COMPUTE: u64 = 500_000;
pub const DEFAULT_CHECK_COST: u64 = 10_000;
pub const DEFAULT_PERFORM_COST: u64 = 40_000;

/// Storage key the mock target writes to, used to observe rollbacks
pub const TARGET_MARKER: &[u8] = b":mock_relay_target:marker";

construct_runtime!(
  pub enum Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    RelayRegistry: pallet_relay_registry,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

thread_local! {
  static COMPUTE_PRICE_READING: RefCell<FeedReading> =
    RefCell::new(FeedReading { value: COMPUTE_PRICE as i128, updated_at: NOW_SECS });
  static EXCHANGE_RATE_READING: RefCell<FeedReading> =
    RefCell::new(FeedReading { value: EXCHANGE_RATE as i128, updated_at: NOW_SECS });
  static NOW: RefCell<u64> = const { RefCell::new(NOW_SECS) };
  static CALLER_PRICE: RefCell<u128> = const { RefCell::new(COMPUTE_PRICE) };

  static CHECK_NEEDED: RefCell<bool> = const { RefCell::new(true) };
  static CHECK_REVERT: RefCell<Option<DispatchError>> = const { RefCell::new(None) };
  static CHECK_COST: RefCell<u64> = const { RefCell::new(DEFAULT_CHECK_COST) };
  static PERFORM_PAYLOAD: RefCell<Vec<u8>> = RefCell::new(b"perform".to_vec());
  static PERFORM_COST: RefCell<u64> = const { RefCell::new(DEFAULT_PERFORM_COST) };
  static PERFORM_FAILS: RefCell<bool> = const { RefCell::new(false) };
  static PERFORM_REENTERS: RefCell<Option<Reentry>> = const { RefCell::new(None) };
  static COMPUTE_SEEN: RefCell<Option<u64>> = const { RefCell::new(None) };
  static REENTRY_RESULT: RefCell<Option<DispatchResult>> = const { RefCell::new(None) };
  static PERFORM_CALLS: RefCell<u32> = const { RefCell::new(0) };
}

pub fn reset_mock_adapters() {
  set_compute_price_reading(COMPUTE_PRICE as i128, NOW_SECS);
  set_exchange_rate_reading(EXCHANGE_RATE as i128, NOW_SECS);
  set_now(NOW_SECS);
  set_caller_price(COMPUTE_PRICE);
  set_check_needed(true);
  set_check_revert(None);
  CHECK_COST.with(|c| *c.borrow_mut() = DEFAULT_CHECK_COST);
  set_perform_payload(b"perform".to_vec());
  set_perform_cost(DEFAULT_PERFORM_COST);
  set_perform_fails(false);
  set_perform_reenters(None);
  COMPUTE_SEEN.with(|c| *c.borrow_mut() = None);
  REENTRY_RESULT.with(|r| *r.borrow_mut() = None);
  PERFORM_CALLS.with(|c| *c.borrow_mut() = 0);
}

pub fn set_compute_price_reading(value: i128, updated_at: u64) {
  COMPUTE_PRICE_READING.with(|f| *f.borrow_mut() = FeedReading { value, updated_at });
}

pub fn set_exchange_rate_reading(value: i128, updated_at: u64) {
  EXCHANGE_RATE_READING.with(|f| *f.borrow_mut() = FeedReading { value, updated_at });
}

pub fn set_now(secs: u64) {
  NOW.with(|n| *n.borrow_mut() = secs);
}

pub fn set_caller_price(price: u128) {
  CALLER_PRICE.with(|p| *p.borrow_mut() = price);
}

pub fn set_check_needed(needed: bool) {
  CHECK_NEEDED.with(|c| *c.borrow_mut() = needed);
}

pub fn set_check_revert(error: Option<DispatchError>) {
  CHECK_REVERT.with(|c| *c.borrow_mut() = error);
}

pub fn set_perform_payload(payload: Vec<u8>) {
  PERFORM_PAYLOAD.with(|p| *p.borrow_mut() = payload);
}

pub fn set_perform_cost(units: u64) {
  PERFORM_COST.with(|c| *c.borrow_mut() = units);
}

pub fn set_perform_fails(fails: bool) {
  PERFORM_FAILS.with(|f| *f.borrow_mut() = fails);
}

/// Registry call the mock target makes from inside its execute hook.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reentry {
  /// `withdraw_payment` for `RELAYER_ONE` as `PAYEE_ONE`
  WithdrawPayment,
  /// `perform_relay` of the given relay as `RELAYER_TWO`, with the client's next nonce
  PerformRelay(H256),
}

pub fn set_perform_reenters(reentry: Option<Reentry>) {
  PERFORM_REENTERS.with(|r| *r.borrow_mut() = reentry);
}

/// Compute the last execute hook had available when it started.
pub fn compute_seen_by_target() -> Option<u64> {
  COMPUTE_SEEN.with(|c| *c.borrow())
}

pub fn reentry_result() -> Option<DispatchResult> {
  REENTRY_RESULT.with(|r| r.borrow().clone())
}

pub fn perform_calls() -> u32 {
  PERFORM_CALLS.with(|c| *c.borrow())
}

pub fn target_marker() -> Option<Vec<u8>> {
  unhashed::get::<Vec<u8>>(TARGET_MARKER)
}

pub struct BalancesLedger;
impl SettlementLedger<AccountId, Balance> for BalancesLedger {
  fn transfer(from: &AccountId, to: &AccountId, amount: Balance) -> DispatchResult {
    <Balances as Mutate<AccountId>>::transfer(from, to, amount, Preservation::Expendable)
      .map(|_| ())
  }

  fn balance_of(who: &AccountId) -> Balance {
    <Balances as Inspect<AccountId>>::balance(who)
  }

  fn total_supply() -> Balance {
    <Balances as Inspect<AccountId>>::total_issuance()
  }
}

pub struct MockComputePriceFeed;
impl PriceFeed for MockComputePriceFeed {
  fn latest_value() -> FeedReading {
    COMPUTE_PRICE_READING.with(|f| *f.borrow())
  }
}

pub struct MockExchangeRateFeed;
impl PriceFeed for MockExchangeRateFeed {
  fn latest_value() -> FeedReading {
    EXCHANGE_RATE_READING.with(|f| *f.borrow())
  }
}

pub struct MockTime;
impl UnixTime for MockTime {
  fn now() -> Duration {
    Duration::from_secs(NOW.with(|n| *n.borrow()))
  }
}

pub struct MockCallerPrice;
impl Get<u128> for MockCallerPrice {
  fn get() -> u128 {
    CALLER_PRICE.with(|p| *p.borrow())
  }
}

/// Signature that "recovers" to whoever it names, valid only for the exact digest it carries.
#[derive(Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo)]
pub struct MockSignature {
  pub signer: AccountId,
  pub digest: [u8; 32],
}

#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct MockSigner(pub AccountId);

impl IdentifyAccount for MockSigner {
  type AccountId = AccountId;
  fn into_account(self) -> AccountId {
    self.0
  }
}

impl Verify for MockSignature {
  type Signer = MockSigner;
  fn verify<L: Lazy<[u8]>>(&self, mut msg: L, signer: &AccountId) -> bool {
    self.signer == *signer && msg.get() == &self.digest[..]
  }
}

/// Client target: charges its configured cost, leaves a marker in storage, and can be told
/// to decline, revert, fail, or call back into the registry.
pub struct MockTargets;
impl RelayTarget<AccountId, MockSignature> for MockTargets {
  fn is_executable(target: &AccountId) -> bool {
    *target == TARGET
  }

  fn check_relay(
    _target: &AccountId,
    _request: &RelayRequest<AccountId>,
    check_payload: &[u8],
    _signature: &MockSignature,
    mode: CallMode,
    meter: &mut ComputeMeter,
  ) -> Result<(bool, Vec<u8>), DispatchError> {
    if mode != CallMode::DryRun {
      return Err(DispatchError::Other("check is dry-run only"));
    }
    meter.charge(CHECK_COST.with(|c| *c.borrow()))?;
    unhashed::put(TARGET_MARKER, &check_payload.to_vec());
    if let Some(error) = CHECK_REVERT.with(|c| c.borrow().clone()) {
      return Err(error);
    }
    Ok((
      CHECK_NEEDED.with(|c| *c.borrow()),
      PERFORM_PAYLOAD.with(|p| p.borrow().clone()),
    ))
  }

  fn perform_relay(
    _target: &AccountId,
    request: &RelayRequest<AccountId>,
    perform_payload: &[u8],
    meter: &mut ComputeMeter,
  ) -> DispatchResult {
    PERFORM_CALLS.with(|c| *c.borrow_mut() += 1);
    COMPUTE_SEEN.with(|c| *c.borrow_mut() = Some(meter.remaining()));
    meter.charge(PERFORM_COST.with(|c| *c.borrow()))?;
    unhashed::put(TARGET_MARKER, &perform_payload.to_vec());
    if let Some(reentry) = PERFORM_REENTERS.with(|r| *r.borrow()) {
      let result = match reentry {
        Reentry::WithdrawPayment => RelayRegistry::withdraw_payment(
          RuntimeOrigin::signed(PAYEE_ONE),
          RELAYER_ONE,
          PAYEE_ONE,
        ),
        Reentry::PerformRelay(id) => {
          let next = RelayRequest {
            nonce: request.nonce.saturating_add(1),
            ..request.clone()
          };
          let signature = MockSignature {
            signer: next.from,
            digest: RelayRegistry::request_digest(&next),
          };
          RelayRegistry::perform_relay(
            RuntimeOrigin::signed(RELAYER_TWO),
            id,
            next,
            signature,
            perform_payload.to_vec(),
            MAX_PERFORM_COMPUTE,
          )
          .map(|_| ())
          .map_err(|error| error.error)
        }
      };
      REENTRY_RESULT.with(|r| *r.borrow_mut() = Some(result));
      result?;
    }
    if PERFORM_FAILS.with(|f| *f.borrow()) {
      return Err(DispatchError::Other("target reverted"));
    }
    Ok(())
  }
}

parameter_types! {
  pub const RegistryPalletId: PalletId = PalletId(*RELAY_REGISTRY_PALLET_ID);
}

ord_parameter_types! {
  pub const LedgerAccount: AccountId = LEDGER;
}

impl pallet_relay_registry::Config for Test {
  type Balance = Balance;
  type Ledger = BalancesLedger;
  type LedgerOrigin = EnsureSignedBy<LedgerAccount, AccountId>;
  type ComputePriceFeed = MockComputePriceFeed;
  type ExchangeRateFeed = MockExchangeRateFeed;
  type UnixTime = MockTime;
  type CallerComputePrice = MockCallerPrice;
  type Targets = MockTargets;
  type OffchainSignature = MockSignature;
  type OffchainPublic = MockSigner;
  type PalletId = RegistryPalletId;
  type MinPerformCompute = ConstU64<{ params::MIN_PERFORM_COMPUTE }>;
  type CancellationDelay = ConstU64<{ params::CANCELLATION_DELAY as u64 }>;
  type PerformComputeCushion = ConstU64<{ params::PERFORM_COMPUTE_CUSHION }>;
  type RegistryComputeOverhead = ConstU64<{ params::REGISTRY_COMPUTE_OVERHEAD }>;
  type MaxRelayers = ConstU32<8>;
  type MaxActiveRelays = ConstU32<16>;
  type MaxCheckPayloadLen = ConstU32<64>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, Balance, MockSignature> for MockBenchmarkHelper {
  fn executable_target() -> AccountId {
    TARGET
  }

  fn fund_account(who: &AccountId, amount: Balance) {
    let _ = <Balances as Mutate<AccountId>>::mint_into(who, amount);
  }

  fn sign_request(signer: &AccountId, digest: &[u8; 32]) -> MockSignature {
    MockSignature {
      signer: *signer,
      digest: *digest,
    }
  }
}

pub fn test_config() -> RegistryConfig<AccountId, Balance> {
  RegistryConfig {
    payment_premium: Perbill::from_percent(25),
    flat_fee_micro: 10_000,
    block_count_per_turn: 20,
    check_compute_limit: 1_000_000,
    staleness_seconds: STALENESS_SECONDS,
    price_ceiling_multiplier: 2,
    min_relay_spend: 0,
    max_perform_compute: MAX_PERFORM_COMPUTE,
    fallback_compute_price: FALLBACK_COMPUTE_PRICE,
    fallback_exchange_rate: FALLBACK_EXCHANGE_RATE,
    registrar: Some(REGISTRAR),
  }
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (OWNER, INITIAL_BALANCE),
      (ADMIN, INITIAL_BALANCE),
      (FUNDER, INITIAL_BALANCE),
      (CLIENT, INITIAL_BALANCE),
      (LEDGER, INITIAL_BALANCE),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_relay_registry::GenesisConfig::<Test> {
    owner: Some(OWNER),
    config: test_config(),
    relayers: vec![],
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    reset_mock_adapters();
    System::set_block_number(1);
  });
  ext
}
