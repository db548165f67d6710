//! Relay Registry Pallet
//!
//! Coordinates delegated, conditional execution of signed client requests ("relays") by a
//! permissioned pool of relayers. Clients register and fund relays; relayers simulate a
//! relay's eligibility off-chain through [`Pallet::check_relay`] and, when work is needed,
//! commit it through [`Pallet::perform_relay`]. The commit dispatches to the relay target
//! under a metered compute budget and pays the relayer out of the relay's balance for the
//! compute actually consumed.
//!
//! All funds sit in the pallet's custody account. The registry tracks how much of that
//! custody it owes to relays, relayers and the owner, and keeps
//! `ExpectedBalance == Σ relay balances + Σ relayer balances + OwnerBalance`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{ComputeMeter, FeedReading, PriceFeed, RelayTarget, SettlementLedger};

pub mod types;
pub use types::*;

mod dispatch;
mod fees;
mod verify;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

/// Log target of this pallet
pub const LOG_TARGET: &str = "runtime::relay-registry";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, Balance, Signature> {
  /// A target the runtime's relay target executor accepts and performs successfully.
  fn executable_target() -> AccountId;

  /// Give `who` `amount` of the settlement token.
  fn fund_account(who: &AccountId, amount: Balance);

  /// Sign a request digest on behalf of `signer`.
  fn sign_request(signer: &AccountId, digest: &[u8; 32]) -> Signature;
}

#[frame::pallet]
pub mod pallet {
  use crate::{
    adapters::{PriceFeed, RelayTarget, SettlementLedger},
    types::{Relay, RelayerInfo},
    weights::WeightInfo,
    LOG_TARGET,
  };
  use alloc::vec::Vec;
  use codec::DecodeAll;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{
      PalletId,
      storage::with_storage_layer,
      traits::{EnsureOrigin, UnixTime},
    },
    sp_runtime::{
      ArithmeticError,
      traits::{
        AccountIdConversion, AtLeast32BitUnsigned, CheckedAdd, Hash as _, IdentifyAccount,
        Saturating, Verify, Zero,
      },
    },
  };
  use relay_primitives::{PayeeUpdate, RegistryConfig, RelayRequest};

  pub type BalanceOf<T> = <T as Config>::Balance;
  pub type RelayId<T> = <T as frame_system::Config>::Hash;
  pub type RelayOf<T> =
    Relay<<T as frame_system::Config>::AccountId, BalanceOf<T>, BlockNumberFor<T>>;
  pub type RelayerInfoOf<T> = RelayerInfo<<T as frame_system::Config>::AccountId, BalanceOf<T>>;
  pub type RegistryConfigOf<T> =
    RegistryConfig<<T as frame_system::Config>::AccountId, BalanceOf<T>>;
  pub type RelayRequestOf<T> = RelayRequest<<T as frame_system::Config>::AccountId>;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Settlement token balance
    type Balance: Parameter
      + Member
      + AtLeast32BitUnsigned
      + Default
      + Copy
      + MaybeSerializeDeserialize
      + MaxEncodedLen;

    /// Ledger holding the settlement token
    type Ledger: SettlementLedger<Self::AccountId, Self::Balance>;

    /// Origin of the ledger's push-transfer callback
    type LedgerOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Feed of the price per compute unit
    type ComputePriceFeed: PriceFeed;

    /// Feed of the settlement token's exchange rate against the fee asset
    type ExchangeRateFeed: PriceFeed;

    /// Wall clock used to judge feed staleness
    type UnixTime: UnixTime;

    /// Price per compute unit the submitting relayer pays for the current extrinsic
    type CallerComputePrice: Get<u128>;

    /// Executor of relay target hooks
    type Targets: RelayTarget<Self::AccountId, Self::OffchainSignature>;

    /// Signature a client puts on a relay request
    type OffchainSignature: Verify<Signer = Self::OffchainPublic> + Parameter;

    /// Public key recovered from an [`Config::OffchainSignature`]
    type OffchainPublic: IdentifyAccount<AccountId = Self::AccountId>;

    /// Pallet id of the custody account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Smallest compute budget a relay may have
    #[pallet::constant]
    type MinPerformCompute: Get<u64>;

    /// Blocks a relay stays executable after its admin cancels it
    #[pallet::constant]
    type CancellationDelay: Get<BlockNumberFor<Self>>;

    /// Compute a commit must bring on top of the relay budget
    #[pallet::constant]
    type PerformComputeCushion: Get<u64>;

    /// Compute billed on every commit for registry bookkeeping
    #[pallet::constant]
    type RegistryComputeOverhead: Get<u64>;

    #[pallet::constant]
    type MaxRelayers: Get<u32>;

    #[pallet::constant]
    type MaxActiveRelays: Get<u32>;

    #[pallet::constant]
    type MaxCheckPayloadLen: Get<u32>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<
        Self::AccountId,
        Self::Balance,
        Self::OffchainSignature,
      >;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn owner)]
  pub type Owner<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

  #[pallet::storage]
  pub type PendingOwner<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn registry_config)]
  pub type RegistryConfiguration<T: Config> = StorageValue<_, RegistryConfigOf<T>, ValueQuery>;

  /// Counter mixed into relay id derivation; never decreases
  #[pallet::storage]
  pub type IdNonce<T: Config> = StorageValue<_, u64, ValueQuery>;

  /// Cancellation fees collected for the owner
  #[pallet::storage]
  pub type OwnerBalance<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

  /// Custody funds owed to relays, relayers and the owner
  #[pallet::storage]
  pub type ExpectedBalance<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

  /// Blocks the commit path only
  #[pallet::storage]
  pub type Paused<T: Config> = StorageValue<_, bool, ValueQuery>;

  /// Held while a relay target's execute hook runs
  #[pallet::storage]
  pub type ReentrancyLock<T: Config> = StorageValue<_, bool, ValueQuery>;

  #[pallet::storage]
  pub type Relays<T: Config> = StorageMap<_, Blake2_128Concat, RelayId<T>, RelayOf<T>, OptionQuery>;

  /// Fixed payload handed to a relay's eligibility hook
  #[pallet::storage]
  pub type CheckPayloads<T: Config> =
    StorageMap<_, Blake2_128Concat, RelayId<T>, BoundedVec<u8, T::MaxCheckPayloadLen>, ValueQuery>;

  /// Relays discoverable for new work; unordered
  #[pallet::storage]
  pub type ActiveRelayIds<T: Config> =
    StorageValue<_, BoundedVec<RelayId<T>, T::MaxActiveRelays>, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn relayer_info)]
  pub type Relayers<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, RelayerInfoOf<T>, OptionQuery>;

  /// Current roster, in the order it was set
  #[pallet::storage]
  pub type RelayerList<T: Config> =
    StorageValue<_, BoundedVec<T::AccountId, T::MaxRelayers>, ValueQuery>;

  #[pallet::storage]
  pub type ProposedPayees<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, T::AccountId, OptionQuery>;

  /// Replay counter per request signer
  #[pallet::storage]
  pub type RequestNonces<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, u64, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    RelayRegistered {
      id: RelayId<T>,
      compute_budget: u64,
      admin: T::AccountId,
    },
    /// A commit went through. `success` reports the target hook's own outcome.
    RelayPerformed {
      id: RelayId<T>,
      success: bool,
      from: T::AccountId,
      payment: BalanceOf<T>,
      perform_payload: Vec<u8>,
    },
    RelayCanceled {
      id: RelayId<T>,
      at_block: BlockNumberFor<T>,
    },
    FundsAdded {
      id: RelayId<T>,
      from: T::AccountId,
      amount: BalanceOf<T>,
    },
    FundsWithdrawn {
      id: RelayId<T>,
      amount: BalanceOf<T>,
      to: T::AccountId,
    },
    OwnerFundsWithdrawn {
      amount: BalanceOf<T>,
    },
    ConfigSet {
      config: RegistryConfigOf<T>,
    },
    RelayersUpdated {
      relayers: Vec<T::AccountId>,
      payees: Vec<T::AccountId>,
    },
    PaymentWithdrawn {
      relayer: T::AccountId,
      amount: BalanceOf<T>,
      to: T::AccountId,
      payee: T::AccountId,
    },
    PayeeshipTransferRequested {
      relayer: T::AccountId,
      from: T::AccountId,
      to: T::AccountId,
    },
    PayeeshipTransferred {
      relayer: T::AccountId,
      from: T::AccountId,
      to: T::AccountId,
    },
    RelayComputeBudgetSet {
      id: RelayId<T>,
      compute_budget: u64,
    },
    Paused {
      account: T::AccountId,
    },
    Unpaused {
      account: T::AccountId,
    },
    OwnershipTransferRequested {
      from: T::AccountId,
      to: T::AccountId,
    },
    OwnershipTransferred {
      from: Option<T::AccountId>,
      to: T::AccountId,
    },
    /// Custody funds nobody was owed were swept to the owner.
    FundsRecovered {
      amount: BalanceOf<T>,
      to: T::AccountId,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    // Authorization
    /// Caller is not the registry owner.
    OnlyOwner,
    /// Caller is neither the owner nor the registrar.
    OnlyOwnerOrRegistrar,
    /// Caller is neither the owner nor the relay admin.
    OnlyOwnerOrAdmin,
    /// Caller is not the relay admin.
    OnlyAdmin,
    /// Caller is not the relayer's payee.
    OnlyPayee,
    /// Caller is not the relayer's proposed payee.
    OnlyProposedPayee,
    /// Caller is not the proposed owner.
    OnlyProposedOwner,
    /// Caller is not an active relayer.
    OnlyActiveRelayers,
    /// Eligibility checks are only answered in dry-run mode.
    OnlySimulatedBackend,
    /// The request signature does not match its origin.
    InvalidRequestSignature,
    /// The request nonce is not the origin's current nonce.
    InvalidRequestNonce,

    // Validation
    /// The target cannot be dispatched to.
    TargetNotExecutable,
    /// Compute budget is outside the allowed range.
    ComputeBudgetOutOfRange,
    /// Roster lists differ in length or hold fewer than two relayers.
    ParameterLengthError,
    /// A relayer appears twice in the roster.
    DuplicateEntry,
    /// Payee is missing or conflicts with the relayer's existing payee.
    InvalidPayee,
    /// Funds cannot be sent to that account.
    InvalidRecipient,
    /// The new value equals the current one.
    ValueNotChanged,
    /// Amount must be non-zero.
    AmountZero,
    /// Check payload exceeds `MaxCheckPayloadLen`.
    CheckPayloadTooLong,
    /// Roster exceeds `MaxRelayers`.
    TooManyRelayers,
    /// Callback data is not exactly one relay id.
    InvalidDataLength,
    /// `max_perform_compute` may not decrease.
    ComputeCeilingCanOnlyIncrease,
    /// Configuration values are out of range.
    InvalidConfig,

    // State
    RelayNotFound,
    /// Relay deadline has been reached.
    RelayNotActive,
    /// Relay has been canceled.
    RelayCanceled,
    /// Relay deadline has not been reached yet.
    RelayNotCanceled,
    /// Relay is already canceled.
    CannotCancel,
    IndexOutOfRange,
    NoActiveRelays,
    TooManyActiveRelays,
    /// Derived relay id is already taken.
    RelayIdCollision,
    RegistryPaused,
    AlreadyPaused,
    NotPaused,
    /// A relay target tried to call back into the registry.
    ReentrantCall,

    // Economic
    /// Relay balance does not cover the maximum payment.
    InsufficientFunds,
    /// Payment exceeds the settlement token's total supply.
    PaymentGreaterThanSupply,
    /// The same relayer may not commit a relay twice in a row.
    RelayersMustTakeTurns,

    // External call
    /// The target reports no work to do.
    RelayNotNeeded,
    /// Compute allowance does not cover the budget plus cushion.
    InsufficientComputeForPerform,
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    fn integrity_test() {
      assert!(T::MaxRelayers::get() >= 2, "a roster holds at least two relayers");
      assert!(T::MinPerformCompute::get() > 0, "compute budgets must be positive");
    }

    #[cfg(feature = "try-runtime")]
    fn try_state(_n: BlockNumberFor<T>) -> Result<(), polkadot_sdk::sp_runtime::TryRuntimeError> {
      Self::do_try_state()
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Register a relay. The id is announced in [`Event::RelayRegistered`].
    ///
    /// - `origin`: owner or registrar.
    /// - `target`: account the relay target executor dispatches to.
    /// - `compute_budget`: compute per commit, within `[MinPerformCompute, max_perform_compute]`.
    /// - `admin`: client holding cancellation and withdrawal rights.
    /// - `check_payload`: fixed input of the eligibility hook.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::register_relay())]
    pub fn register_relay(
      origin: OriginFor<T>,
      target: T::AccountId,
      compute_budget: u64,
      admin: T::AccountId,
      check_payload: Vec<u8>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      let config = RegistryConfiguration::<T>::get();
      ensure!(
        Self::is_owner(&who) || config.registrar.as_ref() == Some(&who),
        Error::<T>::OnlyOwnerOrRegistrar
      );
      ensure!(T::Targets::is_executable(&target), Error::<T>::TargetNotExecutable);
      Self::ensure_budget_in_range(compute_budget, &config)?;
      let check_payload: BoundedVec<u8, T::MaxCheckPayloadLen> = check_payload
        .try_into()
        .map_err(|_| Error::<T>::CheckPayloadTooLong)?;

      let nonce = IdNonce::<T>::get();
      let id = Self::derive_relay_id(nonce);
      ensure!(!Relays::<T>::contains_key(id), Error::<T>::RelayIdCollision);
      ActiveRelayIds::<T>::try_mutate(|ids| ids.try_push(id))
        .map_err(|_| Error::<T>::TooManyActiveRelays)?;
      IdNonce::<T>::put(nonce.saturating_add(1));

      Relays::<T>::insert(
        id,
        Relay {
          target,
          compute_budget,
          balance: Zero::zero(),
          last_executor: None,
          valid_until: None,
          admin: admin.clone(),
          amount_spent: Zero::zero(),
        },
      );
      CheckPayloads::<T>::insert(id, check_payload);

      Self::deposit_event(Event::RelayRegistered {
        id,
        compute_budget,
        admin,
      });
      Ok(())
    }

    /// Move `amount` from the caller into custody and credit it to relay `id`.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::add_funds())]
    pub fn add_funds(origin: OriginFor<T>, id: RelayId<T>, amount: BalanceOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      ensure!(!amount.is_zero(), Error::<T>::AmountZero);
      Self::ensure_fundable(&id)?;
      T::Ledger::transfer(&who, &Self::account_id(), amount)?;
      Self::credit_relay(&id, amount)?;
      Self::deposit_event(Event::FundsAdded {
        id,
        from: who,
        amount,
      });
      Ok(())
    }

    /// Ledger callback after a push transfer into custody.
    ///
    /// The funds have already arrived, so only the accounting is updated. `data` must be
    /// the SCALE encoding of a relay id and nothing else.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::on_token_transfer())]
    pub fn on_token_transfer(
      origin: OriginFor<T>,
      sender: T::AccountId,
      amount: BalanceOf<T>,
      data: Vec<u8>,
    ) -> DispatchResult {
      T::LedgerOrigin::ensure_origin(origin)?;
      Self::ensure_unlocked()?;
      let id = <RelayId<T> as DecodeAll>::decode_all(&mut &data[..])
        .map_err(|_| Error::<T>::InvalidDataLength)?;
      Self::ensure_fundable(&id)?;
      Self::credit_relay(&id, amount)?;
      Self::deposit_event(Event::FundsAdded {
        id,
        from: sender,
        amount,
      });
      Ok(())
    }

    /// Change the compute budget of a relay that has not been canceled. Admin only.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::set_compute_budget())]
    pub fn set_compute_budget(
      origin: OriginFor<T>,
      id: RelayId<T>,
      compute_budget: u64,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      Self::ensure_budget_in_range(compute_budget, &RegistryConfiguration::<T>::get())?;
      Relays::<T>::try_mutate(id, |maybe_relay| -> DispatchResult {
        let relay = maybe_relay.as_mut().ok_or(Error::<T>::RelayNotFound)?;
        ensure!(!relay.is_canceled(), Error::<T>::RelayCanceled);
        ensure!(relay.admin == who, Error::<T>::OnlyAdmin);
        relay.compute_budget = compute_budget;
        Ok(())
      })?;
      Self::deposit_event(Event::RelayComputeBudgetSet { id, compute_budget });
      Ok(())
    }

    /// Cancel a relay.
    ///
    /// The owner cancels effective immediately and may pull a pending admin cancellation
    /// forward. The admin cancels once, effective after `CancellationDelay` blocks. Either
    /// way the relay leaves the active set right away.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::cancel_relay())]
    pub fn cancel_relay(origin: OriginFor<T>, id: RelayId<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      let now = frame_system::Pallet::<T>::block_number();
      let is_owner = Self::is_owner(&who);
      let deadline = Relays::<T>::try_mutate(id, |maybe_relay| -> Result<_, DispatchError> {
        let relay = maybe_relay.as_mut().ok_or(Error::<T>::RelayNotFound)?;
        let tightening = is_owner && relay.valid_until.is_some_and(|deadline| deadline > now);
        ensure!(is_owner || relay.admin == who, Error::<T>::OnlyOwnerOrAdmin);
        ensure!(!relay.is_canceled() || tightening, Error::<T>::CannotCancel);
        let deadline = if is_owner {
          now
        } else {
          now.saturating_add(T::CancellationDelay::get())
        };
        relay.valid_until = Some(deadline);
        Ok(deadline)
      })?;
      Self::remove_active(&id);
      log::info!(
        target: LOG_TARGET,
        "relay {:?} canceled, executable until block {:?}",
        id,
        deadline
      );
      Self::deposit_event(Event::RelayCanceled {
        id,
        at_block: deadline,
      });
      Ok(())
    }

    /// Withdraw what is left of a canceled relay once its deadline has passed. Admin only.
    ///
    /// If the relay spent less than `min_relay_spend`, the shortfall is kept as a
    /// cancellation fee for the owner, capped at the remaining balance.
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::withdraw_funds())]
    pub fn withdraw_funds(origin: OriginFor<T>, id: RelayId<T>, to: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      ensure!(to != Self::account_id(), Error::<T>::InvalidRecipient);
      let now = frame_system::Pallet::<T>::block_number();
      let min_spend = RegistryConfiguration::<T>::get().min_relay_spend;
      let (amount, fee) = Relays::<T>::try_mutate(id, |maybe_relay| -> Result<_, DispatchError> {
        let relay = maybe_relay.as_mut().ok_or(Error::<T>::RelayNotFound)?;
        ensure!(relay.admin == who, Error::<T>::OnlyAdmin);
        ensure!(relay.is_expired_at(&now), Error::<T>::RelayNotCanceled);
        let fee = min_spend.saturating_sub(relay.amount_spent).min(relay.balance);
        let amount = relay.balance.saturating_sub(fee);
        relay.balance = Zero::zero();
        Ok((amount, fee))
      })?;
      OwnerBalance::<T>::mutate(|balance| *balance = balance.saturating_add(fee));
      ExpectedBalance::<T>::mutate(|balance| *balance = balance.saturating_sub(amount));
      Self::pay_out(&to, amount)?;
      Self::deposit_event(Event::FundsWithdrawn { id, amount, to });
      Ok(())
    }

    /// Commit a relay: dispatch to its target and get paid for the compute consumed.
    ///
    /// - `request`/`signature`: the client's signed authorization; its nonce is consumed.
    /// - `perform_payload`: payload returned by a prior [`Pallet::check_relay`].
    /// - `compute_allowance`: compute the caller brings; must cover the relay budget plus
    ///   `PerformComputeCushion`.
    ///
    /// A failing target hook does not fail the commit: its writes are discarded, the
    /// relayer is still paid and [`Event::RelayPerformed`] reports `success: false`.
    #[pallet::call_index(6)]
    #[pallet::weight(
      T::WeightInfo::perform_relay().saturating_add(Weight::from_parts(*compute_allowance, 0))
    )]
    pub fn perform_relay(
      origin: OriginFor<T>,
      id: RelayId<T>,
      request: RelayRequestOf<T>,
      signature: T::OffchainSignature,
      perform_payload: Vec<u8>,
      compute_allowance: u64,
    ) -> DispatchResultWithPostInfo {
      let who = ensure_signed(origin)?;
      let consumed = with_storage_layer(|| {
        Self::do_perform(
          who,
          id,
          request,
          signature,
          perform_payload,
          compute_allowance,
        )
      })?;
      Ok(Some(T::WeightInfo::perform_relay().saturating_add(Weight::from_parts(consumed, 0))).into())
    }

    /// Replace the relayer roster. Owner only.
    ///
    /// `payees[i]` belongs to `relayers[i]`. Relayers dropped from the roster keep their
    /// accrued balance and payee but are no longer active.
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::set_relayers(relayers.len() as u32))]
    pub fn set_relayers(
      origin: OriginFor<T>,
      relayers: Vec<T::AccountId>,
      payees: Vec<PayeeUpdate<T::AccountId>>,
    ) -> DispatchResult {
      Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      Self::apply_roster(relayers, payees)
    }

    /// Propose `proposed` as the next payee of `relayer`. Current payee only.
    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::transfer_payeeship())]
    pub fn transfer_payeeship(
      origin: OriginFor<T>,
      relayer: T::AccountId,
      proposed: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      let info = Relayers::<T>::get(&relayer).ok_or(Error::<T>::OnlyPayee)?;
      ensure!(info.payee == who, Error::<T>::OnlyPayee);
      ensure!(proposed != who, Error::<T>::ValueNotChanged);
      if ProposedPayees::<T>::get(&relayer).as_ref() != Some(&proposed) {
        ProposedPayees::<T>::insert(&relayer, &proposed);
        Self::deposit_event(Event::PayeeshipTransferRequested {
          relayer,
          from: who,
          to: proposed,
        });
      }
      Ok(())
    }

    /// Take over as payee of `relayer`. Proposed payee only.
    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::accept_payeeship())]
    pub fn accept_payeeship(origin: OriginFor<T>, relayer: T::AccountId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      ensure!(
        ProposedPayees::<T>::get(&relayer).as_ref() == Some(&who),
        Error::<T>::OnlyProposedPayee
      );
      let past = Relayers::<T>::try_mutate(&relayer, |maybe_info| -> Result<_, DispatchError> {
        let info = maybe_info.as_mut().ok_or(Error::<T>::OnlyProposedPayee)?;
        Ok(core::mem::replace(&mut info.payee, who.clone()))
      })?;
      ProposedPayees::<T>::remove(&relayer);
      Self::deposit_event(Event::PayeeshipTransferred {
        relayer,
        from: past,
        to: who,
      });
      Ok(())
    }

    /// Pay out everything `relayer` has earned to `to`. Payee only.
    #[pallet::call_index(10)]
    #[pallet::weight(T::WeightInfo::withdraw_payment())]
    pub fn withdraw_payment(
      origin: OriginFor<T>,
      relayer: T::AccountId,
      to: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      ensure!(to != Self::account_id(), Error::<T>::InvalidRecipient);
      let amount = Relayers::<T>::try_mutate(&relayer, |maybe_info| -> Result<_, DispatchError> {
        let info = maybe_info.as_mut().ok_or(Error::<T>::OnlyPayee)?;
        ensure!(info.payee == who, Error::<T>::OnlyPayee);
        Ok(core::mem::take(&mut info.balance))
      })?;
      ExpectedBalance::<T>::mutate(|balance| *balance = balance.saturating_sub(amount));
      Self::pay_out(&to, amount)?;
      Self::deposit_event(Event::PaymentWithdrawn {
        relayer,
        amount,
        to,
        payee: who,
      });
      Ok(())
    }

    /// Pay out the collected cancellation fees to the owner.
    #[pallet::call_index(11)]
    #[pallet::weight(T::WeightInfo::withdraw_owner_funds())]
    pub fn withdraw_owner_funds(origin: OriginFor<T>) -> DispatchResult {
      let who = Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      let amount = OwnerBalance::<T>::take();
      ExpectedBalance::<T>::mutate(|balance| *balance = balance.saturating_sub(amount));
      Self::pay_out(&who, amount)?;
      Self::deposit_event(Event::OwnerFundsWithdrawn { amount });
      Ok(())
    }

    /// Sweep custody funds beyond `ExpectedBalance` to the owner.
    #[pallet::call_index(12)]
    #[pallet::weight(T::WeightInfo::recover_funds())]
    pub fn recover_funds(origin: OriginFor<T>) -> DispatchResult {
      let who = Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      let held = T::Ledger::balance_of(&Self::account_id());
      let amount = held.saturating_sub(ExpectedBalance::<T>::get());
      Self::pay_out(&who, amount)?;
      log::info!(target: LOG_TARGET, "recovered {:?} unaccounted custody funds", amount);
      Self::deposit_event(Event::FundsRecovered { amount, to: who });
      Ok(())
    }

    /// Replace the registry configuration. Owner only.
    #[pallet::call_index(13)]
    #[pallet::weight(T::WeightInfo::set_config())]
    pub fn set_config(origin: OriginFor<T>, config: RegistryConfigOf<T>) -> DispatchResult {
      Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      let current = RegistryConfiguration::<T>::get();
      ensure!(
        config.max_perform_compute >= current.max_perform_compute,
        Error::<T>::ComputeCeilingCanOnlyIncrease
      );
      Self::ensure_valid_config(&config)?;
      RegistryConfiguration::<T>::put(&config);
      Self::deposit_event(Event::ConfigSet { config });
      Ok(())
    }

    #[pallet::call_index(14)]
    #[pallet::weight(T::WeightInfo::pause())]
    pub fn pause(origin: OriginFor<T>) -> DispatchResult {
      let who = Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      ensure!(!Paused::<T>::get(), Error::<T>::AlreadyPaused);
      Paused::<T>::put(true);
      Self::deposit_event(Event::Paused { account: who });
      Ok(())
    }

    #[pallet::call_index(15)]
    #[pallet::weight(T::WeightInfo::unpause())]
    pub fn unpause(origin: OriginFor<T>) -> DispatchResult {
      let who = Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      ensure!(Paused::<T>::get(), Error::<T>::NotPaused);
      Paused::<T>::put(false);
      Self::deposit_event(Event::Unpaused { account: who });
      Ok(())
    }

    /// Propose `new_owner`; ownership moves once they accept.
    #[pallet::call_index(16)]
    #[pallet::weight(T::WeightInfo::transfer_ownership())]
    pub fn transfer_ownership(origin: OriginFor<T>, new_owner: T::AccountId) -> DispatchResult {
      let who = Self::ensure_owner(origin)?;
      Self::ensure_unlocked()?;
      ensure!(new_owner != who, Error::<T>::ValueNotChanged);
      PendingOwner::<T>::put(&new_owner);
      Self::deposit_event(Event::OwnershipTransferRequested {
        from: who,
        to: new_owner,
      });
      Ok(())
    }

    #[pallet::call_index(17)]
    #[pallet::weight(T::WeightInfo::accept_ownership())]
    pub fn accept_ownership(origin: OriginFor<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_unlocked()?;
      ensure!(
        PendingOwner::<T>::get().as_ref() == Some(&who),
        Error::<T>::OnlyProposedOwner
      );
      let past = Owner::<T>::get();
      Owner::<T>::put(&who);
      PendingOwner::<T>::kill();
      Self::deposit_event(Event::OwnershipTransferred { from: past, to: who });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Custody account holding every registry-managed fund.
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Id the next registration in this block would receive for `nonce`.
    pub fn derive_relay_id(nonce: u64) -> RelayId<T> {
      let parent_hash = frame_system::Pallet::<T>::parent_hash();
      T::Hashing::hash_of(&(parent_hash, Self::account_id(), nonce))
    }

    /// Relay `id` and its fixed check payload.
    pub fn get_relay(id: &RelayId<T>) -> Option<(RelayOf<T>, Vec<u8>)> {
      Relays::<T>::get(id).map(|relay| (relay, CheckPayloads::<T>::get(id).into_inner()))
    }

    /// Page through the active set. `count == 0` returns everything from `start` on.
    pub fn active_relay_ids(start: u32, count: u32) -> Result<Vec<RelayId<T>>, DispatchError> {
      let ids = ActiveRelayIds::<T>::get();
      let len = ids.len() as u32;
      ensure!(len > 0, Error::<T>::NoActiveRelays);
      ensure!(start < len, Error::<T>::IndexOutOfRange);
      let end = if count == 0 {
        len
      } else {
        start.saturating_add(count).min(len)
      };
      Ok(ids[start as usize..end as usize].to_vec())
    }

    pub fn registry_state() -> crate::RegistrySnapshot<T::AccountId, BalanceOf<T>> {
      crate::RegistrySnapshot {
        nonce: IdNonce::<T>::get(),
        owner_balance: OwnerBalance::<T>::get(),
        expected_balance: ExpectedBalance::<T>::get(),
        num_relays: ActiveRelayIds::<T>::decode_len().unwrap_or_default() as u32,
        paused: Paused::<T>::get(),
        config: RegistryConfiguration::<T>::get(),
        relayers: RelayerList::<T>::get().into_inner(),
      }
    }

    pub(crate) fn is_owner(who: &T::AccountId) -> bool {
      Owner::<T>::get().as_ref() == Some(who)
    }

    pub(crate) fn ensure_owner(origin: OriginFor<T>) -> Result<T::AccountId, DispatchError> {
      let who = ensure_signed(origin)?;
      ensure!(Self::is_owner(&who), Error::<T>::OnlyOwner);
      Ok(who)
    }

    pub(crate) fn ensure_unlocked() -> DispatchResult {
      if ReentrancyLock::<T>::get() {
        log::warn!(target: LOG_TARGET, "refused reentrant call while a relay target runs");
        return Err(Error::<T>::ReentrantCall.into());
      }
      Ok(())
    }

    fn ensure_budget_in_range(budget: u64, config: &RegistryConfigOf<T>) -> DispatchResult {
      ensure!(
        budget >= T::MinPerformCompute::get() && budget <= config.max_perform_compute,
        Error::<T>::ComputeBudgetOutOfRange
      );
      Ok(())
    }

    pub(crate) fn ensure_valid_config(config: &RegistryConfigOf<T>) -> DispatchResult {
      ensure!(
        config.price_ceiling_multiplier >= 1
          && config.fallback_exchange_rate > 0
          && config.max_perform_compute >= T::MinPerformCompute::get(),
        Error::<T>::InvalidConfig
      );
      Ok(())
    }

    fn ensure_fundable(id: &RelayId<T>) -> DispatchResult {
      let relay = Relays::<T>::get(id).ok_or(Error::<T>::RelayNotFound)?;
      ensure!(!relay.is_canceled(), Error::<T>::RelayCanceled);
      Ok(())
    }

    fn credit_relay(id: &RelayId<T>, amount: BalanceOf<T>) -> DispatchResult {
      Relays::<T>::try_mutate(id, |maybe_relay| -> DispatchResult {
        let relay = maybe_relay.as_mut().ok_or(Error::<T>::RelayNotFound)?;
        relay.balance = relay
          .balance
          .checked_add(&amount)
          .ok_or(ArithmeticError::Overflow)?;
        Ok(())
      })?;
      ExpectedBalance::<T>::try_mutate(|balance| -> DispatchResult {
        *balance = balance.checked_add(&amount).ok_or(ArithmeticError::Overflow)?;
        Ok(())
      })
    }

    fn pay_out(to: &T::AccountId, amount: BalanceOf<T>) -> DispatchResult {
      if amount.is_zero() {
        return Ok(());
      }
      T::Ledger::transfer(&Self::account_id(), to, amount)
    }

    fn remove_active(id: &RelayId<T>) {
      ActiveRelayIds::<T>::mutate(|ids| {
        if let Some(index) = ids.iter().position(|active| active == id) {
          ids.swap_remove(index);
        }
      });
    }

    pub(crate) fn apply_roster(
      relayers: Vec<T::AccountId>,
      payees: Vec<PayeeUpdate<T::AccountId>>,
    ) -> DispatchResult {
      ensure!(
        relayers.len() == payees.len() && relayers.len() >= 2,
        Error::<T>::ParameterLengthError
      );
      let roster: BoundedVec<T::AccountId, T::MaxRelayers> = relayers
        .clone()
        .try_into()
        .map_err(|_| Error::<T>::TooManyRelayers)?;

      let mut resolved = Vec::with_capacity(relayers.len());
      for (index, (relayer, update)) in relayers.iter().zip(payees).enumerate() {
        ensure!(!relayers[..index].contains(relayer), Error::<T>::DuplicateEntry);
        let payee = match (update, Relayers::<T>::get(relayer)) {
          (PayeeUpdate::Keep, Some(info)) => info.payee,
          (PayeeUpdate::Keep, None) => return Err(Error::<T>::InvalidPayee.into()),
          (PayeeUpdate::Set(payee), Some(info)) if info.payee != payee => {
            return Err(Error::<T>::InvalidPayee.into());
          }
          (PayeeUpdate::Set(payee), _) => payee,
        };
        resolved.push(payee);
      }

      for previous in RelayerList::<T>::get() {
        Relayers::<T>::mutate(&previous, |maybe_info| {
          if let Some(info) = maybe_info {
            info.active = false;
          }
        });
      }
      // Returning relayers keep their accrued balance
      for (relayer, payee) in relayers.iter().zip(&resolved) {
        Relayers::<T>::mutate(relayer, |maybe_info| match maybe_info {
          Some(info) => info.active = true,
          None => {
            *maybe_info = Some(RelayerInfo {
              payee: payee.clone(),
              active: true,
              balance: Zero::zero(),
            })
          }
        });
      }

      RelayerList::<T>::put(roster);
      Self::deposit_event(Event::RelayersUpdated {
        relayers,
        payees: resolved,
      });
      Ok(())
    }

    /// Checks `ExpectedBalance` against the tracked balances and the active set against
    /// the relay table.
    #[cfg(any(test, feature = "try-runtime"))]
    pub fn do_try_state() -> Result<(), DispatchError> {
      let relays = Relays::<T>::iter_values()
        .fold(BalanceOf::<T>::zero(), |acc, relay| acc.saturating_add(relay.balance));
      let relayers = Relayers::<T>::iter_values()
        .fold(BalanceOf::<T>::zero(), |acc, info| acc.saturating_add(info.balance));
      let tracked = relays
        .saturating_add(relayers)
        .saturating_add(OwnerBalance::<T>::get());
      ensure!(
        tracked == ExpectedBalance::<T>::get(),
        "expected balance does not match tracked balances"
      );
      ensure!(!ReentrancyLock::<T>::get(), "reentrancy lock left engaged");
      for id in ActiveRelayIds::<T>::get() {
        let relay = Relays::<T>::get(id).ok_or("active relay missing from relay table")?;
        ensure!(!relay.is_canceled(), "canceled relay still in the active set");
      }
      Ok(())
    }
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    pub owner: Option<T::AccountId>,
    pub config: RegistryConfigOf<T>,
    /// Initial `(relayer, payee)` roster; empty or at least two entries
    pub relayers: Vec<(T::AccountId, T::AccountId)>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      // Custody must survive a zero balance
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
      Pallet::<T>::ensure_valid_config(&self.config).expect("invalid genesis registry config");
      RegistryConfiguration::<T>::put(&self.config);
      if let Some(owner) = &self.owner {
        Owner::<T>::put(owner);
      }
      if !self.relayers.is_empty() {
        let (relayers, payees): (Vec<T::AccountId>, Vec<PayeeUpdate<T::AccountId>>) = self
          .relayers
          .iter()
          .cloned()
          .map(|(relayer, payee)| (relayer, PayeeUpdate::Set(payee)))
          .unzip();
        Pallet::<T>::apply_roster(relayers, payees).expect("invalid genesis relayer roster");
      }
    }
  }
}
