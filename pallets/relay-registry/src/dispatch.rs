//! Simulate and commit pipelines.

use crate::{
  LOG_TARGET,
  adapters::{ComputeMeter, RelayTarget},
  pallet::{
    BalanceOf, CheckPayloads, Config, Error, Event, Paused, ReentrancyLock, RelayId, RelayOf,
    RelayRequestOf, Relayers, Relays, RequestNonces,
  },
  types::{CheckOutcome, CheckRelayError, PaymentParams},
};
use alloc::vec::Vec;
use frame::prelude::*;
use polkadot_sdk::{
  frame_support::storage::with_transaction,
  sp_runtime::{
    ArithmeticError, TransactionOutcome,
    traits::{CheckedAdd, CheckedSub, Saturating},
  },
};
use relay_primitives::CallMode;

impl<T: Config> crate::Pallet<T> {
  /// Simulate a commit of relay `id` by `from` without keeping any effect.
  ///
  /// Only answered in [`CallMode::DryRun`]; everything runs in a storage transaction that is
  /// always rolled back, so the request nonce is never consumed. `price_ceiling` caps the
  /// compute price the way a relayer's own price caps it on commit.
  pub fn check_relay(
    mode: CallMode,
    id: RelayId<T>,
    from: T::AccountId,
    request: RelayRequestOf<T>,
    signature: T::OffchainSignature,
    price_ceiling: Option<u128>,
  ) -> Result<CheckOutcome<BalanceOf<T>>, CheckRelayError> {
    ensure!(mode == CallMode::DryRun, Error::<T>::OnlySimulatedBackend);
    with_transaction(|| {
      TransactionOutcome::Rollback(Self::simulate(
        id,
        &from,
        &request,
        &signature,
        price_ceiling,
      ))
    })
  }

  fn simulate(
    id: RelayId<T>,
    from: &T::AccountId,
    request: &RelayRequestOf<T>,
    signature: &T::OffchainSignature,
    price_ceiling: Option<u128>,
  ) -> Result<CheckOutcome<BalanceOf<T>>, CheckRelayError> {
    Self::ensure_valid_request(request, signature)?;
    let relay = Relays::<T>::get(id).ok_or(Error::<T>::RelayNotFound)?;
    let now = frame_system::Pallet::<T>::block_number();
    ensure!(relay.is_active_at(&now), Error::<T>::RelayNotActive);

    let check_payload = CheckPayloads::<T>::get(id);
    let mut meter = ComputeMeter::new(Self::registry_config().check_compute_limit);
    let (needed, perform_payload) = T::Targets::check_relay(
      &relay.target,
      request,
      &check_payload,
      signature,
      CallMode::DryRun,
      &mut meter,
    )
    .map_err(CheckRelayError::TargetCheckReverted)?;
    ensure!(needed, Error::<T>::RelayNotNeeded);

    let params = Self::payment_params(relay.compute_budget, price_ceiling)?;
    Self::pre_flight(&relay, from, &params)?;
    Ok(CheckOutcome {
      perform_payload,
      max_payment: params.max_payment,
      compute_limit: params.compute_limit,
      adjusted_price: params.adjusted_price,
      exchange_rate: params.exchange_rate,
    })
  }

  /// Body of `perform_relay`. Returns the compute the target consumed.
  pub(crate) fn do_perform(
    who: T::AccountId,
    id: RelayId<T>,
    request: RelayRequestOf<T>,
    signature: T::OffchainSignature,
    perform_payload: Vec<u8>,
    compute_allowance: u64,
  ) -> Result<u64, DispatchError> {
    ensure!(!Paused::<T>::get(), Error::<T>::RegistryPaused);
    Self::ensure_unlocked()?;
    Self::ensure_valid_request(&request, &signature)?;
    RequestNonces::<T>::mutate(&request.from, |nonce| *nonce = nonce.saturating_add(1));

    let relay = Relays::<T>::get(id).ok_or(Error::<T>::RelayNotFound)?;
    // Live feeds and the relayer's own price; never a quoted ceiling
    let params = Self::payment_params(relay.compute_budget, Some(T::CallerComputePrice::get()))?;

    ReentrancyLock::<T>::put(true);
    let outcome = Self::perform_with_params(
      &who,
      id,
      relay,
      &request,
      perform_payload,
      compute_allowance,
      params,
    );
    ReentrancyLock::<T>::kill();
    outcome
  }

  fn perform_with_params(
    who: &T::AccountId,
    id: RelayId<T>,
    relay: RelayOf<T>,
    request: &RelayRequestOf<T>,
    perform_payload: Vec<u8>,
    compute_allowance: u64,
    params: PaymentParams<BalanceOf<T>>,
  ) -> Result<u64, DispatchError> {
    let now = frame_system::Pallet::<T>::block_number();
    ensure!(relay.is_active_at(&now), Error::<T>::RelayNotActive);
    Self::pre_flight(&relay, who, &params)?;
    ensure!(
      compute_allowance >= params.compute_limit.saturating_add(T::PerformComputeCushion::get()),
      Error::<T>::InsufficientComputeForPerform
    );

    let mut meter = ComputeMeter::new(params.compute_limit);
    // The target's own failure is an outcome, not an error: its writes are dropped and the
    // commit carries on.
    let hook_result: DispatchResult = with_transaction(|| {
      let result = T::Targets::perform_relay(&relay.target, request, &perform_payload, &mut meter);
      if result.is_ok() {
        TransactionOutcome::Commit(Ok::<_, DispatchError>(result))
      } else {
        TransactionOutcome::Rollback(Ok(result))
      }
    })?;
    if let Err(error) = hook_result {
      log::debug!(target: LOG_TARGET, "relay {:?} target failed: {:?}", id, error);
    }

    let consumed = meter.consumed();
    let payment = Self::calculate_payment(consumed, params.adjusted_price, params.exchange_rate)?;
    Relays::<T>::try_mutate(id, |maybe_relay| -> DispatchResult {
      let relay = maybe_relay.as_mut().ok_or(Error::<T>::RelayNotFound)?;
      relay.balance = relay
        .balance
        .checked_sub(&payment)
        .ok_or(Error::<T>::InsufficientFunds)?;
      relay.amount_spent = relay.amount_spent.saturating_add(payment);
      relay.last_executor = Some(who.clone());
      Ok(())
    })?;
    Relayers::<T>::try_mutate(who, |maybe_info| -> DispatchResult {
      let info = maybe_info.as_mut().ok_or(Error::<T>::OnlyActiveRelayers)?;
      info.balance = info.balance.checked_add(&payment).ok_or(ArithmeticError::Overflow)?;
      Ok(())
    })?;

    Self::deposit_event(Event::RelayPerformed {
      id,
      success: hook_result.is_ok(),
      from: who.clone(),
      payment,
      perform_payload,
    });
    Ok(consumed)
  }

  /// Checks shared by simulation and commit.
  fn pre_flight(
    relay: &RelayOf<T>,
    from: &T::AccountId,
    params: &PaymentParams<BalanceOf<T>>,
  ) -> DispatchResult {
    let active = Relayers::<T>::get(from).is_some_and(|info| info.active);
    ensure!(active, Error::<T>::OnlyActiveRelayers);
    ensure!(relay.balance >= params.max_payment, Error::<T>::InsufficientFunds);
    ensure!(
      relay.last_executor.as_ref() != Some(from),
      Error::<T>::RelayersMustTakeTurns
    );
    Ok(())
  }
}
