//! Fee & payment engine
//!
//! `payment = (compute + overhead) * price * (1 + premium) / exchange_rate + flat_fee`
//!
//! `price` is in fee-asset base units per compute unit and `exchange_rate` in fee-asset base
//! units per whole settlement token, so the variable part is scaled by 10^18 to land in
//! settlement base units. All intermediate math runs in 256 bits.

use crate::{
  LOG_TARGET,
  adapters::{FeedReading, PriceFeed, SettlementLedger},
  pallet::{BalanceOf, Config, Error, RegistryConfiguration, RelayId, Relays},
  types::PaymentParams,
};
use frame::prelude::*;
use polkadot_sdk::{
  frame_support::traits::UnixTime,
  sp_core::U256,
  sp_runtime::traits::SaturatedConversion,
};
use relay_primitives::params::{FLAT_FEE_SCALE, PPB_BASE};

impl<T: Config> crate::Pallet<T> {
  /// Current `(compute_price, exchange_rate)`, each falling back to its configured constant
  /// when the feed is stale or non-positive.
  pub fn feed_data() -> (u128, u128) {
    let config = RegistryConfiguration::<T>::get();
    let now = T::UnixTime::now().as_secs();
    let compute_price =
      usable_value(T::ComputePriceFeed::latest_value(), now, config.staleness_seconds)
        .unwrap_or_else(|| {
          log::debug!(target: LOG_TARGET, "compute price feed unusable, using fallback");
          config.fallback_compute_price
        });
    let exchange_rate =
      usable_value(T::ExchangeRateFeed::latest_value(), now, config.staleness_seconds)
        .unwrap_or_else(|| {
          log::debug!(target: LOG_TARGET, "exchange rate feed unusable, using fallback");
          config.fallback_exchange_rate
        });
    (compute_price, exchange_rate)
  }

  /// Feed price times the ceiling multiplier, lowered to `caller_price` when that is cheaper.
  pub fn adjust_price(feed_price: u128, caller_price: Option<u128>) -> u128 {
    let multiplier = RegistryConfiguration::<T>::get().price_ceiling_multiplier;
    let ceiling = feed_price.saturating_mul(u128::from(multiplier));
    match caller_price {
      Some(price) if price < ceiling => price,
      _ => ceiling,
    }
  }

  /// Payment for `compute_units` of work, bounded by the settlement token's total supply.
  pub fn calculate_payment(
    compute_units: u64,
    adjusted_price: u128,
    exchange_rate: u128,
  ) -> Result<BalanceOf<T>, DispatchError> {
    ensure!(exchange_rate > 0, Error::<T>::PaymentGreaterThanSupply);
    let config = RegistryConfiguration::<T>::get();

    let compute = U256::from(compute_units)
      .saturating_add(U256::from(T::RegistryComputeOverhead::get()));
    let premium = U256::from(PPB_BASE)
      .saturating_add(U256::from(config.payment_premium.deconstruct()));
    let variable = compute
      .saturating_mul(U256::from(adjusted_price))
      .saturating_mul(U256::from(PPB_BASE))
      .saturating_mul(premium)
      / U256::from(exchange_rate);
    let flat = U256::from(config.flat_fee_micro).saturating_mul(U256::from(FLAT_FEE_SCALE));
    let total = variable.saturating_add(flat);

    let supply: u128 = T::Ledger::total_supply().saturated_into();
    ensure!(total <= U256::from(supply), Error::<T>::PaymentGreaterThanSupply);
    Ok(total.low_u128().saturated_into())
  }

  /// Payment if a relay consumes all of `compute_limit`, at current feed prices.
  pub fn max_payment_for_compute(compute_limit: u64) -> Result<BalanceOf<T>, DispatchError> {
    let (compute_price, exchange_rate) = Self::feed_data();
    let adjusted_price = Self::adjust_price(compute_price, None);
    Self::calculate_payment(compute_limit, adjusted_price, exchange_rate)
  }

  /// Balance relay `id` needs before any relayer will commit it.
  pub fn min_balance_for_relay(id: &RelayId<T>) -> Result<BalanceOf<T>, DispatchError> {
    let relay = Relays::<T>::get(id).ok_or(Error::<T>::RelayNotFound)?;
    Self::max_payment_for_compute(relay.compute_budget)
  }

  /// Resolve pricing for one check or commit of a relay with `compute_limit`.
  pub(crate) fn payment_params(
    compute_limit: u64,
    caller_price: Option<u128>,
  ) -> Result<PaymentParams<BalanceOf<T>>, DispatchError> {
    let (compute_price, exchange_rate) = Self::feed_data();
    let adjusted_price = Self::adjust_price(compute_price, caller_price);
    let max_payment = Self::calculate_payment(compute_limit, adjusted_price, exchange_rate)?;
    Ok(PaymentParams {
      compute_limit,
      adjusted_price,
      exchange_rate,
      max_payment,
    })
  }
}

fn usable_value(reading: FeedReading, now: u64, staleness_seconds: u64) -> Option<u128> {
  let stale = staleness_seconds > 0 && now.saturating_sub(reading.updated_at) > staleness_seconds;
  if stale || reading.value <= 0 {
    return None;
  }
  u128::try_from(reading.value).ok()
}
