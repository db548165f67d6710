use crate::*;
use alloc::vec::Vec;
use codec::Encode;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use polkadot_sdk::sp_runtime::traits::{SaturatedConversion, Zero};
use relay_primitives::{PayeeUpdate, RelayRequest};

const FUNDS: u128 = 1_000_000_000_000_000_000_000;

fn units<T: Config>(amount: u128) -> BalanceOf<T> {
  amount.saturated_into()
}

fn setup_owner<T: Config>() -> T::AccountId {
  let owner: T::AccountId = whitelisted_caller();
  Owner::<T>::put(&owner);
  owner
}

fn setup_roster<T: Config>(n: u32) -> Vec<T::AccountId> {
  let relayers: Vec<T::AccountId> = (0..n).map(|i| account("relayer", i, 0)).collect();
  let payees: Vec<PayeeUpdate<T::AccountId>> = (0..n)
    .map(|i| PayeeUpdate::Set(account("payee", i, 0)))
    .collect();
  Pallet::<T>::apply_roster(relayers.clone(), payees).expect("roster setup failed");
  relayers
}

fn register<T: Config>(owner: &T::AccountId, admin: &T::AccountId) -> RelayId<T> {
  let id = Pallet::<T>::derive_relay_id(IdNonce::<T>::get());
  Pallet::<T>::register_relay(
    RawOrigin::Signed(owner.clone()).into(),
    T::BenchmarkHelper::executable_target(),
    T::MinPerformCompute::get(),
    admin.clone(),
    alloc::vec![0u8; T::MaxCheckPayloadLen::get() as usize],
  )
  .expect("registration failed");
  id
}

fn funded_relay<T: Config>(owner: &T::AccountId, admin: &T::AccountId) -> RelayId<T> {
  let id = register::<T>(owner, admin);
  T::BenchmarkHelper::fund_account(admin, units::<T>(FUNDS * 10));
  Pallet::<T>::add_funds(RawOrigin::Signed(admin.clone()).into(), id, units::<T>(FUNDS))
    .expect("funding failed");
  id
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn register_relay() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let target = T::BenchmarkHelper::executable_target();
    let payload = alloc::vec![0u8; T::MaxCheckPayloadLen::get() as usize];

    #[extrinsic_call]
    register_relay(
      RawOrigin::Signed(owner),
      target,
      T::MinPerformCompute::get(),
      admin,
      payload,
    );

    assert_eq!(IdNonce::<T>::get(), 1);
  }

  #[benchmark]
  fn add_funds() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let id = register::<T>(&owner, &admin);
    T::BenchmarkHelper::fund_account(&admin, units::<T>(FUNDS * 10));

    #[extrinsic_call]
    add_funds(RawOrigin::Signed(admin), id, units::<T>(FUNDS));

    assert_eq!(ExpectedBalance::<T>::get(), units::<T>(FUNDS));
  }

  #[benchmark]
  fn on_token_transfer() -> Result<(), BenchmarkError> {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let id = register::<T>(&owner, &admin);
    let origin =
      T::LedgerOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    on_token_transfer(origin as T::RuntimeOrigin, admin, units::<T>(FUNDS), id.encode());

    Ok(())
  }

  #[benchmark]
  fn set_compute_budget() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let id = register::<T>(&owner, &admin);
    let budget = RegistryConfiguration::<T>::get().max_perform_compute;

    #[extrinsic_call]
    set_compute_budget(RawOrigin::Signed(admin), id, budget);
  }

  #[benchmark]
  fn cancel_relay() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let id = register::<T>(&owner, &admin);

    #[extrinsic_call]
    cancel_relay(RawOrigin::Signed(admin), id);

    assert!(ActiveRelayIds::<T>::get().is_empty());
  }

  #[benchmark]
  fn withdraw_funds() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let id = funded_relay::<T>(&owner, &admin);
    Pallet::<T>::cancel_relay(RawOrigin::Signed(owner).into(), id).expect("cancel failed");

    #[extrinsic_call]
    withdraw_funds(RawOrigin::Signed(admin.clone()), id, admin);
  }

  #[benchmark]
  fn perform_relay() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let relayers = setup_roster::<T>(2);
    let id = funded_relay::<T>(&owner, &admin);
    let client: T::AccountId = account("client", 0, 0);
    let request = RelayRequest {
      from: client.clone(),
      to: T::BenchmarkHelper::executable_target(),
      nonce: 0,
      data: alloc::vec![1u8; 32],
    };
    let signature =
      T::BenchmarkHelper::sign_request(&client, &Pallet::<T>::request_digest(&request));
    let allowance = T::MinPerformCompute::get().saturating_add(T::PerformComputeCushion::get());

    #[extrinsic_call]
    perform_relay(
      RawOrigin::Signed(relayers[0].clone()),
      id,
      request,
      signature,
      alloc::vec![0u8; 32],
      allowance,
    );

    assert_eq!(RequestNonces::<T>::get(&client), 1);
  }

  #[benchmark]
  fn set_relayers(n: Linear<2, { T::MaxRelayers::get() }>) {
    let owner = setup_owner::<T>();
    setup_roster::<T>(n);
    let relayers: Vec<T::AccountId> = (0..n).map(|i| account("fresh", i, 0)).collect();
    let payees: Vec<PayeeUpdate<T::AccountId>> = (0..n)
      .map(|i| PayeeUpdate::Set(account("fresh-payee", i, 0)))
      .collect();

    #[extrinsic_call]
    set_relayers(RawOrigin::Signed(owner), relayers, payees);

    assert_eq!(RelayerList::<T>::get().len() as u32, n);
  }

  #[benchmark]
  fn transfer_payeeship() {
    let relayers = setup_roster::<T>(2);
    let payee: T::AccountId = account("payee", 0, 0);
    let proposed: T::AccountId = account("proposed", 0, 0);

    #[extrinsic_call]
    transfer_payeeship(RawOrigin::Signed(payee), relayers[0].clone(), proposed);
  }

  #[benchmark]
  fn accept_payeeship() {
    let relayers = setup_roster::<T>(2);
    let proposed: T::AccountId = account("proposed", 0, 0);
    ProposedPayees::<T>::insert(&relayers[0], &proposed);

    #[extrinsic_call]
    accept_payeeship(RawOrigin::Signed(proposed), relayers[0].clone());
  }

  #[benchmark]
  fn withdraw_payment() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let relayers = setup_roster::<T>(2);
    // Move relay funds into the relayer's ledger entry to have something to pay out
    let id = funded_relay::<T>(&owner, &admin);
    Relays::<T>::mutate(id, |relay| {
      if let Some(relay) = relay {
        relay.balance = Zero::zero();
      }
    });
    Relayers::<T>::mutate(&relayers[0], |info| {
      if let Some(info) = info {
        info.balance = units::<T>(FUNDS);
      }
    });
    let payee: T::AccountId = account("payee", 0, 0);

    #[extrinsic_call]
    withdraw_payment(RawOrigin::Signed(payee.clone()), relayers[0].clone(), payee);
  }

  #[benchmark]
  fn withdraw_owner_funds() {
    let owner = setup_owner::<T>();
    let admin: T::AccountId = account("admin", 0, 0);
    let id = funded_relay::<T>(&owner, &admin);
    Relays::<T>::mutate(id, |relay| {
      if let Some(relay) = relay {
        relay.balance = Zero::zero();
      }
    });
    OwnerBalance::<T>::put(units::<T>(FUNDS));

    #[extrinsic_call]
    withdraw_owner_funds(RawOrigin::Signed(owner));

    assert!(OwnerBalance::<T>::get().is_zero());
  }

  #[benchmark]
  fn recover_funds() {
    let owner = setup_owner::<T>();
    T::BenchmarkHelper::fund_account(&Pallet::<T>::account_id(), units::<T>(FUNDS));

    #[extrinsic_call]
    recover_funds(RawOrigin::Signed(owner));
  }

  #[benchmark]
  fn set_config() {
    let owner = setup_owner::<T>();
    let mut config = RegistryConfiguration::<T>::get();
    config.max_perform_compute = config.max_perform_compute.saturating_add(1);

    #[extrinsic_call]
    set_config(RawOrigin::Signed(owner), config);
  }

  #[benchmark]
  fn pause() {
    let owner = setup_owner::<T>();

    #[extrinsic_call]
    pause(RawOrigin::Signed(owner));

    assert!(Paused::<T>::get());
  }

  #[benchmark]
  fn unpause() {
    let owner = setup_owner::<T>();
    Paused::<T>::put(true);

    #[extrinsic_call]
    unpause(RawOrigin::Signed(owner));

    assert!(!Paused::<T>::get());
  }

  #[benchmark]
  fn transfer_ownership() {
    let owner = setup_owner::<T>();
    let next: T::AccountId = account("next", 0, 0);

    #[extrinsic_call]
    transfer_ownership(RawOrigin::Signed(owner), next);
  }

  #[benchmark]
  fn accept_ownership() {
    setup_owner::<T>();
    let next: T::AccountId = account("next", 0, 0);
    PendingOwner::<T>::put(&next);

    #[extrinsic_call]
    accept_ownership(RawOrigin::Signed(next.clone()));

    assert_eq!(Owner::<T>::get(), Some(next));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};

  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
