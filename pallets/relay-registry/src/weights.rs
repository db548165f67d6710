#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn register_relay() -> Weight;
	fn add_funds() -> Weight;
	fn on_token_transfer() -> Weight;
	fn set_compute_budget() -> Weight;
	fn cancel_relay() -> Weight;
	fn withdraw_funds() -> Weight;
	fn perform_relay() -> Weight;
	fn set_relayers(n: u32) -> Weight;
	fn transfer_payeeship() -> Weight;
	fn accept_payeeship() -> Weight;
	fn withdraw_payment() -> Weight;
	fn withdraw_owner_funds() -> Weight;
	fn recover_funds() -> Weight;
	fn set_config() -> Weight;
	fn pause() -> Weight;
	fn unpause() -> Weight;
	fn transfer_ownership() -> Weight;
	fn accept_ownership() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn register_relay() -> Weight {
		Weight::from_parts(40_000_000, 4000)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(5))
	}
	fn add_funds() -> Weight {
		Weight::from_parts(45_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(4))
	}
	fn on_token_transfer() -> Weight {
		Weight::from_parts(30_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn set_compute_budget() -> Weight {
		Weight::from_parts(20_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn cancel_relay() -> Weight {
		Weight::from_parts(30_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn withdraw_funds() -> Weight {
		Weight::from_parts(45_000_000, 3500)
			.saturating_add(T::DbWeight::get().reads(5))
			.saturating_add(T::DbWeight::get().writes(5))
	}
	fn perform_relay() -> Weight {
		Weight::from_parts(80_000_000, 6000)
			.saturating_add(T::DbWeight::get().reads(9))
			.saturating_add(T::DbWeight::get().writes(5))
	}
	fn set_relayers(n: u32) -> Weight {
		Weight::from_parts(25_000_000, 2500)
			.saturating_add(Weight::from_parts(9_000_000, 2600).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(1))
			.saturating_add(T::DbWeight::get().writes((2_u64).saturating_mul(n.into())))
	}
	fn transfer_payeeship() -> Weight {
		Weight::from_parts(20_000_000, 2500)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn accept_payeeship() -> Weight {
		Weight::from_parts(20_000_000, 2500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn withdraw_payment() -> Weight {
		Weight::from_parts(45_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(4))
	}
	fn withdraw_owner_funds() -> Weight {
		Weight::from_parts(40_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(4))
	}
	fn recover_funds() -> Weight {
		Weight::from_parts(40_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(4))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn set_config() -> Weight {
		Weight::from_parts(15_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn pause() -> Weight {
		Weight::from_parts(12_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn unpause() -> Weight {
		Weight::from_parts(12_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn transfer_ownership() -> Weight {
		Weight::from_parts(12_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().writes(1))
	}
	fn accept_ownership() -> Weight {
		Weight::from_parts(15_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(2))
	}
}

impl WeightInfo for () {
	fn register_relay() -> Weight {
		Weight::from_parts(40_000_000, 4000)
	}
	fn add_funds() -> Weight {
		Weight::from_parts(45_000_000, 3500)
	}
	fn on_token_transfer() -> Weight {
		Weight::from_parts(30_000_000, 3000)
	}
	fn set_compute_budget() -> Weight {
		Weight::from_parts(20_000_000, 3000)
	}
	fn cancel_relay() -> Weight {
		Weight::from_parts(30_000_000, 3500)
	}
	fn withdraw_funds() -> Weight {
		Weight::from_parts(45_000_000, 3500)
	}
	fn perform_relay() -> Weight {
		Weight::from_parts(80_000_000, 6000)
	}
	fn set_relayers(n: u32) -> Weight {
		Weight::from_parts(25_000_000, 2500)
			.saturating_add(Weight::from_parts(9_000_000, 2600).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(1))
			.saturating_add(RocksDbWeight::get().writes(1))
	}
	fn transfer_payeeship() -> Weight {
		Weight::from_parts(20_000_000, 2500)
	}
	fn accept_payeeship() -> Weight {
		Weight::from_parts(20_000_000, 2500)
	}
	fn withdraw_payment() -> Weight {
		Weight::from_parts(45_000_000, 3000)
	}
	fn withdraw_owner_funds() -> Weight {
		Weight::from_parts(40_000_000, 3000)
	}
	fn recover_funds() -> Weight {
		Weight::from_parts(40_000_000, 3000)
	}
	fn set_config() -> Weight {
		Weight::from_parts(15_000_000, 2000)
	}
	fn pause() -> Weight {
		Weight::from_parts(12_000_000, 1500)
	}
	fn unpause() -> Weight {
		Weight::from_parts(12_000_000, 1500)
	}
	fn transfer_ownership() -> Weight {
		Weight::from_parts(12_000_000, 1500)
	}
	fn accept_ownership() -> Weight {
		Weight::from_parts(15_000_000, 1500)
	}
}
