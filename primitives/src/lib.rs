#![cfg_attr(not(feature = "std"), no_std)]

pub mod constants;
pub mod registry;

pub use constants::*;
pub use registry::*;
