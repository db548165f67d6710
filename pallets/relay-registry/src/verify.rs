//! Request signature and replay verification.
//!
//! A client signs `blake2_256(DIGEST_PREFIX ++ domain_separator ++ request_hash)`. The
//! domain separator binds the digest to this chain and this registry instance, so a signed
//! request cannot be replayed against another deployment.

use crate::pallet::{Config, Error, RelayRequestOf, RequestNonces};
use alloc::vec::Vec;
use frame::{hashing::blake2_256, prelude::*};
use polkadot_sdk::sp_runtime::traits::{Verify, Zero};
use relay_primitives::domain::{
  DIGEST_PREFIX, DOMAIN_NAME, DOMAIN_TYPE_TAG, DOMAIN_VERSION, REQUEST_TYPE_TAG,
};

impl<T: Config> crate::Pallet<T> {
  pub fn domain_separator() -> [u8; 32] {
    let genesis = frame_system::BlockHash::<T>::get(BlockNumberFor::<T>::zero());
    blake2_256(
      &(
        DOMAIN_TYPE_TAG,
        blake2_256(DOMAIN_NAME),
        blake2_256(DOMAIN_VERSION),
        genesis,
        Self::account_id(),
      )
        .encode(),
    )
  }

  /// Digest a client signs to authorize `request`.
  pub fn request_digest(request: &RelayRequestOf<T>) -> [u8; 32] {
    let request_hash = blake2_256(
      &(
        REQUEST_TYPE_TAG,
        &request.from,
        &request.to,
        request.nonce,
        blake2_256(&request.data),
      )
        .encode(),
    );
    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(DIGEST_PREFIX);
    preimage.extend_from_slice(&Self::domain_separator());
    preimage.extend_from_slice(&request_hash);
    blake2_256(&preimage)
  }

  /// Whether `signature` was made by `request.from` and the request carries its current nonce.
  pub fn verify(request: &RelayRequestOf<T>, signature: &T::OffchainSignature) -> bool {
    Self::signed_by_origin(request, signature) && Self::nonce_is_current(request)
  }

  pub(crate) fn ensure_valid_request(
    request: &RelayRequestOf<T>,
    signature: &T::OffchainSignature,
  ) -> DispatchResult {
    ensure!(
      Self::signed_by_origin(request, signature),
      Error::<T>::InvalidRequestSignature
    );
    ensure!(Self::nonce_is_current(request), Error::<T>::InvalidRequestNonce);
    Ok(())
  }

  fn signed_by_origin(request: &RelayRequestOf<T>, signature: &T::OffchainSignature) -> bool {
    let digest = Self::request_digest(request);
    signature.verify(&digest[..], &request.from)
  }

  fn nonce_is_current(request: &RelayRequestOf<T>) -> bool {
    RequestNonces::<T>::get(&request.from) == request.nonce
  }
}
