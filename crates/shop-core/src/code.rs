//! # Public Code Generation
//!
//! Short human-facing order references. This is a collision-avoidance
//! loop, not a sequence counter: codes carry no ordering guarantee.

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;

/// Fixed alphabet for public codes
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default code length
pub const CODE_LENGTH: usize = 6;

/// Collision bound before giving up
const MAX_ATTEMPTS: u32 = 25;

/// Existence check against whatever store owns the code namespace.
///
/// A seam rather than a concrete store method: any entity with its own
/// code namespace can reuse the generation loop.
#[async_trait]
pub trait CodeLookup: Send + Sync {
    async fn code_exists(&self, code: &str) -> ShopResult<bool>;
}

/// Draw `length` cryptographically random bytes and map each into the
/// fixed alphabet
pub fn generate_code(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect()
}

/// Generate a code absent from the store, retrying up to the bound.
///
/// Exhausting the bound is a retryable failure; the caller must surface it
/// as a 5xx, never silently return a duplicate.
pub async fn generate_unique_code(lookup: &dyn CodeLookup, length: usize) -> ShopResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let code = generate_code(length);
        if !lookup.code_exists(&code).await? {
            return Ok(code);
        }
    }
    Err(ShopError::CodeGenerationExhausted)
}
