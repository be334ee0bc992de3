//! Session token generation.

use rand::RngCore;

/// Random bytes per token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque bearer token
///
/// Draws from the thread-local CSPRNG and hex encodes the result, so tokens
/// are safe in headers and URLs without further escaping.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
