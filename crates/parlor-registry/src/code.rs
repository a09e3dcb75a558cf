//! Join-code generation.
//!
//! Codes are short strings a host reads out loud and a player types on a
//! phone, so the alphabet drops the characters people misread: `0`/`O`
//! and `1`/`I`.

use parlor_protocol::RoomCode;
use rand::Rng;

use crate::RoomError;

/// Characters a join code may contain.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every join code.
pub const CODE_LENGTH: usize = 6;

/// Draws before [`fresh_code`] gives up and reports the space exhausted.
const MAX_ATTEMPTS: usize = 64;

/// Draws one code uniformly from the alphabet.
///
/// Pure sampling with no collision awareness. Callers that need a code
/// unused by the registry go through [`fresh_code`].
pub fn generate_code(rng: &mut impl Rng) -> RoomCode {
    let mut code = String::with_capacity(CODE_LENGTH);
    for _ in 0..CODE_LENGTH {
        let idx = rng.random_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[idx] as char);
    }
    RoomCode::new(code)
}

/// Draws codes until `is_taken` rejects none, bounded by [`MAX_ATTEMPTS`].
pub fn fresh_code(
    rng: &mut impl Rng,
    is_taken: impl Fn(&RoomCode) -> bool,
) -> Result<RoomCode, RoomError> {
    for _ in 0..MAX_ATTEMPTS {
        let code = generate_code(rng);
        if !is_taken(&code) {
            return Ok(code);
        }
    }
    Err(RoomError::CodesExhausted)
}

// ============================================================================
// Tests
// ============================================================================
