//! Bonding-curve graduation progress
//!
//! Progress is derived from the virtual token reserves emitted on each
//! buy/sell event, not from a locally tracked running balance, so the value
//! self-corrects even if prior events were missed.

use alloy_primitives::U256;

/// Scale a whole-token count to 18-decimal native units.
pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// Virtual token reserves at curve creation.
pub fn initial_virtual_token_reserves() -> U256 {
    e18(1_073_000_000)
}

/// Real token reserves sold over the life of the curve.
pub fn initial_real_token_reserves() -> U256 {
    e18(793_100_000)
}

/// Graduation progress in basis points, clamped to [0, 10000].
///
/// `tokensSold = INITIAL_VIRTUAL - virtualTokenReserves`, floored at zero
/// when a heavy sell pushes reserves above the initial figure.
pub fn progress_bps(virtual_token_reserves: U256) -> u32 {
    let tokens_sold = initial_virtual_token_reserves().saturating_sub(virtual_token_reserves);
    let bps = tokens_sold * U256::from(10_000u64) / initial_real_token_reserves();
    if bps > U256::from(10_000u64) {
        10_000
    } else {
        bps.to::<u32>()
    }
}
