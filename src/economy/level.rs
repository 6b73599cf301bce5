//! Level curve: `level = floor(sqrt(xp / divisor))`.
//!
//! Pure and total over `xp >= 0`. Engines call this after every XP change to
//! detect level-up transitions.

/// Level reached at `xp` with the given divisor.
pub fn level_of(xp: u64, divisor: u64) -> u32 {
    debug_assert!(divisor > 0);
    (xp as f64 / divisor as f64).sqrt().floor() as u32
}

/// Minimum XP required to reach `level`.
pub fn xp_for(level: u32, divisor: u64) -> u64 {
    u64::from(level) * u64::from(level) * divisor
}
