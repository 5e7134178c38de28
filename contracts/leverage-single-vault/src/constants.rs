/// Ratios, deviations, and the liquidation bonus are parts-per-10000.
pub const RATIO_SCALE: u128 = 10_000u128;
pub const HEALTH_MAX: u128 = u128::MAX;
pub const TTL_THRESHOLD: u32 = 100_000_000;
pub const TTL_EXTEND_TO: u32 = 200_000_000;
