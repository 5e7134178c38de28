/// Ratios and utilization are parts-per-10000.
pub const RATIO_SCALE: u128 = 10_000u128;
/// Per-second interest rates are 1e18 mantissas.
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000u128;
pub const TTL_THRESHOLD: u32 = 100_000_000;
pub const TTL_EXTEND_TO: u32 = 200_000_000;
