use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static CALLS: AtomicU32 = AtomicU32::new(0);

/// 32-bit seed derived from the wall clock.
///
/// A per-process call counter is mixed in so that two calls landing on the
/// same clock tick still produce different seeds.
pub fn time_seed() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let call = CALLS.fetch_add(1, Ordering::Relaxed);
    let folded = (now.as_secs() as u32) ^ now.subsec_nanos().rotate_left(11);
    mix(folded ^ call.wrapping_mul(0x9E37_79B9))
}

fn mix(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x
}
