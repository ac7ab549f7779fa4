/// The current time, in seconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now() -> u64 {
    (js_sys::Date::now() / 1000.0) as u64
}

/// The current time, in seconds since the Unix epoch. A system clock set
/// before the epoch reads as the epoch itself.
#[cfg(not(target_arch = "wasm32"))]
pub fn now() -> u64 {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
