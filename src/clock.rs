//! The 32-bit millisecond clock used for `frame_time_ms` and
//! `finish_frame` timestamps (`spec.md` §9: "32-bit millisecond
//! timestamps... wraps every ~50 days. Carry this limitation forward;
//! it matches Wayland wire semantics").

/// Current `CLOCK_MONOTONIC` time truncated to milliseconds and
/// wrapped into a `u32`, matching the width of the Wayland wire
/// protocol's timestamp fields.
pub fn now_ms() -> u32 {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    let millis = (ts.tv_sec as i64) * 1000 + (ts.tv_nsec as i64) / 1_000_000;
    millis as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_monotonic_across_two_calls() {
        let a = now_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = now_ms();
        assert!(b.wrapping_sub(a) < u32::MAX / 2);
    }
}
