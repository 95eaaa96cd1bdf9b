//! Process-wide SIMD feature cache.
//!
//! Feature detection (`is_x86_feature_detected!` / equivalent) performs a
//! CPUID-class probe once per process and publishes the result into an
//! atomic; every subsequent read is a lock-free load. This mirrors the
//! "per-process mutable feature bitmask becomes a once-initialized
//! read-mostly atomic" re-architecture called for over the source's plain
//! global variable.

use std::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0xFF;

const SCALAR: u8 = 0;
const SIMD128: u8 = 1 << 0;
const AVX2: u8 = 1 << 1;

static FEATURES: AtomicU8 = AtomicU8::new(UNINIT);

/// Cached SIMD capability bitmask for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features(u8);

impl Features {
    #[inline]
    pub fn has_simd128(self) -> bool {
        self.0 & SIMD128 != 0
    }

    #[inline]
    pub fn has_avx2(self) -> bool {
        self.0 & AVX2 != 0
    }

    #[inline]
    pub fn scalar_only() -> Self {
        Features(SCALAR)
    }
}

/// Return the cached feature bitmask, probing and publishing it on first use.
#[inline]
pub fn features() -> Features {
    let cached = FEATURES.load(Ordering::Relaxed);
    if cached != UNINIT {
        return Features(cached);
    }
    let detected = detect();
    // Relaxed is enough: every writer computes the same value from CPUID,
    // so a lost race just redoes the (idempotent) probe.
    FEATURES.compare_exchange(UNINIT, detected, Ordering::Relaxed, Ordering::Relaxed)
        .ok();
    Features(detected)
}

#[cfg(target_arch = "x86_64")]
fn detect() -> u8 {
    let mut bits = SIMD128; // SSE2 is part of the x86_64 baseline ABI.
    if std::is_x86_feature_detected!("avx2") {
        bits |= AVX2;
        log::debug!("streamcsv: AVX2 detected, using 32-byte scan chunks");
    } else {
        log::debug!("streamcsv: AVX2 unavailable, using 16-byte scan chunks");
    }
    bits
}

#[cfg(target_arch = "aarch64")]
fn detect() -> u8 {
    // NEON is mandatory on aarch64; there is no wider portable tier here.
    log::debug!("streamcsv: NEON baseline assumed on aarch64");
    SIMD128
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> u8 {
    log::debug!("streamcsv: no vector ISA recognized, falling back to scalar scan");
    SCALAR
}
