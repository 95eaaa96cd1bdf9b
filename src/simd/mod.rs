//! The scan primitive: find the first occurrence of up to four "stop" bytes
//! in a run, or a single stop byte for the quoted-field fast path.
//!
//! Three backends exist — scalar, 128-bit portable-SIMD, and 256-bit
//! portable-SIMD (AVX2) — selected at runtime from the cached feature
//! bitmask in [`dispatch`]. All three agree on the contract in full:
//! the smallest offset `i` such that `bytes[i]` is one of the targets, or
//! "not found" carrying the scanned length.

pub mod dispatch;
mod scalar;
mod wide;

/// Below this many bytes, SIMD setup overhead isn't worth it; scan scalar.
const SCALAR_THRESHOLD: usize = 16;

/// Result of a scan: either the offset of the first match, or "not found"
/// together with the number of bytes that were scanned (normally the full
/// length of the input slice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResult {
    Found(usize),
    NotFound(usize),
}

/// Find the first occurrence of any of `b1, b2, b3, b4` in `bytes`.
///
/// `b1..b4` are expected to be the delimiter, quote, LF, and CR bytes
/// respectively, but the primitive itself is byte-agnostic.
#[inline]
pub fn scan_structural(bytes: &[u8], b1: u8, b2: u8, b3: u8, b4: u8) -> ScanResult {
    if bytes.is_empty() {
        return ScanResult::NotFound(0);
    }

    let feat = dispatch::features();
    if bytes.len() >= wide::WIDE && feat.has_avx2() {
        wide::scan_wide(bytes, b1, b2, b3, b4)
    } else if bytes.len() >= SCALAR_THRESHOLD && feat.has_simd128() {
        wide::scan_chunk16(bytes, b1, b2, b3, b4)
    } else {
        scalar::scan_scalar(bytes, b1, b2, b3, b4)
    }
}

/// Reports whether a `scan_structural` call over a run of this length would
/// take a vectorized path on this process, so callers that track SIMD-vs-
/// scalar usage stats don't have to duplicate the dispatch thresholds.
#[inline]
pub fn used_simd_for(len: usize) -> bool {
    let feat = dispatch::features();
    (len >= wide::WIDE && feat.has_avx2()) || (len >= SCALAR_THRESHOLD && feat.has_simd128())
}

/// Find the first occurrence of `quote` in `bytes`. Specialization of
/// [`scan_structural`] for the body of a quoted field, where only the
/// quote byte itself is structural.
#[inline]
pub fn quote_scan(bytes: &[u8], quote: u8) -> ScanResult {
    if bytes.is_empty() {
        return ScanResult::NotFound(0);
    }
    match memchr::memchr(quote, bytes) {
        Some(i) => ScanResult::Found(i),
        None => ScanResult::NotFound(bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_not_found_immediately() {
        assert_eq!(scan_structural(b"", b',', b'"', b'\n', b'\r'), ScanResult::NotFound(0));
        assert_eq!(quote_scan(b"", b'"'), ScanResult::NotFound(0));
    }

    #[test]
    fn finds_first_of_several_targets_short() {
        let r = scan_structural(b"abc,def", b',', b'"', b'\n', b'\r');
        assert_eq!(r, ScanResult::Found(3));
    }

    #[test]
    fn not_found_returns_full_length() {
        let r = scan_structural(b"abcdef", b',', b'"', b'\n', b'\r');
        assert_eq!(r, ScanResult::NotFound(6));
    }

    #[test]
    fn quote_scan_finds_embedded_quote() {
        let r = quote_scan(b"hello \"world", b'"');
        assert_eq!(r, ScanResult::Found(6));
    }

    #[test]
    fn scan_works_across_simd_chunk_boundary() {
        // 40 bytes of filler then the target near the very end, forcing the
        // wide/chunk16 paths to actually exercise their chunk loop.
        let mut input = vec![b'x'; 39];
        input.push(b',');
        let r = scan_structural(&input, b',', b'"', b'\n', b'\r');
        assert_eq!(r, ScanResult::Found(39));
    }

    #[test]
    fn used_simd_for_short_input_is_false() {
        assert!(!used_simd_for(0));
        assert!(!used_simd_for(1));
    }

    #[test]
    fn scan_handles_lengths_around_every_threshold() {
        for len in 0..80 {
            let mut input = vec![b'x'; len];
            if len > 0 {
                input[len - 1] = b'\n';
            }
            let r = scan_structural(&input, b',', b'"', b'\n', b'\r');
            if len == 0 {
                assert_eq!(r, ScanResult::NotFound(0));
            } else {
                assert_eq!(r, ScanResult::Found(len - 1), "len={len}");
            }
        }
    }
}
