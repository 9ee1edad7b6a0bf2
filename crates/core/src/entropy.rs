//! Shannon entropy and redundancy of byte sequences.

/// Theoretical maximum entropy of a byte-valued symbol, in bits.
pub const MAX_BYTE_ENTROPY: f64 = 8.0;

/// Byte-value histogram over the whole input.
fn byte_frequencies(data: &[u8]) -> [u64; 256] {
    let mut freqs = [0u64; 256];
    for &byte in data {
        freqs[byte as usize] += 1;
    }
    freqs
}

/// Shannon entropy of `data` in bits per byte.
///
/// Returns 0.0 for empty input. The result is always in `[0, 8]`.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let total = data.len() as f64;
    let entropy: f64 = byte_frequencies(data)
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    // Floating-point drift can overshoot 8.0 for a full 256-symbol alphabet.
    entropy.clamp(0.0, MAX_BYTE_ENTROPY)
}

/// Fraction of the information capacity `max_entropy` left unused.
///
/// `max(0, 1 - entropy / max_entropy)`, or 0.0 when `max_entropy` is zero.
pub fn redundancy(entropy: f64, max_entropy: f64) -> f64 {
    if max_entropy == 0.0 {
        return 0.0;
    }
    (1.0 - entropy / max_entropy).clamp(0.0, 1.0)
}
