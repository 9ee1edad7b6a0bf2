//! Sample text generation.
//!
//! `--sample` measures a generated text instead of a file, which makes runs
//! reproducible without shipping a corpus.
//!
//! # Design
//!
//! Generated text has:
//! - Runs of a single character (tiny alphabet)
//! - Word-like sections over lowercase letters, accented letters and punctuation
//! - Repeating phrases
//! - A few wide sections with digits and symbols that grow the alphabet
//!
//! The mix keeps the distinct-character count, and so the code width, away
//! from the trivial cases.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const LETTERS: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'x', 'z', 'á', 'à', 'â', 'ã', 'é', 'ê', 'í', 'ó', 'ô', 'õ', 'ú', 'ç',
];

const PUNCTUATION: &[char] = &[' ', ' ', ' ', ',', '.', '\n'];

const WIDE: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '#', '%', '&', '(', ')', '*', '+', '-',
    '/', ':', ';', '=', '?', '@', '[', ']', '€', '§',
];

/// Generate sample text of exactly `size_bytes` UTF-8 bytes.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `size_bytes`: size of the generated text in bytes
pub fn generate_sample_text(seed: u64, size_bytes: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut text = String::with_capacity(size_bytes);

    while text.len() < size_bytes {
        let chunk_size = (size_bytes - text.len()).min(4096);

        let chunk_type: u8 = rng.gen_range(0..10);

        match chunk_type {
            // 20% runs of one character
            0..=1 => {
                let c = LETTERS[rng.gen_range(0..LETTERS.len())];
                for _ in 0..chunk_size {
                    push_within(&mut text, c, size_bytes);
                }
            }

            // 50% word-like text
            2..=6 => {
                let start = text.len();
                while text.len() - start < chunk_size && text.len() < size_bytes {
                    let word_len = rng.gen_range(1..=9);
                    for _ in 0..word_len {
                        push_within(&mut text, LETTERS[rng.gen_range(0..LETTERS.len())], size_bytes);
                    }
                    push_within(&mut text, PUNCTUATION[rng.gen_range(0..PUNCTUATION.len())], size_bytes);
                }
            }

            // 20% repeating phrase
            7..=8 => {
                let phrase = generate_phrase(&mut rng);
                for c in phrase.chars().cycle().take(chunk_size) {
                    push_within(&mut text, c, size_bytes);
                }
            }

            // 10% wide alphabet
            _ => {
                for _ in 0..chunk_size.min(256) {
                    push_within(&mut text, WIDE[rng.gen_range(0..WIDE.len())], size_bytes);
                }
            }
        }
    }

    text
}

/// Push `c`, or a one-byte filler when `c` would overshoot `limit`.
fn push_within(text: &mut String, c: char, limit: usize) {
    let room = limit - text.len();
    if room == 0 {
        return;
    }
    if c.len_utf8() <= room {
        text.push(c);
    } else {
        text.push(' ');
    }
}

/// Generate a short phrase to repeat.
fn generate_phrase(rng: &mut ChaCha8Rng) -> String {
    let len = rng.gen_range(4..=24);
    let mut phrase: String = (0..len).map(|_| LETTERS[rng.gen_range(0..LETTERS.len())]).collect();
    phrase.push(' ');
    phrase
}
