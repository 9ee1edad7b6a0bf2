//! Fixed-width bit packing over the alphabet of a text.
//!
//! Every distinct character gets a code of the same width,
//! `bits_per_char = max(1, ceil(log2(n_distinct)))`. Codes are assigned in
//! ascending codepoint order starting at 0, so the same text always yields
//! the same table and the same packed bytes.
//!
//! # Layout
//!
//! ```text
//! "aabbbcc"  ->  a=00 b=01 c=10
//!            ->  00 00 01 01 | 01 10 10 00   (2 padding bits)
//!            ->  [0x05, 0x68]
//! ```
//!
//! A single-symbol alphabet still uses 1 bit per character: a zero-width
//! code would make the packed length independent of the text length.
//!
//! There is no decoder. `CodeTable::symbol` and the metadata are enough to
//! reverse the mapping; the tests do exactly that with a `BitReader`.

use serde::Serialize;

use crate::bitio::BitWriter;

/// Code assignment for one text: sorted distinct characters, one fixed-width
/// code each. The code of a character is its index in `symbols`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CodeTable {
    symbols: Vec<char>,
    width: u8,
}

impl CodeTable {
    /// Build the table for `text`. Empty text gives an empty, zero-width table.
    pub fn from_text(text: &str) -> Self {
        let mut symbols: Vec<char> = text.chars().collect();
        symbols.sort_unstable();
        symbols.dedup();

        let width = code_width(symbols.len());
        Self { symbols, width }
    }

    /// Code for `ch`, or `None` if the character is not in the table.
    pub fn code(&self, ch: char) -> Option<u32> {
        self.symbols.binary_search(&ch).ok().map(|idx| idx as u32)
    }

    /// Code for `ch` rendered as a `width`-digit binary string.
    pub fn code_string(&self, ch: char) -> Option<String> {
        self.code(ch)
            .map(|code| format!("{:0width$b}", code, width = self.width as usize))
    }

    /// Reverse lookup: the character a code stands for.
    pub fn symbol(&self, code: u32) -> Option<char> {
        self.symbols.get(code as usize).copied()
    }

    /// `(character, code string)` pairs in code order.
    pub fn entries(&self) -> impl Iterator<Item = (char, String)> + '_ {
        self.symbols.iter().enumerate().map(move |(code, &ch)| {
            (ch, format!("{:0width$b}", code, width = self.width as usize))
        })
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Everything needed to reverse a packing: table, width, padding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EncodingMetadata {
    pub table: CodeTable,
    pub bits_per_char: u8,
    /// Trailing zero bits added to reach a byte boundary (0-7)
    pub padding_bits: u8,
    pub n_distinct_chars: usize,
}

impl EncodingMetadata {
    /// Meaningful bits for a text of `char_count` characters.
    pub fn packed_bits(&self, char_count: usize) -> usize {
        char_count * self.bits_per_char as usize
    }

    /// Whether `compressed_len` bytes match `char_count` characters under
    /// this metadata.
    pub fn is_consistent(&self, char_count: usize, compressed_len: usize) -> bool {
        self.padding_bits < 8
            && self.table.width() == self.bits_per_char
            && self.table.len() == self.n_distinct_chars
            && compressed_len * 8 == self.packed_bits(char_count) + self.padding_bits as usize
    }
}

/// Minimum fixed code width for an alphabet of `n` symbols.
///
/// 0 for an empty alphabet, 1 for a single symbol, `ceil(log2(n))` otherwise.
pub fn code_width(n: usize) -> u8 {
    match n {
        0 => 0,
        1 => 1,
        n => (usize::BITS - (n - 1).leading_zeros()) as u8,
    }
}

/// Pack `text` with its own minimal fixed-width code table.
///
/// Returns the packed bytes (MSB-first, zero padded) and the metadata that
/// describes them.
pub fn encode(text: &str) -> (Vec<u8>, EncodingMetadata) {
    if text.is_empty() {
        return (Vec::new(), EncodingMetadata::default());
    }

    let table = CodeTable::from_text(text);
    let width = table.width();

    let mut writer = BitWriter::with_capacity_bits(text.len() * width as usize);
    for ch in text.chars() {
        let code = table
            .code(ch)
            .unwrap_or_else(|| unreachable!("code table built from the same text"));
        writer
            .write_bits(code as u64, width as usize)
            .unwrap_or_else(|e| unreachable!("code width {width} within 64 bits: {e}"));
    }
    let packed = writer.finish();

    let metadata = EncodingMetadata {
        n_distinct_chars: table.len(),
        bits_per_char: width,
        padding_bits: packed.padding_bits,
        table,
    };

    (packed.bytes, metadata)
}
