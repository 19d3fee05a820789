// src/common/identity.rs

use core::fmt;

/// Capacity of the identity strings: four words of two bytes, each byte
/// taking at most two UTF-8 bytes once decoded.
pub const IDENTITY_CAPACITY: usize = 16;

pub type IdString = heapless::String<IDENTITY_CAPACITY>;

/// Raw product ID strings mapped to the model name printed on the unit.
pub const PRODUCT_ID_ALIASES: &[(&str, &str)] = &[("A342VD10", "M-A542VR1")];

/// Product and serial number as read from the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Model name, after alias substitution.
    pub product_id: IdString,
    /// Product ID exactly as decoded from the registers.
    pub product_id_raw: IdString,
    pub serial_number: IdString,
    pub product_words: [u16; 4],
    pub serial_words: [u16; 4],
}

impl IdentityRecord {
    /// Decodes both register blocks and applies the alias table.
    pub fn from_words(product_words: [u16; 4], serial_words: [u16; 4]) -> Self {
        let product_id_raw = decode_ascii_words(&product_words);
        let product_id = product_alias(&product_id_raw)
            .and_then(|alias| IdString::try_from(alias).ok())
            .unwrap_or_else(|| product_id_raw.clone());
        IdentityRecord {
            product_id,
            product_id_raw,
            serial_number: decode_ascii_words(&serial_words),
            product_words,
            serial_words,
        }
    }
}

impl fmt::Display for IdentityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (raw {}), S/N {}", self.product_id, self.product_id_raw, self.serial_number)
    }
}

/// Looks up the model name for a raw product ID.
pub fn product_alias(raw: &str) -> Option<&'static str> {
    PRODUCT_ID_ALIASES
        .iter()
        .find(|(known, _)| *known == raw)
        .map(|(_, alias)| *alias)
}

/// Decodes register words as text, low byte first, dropping NUL bytes and
/// trimming surrounding whitespace.
pub fn decode_ascii_words(words: &[u16]) -> IdString {
    let mut decoded = IdString::new();
    for word in words {
        let [low, high] = word.to_le_bytes();
        for byte in [low, high] {
            if byte == 0x00 {
                continue;
            }
            if decoded.push(char::from(byte)).is_err() {
                break;
            }
        }
    }

    let trimmed = decoded.trim();
    if trimmed.len() == decoded.len() {
        return decoded;
    }
    let mut out = IdString::new();
    // Cannot overflow: trimmed is a slice of a string of the same capacity.
    let _ = out.push_str(trimmed);
    out
}

/// Packs ASCII text into register words, low byte first, padding with NUL.
/// Bytes past the capacity of `N` words are dropped.
pub fn encode_ascii_words<const N: usize>(text: &str) -> [u16; N] {
    let mut words = [0u16; N];
    for (i, byte) in text.bytes().take(N * 2).enumerate() {
        if i % 2 == 0 {
            words[i / 2] |= u16::from(byte);
        } else {
            words[i / 2] |= u16::from(byte) << 8;
        }
    }
    words
}
