// Address derivation: loop index -> 32-byte payload -> SS58 address

use blake2::{Blake2b512, Digest};

use super::error::{DomainError, Result};

/// Width of the hex payload, excluding the `0x` prefix (32 bytes)
pub const HEX_PAYLOAD_WIDTH: usize = 64;

/// Generic Substrate network format, the keyring default
pub const DEFAULT_SS58_FORMAT: u16 = 42;

/// Highest network format representable by the two-byte prefix
pub const MAX_SS58_FORMAT: u16 = 16383;

const SS58_CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const RESERVED_FORMATS: [u16; 2] = [46, 47];
const ALLOWED_KEY_LENGTHS: [usize; 6] = [1, 2, 4, 8, 32, 33];

/// Address derived for one loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAddress {
    pub index: u32,
    pub hex_payload: String,
    pub ss58: String,
}

impl std::fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.ss58)
    }
}

/// Render `index` as a `0x`-prefixed, zero-padded 64-digit lowercase hex string
pub fn hex_payload(index: u32) -> String {
    format!("0x{:0width$x}", index, width = HEX_PAYLOAD_WIDTH)
}

/// Decode a `0x`-prefixed hex string into raw bytes
pub fn decode_hex_payload(payload: &str) -> Result<Vec<u8>> {
    let digits = payload.strip_prefix("0x").unwrap_or(payload);
    hex::decode(digits).map_err(|e| DomainError::InvalidHex(e.to_string()))
}

/// Derive the SS58 address used as the `--args` value for `index`
///
/// Pure function of `(index, format)`.
pub fn derive_address(index: u32, format: u16) -> Result<DerivedAddress> {
    let hex_payload = hex_payload(index);
    let key = decode_hex_payload(&hex_payload)?;
    let ss58 = encode_ss58(&key, format)?;

    Ok(DerivedAddress {
        index,
        hex_payload,
        ss58,
    })
}

/// Encode public key bytes as an SS58 address for the given network format
///
/// # Errors
/// - `DomainError::InvalidKeyLength` unless the key is 1, 2, 4, 8, 32 or 33 bytes
/// - `DomainError::InvalidFormat` for formats above 16383 or the reserved 46/47
pub fn encode_ss58(public_key: &[u8], format: u16) -> Result<String> {
    if !ALLOWED_KEY_LENGTHS.contains(&public_key.len()) {
        return Err(DomainError::InvalidKeyLength(public_key.len()));
    }
    if format > MAX_SS58_FORMAT || RESERVED_FORMATS.contains(&format) {
        return Err(DomainError::InvalidFormat(format));
    }

    let mut body = format_prefix(format);
    body.extend_from_slice(public_key);

    let checksum_len = if public_key.len() >= 32 { 2 } else { 1 };
    let hash = ss58_hash(&body);
    body.extend_from_slice(&hash[..checksum_len]);

    Ok(bs58::encode(body).into_string())
}

fn format_prefix(format: u16) -> Vec<u8> {
    if format < 64 {
        vec![format as u8]
    } else {
        vec![
            (((format & 0b1111_1100) >> 2) as u8) | 0b0100_0000,
            ((format >> 8) as u8) | (((format & 0b0000_0011) as u8) << 6),
        ]
    }
}

fn ss58_hash(data: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CHECKSUM_PREFIX);
    hasher.update(data);
    hasher.finalize().to_vec()
}
