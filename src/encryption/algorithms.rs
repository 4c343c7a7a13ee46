//! Key derivation for the standard security handler, revisions 2 to 4.
//!
//! Everything here is a pure function of its inputs; the random parts of the
//! handler (user entry filler, AES IVs) are supplied by the caller.

use super::rc4::rc4_crypt;
use super::Revision;
use crate::error::{Error, Result};
use md5::{Digest, Md5};

/// Padding string every password is completed with.
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Salt appended to the per-record key input for AES.
const AES_SALT: &[u8; 4] = b"sAlT";

/// Hashed into the document key when metadata stays in the clear.
const METADATA_IN_CLEAR: [u8; 4] = [0xFF; 4];

/// Encode a password as Latin-1, rejecting anything that cannot be represented or
/// that exceeds 32 bytes.
pub fn encode_password(password: &str) -> Result<Vec<u8>> {
    let encoded = password
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| {
            Error::UnsupportedPassword("password must be representable in Latin-1".to_string())
        })?;

    if encoded.len() > 32 {
        return Err(Error::UnsupportedPassword(format!(
            "password is {} bytes long, at most 32 are allowed",
            encoded.len()
        )));
    }

    Ok(encoded)
}

/// Pad or truncate a password to exactly 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

/// MD5 of `input`, then 50 further rounds over the first `key_length` bytes for
/// revision 3 and above.
fn stretched_md5(input: &[&[u8]], revision: Revision, key_length: usize) -> Vec<u8> {
    let mut hasher = Md5::new();
    for part in input {
        hasher.update(part);
    }
    let mut hash = hasher.finalize().to_vec();

    if revision >= Revision::R3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_length]).to_vec();
        }
    }

    hash.truncate(key_length);
    hash
}

/// RC4 with `key`, then 19 more passes with every key byte XORed by the pass number.
fn rc4_twenty_passes(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut result = rc4_crypt(key, data);
    for round in 1..=19u8 {
        let round_key: Vec<u8> = key.iter().map(|byte| byte ^ round).collect();
        result = rc4_crypt(&round_key, &result);
    }
    result
}

/// Compute the `O` entry from the owner and user passwords.
pub fn compute_owner_entry(
    owner_password: &[u8],
    user_password: &[u8],
    revision: Revision,
) -> Vec<u8> {
    let key_length = revision.key_length();
    let owner_key = stretched_md5(&[&pad_password(owner_password)], revision, key_length);
    let padded_user = pad_password(user_password);

    if revision >= Revision::R3 {
        rc4_twenty_passes(&owner_key, &padded_user)
    } else {
        rc4_crypt(&owner_key, &padded_user)
    }
}

/// Compute the document encryption key.
///
/// `p_value` is the full `P` entry, reserved bits included.
pub fn compute_encryption_key(
    user_password: &[u8],
    owner_entry: &[u8],
    p_value: i32,
    file_id: &[u8],
    revision: Revision,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let padded = pad_password(user_password);
    let permissions = p_value.to_le_bytes();
    let mut input: Vec<&[u8]> = vec![&padded, owner_entry, &permissions, file_id];
    if revision >= Revision::R4 && !encrypt_metadata {
        input.push(&METADATA_IN_CLEAR);
    }

    stretched_md5(&input, revision, revision.key_length())
}

/// Compute the `U` entry.
///
/// For revision 3 and above the 16 bytes of `filler` complete the entry to 32 bytes.
pub fn compute_user_entry(
    encryption_key: &[u8],
    file_id: &[u8],
    revision: Revision,
    filler: &[u8; 16],
) -> Vec<u8> {
    if revision == Revision::R2 {
        return rc4_crypt(encryption_key, &PADDING);
    }

    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let hash = hasher.finalize();

    let mut entry = rc4_twenty_passes(encryption_key, &hash);
    entry.extend_from_slice(filler);
    entry
}

/// Derive the key for one record: MD5 of the document key, the low three bytes of
/// the id and the low two bytes of the generation, truncated to `min(16, n + 5)`.
pub fn compute_object_key(encryption_key: &[u8], id: u32, gen: u16, aes: bool) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(encryption_key);
    hasher.update(&id.to_le_bytes()[..3]);
    hasher.update(gen.to_le_bytes());
    if aes {
        hasher.update(AES_SALT);
    }
    let hash = hasher.finalize();

    hash[..(encryption_key.len() + 5).min(16)].to_vec()
}
