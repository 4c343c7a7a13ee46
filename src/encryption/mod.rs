//! PDF encryption support.
//!
//! Implements the standard security handler for writing (ISO 32000-1:2008,
//! Section 7.6.3) in three revisions, chosen from the target PDF version:
//!
//! - revision 2: RC4 with a 40-bit key (PDF 1.3)
//! - revision 3: RC4 with a 128-bit key (PDF 1.4 and 1.5)
//! - revision 4: AES-128 in CBC mode through the `AESV2` crypt filter (PDF 1.6+)
//!
//! Documents without a password use [`EncryptionHandler::Null`], which passes data
//! through and contributes nothing to the trailer.

mod aes;
mod algorithms;
mod permissions;
mod rc4;
mod standard;

pub use algorithms::{encode_password, pad_password, PADDING};
pub use permissions::{Permissions, RESERVED_PERMISSION_BITS};
pub use standard::StandardSecurityHandler;

/// Low-level ciphers, exposed so callers can verify output.
pub mod ciphers {
    pub use super::aes::{aes128_decrypt, aes128_encrypt};
    pub use super::rc4::rc4_crypt;
}

use crate::error::Result;
use crate::object::Stream;
use crate::writer::{EncryptionOptions, ObjectWriter, PdfVersion};
use std::io::Write;

/// Revision of the standard security handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    /// RC4, 40-bit key
    R2,
    /// RC4, 128-bit key
    R3,
    /// AES-128
    R4,
}

impl Revision {
    /// Pick the strongest revision `version` supports.
    pub fn for_version(version: PdfVersion) -> Self {
        if version >= PdfVersion::V1_6 {
            Revision::R4
        } else if version >= PdfVersion::V1_4 {
            Revision::R3
        } else {
            Revision::R2
        }
    }

    /// The `R` entry.
    pub fn number(self) -> i64 {
        match self {
            Revision::R2 => 2,
            Revision::R3 => 3,
            Revision::R4 => 4,
        }
    }

    /// The `V` entry.
    pub fn algorithm(self) -> i64 {
        match self {
            Revision::R2 => 1,
            Revision::R3 => 2,
            Revision::R4 => 4,
        }
    }

    /// Document key length in bytes.
    pub fn key_length(self) -> usize {
        match self {
            Revision::R2 => 5,
            Revision::R3 | Revision::R4 => 16,
        }
    }

    /// Whether records are encrypted with AES rather than RC4.
    pub fn is_aes(self) -> bool {
        self == Revision::R4
    }
}

/// Encryption applied to strings and streams while writing.
#[derive(Debug, Clone, Default)]
pub enum EncryptionHandler {
    /// No encryption
    #[default]
    Null,
    /// Password-based standard security handler
    Standard(StandardSecurityHandler),
}

impl EncryptionHandler {
    /// Derive the handler for a document.
    ///
    /// Without options the document is written in the clear.
    pub fn derive(
        file_id: &[u8; 16],
        version: PdfVersion,
        options: Option<&EncryptionOptions>,
    ) -> Result<Self> {
        match options {
            None => Ok(EncryptionHandler::Null),
            Some(options) => {
                let revision = Revision::for_version(version);
                log::debug!("Encrypting with standard security handler, revision {}", revision.number());
                Ok(EncryptionHandler::Standard(StandardSecurityHandler::new(
                    file_id, revision, options,
                )?))
            },
        }
    }

    /// Whether anything is actually encrypted.
    pub fn is_active(&self) -> bool {
        matches!(self, EncryptionHandler::Standard(_))
    }

    /// Encrypt data belonging to record `id`, generation `gen`.
    pub fn encrypt(&self, plaintext: &[u8], id: u32, gen: u16) -> Result<Vec<u8>> {
        match self {
            EncryptionHandler::Null => Ok(plaintext.to_vec()),
            EncryptionHandler::Standard(handler) => handler.encrypt(plaintext, id, gen),
        }
    }

    /// Whether the payload of `stream` is encrypted.
    pub fn encrypts_stream(&self, stream: &Stream) -> bool {
        match self {
            EncryptionHandler::Null => false,
            EncryptionHandler::Standard(handler) => handler.encrypts_stream(stream),
        }
    }

    /// Write the encrypt dictionary entries into an open dictionary.
    pub fn write_dictionary_entries<W: Write>(&self, writer: &mut ObjectWriter<W>) -> Result<()> {
        match self {
            EncryptionHandler::Null => Ok(()),
            EncryptionHandler::Standard(handler) => handler.write_dictionary_entries(writer),
        }
    }
}
