//! Standard security handler state for one document.

use super::aes::aes128_encrypt;
use super::algorithms;
use super::rc4::rc4_crypt;
use super::Revision;
use crate::error::Result;
use crate::object::Stream;
use crate::writer::{EncryptionOptions, ObjectWriter};
use rand::rngs::OsRng;
use rand::RngCore;
use std::io::Write;

/// Derived keys and dictionary entries of the standard security handler.
#[derive(Debug, Clone)]
pub struct StandardSecurityHandler {
    revision: Revision,
    encryption_key: Vec<u8>,
    owner_entry: Vec<u8>,
    user_entry: Vec<u8>,
    p_value: i32,
    encrypt_metadata: bool,
}

impl StandardSecurityHandler {
    /// Derive every key for `revision` from the passwords in `options`.
    pub fn new(file_id: &[u8; 16], revision: Revision, options: &EncryptionOptions) -> Result<Self> {
        let user_password = algorithms::encode_password(&options.user_password)?;
        let owner_password = match &options.owner_password {
            Some(owner) => algorithms::encode_password(owner)?,
            None => user_password.clone(),
        };

        let p_value = options.permissions.to_p_value(revision);
        let owner_entry = algorithms::compute_owner_entry(&owner_password, &user_password, revision);
        let encryption_key = algorithms::compute_encryption_key(
            &user_password,
            &owner_entry,
            p_value,
            file_id,
            revision,
            options.encrypt_metadata,
        );

        let mut filler = [0u8; 16];
        if !options.deterministic {
            OsRng.fill_bytes(&mut filler);
        }
        let user_entry = algorithms::compute_user_entry(&encryption_key, file_id, revision, &filler);

        Ok(Self {
            revision,
            encryption_key,
            owner_entry,
            user_entry,
            p_value,
            encrypt_metadata: options.encrypt_metadata,
        })
    }

    /// Handler revision.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Document encryption key.
    pub fn encryption_key(&self) -> &[u8] {
        &self.encryption_key
    }

    /// The `O` entry.
    pub fn owner_entry(&self) -> &[u8] {
        &self.owner_entry
    }

    /// The `U` entry.
    pub fn user_entry(&self) -> &[u8] {
        &self.user_entry
    }

    /// The `P` entry.
    pub fn p_value(&self) -> i32 {
        self.p_value
    }

    /// Key used for the strings and streams of one record.
    pub fn object_key(&self, id: u32, gen: u16) -> Vec<u8> {
        algorithms::compute_object_key(&self.encryption_key, id, gen, self.revision.is_aes())
    }

    /// Whether the payload of `stream` is encrypted.
    ///
    /// Metadata streams stay in the clear once `EncryptMetadata` is false.
    pub fn encrypts_stream(&self, stream: &Stream) -> bool {
        if self.revision < Revision::R4 || self.encrypt_metadata {
            return true;
        }
        stream.dict.get("Type").and_then(|value| value.as_name()) != Some("Metadata")
    }

    /// Encrypt data of record `id`, generation `gen`.
    ///
    /// AES output is prefixed with its freshly generated 16-byte IV.
    pub fn encrypt(&self, plaintext: &[u8], id: u32, gen: u16) -> Result<Vec<u8>> {
        let key = self.object_key(id, gen);
        if !self.revision.is_aes() {
            return Ok(rc4_crypt(&key, plaintext));
        }

        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut iv);
        let ciphertext = aes128_encrypt(&key, &iv, plaintext)?;

        let mut output = Vec::with_capacity(iv.len() + ciphertext.len());
        output.extend_from_slice(&iv);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Write `Filter`, `V`, `R`, `O`, `U`, `P` and the revision specific entries.
    pub fn write_dictionary_entries<W: Write>(&self, writer: &mut ObjectWriter<W>) -> Result<()> {
        writer.write_name("Filter")?;
        writer.write_name("Standard")?;
        writer.write_name("V")?;
        writer.write_number(self.revision.algorithm())?;
        writer.write_name("R")?;
        writer.write_number(self.revision.number())?;
        writer.write_name("O")?;
        writer.write_hex_string(&self.owner_entry)?;
        writer.write_name("U")?;
        writer.write_hex_string(&self.user_entry)?;
        writer.write_name("P")?;
        writer.write_number(self.p_value)?;

        if self.revision >= Revision::R3 {
            writer.write_name("Length")?;
            writer.write_number(128)?;
        }

        if self.revision == Revision::R4 {
            writer.write_name("CF")?;
            writer.start_dictionary()?;
            writer.write_name("StdCF")?;
            writer.start_dictionary()?;
            writer.write_name("CFM")?;
            writer.write_name("AESV2")?;
            writer.write_name("Length")?;
            writer.write_number(16)?;
            writer.write_name("AuthEvent")?;
            writer.write_name("DocOpen")?;
            writer.end_dictionary()?;
            writer.end_dictionary()?;
            writer.write_name("StmF")?;
            writer.write_name("StdCF")?;
            writer.write_name("StrF")?;
            writer.write_name("StdCF")?;

            if !self.encrypt_metadata {
                writer.write_name("EncryptMetadata")?;
                writer.write_boolean(false)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::ciphers::aes128_decrypt;
    use crate::encryption::Permissions;

    fn handler(revision: Revision, options: &EncryptionOptions) -> StandardSecurityHandler {
        StandardSecurityHandler::new(&[0x11; 16], revision, options).unwrap()
    }

    #[test]
    fn test_rc4_roundtrip_per_revision() {
        let options = EncryptionOptions::new("secret");
        for revision in [Revision::R2, Revision::R3] {
            let handler = handler(revision, &options);
            let ciphertext = handler.encrypt(b"Hello", 7, 0).unwrap();
            assert_eq!(rc4_crypt(&handler.object_key(7, 0), &ciphertext), b"Hello");
        }
    }

    #[test]
    fn test_aes_roundtrip() {
        let handler = handler(Revision::R4, &EncryptionOptions::new(""));
        let ciphertext = handler.encrypt(b"Hello, AES", 4, 0).unwrap();
        assert_eq!(ciphertext.len(), 32);

        let (iv, body) = ciphertext.split_at(16);
        let plaintext = aes128_decrypt(&handler.object_key(4, 0), iv, body).unwrap();
        assert_eq!(plaintext, b"Hello, AES");
    }

    #[test]
    fn test_aes_uses_fresh_iv() {
        let handler = handler(Revision::R4, &EncryptionOptions::new("a"));
        let first = handler.encrypt(b"same", 1, 0).unwrap();
        let second = handler.encrypt(b"same", 1, 0).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_deterministic_user_entry() {
        let options = EncryptionOptions::new("user").with_deterministic(true);
        let a = handler(Revision::R3, &options);
        let b = handler(Revision::R3, &options);
        assert_eq!(a.user_entry(), b.user_entry());
        assert_eq!(&a.user_entry()[16..], &[0u8; 16]);
    }

    #[test]
    fn test_owner_password_defaults_to_user_password() {
        let implicit = handler(Revision::R3, &EncryptionOptions::new("pw"));
        let explicit = handler(
            Revision::R3,
            &EncryptionOptions::new("pw").with_owner_password("pw"),
        );
        assert_eq!(implicit.owner_entry(), explicit.owner_entry());
        assert_eq!(implicit.encryption_key(), explicit.encryption_key());
    }

    #[test]
    fn test_permissions_feed_key_derivation() {
        let open = handler(Revision::R3, &EncryptionOptions::new("pw"));
        let closed = handler(
            Revision::R3,
            &EncryptionOptions::new("pw").with_permissions(Permissions::allow_nothing()),
        );
        assert_eq!(open.p_value(), -4);
        assert_eq!(closed.p_value(), -3904);
        assert_ne!(open.encryption_key(), closed.encryption_key());
    }

    #[test]
    fn test_long_password_is_rejected() {
        let options = EncryptionOptions::new("x".repeat(33));
        assert!(StandardSecurityHandler::new(&[0; 16], Revision::R3, &options).is_err());
    }

    #[test]
    fn test_metadata_stream_predicate() {
        let mut dict = crate::object::Dictionary::new();
        dict.insert("Type".to_string(), crate::object::Object::name("Metadata"));
        let metadata = Stream::new(dict, &b"<xmp/>"[..]);
        let content = Stream::from_data(&b"0 g"[..]);

        let clear = EncryptionOptions::new("pw").with_encrypt_metadata(false);
        let r4 = handler(Revision::R4, &clear);
        assert!(!r4.encrypts_stream(&metadata));
        assert!(r4.encrypts_stream(&content));

        assert!(handler(Revision::R3, &clear).encrypts_stream(&metadata));
        assert!(handler(Revision::R4, &EncryptionOptions::new("pw")).encrypts_stream(&metadata));
    }

    #[test]
    fn test_r4_dictionary_entries() {
        let handler = handler(Revision::R4, &EncryptionOptions::new("pw"));
        let mut writer = ObjectWriter::new(Vec::new());
        writer.start_dictionary().unwrap();
        handler.write_dictionary_entries(&mut writer).unwrap();
        writer.end_dictionary().unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.starts_with("<</Filter /Standard /V 4 /R 4 /O<"));
        assert!(output.contains(">/P -4 /Length 128 /CF<</StdCF<</CFM /AESV2 /Length 16"));
        assert!(output.contains("/StmF /StdCF"));
        assert!(output.ends_with("/StdCF>>"));
    }

    #[test]
    fn test_r2_dictionary_has_no_length() {
        let handler = handler(Revision::R2, &EncryptionOptions::new("pw"));
        let mut writer = ObjectWriter::new(Vec::new());
        handler.write_dictionary_entries(&mut writer).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.starts_with("/Filter /Standard /V 1 /R 2"));
        assert!(!output.contains("/Length"));
    }
}
