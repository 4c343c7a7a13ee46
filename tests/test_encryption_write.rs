//! Integration tests for encryption on write.
//!
//! Covers:
//! - Key derivation for revisions 2, 3 and 4, checked by authenticating the user password
//! - Encrypt/decrypt round trips with per-record keys
//! - Permission packing
//! - Encrypt dictionary in the trailer of written documents

use md5::{Digest, Md5};
use pdf_quill::encryption::ciphers::{aes128_decrypt, rc4_crypt};
use pdf_quill::encryption::{
    pad_password, EncryptionHandler, Permissions, Revision, StandardSecurityHandler, PADDING,
};
use pdf_quill::writer::{EncryptionOptions, PdfVersion, PdfWriter, PdfWriterOptions};
use pdf_quill::{Dictionary, Error, Object};

const FILE_ID: [u8; 16] = [
    0x3a, 0x91, 0x07, 0x5c, 0xee, 0x12, 0x48, 0x0d, 0x9f, 0x61, 0x2b, 0xc4, 0x75, 0x08, 0xd3, 0x5e,
];

const REVISIONS: [Revision; 3] = [Revision::R2, Revision::R3, Revision::R4];

fn handler(revision: Revision, options: &EncryptionOptions) -> StandardSecurityHandler {
    StandardSecurityHandler::new(&FILE_ID, revision, options).unwrap()
}

/// Rebuild the document key from the user password the way a reader does.
fn reader_key(handler: &StandardSecurityHandler, user_password: &[u8]) -> Vec<u8> {
    let revision = handler.revision();
    let length = revision.key_length();

    let mut hasher = Md5::new();
    hasher.update(pad_password(user_password));
    hasher.update(handler.owner_entry());
    hasher.update(handler.p_value().to_le_bytes());
    hasher.update(FILE_ID);
    let mut key = hasher.finalize().to_vec();
    if revision >= Revision::R3 {
        for _ in 0..50 {
            key = Md5::digest(&key[..length]).to_vec();
        }
    }
    key.truncate(length);
    key
}

/// Check the `U` entry against a candidate key the way a reader does.
fn user_entry_matches(handler: &StandardSecurityHandler, key: &[u8]) -> bool {
    if handler.revision() == Revision::R2 {
        return rc4_crypt(key, &PADDING) == handler.user_entry();
    }

    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(FILE_ID);
    let mut check = rc4_crypt(key, &hasher.finalize());
    for round in 1..=19u8 {
        let round_key: Vec<u8> = key.iter().map(|byte| byte ^ round).collect();
        check = rc4_crypt(&round_key, &check);
    }
    check == handler.user_entry()[..16]
}

fn decrypt(handler: &StandardSecurityHandler, data: &[u8], id: u32, gen: u16) -> Vec<u8> {
    let key = handler.object_key(id, gen);
    if handler.revision() == Revision::R4 {
        aes128_decrypt(&key, &data[..16], &data[16..]).unwrap()
    } else {
        rc4_crypt(&key, data)
    }
}

mod key_derivation_tests {
    use super::*;

    #[test]
    fn test_user_password_authenticates() {
        for revision in REVISIONS {
            for password in ["", "user", "exactly-thirty-two-bytes-long!!!"] {
                let options = EncryptionOptions::new(password).with_owner_password("owner");
                let handler = handler(revision, &options);

                let key = reader_key(&handler, password.as_bytes());
                assert_eq!(key, handler.encryption_key(), "{:?} {:?}", revision, password);
                assert!(user_entry_matches(&handler, &key));
                assert_eq!(handler.user_entry().len(), 32);
                assert_eq!(handler.owner_entry().len(), 32);
            }
        }
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        for revision in REVISIONS {
            let handler = handler(revision, &EncryptionOptions::new("right"));
            let key = reader_key(&handler, b"wrong");
            assert!(!user_entry_matches(&handler, &key));
        }
    }

    #[test]
    fn test_owner_password_recovers_user_password() {
        let options = EncryptionOptions::new("user").with_owner_password("owner");
        for revision in [Revision::R3, Revision::R4] {
            let handler = handler(revision, &options);

            let mut owner_key = Md5::digest(pad_password(b"owner")).to_vec();
            for _ in 0..50 {
                owner_key = Md5::digest(&owner_key[..16]).to_vec();
            }
            owner_key.truncate(16);

            let mut user = handler.owner_entry().to_vec();
            for round in (0..=19u8).rev() {
                let round_key: Vec<u8> = owner_key.iter().map(|byte| byte ^ round).collect();
                user = rc4_crypt(&round_key, &user);
            }
            assert_eq!(user, pad_password(b"user"));
        }
    }

    #[test]
    fn test_key_lengths() {
        let options = EncryptionOptions::new("pw");
        assert_eq!(handler(Revision::R2, &options).encryption_key().len(), 5);
        assert_eq!(handler(Revision::R3, &options).encryption_key().len(), 16);
        assert_eq!(handler(Revision::R4, &options).encryption_key().len(), 16);
        assert_eq!(handler(Revision::R2, &options).object_key(1, 0).len(), 10);
        assert_eq!(handler(Revision::R3, &options).object_key(1, 0).len(), 16);
    }

    #[test]
    fn test_unsupported_passwords() {
        let too_long = "x".repeat(33);
        for password in ["日本", too_long.as_str()] {
            assert!(matches!(
                StandardSecurityHandler::new(&FILE_ID, Revision::R3, &EncryptionOptions::new(password)),
                Err(Error::UnsupportedPassword(_))
            ));
        }
        // Latin-1 beyond ASCII is fine.
        assert!(StandardSecurityHandler::new(&FILE_ID, Revision::R3, &EncryptionOptions::new("Grüße"))
            .is_ok());
    }

    #[test]
    fn test_deterministic_filler() {
        let options = EncryptionOptions::new("pw").with_deterministic(true);
        let first = handler(Revision::R3, &options);
        let second = handler(Revision::R3, &options);
        assert_eq!(first.user_entry(), second.user_entry());
        assert_eq!(&first.user_entry()[16..], &[0u8; 16]);
    }
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_per_revision() {
        let plaintexts: [&[u8]; 4] = [b"", b"x", b"Hello, encrypted world", &[0xAB; 100]];
        for revision in REVISIONS {
            for password in ["", "secret", "exactly-thirty-two-bytes-long!!!"] {
                let handler = handler(revision, &EncryptionOptions::new(password));
                for (id, gen) in [(1u32, 0u16), (7, 0), (0x01_23_45, 3)] {
                    for plaintext in plaintexts {
                        let encrypted = handler.encrypt(plaintext, id, gen).unwrap();
                        assert_eq!(decrypt(&handler, &encrypted, id, gen), plaintext);
                    }
                }
            }
        }
    }

    #[test]
    fn test_records_use_distinct_keys() {
        let handler = handler(Revision::R3, &EncryptionOptions::new("pw"));
        assert_ne!(handler.object_key(1, 0), handler.object_key(2, 0));
        assert_ne!(
            handler.encrypt(b"same", 1, 0).unwrap(),
            handler.encrypt(b"same", 2, 0).unwrap()
        );
    }

    #[test]
    fn test_aes_uses_fresh_iv() {
        let handler = handler(Revision::R4, &EncryptionOptions::new("pw"));
        let first = handler.encrypt(b"payload", 4, 0).unwrap();
        let second = handler.encrypt(b"payload", 4, 0).unwrap();
        assert_ne!(first[..16], second[..16]);
        assert_eq!(first.len(), 32);
    }
}

mod permission_tests {
    use super::*;

    #[test]
    fn test_packing() {
        for revision in REVISIONS {
            assert_eq!(Permissions::allow_nothing().to_bits(revision), 0);
        }
        assert_eq!(Permissions::allow_everything().to_bits(Revision::R2), 60);
        assert_eq!(Permissions::allow_everything().to_bits(Revision::R3), 3900);
    }

    #[test]
    fn test_single_flags() {
        let single = |set: fn(&mut Permissions)| {
            let mut permissions = Permissions::allow_nothing();
            set(&mut permissions);
            permissions.to_bits(Revision::R3)
        };
        assert_eq!(single(|p| p.print = true), 1 << 2);
        assert_eq!(single(|p| p.modify = true), 1 << 3);
        assert_eq!(single(|p| p.copy = true), 1 << 4);
        assert_eq!(single(|p| p.annotate = true), 1 << 5);
        assert_eq!(single(|p| p.fill_in_forms = true), 1 << 8);
        assert_eq!(single(|p| p.extract_for_accessibility = true), 1 << 9);
        assert_eq!(single(|p| p.assemble = true), 1 << 10);
        assert_eq!(single(|p| p.print_high_resolution = true), 1 << 11);
    }

    #[test]
    fn test_revision_3_bits_cleared_for_revision_2() {
        let mut permissions = Permissions::allow_nothing();
        permissions.assemble = true;
        assert_eq!(permissions.to_bits(Revision::R2), 0);
        assert_eq!(permissions.to_bits(Revision::R3), 1 << 10);
    }
}

mod document_tests {
    use super::*;
    use regex::bytes::Regex;

    fn encrypted_document(version: PdfVersion, options: EncryptionOptions) -> Vec<u8> {
        let options = PdfWriterOptions::new()
            .with_version(version)
            .with_file_identifier(FILE_ID)
            .with_encryption(options);
        let mut pdf = PdfWriter::to_vec(options).unwrap();
        pdf.document_information_mut().set("Title", "Classified").unwrap();
        pdf.add_page(200.0, 200.0).append_content(b"BT (visible) Tj ET");
        pdf.finish().unwrap()
    }

    #[test]
    fn test_revision_follows_version() {
        let cases = [
            (PdfVersion::V1_3, "/V 1 /R 2 "),
            (PdfVersion::V1_4, "/V 2 /R 3 "),
            (PdfVersion::V1_5, "/V 2 /R 3 "),
            (PdfVersion::V1_6, "/V 4 /R 4 "),
            (PdfVersion::V1_7, "/V 4 /R 4 "),
        ];
        for (version, expected) in cases {
            let bytes = encrypted_document(version, EncryptionOptions::new("pw"));
            let text = String::from_utf8_lossy(&bytes);
            assert!(text.contains("/Encrypt<</Filter /Standard "), "{}", version);
            assert!(text.contains(expected), "{} should contain {}", version, expected);
        }
    }

    #[test]
    fn test_content_is_not_in_the_clear() {
        for version in [PdfVersion::V1_3, PdfVersion::V1_4, PdfVersion::V1_7] {
            let bytes = encrypted_document(version, EncryptionOptions::new("pw"));
            let text = String::from_utf8_lossy(&bytes);
            assert!(!text.contains("visible"));
            assert!(!text.contains("Classified"));
        }
    }

    #[test]
    fn test_content_stream_decrypts() {
        let options = EncryptionOptions::new("pw").with_deterministic(true);
        let bytes = encrypted_document(PdfVersion::V1_7, options.clone());
        let handler = handler(Revision::R4, &options);

        // Page tree 1, page 2, content stream 3.
        let pattern = Regex::new(r"(?s)\n3 0 obj\n<</Length (\d+)>>\nstream\n").unwrap();
        let captures = pattern.captures(&bytes).unwrap();
        let length: usize = std::str::from_utf8(&captures[1]).unwrap().parse().unwrap();
        let start = captures.get(0).unwrap().end();

        let payload = &bytes[start..start + length];
        assert_eq!(decrypt(&handler, payload, 3, 0), b"BT (visible) Tj ET");
        assert!(bytes[start + length..].starts_with(b"\nendstream"));
    }

    #[test]
    fn test_metadata_flag() {
        let bytes = encrypted_document(
            PdfVersion::V1_7,
            EncryptionOptions::new("pw").with_encrypt_metadata(false),
        );
        // The encrypt dictionary runs past the line width, so separators may be newlines.
        let entry = Regex::new(r"/EncryptMetadata\sfalse").unwrap();
        assert!(entry.is_match(&bytes));

        let bytes = encrypted_document(PdfVersion::V1_7, EncryptionOptions::new("pw"));
        assert!(!String::from_utf8_lossy(&bytes).contains("/EncryptMetadata"));
    }

    fn document_with_metadata(version: PdfVersion, options: EncryptionOptions) -> Vec<u8> {
        let options = PdfWriterOptions::new()
            .with_version(version)
            .with_file_identifier(FILE_ID)
            .with_encryption(options);
        let mut pdf = PdfWriter::to_vec(options).unwrap();
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("Metadata"));
        dict.insert("Subtype".to_string(), Object::name("XML"));
        pdf.objects_mut()
            .add_object(Object::stream(dict, &b"<x:xmpmeta>PLAINXMP</x:xmpmeta>"[..]));
        pdf.add_page(200.0, 200.0).append_content(b"BT (visible) Tj ET");
        pdf.finish().unwrap()
    }

    fn contains(bytes: &[u8], needle: &[u8]) -> bool {
        bytes.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn test_metadata_stream_left_in_clear() {
        let bytes = document_with_metadata(
            PdfVersion::V1_7,
            EncryptionOptions::new("pw").with_encrypt_metadata(false),
        );
        // Page tree 1, page 2, contents 3, metadata 4.
        assert!(contains(
            &bytes,
            b"4 0 obj\n<</Type /Metadata /Subtype /XML /Length 31>>\nstream\n<x:xmpmeta>PLAINXMP</x:xmpmeta>\nendstream"
        ));
        // Other streams are still encrypted.
        assert!(!contains(&bytes, b"(visible)"));
    }

    #[test]
    fn test_metadata_stream_encrypted_by_default() {
        for version in [PdfVersion::V1_4, PdfVersion::V1_7] {
            let bytes = document_with_metadata(version, EncryptionOptions::new("pw"));
            assert!(!contains(&bytes, b"PLAINXMP"), "{}", version);
        }

        // Below revision 4 the flag has no dictionary entry, so metadata stays encrypted.
        let bytes = document_with_metadata(
            PdfVersion::V1_4,
            EncryptionOptions::new("pw").with_encrypt_metadata(false),
        );
        assert!(!contains(&bytes, b"PLAINXMP"));
    }

    #[test]
    fn test_trailer_permissions() {
        let bytes = encrypted_document(
            PdfVersion::V1_4,
            EncryptionOptions::new("pw").with_permissions(Permissions::allow_nothing()),
        );
        let entry = Regex::new(r"/P\s-3904\s").unwrap();
        assert!(entry.is_match(&bytes));
    }

    #[test]
    fn test_handler_variant() {
        let options = PdfWriterOptions::new().with_encryption(EncryptionOptions::new("pw"));
        let pdf = PdfWriter::to_vec(options).unwrap();
        assert!(matches!(pdf.encryption(), EncryptionHandler::Standard(_)));

        let pdf = PdfWriter::to_vec(PdfWriterOptions::new()).unwrap();
        assert!(matches!(pdf.encryption(), EncryptionHandler::Null));
    }
}
