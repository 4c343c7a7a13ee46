//! Writer configuration.

use super::object_writer::DEFAULT_MAX_LINE_WIDTH;
use crate::encryption::Permissions;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::str::FromStr;

/// Narrowest line width the writer accepts.
const MIN_LINE_WIDTH: usize = 16;

/// Supported output versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PdfVersion {
    /// PDF 1.3
    V1_3,
    /// PDF 1.4
    V1_4,
    /// PDF 1.5
    V1_5,
    /// PDF 1.6
    V1_6,
    /// PDF 1.7
    #[default]
    V1_7,
}

impl PdfVersion {
    /// Version as written in the header, e.g. `1.7`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PdfVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.3" => Ok(PdfVersion::V1_3),
            "1.4" => Ok(PdfVersion::V1_4),
            "1.5" => Ok(PdfVersion::V1_5),
            "1.6" => Ok(PdfVersion::V1_6),
            "1.7" => Ok(PdfVersion::V1_7),
            other => Err(Error::UnsupportedVersion(format!(
                "{} is not in the supported range (1.3 - 1.7)",
                other
            ))),
        }
    }
}

/// Password protection settings.
#[derive(Debug, Clone)]
pub struct EncryptionOptions {
    /// Password needed to open the document
    pub user_password: String,
    /// Password granting full access; the user password when unset
    pub owner_password: Option<String>,
    /// What the user password permits
    pub permissions: Permissions,
    /// Whether metadata streams are encrypted too
    pub encrypt_metadata: bool,
    /// Use a fixed filler instead of random bytes in the `U` entry
    pub deterministic: bool,
}

impl EncryptionOptions {
    /// Protect the document with `user_password`, allowing everything.
    pub fn new(user_password: impl Into<String>) -> Self {
        Self {
            user_password: user_password.into(),
            owner_password: None,
            permissions: Permissions::allow_everything(),
            encrypt_metadata: true,
            deterministic: false,
        }
    }

    /// Set a separate owner password.
    pub fn with_owner_password(mut self, password: impl Into<String>) -> Self {
        self.owner_password = Some(password.into());
        self
    }

    /// Restrict what the user password permits.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Choose whether metadata streams are encrypted.
    pub fn with_encrypt_metadata(mut self, encrypt: bool) -> Self {
        self.encrypt_metadata = encrypt;
        self
    }

    /// Replace the random `U` entry filler with zeros.
    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }
}

/// Options for [`PdfWriter`](super::PdfWriter).
#[derive(Debug, Clone)]
pub struct PdfWriterOptions {
    /// Output version
    pub version: PdfVersion,
    /// Encryption, if any
    pub encryption: Option<EncryptionOptions>,
    /// Fixed file identifier instead of a random one
    pub file_identifier: Option<[u8; 16]>,
    /// Fixed creation and modification date instead of the current time
    pub timestamp: Option<DateTime<FixedOffset>>,
    max_line_width: usize,
}

impl Default for PdfWriterOptions {
    fn default() -> Self {
        Self {
            version: PdfVersion::default(),
            encryption: None,
            file_identifier: None,
            timestamp: None,
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
        }
    }
}

impl PdfWriterOptions {
    /// Default options: PDF 1.7, unencrypted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output version.
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    /// Encrypt the document.
    pub fn with_encryption(mut self, encryption: EncryptionOptions) -> Self {
        self.encryption = Some(encryption);
        self
    }

    /// Use a fixed file identifier.
    pub fn with_file_identifier(mut self, identifier: [u8; 16]) -> Self {
        self.file_identifier = Some(identifier);
        self
    }

    /// Use a fixed creation and modification date.
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Line width after which value separators become newlines.
    pub fn max_line_width(&self) -> usize {
        self.max_line_width
    }

    /// Set the maximum line width, at least 16.
    pub fn with_max_line_width(mut self, width: usize) -> Result<Self> {
        if width < MIN_LINE_WIDTH {
            return Err(Error::InvalidArgument(format!(
                "line width must be at least {}, got {}",
                MIN_LINE_WIDTH, width
            )));
        }
        self.max_line_width = width;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!("1.3".parse::<PdfVersion>().unwrap(), PdfVersion::V1_3);
        assert_eq!("1.7".parse::<PdfVersion>().unwrap(), PdfVersion::V1_7);
        assert!(matches!("1.2".parse::<PdfVersion>(), Err(Error::UnsupportedVersion(_))));
        assert!(matches!("2.0".parse::<PdfVersion>(), Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_version_ordering_and_display() {
        assert!(PdfVersion::V1_4 < PdfVersion::V1_6);
        assert_eq!(PdfVersion::V1_5.to_string(), "1.5");
    }

    #[test]
    fn test_defaults() {
        let options = PdfWriterOptions::default();
        assert_eq!(options.version, PdfVersion::V1_7);
        assert!(options.encryption.is_none());
        assert_eq!(options.max_line_width(), 255);

        let encryption = EncryptionOptions::new("pw");
        assert!(encryption.owner_password.is_none());
        assert!(encryption.encrypt_metadata);
        assert_eq!(encryption.permissions, Permissions::allow_everything());
    }

    #[test]
    fn test_line_width_lower_bound() {
        assert!(PdfWriterOptions::new().with_max_line_width(15).is_err());
        assert_eq!(PdfWriterOptions::new().with_max_line_width(16).unwrap().max_line_width(), 16);
    }
}
