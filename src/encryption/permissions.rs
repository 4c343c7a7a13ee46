//! User access permissions (the `P` entry).

use super::Revision;

/// Bits with no assigned permission. Conforming readers expect them set in `P`.
pub const RESERVED_PERMISSION_BITS: u32 = 0xFFFF_F0C0;

const PRINT: u32 = 1 << 2;
const MODIFY: u32 = 1 << 3;
const COPY: u32 = 1 << 4;
const ANNOTATE: u32 = 1 << 5;
const FILL_IN_FORMS: u32 = 1 << 8;
const EXTRACT_FOR_ACCESSIBILITY: u32 = 1 << 9;
const ASSEMBLE: u32 = 1 << 10;
const PRINT_HIGH_RESOLUTION: u32 = 1 << 11;

/// What a user opening the document with the user password may do.
///
/// `print_high_resolution`, `fill_in_forms`, `extract_for_accessibility` and
/// `assemble` only exist from revision 3 on and are dropped when packing for
/// revision 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    /// Print the document
    pub print: bool,
    /// Print at full resolution rather than a degraded rendition
    pub print_high_resolution: bool,
    /// Modify the contents
    pub modify: bool,
    /// Copy or extract text and graphics
    pub copy: bool,
    /// Add or modify annotations and fill in forms
    pub annotate: bool,
    /// Fill in existing form fields
    pub fill_in_forms: bool,
    /// Extract text and graphics for accessibility
    pub extract_for_accessibility: bool,
    /// Insert, rotate or delete pages
    pub assemble: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self::allow_everything()
    }
}

impl Permissions {
    /// Every permission granted.
    pub fn allow_everything() -> Self {
        Self {
            print: true,
            print_high_resolution: true,
            modify: true,
            copy: true,
            annotate: true,
            fill_in_forms: true,
            extract_for_accessibility: true,
            assemble: true,
        }
    }

    /// Every permission denied.
    pub fn allow_nothing() -> Self {
        Self {
            print: false,
            print_high_resolution: false,
            modify: false,
            copy: false,
            annotate: false,
            fill_in_forms: false,
            extract_for_accessibility: false,
            assemble: false,
        }
    }

    /// Pack the documented permission bits for `revision`.
    pub fn to_bits(&self, revision: Revision) -> u32 {
        let mut bits = 0;
        let mut set = |flag: bool, bit: u32| {
            if flag {
                bits |= bit;
            }
        };

        set(self.print, PRINT);
        set(self.modify, MODIFY);
        set(self.copy, COPY);
        set(self.annotate, ANNOTATE);

        if revision >= Revision::R3 {
            set(self.fill_in_forms, FILL_IN_FORMS);
            set(self.extract_for_accessibility, EXTRACT_FOR_ACCESSIBILITY);
            set(self.assemble, ASSEMBLE);
            set(self.print_high_resolution, PRINT_HIGH_RESOLUTION);
        }

        bits
    }

    /// The signed `P` value: documented bits plus [`RESERVED_PERMISSION_BITS`].
    pub fn to_p_value(&self, revision: Revision) -> i32 {
        (self.to_bits(revision) | RESERVED_PERMISSION_BITS) as i32
    }
}
