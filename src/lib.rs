// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]

//! # PDF Quill
//!
//! PDF writer with an arena object model, cross-storage reference resolution and
//! the standard security handler (revisions 2, 3 and 4).
//!
//! ## Core Features
//!
//! - **Object Model**: every PDF value type, with insertion-ordered dictionaries
//! - **Storages**: id-indexed record tables; cycles are plain integer references
//! - **Resolver**: merges records from independent storages, deduplicating shared
//!   records and moving nested streams into records of their own
//! - **Token Writer**: byte-exact PDF tokens with minimal whitespace and offset tracking
//! - **Encryption**: RC4 40/128-bit and AES-128 with per-record keys
//! - **Assembler**: pages, page tree, information dictionary, catalog, xref and trailer
//!
//! ## Quick Start
//!
//! ```
//! use pdf_quill::{ObjectStorage, Object, PdfWriter, PdfWriterOptions};
//!
//! let mut pdf = PdfWriter::to_vec(PdfWriterOptions::new())?;
//!
//! // A resource built in its own storage, shared by two pages.
//! let mut shared = ObjectStorage::new();
//! let gs = shared.add_object(Object::dict(vec![("Type", Object::name("ExtGState"))]));
//! pdf.register_storage(shared);
//!
//! for _ in 0..2 {
//!     pdf.add_page(612.0, 792.0)
//!         .add_resource("ExtGState", "GS1", Object::Reference(gs))?;
//! }
//! let bytes = pdf.finish()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok::<(), pdf_quill::Error>(())
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Object model
pub mod object;

// Page boxes
pub mod geometry;

// Record tables and the reference resolver
pub mod storage;

// Standard security handler
pub mod encryption;

// Token writer and document assembly
pub mod writer;

pub use error::{Error, Result};
pub use object::{Dictionary, Number, Object, ObjectRef, Stream};
pub use storage::{ObjectStorage, Resolver, StorageId, StoragePool, SweepStats};
pub use writer::{
    DocumentInformation, EncryptionOptions, ObjectWriter, PageWriter, PdfVersion, PdfWriter,
    PdfWriterOptions, RasterImage,
};
