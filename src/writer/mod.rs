//! PDF writing.
//!
//! ## Architecture
//!
//! ```text
//! ObjectStorage (+ registered storages)
//!     ↓
//! [Resolver] (imports foreign records, promotes nested streams)
//!     ↓
//! [PdfWriter] (pages, page tree, info, catalog, xref, trailer)
//!     ↓
//! [ObjectSerializer] (object trees, encryption, id mapping)
//!     ↓
//! [ObjectWriter] (tokens, whitespace, offsets)
//!     ↓
//! PDF bytes
//! ```
//!
//! ## Example
//!
//! ```
//! use pdf_quill::object::Object;
//! use pdf_quill::writer::{EncryptionOptions, PdfVersion, PdfWriter, PdfWriterOptions};
//!
//! let options = PdfWriterOptions::new()
//!     .with_version(PdfVersion::V1_6)
//!     .with_encryption(EncryptionOptions::new("secret"));
//! let mut pdf = PdfWriter::to_vec(options)?;
//! let font = pdf.objects_mut().add_object(Object::dict(vec![
//!     ("Type", Object::name("Font")),
//!     ("Subtype", Object::name("Type1")),
//!     ("BaseFont", Object::name("Helvetica")),
//! ]));
//! pdf.add_page(595.0, 842.0)
//!     .add_resource("Font", "F1", Object::Reference(font))?
//!     .append_content(b"BT /F1 12 Tf 72 770 Td (Hello) Tj ET");
//! let bytes = pdf.finish()?;
//! assert!(bytes.ends_with(b"%%EOF\n"));
//! # Ok::<(), pdf_quill::Error>(())
//! ```

mod document_info;
mod image_handler;
mod object_serializer;
mod object_writer;
mod options;
mod page_writer;
mod pdf_writer;

pub use document_info::{encode_text_string, format_date, DocumentInformation};
pub use image_handler::{ColorSpace, RasterImage};
pub use object_serializer::ObjectSerializer;
pub use object_writer::{ObjectWriter, DEFAULT_MAX_LINE_WIDTH};
pub use options::{EncryptionOptions, PdfVersion, PdfWriterOptions};
pub use page_writer::PageWriter;
pub use pdf_writer::PdfWriter;
