//! PDF document writer.
//!
//! Assembles complete PDF documents: header, body, cross-reference table,
//! trailer and footer.
//!
//! ```
//! use pdf_quill::writer::{PdfWriter, PdfWriterOptions};
//!
//! let mut pdf = PdfWriter::to_vec(PdfWriterOptions::new())?;
//! pdf.add_page(612.0, 792.0).append_content(b"0 0 m 100 100 l S");
//! pdf.document_information_mut().set("Title", "Lines")?;
//! let bytes = pdf.finish()?;
//! assert!(bytes.starts_with(b"%PDF-1.7\n"));
//! # Ok::<(), pdf_quill::Error>(())
//! ```

use super::document_info::DocumentInformation;
use super::object_serializer::ObjectSerializer;
use super::object_writer::ObjectWriter;
use super::options::{PdfVersion, PdfWriterOptions};
use super::page_writer::PageWriter;
use crate::encryption::EncryptionHandler;
use crate::error::{Error, Result};
use crate::geometry::Rectangle;
use crate::object::Object;
use crate::storage::{ObjectStorage, Resolver, StorageId, StoragePool};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Binary marker written on the second line.
const BINARY_MARKER: &[u8] = b"%\xFF\xFF\xFF\xFF";

/// Document assembler over a byte sink.
pub struct PdfWriter<W: Write> {
    writer: ObjectWriter<W>,
    options: PdfWriterOptions,
    file_identifier: [u8; 16],
    encryption: EncryptionHandler,
    storage: ObjectStorage,
    pool: StoragePool,
    pages: Vec<PageWriter>,
    page_tree_id: u32,
    info: DocumentInformation,
}

impl PdfWriter<Vec<u8>> {
    /// Writer into memory.
    pub fn to_vec(options: PdfWriterOptions) -> Result<Self> {
        Self::new(Vec::new(), options)
    }
}

impl PdfWriter<BufWriter<File>> {
    /// Writer into a newly created file.
    pub fn to_file(path: impl AsRef<Path>, options: PdfWriterOptions) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), options)
    }
}

impl<W: Write> PdfWriter<W> {
    /// Start a document. The header is written immediately.
    pub fn new(sink: W, options: PdfWriterOptions) -> Result<Self> {
        let mut writer = ObjectWriter::new(sink).with_max_line_width(options.max_line_width());
        writer.write_raw_line(format!("%PDF-{}", options.version).as_bytes())?;
        writer.write_raw_line(BINARY_MARKER)?;

        let file_identifier = options.file_identifier.unwrap_or_else(|| {
            let mut identifier = [0u8; 16];
            OsRng.fill_bytes(&mut identifier);
            identifier
        });
        let encryption =
            EncryptionHandler::derive(&file_identifier, options.version, options.encryption.as_ref())?;
        let page_tree_id = writer.allocate_id();

        log::debug!("Started PDF {} document", options.version);

        Ok(Self {
            writer,
            options,
            file_identifier,
            encryption,
            storage: ObjectStorage::new(),
            pool: StoragePool::new(),
            pages: Vec::new(),
            page_tree_id,
            info: DocumentInformation::new(),
        })
    }

    /// Output version.
    pub fn version(&self) -> PdfVersion {
        self.options.version
    }

    /// File identifier written to the trailer.
    pub fn file_identifier(&self) -> &[u8; 16] {
        &self.file_identifier
    }

    /// Encryption in effect.
    pub fn encryption(&self) -> &EncryptionHandler {
        &self.encryption
    }

    /// Document storage.
    pub fn objects(&self) -> &ObjectStorage {
        &self.storage
    }

    /// Mutable document storage.
    pub fn objects_mut(&mut self) -> &mut ObjectStorage {
        &mut self.storage
    }

    /// Hand over an independently built storage so its records can be referenced.
    pub fn register_storage(&mut self, storage: ObjectStorage) -> StorageId {
        self.pool.insert(storage)
    }

    /// Add a page with a media box of the given size.
    pub fn add_page(&mut self, width: f64, height: f64) -> &mut PageWriter {
        let id = self.writer.allocate_id();
        let contents_id = self.writer.allocate_id();
        let index = self.pages.len();
        self.pages
            .push(PageWriter::new(id, contents_id, Rectangle::from_size(width, height)));
        &mut self.pages[index]
    }

    /// Page by position.
    pub fn page_mut(&mut self, index: usize) -> Option<&mut PageWriter> {
        self.pages.get_mut(index)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Information dictionary.
    pub fn document_information(&self) -> &DocumentInformation {
        &self.info
    }

    /// Mutable information dictionary.
    pub fn document_information_mut(&mut self) -> &mut DocumentInformation {
        &mut self.info
    }

    /// Write everything that is still outstanding and return the sink.
    pub fn finish(mut self) -> Result<W> {
        log::debug!(
            "Finishing document: {} pages, {} records, {} registered storages",
            self.pages.len(),
            self.storage.len(),
            self.pool.len()
        );

        let mut resources = Vec::with_capacity(self.pages.len());
        let mut resolver = Resolver::new(&mut self.storage, &self.pool);
        resolver.sweep_all()?;
        for page in &mut self.pages {
            resources.push(resolver.sweep_value(Object::Dictionary(page.take_resources()))?);
        }
        resolver.finish();

        let count = u32::try_from(self.storage.len())
            .map_err(|_| Error::InvalidArgument("too many records".to_string()))?;
        let base = self.writer.allocate_ids(count);
        let info_id = self.writer.allocate_id();
        let catalog_id = self.writer.allocate_id();
        self.info.stamp(self.options.timestamp);

        // The body goes out in ascending id order: page tree, pages, records.
        let mut kids: Vec<u32> = self.pages.iter().map(PageWriter::id).collect();
        kids.sort_unstable();
        write_page_tree(&mut self.writer, self.page_tree_id, &kids)?;

        let serializer = ObjectSerializer::new(self.storage.id(), base, &self.encryption);
        for (page, resources) in self.pages.iter().zip(&resources) {
            page.write(&mut self.writer, &serializer, self.page_tree_id, resources)?;
        }

        for (reference, object) in self.storage.iter()? {
            serializer.write_record(&mut self.writer, base + reference.id, object)?;
        }
        log::debug!("Wrote {} storage records as {}..={}", count, base + 1, base + count);

        let info = Object::Dictionary(self.info.to_dictionary());
        serializer.write_record(&mut self.writer, info_id, &info)?;
        write_catalog(&mut self.writer, catalog_id, self.page_tree_id)?;

        let xref_offset = write_xref(&mut self.writer)?;
        self.write_trailer(info_id, catalog_id)?;
        self.writer
            .write_raw(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes())?;

        self.writer.close()?;
        log::debug!("Document complete, {} bytes", self.writer.current_offset());
        Ok(self.writer.into_inner())
    }

    fn write_trailer(&mut self, info_id: u32, catalog_id: u32) -> Result<()> {
        let writer = &mut self.writer;
        let size = writer.last_allocated_id() + 1;
        writer.write_raw(b"trailer\n")?;
        writer.start_dictionary()?;
        writer.write_name("Size")?;
        writer.write_number(size)?;
        writer.write_name("Root")?;
        writer.write_indirect_reference(catalog_id)?;
        writer.write_name("Info")?;
        writer.write_indirect_reference(info_id)?;
        writer.write_name("ID")?;
        writer.start_array()?;
        writer.write_hex_string(&self.file_identifier)?;
        writer.write_hex_string(&self.file_identifier)?;
        writer.end_array()?;

        if self.encryption.is_active() {
            writer.write_name("Encrypt")?;
            writer.start_dictionary()?;
            self.encryption.write_dictionary_entries(writer)?;
            writer.end_dictionary()?;
        }
        writer.end_dictionary()
    }
}

fn write_page_tree<W: Write>(writer: &mut ObjectWriter<W>, id: u32, kids: &[u32]) -> Result<()> {
    writer.start_object(Some(id))?;
    writer.start_dictionary()?;
    writer.write_name("Type")?;
    writer.write_name("Pages")?;
    writer.write_name("Kids")?;
    writer.start_array()?;
    for kid in kids {
        writer.write_indirect_reference(*kid)?;
    }
    writer.end_array()?;
    writer.write_name("Count")?;
    writer.write_number(kids.len())?;
    writer.end_dictionary()?;
    writer.end_object()
}

fn write_catalog<W: Write>(writer: &mut ObjectWriter<W>, id: u32, page_tree_id: u32) -> Result<()> {
    writer.start_object(Some(id))?;
    writer.start_dictionary()?;
    writer.write_name("Type")?;
    writer.write_name("Catalog")?;
    writer.write_name("Pages")?;
    writer.write_indirect_reference(page_tree_id)?;
    writer.end_dictionary()?;
    writer.end_object()
}

/// Write the cross-reference table and return its offset.
fn write_xref<W: Write>(writer: &mut ObjectWriter<W>) -> Result<u64> {
    let offset = writer.current_offset();
    let size = writer.last_allocated_id() + 1;

    let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", size);
    for id in 1..size {
        let entry = writer
            .object_offsets()
            .get(&id)
            .ok_or(Error::UnfilledSlot(id))?;
        table.push_str(&format!("{:010} 00000 n \n", entry));
    }
    writer.write_raw(table.as_bytes())?;

    log::debug!("Cross-reference table: {} entries at offset {}", size, offset);
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;
    use crate::writer::EncryptionOptions;
    use chrono::{FixedOffset, TimeZone};

    fn fixed_options() -> PdfWriterOptions {
        let timestamp = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap();
        PdfWriterOptions::new()
            .with_file_identifier([0xAB; 16])
            .with_timestamp(timestamp)
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_minimal_document_layout() {
        let mut pdf = PdfWriter::to_vec(fixed_options()).unwrap();
        pdf.add_page(612.0, 792.0);
        let bytes = pdf.finish().unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7\n%\xFF\xFF\xFF\xFF\n"));
        let text = as_text(&bytes);
        assert!(text.contains("1 0 obj\n<</Type /Pages /Kids[2 0 R]/Count 1>>\nendobj\n"));
        assert!(text.contains("3 0 obj\n<</Length 0>>\nstream\n\nendstream\nendobj\n"));
        assert!(text.contains(
            "4 0 obj\n<</Producer(pdf_quill)/CreationDate(D:20240102030405Z)\
             /ModDate(D:20240102030405Z)>>\nendobj\n"
        ));
        assert!(text.contains("5 0 obj\n<</Type /Catalog /Pages 1 0 R>>\nendobj\n"));
        assert!(text.contains("xref\n0 6\n0000000000 65535 f \n"));
        let id = "ab".repeat(16);
        assert!(text.contains(&format!(
            "trailer\n<</Size 6 /Root 5 0 R /Info 4 0 R /ID[<{}><{}>]>>\nstartxref\n",
            id, id
        )));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_storage_records_follow_pages() {
        let mut pdf = PdfWriter::to_vec(fixed_options()).unwrap();
        let font = pdf.objects_mut().add_object(Object::dict(vec![
            ("Type", Object::name("Font")),
            ("Subtype", Object::name("Type1")),
            ("BaseFont", Object::name("Helvetica")),
        ]));
        pdf.add_page(100.0, 100.0)
            .add_resource("Font", "F1", Object::Reference(font))
            .unwrap();
        let text = as_text(&pdf.finish().unwrap());

        // Page tree 1, page 2, contents 3, the font 4.
        assert!(text.contains("4 0 obj\n<</Type /Font /Subtype /Type1 /BaseFont /Helvetica>>"));
        assert!(text.contains("/Resources<</Font<</F1 4 0 R>>>>"));
        assert!(text.contains("/Size 7 "));
    }

    #[test]
    fn test_body_in_ascending_id_order() {
        let mut pdf = PdfWriter::to_vec(fixed_options()).unwrap();
        pdf.objects_mut().add_object(Object::dict(vec![("A", Object::Integer(1))]));
        pdf.objects_mut().add_object(Object::stream(Dictionary::new(), &b"q Q"[..]));
        pdf.add_page(100.0, 100.0).append_content(b"0 g");
        pdf.add_page(100.0, 100.0);
        let bytes = pdf.finish().unwrap();
        let text = as_text(&bytes);

        // Page tree, two pages with contents, two records, info and catalog.
        let offsets: Vec<usize> = (1..=9)
            .map(|id| text.find(&format!("\n{} 0 obj\n", id)).unwrap())
            .collect();
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", offsets);
    }

    #[test]
    fn test_unfilled_slot_fails_finish() {
        let mut pdf = PdfWriter::to_vec(fixed_options()).unwrap();
        pdf.objects_mut().reserve_slot();
        assert!(matches!(pdf.finish(), Err(Error::UnfilledSlot(1))));
    }

    #[test]
    fn test_encrypted_trailer() {
        let options = fixed_options()
            .with_version(PdfVersion::V1_4)
            .with_encryption(EncryptionOptions::new("user").with_deterministic(true));
        let mut pdf = PdfWriter::to_vec(options).unwrap();
        assert!(pdf.encryption().is_active());
        pdf.add_page(10.0, 10.0);
        let text = as_text(&pdf.finish().unwrap());

        assert!(text.contains("/Encrypt<</Filter /Standard /V 2 /R 3 /O<"));
        assert!(!text.contains("(pdf_quill)"));
    }

    #[test]
    fn test_random_file_identifier() {
        let first = PdfWriter::to_vec(PdfWriterOptions::new()).unwrap();
        let second = PdfWriter::to_vec(PdfWriterOptions::new()).unwrap();
        assert_ne!(first.file_identifier(), second.file_identifier());
    }

    #[test]
    fn test_page_access() {
        let mut pdf = PdfWriter::to_vec(PdfWriterOptions::new()).unwrap();
        pdf.add_page(1.0, 1.0);
        pdf.add_page(2.0, 2.0);
        assert_eq!(pdf.page_count(), 2);
        assert_eq!(pdf.page_mut(1).map(|page| page.id()), Some(4));
        assert!(pdf.page_mut(2).is_none());
    }
}
