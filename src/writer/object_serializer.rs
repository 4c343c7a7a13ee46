//! PDF object serialization.
//!
//! Drives an [`ObjectWriter`] through a complete [`Object`] tree. Strings and
//! stream payloads are encrypted with the key of the record they belong to, and
//! storage references are translated to output object numbers.

use super::object_writer::ObjectWriter;
use crate::encryption::EncryptionHandler;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef, Stream};
use crate::storage::StorageId;
use std::io::Write;

/// Serializer for the records of one storage.
///
/// Storage id `n` is written as object number `id_base + n`.
pub struct ObjectSerializer<'a> {
    storage: StorageId,
    id_base: u32,
    encryption: &'a EncryptionHandler,
}

impl<'a> ObjectSerializer<'a> {
    /// Create a serializer for references into `storage`.
    pub fn new(storage: StorageId, id_base: u32, encryption: &'a EncryptionHandler) -> Self {
        Self {
            storage,
            id_base,
            encryption,
        }
    }

    /// Output object number of a storage reference.
    pub fn output_id(&self, reference: ObjectRef) -> Result<u32> {
        if reference.storage != self.storage {
            return Err(Error::ForeignReference(reference));
        }
        Ok(self.id_base + reference.id)
    }

    /// Write a complete indirect object. Only here may the value be a stream.
    pub fn write_record<W: Write>(
        &self,
        writer: &mut ObjectWriter<W>,
        id: u32,
        object: &Object,
    ) -> Result<()> {
        writer.start_object(Some(id))?;
        match object {
            Object::Stream(stream) => self.write_stream(writer, stream, id)?,
            other => self.write_value(writer, other, id)?,
        }
        writer.end_object()
    }

    /// Write a direct value belonging to record `record_id`.
    pub fn write_value<W: Write>(
        &self,
        writer: &mut ObjectWriter<W>,
        object: &Object,
        record_id: u32,
    ) -> Result<()> {
        match object {
            Object::Null => writer.write_null(),
            Object::Boolean(value) => writer.write_boolean(*value),
            Object::Integer(value) => writer.write_number(*value),
            Object::Real(value) => writer.write_number(*value),
            Object::Name(name) => writer.write_name(name),
            Object::LiteralString(data) => self.write_string(writer, data, false, record_id),
            Object::HexString(data) => self.write_string(writer, data, true, record_id),
            Object::Array(items) => {
                writer.start_array()?;
                for item in items {
                    self.write_value(writer, item, record_id)?;
                }
                writer.end_array()
            },
            Object::Dictionary(dict) => {
                self.write_dictionary_entries(writer, dict, record_id, false)?;
                writer.end_dictionary()
            },
            Object::Stream(_) => Err(Error::UnexpectedSweepResult {
                expected: "direct value".to_string(),
                found: "Stream".to_string(),
            }),
            Object::Reference(reference) => {
                let id = self.output_id(*reference)?;
                writer.write_indirect_reference(id)
            },
        }
    }

    fn write_string<W: Write>(
        &self,
        writer: &mut ObjectWriter<W>,
        data: &[u8],
        hex: bool,
        record_id: u32,
    ) -> Result<()> {
        if self.encryption.is_active() {
            let encrypted = self.encryption.encrypt(data, record_id, 0)?;
            return writer.write_hex_string(&encrypted);
        }

        if hex {
            writer.write_hex_string(data)
        } else {
            writer.write_literal_string(data)
        }
    }

    /// Open a dictionary and write its entries, leaving it open.
    fn write_dictionary_entries<W: Write>(
        &self,
        writer: &mut ObjectWriter<W>,
        dict: &Dictionary,
        record_id: u32,
        skip_length: bool,
    ) -> Result<()> {
        writer.start_dictionary()?;
        for (key, value) in dict {
            if skip_length && key == "Length" {
                continue;
            }
            writer.write_name(key)?;
            self.write_value(writer, value, record_id)?;
        }
        Ok(())
    }

    fn write_stream<W: Write>(
        &self,
        writer: &mut ObjectWriter<W>,
        stream: &Stream,
        record_id: u32,
    ) -> Result<()> {
        let data = if self.encryption.encrypts_stream(stream) {
            self.encryption.encrypt(&stream.data, record_id, 0)?
        } else {
            stream.data.to_vec()
        };

        self.write_dictionary_entries(writer, &stream.dict, record_id, true)?;
        writer.write_name("Length")?;
        writer.write_number(data.len())?;
        writer.end_dictionary()?;

        writer.start_stream()?;
        writer.write_raw(&data)?;
        writer.end_stream()
    }
}
