//! Token-level PDF writer.
//!
//! [`ObjectWriter`] emits PDF tokens straight into a byte sink, tracking the byte
//! offset of every indirect object for the cross-reference table.
//!
//! Tokens fall in two classes. Delimiters (`<<`, `>>`, `[`, `]`) and strings carry
//! their own boundaries and are written as is. Value tokens (null, booleans,
//! numbers, names, references) would merge with a preceding value token, so the
//! writer remembers whether the last token was one and, if so, puts a single space
//! in front of the next value token. Once the current line reaches the configured
//! width that space becomes a newline.

use crate::error::{Error, Result};
use crate::object::Number;
use std::collections::BTreeMap;
use std::io::Write;

/// Default maximum line width before value separators turn into newlines.
pub const DEFAULT_MAX_LINE_WIDTH: usize = 255;

/// Bytes of string content per line before a continuation is inserted.
const STRING_CHUNK_WIDTH: usize = 248;

/// Most continuation bytes a UTF-8 sequence can carry past its lead byte.
const MAX_UTF8_CONTINUATION: usize = 3;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Streaming token writer over any byte sink.
pub struct ObjectWriter<W: Write> {
    sink: W,
    offset: u64,
    column: usize,
    max_line_width: usize,
    requires_whitespace: bool,
    last_allocated_id: u32,
    object_offsets: BTreeMap<u32, u64>,
    closed: bool,
}

impl<W: Write> ObjectWriter<W> {
    /// Create a writer with the default line width.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            offset: 0,
            column: 0,
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            requires_whitespace: false,
            last_allocated_id: 0,
            object_offsets: BTreeMap::new(),
            closed: false,
        }
    }

    /// Set the line width at which separators become newlines.
    pub fn with_max_line_width(mut self, width: usize) -> Self {
        self.max_line_width = width;
        self
    }

    /// Bytes written so far.
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Offsets of all started objects, ascending by id.
    pub fn object_offsets(&self) -> &BTreeMap<u32, u64> {
        &self.object_offsets
    }

    /// Allocate the next object id.
    pub fn allocate_id(&mut self) -> u32 {
        self.last_allocated_id += 1;
        self.last_allocated_id
    }

    /// Allocate `count` consecutive ids and return the id just before the block,
    /// so the block is `base + 1 ..= base + count`.
    pub fn allocate_ids(&mut self, count: u32) -> u32 {
        let base = self.last_allocated_id;
        self.last_allocated_id += count;
        base
    }

    /// Highest id allocated so far.
    pub fn last_allocated_id(&self) -> u32 {
        self.last_allocated_id
    }

    /// Start an indirect object, allocating an id if none is given.
    pub fn start_object(&mut self, id: Option<u32>) -> Result<u32> {
        let id = match id {
            Some(id) => id,
            None => self.allocate_id(),
        };

        self.ensure_open()?;
        self.object_offsets.insert(id, self.offset);
        self.emit(format!("{} 0 obj\n", id).as_bytes())?;
        self.requires_whitespace = false;
        Ok(id)
    }

    /// End the current indirect object.
    pub fn end_object(&mut self) -> Result<()> {
        self.emit(b"\nendobj\n")?;
        self.requires_whitespace = false;
        Ok(())
    }

    /// Start stream data; the stream dictionary must already be written.
    pub fn start_stream(&mut self) -> Result<()> {
        self.emit(b"\nstream\n")?;
        self.requires_whitespace = false;
        Ok(())
    }

    /// End stream data.
    pub fn end_stream(&mut self) -> Result<()> {
        self.emit(b"\nendstream")?;
        self.requires_whitespace = false;
        Ok(())
    }

    /// Write `<<`.
    pub fn start_dictionary(&mut self) -> Result<()> {
        self.write_delimited(b"<<")
    }

    /// Write `>>`.
    pub fn end_dictionary(&mut self) -> Result<()> {
        self.write_delimited(b">>")
    }

    /// Write `[`.
    pub fn start_array(&mut self) -> Result<()> {
        self.write_delimited(b"[")
    }

    /// Write `]`.
    pub fn end_array(&mut self) -> Result<()> {
        self.write_delimited(b"]")
    }

    /// Write `null`.
    pub fn write_null(&mut self) -> Result<()> {
        self.write_value_token(b"null")
    }

    /// Write `true` or `false`.
    pub fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.write_value_token(if value { b"true" } else { b"false" })
    }

    /// Write an integer or real number.
    ///
    /// Reals get at most six fractional digits; non-finite reals are rejected.
    pub fn write_number(&mut self, number: impl Into<Number>) -> Result<()> {
        let token = format_number(number.into())?;
        self.write_value_token(token.as_bytes())
    }

    /// Write a name, escaping every byte outside the unreserved set as `#XX`.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        let mut token = Vec::with_capacity(name.len() + 1);
        token.push(b'/');
        for &byte in name.as_bytes() {
            if is_unreserved_name_byte(byte) {
                token.push(byte);
            } else {
                token.push(b'#');
                token.extend_from_slice(format!("{:02X}", byte).as_bytes());
            }
        }
        self.write_value_token(&token)
    }

    /// Write a literal string, escaping `(`, `)`, `\` and carriage returns.
    ///
    /// Content longer than a line is continued with a backslash-newline, never
    /// inside an escape sequence and never in front of a UTF-8 continuation byte.
    /// The chunk width does not depend on the configured line width.
    pub fn write_literal_string(&mut self, data: &[u8]) -> Result<()> {
        let mut token = Vec::with_capacity(data.len() + 2);
        token.push(b'(');

        let mut chunk = 0;
        for &byte in data {
            let escaped: &[u8] = match byte {
                b'(' => b"\\(",
                b')' => b"\\)",
                b'\\' => b"\\\\",
                b'\r' => b"\\r",
                _ => std::slice::from_ref(&byte),
            };

            let continuation = (0x80..=0xBF).contains(&byte);
            // Stray continuation bytes in binary data still break after a bounded run.
            if chunk >= STRING_CHUNK_WIDTH
                && (!continuation || chunk >= STRING_CHUNK_WIDTH + MAX_UTF8_CONTINUATION)
            {
                token.extend_from_slice(b"\\\n");
                chunk = 0;
            }

            token.extend_from_slice(escaped);
            chunk += escaped.len();
        }

        token.push(b')');
        self.write_delimited(&token)
    }

    /// Write a hexadecimal string with lowercase digits, wrapping long content.
    pub fn write_hex_string(&mut self, data: &[u8]) -> Result<()> {
        let mut token = Vec::with_capacity(data.len() * 2 + 2 + data.len() / STRING_CHUNK_WIDTH);
        token.push(b'<');

        for (index, &byte) in data.iter().enumerate() {
            if index > 0 && (index * 2) % STRING_CHUNK_WIDTH == 0 {
                token.push(b'\n');
            }
            token.push(HEX_DIGITS[(byte >> 4) as usize]);
            token.push(HEX_DIGITS[(byte & 0x0F) as usize]);
        }

        token.push(b'>');
        self.write_delimited(&token)
    }

    /// Write `<id> 0 R`.
    pub fn write_indirect_reference(&mut self, id: u32) -> Result<()> {
        self.write_value_token(format!("{} 0 R", id).as_bytes())
    }

    /// Write bytes unchanged.
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.emit(data)
    }

    /// Write bytes unchanged followed by a newline.
    pub fn write_raw_line(&mut self, data: &[u8]) -> Result<()> {
        self.emit(data)?;
        self.emit(b"\n")?;
        self.requires_whitespace = false;
        Ok(())
    }

    /// Flush the sink and refuse any further writes.
    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.sink.flush()?;
            self.closed = true;
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Recover the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn write_delimited(&mut self, token: &[u8]) -> Result<()> {
        self.emit(token)?;
        self.requires_whitespace = false;
        Ok(())
    }

    fn write_value_token(&mut self, token: &[u8]) -> Result<()> {
        if self.requires_whitespace {
            if self.column >= self.max_line_width {
                self.emit(b"\n")?;
            } else {
                self.emit(b" ")?;
            }
        }
        self.emit(token)?;
        self.requires_whitespace = true;
        Ok(())
    }

    fn emit(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.sink.write_all(data)?;
        self.offset += data.len() as u64;
        self.column = match data.iter().rposition(|&byte| byte == b'\n') {
            Some(newline) => data.len() - newline - 1,
            None => self.column + data.len(),
        };
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::WriterClosed);
        }
        Ok(())
    }
}

/// Characters allowed verbatim inside a name.
fn is_unreserved_name_byte(byte: u8) -> bool {
    matches!(
        byte,
        b'!' | b'"' | b'$' | b'&' | b'\'' | b'*' | b'+' | b',' | b'-' | b'.' | b':' | b';'
            | b'=' | b'?' | b'@' | b'^' | b'_' | b'`' | b'|' | b'~'
    ) || byte.is_ascii_alphanumeric()
}

/// Render a number token.
pub(crate) fn format_number(number: Number) -> Result<String> {
    match number {
        Number::Integer(value) => Ok(value.to_string()),
        Number::Real(value) if !value.is_finite() => Err(Error::InvalidArgument(format!(
            "cannot write non-finite number {}",
            value
        ))),
        Number::Real(value) => {
            let formatted = format!("{:.6}", value);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            Ok(match trimmed {
                "" | "-" | "-0" => "0".to_string(),
                other => other.to_string(),
            })
        },
    }
}
