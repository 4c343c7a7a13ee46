//! Page records.

use super::object_serializer::ObjectSerializer;
use super::object_writer::ObjectWriter;
use crate::error::{Error, Result};
use crate::geometry::Rectangle;
use crate::object::{Dictionary, Object};
use indexmap::IndexMap;
use std::io::Write;

/// Box names a page may carry.
const PAGE_BOXES: [&str; 5] = ["MediaBox", "CropBox", "BleedBox", "TrimBox", "ArtBox"];

/// A page under construction.
///
/// The page and its content stream get their object numbers when the page is
/// added; everything else is written when the document is finished.
#[derive(Debug, Clone)]
pub struct PageWriter {
    id: u32,
    contents_id: u32,
    boxes: IndexMap<String, Rectangle>,
    rotation: u16,
    contents: Vec<u8>,
    resources: Dictionary,
}

impl PageWriter {
    pub(crate) fn new(id: u32, contents_id: u32, media_box: Rectangle) -> Self {
        let mut boxes = IndexMap::new();
        boxes.insert("MediaBox".to_string(), media_box);
        Self {
            id,
            contents_id,
            boxes,
            rotation: 0,
            contents: Vec::new(),
            resources: Dictionary::new(),
        }
    }

    /// Object number of the page.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Object number of the content stream.
    pub fn contents_id(&self) -> u32 {
        self.contents_id
    }

    /// Set one of `MediaBox`, `CropBox`, `BleedBox`, `TrimBox` or `ArtBox`.
    pub fn set_box(&mut self, name: &str, rectangle: Rectangle) -> Result<&mut Self> {
        if !PAGE_BOXES.contains(&name) {
            return Err(Error::InvalidArgument(format!("unknown page box {}", name)));
        }
        self.boxes.insert(name.to_string(), rectangle);
        Ok(self)
    }

    /// A box, if set.
    pub fn page_box(&self, name: &str) -> Option<&Rectangle> {
        self.boxes.get(name)
    }

    /// Set the clockwise rotation: 0, 90, 180 or 270 degrees.
    pub fn set_rotation(&mut self, degrees: i32) -> Result<&mut Self> {
        self.rotation = match degrees {
            0 => 0,
            90 => 90,
            180 => 180,
            270 => 270,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "rotation must be a multiple of 90 below 360, got {}",
                    other
                )))
            },
        };
        Ok(self)
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Append content stream operators.
    pub fn append_content(&mut self, operators: &[u8]) -> &mut Self {
        self.contents.extend_from_slice(operators);
        self
    }

    /// Content stream bytes so far.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Resource dictionary.
    pub fn resources(&self) -> &Dictionary {
        &self.resources
    }

    /// Mutable resource dictionary. References may point into any registered storage.
    pub fn resources_mut(&mut self) -> &mut Dictionary {
        &mut self.resources
    }

    /// Add `name` to the resource category `category`, e.g. `XObject` or `Font`.
    pub fn add_resource(&mut self, category: &str, name: &str, value: Object) -> Result<&mut Self> {
        let entry = self
            .resources
            .entry(category.to_string())
            .or_insert_with(|| Object::Dictionary(Dictionary::new()));
        match entry {
            Object::Dictionary(dict) => {
                dict.insert(name.to_string(), value);
            },
            other => {
                return Err(Error::InvalidArgument(format!(
                    "resource category {} is a {}, not a dictionary",
                    category,
                    other.type_name()
                )))
            },
        }
        Ok(self)
    }

    pub(crate) fn take_resources(&mut self) -> Dictionary {
        std::mem::take(&mut self.resources)
    }

    /// Write the content stream record and then the page record.
    ///
    /// `resources` must already be swept into the serializer's storage.
    pub(crate) fn write<W: Write>(
        &self,
        writer: &mut ObjectWriter<W>,
        serializer: &ObjectSerializer<'_>,
        parent_id: u32,
        resources: &Object,
    ) -> Result<()> {
        writer.start_object(Some(self.id))?;
        writer.start_dictionary()?;
        writer.write_name("Type")?;
        writer.write_name("Page")?;
        writer.write_name("Parent")?;
        writer.write_indirect_reference(parent_id)?;
        writer.write_name("Resources")?;
        serializer.write_value(writer, resources, self.id)?;
        writer.write_name("Contents")?;
        writer.write_indirect_reference(self.contents_id)?;
        for (name, rectangle) in &self.boxes {
            writer.write_name(name)?;
            rectangle.write_rectangle_array(writer)?;
        }
        if self.rotation != 0 {
            writer.write_name("Rotate")?;
            writer.write_number(self.rotation as i64)?;
        }
        writer.end_dictionary()?;
        writer.end_object()?;

        let contents = Object::stream(Dictionary::new(), self.contents.clone());
        serializer.write_record(writer, self.contents_id, &contents)
    }
}
