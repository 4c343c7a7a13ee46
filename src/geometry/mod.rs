//! Geometric primitives for page boxes.

use crate::error::Result;
use crate::object::Object;
use crate::writer::ObjectWriter;
use std::io::Write;

/// A rectangle in default user space, stored with normalized corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Lower-left x
    pub x1: f64,
    /// Lower-left y
    pub y1: f64,
    /// Upper-right x
    pub x2: f64,
    /// Upper-right y
    pub y2: f64,
}

impl Rectangle {
    /// Create a rectangle from two opposite corners in any order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_quill::geometry::Rectangle;
    ///
    /// let rect = Rectangle::new(100.0, 50.0, 0.0, 0.0);
    /// assert_eq!(rect.x1, 0.0);
    /// assert_eq!(rect.y2, 50.0);
    /// ```
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Width.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Height.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Write `[x1 y1 x2 y2]`.
    pub fn write_rectangle_array<W: Write>(&self, writer: &mut ObjectWriter<W>) -> Result<()> {
        writer.start_array()?;
        writer.write_number(self.x1)?;
        writer.write_number(self.y1)?;
        writer.write_number(self.x2)?;
        writer.write_number(self.y2)?;
        writer.end_array()
    }

    /// The rectangle as an array object.
    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.x1),
            Object::Real(self.y1),
            Object::Real(self.x2),
            Object::Real(self.y2),
        ])
    }
}
