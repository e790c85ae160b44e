#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Mirkwood adapters.
//!
//! The compositor decouples runtime state from what is drawn. A [`Buffer`]
//! mirrors the 8×8 logical board in its context and expands each logical
//! cell into a block of packed [`Cell`]s; backends implementing
//! [`RenderingBackend`] map those cells to glyphs and colours.

mod cell;
mod compositor;
pub mod outline;

use anyhow::Result as AnyResult;
use std::{error::Error, fmt};

pub use cell::{Cell, CellIdentity, ContextCell};
pub use compositor::{axis_decoration, Buffer, MAX_CELLS};

/// Opaque RGB color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Color {
    /// Creates a color from byte RGB values.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses a `#rrggbb` string.
    pub fn from_hex(value: &str) -> Result<Self, RenderingError> {
        let invalid = || RenderingError::InvalidColor {
            value: value.to_owned(),
        };
        let digits = value.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Rendering backend capable of presenting composited buffers.
pub trait RenderingBackend {
    /// Presents the current contents of `buffer` as one frame.
    fn present(&mut self, buffer: &Buffer) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Block resolutions must be positive and keep the cell grid within [`MAX_CELLS`].
    InvalidResolution {
        /// Requested block width.
        x_res: u32,
        /// Requested block height.
        y_res: u32,
    },
    /// A color string was not in `#rrggbb` form.
    InvalidColor {
        /// The rejected string.
        value: String,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidResolution { x_res, y_res } => {
                write!(
                    f,
                    "block resolution must be positive and fit the cell grid (received {x_res}x{y_res})"
                )
            }
            Self::InvalidColor { value } => {
                write!(f, "color `{value}` is not of the form #rrggbb")
            }
        }
    }
}

impl Error for RenderingError {}
