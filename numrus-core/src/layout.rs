//! BLAS-style enumerations shared by the batched routines.
//!
//! Discriminants follow the C API numbering so values can cross an FFI
//! boundary unchanged.

use serde::Deserialize;

/// Which triangle of a Hermitian band is stored.
///
/// `Full` is part of the enumeration for routines that accept it; the banded
/// Hermitian routines reject it with `invalid_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum Fill {
    #[default]
    Upper = 121,
    Lower = 122,
    Full = 123,
}

impl Fill {
    /// Single-letter form used by bench command lines.
    pub fn letter(self) -> char {
        match self {
            Fill::Upper => 'U',
            Fill::Lower => 'L',
            Fill::Full => 'F',
        }
    }

    /// Parse the single-letter form (`U`, `L`, `F`, case-insensitive).
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Fill::Upper),
            'L' => Some(Fill::Lower),
            'F' => Some(Fill::Full),
            _ => None,
        }
    }

    /// `true` for the two triangles a banded Hermitian matrix can be stored in.
    #[inline]
    pub fn is_triangle(self) -> bool {
        matches!(self, Fill::Upper | Fill::Lower)
    }
}

/// Where scalar operands (`alpha`, `beta`) live for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum PointerMode {
    /// Scalars are host values, readable before launch.
    #[default]
    Host = 0,
    /// Scalars are device cells, read only by the kernel.
    Device = 1,
}

impl PointerMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" | "0" => Some(PointerMode::Host),
            "device" | "1" => Some(PointerMode::Device),
            _ => None,
        }
    }
}

/// Integer width of the call surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum IndexWidth {
    /// `i32` sizes, increments and batch counts.
    #[default]
    #[serde(rename = "C")]
    Int32,
    /// `i64` everywhere.
    #[serde(rename = "C64")]
    Int64,
}

/// Index types accepted by the public call surfaces.
pub trait BlasInt: Copy + Into<i64> + std::fmt::Display + Send + Sync + 'static {
    const WIDTH: IndexWidth;
}

impl BlasInt for i32 {
    const WIDTH: IndexWidth = IndexWidth::Int32;
}

impl BlasInt for i64 {
    const WIDTH: IndexWidth = IndexWidth::Int64;
}
