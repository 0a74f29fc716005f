//! Low-level byte stream parser for container and resource decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary
//! data parser used for reading NE/PE headers, resource tables, and the embedded
//! structure formats (cursor DIBs, FNT fonts, version-info blocks). It offers
//! bounds-checked access to binary data with support for both little-endian and
//! big-endian reads plus the string encodings these formats use.
//!
//! # Architecture
//!
//! The parser is built around a simple cursor-based model that maintains a position
//! within a byte slice:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Type-safe reading** - Strongly typed methods for the primitive field types
//! - **String support** - Pascal, NUL-terminated Latin-1, and UTF-16 string readers
//!
//! Helpers that need to follow an offset elsewhere in the stream (NE name lookups,
//! name-table reads) save the position, seek, and restore it afterwards so the
//! caller's sequential reads stay correct; [`crate::file::parser::Parser::seek`] and
//! [`crate::file::parser::Parser::pos`] make that discipline explicit.
//!
//! # Usage Examples
//!
//! ```rust
//! use exescope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04];
//! let mut parser = Parser::new(&data);
//!
//! let value = parser.read_le::<u16>()?;
//! assert_eq!(value, 0x0201);
//! # Ok::<(), exescope::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, read_le_at, ExeIO},
    Result,
};

/// A bounds-checked cursor over binary container data.
///
/// `Parser` provides a cursor-based interface for reading binary data in both
/// little-endian and big-endian formats. It is designed for the byte-exact layouts
/// of NE resource tables, PE resource directories, and the embedded resource
/// payload formats, where malformed or truncated data must fail cleanly rather
/// than crash the reader.
///
/// # Examples
///
/// ```rust,no_run
/// use exescope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_le::<u32>()?;
/// assert_eq!(first, 0x04030201);
///
/// parser.seek(6)?;
/// let last_bytes = parser.read_le::<u16>()?;
/// assert_eq!(last_bytes, 0x0807);
/// # Ok::<(), exescope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self
            .position
            .checked_add(step)
            .ok_or(out_of_bounds_error!())?;
        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = end;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Align the position to a specific boundary.
    ///
    /// This advances the position to the next multiple of the specified alignment,
    /// which the version-info block format requires between nested entries.
    ///
    /// # Arguments
    /// * `alignment` - The boundary to align to (must be a power of 2)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if aligning would exceed the data length.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        if self.position + padding > self.data.len() {
            return Err(out_of_bounds_error!());
        }
        self.position += padding;
        Ok(())
    }

    /// Read a type `T` from the current position in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use exescope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// let value: u16 = parser.read_le()?;
    /// assert_eq!(value, 0x0201); // Little-endian interpretation
    /// # Ok::<(), exescope::Error>(())
    /// ```
    pub fn read_le<T: ExeIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a type `T` from the current position in big-endian format and advance the position.
    ///
    /// Used for the byte-order-sensitive magic checks (`MZ` = 0x4D5A, `NE` = 0x4E45).
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_be<T: ExeIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Returns the number of bytes remaining from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Ensures that at least `needed` bytes are available from the current position.
    ///
    /// # Arguments
    /// * `needed` - The number of bytes required from the current position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `needed` bytes remain.
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(out_of_bounds_error!());
        }
        Ok(())
    }

    /// Calculates an end position safely with overflow checking.
    ///
    /// # Arguments
    /// * `length` - The length to add to the current position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the calculation would overflow
    /// or if the resulting position exceeds the data length.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Reads a slice of bytes of the specified length from the current position.
    ///
    /// # Arguments
    /// * `length` - The number of bytes to read
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a length-prefixed Pascal string.
    ///
    /// One length byte `n` followed by `n` bytes of single-byte text. This is the
    /// string encoding of NE resource names and NE string-table entries. Bytes are
    /// widened as Latin-1 so arbitrary data never fails to decode.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the declared length exceeds the data.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use exescope::Parser;
    /// let data = [5, b'H', b'E', b'L', b'L', b'O'];
    /// let mut parser = Parser::new(&data);
    ///
    /// assert_eq!(parser.read_pascal_string()?, "HELLO");
    /// # Ok::<(), exescope::Error>(())
    /// ```
    pub fn read_pascal_string(&mut self) -> Result<String> {
        let length = self.read_le::<u8>()? as usize;
        let bytes = self.read_bytes(length)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    /// Read a NUL-terminated single-byte string.
    ///
    /// Reads bytes until a NUL terminator (or the end of data) and widens them as
    /// Latin-1. The position is advanced past the terminator when one is present.
    /// FNT device/face names and NE version-info keys use this encoding.
    pub fn read_string_latin1(&mut self) -> Result<String> {
        let start = self.position;
        let mut end = start;

        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }

        let string_data = &self.data[start..end];

        if end < self.data.len() {
            self.position = end + 1;
        } else {
            self.position = end;
        }

        Ok(string_data.iter().map(|&b| b as char).collect())
    }

    /// Read a NUL-terminated UTF-16 little-endian string.
    ///
    /// Reads 16-bit units until a zero unit (or the end of data). PE version-info
    /// keys use this encoding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data ends mid-unit.
    pub fn read_string_utf16(&mut self) -> Result<String> {
        let mut units: Vec<u16> = Vec::new();

        while self.remaining() >= 2 {
            let unit = self.read_le::<u16>()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }

        Ok(widestring::U16Str::from_slice(&units).to_string_lossy())
    }

    /// Read a length-prefixed UTF-16 string.
    ///
    /// A 16-bit character count followed by that many UTF-16 units, with no
    /// terminator. PE resource directory names and PE string-table entries use
    /// this encoding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the declared length exceeds the data.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use exescope::Parser;
    /// let data = [2, 0, 0x48, 0x00, 0x69, 0x00]; // "Hi"
    /// let mut parser = Parser::new(&data);
    ///
    /// assert_eq!(parser.read_prefixed_string_utf16()?, "Hi");
    /// # Ok::<(), exescope::Error>(())
    /// ```
    pub fn read_prefixed_string_utf16(&mut self) -> Result<String> {
        let length = self.read_le::<u16>()? as usize;

        let mut units: Vec<u16> = Vec::with_capacity(length);
        for _ in 0..length {
            units.push(self.read_le::<u16>()?);
        }

        Ok(widestring::U16Str::from_slice(&units).to_string_lossy())
    }
}
