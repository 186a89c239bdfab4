/*!
 Bounds-checked reading of the primitive building blocks of a `typedstream`: raw bytes, tagged
 variable-width integers, and floating point numbers.

 Logic referenced from `typedstream` source located at:
   - [`typedstream.h`](https://opensource.apple.com/source/gcc/gcc-1493/libobjc/objc/typedstream.h.auto.html)
   - [`archive.c`](https://opensource.apple.com/source/gcc/gcc-5484/libobjc/archive.c.auto.html)
*/

use log::warn;

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::models::{ByteOrder, Header},
};

/// Indicates an [`i16`] in the byte stream
pub(crate) const I_16: u8 = 0x81;
/// Indicates an [`i32`] in the byte stream
pub(crate) const I_32: u8 = 0x82;
/// Indicates an [`f32`] or [`f64`] in the byte stream; the type determines the size
pub(crate) const DECIMAL: u8 = 0x83;
/// Indicates the start of a new string, class, or object
pub(crate) const START: u8 = 0x84;
/// Indicates that there is no data, for example a nil object or the end of a class inheritance chain
pub(crate) const EMPTY: u8 = 0x85;
/// Indicates the last byte of an object
pub(crate) const END: u8 = 0x86;
/// First byte of the range reserved for tags
const FIRST_TAG: u8 = 0x80;
/// Last byte of the range reserved for tags
const LAST_TAG: u8 = 0x91;
/// Reference number `n` is stored as the integer `n + REFERENCE_BASE`, so the first reference is `0x92`
pub(crate) const REFERENCE_BASE: i64 = -110;

/// Streamer version written by every supported archiver
const STREAMER_VERSION: u8 = 4;
/// Signature of archives written in little endian byte order
const SIGNATURE_LITTLE_ENDIAN: &[u8] = b"streamtyped";
/// Signature of archives written in big endian byte order
const SIGNATURE_BIG_ENDIAN: &[u8] = b"typedstream";
/// System version written by Apple's `NSArchiver`
const SYSTEM_VERSION: i64 = 1000;

/// Returns `true` if the byte falls into the range reserved for tags
pub(crate) fn is_tag(byte: u8) -> bool {
    (FIRST_TAG..=LAST_TAG).contains(&byte)
}

/// A sequential reader over an immutable `typedstream` buffer
///
/// The position never moves past the end of the buffer; every read that needs more bytes than remain
/// fails with [`TypedStreamError::UnexpectedEndOfStream`] and leaves the position unchanged.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// The `typedstream` we want to read
    stream: &'a [u8],
    /// The current index we are at in the stream
    idx: usize,
    /// Byte order of multi-byte integers and floats, set by the header
    byte_order: ByteOrder,
}

impl<'a> Cursor<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            idx: 0,
            byte_order: ByteOrder::Little,
        }
    }

    /// The current offset into the stream
    pub fn position(&self) -> usize {
        self.idx
    }

    /// The total length of the stream
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// `true` if the underlying buffer holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// The number of unread bytes
    pub fn remaining(&self) -> usize {
        self.stream.len() - self.idx
    }

    /// `true` once every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.idx == self.stream.len()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Read the current byte without consuming it
    pub fn peek_byte(&self) -> Result<u8, TypedStreamError> {
        self.stream
            .get(self.idx)
            .copied()
            .ok_or(TypedStreamError::UnexpectedEndOfStream(
                self.idx + 1,
                self.stream.len(),
            ))
    }

    /// Read and consume the current byte
    pub fn read_byte(&mut self) -> Result<u8, TypedStreamError> {
        let byte = self.peek_byte()?;
        self.idx += 1;
        Ok(byte)
    }

    /// Read exactly `n` bytes from the stream
    pub fn read_raw(&mut self, n: usize) -> Result<&'a [u8], TypedStreamError> {
        let end = self
            .idx
            .checked_add(n)
            .ok_or(TypedStreamError::UnexpectedEndOfStream(
                usize::MAX,
                self.stream.len(),
            ))?;
        let range = self
            .stream
            .get(self.idx..end)
            .ok_or(TypedStreamError::UnexpectedEndOfStream(
                end,
                self.stream.len(),
            ))?;
        self.idx = end;
        Ok(range)
    }

    /// Read exactly `N` bytes into an array
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TypedStreamError> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    /// Read `n` bytes as a String
    pub fn read_string(&mut self, n: usize) -> Result<String, TypedStreamError> {
        std::str::from_utf8(self.read_raw(n)?)
            .map(str::to_string)
            .map_err(TypedStreamError::StringParseError)
    }

    /// Read a variable-width integer. A single head byte either holds the value itself or announces
    /// that 2 or 4 bytes follow. Signed reads sign-extend from the encoded width, unsigned reads
    /// zero-extend.
    pub fn read_variable_int(&mut self, signed: bool) -> Result<i64, TypedStreamError> {
        let offset = self.idx;
        let head = self.read_byte()?;
        self.integer_from_head(head, offset, signed)
    }

    /// Finish reading a variable-width integer whose head byte, found at `offset`, was already consumed
    pub(crate) fn integer_from_head(
        &mut self,
        head: u8,
        offset: usize,
        signed: bool,
    ) -> Result<i64, TypedStreamError> {
        match head {
            I_16 => {
                let bytes = self.read_array::<2>()?;
                let value = match self.byte_order {
                    ByteOrder::Little => u16::from_le_bytes(bytes),
                    ByteOrder::Big => u16::from_be_bytes(bytes),
                };
                Ok(if signed {
                    value as i16 as i64
                } else {
                    value as i64
                })
            }
            I_32 => {
                let bytes = self.read_array::<4>()?;
                let value = match self.byte_order {
                    ByteOrder::Little => u32::from_le_bytes(bytes),
                    ByteOrder::Big => u32::from_be_bytes(bytes),
                };
                Ok(if signed {
                    value as i32 as i64
                } else {
                    value as i64
                })
            }
            byte if is_tag(byte) => Err(TypedStreamError::UnknownStreamMarker(byte, offset)),
            byte => Ok(if signed { byte as i8 as i64 } else { byte as i64 }),
        }
    }

    /// Read a length prefix, which is always a signed integer that must not be negative
    pub(crate) fn read_length(&mut self) -> Result<usize, TypedStreamError> {
        let length = self.read_variable_int(true)?;
        usize::try_from(length).map_err(|_| TypedStreamError::InvalidLength(length))
    }

    /// Read a single-precision float from the byte stream
    pub fn read_float(&mut self) -> Result<f32, TypedStreamError> {
        let offset = self.idx;
        match self.read_byte()? {
            DECIMAL => {
                let bytes = self.read_array::<4>()?;
                Ok(match self.byte_order {
                    ByteOrder::Little => f32::from_le_bytes(bytes),
                    ByteOrder::Big => f32::from_be_bytes(bytes),
                })
            }
            head => Ok(self.integer_from_head(head, offset, true)? as f32),
        }
    }

    /// Read a double-precision float from the byte stream
    pub fn read_double(&mut self) -> Result<f64, TypedStreamError> {
        let offset = self.idx;
        match self.read_byte()? {
            DECIMAL => {
                let bytes = self.read_array::<8>()?;
                Ok(match self.byte_order {
                    ByteOrder::Little => f64::from_le_bytes(bytes),
                    ByteOrder::Big => f64::from_be_bytes(bytes),
                })
            }
            head => Ok(self.integer_from_head(head, offset, true)? as f64),
        }
    }

    /// Read and validate the archive header, switching to the byte order it declares.
    ///
    /// Older streamers wrote other header variants; only streamer version 4 is supported, which
    /// covers every archive written by `NSArchiver`.
    pub(crate) fn read_header(&mut self) -> Result<Header, TypedStreamError> {
        let streamer_version = self.read_byte()?;
        let signature_length = self.read_byte()? as usize;
        let signature = self.read_raw(signature_length)?;

        self.byte_order = match signature {
            SIGNATURE_LITTLE_ENDIAN => ByteOrder::Little,
            SIGNATURE_BIG_ENDIAN => ByteOrder::Big,
            _ => return Err(TypedStreamError::InvalidHeader),
        };
        if streamer_version != STREAMER_VERSION {
            return Err(TypedStreamError::InvalidHeader);
        }

        let system_version = self.read_variable_int(true)?;
        if system_version != SYSTEM_VERSION {
            warn!("Unexpected typedstream system version {system_version}");
        }

        Ok(Header {
            streamer_version,
            byte_order: self.byte_order,
            system_version,
        })
    }
}
