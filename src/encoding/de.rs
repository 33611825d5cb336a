use super::{
    constants::*,
    varint::{self, Head},
};
use crate::{
    decimal::Decimal128,
    errors::Error,
    options::{Markers, Options},
    scanner::{Scanner, SliceScanner},
};
use bytes::Bytes;
use num_bigint::{BigInt, BigUint};

/// The window of the stream currently in memory, plus the committed read
/// position within it.
#[derive(Debug)]
struct Frame {
    buf: Bytes,
    /// Committed position: everything before it has been fully decoded.
    index: usize,
    /// Absolute stream offset of `buf[0]`.
    position_of_buf0: u64,
    /// Earliest offset that must stay loaded across refills; `usize::MAX`
    /// when nothing is pinned. Reserved for backreference support.
    pinned_start: usize,
}

/// The decoder state machine. Single-use: construct one per deserialization
/// session.
///
/// Every operation decodes on a stack-local cursor and commits it only once
/// the whole value has been read, so a failed decode leaves the committed
/// position on the previous value. An unexpected end of data is fatal: the
/// reader latches the error and returns the same one from every later call.
#[derive(Debug)]
pub struct Reader<S: Scanner> {
    scanner: Option<S>,
    frame: Frame,
    opt: Options,
    fatal: Option<Error>,
    // Bit cursor: unconsumed bits of the most recently read bitfield byte,
    // shifted so the next bit to hand out is bit 0. Any non-bitfield read
    // discards the leftovers.
    current_bits: u8,
    bits_left: u32,
    depth: u32,
}

macro_rules! read_unsigned {
    ($(#[$attr:meta])* $name:ident, $nullable:ident, $ty:ty) => {
        $(#[$attr])*
        pub fn $name(&mut self) -> Result<$ty, Error> {
            let pos = self.position();
            match self.$nullable()? {
                Some(num) => Ok(num),
                None => self.null_primitive(pos),
            }
        }

        pub fn $nullable(&mut self) -> Result<Option<$ty>, Error> {
            self.check_fatal()?;
            self.begin_scalar();
            let mut cur = self.frame.index;
            let pos = self.pos_of(cur);
            let got = match self.decode_unsigned(&mut cur, stringify!($ty))? {
                None => None,
                Some(num) => {
                    let narrowed = num as $ty;
                    if u64::from(narrowed) != num
                        && !self.opt.silently_truncate_large_numbers
                    {
                        return Err(Error::IntegerOverflow {
                            expected: stringify!($ty),
                            position: pos,
                        });
                    }
                    Some(narrowed)
                }
            };
            self.commit(cur);
            Ok(got)
        }
    };
}

macro_rules! read_signed {
    ($(#[$attr:meta])* $name:ident, $nullable:ident, $ty:ty) => {
        $(#[$attr])*
        pub fn $name(&mut self) -> Result<$ty, Error> {
            let pos = self.position();
            match self.$nullable()? {
                Some(num) => Ok(num),
                None => self.null_primitive(pos),
            }
        }

        pub fn $nullable(&mut self) -> Result<Option<$ty>, Error> {
            self.check_fatal()?;
            self.begin_scalar();
            let mut cur = self.frame.index;
            let pos = self.pos_of(cur);
            let got = match self.decode_signed(&mut cur, stringify!($ty))? {
                None => None,
                Some(num) => {
                    let narrowed = num as $ty;
                    if i64::from(narrowed) != num
                        && !self.opt.silently_truncate_large_numbers
                    {
                        return Err(Error::IntegerOverflow {
                            expected: stringify!($ty),
                            position: pos,
                        });
                    }
                    Some(narrowed)
                }
            };
            self.commit(cur);
            Ok(got)
        }
    };
}

impl Reader<SliceScanner> {
    /// A reader over a buffer that is entirely in memory.
    pub fn from_bytes(data: Bytes, opt: Options) -> Reader<SliceScanner> {
        Reader {
            scanner: None,
            frame: Frame {
                buf: data,
                index: 0,
                position_of_buf0: 0,
                pinned_start: usize::max_value(),
            },
            opt,
            fatal: None,
            current_bits: 0,
            bits_left: 0,
            depth: 0,
        }
    }

    pub fn from_slice(data: &[u8], opt: Options) -> Reader<SliceScanner> {
        Reader::from_bytes(Bytes::from(data.to_vec()), opt)
    }
}

impl<S: Scanner> Reader<S> {
    /// A reader pulling windows from `scanner` on demand.
    pub fn new(scanner: S, opt: Options) -> Reader<S> {
        Reader {
            scanner: Some(scanner),
            frame: Frame {
                buf: Bytes::new(),
                index: 0,
                position_of_buf0: 0,
                pinned_start: usize::max_value(),
            },
            opt,
            fatal: None,
            current_bits: 0,
            bits_left: 0,
            depth: 0,
        }
    }

    pub fn options(&self) -> &Options { &self.opt }

    /// Absolute stream offset of the next unread byte.
    pub fn position(&self) -> u64 { self.pos_of(self.frame.index) }

    #[inline]
    fn pos_of(&self, cur: usize) -> u64 { self.frame.position_of_buf0 + cur as u64 }

    #[inline]
    fn check_fatal(&self) -> Result<(), Error> {
        match &self.fatal {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    #[inline]
    fn begin_scalar(&mut self) {
        self.current_bits = 0;
        self.bits_left = 0;
    }

    #[inline]
    fn commit(&mut self, cur: usize) { self.frame.index = cur }

    fn fatal_eof(&mut self, cur: usize) -> Error {
        let err = Error::UnexpectedEof {
            position: self.pos_of(cur),
        };
        self.fatal = Some(err.clone());
        err
    }

    /// Makes sure `required` bytes exist past `cur`, refilling the window
    /// from the scanner when they do not.
    #[inline]
    fn expect_bytes(&mut self, cur: &mut usize, required: usize) -> Result<(), Error> {
        if self.frame.buf.len() - *cur >= required {
            Ok(())
        } else {
            self.read_more(cur, required)
        }
    }

    fn read_more(&mut self, cur: &mut usize, required: usize) -> Result<(), Error> {
        // Everything before the committed index is decoded and, unless
        // pinned, never needed again.
        let skip = self.frame.index.min(self.frame.pinned_start);
        let scanner = match self.scanner.as_mut() {
            Some(s) => s,
            None => {
                let at = self.frame.buf.len();
                return Err(self.fatal_eof(at));
            }
        };
        let min_bytes = (*cur - skip) + required.max(MIN_SCAN_SIZE);
        let buf = scanner.read(skip, min_bytes)?;
        self.frame.buf = buf;
        self.frame.position_of_buf0 += skip as u64;
        self.frame.index -= skip;
        if self.frame.pinned_start != usize::max_value() {
            self.frame.pinned_start -= skip;
        }
        *cur -= skip;
        if self.frame.buf.len() < *cur + required {
            let at = self.frame.buf.len();
            return Err(self.fatal_eof(at));
        }
        Ok(())
    }

    fn null_primitive<T: Default>(&self, position: u64) -> Result<T, Error> {
        if self.opt.read_null_primitives_as_default {
            Ok(T::default())
        } else {
            Err(Error::UnexpectedNull { position })
        }
    }

    fn expect_marker(&mut self, cur: &mut usize, expected: u8) -> Result<(), Error> {
        self.expect_bytes(cur, 1)?;
        let found = self.frame.buf[*cur];
        if found != expected {
            return Err(Error::MissingMarker {
                position: self.pos_of(*cur),
                expected,
                found,
            });
        }
        *cur += 1;
        Ok(())
    }

    /// Decodes an unsigned tiered integer at `cur`; `None` is the null
    /// sentinel. Does not commit.
    fn decode_unsigned(
        &mut self,
        cur: &mut usize,
        expected: &'static str,
    ) -> Result<Option<u64>, Error> {
        self.expect_bytes(cur, 1)?;
        let tag = self.frame.buf[*cur];
        match varint::decode_head(tag) {
            Head::Null => {
                *cur += 1;
                Ok(None)
            }
            Head::Small(k) => {
                self.expect_bytes(cur, 1 + k)?;
                let num = varint::small_unsigned(tag, &self.frame.buf[*cur + 1..*cur + 1 + k]);
                *cur += 1 + k;
                Ok(Some(num))
            }
            Head::Large => self.decode_large(cur, expected, false).map(Some),
        }
    }

    fn decode_signed(
        &mut self,
        cur: &mut usize,
        expected: &'static str,
    ) -> Result<Option<i64>, Error> {
        self.expect_bytes(cur, 1)?;
        let tag = self.frame.buf[*cur];
        match varint::decode_head(tag) {
            Head::Null => {
                *cur += 1;
                Ok(None)
            }
            Head::Small(k) => {
                self.expect_bytes(cur, 1 + k)?;
                let num = varint::small_signed(tag, &self.frame.buf[*cur + 1..*cur + 1 + k]);
                *cur += 1 + k;
                Ok(Some(num))
            }
            Head::Large => self
                .decode_large(cur, expected, true)
                .map(|num| Some(num as i64)),
        }
    }

    /// Decodes the length prefix of a large-format value, rejecting the null
    /// sentinel, a nested large prefix, and anything over `max_number_size`.
    fn decode_large_length(&mut self, cur: &mut usize) -> Result<usize, Error> {
        self.expect_bytes(cur, 1)?;
        let tag = self.frame.buf[*cur];
        let position = self.pos_of(*cur);
        let k = match varint::decode_head(tag) {
            Head::Null => return Err(Error::NullLengthPrefix { position }),
            Head::Large => return Err(Error::NestedLengthPrefix { position, byte: tag }),
            Head::Small(k) => k,
        };
        self.expect_bytes(cur, 1 + k)?;
        let len = varint::small_unsigned(tag, &self.frame.buf[*cur + 1..*cur + 1 + k]);
        *cur += 1 + k;
        if len > self.opt.max_number_size as u64 {
            return Err(Error::OversizedNumber {
                size: len as usize,
                position,
            });
        }
        Ok(len as usize)
    }

    /// Decodes the body of a large-format 64-bit value; `cur` points at the
    /// `0xFE` marker. Returns the bit pattern; the caller interprets it.
    fn decode_large(
        &mut self,
        cur: &mut usize,
        expected: &'static str,
        signed: bool,
    ) -> Result<u64, Error> {
        let position = self.pos_of(*cur);
        *cur += 1;
        let len = self.decode_large_length(cur)?;
        self.expect_bytes(cur, len)?;
        let start = *cur;
        *cur += len;
        let bytes = &self.frame.buf[start..start + len];
        if len == 0 {
            return Ok(0);
        }
        if len <= 8 {
            let num = varint::big_endian(bytes);
            return Ok(if signed && len < 8 {
                varint::sign_extend(num, len) as u64
            } else {
                num
            });
        }
        // more magnitude bytes than the type holds: all excess bytes must be
        // pure sign fill, and the sign of the low 8 must agree
        let low = varint::big_endian(&bytes[len - 8..]);
        let fits = if signed {
            let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
            bytes[..len - 8].iter().all(|&b| b == fill)
                && ((low as i64) < 0) == (fill == 0xFF)
        } else {
            bytes[..len - 8].iter().all(|&b| b == 0)
        };
        if !fits && !self.opt.silently_truncate_large_numbers {
            return Err(Error::IntegerOverflow { expected, position });
        }
        Ok(low)
    }

    read_unsigned!(read_u64, read_nullable_u64, u64);
    read_unsigned!(read_u32, read_nullable_u32, u32);
    read_unsigned!(read_u16, read_nullable_u16, u16);
    read_unsigned!(read_u8, read_nullable_u8, u8);
    read_signed!(read_i64, read_nullable_i64, i64);
    read_signed!(read_i32, read_nullable_i32, i32);
    read_signed!(read_i16, read_nullable_i16, i16);
    read_signed!(read_i8, read_nullable_i8, i8);

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        let pos = self.position();
        match self.read_nullable_bool()? {
            Some(b) => Ok(b),
            None => self.null_primitive(pos),
        }
    }

    pub fn read_nullable_bool(&mut self) -> Result<Option<bool>, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        self.expect_bytes(&mut cur, 1)?;
        let byte = self.frame.buf[cur];
        let position = self.pos_of(cur);
        cur += 1;
        let got = match byte {
            0 => Some(false),
            1 => Some(true),
            TAG_NULL => None,
            byte => return Err(Error::BadBool { position, byte }),
        };
        self.commit(cur);
        Ok(got)
    }

    /// Reads an arbitrary-precision integer: a small-format value, or the
    /// large format's two's-complement byte string at any length up to
    /// `max_number_size`.
    pub fn read_bigint(&mut self) -> Result<BigInt, Error> {
        let pos = self.position();
        match self.read_nullable_bigint()? {
            Some(num) => Ok(num),
            None => self.null_primitive(pos),
        }
    }

    pub fn read_nullable_bigint(&mut self) -> Result<Option<BigInt>, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        self.expect_bytes(&mut cur, 1)?;
        let tag = self.frame.buf[cur];
        let got = match varint::decode_head(tag) {
            Head::Null => {
                cur += 1;
                None
            }
            Head::Small(k) => {
                self.expect_bytes(&mut cur, 1 + k)?;
                let num = varint::small_signed(tag, &self.frame.buf[cur + 1..cur + 1 + k]);
                cur += 1 + k;
                Some(BigInt::from(num))
            }
            Head::Large => {
                cur += 1;
                let len = self.decode_large_length(&mut cur)?;
                self.expect_bytes(&mut cur, len)?;
                let num = BigInt::from_signed_bytes_be(&self.frame.buf[cur..cur + len]);
                cur += len;
                Some(num)
            }
        };
        self.commit(cur);
        Ok(got)
    }

    fn read_fixed<T, F: FnOnce(&[u8]) -> T>(
        &mut self,
        width: usize,
        build: F,
    ) -> Result<T, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        self.expect_bytes(&mut cur, width)?;
        let value = build(&self.frame.buf[cur..cur + width]);
        cur += width;
        self.commit(cur);
        Ok(value)
    }

    /// Nullable fixed-width values carry a standalone presence prefix byte:
    /// the null sentinel, or 0x00 followed by the payload.
    fn read_nullable_fixed<T, F: FnOnce(&[u8]) -> T>(
        &mut self,
        width: usize,
        build: F,
    ) -> Result<Option<T>, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        self.expect_bytes(&mut cur, 1)?;
        let byte = self.frame.buf[cur];
        let position = self.pos_of(cur);
        match byte {
            TAG_NULL => {
                cur += 1;
                self.commit(cur);
                Ok(None)
            }
            PREFIX_PRESENT => {
                cur += 1;
                self.expect_bytes(&mut cur, width)?;
                let value = build(&self.frame.buf[cur..cur + width]);
                cur += width;
                self.commit(cur);
                Ok(Some(value))
            }
            byte => Err(Error::BadPresencePrefix { position, byte }),
        }
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.read_fixed(4, |b| {
            let mut le = [0u8; 4];
            le.copy_from_slice(b);
            f32::from_bits(u32::from_le_bytes(le))
        })
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.read_fixed(8, |b| {
            let mut le = [0u8; 8];
            le.copy_from_slice(b);
            f64::from_bits(u64::from_le_bytes(le))
        })
    }

    pub fn read_decimal(&mut self) -> Result<Decimal128, Error> {
        self.read_fixed(16, |b| {
            let mut le = [0u8; 16];
            le.copy_from_slice(b);
            Decimal128::from_le_bytes(le)
        })
    }

    pub fn read_nullable_f32(&mut self) -> Result<Option<f32>, Error> {
        self.read_nullable_fixed(4, |b| {
            let mut le = [0u8; 4];
            le.copy_from_slice(b);
            f32::from_bits(u32::from_le_bytes(le))
        })
    }

    pub fn read_nullable_f64(&mut self) -> Result<Option<f64>, Error> {
        self.read_nullable_fixed(8, |b| {
            let mut le = [0u8; 8];
            le.copy_from_slice(b);
            f64::from_bits(u64::from_le_bytes(le))
        })
    }

    pub fn read_nullable_decimal(&mut self) -> Result<Option<Decimal128>, Error> {
        self.read_nullable_fixed(16, |b| {
            let mut le = [0u8; 16];
            le.copy_from_slice(b);
            Decimal128::from_le_bytes(le)
        })
    }

    /// Reads a length-prefixed byte string, zero-copy out of the current
    /// window.
    pub fn read_bytes(&mut self) -> Result<Bytes, Error> {
        let pos = self.position();
        match self.read_nullable_bytes()? {
            Some(b) => Ok(b),
            None => self.null_primitive(pos),
        }
    }

    pub fn read_nullable_bytes(&mut self) -> Result<Option<Bytes>, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        self.expect_bytes(&mut cur, 1)?;
        // a null string is a bare sentinel, no markers
        if self.frame.buf[cur] == TAG_NULL {
            cur += 1;
            self.commit(cur);
            return Ok(None);
        }
        if self.opt.markers.contains(Markers::LIST_START) {
            self.expect_marker(&mut cur, MARKER_LIST_START)?;
        }
        let len_pos = self.pos_of(cur);
        let len = match self.decode_unsigned(&mut cur, "length")? {
            Some(len) => len as usize,
            None => return Err(Error::NullLengthPrefix { position: len_pos }),
        };
        self.expect_bytes(&mut cur, len)?;
        let payload = self.frame.buf.slice(cur, cur + len);
        cur += len;
        if self.opt.markers.contains(Markers::LIST_END) {
            self.expect_marker(&mut cur, MARKER_LIST_END)?;
        }
        self.commit(cur);
        Ok(Some(payload))
    }

    /// Like [`Reader::read_bytes`] but validates the payload as UTF-8. Text
    /// that must round-trip even when malformed should go through
    /// `read_bytes` instead.
    pub fn read_str(&mut self) -> Result<String, Error> {
        let pos = self.position();
        match self.read_nullable_str()? {
            Some(s) => Ok(s),
            None => self.null_primitive(pos),
        }
    }

    pub fn read_nullable_str(&mut self) -> Result<Option<String>, Error> {
        let pos = self.position();
        match self.read_nullable_bytes()? {
            None => Ok(None),
            Some(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(s) => Ok(Some(s)),
                Err(_) => Err(Error::InvalidUtf8 { position: pos }),
            },
        }
    }

    /// Consumes a list header and returns the element count.
    pub fn begin_list(&mut self) -> Result<usize, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        if self.opt.markers.contains(Markers::LIST_START) {
            self.expect_marker(&mut cur, MARKER_LIST_START)?;
        }
        let len_pos = self.pos_of(cur);
        let len = match self.decode_unsigned(&mut cur, "length")? {
            Some(len) => len as usize,
            None => return Err(Error::NullLengthPrefix { position: len_pos }),
        };
        self.commit(cur);
        self.depth += 1;
        Ok(len)
    }

    pub fn end_list(&mut self) -> Result<(), Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        if self.opt.markers.contains(Markers::LIST_END) {
            self.expect_marker(&mut cur, MARKER_LIST_END)?;
        }
        self.commit(cur);
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    pub fn begin_object(&mut self) -> Result<(), Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        if self.opt.markers.contains(Markers::OBJECT_START) {
            let expected = if self.depth & 1 != 0 {
                MARKER_OBJECT_ODD
            } else {
                MARKER_OBJECT_EVEN
            };
            self.expect_marker(&mut cur, expected)?;
        }
        self.commit(cur);
        self.depth += 1;
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<(), Error> {
        self.check_fatal()?;
        self.begin_scalar();
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    pub fn read_type_tag(&mut self) -> Result<String, Error> {
        self.check_fatal()?;
        self.begin_scalar();
        let mut cur = self.frame.index;
        if self.opt.markers.contains(Markers::TYPE_TAG) {
            self.expect_marker(&mut cur, MARKER_TYPE_TAG)?;
        }
        self.commit(cur);
        self.read_str()
    }

    /// Reads a bitfield of `bitfield_size` bits (at most 64), packed
    /// LSB-first and contiguous with any directly preceding bitfield read.
    pub fn read_bitfield_u64(&mut self, bitfield_size: u32) -> Result<u64, Error> {
        debug_assert!(bitfield_size <= 64);
        self.check_fatal()?;
        let mut cur = self.frame.index;
        let mut value = 0u64;
        let mut got = 0u32;
        let mut remaining = bitfield_size;
        while remaining > 0 {
            if self.bits_left == 0 {
                self.expect_bytes(&mut cur, 1)?;
                self.current_bits = self.frame.buf[cur];
                cur += 1;
                self.bits_left = 8;
            }
            let take = self.bits_left.min(remaining);
            value |= (u64::from(self.current_bits) & varint::bit_mask(take)) << got;
            self.current_bits = if take == 8 { 0 } else { self.current_bits >> take };
            self.bits_left -= take;
            got += take;
            remaining -= take;
        }
        self.commit(cur);
        Ok(value)
    }

    pub fn read_bitfield_u32(&mut self, bitfield_size: u32) -> Result<u32, Error> {
        debug_assert!(bitfield_size <= 32);
        self.read_bitfield_u64(bitfield_size).map(|v| v as u32)
    }

    /// Reads an unbounded bitfield in 64-bit chunks, least significant first.
    pub fn read_bitfield_big(&mut self, bitfield_size: u64) -> Result<BigUint, Error> {
        let mut bytes_le = Vec::with_capacity(((bitfield_size + 7) / 8) as usize);
        let mut remaining = bitfield_size;
        while remaining > 0 {
            let take = remaining.min(64) as u32;
            let limb = self.read_bitfield_u64(take)?;
            bytes_le.extend_from_slice(&limb.to_le_bytes()[..((take as usize + 7) / 8)]);
            remaining -= u64::from(take);
        }
        Ok(BigUint::from_bytes_le(&bytes_le))
    }
}
