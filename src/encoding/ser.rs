use super::{constants::*, varint};
use crate::{
    decimal::Decimal128,
    errors::Error,
    options::{Markers, Options},
};
use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;

/// A push-based byte sink: a growable buffer the writer appends to.
pub trait Sink {
    /// The type of the finished output value.
    type Out;
    /// Appends a byte.
    fn put_u8(&mut self, u: u8);
    /// Appends a slice.
    fn put_slice(&mut self, slice: &[u8]);
    /// Returns the finished output value.
    fn finalize(self) -> Self::Out;
}

impl Sink for Vec<u8> {
    type Out = Self;

    fn put_u8(&mut self, u: u8) { self.push(u) }

    fn put_slice(&mut self, slice: &[u8]) { self.extend_from_slice(slice) }

    fn finalize(self) -> Self::Out { self }
}

/// The encoder state machine. Single-use: construct one per serialization
/// session and consume it with [`Writer::finish`].
#[derive(Debug)]
pub struct Writer<S: Sink> {
    out: S,
    opt: Options,
    written: u64,
    // Bit cursor: the not-yet-emitted partial byte of a bitfield run and how
    // many of its bits are still unused. Any non-bitfield write finalizes the
    // byte first; bitfields are only packable against each other.
    pending: u8,
    bits_left: u32,
    depth: u32,
}

macro_rules! write_nullable {
    ($(#[$attr:meta])* $name:ident, $write:ident, $ty:ty) => {
        $(#[$attr])*
        pub fn $name(&mut self, num: Option<$ty>) {
            match num {
                None => self.write_null(),
                Some(n) => self.$write(n),
            }
        }
    };
}

impl<S: Sink> Writer<S> {
    pub fn new(out: S, opt: Options) -> Writer<S> {
        Writer {
            out,
            opt,
            written: 0,
            pending: 0,
            bits_left: 0,
            depth: 0,
        }
    }

    pub fn options(&self) -> &Options { &self.opt }

    /// Bytes emitted so far, counting a partial bitfield byte as emitted.
    pub fn position(&self) -> u64 { self.written + (self.bits_left != 0) as u64 }

    /// Flushes any partial bitfield byte and returns the finished output.
    pub fn finish(mut self) -> S::Out {
        self.flush_bits();
        self.out.finalize()
    }

    #[inline]
    fn emit_u8(&mut self, b: u8) {
        self.written += 1;
        self.out.put_u8(b);
    }

    #[inline]
    fn emit_slice(&mut self, s: &[u8]) {
        self.written += s.len() as u64;
        self.out.put_slice(s);
    }

    // Finalizes a partial bitfield byte; its unused high bits stay zero.
    #[inline]
    fn flush_bits(&mut self) {
        if self.bits_left != 0 {
            let byte = self.pending;
            self.pending = 0;
            self.bits_left = 0;
            self.emit_u8(byte);
        }
    }

    /// Writes the null sentinel.
    pub fn write_null(&mut self) {
        self.flush_bits();
        self.emit_u8(TAG_NULL);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.flush_bits();
        self.emit_u8(value as u8);
    }

    pub fn write_nullable_bool(&mut self, value: Option<bool>) {
        self.flush_bits();
        self.emit_u8(match value {
            None => TAG_NULL,
            Some(b) => b as u8,
        });
    }

    #[inline]
    pub fn write_u64(&mut self, num: u64) {
        self.flush_bits();
        // fast path for small numbers
        if num < 128 {
            self.emit_u8(num as u8);
        } else {
            let enc = varint::encode_u64(num);
            self.emit_slice(&enc);
        }
    }

    #[inline]
    pub fn write_i64(&mut self, num: i64) {
        self.flush_bits();
        // fast path for small non-negative numbers
        if (num as u64) < 64 {
            self.emit_u8(num as u8);
        } else {
            let enc = varint::encode_i64(num);
            self.emit_slice(&enc);
        }
    }

    #[inline]
    pub fn write_u32(&mut self, num: u32) { self.write_u64(u64::from(num)) }

    #[inline]
    pub fn write_u16(&mut self, num: u16) { self.write_u64(u64::from(num)) }

    #[inline]
    pub fn write_u8(&mut self, num: u8) { self.write_u64(u64::from(num)) }

    #[inline]
    pub fn write_i32(&mut self, num: i32) { self.write_i64(i64::from(num)) }

    #[inline]
    pub fn write_i16(&mut self, num: i16) { self.write_i64(i64::from(num)) }

    #[inline]
    pub fn write_i8(&mut self, num: i8) { self.write_i64(i64::from(num)) }

    write_nullable!(write_nullable_u64, write_u64, u64);
    write_nullable!(write_nullable_u32, write_u32, u32);
    write_nullable!(write_nullable_u16, write_u16, u16);
    write_nullable!(write_nullable_u8, write_u8, u8);
    write_nullable!(write_nullable_i64, write_i64, i64);
    write_nullable!(write_nullable_i32, write_i32, i32);
    write_nullable!(write_nullable_i16, write_i16, i16);
    write_nullable!(write_nullable_i8, write_i8, i8);

    /// Writes an arbitrary-precision integer. Values inside the `i64` range
    /// use the ordinary tiered path; anything larger uses the large format
    /// with its minimal two's-complement byte string.
    ///
    /// An integer longer than `Options::max_number_size` bytes is reported
    /// immediately; the writer stays usable.
    pub fn write_bigint(&mut self, num: &BigInt) -> Result<(), Error> {
        self.flush_bits();
        if let Some(i) = num.to_i64() {
            self.write_i64(i);
            return Ok(());
        }
        let bytes = num.to_signed_bytes_be();
        if bytes.len() > self.opt.max_number_size {
            return Err(Error::OversizedNumber {
                size: bytes.len(),
                position: self.position(),
            });
        }
        self.emit_u8(TAG_LARGE);
        self.write_u64(bytes.len() as u64);
        self.emit_slice(&bytes);
        Ok(())
    }

    pub fn write_nullable_bigint(&mut self, num: Option<&BigInt>) -> Result<(), Error> {
        match num {
            None => {
                self.write_null();
                Ok(())
            }
            Some(n) => self.write_bigint(n),
        }
    }

    /// Writes an `f32` as 4 little-endian bytes of its bit pattern, with no
    /// tag. NaN payloads round-trip exactly.
    pub fn write_f32(&mut self, num: f32) {
        self.flush_bits();
        self.emit_slice(&num.to_bits().to_le_bytes());
    }

    /// Writes an `f64` as 8 little-endian bytes of its bit pattern.
    pub fn write_f64(&mut self, num: f64) {
        self.flush_bits();
        self.emit_slice(&num.to_bits().to_le_bytes());
    }

    /// Writes a 128-bit decimal as 16 little-endian bytes.
    pub fn write_decimal(&mut self, num: Decimal128) {
        self.flush_bits();
        self.emit_slice(&num.to_le_bytes());
    }

    /// Fixed-width values have no tag byte, so their nullable form carries a
    /// standalone presence prefix: the null sentinel, or 0x00 + payload.
    pub fn write_nullable_f32(&mut self, num: Option<f32>) {
        match num {
            None => self.write_null(),
            Some(n) => {
                self.flush_bits();
                self.emit_u8(PREFIX_PRESENT);
                self.write_f32(n);
            }
        }
    }

    pub fn write_nullable_f64(&mut self, num: Option<f64>) {
        match num {
            None => self.write_null(),
            Some(n) => {
                self.flush_bits();
                self.emit_u8(PREFIX_PRESENT);
                self.write_f64(n);
            }
        }
    }

    pub fn write_nullable_decimal(&mut self, num: Option<Decimal128>) {
        match num {
            None => self.write_null(),
            Some(n) => {
                self.flush_bits();
                self.emit_u8(PREFIX_PRESENT);
                self.write_decimal(n);
            }
        }
    }

    /// Writes a length-prefixed byte string. The payload is passed through
    /// verbatim, so text that is not valid UTF-8 round-trips byte-for-byte.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.flush_bits();
        if self.opt.markers.contains(Markers::LIST_START) {
            self.emit_u8(MARKER_LIST_START);
        }
        self.write_u64(bytes.len() as u64);
        self.emit_slice(bytes);
        if self.opt.markers.contains(Markers::LIST_END) {
            self.emit_u8(MARKER_LIST_END);
        }
    }

    pub fn write_str(&mut self, s: &str) { self.write_bytes(s.as_bytes()) }

    pub fn write_nullable_bytes(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            None => self.write_null(),
            Some(b) => self.write_bytes(b),
        }
    }

    pub fn write_nullable_str(&mut self, s: Option<&str>) {
        self.write_nullable_bytes(s.map(str::as_bytes))
    }

    /// Starts a list of `len` elements: optional `[` marker plus the length.
    pub fn begin_list(&mut self, len: usize) {
        self.flush_bits();
        if self.opt.markers.contains(Markers::LIST_START) {
            self.emit_u8(MARKER_LIST_START);
        }
        self.write_u64(len as u64);
        self.depth += 1;
    }

    pub fn end_list(&mut self) {
        self.flush_bits();
        debug_assert!(self.depth > 0);
        self.depth -= 1;
        if self.opt.markers.contains(Markers::LIST_END) {
            self.emit_u8(MARKER_LIST_END);
        }
    }

    /// Starts a sub-object: optional `{`/`(` marker, alternating by depth.
    pub fn begin_object(&mut self) {
        self.flush_bits();
        if self.opt.markers.contains(Markers::OBJECT_START) {
            self.emit_u8(if self.depth & 1 != 0 {
                MARKER_OBJECT_ODD
            } else {
                MARKER_OBJECT_EVEN
            });
        }
        self.depth += 1;
    }

    pub fn end_object(&mut self) {
        self.flush_bits();
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// Writes a type tag: optional `T` marker plus the tag string.
    pub fn write_type_tag(&mut self, tag: &str) {
        self.flush_bits();
        if self.opt.markers.contains(Markers::TYPE_TAG) {
            self.emit_u8(MARKER_TYPE_TAG);
        }
        self.write_str(tag);
    }

    /// Writes the low `bitfield_size` bits of `value` (at most 64),
    /// least-significant-bit first, packed contiguously with any directly
    /// preceding bitfield write.
    pub fn write_bitfield_u64(&mut self, mut value: u64, mut bitfield_size: u32) {
        debug_assert!(bitfield_size <= 64);

        // the beginning bits: fill the pending partial byte
        let bits_left = self.bits_left;
        if bits_left != 0 {
            if bits_left >= bitfield_size {
                self.pending |=
                    ((value & varint::bit_mask(bitfield_size)) as u8) << (8 - bits_left);
                self.bits_left = bits_left - bitfield_size;
                if self.bits_left == 0 {
                    let byte = self.pending;
                    self.pending = 0;
                    self.emit_u8(byte);
                }
                return;
            }
            self.pending |= (value as u8) << (8 - bits_left);
            let byte = self.pending;
            self.pending = 0;
            self.bits_left = 0;
            self.emit_u8(byte);
            value >>= bits_left;
            bitfield_size -= bits_left;
        }

        // the middle bytes, least significant first
        while bitfield_size >= 8 {
            self.emit_u8(value as u8);
            value >>= 8;
            bitfield_size -= 8;
        }

        // the ending bits open a new partial byte
        if bitfield_size != 0 {
            self.pending = (value & varint::bit_mask(bitfield_size)) as u8;
            self.bits_left = 8 - bitfield_size;
        }
    }

    pub fn write_bitfield_u32(&mut self, value: u32, bitfield_size: u32) {
        debug_assert!(bitfield_size <= 32);
        self.write_bitfield_u64(u64::from(value), bitfield_size)
    }

    /// Writes an unbounded bitfield from the low `bitfield_size` bits of a
    /// big unsigned integer, in 64-bit chunks, least significant first.
    pub fn write_bitfield_big(&mut self, value: &BigUint, bitfield_size: u64) {
        let bytes = value.to_bytes_le();
        let mut remaining = bitfield_size;
        let mut offset = 0;
        while remaining > 0 {
            let take = remaining.min(64) as u32;
            let mut limb = 0u64;
            for j in 0..8 {
                if offset + j < bytes.len() {
                    limb |= u64::from(bytes[offset + j]) << (8 * j);
                }
            }
            self.write_bitfield_u64(limb, take);
            offset += 8;
            remaining -= u64::from(take);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> Writer<Vec<u8>> { Writer::new(Vec::new(), Options::default()) }

    #[test]
    fn bitfields_pack_into_whole_bytes() {
        let mut w = writer();
        w.write_bitfield_u32(0b101, 3);
        w.write_bitfield_u32(0b10110, 5);
        let out = w.finish();
        assert_eq!(out, vec![0b10110_101]);
    }

    #[test]
    fn bitfield_tail_spans_bytes() {
        let mut w = writer();
        w.write_bitfield_u64(0xABCD, 16);
        w.write_bitfield_u64(0b11, 2);
        let out = w.finish();
        assert_eq!(out, vec![0xCD, 0xAB, 0b0000_0011]);
    }

    #[test]
    fn non_bitfield_write_flushes_with_zero_fill() {
        let mut w = writer();
        w.write_bitfield_u32(0b1, 1);
        w.write_u32(5);
        let out = w.finish();
        assert_eq!(out, vec![0b0000_0001, 5]);
    }

    #[test]
    fn leftover_capacity_is_not_reused_later() {
        let mut w = writer();
        w.write_bitfield_u32(0b1, 1);
        w.write_bool(true);
        w.write_bitfield_u32(0b1, 1);
        let out = w.finish();
        // the second bitfield starts a fresh byte
        assert_eq!(out, vec![0b0000_0001, 1, 0b0000_0001]);
    }

    #[test]
    fn position_counts_partial_bytes() {
        let mut w = writer();
        assert_eq!(w.position(), 0);
        w.write_bitfield_u32(0b101, 3);
        assert_eq!(w.position(), 1);
        w.write_bitfield_u32(0b10110, 5);
        assert_eq!(w.position(), 1);
        w.write_u32(300);
        assert_eq!(w.position(), 3);
    }

    #[test]
    fn oversized_bigint_does_not_poison_the_writer() {
        let mut w = Writer::new(
            Vec::new(),
            Options {
                max_number_size: 4,
                ..Options::default()
            },
        );
        let big = BigInt::from(1u64) << 200;
        match w.write_bigint(&big) {
            Err(Error::OversizedNumber { size, .. }) => assert_eq!(size, 26),
            other => panic!("expected OversizedNumber, got {:?}", other),
        }
        w.write_u32(7);
        assert_eq!(w.finish(), vec![7]);
    }
}
