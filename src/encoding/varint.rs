//! The numeric tier codec: pure functions mapping an integer to its
//! variable-length wire form and back. Shared by the writer and the reader;
//! nothing here touches a buffer or a byte source.
//!
//! A small-format value with `k` leading 1-bits in its tag byte carries `k`
//! extra payload bytes and `7k + 7` usable bits: the low `7 - k` bits of the
//! tag are the most-significant magnitude bits, the payload is big-endian.
//! Signed values are plain two's complement within those usable bits, so the
//! reader sign-extends from bit `7k + 6` and a negative value's tag magnitude
//! bits come out all ones. Values needing more than 49 bits switch to the
//! large format: the `0xFE` marker, an unsigned length prefix, and that many
//! big-endian magnitude bytes.

use super::constants::*;
use smallvec::SmallVec;

/// An encoded integer: at most one tag byte, a one-byte length prefix, and
/// eight magnitude bytes.
pub(crate) type EncodedInt = SmallVec<[u8; 10]>;

/// What the first byte of a value says about the rest of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Head {
    /// The null sentinel.
    Null,
    /// Large format: a length prefix follows.
    Large,
    /// Small format carrying this many extra payload bytes (0..=6).
    Small(usize),
}

#[inline]
pub(crate) fn decode_head(byte: u8) -> Head {
    match byte {
        TAG_NULL => Head::Null,
        TAG_LARGE => Head::Large,
        b => Head::Small((!b).leading_zeros() as usize),
    }
}

/// Extra payload bytes needed for an unsigned value, or `None` when only the
/// large format can hold it.
#[inline]
pub(crate) fn small_extra_unsigned(num: u64) -> Option<usize> {
    let bits = 64 - num.leading_zeros() as usize;
    if bits <= 7 {
        Some(0)
    } else if bits <= 7 * MAX_SMALL_EXTRA + 7 {
        Some((bits - 1) / 7)
    } else {
        None
    }
}

/// Extra payload bytes needed for a signed value in two's complement
/// (significant bits of the magnitude plus a sign bit), or `None` when only
/// the large format can hold it.
#[inline]
pub(crate) fn small_extra_signed(num: i64) -> Option<usize> {
    let need = 65 - non_negative(num).leading_zeros() as usize;
    if need <= 7 {
        Some(0)
    } else if need <= 7 * MAX_SMALL_EXTRA + 7 {
        Some((need - 1) / 7)
    } else {
        None
    }
}

/// `num` itself when non-negative, otherwise `!num`: the quantity whose bit
/// count decides the tier.
#[inline]
fn non_negative(num: i64) -> u64 {
    if num >= 0 {
        num as u64
    } else {
        !(num as u64)
    }
}

pub(crate) fn encode_u64(num: u64) -> EncodedInt {
    let mut out = EncodedInt::new();
    match small_extra_unsigned(num) {
        Some(k) => push_small(&mut out, k, num),
        None => {
            let bytes = (71 - num.leading_zeros() as usize) / 8;
            push_large(&mut out, bytes, num);
        }
    }
    out
}

pub(crate) fn encode_i64(num: i64) -> EncodedInt {
    let mut out = EncodedInt::new();
    match small_extra_signed(num) {
        Some(k) => push_small(&mut out, k, num as u64),
        None => {
            let need = 65 - non_negative(num).leading_zeros() as usize;
            push_large(&mut out, (need + 7) / 8, num as u64);
        }
    }
    out
}

fn push_small(out: &mut EncodedInt, k: usize, num: u64) {
    debug_assert!(k <= MAX_SMALL_EXTRA);
    let ones = !(0xFFu8 >> k);
    out.push(ones | ((num >> (8 * k)) as u8 & (0x7F >> k)));
    for i in (0..k).rev() {
        out.push((num >> (8 * i)) as u8);
    }
}

fn push_large(out: &mut EncodedInt, bytes: usize, num: u64) {
    debug_assert!(bytes >= 7 && bytes <= 8);
    out.push(TAG_LARGE);
    // the length prefix always fits the single-byte tier here
    out.push(bytes as u8);
    for i in (0..bytes).rev() {
        out.push((num >> (8 * i)) as u8);
    }
}

/// Reconstructs an unsigned small-format value from its tag byte and the `k`
/// payload bytes that followed it.
#[inline]
pub(crate) fn small_unsigned(tag: u8, rest: &[u8]) -> u64 {
    let k = rest.len();
    let extra = (tag & (0x7F >> k)) as u64;
    (extra << (8 * k)) | big_endian(rest)
}

/// Same, but sign-extended from the highest bit present (bit `7k + 6`).
#[inline]
pub(crate) fn small_signed(tag: u8, rest: &[u8]) -> i64 {
    let k = rest.len();
    let extra = (tag & (0x7F >> k)) as i64;
    let shift = 57 + k;
    let high = (extra << shift) >> (shift - 8 * k);
    high | big_endian(rest) as i64
}

/// Big-endian reconstruction of up to 8 bytes.
#[inline]
pub(crate) fn big_endian(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Sign-extends a value reconstructed from `bytes` big-endian bytes.
#[inline]
pub(crate) fn sign_extend(num: u64, bytes: usize) -> i64 {
    debug_assert!(bytes >= 1 && bytes <= 8);
    let shift = 64 - 8 * bytes;
    ((num << shift) as i64) >> shift
}

/// The low `n` bits set, for `n <= 64`.
#[inline]
pub(crate) fn bit_mask(n: u32) -> u64 {
    if n >= 64 {
        !0
    } else {
        (1u64 << n) - 1
    }
}
