//! # vlbin
//!
//! `vlbin` is a self-describing variable-length binary codec: a pair of
//! single-use state machines, [`Writer`](encoding::Writer) and
//! [`Reader`](encoding::Reader), that turn primitive values into a compact
//! byte stream and back without any schema or reflection layer.
//!
//! # Usage
//!
//! Writes and reads are explicit calls made in the same order on both sides:
//!
//! ```
//! use vlbin::prelude::*;
//!
//! let mut w = Writer::new(Vec::new(), Options::default());
//! w.write_str("position");
//! w.write_i32(-42);
//! w.write_nullable_u16(None);
//! let encoded = w.finish();
//!
//! let mut r = Reader::from_slice(&encoded, Options::default());
//! assert_eq!(r.read_str().unwrap(), "position");
//! assert_eq!(r.read_i32().unwrap(), -42);
//! assert_eq!(r.read_nullable_u16().unwrap(), None);
//! ```
//!
//! Decoding can also stream from any [`std::io::Read`] through an
//! [`IoScanner`](scanner::IoScanner), holding only a small window of the
//! input in memory at a time.
//!
//! # An overview of the format
//!
//! ## Integers
//!
//! Every integer starts with a tag byte whose count of leading 1-bits is the
//! count of extra payload bytes that follow it:
//!
//! | Tag byte     | Total size | Usable bits |
//! | ---          | ---        | ---         |
//! | `0xxxxxxx`   | 1 byte     | 7           |
//! | `10xxxxxx`   | 2 bytes    | 14          |
//! | `110xxxxx`   | 3 bytes    | 21          |
//! | `1110xxxx`   | 4 bytes    | 28          |
//! | `11110xxx`   | 5 bytes    | 35          |
//! | `111110xx`   | 6 bytes    | 42          |
//! | `1111110x`   | 7 bytes    | 49          |
//! | `11111110`   | varies     | unbounded   |
//! | `11111111`   | 1 byte     | null        |
//!
//! The low bits of the tag are the most significant magnitude bits; the extra
//! payload bytes follow big-endian. Signed values are plain two's complement
//! within the usable bits, sign-extended by the reader from the highest bit
//! present, and every writer picks the smallest size that fits. `0xFE`
//! introduces the large format (an unsigned length prefix and that many
//! big-endian magnitude bytes), used for 64-bit values past 49 bits and for
//! [`BigInt`](num_bigint::BigInt)s of any size up to the configured cap.
//! `0xFF` is the null sentinel, distinct from zero, false, and empty.
//!
//! ## Fixed-width values
//!
//! `f32`, `f64`, and [`Decimal128`](decimal::Decimal128) are written as their
//! raw bit patterns, little-endian, with no tag (4, 8, and 16 bytes). Their
//! nullable forms carry one presence prefix byte: `0xFF` for null, `0x00`
//! followed by the payload otherwise.
//!
//! ## Strings and byte strings
//!
//! A length prefix (an unsigned integer as above) followed by the payload
//! verbatim. `read_bytes` round-trips any payload; `read_str` additionally
//! validates UTF-8.
//!
//! ## Bitfields
//!
//! Consecutive bitfield writes pack LSB-first into shared bytes with no
//! padding between them; any other operation finalizes the partial byte,
//! zero-filling its unused high bits.
//!
//! ## Markers
//!
//! [`Options`](options::Options) can enable single-byte structural markers
//! (`[`, `]`, `{`/`(`, `T`) around lists, objects, strings, and type tags,
//! trading a little size for streams that are easy to eyeball in a hex dump.
//! Reader and writer options must agree.

#![warn(
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    missing_copy_implementations,
    missing_debug_implementations,
    macro_use_extern_crate,
    unreachable_pub,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![allow(clippy::cast_lossless)]

pub mod decimal;
pub mod encoding;
pub mod errors;
pub mod options;
pub mod prelude;
pub mod scanner;
