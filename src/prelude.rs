//! Everything a typical user of the codec needs, in one import.

pub use crate::{
    decimal::Decimal128,
    encoding::{Reader, Sink, Writer},
    errors::Error,
    options::{Markers, Options},
    scanner::{IoScanner, Scanner, SliceScanner},
};
pub use bytes::Bytes;
pub use num_bigint::{BigInt, BigUint};
