//! The wire codec: [`Writer`] turns primitives into bytes, [`Reader`] turns
//! bytes back into primitives. The numeric tier selection itself lives in
//! [`varint`]; this module's submodules own the state machines around it.

mod constants;
mod varint;

pub mod de;
pub mod ser;

pub use de::Reader;
pub use ser::{Sink, Writer};
