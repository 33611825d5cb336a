use std::convert::TryFrom;

/// A 128-bit decimal stored as its raw bit pattern, in the style of
/// [`f32::to_bits`]/[`f32::from_bits`].
///
/// The codec does not interpret the bits; it writes them as 16 little-endian
/// bytes and reads them back verbatim, so any 128-bit decimal representation
/// round-trips exactly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decimal128(u128);

impl Decimal128 {
    /// Wraps a raw bit pattern.
    pub fn from_bits(bits: u128) -> Decimal128 { Decimal128(bits) }

    /// The raw bit pattern.
    pub fn to_bits(self) -> u128 { self.0 }

    /// Reconstructs a decimal from its 16-byte little-endian wire form.
    pub fn from_le_bytes(bytes: [u8; 16]) -> Decimal128 {
        Decimal128(u128::from_le_bytes(bytes))
    }

    /// The 16-byte little-endian wire form.
    pub fn to_le_bytes(self) -> [u8; 16] { self.0.to_le_bytes() }
}

impl From<u128> for Decimal128 {
    fn from(bits: u128) -> Decimal128 { Decimal128(bits) }
}

impl From<Decimal128> for u128 {
    fn from(d: Decimal128) -> u128 { d.0 }
}

impl TryFrom<&[u8]> for Decimal128 {
    type Error = ();

    fn try_from(bytes: &[u8]) -> Result<Decimal128, ()> {
        if bytes.len() == 16 {
            let mut le = [0u8; 16];
            le.copy_from_slice(bytes);
            Ok(Decimal128::from_le_bytes(le))
        } else {
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_roundtrip() {
        let d = Decimal128::from_bits(0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10);
        assert_eq!(Decimal128::from_le_bytes(d.to_le_bytes()), d);
        assert_eq!(d.to_le_bytes()[0], 0x10);
        assert_eq!(d.to_le_bytes()[15], 0x01);
    }
}
