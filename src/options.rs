use std::ops::{BitOr, BitOrAssign};

/// Flags selecting which optional single-byte structural markers are written
/// around lists, objects, strings, and type tags.
///
/// Markers make a stream slightly larger but much easier to eyeball in a hex
/// dump. Reader and writer must agree on them: the reader verifies and
/// consumes exactly the markers its options enable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Markers(u8);

impl Markers {
    /// No markers (the default).
    pub const NONE: Markers = Markers(0);
    /// `[` before each list or string.
    pub const LIST_START: Markers = Markers(1);
    /// `]` after each list or string.
    pub const LIST_END: Markers = Markers(1 << 1);
    /// `{` (even depth) or `(` (odd depth) before each sub-object.
    pub const OBJECT_START: Markers = Markers(1 << 2);
    /// `T` before each type tag.
    pub const TYPE_TAG: Markers = Markers(1 << 3);
    /// Every marker.
    pub const ALL: Markers = Markers(0b1111);

    /// Whether every flag in `other` is set in `self`.
    pub fn contains(self, other: Markers) -> bool { self.0 & other.0 == other.0 }
}

impl BitOr for Markers {
    type Output = Markers;

    fn bitor(self, rhs: Markers) -> Markers { Markers(self.0 | rhs.0) }
}

impl BitOrAssign for Markers {
    fn bitor_assign(&mut self, rhs: Markers) { self.0 |= rhs.0 }
}

/// Immutable codec configuration; created once, read many times.
#[derive(Clone, Debug)]
pub struct Options {
    /// Upper bound, in bytes, on the length of a large-format integer. Bounds
    /// worst-case memory allocation during decode and rejects oversized
    /// `BigInt`s during encode.
    pub max_number_size: usize,
    /// When a decoded number does not fit the requested type, truncate it
    /// instead of reporting `Error::IntegerOverflow`.
    pub silently_truncate_large_numbers: bool,
    /// When a null sentinel is read into a non-nullable slot, yield the
    /// type's default value instead of reporting `Error::UnexpectedNull`.
    pub read_null_primitives_as_default: bool,
    /// Which structural marker bytes are emitted and expected.
    pub markers: Markers,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            max_number_size: 65536,
            silently_truncate_large_numbers: false,
            read_null_primitives_as_default: false,
            markers: Markers::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_flags() {
        let m = Markers::LIST_START | Markers::TYPE_TAG;
        assert!(m.contains(Markers::LIST_START));
        assert!(m.contains(Markers::TYPE_TAG));
        assert!(!m.contains(Markers::LIST_END));
        assert!(Markers::ALL.contains(m));
        assert!(m.contains(Markers::NONE));
    }
}
