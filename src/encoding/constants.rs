/// Large-format marker: unsigned length prefix + big-endian magnitude, 0xfe
pub(crate) const TAG_LARGE: u8 = 0b1111_1110;
/// Null sentinel, 0xff
pub(crate) const TAG_NULL: u8 = 0b1111_1111;
/// Presence prefix of a non-null nullable fixed-width value.
pub(crate) const PREFIX_PRESENT: u8 = 0x00;

/// Most extra payload bytes a small-format integer can carry.
pub(crate) const MAX_SMALL_EXTRA: usize = 6;

/// Minimum bytes requested from a scanner on refill. The scanner may choose a
/// much larger window; this is the least we will tolerate.
pub(crate) const MIN_SCAN_SIZE: usize = 32;

pub(crate) const MARKER_LIST_START: u8 = b'[';
pub(crate) const MARKER_LIST_END: u8 = b']';
/// Object-start marker at even depth.
pub(crate) const MARKER_OBJECT_EVEN: u8 = b'{';
/// Object-start marker at odd depth.
pub(crate) const MARKER_OBJECT_ODD: u8 = b'(';
pub(crate) const MARKER_TYPE_TAG: u8 = b'T';
