use failure::Fail;

/// Everything that can go wrong while encoding or decoding.
///
/// Every variant produced by the decoder carries the absolute position of the
/// offending byte in the logical stream and, where one exists, the byte itself.
/// The error is cheap to clone so the reader can latch a fatal error and hand
/// out the same value from every subsequent call.
#[derive(Clone, Debug, PartialEq, Eq, Fail)]
pub enum Error {
    /// The byte source ran dry mid-value. Fatal: the reader is unusable once
    /// this has been returned.
    #[fail(display = "data stream ended unexpectedly (at byte {})", position)]
    UnexpectedEof { position: u64 },

    /// A large-format integer whose length prefix is the null sentinel.
    #[fail(display = "number length is null (at byte {})", position)]
    NullLengthPrefix { position: u64 },

    /// A large-format integer whose length prefix is itself length-prefixed.
    #[fail(
        display = "length prefix is itself length-prefixed (at byte {}, tag 0x{:02X})",
        position, byte
    )]
    NestedLengthPrefix { position: u64, byte: u8 },

    /// The decoded value does not fit the requested type.
    #[fail(display = "number is too large, expected {} (at byte {})", expected, position)]
    IntegerOverflow {
        expected: &'static str,
        position: u64,
    },

    /// A number longer than `Options::max_number_size` bytes.
    #[fail(
        display = "number of {} bytes exceeds the configured maximum (at byte {})",
        size, position
    )]
    OversizedNumber { size: usize, position: u64 },

    /// A null sentinel where a non-nullable value was requested.
    #[fail(display = "unexpected null (at byte {})", position)]
    UnexpectedNull { position: u64 },

    /// A boolean byte other than 0, 1, or the null sentinel.
    #[fail(display = "invalid boolean 0x{:02X} (at byte {})", byte, position)]
    BadBool { position: u64, byte: u8 },

    /// A structural marker byte enabled in `Options::markers` was absent.
    #[fail(
        display = "expected marker byte 0x{:02X}, found 0x{:02X} (at byte {})",
        expected, found, position
    )]
    MissingMarker {
        position: u64,
        expected: u8,
        found: u8,
    },

    /// The presence prefix of a nullable fixed-width value was neither 0x00
    /// nor the null sentinel.
    #[fail(display = "invalid presence prefix 0x{:02X} (at byte {})", byte, position)]
    BadPresencePrefix { position: u64, byte: u8 },

    /// `read_str` found bytes that are not valid UTF-8. Use `read_bytes` to
    /// round-trip such payloads untouched.
    #[fail(display = "string is not valid UTF-8 (at byte {})", position)]
    InvalidUtf8 { position: u64 },

    /// The byte source itself failed (for example, an I/O error).
    #[fail(display = "byte source failed: {}", message)]
    Scanner { message: String },
}

impl Error {
    /// The absolute stream offset this error was raised at, when known.
    pub fn position(&self) -> Option<u64> {
        use Error::*;
        match self {
            UnexpectedEof { position }
            | NullLengthPrefix { position }
            | NestedLengthPrefix { position, .. }
            | IntegerOverflow { position, .. }
            | OversizedNumber { position, .. }
            | UnexpectedNull { position }
            | BadBool { position, .. }
            | MissingMarker { position, .. }
            | BadPresencePrefix { position, .. }
            | InvalidUtf8 { position } => Some(*position),
            Scanner { .. } => None,
        }
    }
}
