#[derive(thiserror::Error, Debug)]
pub enum DataGroupError {
    #[error("Data group shorter than its header: {0} bytes")]
    TooShort(usize),

    #[error("Data group without CRC field")]
    CrcFlagUnset,

    #[error("Data group without segment field")]
    SegmentFlagUnset,

    #[error("Data group without user access field")]
    UserAccessFlagUnset,

    #[error("Unsupported data group type {0} (only MOT header/body)")]
    UnsupportedType(u8),

    #[error("Session header without transport id")]
    MissingTransportId,

    #[error("User access length indicator must be >= 2, read {0}")]
    UserAccessFieldTooShort(u8),

    #[error("Announced segment size {announced} does not match payload size {actual}")]
    SegmentSizeMismatch { announced: usize, actual: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum MotHeaderError {
    #[error("Header core needs 7 bytes, got {0}")]
    CoreTooShort(usize),

    #[error("Announced header size {announced} does not match accumulated {actual}")]
    HeaderSizeMismatch { announced: usize, actual: usize },

    #[error("Announced body size {announced} does not match accumulated {actual}")]
    BodySizeMismatch { announced: usize, actual: usize },

    #[error("Parameter 0x{param_id:02X} length {len} overruns header extension")]
    ParameterOverrun { param_id: u8, len: usize },

    #[error("Truncated length indicator for parameter 0x{0:02X}")]
    TruncatedLengthIndicator(u8),

    #[error("ContentName parameter must not be empty")]
    EmptyContentName,
}

#[derive(thiserror::Error, Debug)]
pub enum FibError {
    #[error("FIB must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("FIB CRC mismatch: calculated {calculated:#06X}, read {read:#06X}")]
    CrcMismatch { calculated: u16, read: u16 },

    #[error("FIG length {length} overruns FIB end at {end}")]
    FigOverrun { length: usize, end: usize },

    #[error("Truncated FIG1/{0} label field")]
    TruncatedFig1(u8),
}
