use thiserror::Error;

/// Errors that can occur while loading or saving settings. Marked as non-exhaustive to allow for
/// future additions without breaking the API. A caller typically only cares about `FlashError`;
/// the codec errors are swallowed by the boot scan and matter mostly when decoding records
/// directly.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The sector offset has to be aligned to the size of the settings sector (64k)
    #[error("invalid sector offset")]
    InvalidSectorOffset,

    /// The flash's read/write/erase granularity does not divide the slot layout.
    #[error("incompatible flash geometry")]
    IncompatibleFlash,

    /// The internal error value is returned from the provided flash implementation
    #[error("internal flash error")]
    FlashError,

    /// The version byte is not one of the recognized record formats.
    #[error("unrecognized record version {0}")]
    UnknownVersion(u8),

    /// The version byte is recognized but the stored checksum does not match the record bytes.
    #[error("record checksum mismatch")]
    ChecksumMismatch,

    /// The buffer is shorter than the record's declared size.
    #[error("record truncated")]
    Truncated,
}
