use crate::error::Error;
use crate::settings::{PictureControls, VideoMode};

/// Number of learnable remote control codes.
pub const IR_CODE_COUNT: usize = 6;

pub const RECORD_SIZE_V4: usize = 60;
pub const RECORD_SIZE_V5: usize = 63;

const OFFSET_CHECKSUM: usize = 0;
const OFFSET_VERSION: usize = 1;
const OFFSET_FLAGS: usize = 2;
const OFFSET_VOLUME: usize = 3;
const OFFSET_VIDEO_SETTINGS: usize = 4;
const OFFSET_OSD_BACKGROUND: usize = OFFSET_VIDEO_SETTINGS + 4 * VideoMode::COUNT;
const OFFSET_MODE_SWITCH_DELAY: usize = OFFSET_OSD_BACKGROUND + 4;
const OFFSET_IR_CODES: usize = OFFSET_MODE_SWITCH_DELAY + 4;
const OFFSET_BRIGHTNESS: usize = OFFSET_IR_CODES + 4 * IR_CODE_COUNT;
const OFFSET_CONTRAST: usize = OFFSET_BRIGHTNESS + 1;
const OFFSET_SATURATION: usize = OFFSET_CONTRAST + 1;

// Compile-time assertion that the field layout adds up to the declared wire sizes
const _: () = assert!(OFFSET_BRIGHTNESS == RECORD_SIZE_V4);
const _: () = assert!(OFFSET_SATURATION + 1 == RECORD_SIZE_V5);

pub const FLAG_RESBOX: u8 = 1 << 0;
pub const FLAG_MUTE: u8 = 1 << 1;

#[derive(strum::FromRepr, Debug, Eq, PartialEq, Copy, Clone)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordVersion {
    V4 = 4,
    V5 = 5,
}

impl RecordVersion {
    pub const CURRENT: RecordVersion = RecordVersion::V5;

    /// Declared wire size of this version, checksum byte included.
    pub const fn size(self) -> usize {
        match self {
            RecordVersion::V4 => RECORD_SIZE_V4,
            RecordVersion::V5 => RECORD_SIZE_V5,
        }
    }
}

/// Fields common to every record version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecordBody {
    pub flags: u8,
    pub volume: u8,
    pub video_settings: [u32; VideoMode::COUNT],
    pub osd_background: u32,
    pub mode_switch_delay: u32,
    pub ir_codes: [u32; IR_CODE_COUNT],
}

/// One settings snapshot as stored on flash. The version tag is the variant; decoding branches on
/// the stored version byte and encoding writes the variant's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Record {
    V4(RecordBody),
    V5(RecordBody, PictureControls),
}

impl Record {
    pub const fn version(&self) -> RecordVersion {
        match self {
            Record::V4(_) => RecordVersion::V4,
            Record::V5(..) => RecordVersion::V5,
        }
    }

    /// Serializes the record into the start of `buf` and returns the encoded length. The buffer
    /// is zeroed first so padding and unwritten trailing bytes are deterministic. Cannot fail.
    pub fn encode(&self, buf: &mut [u8; RECORD_SIZE_V5]) -> usize {
        buf.fill(0);

        let size = self.version().size();
        buf[OFFSET_VERSION] = self.version() as u8;

        let (body, picture) = match self {
            Record::V4(body) => (body, None),
            Record::V5(body, picture) => (body, Some(picture)),
        };

        buf[OFFSET_FLAGS] = body.flags;
        buf[OFFSET_VOLUME] = body.volume;
        for (i, word) in body.video_settings.iter().enumerate() {
            put_word(buf, OFFSET_VIDEO_SETTINGS + 4 * i, *word);
        }
        put_word(buf, OFFSET_OSD_BACKGROUND, body.osd_background);
        put_word(buf, OFFSET_MODE_SWITCH_DELAY, body.mode_switch_delay);
        for (i, code) in body.ir_codes.iter().enumerate() {
            put_word(buf, OFFSET_IR_CODES + 4 * i, *code);
        }

        if let Some(picture) = picture {
            buf[OFFSET_BRIGHTNESS] = picture.brightness as u8;
            buf[OFFSET_CONTRAST] = picture.contrast as u8;
            buf[OFFSET_SATURATION] = picture.saturation as u8;
        }

        buf[OFFSET_CHECKSUM] = checksum(&buf[OFFSET_VERSION..size]);
        size
    }

    /// Deserializes a record from `raw`, which may carry trailing slot padding. Rejects unknown
    /// version bytes before looking at anything else, then verifies the checksum over exactly the
    /// version's declared size.
    pub fn decode(raw: &[u8]) -> Result<Record, Error> {
        let Some(&tag) = raw.get(OFFSET_VERSION) else {
            return Err(Error::Truncated);
        };
        let version = RecordVersion::from_repr(tag).ok_or(Error::UnknownVersion(tag))?;

        let size = version.size();
        if raw.len() < size {
            return Err(Error::Truncated);
        }
        if checksum(&raw[OFFSET_VERSION..size]) != raw[OFFSET_CHECKSUM] {
            return Err(Error::ChecksumMismatch);
        }

        let mut video_settings = [0u32; VideoMode::COUNT];
        for (i, word) in video_settings.iter_mut().enumerate() {
            *word = word_at(raw, OFFSET_VIDEO_SETTINGS + 4 * i);
        }
        let mut ir_codes = [0u32; IR_CODE_COUNT];
        for (i, code) in ir_codes.iter_mut().enumerate() {
            *code = word_at(raw, OFFSET_IR_CODES + 4 * i);
        }

        let body = RecordBody {
            flags: raw[OFFSET_FLAGS],
            volume: raw[OFFSET_VOLUME],
            video_settings,
            osd_background: word_at(raw, OFFSET_OSD_BACKGROUND),
            mode_switch_delay: word_at(raw, OFFSET_MODE_SWITCH_DELAY),
            ir_codes,
        };

        Ok(match version {
            RecordVersion::V4 => Record::V4(body),
            RecordVersion::V5 => Record::V5(
                body,
                PictureControls {
                    brightness: raw[OFFSET_BRIGHTNESS] as i8,
                    contrast: raw[OFFSET_CONTRAST] as i8,
                    saturation: raw[OFFSET_SATURATION] as i8,
                },
            ),
        })
    }
}

/// 8-bit additive checksum: the truncated sum of every record byte except the checksum byte
/// itself, so callers pass `raw[1..size]`.
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

fn put_word(buf: &mut [u8], offset: usize, word: u32) {
    buf[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
}

fn word_at(raw: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_a_truncated_byte_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[1, 2, 3]), 6);
        assert_eq!(checksum(&[0xff, 0x02]), 0x01);
    }

    #[test]
    fn version_tags_and_sizes() {
        assert_eq!(RecordVersion::from_repr(4), Some(RecordVersion::V4));
        assert_eq!(RecordVersion::from_repr(5), Some(RecordVersion::V5));
        assert_eq!(RecordVersion::from_repr(0xff), None);
        assert_eq!(RecordVersion::V4.size(), 60);
        assert_eq!(RecordVersion::V5.size(), 63);
        assert_eq!(RecordVersion::CURRENT, RecordVersion::V5);
    }
}
