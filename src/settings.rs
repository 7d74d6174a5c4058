use crate::record::{FLAG_MUTE, FLAG_RESBOX, IR_CODE_COUNT, Record, RecordBody};

/// One output timing standard. The discriminant doubles as the index into the per-mode settings
/// array, so order matters: even discriminants are the 60Hz family, odd are 50Hz.
#[derive(strum::FromRepr, strum::Display, Debug, Eq, PartialEq, Copy, Clone)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VideoMode {
    #[strum(serialize = "240p")]
    P240 = 0,
    #[strum(serialize = "288p")]
    P288 = 1,
    #[strum(serialize = "480i")]
    I480 = 2,
    #[strum(serialize = "576i")]
    I576 = 3,
    #[strum(serialize = "480p")]
    P480 = 4,
    #[strum(serialize = "576p")]
    P576 = 5,
}

impl VideoMode {
    pub const COUNT: usize = 6;

    /// Active lines per frame. Bit 0 is set for interlaced modes.
    pub const fn lines(self) -> u16 {
        match self {
            VideoMode::P240 => 240,
            VideoMode::P288 => 288,
            VideoMode::I480 => 240 | 1,
            VideoMode::I576 => 288 | 1,
            VideoMode::P480 => 480,
            VideoMode::P576 => 576,
        }
    }

    /// Classifies the raw sync flags reported by the video interface into a mode. Total: every
    /// flag combination maps to some mode.
    pub const fn detect(sync: SyncStatus) -> VideoMode {
        match (sync.pal, sync.hsync_31khz, sync.progressive) {
            // assumption: the console cannot output 960i/1152i
            (true, true, _) => VideoMode::P576,
            (true, false, true) => VideoMode::P288,
            (true, false, false) => VideoMode::I576,
            (false, true, _) => VideoMode::P480,
            (false, false, true) => VideoMode::P240,
            (false, false, false) => VideoMode::I480,
        }
    }
}

/// Raw timing flags sampled from the video input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncStatus {
    pub progressive: bool,
    pub pal: bool,
    pub hsync_31khz: bool,
}

/// Signed picture adjustments, zero meaning neutral. Introduced with record version 5.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PictureControls {
    pub brightness: i8,
    pub contrast: i8,
    pub saturation: i8,
}

const IMGCTL_CONTRAST_SHIFT: u32 = 0;
const IMGCTL_BRIGHTNESS_SHIFT: u32 = 8;
const IMGCTL_SATURATION_SHIFT: u32 = 16;

/// The live, user-visible settings state. The store only ever reads and produces values of this
/// type; applying them to hardware registers is the caller's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// One option word per video mode, indexed by `VideoMode` discriminant.
    pub video_settings: [u32; VideoMode::COUNT],
    /// Packed color/transparency of the on-screen-display background.
    pub osd_background: u32,
    /// Delay applied when the input switches modes.
    pub mode_switch_delay: u32,
    /// Show the resolution info box when the mode changes.
    pub resbox_enabled: bool,
    pub audio_volume: u8,
    pub audio_mute: bool,
    /// Learned remote control codes.
    pub ir_codes: [u32; IR_CODE_COUNT],
    pub picture: PictureControls,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            video_settings: [0; VideoMode::COUNT],
            // partially transparent, blue tinted background
            osd_background: 0x0050_1bf8,
            mode_switch_delay: 0,
            resbox_enabled: true,
            audio_volume: 255,
            audio_mute: false,
            ir_codes: [0; IR_CODE_COUNT],
            picture: PictureControls::default(),
        }
    }
}

impl Settings {
    /// Packs the current state into a record of the current format version.
    pub fn to_record(&self) -> Record {
        let mut flags = 0;
        if self.resbox_enabled {
            flags |= FLAG_RESBOX;
        }
        if self.audio_mute {
            flags |= FLAG_MUTE;
        }

        Record::V5(
            RecordBody {
                flags,
                volume: self.audio_volume,
                video_settings: self.video_settings,
                osd_background: self.osd_background,
                mode_switch_delay: self.mode_switch_delay,
                ir_codes: self.ir_codes,
            },
            self.picture,
        )
    }

    /// The derived hardware image-control word: contrast and brightness as offset-binary bytes,
    /// saturation pre-scaled by contrast so the two controls compose.
    pub fn image_control_word(&self) -> u32 {
        let contrast = (self.picture.contrast as u8).wrapping_add(0x80);
        let saturation = ((self.picture.saturation as i32 + 0x80) * contrast as i32 / 128) as u32;

        (contrast as u32) << IMGCTL_CONTRAST_SHIFT
            | (self.picture.brightness as u8 as u32) << IMGCTL_BRIGHTNESS_SHIFT
            | saturation << IMGCTL_SATURATION_SHIFT
    }
}

impl From<Record> for Settings {
    /// Unpacks a record, defaulting fields the record's version predates.
    fn from(record: Record) -> Self {
        let (body, picture) = match record {
            Record::V4(body) => (body, PictureControls::default()),
            Record::V5(body, picture) => (body, picture),
        };

        Self {
            video_settings: body.video_settings,
            osd_background: body.osd_background,
            mode_switch_delay: body.mode_switch_delay,
            resbox_enabled: body.flags & FLAG_RESBOX != 0,
            audio_volume: body.volume,
            audio_mute: body.flags & FLAG_MUTE != 0,
            ir_codes: body.ir_codes,
            picture,
        }
    }
}
