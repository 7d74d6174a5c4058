#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
pub mod platform;
pub mod record;
pub mod settings;
pub mod store;

pub use error::Error;
pub use record::{IR_CODE_COUNT, Record, RecordBody, RecordVersion};
pub use settings::{PictureControls, Settings, SyncStatus, VideoMode};
pub use store::{SECTOR_SIZE, SLOT_COUNT, SLOT_SIZE, SettingsStore, SlotState};
