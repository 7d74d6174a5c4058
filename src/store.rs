use crate::error::Error;
use crate::platform::Platform;
use crate::record::{RECORD_SIZE_V5, Record};
use crate::settings::Settings;
#[cfg(feature = "defmt")]
use defmt::trace;

/// One slot holds one record plus trailing unused padding.
pub const SLOT_SIZE: usize = 256;
pub const SLOT_COUNT: u16 = 256;
/// The single erase granule backing the whole store.
pub const SECTOR_SIZE: usize = SLOT_SIZE * SLOT_COUNT as usize;

/// Byte value an erase produces. A slot whose bytes all read as this has never been written
/// since the last erase.
const FILL: u8 = 0xff;

/// Slot prefix that is actually read and programmed: the record padded to a power-of-two
/// write unit. The rest of the slot stays erased.
const SLOT_PROGRAM_LEN: usize = 64;

const _: () = assert!(RECORD_SIZE_V5 <= SLOT_PROGRAM_LEN && SLOT_PROGRAM_LEN <= SLOT_SIZE);

/// What the boot scan found in one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// All fill bytes, never written since the last erase.
    Erased,
    /// A record with a recognized version and a matching checksum.
    Valid(Record),
    /// Written bytes that do not form a valid record, e.g. a write torn by power loss.
    Corrupt,
}

/// Classifies one slot's programmed prefix.
pub fn classify_slot(raw: &[u8]) -> SlotState {
    if raw.iter().all(|&b| b == FILL) {
        return SlotState::Erased;
    }
    match Record::decode(raw) {
        Ok(record) => SlotState::Valid(record),
        Err(_) => SlotState::Corrupt,
    }
}

/// Lazy ascending walk over the sector's slots, yielding each slot's classification. The store
/// folds this into the newest-record rule; it is public so callers can inspect a sector without
/// committing to that policy.
pub struct SlotScan<'a, T: Platform> {
    flash: &'a mut T,
    base: u32,
    index: u16,
}

impl<T: Platform> Iterator for SlotScan<'_, T> {
    type Item = Result<(u16, SlotState), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= SLOT_COUNT {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let offset = self.base + u32::from(index) * SLOT_SIZE as u32;
        let mut buf = [FILL; SLOT_PROGRAM_LEN];
        if self.flash.read(offset, &mut buf).is_err() {
            // a flash fault ends the scan, the caller latches it
            self.index = SLOT_COUNT;
            return Some(Err(Error::FlashError));
        }

        let state = classify_slot(&buf);
        #[cfg(all(feature = "defmt", feature = "debug-logs"))]
        trace!("scan slot {}: {}", index, state);
        Some(Ok((index, state)))
    }
}

/// The rotational log store. Owns a dedicated erase sector and the transient cursor pointing at
/// the slot holding the newest record (`SLOT_COUNT` meaning "none located, write targets start
/// at the top").
///
/// Writes proceed from the highest slot index towards zero, so within one erase cycle the newest
/// record always sits at the lowest written index and boot recovery needs no separate index
/// structure, only a forward scan.
pub struct SettingsStore<T: Platform> {
    flash: T,
    base: u32,
    cursor: u16,
    faulted: bool,
}

impl<T: Platform> SettingsStore<T> {
    /// Takes ownership of the sector starting at `sector_offset`. The offset has to be aligned
    /// to the sector size and the flash geometry must divide the slot layout.
    pub fn new(sector_offset: u32, flash: T) -> Result<SettingsStore<T>, Error> {
        if !(sector_offset as usize).is_multiple_of(SECTOR_SIZE) {
            return Err(Error::InvalidSectorOffset);
        }
        if sector_offset as usize + SECTOR_SIZE > flash.capacity() {
            return Err(Error::InvalidSectorOffset);
        }
        if !SLOT_PROGRAM_LEN.is_multiple_of(T::READ_SIZE)
            || !SLOT_PROGRAM_LEN.is_multiple_of(T::WRITE_SIZE)
            || !SECTOR_SIZE.is_multiple_of(T::ERASE_SIZE)
        {
            return Err(Error::IncompatibleFlash);
        }

        Ok(Self {
            flash,
            base: sector_offset,
            cursor: SLOT_COUNT,
            faulted: false,
        })
    }

    /// Restores the newest valid settings snapshot, or `None` if the sector holds no usable
    /// record and the caller should fall back to built-in defaults. Also (re)establishes the
    /// write cursor, so this runs before the first [`save`](Self::save).
    ///
    /// Corruption found while scanning is not an error here: a torn record merely bounds the
    /// scan, because only erased slots are valid write targets and nothing past the tear can be
    /// trusted to be newer.
    pub fn load(&mut self) -> Result<Option<Settings>, Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }

        match self.locate_newest() {
            Ok((cursor, record)) => {
                self.cursor = cursor;
                Ok(record.map(Settings::from))
            }
            Err(e) => {
                self.faulted = true;
                Err(e)
            }
        }
    }

    /// Persists a settings snapshot into the next slot, erasing the sector first when it is
    /// exhausted. Every save consumes exactly one erased slot; one save in every
    /// `SLOT_COUNT` also pays for the sector erase.
    pub fn save(&mut self, settings: &Settings) -> Result<(), Error> {
        if self.faulted {
            return Err(Error::FlashError);
        }

        match self.write_record(&settings.to_record()) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.faulted = true;
                Err(e)
            }
        }
    }

    /// Ascending walk over all slots. See [`SlotScan`].
    pub fn slots(&mut self) -> SlotScan<'_, T> {
        SlotScan {
            flash: &mut self.flash,
            base: self.base,
            index: 0,
        }
    }

    /// First valid record wins. An erased slot keeps the scan going (written slots live above
    /// the erased region, not below it); a corrupt slot stops it cold, reporting no record and
    /// leaving the cursor at the corruption boundary.
    fn locate_newest(&mut self) -> Result<(u16, Option<Record>), Error> {
        for item in self.slots() {
            let (index, state) = item?;
            match state {
                SlotState::Erased => continue,
                SlotState::Valid(record) => return Ok((index, Some(record))),
                SlotState::Corrupt => return Ok((index, None)),
            }
        }
        Ok((SLOT_COUNT, None))
    }

    fn write_record(&mut self, record: &Record) -> Result<(), Error> {
        let mut slot = [FILL; SLOT_PROGRAM_LEN];
        let mut encoded = [0u8; RECORD_SIZE_V5];
        let len = record.encode(&mut encoded);
        slot[..len].copy_from_slice(&encoded[..len]);
        // bytes past the record stay at the fill value, the program only clears record bits

        if self.cursor == 0 {
            #[cfg(feature = "defmt")]
            trace!("sector exhausted, erasing @{:#08x}", self.base);
            self.flash
                .erase(self.base, self.base + SECTOR_SIZE as u32)
                .map_err(|_| Error::FlashError)?;
            self.cursor = SLOT_COUNT;
        }

        self.cursor -= 1;
        let offset = self.base + u32::from(self.cursor) * SLOT_SIZE as u32;
        #[cfg(feature = "defmt")]
        trace!("write slot {} @{:#08x}", self.cursor, offset);
        self.flash
            .write(offset, &slot)
            .map_err(|_| Error::FlashError)
    }
}
