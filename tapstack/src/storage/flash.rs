use core::ops::Range;

use byteorder::{BigEndian, ByteOrder};
use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use super::{LayerStorage, StorageError};

/// StorageKeys is the first byte of a record, it identifies the type of the stored data.
///
/// `0xFF` is the value of erased flash, so it's never used as a key.
#[repr(u8)]
enum StorageKeys {
    DefaultLayer = 0x01,
}

/// Written after the key, a record without it was written by something else
const RECORD_MAGIC: u16 = 0x7A5C;
/// key(1) + magic(2) + layer(1)
const RECORD_LEN: usize = 4;
/// Records are padded to the flash alignment, which must fit this buffer
const BUFFER_SIZE: usize = 16;
const ERASED: u8 = 0xFF;

impl From<NorFlashErrorKind> for StorageError {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => StorageError::NotAligned,
            NorFlashErrorKind::OutOfBounds => StorageError::OutOfBounds,
            _ => StorageError::Flash,
        }
    }
}

/// Default layer storage on a region of nor flash.
///
/// The region starts at an erase boundary and holds exactly one record:
///
/// | byte 0 | byte 1..3 | byte 3 |
/// | --- | --- | --- |
/// | key | magic, big endian | layer |
pub struct FlashStorage<F: NorFlash> {
    flash: F,
    start: u32,
    /// Record length padded to the read/write alignment
    record_len: usize,
    /// Record length padded to the erase size
    erase_len: u32,
}

impl<F: NorFlash> FlashStorage<F> {
    pub fn new(flash: F, range: Range<u32>) -> Result<Self, StorageError> {
        let align = F::READ_SIZE.max(F::WRITE_SIZE).max(1);
        let record_len = RECORD_LEN.div_ceil(align) * align;
        if record_len > BUFFER_SIZE || F::ERASE_SIZE == 0 {
            error!("Flash alignment is not supported by the layer storage");
            return Err(StorageError::InvalidRange);
        }
        let erase_len = record_len.div_ceil(F::ERASE_SIZE) * F::ERASE_SIZE;
        let len = range.end.saturating_sub(range.start) as usize;
        if range.start as usize % F::ERASE_SIZE != 0 || len < erase_len || range.end as usize > flash.capacity() {
            error!("Invalid storage range: {}..{}", range.start, range.end);
            return Err(StorageError::InvalidRange);
        }
        Ok(Self {
            flash,
            start: range.start,
            record_len,
            erase_len: erase_len as u32,
        })
    }

    pub fn into_inner(self) -> F {
        self.flash
    }
}

impl<F: NorFlash> LayerStorage for FlashStorage<F> {
    fn read_default_layer(&mut self) -> Result<Option<u8>, StorageError> {
        let mut buf = [ERASED; BUFFER_SIZE];
        self.flash
            .read(self.start, &mut buf[..self.record_len])
            .map_err(|e| StorageError::from(e.kind()))?;

        if buf[0] == ERASED {
            return Ok(None);
        }
        if buf[0] != StorageKeys::DefaultLayer as u8 || BigEndian::read_u16(&buf[1..3]) != RECORD_MAGIC {
            warn!("Unknown record in layer storage: {:?}", &buf[..RECORD_LEN]);
            return Ok(None);
        }
        Ok(Some(buf[3]))
    }

    fn write_default_layer(&mut self, layer: u8) -> Result<(), StorageError> {
        self.flash
            .erase(self.start, self.start + self.erase_len)
            .map_err(|e| StorageError::from(e.kind()))?;

        let mut buf = [ERASED; BUFFER_SIZE];
        buf[0] = StorageKeys::DefaultLayer as u8;
        BigEndian::write_u16(&mut buf[1..3], RECORD_MAGIC);
        buf[3] = layer;
        self.flash
            .write(self.start, &buf[..self.record_len])
            .map_err(|e| StorageError::from(e.kind()))?;
        debug!("Default layer {} saved", layer);
        Ok(())
    }
}
