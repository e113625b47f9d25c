//! Persistence of the default layer.
//!
//! The default layer is the only state which survives a reboot. It's written
//! once per change and read once at startup, so a single record is enough.
mod flash;

pub use flash::FlashStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Offset or length doesn't fit the flash alignment
    NotAligned,
    OutOfBounds,
    /// The storage range can't hold a record
    InvalidRange,
    /// Other flash error
    Flash,
}

/// Non-volatile storage of the default layer.
pub trait LayerStorage {
    /// Read the persisted default layer, `Ok(None)` if nothing valid is stored
    fn read_default_layer(&mut self) -> Result<Option<u8>, StorageError>;

    fn write_default_layer(&mut self, layer: u8) -> Result<(), StorageError>;
}

impl<T: LayerStorage + ?Sized> LayerStorage for &mut T {
    fn read_default_layer(&mut self) -> Result<Option<u8>, StorageError> {
        (**self).read_default_layer()
    }

    fn write_default_layer(&mut self, layer: u8) -> Result<(), StorageError> {
        (**self).write_default_layer(layer)
    }
}

/// Storage for keyboards without flash, nothing is persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStorage;

impl LayerStorage for NoStorage {
    fn read_default_layer(&mut self) -> Result<Option<u8>, StorageError> {
        Ok(None)
    }

    fn write_default_layer(&mut self, _layer: u8) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Owner of the default layer.
///
/// The in-memory value always follows `set`, a storage failure is logged and not retried.
pub struct DefaultLayerStore<S: LayerStorage> {
    storage: S,
    layer: u8,
}

impl<S: LayerStorage> DefaultLayerStore<S> {
    /// Create the store, `fallback` is used until something valid is loaded
    pub fn new(storage: S, fallback: u8) -> Self {
        Self {
            storage,
            layer: fallback,
        }
    }

    /// Load the persisted default layer, should be called once before any key event.
    ///
    /// A stored layer is used only if `is_valid` accepts it.
    pub fn load(&mut self, is_valid: impl Fn(u8) -> bool) -> u8 {
        match self.storage.read_default_layer() {
            Ok(Some(layer)) if is_valid(layer) => {
                info!("Loaded default layer {} from storage", layer);
                self.layer = layer;
            }
            Ok(Some(layer)) => {
                warn!("Stored default layer {} is invalid, use layer {}", layer, self.layer);
            }
            Ok(None) => {
                debug!("No default layer in storage, use layer {}", self.layer);
            }
            Err(e) => {
                error!("Failed to read default layer: {:?}, use layer {}", e, self.layer);
            }
        }
        self.layer
    }

    /// Current default layer
    pub fn layer(&self) -> u8 {
        self.layer
    }

    /// Switch the default layer and persist it.
    ///
    /// Returns `false` if the layer is already the default layer, nothing is written then.
    pub fn set(&mut self, layer: u8) -> bool {
        if layer == self.layer {
            return false;
        }
        self.layer = layer;
        if let Err(e) = self.storage.write_default_layer(layer) {
            error!("Failed to save default layer {}: {:?}", layer, e);
        }
        true
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
