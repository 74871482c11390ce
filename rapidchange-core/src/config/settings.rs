//! Persisted tool changer settings
//!
//! The complete configuration is one fixed-size record stored in flash as
//! postcard binary. A magic number, version and CRC32 guard against reading
//! an incompatible or torn record; anything that fails those checks is
//! replaced by defaults.

use rapidchange_hal::{FlashError, FlashStorage, StorageKey};
use serde::{Deserialize, Serialize};

use super::types::{
    CoverMode, DustCoverConfig, LayoutConfig, MotionConfig, RecognitionConfig, ToolSetterConfig,
};

/// Magic number to identify a settings record
pub const SETTINGS_MAGIC: u32 = 0x5243_4154; // "RCAT"

/// Current settings record version
pub const SETTINGS_VERSION: u8 = 1;

/// Scratch buffer size for the encoded record
pub const SETTINGS_BUFFER_SIZE: usize = 256;

/// Errors from loading or saving settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Underlying flash access failed
    Flash(FlashError),
    /// Record could not be encoded
    Encode,
    /// Stored bytes are not a settings record
    Decode,
    /// Magic number mismatch
    BadMagic,
    /// Record written by a different firmware version
    VersionMismatch,
    /// Checksum mismatch (torn or corrupted write)
    CrcMismatch,
    /// Record decoded but a value is unusable
    Invalid(&'static str),
}

impl From<FlashError> for SettingsError {
    fn from(e: FlashError) -> Self {
        SettingsError::Flash(e)
    }
}

/// Complete tool changer settings record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AtcSettings {
    /// Magic number for validation
    pub magic: u32,
    /// Record format version
    pub version: u8,
    pub layout: LayoutConfig,
    pub motion: MotionConfig,
    pub tool_setter: ToolSetterConfig,
    pub recognition: RecognitionConfig,
    pub dust_cover: DustCoverConfig,
    /// CRC32 over the encoded record with this field zeroed
    pub crc: u32,
}

impl Default for AtcSettings {
    fn default() -> Self {
        Self {
            magic: SETTINGS_MAGIC,
            version: SETTINGS_VERSION,
            layout: LayoutConfig::default(),
            motion: MotionConfig::default(),
            tool_setter: ToolSetterConfig::default(),
            recognition: RecognitionConfig::default(),
            dust_cover: DustCoverConfig::default(),
            crc: 0,
        }
    }
}

impl AtcSettings {
    /// Check the header fields
    pub fn check_header(&self) -> Result<(), SettingsError> {
        if self.magic != SETTINGS_MAGIC {
            return Err(SettingsError::BadMagic);
        }
        if self.version != SETTINGS_VERSION {
            return Err(SettingsError::VersionMismatch);
        }
        Ok(())
    }

    /// Check that the values can drive a tool change
    ///
    /// Only structural problems are rejected. Whether heights clear the
    /// machine's obstacles cannot be known here.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let layout = &self.layout;
        let motion = &self.motion;

        let floats = [
            layout.pocket_pitch,
            layout.pocket1_x,
            layout.pocket1_y,
            layout.manual_x,
            layout.manual_y,
            motion.z_safe_clearance,
            motion.z_traverse,
            motion.z_engage,
            motion.z_start_offset,
            motion.z_retract_offset,
            motion.engage_feed_rate,
            motion.load_rpm,
            motion.unload_rpm,
            self.tool_setter.x,
            self.tool_setter.y,
            self.tool_setter.z_seek_start,
            self.tool_setter.seek_feed_rate,
            self.tool_setter.set_feed_rate,
            self.tool_setter.max_travel,
            self.tool_setter.seek_retreat,
            self.recognition.z_zone_1,
            self.recognition.z_zone_2,
            self.dust_cover.open_position,
            self.dust_cover.closed_position,
        ];
        if floats.iter().any(|v| !v.is_finite()) {
            return Err(SettingsError::Invalid("non-finite value"));
        }

        if layout.pocket_count > 1 && layout.pocket_pitch <= 0.0 {
            return Err(SettingsError::Invalid("pocket pitch"));
        }
        if motion.engage_feed_rate <= 0.0 {
            return Err(SettingsError::Invalid("engage feed rate"));
        }
        if motion.load_rpm < 0.0 || motion.unload_rpm < 0.0 {
            return Err(SettingsError::Invalid("spindle rpm"));
        }
        if motion.z_start_offset < 0.0 || motion.z_retract_offset < 0.0 {
            return Err(SettingsError::Invalid("engage offsets"));
        }

        let setter = &self.tool_setter;
        if setter.enabled
            && (setter.seek_feed_rate <= 0.0
                || setter.set_feed_rate <= 0.0
                || setter.max_travel <= 0.0
                || setter.seek_retreat < 0.0)
        {
            return Err(SettingsError::Invalid("tool setter"));
        }

        let recognition = &self.recognition;
        if recognition.enabled && recognition.z_zone_2 < recognition.z_zone_1 {
            return Err(SettingsError::Invalid("recognition zones"));
        }

        if self.dust_cover.mode == CoverMode::Axis && self.dust_cover.axis.index() < 3 {
            // X, Y and Z carry the spindle, never the cover
            return Err(SettingsError::Invalid("dust cover axis"));
        }

        Ok(())
    }

    /// Calculate the CRC32 of the encoded record (excluding the crc itself)
    pub fn calculate_crc(&self) -> Result<u32, SettingsError> {
        let mut body = *self;
        body.crc = 0;

        let mut buffer = [0u8; SETTINGS_BUFFER_SIZE];
        let encoded =
            postcard::to_slice(&body, &mut buffer).map_err(|_| SettingsError::Encode)?;

        Ok(!crc32_update(0xFFFF_FFFF, encoded))
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) -> Result<(), SettingsError> {
        self.crc = self.calculate_crc()?;
        Ok(())
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        matches!(self.calculate_crc(), Ok(crc) if crc == self.crc)
    }

    /// Encode into `buffer`, sealing the record with its CRC
    pub fn encode<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], SettingsError> {
        let mut sealed = *self;
        sealed.update_crc()?;
        postcard::to_slice(&sealed, buffer).map_err(|_| SettingsError::Encode)
    }

    /// Decode and fully check a stored record
    pub fn decode(bytes: &[u8]) -> Result<Self, SettingsError> {
        let settings: AtcSettings =
            postcard::from_bytes(bytes).map_err(|_| SettingsError::Decode)?;

        settings.check_header()?;
        if !settings.verify_crc() {
            return Err(SettingsError::CrcMismatch);
        }
        settings.validate()?;

        Ok(settings)
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Settings persistence on top of a [`FlashStorage`]
pub struct SettingsStore<F> {
    flash: F,
}

impl<F: FlashStorage> SettingsStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Give back the underlying storage
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Read and check the stored record
    pub async fn try_load(&mut self) -> Result<AtcSettings, SettingsError> {
        let mut buffer = [0u8; SETTINGS_BUFFER_SIZE];
        let len = self.flash.read(StorageKey::AtcSettings, &mut buffer).await?;
        AtcSettings::decode(&buffer[..len])
    }

    /// Load settings, restoring defaults when nothing usable is stored
    pub async fn load(&mut self) -> AtcSettings {
        match self.try_load().await {
            Ok(settings) => {
                debug!("ATC settings loaded");
                settings
            }
            Err(e) => {
                warn!("ATC settings unusable ({}), restoring defaults", e);
                self.restore().await
            }
        }
    }

    /// Write settings to flash
    pub async fn save(&mut self, settings: &AtcSettings) -> Result<(), SettingsError> {
        settings.validate()?;

        let mut buffer = [0u8; SETTINGS_BUFFER_SIZE];
        let encoded = settings.encode(&mut buffer)?;
        self.flash.write(StorageKey::AtcSettings, encoded).await?;

        Ok(())
    }

    /// Erase stored records, then write the defaults
    ///
    /// The defaults are returned even if they could not be written, so the
    /// machine stays usable with a failing flash.
    pub async fn restore(&mut self) -> AtcSettings {
        if let Err(e) = self.flash.erase_all().await {
            warn!("Failed to erase ATC settings: {}", e);
        }
        let mut settings = AtcSettings::default();
        if let Err(e) = self.save(&settings).await {
            error!("Failed to write default ATC settings: {}", e);
        }
        if let Ok(crc) = settings.calculate_crc() {
            settings.crc = crc;
        }
        settings
    }
}
