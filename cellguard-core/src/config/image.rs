//! Binary config image
//!
//! A `MonitorConfig` wrapped with a header and checksum so a driver can
//! keep it in flash or ship it as a file and detect corruption on load.

use serde::{Deserialize, Serialize};

use super::types::MonitorConfig;

/// Magic number to identify a config image
pub const CONFIG_MAGIC: u32 = 0x4347_4346; // "CGCF"

/// Current config image version
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on an encoded config image
pub const MAX_IMAGE_SIZE: usize = 128;

/// Config image errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Output buffer too small or encoding failed
    Serialize,
    /// Bytes are not a config image
    Deserialize,
    /// Header magic mismatch
    BadMagic,
    /// Image written by an incompatible version
    VersionMismatch,
    /// Checksum does not match the config body
    CrcMismatch,
}

impl core::fmt::Display for ImageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ImageError::Serialize => "config image encoding failed",
            ImageError::Deserialize => "config image is malformed",
            ImageError::BadMagic => "config image magic mismatch",
            ImageError::VersionMismatch => "config image version mismatch",
            ImageError::CrcMismatch => "config image checksum mismatch",
        };
        f.write_str(msg)
    }
}

/// Stored form of a config
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigImage {
    magic: u32,
    version: u8,
    config: MonitorConfig,
    /// CRC32 over the postcard encoding of `config`
    crc: u32,
}

/// Encode `config` into `buf`, returning the used prefix
pub fn encode_config<'a>(
    config: &MonitorConfig,
    buf: &'a mut [u8],
) -> Result<&'a mut [u8], ImageError> {
    let image = ConfigImage {
        magic: CONFIG_MAGIC,
        version: CONFIG_VERSION,
        config: *config,
        crc: config_crc(config)?,
    };
    postcard::to_slice(&image, buf).map_err(|_| ImageError::Serialize)
}

/// Decode and verify a config image
///
/// The returned config is not validated against a cell count; that
/// happens when a monitor is built from it.
pub fn decode_config(bytes: &[u8]) -> Result<MonitorConfig, ImageError> {
    let image: ConfigImage = postcard::from_bytes(bytes).map_err(|_| ImageError::Deserialize)?;

    if image.magic != CONFIG_MAGIC {
        return Err(ImageError::BadMagic);
    }
    if image.version != CONFIG_VERSION {
        return Err(ImageError::VersionMismatch);
    }
    if image.crc != config_crc(&image.config)? {
        return Err(ImageError::CrcMismatch);
    }

    Ok(image.config)
}

fn config_crc(config: &MonitorConfig) -> Result<u32, ImageError> {
    let mut scratch = [0u8; MAX_IMAGE_SIZE];
    let body = postcard::to_slice(config, &mut scratch).map_err(|_| ImageError::Serialize)?;
    Ok(!crc32_update(0xFFFF_FFFF, body))
}

/// CRC32 update (IEEE 802.3 polynomial)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CounterResetPolicy, ShutdownPolicy};
    use crate::safety::Channel;

    #[test]
    fn test_crc32_check_value() {
        // Standard CRC-32 check value for "123456789"
        assert_eq!(!crc32_update(0xFFFF_FFFF, b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_custom_config_survives_image() {
        let mut config = MonitorConfig::default();
        config.counter_reset = CounterResetPolicy::Clear;
        config.shutdown = ShutdownPolicy {
            persist_cycles: Some(500),
            critical_channel: Some(Channel::Temperature),
        };
        config.current = config.current.with_debounce(4, 16);

        let mut buf = [0u8; MAX_IMAGE_SIZE];
        let len = encode_config(&config, &mut buf).unwrap().len();
        assert_eq!(decode_config(&buf[..len]), Ok(config));
    }

    #[test]
    fn test_corrupted_body_detected() {
        let config = MonitorConfig::default();
        let mut buf = [0u8; MAX_IMAGE_SIZE];
        let len = encode_config(&config, &mut buf).unwrap().len();

        // Byte 6 is adc_width, right after the 5-byte magic varint and version
        buf[6] ^= 0x01;
        let err = decode_config(&buf[..len]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::CrcMismatch | ImageError::Deserialize
        ));
    }

    #[test]
    fn test_bad_magic() {
        let image = ConfigImage {
            magic: 0xDEAD_BEEF,
            version: CONFIG_VERSION,
            config: MonitorConfig::default(),
            crc: 0,
        };
        let mut buf = [0u8; MAX_IMAGE_SIZE];
        let bytes = postcard::to_slice(&image, &mut buf).unwrap();
        assert_eq!(decode_config(bytes), Err(ImageError::BadMagic));
    }

    #[test]
    fn test_version_mismatch() {
        let config = MonitorConfig::default();
        let image = ConfigImage {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION + 1,
            config,
            crc: config_crc(&config).unwrap(),
        };
        let mut buf = [0u8; MAX_IMAGE_SIZE];
        let bytes = postcard::to_slice(&image, &mut buf).unwrap();
        assert_eq!(decode_config(bytes), Err(ImageError::VersionMismatch));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(decode_config(&[]), Err(ImageError::Deserialize));
    }

    #[test]
    fn test_small_buffer_rejected() {
        let mut buf = [0u8; 4];
        assert_eq!(
            encode_config(&MonitorConfig::default(), &mut buf).unwrap_err(),
            ImageError::Serialize
        );
    }
}
