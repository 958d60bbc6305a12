//! OPV frame container and header model
//!
//! A frame is exactly 134 bytes: a 12-byte header followed by 122 bytes of
//! opaque payload data (Opus voice, BERT pattern, text, anything).
//!
//! ```text
//! offset  0                6           9           12                 134
//!         ┌────────────────┬───────────┬───────────┬───────────────────┐
//!         │ station ID     │ token     │ flags     │ payload data      │
//!         │ Base-40, 6 B   │ 24b MSB   │ 24b MSB   │ 122 B opaque      │
//!         └────────────────┴───────────┴───────────┴───────────────────┘
//! ```
//!
//! The flags word carries `LAST_FRAME` (0x800000) marking the end of a
//! stream and `BERT` (0x400000) marking a bit-error-rate-test payload; the
//! remaining bits are reserved. The core never interprets the data region.

use crate::callsign::{decode_callsign, encode_callsign};
use crate::params::FRAME_BYTES;
use crate::types::{ModemError, ModemResult};

/// Offset of the 24-bit session token.
pub const TOKEN_OFFSET: usize = 6;
/// Offset of the 24-bit flags/reserved word.
pub const FLAGS_OFFSET: usize = 9;
/// Offset of the opaque data region.
pub const DATA_OFFSET: usize = 12;
/// Length of the opaque data region.
pub const DATA_LEN: usize = FRAME_BYTES - DATA_OFFSET;

/// Flag bit: last frame of the stream.
pub const FLAG_LAST_FRAME: u32 = 0x800000;
/// Flag bit: payload carries a BERT pattern.
pub const FLAG_BERT: u32 = 0x400000;

/// A 134-byte OPV frame.
///
/// The frame owns its bytes; pipeline stages hand frames to each other by
/// move. Header fields are carved out of the fixed layout by the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_BYTES],
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            bytes: [0u8; FRAME_BYTES],
        }
    }
}

impl Frame {
    /// Wrap an owned byte array.
    pub fn from_bytes(bytes: [u8; FRAME_BYTES]) -> Self {
        Self { bytes }
    }

    /// Copy a frame out of a slice; the slice must be exactly 134 bytes.
    pub fn from_slice(slice: &[u8]) -> ModemResult<Self> {
        if slice.len() != FRAME_BYTES {
            return Err(ModemError::BadFrameLength {
                expected: FRAME_BYTES,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; FRAME_BYTES];
        bytes.copy_from_slice(slice);
        Ok(Self { bytes })
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.bytes
    }

    /// Consume the frame, returning the raw bytes.
    pub fn into_bytes(self) -> [u8; FRAME_BYTES] {
        self.bytes
    }

    /// Decode the Base-40 station identifier.
    pub fn station_id(&self) -> String {
        let mut id = [0u8; 6];
        id.copy_from_slice(&self.bytes[..6]);
        decode_callsign(&id)
    }

    /// Set the station identifier from a callsign string.
    pub fn set_station_id(&mut self, callsign: &str) -> ModemResult<()> {
        let encoded = encode_callsign(callsign)?;
        self.bytes[..6].copy_from_slice(&encoded);
        Ok(())
    }

    /// 24-bit session token, MSB first.
    pub fn token(&self) -> u32 {
        u32::from(self.bytes[TOKEN_OFFSET]) << 16
            | u32::from(self.bytes[TOKEN_OFFSET + 1]) << 8
            | u32::from(self.bytes[TOKEN_OFFSET + 2])
    }

    /// Set the 24-bit session token (upper byte of `token` is ignored).
    pub fn set_token(&mut self, token: u32) {
        self.bytes[TOKEN_OFFSET] = (token >> 16) as u8;
        self.bytes[TOKEN_OFFSET + 1] = (token >> 8) as u8;
        self.bytes[TOKEN_OFFSET + 2] = token as u8;
    }

    /// 24-bit flags/reserved word, MSB first.
    pub fn flags(&self) -> u32 {
        u32::from(self.bytes[FLAGS_OFFSET]) << 16
            | u32::from(self.bytes[FLAGS_OFFSET + 1]) << 8
            | u32::from(self.bytes[FLAGS_OFFSET + 2])
    }

    /// Set the 24-bit flags word.
    pub fn set_flags(&mut self, flags: u32) {
        self.bytes[FLAGS_OFFSET] = (flags >> 16) as u8;
        self.bytes[FLAGS_OFFSET + 1] = (flags >> 8) as u8;
        self.bytes[FLAGS_OFFSET + 2] = flags as u8;
    }

    /// Whether this frame closes the stream.
    pub fn is_last_frame(&self) -> bool {
        self.flags() & FLAG_LAST_FRAME != 0
    }

    /// Whether the payload carries a BERT pattern.
    pub fn is_bert(&self) -> bool {
        self.flags() & FLAG_BERT != 0
    }

    /// Borrow the 122-byte opaque data region.
    pub fn data(&self) -> &[u8] {
        &self.bytes[DATA_OFFSET..]
    }

    /// Mutably borrow the data region.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[DATA_OFFSET..]
    }

    /// Fill the data region from a slice of up to 122 bytes.
    pub fn set_data(&mut self, data: &[u8]) -> ModemResult<()> {
        if data.len() > DATA_LEN {
            return Err(ModemError::BadFrameLength {
                expected: DATA_LEN,
                actual: data.len(),
            });
        }
        self.bytes[DATA_OFFSET..DATA_OFFSET + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Start building a frame.
    pub fn builder() -> FrameBuilder {
        FrameBuilder::default()
    }
}

/// Builder composing header fields and payload data into a [`Frame`].
#[derive(Debug, Default)]
pub struct FrameBuilder {
    frame: Frame,
    error: Option<ModemError>,
}

impl FrameBuilder {
    pub fn station_id(mut self, callsign: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.frame.set_station_id(callsign) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn token(mut self, token: u32) -> Self {
        self.frame.set_token(token);
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.frame.set_flags(flags);
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.frame.set_data(data) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> ModemResult<Frame> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.frame),
        }
    }
}
