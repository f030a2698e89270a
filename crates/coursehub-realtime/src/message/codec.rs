//! Frame decoding.

use coursehub_core::config::RealtimeConfig;

/// Splits raw frames into fields.
///
/// Buffer capacities are only hints; frames of any size decode correctly.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    arguments_cap: usize,
    bytes_cap: usize,
}

impl MessageCodec {
    /// Creates a codec with the given pre-allocation hints.
    pub fn new(arguments_cap: usize, bytes_cap: usize) -> Self {
        Self {
            arguments_cap,
            bytes_cap,
        }
    }

    /// Creates a codec sized from the real-time configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(config.message_arguments_cap, config.message_bytes_cap)
    }

    /// Decodes one frame into its ordered fields.
    ///
    /// Always yields at least one field; an empty frame yields `[""]`.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn decode(&self, frame: &[u8]) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.arguments_cap);
        let mut field = Vec::with_capacity(self.bytes_cap);

        for (i, &byte) in frame.iter().enumerate() {
            if byte != b' ' {
                field.push(byte);
                continue;
            }
            let done = std::mem::replace(&mut field, Vec::with_capacity(self.bytes_cap));
            fields.push(String::from_utf8_lossy(&done).into_owned());
            if frame.get(i + 1) == Some(&b':') {
                fields.push(String::from_utf8_lossy(&frame[i + 2..]).into_owned());
                return fields;
            }
        }

        fields.push(String::from_utf8_lossy(&field).into_owned());
        fields
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}
