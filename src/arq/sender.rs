use crate::frame::{FecParams, Frame, FrameCodec};
use crate::config::ConfigError;
use crate::util::random::Random;


/// Stateless frame factory shared by both ARQ variants. Every call produces a fresh random
///  payload - re-issuing a sequence number after a rejection retries the number, not the bits.
#[derive(Debug)]
pub struct FrameSender {
    frame_size: usize,
    codec: FrameCodec,
}
impl FrameSender {
    pub fn new(frame_size: usize, fec: FecParams) -> Result<FrameSender, ConfigError> {
        if frame_size == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }

        Ok(FrameSender {
            frame_size,
            codec: FrameCodec::new(fec)?,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn create_frame(&self, seq: u64, random: &mut impl Random) -> Frame {
        let mut payload = vec![0u8; self.frame_size];
        random.fill_bytes(&mut payload);
        self.codec.encode(&payload, seq)
    }
}
