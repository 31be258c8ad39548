use std::fmt::{Debug, Formatter};

use bytes::{Bytes, BytesMut};
use crc::{Crc, CRC_16_ARC};
use reed_solomon::{Decoder, Encoder};

use crate::config::ConfigError;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Largest block length of a Reed-Solomon code over GF(2^8)
pub const MAX_BLOCK_LEN: usize = 255;
/// The decoder keeps its polynomials in fixed 256-symbol buffers, and the error evaluator it
///  computes has `3/2 * (n - k) + 1` coefficients.
pub const MAX_PARITY_LEN: usize = 170;


#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Checksum(pub u16);
impl Debug for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x?}", self.0)
    }
}
impl Checksum {
    pub fn of(buf: &[u8]) -> Checksum {
        Checksum(CRC16.checksum(buf))
    }
}


/// A single transmission attempt. The checksum is computed once over the encoded payload when
///  the frame is created - a frame damaged on the channel carries its original checksum.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    seq: u64,
    encoded_payload: Bytes,
    checksum: Checksum,
}
impl Frame {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn encoded_payload(&self) -> &[u8] {
        &self.encoded_payload
    }

    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// Diagnostics only: ARQ acceptance is decided by FEC decoding, never by this check
    pub fn checksum_matches(&self) -> bool {
        Checksum::of(&self.encoded_payload) == self.checksum
    }

    /// The same frame as it looks after the channel damaged its payload in transit
    pub(crate) fn with_damaged_payload(&self, damaged: Bytes) -> Frame {
        Frame {
            seq: self.seq,
            encoded_payload: damaged,
            checksum: self.checksum,
        }
    }
}


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FecParams {
    /// coded block length in symbols (bytes)
    pub n: usize,
    /// payload symbols per block
    pub k: usize,
}
impl FecParams {
    pub fn new(n: usize, k: usize) -> Result<FecParams, ConfigError> {
        let params = FecParams { n, k };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 || self.n <= self.k || self.n > MAX_BLOCK_LEN || self.n - self.k > MAX_PARITY_LEN {
            return Err(ConfigError::InvalidFecParams { n: self.n, k: self.k });
        }
        Ok(())
    }

    pub fn parity_len(&self) -> usize {
        self.n - self.k
    }

    /// number of symbol errors per block that decoding is guaranteed to repair
    pub fn correction_capacity(&self) -> usize {
        self.parity_len() / 2
    }

    pub fn encoded_len(&self, payload_len: usize) -> usize {
        let num_blocks = payload_len.div_ceil(self.k);
        payload_len + num_blocks * self.parity_len()
    }
}
impl Default for FecParams {
    /// RS(255, 223), the CCSDS code
    fn default() -> Self {
        FecParams { n: 255, k: 223 }
    }
}


#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("symbol errors exceed the correction capacity of the code")]
    Uncorrectable,
}


/// Systematic Reed-Solomon block codec: the payload is cut into blocks of `k` bytes (the last one
///  possibly shorter), and every block is followed by its `n - k` parity bytes.
pub struct FrameCodec {
    params: FecParams,
    encoder: Encoder,
    decoder: Decoder,
}
impl Debug for FrameCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCodec")
            .field("params", &self.params)
            .finish()
    }
}
impl FrameCodec {
    pub fn new(params: FecParams) -> Result<FrameCodec, ConfigError> {
        params.validate()?;

        Ok(FrameCodec {
            params,
            encoder: Encoder::new(params.parity_len()),
            decoder: Decoder::new(params.parity_len()),
        })
    }

    pub fn params(&self) -> FecParams {
        self.params
    }

    pub fn encode(&self, payload: &[u8], seq: u64) -> Frame {
        let mut encoded = BytesMut::with_capacity(self.params.encoded_len(payload.len()));
        for block in payload.chunks(self.params.k) {
            let coded = self.encoder.encode(block);
            encoded.extend_from_slice(&coded[..]);
        }

        let encoded_payload = encoded.freeze();
        let checksum = Checksum::of(&encoded_payload);
        Frame {
            seq,
            encoded_payload,
            checksum,
        }
    }

    pub fn decode(&self, frame: &Frame) -> Result<Vec<u8>, DecodeError> {
        let parity_len = self.params.parity_len();

        let mut payload = Vec::with_capacity(frame.encoded_payload.len());
        for coded in frame.encoded_payload.chunks(self.params.n) {
            if coded.len() <= parity_len {
                // a block needs at least one payload symbol after its parity was accounted for
                return Err(DecodeError::Uncorrectable);
            }

            let mut block = coded.to_vec();
            let corrected = self.decoder.correct(&mut block[..], None)
                .map_err(|_| DecodeError::Uncorrectable)?;
            payload.extend_from_slice(corrected.data());
        }
        Ok(payload)
    }
}
