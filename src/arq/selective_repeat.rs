use std::collections::BTreeMap;

use tracing::trace;

use crate::arq::{ArqReceiver, Verdict};
use crate::channel::Delivery;
use crate::config::ConfigError;
use crate::frame::{Frame, FrameCodec};


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SelectiveRepeatVerdict {
    /// the frame entered the receive window - whether or not the delivery cursor moved
    Accepted,
    /// lost on the channel, or damaged beyond what FEC can repair
    RejectedCorrupt,
    /// already delivered, or too far ahead of the delivery cursor
    RejectedOutOfWindow,
}
impl Verdict for SelectiveRepeatVerdict {
    fn is_accepted(&self) -> bool {
        *self == SelectiveRepeatVerdict::Accepted
    }
}


/// Selective-Repeat receive state for one sender.
///
/// Frames in `[expected_seq, expected_seq + window_size)` are accepted in any order and held in a
///  reorder buffer keyed by sequence number, so a repeated sequence number replaces its earlier
///  copy instead of occupying a second slot. Whenever the frame at `expected_seq` is present, the
///  contiguous prefix of the buffer is delivered (i.e. dropped) and the cursor advances past it.
#[derive(Debug)]
pub struct SelectiveRepeatReceiver {
    expected_seq: u64,
    window_size: usize,
    reorder_buffer: BTreeMap<u64, Frame>,
    codec: FrameCodec,
}
impl SelectiveRepeatReceiver {
    pub fn new(codec: FrameCodec, window_size: usize) -> Result<SelectiveRepeatReceiver, ConfigError> {
        if window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }

        Ok(SelectiveRepeatReceiver {
            expected_seq: 0,
            window_size,
            reorder_buffer: BTreeMap::default(),
            codec,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// exclusive upper bound of the receive window
    fn window_end(&self) -> u64 {
        self.expected_seq.saturating_add(self.window_size as u64)
    }

    fn is_in_window(&self, seq: u64) -> bool {
        seq >= self.expected_seq && seq < self.window_end()
    }

    fn drain_contiguous_prefix(&mut self) {
        while let Some(entry) = self.reorder_buffer.first_entry() {
            if *entry.key() != self.expected_seq {
                break;
            }
            entry.remove();
            self.expected_seq += 1;
        }
    }
}
impl ArqReceiver for SelectiveRepeatReceiver {
    type Verdict = SelectiveRepeatVerdict;

    fn accept(&mut self, delivery: Delivery) -> SelectiveRepeatVerdict {
        let frame = match delivery {
            Delivery::Lost => return SelectiveRepeatVerdict::RejectedCorrupt,
            Delivery::Arrived(frame) => frame,
        };

        if self.codec.decode(&frame).is_err() {
            trace!("frame #{} is uncorrectable - discarding", frame.seq());
            return SelectiveRepeatVerdict::RejectedCorrupt;
        }

        if !self.is_in_window(frame.seq()) {
            trace!("frame #{} is outside of window [{}, {}) - discarding", frame.seq(), self.expected_seq, self.window_end());
            return SelectiveRepeatVerdict::RejectedOutOfWindow;
        }

        if self.reorder_buffer.insert(frame.seq(), frame).is_some() {
            trace!("replaced buffered duplicate");
        }
        self.drain_contiguous_prefix();

        SelectiveRepeatVerdict::Accepted
    }

    fn expected_seq(&self) -> u64 {
        self.expected_seq
    }

    fn buffered(&self) -> usize {
        self.reorder_buffer.len()
    }

    fn may_issue(&self, seq: u64) -> bool {
        seq < self.window_end()
    }
}
