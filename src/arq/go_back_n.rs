use tracing::trace;

use crate::arq::{ArqReceiver, Verdict};
use crate::channel::Delivery;
use crate::frame::FrameCodec;


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GoBackNVerdict {
    Accepted,
    Rejected,
}
impl Verdict for GoBackNVerdict {
    fn is_accepted(&self) -> bool {
        *self == GoBackNVerdict::Accepted
    }
}


/// Go-Back-N receive state for one sender: strictly in-order acceptance, no buffering. Anything
///  but the next expected frame is discarded, forcing the sender to go back to it.
#[derive(Debug)]
pub struct GoBackNReceiver {
    expected_seq: u64,
    codec: FrameCodec,
}
impl GoBackNReceiver {
    pub fn new(codec: FrameCodec) -> GoBackNReceiver {
        GoBackNReceiver {
            expected_seq: 0,
            codec,
        }
    }
}
impl ArqReceiver for GoBackNReceiver {
    type Verdict = GoBackNVerdict;

    fn accept(&mut self, delivery: Delivery) -> GoBackNVerdict {
        let frame = match delivery {
            Delivery::Lost => return GoBackNVerdict::Rejected,
            Delivery::Arrived(frame) => frame,
        };

        if frame.seq() != self.expected_seq {
            trace!("expected frame #{}, got #{} - discarding", self.expected_seq, frame.seq());
            return GoBackNVerdict::Rejected;
        }

        if self.codec.decode(&frame).is_err() {
            trace!("frame #{} is uncorrectable - discarding", frame.seq());
            return GoBackNVerdict::Rejected;
        }

        self.expected_seq += 1;
        GoBackNVerdict::Accepted
    }

    fn expected_seq(&self) -> u64 {
        self.expected_seq
    }

    fn buffered(&self) -> usize {
        0
    }

    fn may_issue(&self, _seq: u64) -> bool {
        true
    }
}


#[cfg(test)]
mod test {
    use bytes::Bytes;
    use rstest::rstest;
    use crate::frame::{FecParams, Frame};
    use super::*;
    use GoBackNVerdict::*;

    fn codec() -> FrameCodec {
        FrameCodec::new(FecParams::new(12, 8).unwrap()).unwrap()
    }

    fn frame(seq: u64) -> Frame {
        codec().encode(b"abcdefgh", seq)
    }

    fn garbled(seq: u64) -> Frame {
        let frame = frame(seq);
        let damaged = vec![0xA5u8; frame.encoded_payload().len()];
        frame.with_damaged_payload(Bytes::from(damaged))
    }

    #[test]
    fn test_in_order_frames_are_accepted() {
        let mut receiver = GoBackNReceiver::new(codec());
        for seq in 0..5 {
            assert_eq!(receiver.accept(Delivery::Arrived(frame(seq))), Accepted);
            assert_eq!(receiver.expected_seq(), seq + 1);
        }
    }

    #[rstest]
    #[case::ahead_of_expected(3)]
    #[case::far_ahead(100)]
    fn test_out_of_order_frame_is_rejected(#[case] seq: u64) {
        let mut receiver = GoBackNReceiver::new(codec());
        assert_eq!(receiver.accept(Delivery::Arrived(frame(0))), Accepted);

        assert_eq!(receiver.accept(Delivery::Arrived(frame(seq))), Rejected);
        assert_eq!(receiver.expected_seq(), 1);
    }

    #[test]
    fn test_lost_frame_is_rejected_without_state_change() {
        let mut receiver = GoBackNReceiver::new(codec());

        assert_eq!(receiver.accept(Delivery::Lost), Rejected);
        assert_eq!(receiver.expected_seq(), 0);
    }

    #[test]
    fn test_uncorrectable_frame_is_rejected() {
        let mut receiver = GoBackNReceiver::new(codec());

        let verdict = receiver.accept(Delivery::Arrived(garbled(0)));

        // an all-0xA5 block is no valid codeword, and 12 wrong symbols are far beyond capacity
        assert_eq!(verdict, Rejected);
        assert_eq!(receiver.expected_seq(), 0);

        assert_eq!(receiver.accept(Delivery::Arrived(frame(0))), Accepted);
    }

    #[test]
    fn test_redelivered_consumed_frame_is_rejected() {
        let mut receiver = GoBackNReceiver::new(codec());
        for seq in 0..3 {
            receiver.accept(Delivery::Arrived(frame(seq)));
        }

        for seq in 0..3 {
            assert_eq!(receiver.accept(Delivery::Arrived(frame(seq))), Rejected);
        }
        assert_eq!(receiver.expected_seq(), 3);
    }

    #[test]
    fn test_issue_is_never_gated() {
        let receiver = GoBackNReceiver::new(codec());
        assert!(receiver.may_issue(0));
        assert!(receiver.may_issue(u64::MAX));
        assert_eq!(receiver.buffered(), 0);
    }
}
