use bytes::Bytes;
use tracing::trace;

use crate::frame::Frame;
use crate::util::random::Random;


/// What arrives at the receiver's end of the channel for a single transmission attempt
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Delivery {
    /// dropped in transit - never reaches the receiver, nothing to decode
    Lost,
    /// reached the receiver, possibly with damaged symbols
    Arrived(Frame),
}
impl Delivery {
    pub fn is_lost(&self) -> bool {
        matches!(self, Delivery::Lost)
    }
}


/// Point-to-point link between one sender and the coordinator. Frames are dropped with
///  probability `error_rate`; bytes of surviving frames are independently damaged with
///  probability `symbol_error_rate`, leaving it to FEC to repair them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelModel {
    error_rate: f64,
    symbol_error_rate: f64,
}
impl ChannelModel {
    pub fn new(error_rate: f64, symbol_error_rate: f64) -> ChannelModel {
        ChannelModel {
            error_rate,
            symbol_error_rate,
        }
    }

    pub fn lossy(error_rate: f64) -> ChannelModel {
        Self::new(error_rate, 0.0)
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn is_lost(random: &mut impl Random, error_rate: f64) -> bool {
        random.chance(error_rate)
    }

    pub fn transmit(&self, frame: Frame, random: &mut impl Random) -> Delivery {
        if Self::is_lost(random, self.error_rate) {
            trace!("frame #{} lost in transit", frame.seq());
            return Delivery::Lost;
        }

        if self.symbol_error_rate <= 0.0 {
            return Delivery::Arrived(frame);
        }

        let mut damaged = frame.encoded_payload().to_vec();
        let mut num_damaged = 0usize;
        for b in damaged.iter_mut() {
            if random.chance(self.symbol_error_rate) {
                // flip to a guaranteed different value
                *b ^= random.gen_usize_range(1..256) as u8;
                num_damaged += 1;
            }
        }

        if num_damaged == 0 {
            return Delivery::Arrived(frame);
        }

        trace!("{} symbols of frame #{} damaged in transit", num_damaged, frame.seq());
        Delivery::Arrived(frame.with_damaged_payload(Bytes::from(damaged)))
    }
}


#[cfg(test)]
mod test {
    use mockall::predicate::eq;
    use rstest::rstest;
    use crate::frame::{FecParams, FrameCodec};
    use crate::util::random::{MockRandom, RngRandom};
    use super::*;

    fn frame() -> Frame {
        FrameCodec::new(FecParams::new(12, 8).unwrap()).unwrap()
            .encode(b"abcdefgh", 3)
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(1.0, 1000)]
    fn test_loss_extremes(#[case] error_rate: f64, #[case] expected_losses: usize) {
        let mut random = RngRandom::seeded(1);
        let channel = ChannelModel::lossy(error_rate);

        let losses = (0..1000)
            .filter(|_| channel.transmit(frame(), &mut random).is_lost())
            .count();

        assert_eq!(losses, expected_losses);
    }

    #[test]
    fn test_loss_rate_is_roughly_the_configured_probability() {
        let mut random = RngRandom::seeded(2);

        let losses = (0..10_000)
            .filter(|_| ChannelModel::is_lost(&mut random, 0.25))
            .count();

        assert!((2_000..3_000).contains(&losses), "{}", losses);
    }

    #[test]
    fn test_surviving_frame_is_passed_through_unchanged() {
        let mut random = MockRandom::new();
        random.expect_chance()
            .with(eq(0.1))
            .times(1)
            .return_const(false);

        let delivery = ChannelModel::lossy(0.1).transmit(frame(), &mut random);

        assert_eq!(delivery, Delivery::Arrived(frame()));
    }

    #[test]
    fn test_symbol_damage_keeps_seq_and_checksum() {
        let mut random = MockRandom::new();
        random.expect_chance()
            .with(eq(0.0))
            .times(1)
            .return_const(false);
        // every symbol of the 12-byte frame is damaged
        random.expect_chance()
            .with(eq(0.5))
            .times(12)
            .return_const(true);
        random.expect_gen_usize_range()
            .times(12)
            .return_const(0x11usize);

        let original = frame();
        let delivery = ChannelModel::new(0.0, 0.5).transmit(original.clone(), &mut random);

        match delivery {
            Delivery::Lost => panic!("frame should have arrived"),
            Delivery::Arrived(damaged) => {
                assert_eq!(damaged.seq(), original.seq());
                assert_eq!(damaged.checksum(), original.checksum());
                assert!(!damaged.checksum_matches());
                assert!(damaged.encoded_payload().iter()
                    .zip(original.encoded_payload())
                    .all(|(d, o)| *d == *o ^ 0x11));
            }
        }
    }
}
