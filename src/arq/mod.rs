//! The two sliding-window ARQ disciplines. Both share the stateless [FrameSender]; they differ in
//!  how the coordinator's receiver state for a single sender decides what to accept:
//!
//! * [go_back_n::GoBackNReceiver] accepts only the next expected sequence number
//! * [selective_repeat::SelectiveRepeatReceiver] accepts everything inside its window and
//!    reorders it
//!
//! Retransmission is not part of either receiver: a sender's lane simply issues the same sequence
//!  number again on its next turn until it is accepted.

pub mod go_back_n;
pub mod selective_repeat;
pub mod sender;

use std::fmt::Debug;

use crate::channel::Delivery;

pub use go_back_n::{GoBackNReceiver, GoBackNVerdict};
pub use selective_repeat::{SelectiveRepeatReceiver, SelectiveRepeatVerdict};
pub use sender::FrameSender;


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ArqVariant {
    GoBackN,
    SelectiveRepeat {
        window_size: usize,
    },
}
impl ArqVariant {
    pub fn name(&self) -> &'static str {
        match self {
            ArqVariant::GoBackN => "go-back-n",
            ArqVariant::SelectiveRepeat { .. } => "selective-repeat",
        }
    }
}


pub trait Verdict: Debug + Copy + Eq + Send {
    fn is_accepted(&self) -> bool;
}


/// The coordinator's receive state for exactly one sender. Implementations own their codec so
///  that they can attempt FEC decoding of arriving frames.
pub trait ArqReceiver: Debug + Send + 'static {
    type Verdict: Verdict;

    fn accept(&mut self, delivery: Delivery) -> Self::Verdict;

    /// The lowest sequence number that was not delivered yet. Never decreases.
    fn expected_seq(&self) -> u64;

    /// number of frames held back waiting for a gap to be filled
    fn buffered(&self) -> usize;

    /// Whether the sender may issue `seq` without overrunning the receive window
    fn may_issue(&self, seq: u64) -> bool;
}
