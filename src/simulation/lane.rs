use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::arq::{ArqReceiver, FrameSender, Verdict};
use crate::channel::ChannelModel;
use crate::config::{ConfigError, SimulationConfig};
use crate::simulation::metrics::LaneCounters;
use crate::simulation::SimulationError;
use crate::util::random::Random;


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepOutcome {
    Acknowledged,
    Rejected,
    Lost,
    /// the next sequence number lies beyond the receive window, nothing was sent
    WindowClosed,
}


/// Everything that belongs to one sender→coordinator pair: the sender, the coordinator's receive
///  state for this sender, the channel between them, and the lane's counters. Lanes share no
///  mutable state, so they can be stepped in any interleaving or on separate tasks.
#[derive(Debug)]
pub struct Lane<A: ArqReceiver, R: Random> {
    id: usize,
    sender: FrameSender,
    receiver: A,
    channel: ChannelModel,
    random: R,
    target_frames: u64,

    next_seq: u64,
    counters: LaneCounters,
    /// set while the lane waits out the delay after a loss
    suspended_until: Option<Instant>,
}
impl<A: ArqReceiver, R: Random> Lane<A, R> {
    pub fn new(id: usize, config: &SimulationConfig, receiver: A, random: R) -> Result<Lane<A, R>, ConfigError> {
        Ok(Lane {
            id,
            sender: FrameSender::new(config.frame_size, config.fec)?,
            receiver,
            channel: ChannelModel::new(config.error_rate, config.symbol_error_rate),
            random,
            target_frames: config.target_frames,
            next_seq: 0,
            counters: LaneCounters::default(),
            suspended_until: None,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn counters(&self) -> LaneCounters {
        self.counters
    }

    pub fn receiver(&self) -> &A {
        &self.receiver
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn is_complete(&self) -> bool {
        self.counters.acknowledged >= self.target_frames
    }

    pub fn is_suspended(&self, now: Instant) -> bool {
        self.suspended_until.is_some_and(|until| until > now)
    }

    pub fn suspended_until(&self) -> Option<Instant> {
        self.suspended_until
    }

    pub fn suspend_until(&mut self, until: Instant) {
        self.suspended_until = Some(until);
    }

    /// One transmission attempt: create a frame for the next sequence number, pass it through the
    ///  channel and let the receiver decide. Only acceptance moves on to the next sequence number,
    ///  so a loss or rejection means the same number is issued again on the lane's next turn.
    pub fn step(&mut self) -> StepOutcome {
        if !self.receiver.may_issue(self.next_seq) {
            return StepOutcome::WindowClosed;
        }

        let frame = self.sender.create_frame(self.next_seq, &mut self.random);
        self.counters.sent += 1;

        let delivery = self.channel.transmit(frame, &mut self.random);
        if delivery.is_lost() {
            self.counters.loss_events += 1;
            return StepOutcome::Lost;
        }

        let verdict = self.receiver.accept(delivery);
        if verdict.is_accepted() {
            self.counters.acknowledged += 1;
            self.next_seq += 1;

            if self.is_complete() {
                debug!("lane {} reached its target of {} frames after {} sends", self.id, self.target_frames, self.counters.sent);
            }
            StepOutcome::Acknowledged
        }
        else {
            trace!("lane {}: frame #{} rejected: {:?}", self.id, self.next_seq, verdict);
            self.counters.rejected += 1;
            StepOutcome::Rejected
        }
    }

    /// Runs this lane on its own until it reaches its target. A loss suspends only this lane's
    ///  task for `loss_delay`.
    pub async fn run_to_completion(mut self, loss_delay: Duration, max_turns: Option<u64>) -> Result<Lane<A, R>, SimulationError> {
        let mut turns = 0u64;
        while !self.is_complete() {
            if max_turns.is_some_and(|max| turns >= max) {
                return Err(SimulationError::SweepLimitReached { sweeps: turns });
            }
            turns += 1;

            match self.step() {
                StepOutcome::Lost if !loss_delay.is_zero() => sleep(loss_delay).await,
                StepOutcome::Lost | StepOutcome::WindowClosed => tokio::task::yield_now().await,
                StepOutcome::Acknowledged | StepOutcome::Rejected => {}
            }
        }
        Ok(self)
    }
}


#[cfg(test)]
mod test {
    use mockall::predicate::eq;
    use crate::arq::{ArqVariant, GoBackNReceiver, SelectiveRepeatReceiver};
    use crate::frame::{FecParams, FrameCodec};
    use crate::util::random::{MockRandom, RngRandom};
    use super::*;

    fn config(error_rate: f64) -> SimulationConfig {
        let mut config = SimulationConfig::new(1, ArqVariant::GoBackN);
        config.frame_size = 16;
        config.fec = FecParams::new(24, 16).unwrap();
        config.target_frames = 3;
        config.error_rate = error_rate;
        config
    }

    fn gbn_lane<R: Random>(config: &SimulationConfig, random: R) -> Lane<GoBackNReceiver, R> {
        let receiver = GoBackNReceiver::new(FrameCodec::new(config.fec).unwrap());
        Lane::new(0, config, receiver, random).unwrap()
    }

    /// a mock that fills payloads and answers loss trials with the given sequence
    fn scripted_random(losses: Vec<bool>) -> MockRandom {
        let mut random = MockRandom::new();
        random.expect_fill_bytes()
            .returning(|buf| buf.fill(0x42));
        let mut losses = losses.into_iter();
        random.expect_chance()
            .with(eq(0.5))
            .returning(move |_| losses.next().unwrap_or(false));
        random
    }

    #[test]
    fn test_acknowledged_step_advances_sequence() {
        let config = config(0.0);
        let mut lane = gbn_lane(&config, RngRandom::seeded(1));

        assert_eq!(lane.step(), StepOutcome::Acknowledged);

        assert_eq!(lane.next_seq(), 1);
        assert_eq!(lane.receiver().expected_seq(), 1);
        assert_eq!(lane.counters(), LaneCounters { sent: 1, acknowledged: 1, loss_events: 0, rejected: 0 });
    }

    #[test]
    fn test_lost_step_retries_same_sequence() {
        let config = config(0.5);
        let mut lane = gbn_lane(&config, scripted_random(vec![true, true, false]));

        assert_eq!(lane.step(), StepOutcome::Lost);
        assert_eq!(lane.step(), StepOutcome::Lost);
        assert_eq!(lane.next_seq(), 0);

        assert_eq!(lane.step(), StepOutcome::Acknowledged);
        assert_eq!(lane.next_seq(), 1);
        assert_eq!(lane.counters(), LaneCounters { sent: 3, acknowledged: 1, loss_events: 2, rejected: 0 });
    }

    #[test]
    fn test_lane_completes_at_target() {
        let config = config(0.0);
        let mut lane = gbn_lane(&config, RngRandom::seeded(2));

        for _ in 0..3 {
            assert!(!lane.is_complete());
            lane.step();
        }
        assert!(lane.is_complete());
    }

    #[test]
    fn test_selective_repeat_lane_issues_within_window() {
        let mut config = config(0.0);
        config.variant = ArqVariant::SelectiveRepeat { window_size: 2 };
        let receiver = SelectiveRepeatReceiver::new(FrameCodec::new(config.fec).unwrap(), 2).unwrap();
        let mut lane = Lane::new(0, &config, receiver, RngRandom::seeded(3)).unwrap();

        for _ in 0..3 {
            assert_eq!(lane.step(), StepOutcome::Acknowledged);
        }
        assert_eq!(lane.receiver().expected_seq(), 3);
        assert_eq!(lane.receiver().buffered(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_to_completion_waits_out_loss_delay() {
        let config = config(0.5);
        let lane = gbn_lane(&config, scripted_random(vec![true, false, true, false, false]));

        let start = Instant::now();
        let lane = lane.run_to_completion(Duration::from_millis(100), None).await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200) && elapsed < Duration::from_millis(210), "{:?}", elapsed);
        assert_eq!(lane.counters(), LaneCounters { sent: 5, acknowledged: 3, loss_events: 2, rejected: 0 });
    }

    #[tokio::test]
    async fn test_run_to_completion_honors_turn_limit() {
        let config = config(1.0);
        let lane = gbn_lane(&config, RngRandom::seeded(4));

        let result = lane.run_to_completion(Duration::ZERO, Some(50)).await;

        assert!(matches!(result, Err(SimulationError::SweepLimitReached { sweeps: 50 })));
    }
}
