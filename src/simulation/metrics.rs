use std::iter::Sum;
use std::ops::AddAssign;
use std::time::Duration;

/// elapsed times below the timer resolution are rounded up to this, keeping throughput finite
const MIN_ELAPSED: Duration = Duration::from_micros(1);


/// Outcome counts for a single sender's lane
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LaneCounters {
    /// frames created and handed to the channel
    pub sent: u64,
    pub acknowledged: u64,
    /// frames dropped by the channel
    pub loss_events: u64,
    /// frames that reached the receiver and were not accepted
    pub rejected: u64,
}
impl AddAssign for LaneCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.sent += rhs.sent;
        self.acknowledged += rhs.acknowledged;
        self.loss_events += rhs.loss_events;
        self.rejected += rhs.rejected;
    }
}
impl Sum for LaneCounters {
    fn sum<I: Iterator<Item=Self>>(iter: I) -> Self {
        let mut result = LaneCounters::default();
        for c in iter {
            result += c;
        }
        result
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// acknowledged frames per second of wall-clock time, summed over all lanes
    pub throughput: f64,
    /// fraction of sent frames that were lost on the channel
    pub loss_rate: f64,
    pub elapsed: Duration,
    pub totals: LaneCounters,
    pub lanes: Vec<LaneCounters>,
}
impl RunReport {
    pub fn new(lanes: Vec<LaneCounters>, elapsed: Duration) -> RunReport {
        let totals: LaneCounters = lanes.iter().copied().sum();
        let elapsed = elapsed.max(MIN_ELAPSED);

        let throughput = totals.acknowledged as f64 / elapsed.as_secs_f64();
        let loss_rate = if totals.sent == 0 {
            0.0
        }
        else {
            totals.loss_events as f64 / totals.sent as f64
        };

        RunReport {
            throughput,
            loss_rate,
            elapsed,
            totals,
            lanes,
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn counters(sent: u64, acknowledged: u64, loss_events: u64) -> LaneCounters {
        LaneCounters {
            sent,
            acknowledged,
            loss_events,
            rejected: sent - acknowledged - loss_events,
        }
    }

    #[test]
    fn test_report_aggregates_lanes() {
        let report = RunReport::new(vec![counters(12, 10, 2), counters(10, 10, 0), counters(15, 10, 5)], Duration::from_secs(2));

        assert_eq!(report.totals, counters(37, 30, 7));
        assert_eq!(report.throughput, 15.0);
        assert_eq!(report.loss_rate, 7.0 / 37.0);
    }

    #[test]
    fn test_zero_elapsed_time_keeps_throughput_finite() {
        let report = RunReport::new(vec![counters(10, 10, 0)], Duration::ZERO);

        assert!(report.throughput.is_finite());
        assert_eq!(report.elapsed, MIN_ELAPSED);
        assert_eq!(report.loss_rate, 0.0);
    }

    #[test]
    fn test_empty_report() {
        let report = RunReport::new(vec![], Duration::from_secs(1));

        assert_eq!(report.totals, LaneCounters::default());
        assert_eq!(report.throughput, 0.0);
        assert_eq!(report.loss_rate, 0.0);
    }
}
