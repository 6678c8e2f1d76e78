use crate::common::{DomainError, DomainResult};
use crate::domains::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    Running,
    Paused,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub index: usize,
    pub point: GeoPoint,
    pub points_remaining: usize,
    pub eta: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Advanced(Progress),
    /// The final point was reached on this tick. Reported once per clock.
    Completed(Progress),
    /// Paused, canceled or already completed.
    Idle,
}

/// Steps an index through a densified path.
///
/// The clock is a plain state machine; the runner owns the timer that calls
/// [`SimulationClock::tick`].
#[derive(Debug, Clone)]
pub struct SimulationClock {
    path: Vec<GeoPoint>,
    index: usize,
    interval: Duration,
    total_duration: Duration,
    state: ClockState,
}

impl SimulationClock {
    pub fn new(path: Vec<GeoPoint>, total_duration: Duration) -> DomainResult<Self> {
        if path.is_empty() {
            return Err(DomainError::InvalidCommand {
                reason: "Cannot simulate an empty path".to_string(),
            });
        }
        let steps = (path.len() - 1).max(1) as u32;
        Ok(Self {
            interval: total_duration / steps,
            path,
            index: 0,
            total_duration,
            state: ClockState::Running,
        })
    }

    /// `(total_duration, interval)` for traversing `path_length_m` at `speed_mps`
    /// over a path of `points` points.
    pub fn interval_for(path_length_m: f64, speed_mps: f64, points: usize) -> DomainResult<(Duration, Duration)> {
        if !speed_mps.is_finite() || speed_mps <= 0.0 {
            return Err(DomainError::InvalidCommand {
                reason: format!("Speed must be positive, got {}", speed_mps),
            });
        }
        if !path_length_m.is_finite() || path_length_m <= 0.0 || points < 2 {
            return Err(DomainError::InvalidCommand {
                reason: "Path has no length to traverse".to_string(),
            });
        }
        let total = Duration::from_secs_f64(path_length_m / speed_mps);
        let interval = total / (points - 1) as u32;
        Ok((total, interval))
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != ClockState::Running {
            return Tick::Idle;
        }
        let last = self.path.len() - 1;
        if self.index < last {
            self.index += 1;
        }
        if self.index == last {
            self.state = ClockState::Completed;
            Tick::Completed(self.progress())
        } else {
            Tick::Advanced(self.progress())
        }
    }

    /// Returns false when the clock was not running.
    pub fn pause(&mut self) -> bool {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == ClockState::Paused {
            self.state = ClockState::Running;
            true
        } else {
            false
        }
    }

    /// Returns false when the clock had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.state = ClockState::Canceled;
        true
    }

    pub fn progress(&self) -> Progress {
        Progress {
            index: self.index,
            point: self.path[self.index],
            points_remaining: self.points_remaining(),
            eta: self.eta(),
        }
    }

    /// `(points_remaining / total_points) * total_duration`.
    pub fn eta(&self) -> Duration {
        let total_points = self.path.len() - 1;
        if total_points == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_duration.as_nanos() * self.points_remaining() as u128 / total_points as u128;
        Duration::from_nanos(nanos as u64)
    }

    pub fn points_remaining(&self) -> usize {
        self.path.len() - 1 - self.index
    }

    pub fn current_point(&self) -> GeoPoint {
        self.path[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, ClockState::Completed | ClockState::Canceled)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }
}
