use crate::{MonotonicTimeSource, Result, SyncClock, TimeSource};

/// Audio playback as seen by the lyric engine. Decoding and output live
/// elsewhere; the engine only reads the position and the end-of-track flag.
pub trait AudioTransport {
    /// Playback position in seconds.
    fn current_position(&self) -> f64;

    /// Returns `true` once the track has played to the end.
    fn did_finish_playing(&self) -> bool;
}

/// Stand-in transport that advances on its own clock, optionally at a rate
/// other than 1.0 so that drift against the lyric clock can be exercised.
#[derive(Debug, Clone)]
pub struct SimulatedTransport<T = MonotonicTimeSource> {
    clock: SyncClock<T>,
    duration: f64,
    rate: f64,
}

impl SimulatedTransport<MonotonicTimeSource> {
    pub fn new(duration: f64) -> Self {
        Self::with_source(MonotonicTimeSource::new(), duration)
    }
}

impl<T: TimeSource> SimulatedTransport<T> {
    pub fn with_source(source: T, duration: f64) -> Self {
        Self {
            clock: SyncClock::with_source(source),
            duration: duration.max(0.0),
            rate: 1.0,
        }
    }

    /// Plays back at `rate` times real time.
    pub fn with_rate(mut self, rate: f64) -> Self {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
        self
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn play(&mut self) -> Result<()> {
        self.clock.start()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.clock.pause()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.clock.resume()
    }

    pub fn seek(&mut self, position: f64) -> Result<()> {
        self.clock.seek(position / self.rate)
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }
}

impl<T: TimeSource> AudioTransport for SimulatedTransport<T> {
    fn current_position(&self) -> f64 {
        (self.clock.current_position() * self.rate).min(self.duration)
    }

    fn did_finish_playing(&self) -> bool {
        self.clock.is_playing() && self.current_position() >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualTimeSource;

    #[test]
    fn position_runs_at_rate_and_stops_at_duration() {
        let time = ManualTimeSource::new(0.0);
        let mut transport = SimulatedTransport::with_source(time.clone(), 10.0).with_rate(1.1);
        transport.play().unwrap();

        time.advance(5.0);
        assert!((transport.current_position() - 5.5).abs() < 1e-9);
        assert!(!transport.did_finish_playing());

        time.advance(10.0);
        assert_eq!(transport.current_position(), 10.0);
        assert!(transport.did_finish_playing());
    }

    #[test]
    fn seek_is_in_track_time() {
        let time = ManualTimeSource::new(0.0);
        let mut transport = SimulatedTransport::with_source(time.clone(), 60.0).with_rate(2.0);
        transport.play().unwrap();
        transport.seek(30.0).unwrap();

        assert!((transport.current_position() - 30.0).abs() < 1e-9);
        transport.pause().unwrap();
        time.advance(4.0);
        assert!((transport.current_position() - 30.0).abs() < 1e-9);
    }
}
