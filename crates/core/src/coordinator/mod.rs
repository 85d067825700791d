use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    AudioTransport, ClockPhase, FillCurve, Lyric, MonotonicTimeSource, RenderSink, Result,
    SyncClock, SyncConfig, TimeSource,
};

type WidthMeasure = Box<dyn Fn(&str) -> f64>;

/// What a tick resolved and forwarded to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FillUpdate {
    pub index: usize,
    pub position: f64,
    /// Elapsed share of the segment's reveal window, in `[0, 1]`.
    pub fraction: f64,
    pub fill_width: f64,
    pub is_final: bool,
}

/// Drives a lyric's reveal from a [`SyncClock`] and reports it to a
/// [`RenderSink`].
///
/// The coordinator is single-threaded and does no work on its own: an
/// external scheduler calls [`on_tick`](Self::on_tick) (or
/// [`sync_with`](Self::sync_with)) at whatever cadence it likes. When the
/// active segment changes between ticks the sink always sees the end of the
/// old segment, then the start of the new one, then the first fill update.
pub struct PlaybackCoordinator<R, T = MonotonicTimeSource> {
    lyric: Arc<Lyric>,
    clock: SyncClock<T>,
    sink: R,
    config: SyncConfig,
    measure: WidthMeasure,
    curves: Vec<Option<FillCurve>>,
    active: Option<usize>,
}

impl<R: RenderSink> PlaybackCoordinator<R, MonotonicTimeSource> {
    pub fn new<F>(lyric: Arc<Lyric>, sink: R, measure: F) -> Self
    where
        F: Fn(&str) -> f64 + 'static,
    {
        Self::with_time_source(lyric, MonotonicTimeSource::new(), sink, measure)
    }
}

impl<R: RenderSink, T: TimeSource> PlaybackCoordinator<R, T> {
    /// Creates a coordinator whose clock reads time from `source`.
    pub fn with_time_source<F>(lyric: Arc<Lyric>, source: T, sink: R, measure: F) -> Self
    where
        F: Fn(&str) -> f64 + 'static,
    {
        let segments = lyric.timeline().len();
        Self {
            lyric,
            clock: SyncClock::with_source(source),
            sink,
            config: SyncConfig::default(),
            measure: Box::new(measure),
            curves: vec![None; segments],
            active: None,
        }
    }

    /// Replaces the default tuning. Fails if `config` does not validate.
    pub fn with_config(mut self, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        self.curves.iter_mut().for_each(|curve| *curve = None);
        Ok(self)
    }

    pub fn lyric(&self) -> &Lyric {
        &self.lyric
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn phase(&self) -> ClockPhase {
        self.clock.phase()
    }

    pub fn position(&self) -> f64 {
        self.clock.current_position()
    }

    /// Segment the sink was last told about.
    pub fn active_segment(&self) -> Option<usize> {
        self.active
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
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

    /// Single play/pause control: starts when stopped, otherwise flips
    /// between playing and paused. Returns the new phase.
    pub fn toggle(&mut self) -> Result<ClockPhase> {
        match self.clock.phase() {
            ClockPhase::Stopped => self.clock.start()?,
            ClockPhase::Playing => self.clock.pause()?,
            ClockPhase::Paused => self.clock.resume()?,
        }
        Ok(self.clock.phase())
    }

    pub fn seek_to(&mut self, position: f64) -> Result<()> {
        self.clock.seek(position)
    }

    /// Stops the clock, closes any active segment and tells the sink that
    /// playback is over.
    pub fn stop(&mut self) {
        self.clock.stop();
        if let Some(index) = self.active.take() {
            self.sink.on_segment_end(index);
        }
        self.sink.on_stopped();
    }

    /// Re-seeks the clock to `audio_position` when the two have drifted
    /// apart by more than the configured threshold. Returns whether a
    /// correction happened. Does nothing while stopped.
    pub fn reconcile(&mut self, audio_position: f64) -> Result<bool> {
        if self.clock.phase() == ClockPhase::Stopped {
            return Ok(false);
        }
        let position = self.clock.current_position();
        let drift = position - audio_position;
        if drift.abs() <= self.config.drift_threshold {
            return Ok(false);
        }

        self.clock.seek(audio_position)?;
        tracing::debug!(position, audio_position, drift, "corrected lyric clock drift");
        Ok(true)
    }

    /// One scheduler step against a live transport: stop if the track
    /// finished, otherwise reconcile with its position and tick.
    pub fn sync_with<A>(&mut self, transport: &A) -> Result<Option<FillUpdate>>
    where
        A: AudioTransport + ?Sized,
    {
        if transport.did_finish_playing() {
            if self.clock.phase() != ClockPhase::Stopped {
                self.stop();
            }
            return Ok(None);
        }
        self.reconcile(transport.current_position())?;
        Ok(self.on_tick())
    }

    /// Resolves the active segment and its fill at the current clock
    /// position and reports both to the sink. Returns `None` while stopped
    /// or before the first segment starts.
    pub fn on_tick(&mut self) -> Option<FillUpdate> {
        if self.clock.phase() == ClockPhase::Stopped {
            return None;
        }

        let lyric = Arc::clone(&self.lyric);
        let timeline = lyric.timeline();
        let position = self.clock.current_position();
        let index = timeline.active_segment_index(position);

        if index != self.active {
            if let Some(previous) = self.active {
                self.sink.on_segment_end(previous);
            }
            if let Some(next) = index {
                self.sink.on_segment_start(next);
            }
            tracing::debug!(from = ?self.active, to = ?index, position, "segment boundary");
            self.active = index;
        }

        let index = index?;
        let start = timeline.sorted_timestamps()[index];
        let window = timeline.reveal_window(index, self.config.final_segment_hold)?;
        let fraction = if window > 0.0 {
            ((position - start) / window).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let measure = &self.measure;
        let curve = self.curves[index].get_or_insert_with(|| {
            timeline
                .fill_curve(index, window, |text: &str| measure(text))
                .unwrap_or_default()
        });
        let fill_width = curve.width_at(fraction);
        let is_final = index + 1 == timeline.len();

        self.sink.on_fill_update(index, fill_width, is_final);
        Some(FillUpdate {
            index,
            position,
            fraction,
            fill_width,
            is_final,
        })
    }
}

impl<R: fmt::Debug, T> fmt::Debug for PlaybackCoordinator<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("segments", &self.lyric.timeline().len())
            .field("sink", &self.sink)
            .field("config", &self.config)
            .field("active", &self.active)
            .finish()
    }
}
