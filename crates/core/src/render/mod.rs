use serde::Serialize;

/// Receiver for reveal events. Called synchronously from the coordinator on
/// the thread that drives it.
pub trait RenderSink {
    fn on_segment_start(&mut self, index: usize);

    /// `fill_width` is the width revealed so far, in the units returned by the
    /// width measure. `is_final` marks the last segment of the lyric.
    fn on_fill_update(&mut self, index: usize, fill_width: f64, is_final: bool);

    fn on_segment_end(&mut self, index: usize);

    /// Playback stopped; tear down any in-flight reveal.
    fn on_stopped(&mut self);
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn on_segment_start(&mut self, index: usize) {
        (**self).on_segment_start(index);
    }

    fn on_fill_update(&mut self, index: usize, fill_width: f64, is_final: bool) {
        (**self).on_fill_update(index, fill_width, is_final);
    }

    fn on_segment_end(&mut self, index: usize) {
        (**self).on_segment_end(index);
    }

    fn on_stopped(&mut self) {
        (**self).on_stopped();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderEvent {
    SegmentStart(usize),
    FillUpdate {
        index: usize,
        fill_width: f64,
        is_final: bool,
    },
    SegmentEnd(usize),
    Stopped,
}

/// Sink that keeps every event in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<RenderEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RenderEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl RenderSink for RecordingSink {
    fn on_segment_start(&mut self, index: usize) {
        self.events.push(RenderEvent::SegmentStart(index));
    }

    fn on_fill_update(&mut self, index: usize, fill_width: f64, is_final: bool) {
        self.events.push(RenderEvent::FillUpdate {
            index,
            fill_width,
            is_final,
        });
    }

    fn on_segment_end(&mut self, index: usize) {
        self.events.push(RenderEvent::SegmentEnd(index));
    }

    fn on_stopped(&mut self) {
        self.events.push(RenderEvent::Stopped);
    }
}
