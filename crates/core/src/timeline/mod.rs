use serde::{Deserialize, Serialize};

use crate::LyricSegment;

/// Immutable, ascending list of lyric segments with a cached timestamp index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    segments: Vec<LyricSegment>,
    #[serde(skip)]
    timestamps: Vec<f64>,
}

impl Timeline {
    /// Builds a timeline from segments in any order. A later segment with the
    /// same timestamp as an earlier one replaces it.
    pub fn from_segments(segments: impl IntoIterator<Item = LyricSegment>) -> Self {
        let mut builder = TimelineBuilder::new();
        for segment in segments {
            builder.insert(segment);
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[LyricSegment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&LyricSegment> {
        self.segments.get(index)
    }

    /// Strictly ascending segment start times.
    pub fn sorted_timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Index of the segment showing at `time`, or `None` before the first
    /// segment starts.
    pub fn active_segment_index(&self, time: f64) -> Option<usize> {
        if time.is_nan() {
            return None;
        }
        match self.timestamps.partition_point(|&start| start <= time) {
            0 => None,
            started => Some(started - 1),
        }
    }

    /// Time until the next segment starts. The final segment never ends, so
    /// its duration is `f64::INFINITY`.
    pub fn segment_duration(&self, index: usize) -> Option<f64> {
        let start = *self.timestamps.get(index)?;
        Some(match self.timestamps.get(index + 1) {
            Some(next) => next - start,
            None => f64::INFINITY,
        })
    }

    /// Finite window over which a segment's reveal runs. For the final
    /// segment this is `final_hold` seconds past its last timed word.
    pub fn reveal_window(&self, index: usize, final_hold: f64) -> Option<f64> {
        let duration = self.segment_duration(index)?;
        if duration.is_finite() {
            return Some(duration);
        }
        let segment = &self.segments[index];
        let lead = segment
            .words
            .last()
            .map(|word| (word.start - segment.timestamp).max(0.0))
            .unwrap_or(0.0);
        Some(lead + final_hold.max(0.0))
    }

    /// Width-weighted reveal curve for a segment.
    ///
    /// Each unit (a timed word, or the whole line when the segment has no
    /// word timing) contributes one control point at the fraction of `window`
    /// where the unit finishes, carrying the cumulative `measure`d width up to
    /// and including that unit.
    pub fn fill_curve<F>(&self, index: usize, window: f64, measure: F) -> Option<FillCurve>
    where
        F: Fn(&str) -> f64,
    {
        let segment = self.segments.get(index)?;
        let width = |text: &str| {
            let value = measure(text);
            if value.is_finite() {
                value.max(0.0)
            } else {
                0.0
            }
        };

        if segment.words.is_empty() {
            return Some(FillCurve::new(vec![FillPoint::new(1.0, width(&segment.text))]));
        }

        let fraction_of = |time: f64| {
            if window.is_finite() && window > 0.0 {
                ((time - segment.timestamp) / window).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        let mut points = Vec::with_capacity(segment.words.len() + 1);
        let first_start = fraction_of(segment.words[0].start);
        if first_start > 0.0 {
            points.push(FillPoint::new(first_start, 0.0));
        }

        let mut cumulative = 0.0;
        let mut last_fraction = first_start;
        for (position, word) in segment.words.iter().enumerate() {
            cumulative += width(&word.text);
            let end = segment
                .words
                .get(position + 1)
                .map(|next| fraction_of(next.start))
                .unwrap_or(1.0)
                .max(last_fraction);
            last_fraction = end;
            points.push(FillPoint::new(end, cumulative));
        }

        Some(FillCurve::new(points))
    }
}

/// Incremental construction used while parsing. Keeps segments sorted and
/// unique by timestamp as they arrive.
#[derive(Debug, Default)]
pub(crate) struct TimelineBuilder {
    segments: Vec<LyricSegment>,
}

impl TimelineBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a segment, returning `true` if it replaced an existing one.
    pub(crate) fn insert(&mut self, segment: LyricSegment) -> bool {
        match self
            .segments
            .binary_search_by(|existing| existing.timestamp.total_cmp(&segment.timestamp))
        {
            Ok(index) => {
                self.segments[index] = segment;
                true
            }
            Err(index) => {
                self.segments.insert(index, segment);
                false
            }
        }
    }

    pub(crate) fn finish(self) -> Timeline {
        let timestamps = self.segments.iter().map(|s| s.timestamp).collect();
        Timeline {
            segments: self.segments,
            timestamps,
        }
    }
}

/// A control point of a [`FillCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillPoint {
    /// Fraction of the reveal window, in `[0, 1]`.
    pub fraction: f64,
    /// Cumulative width revealed once `fraction` is reached.
    pub width: f64,
}

impl FillPoint {
    pub fn new(fraction: f64, width: f64) -> Self {
        Self { fraction, width }
    }
}

/// Piecewise-linear mapping from reveal fraction to filled width, starting at
/// an implicit `(0, 0)`. Both coordinates are non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillCurve {
    points: Vec<FillPoint>,
}

impl FillCurve {
    pub fn new(points: Vec<FillPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[FillPoint] {
        &self.points
    }

    pub fn total_width(&self) -> f64 {
        self.points.last().map(|point| point.width).unwrap_or(0.0)
    }

    /// Filled width after `fraction` of the reveal window has elapsed.
    pub fn width_at(&self, fraction: f64) -> f64 {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };

        let mut previous = FillPoint::new(0.0, 0.0);
        for point in &self.points {
            if fraction < point.fraction {
                let span = point.fraction - previous.fraction;
                let t = (fraction - previous.fraction) / span;
                return previous.width + t * (point.width - previous.width);
            }
            previous = *point;
        }
        previous.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimedWord;

    fn char_width(text: &str) -> f64 {
        text.chars().count() as f64
    }

    fn timeline(entries: &[(f64, &str)]) -> Timeline {
        Timeline::from_segments(
            entries
                .iter()
                .map(|(time, text)| LyricSegment::new(*time, *text)),
        )
    }

    #[test]
    fn timestamps_are_sorted_and_deduplicated() {
        let timeline = timeline(&[(3.0, "c"), (1.0, "a"), (2.0, "b"), (1.0, "a2")]);

        assert_eq!(timeline.sorted_timestamps(), &[1.0, 2.0, 3.0]);
        assert_eq!(timeline.segment(0).unwrap().text, "a2");
    }

    #[test]
    fn signed_zero_timestamps_share_one_slot() {
        let timeline = timeline(&[(-0.0, "a"), (0.0, "b")]);

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.segment(0).unwrap().text, "b");
        assert_eq!(timeline.active_segment_index(0.0), Some(0));
    }

    #[test]
    fn active_index_tracks_segment_windows() {
        let timeline = timeline(&[(1.0, "Hello "), (3.5, "World")]);

        assert_eq!(timeline.active_segment_index(0.5), None);
        assert_eq!(timeline.active_segment_index(1.0), Some(0));
        assert_eq!(timeline.active_segment_index(2.0), Some(0));
        assert_eq!(timeline.active_segment_index(3.5), Some(1));
        assert_eq!(timeline.active_segment_index(400.0), Some(1));
        assert_eq!(timeline.active_segment_index(f64::NAN), None);
    }

    #[test]
    fn active_index_never_regresses() {
        let timeline = timeline(&[(0.5, "a"), (1.25, "b"), (1.3, "c"), (9.0, "d")]);
        let mut previous = None;
        for step in 0..1200 {
            let current = timeline.active_segment_index(step as f64 * 0.01);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn empty_and_single_entry_timelines() {
        let empty = Timeline::default();
        assert!(empty.is_empty());
        assert_eq!(empty.active_segment_index(10.0), None);
        assert_eq!(empty.segment_duration(0), None);
        assert!(empty.fill_curve(0, 1.0, char_width).is_none());

        let single = timeline(&[(2.0, "only")]);
        assert_eq!(single.active_segment_index(1.9), None);
        assert_eq!(single.active_segment_index(2.0), Some(0));
        assert_eq!(single.active_segment_index(1e6), Some(0));
        assert_eq!(single.segment_duration(0), Some(f64::INFINITY));
    }

    #[test]
    fn final_segment_uses_hold_window() {
        let timeline = timeline(&[(1.0, "a"), (4.0, "b")]);

        assert_eq!(timeline.segment_duration(0), Some(3.0));
        assert_eq!(timeline.reveal_window(0, 2.0), Some(3.0));
        assert_eq!(timeline.reveal_window(1, 2.0), Some(2.0));
    }

    #[test]
    fn whole_line_curve_is_linear_in_width() {
        let timeline = timeline(&[(0.0, "abcd")]);
        let curve = timeline.fill_curve(0, 2.0, char_width).unwrap();

        assert_eq!(curve.points().len(), 1);
        assert_eq!(curve.width_at(0.0), 0.0);
        assert!((curve.width_at(0.5) - 2.0).abs() < 1e-9);
        assert_eq!(curve.width_at(1.0), 4.0);
        assert_eq!(curve.width_at(7.0), 4.0);
    }

    #[test]
    fn word_curve_follows_word_timing_and_width() {
        let segment = LyricSegment::with_words(
            10.0,
            vec![
                TimedWord::new(11.0, "Hi "),
                TimedWord::new(12.0, "wonderful "),
                TimedWord::new(13.0, "day"),
            ],
        );
        let timeline = Timeline::from_segments([segment, LyricSegment::new(14.0, "next")]);
        let curve = timeline.fill_curve(0, 4.0, char_width).unwrap();

        let points = curve.points();
        assert_eq!(points[0], FillPoint::new(0.25, 0.0));
        assert_eq!(points[1], FillPoint::new(0.5, 3.0));
        assert_eq!(points[2], FillPoint::new(0.75, 13.0));
        assert_eq!(points[3], FillPoint::new(1.0, 16.0));

        assert_eq!(curve.width_at(0.1), 0.0);
        assert!((curve.width_at(0.625) - 8.0).abs() < 1e-9);
        assert_eq!(curve.total_width(), 16.0);
    }

    #[test]
    fn fill_is_monotonic_and_ends_at_total_width() {
        let segment = LyricSegment::with_words(
            0.0,
            vec![
                TimedWord::new(0.0, "one "),
                TimedWord::new(0.2, "two "),
                TimedWord::new(0.2, "three"),
            ],
        );
        let timeline = Timeline::from_segments([segment]);
        let window = timeline.reveal_window(0, 1.0).unwrap();
        let curve = timeline.fill_curve(0, window, char_width).unwrap();

        let mut previous = 0.0;
        for step in 0..=100 {
            let width = curve.width_at(step as f64 / 100.0);
            assert!(width >= previous);
            previous = width;
        }
        assert_eq!(previous, 13.0);
    }

    #[test]
    fn invalid_measurements_count_as_zero_width() {
        let timeline = timeline(&[(0.0, "x")]);
        let curve = timeline.fill_curve(0, 1.0, |_| f64::NAN).unwrap();
        assert_eq!(curve.total_width(), 0.0);
    }
}
