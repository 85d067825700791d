use std::sync::Arc;

use karaoke_sync_core::{
    AudioTransport, ClockPhase, LrcParser, LyricParser, ManualTimeSource, PlaybackCoordinator,
    RecordingSink, RenderEvent, SimulatedTransport, SyncConfig,
};

const SONG: &str = "\
[ti:Tri Ky]
[ar:Phan Manh Quynh]
[by:karaoke-sync]
[bad]this line is skipped
[00:01.00]Hello [00:03.50]World
[00:06.00]<00:06.00>one <00:06.50>two <00:07.00>three
";

fn char_width(text: &str) -> f64 {
    text.chars().count() as f64
}

#[test]
fn plays_a_song_end_to_end() {
    let (lyric, warnings) = LrcParser::new().parse_with_warnings(SONG);
    assert_eq!(lyric.metadata().title, "Tri Ky");
    assert_eq!(warnings.len(), 1);
    assert_eq!(lyric.timeline().sorted_timestamps(), &[1.0, 3.5, 6.0]);

    let time = ManualTimeSource::new(0.0);
    let mut coordinator = PlaybackCoordinator::with_time_source(
        Arc::new(lyric),
        time.clone(),
        RecordingSink::new(),
        char_width,
    );
    coordinator.play().unwrap();

    let mut indices = Vec::new();
    for step in 0..=120 {
        time.set(step as f64 * 0.1);
        if let Some(update) = coordinator.on_tick() {
            indices.push(update.index);
        }
    }
    assert!(indices.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(indices.last(), Some(&2));

    let starts: Vec<_> = coordinator
        .sink()
        .events()
        .iter()
        .filter(|event| matches!(event, RenderEvent::SegmentStart(_)))
        .cloned()
        .collect();
    assert_eq!(
        starts,
        vec![
            RenderEvent::SegmentStart(0),
            RenderEvent::SegmentStart(1),
            RenderEvent::SegmentStart(2),
        ]
    );

    let last_fill = coordinator
        .sink()
        .events()
        .iter()
        .rev()
        .find_map(|event| match event {
            RenderEvent::FillUpdate { fill_width, .. } => Some(*fill_width),
            _ => None,
        });
    assert_eq!(last_fill, Some(char_width("one two three")));

    coordinator.stop();
    assert_eq!(coordinator.sink().events().last(), Some(&RenderEvent::Stopped));
}

#[test]
fn pause_holds_reveal_until_resume() {
    let lyric = Arc::new(LrcParser::new().parse("[00:00.00]abcdefgh\n[00:04.00]next"));
    let time = ManualTimeSource::new(50.0);
    let mut coordinator =
        PlaybackCoordinator::with_time_source(lyric, time.clone(), RecordingSink::new(), char_width);

    coordinator.play().unwrap();
    time.advance(2.0);
    coordinator.pause().unwrap();
    let paused = coordinator.on_tick().unwrap();
    assert!((paused.fill_width - 4.0).abs() < 1e-9);

    time.advance(5.0);
    coordinator.resume().unwrap();
    let resumed = coordinator.on_tick().unwrap();
    assert!((resumed.position - 2.0).abs() < 1e-9);
    assert!((resumed.fill_width - paused.fill_width).abs() < 1e-9);
}

#[test]
fn drifting_transport_pulls_lyrics_along() {
    let lyric = Arc::new(LrcParser::new().parse("[00:00.00]a\n[00:10.00]b"));
    let time = ManualTimeSource::new(0.0);
    let mut transport = SimulatedTransport::with_source(time.clone(), 20.0).with_rate(1.1);
    let mut coordinator =
        PlaybackCoordinator::with_time_source(lyric, time.clone(), RecordingSink::new(), char_width)
            .with_config(SyncConfig::default().with_drift_threshold(0.3))
            .unwrap();

    transport.play().unwrap();
    coordinator.play().unwrap();

    time.set(2.0);
    coordinator.sync_with(&transport).unwrap();
    assert!((coordinator.position() - 2.0).abs() < 1e-9);

    time.set(4.0);
    coordinator.sync_with(&transport).unwrap();
    assert!((coordinator.position() - transport.current_position()).abs() < 1e-9);

    time.set(30.0);
    assert!(coordinator.sync_with(&transport).unwrap().is_none());
    assert_eq!(coordinator.phase(), ClockPhase::Stopped);
    assert_eq!(coordinator.sink().events().last(), Some(&RenderEvent::Stopped));
}
