use std::path::Path;

use serde::Serialize;

use crate::{
    lyric::{non_negative, TimedWord},
    timeline::TimelineBuilder,
    Lyric, LyricMetadata, LyricSegment, Result,
};

/// Turns raw lyric text into a [`Lyric`]. Parsing is total: problems with
/// individual lines are reported as [`ParseWarning`]s and never abort the
/// rest of the document.
pub trait LyricParser {
    /// Parses `raw` and returns the lyric together with every skipped line.
    fn parse_with_warnings(&self, raw: &str) -> (Lyric, Vec<ParseWarning>);

    fn parse(&self, raw: &str) -> Lyric {
        self.parse_with_warnings(raw).0
    }
}

/// Why a line, or part of one, was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum ParseIssue {
    #[error("`{0}` is not a timestamp")]
    InvalidTimestamp(String),
    #[error("unsupported tag `{0}`")]
    UnknownTag(String),
    #[error("`{0}` tag already set")]
    DuplicateMetadata(&'static str),
}

/// A skipped line. Carries the 1-based line number and the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub content: String,
    pub issue: ParseIssue,
}

/// Parser for LRC documents, including repeated timestamp groups and
/// `<mm:ss.xx>` word markers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LrcParser;

impl LrcParser {
    pub fn new() -> Self {
        Self
    }
}

impl LyricParser for LrcParser {
    fn parse_with_warnings(&self, raw: &str) -> (Lyric, Vec<ParseWarning>) {
        let mut state = ParseState::default();

        for (index, line) in split_lines(raw).enumerate() {
            let line = line.trim_start_matches(['\u{feff}', ' ', '\t']);
            if line.starts_with('[') {
                state.line(index + 1, line);
            }
        }

        for warning in &state.warnings {
            tracing::warn!(
                line = warning.line,
                issue = %warning.issue,
                "skipping lyric line"
            );
        }

        let lyric = Lyric::new(state.metadata, state.timeline.finish());
        tracing::debug!(
            segments = lyric.timeline().len(),
            skipped = state.warnings.len(),
            "parsed lyric"
        );
        (lyric, state.warnings)
    }
}

#[derive(Default)]
struct ParseState {
    metadata: LyricMetadata,
    timeline: TimelineBuilder,
    warnings: Vec<ParseWarning>,
}

impl ParseState {
    fn line(&mut self, number: usize, line: &str) {
        let mut fields_from = line;
        if let Some((tag, value, rest)) = metadata_tag(line) {
            self.metadata_line(number, line, tag, value);
            // `[ti:x][00:01.00]text` carries a timed line after the tag.
            fields_from = rest.trim_start();
            if !fields_from.starts_with('[') {
                return;
            }
        }

        let mut fields = fields_from.split(['[', ']']).skip(1).peekable();
        let mut pending = Vec::new();
        while let Some(stamp) = fields.next() {
            let text = fields.next().unwrap_or("");
            match parse_timestamp(stamp) {
                Some(seconds) => pending.push(seconds),
                None => self.warn(number, line, classify_stamp(stamp)),
            }
            // `[a][b]text` shares `text` between both stamps.
            if text.is_empty() && fields.peek().is_some() {
                continue;
            }
            // Word markers are timed against the first stamp of the group.
            let Some(&anchor) = pending.first() else {
                continue;
            };
            let words = split_words(anchor, text);
            for seconds in pending.drain(..) {
                let segment = segment_from(seconds, anchor, text, words.as_deref());
                self.timeline.insert(segment);
            }
        }
    }

    fn metadata_line(&mut self, number: usize, line: &str, tag: &'static str, value: &str) {
        let field = match tag {
            "ti" => &mut self.metadata.title,
            "ar" => &mut self.metadata.artist,
            "al" => &mut self.metadata.album,
            _ => &mut self.metadata.contributor,
        };
        if field.is_empty() {
            *field = value.to_string();
        } else {
            self.warn(number, line, ParseIssue::DuplicateMetadata(tag));
        }
    }

    fn warn(&mut self, number: usize, line: &str, issue: ParseIssue) {
        self.warnings.push(ParseWarning {
            line: number,
            content: line.to_string(),
            issue,
        });
    }
}

const METADATA_TAGS: [&str; 4] = ["ti", "ar", "al", "by"];

/// Returns the tag, its trimmed value and whatever follows the closing
/// bracket.
fn metadata_tag(line: &str) -> Option<(&'static str, &str, &str)> {
    let body = line.strip_prefix('[')?;
    METADATA_TAGS.iter().find_map(|&tag| {
        let rest = body.strip_prefix(tag)?.strip_prefix(':')?;
        let (value, remainder) = match rest.find(']') {
            Some(end) => (&rest[..end], &rest[end + 1..]),
            None => (rest, ""),
        };
        Some((tag, value.trim(), remainder))
    })
}

fn classify_stamp(stamp: &str) -> ParseIssue {
    match stamp.split_once(':') {
        Some((key, _)) if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) => {
            ParseIssue::UnknownTag(key.to_string())
        }
        _ => ParseIssue::InvalidTimestamp(stamp.to_string()),
    }
}

/// Builds the segment for one stamp of a group, moving `words` (timed
/// against `anchor`) so they keep their offsets from `timestamp`.
fn segment_from(
    timestamp: f64,
    anchor: f64,
    text: &str,
    words: Option<&[TimedWord]>,
) -> LyricSegment {
    match words {
        Some(words) => {
            let shift = timestamp - anchor;
            let shifted = words
                .iter()
                .map(|word| TimedWord::new(word.start + shift, word.text.clone()))
                .collect();
            LyricSegment::with_words(timestamp, shifted)
        }
        None => LyricSegment::new(timestamp, text),
    }
}

/// Splits text carrying `<mm:ss.xx>` markers into timed words. Returns `None`
/// when the text has no valid marker.
fn split_words(timestamp: f64, text: &str) -> Option<Vec<TimedWord>> {
    if !text.contains('<') {
        return None;
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut start = timestamp;
    let mut saw_marker = false;
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        current.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let marker = after
            .find('>')
            .and_then(|close| parse_timestamp(&after[..close]).map(|time| (close, time)));
        match marker {
            Some((close, time)) => {
                if !current.is_empty() {
                    words.push(TimedWord::new(start, std::mem::take(&mut current)));
                }
                // Keep word order; a marker earlier than its predecessor holds.
                start = time.max(start);
                saw_marker = true;
                rest = &after[close + 1..];
            }
            None => {
                current.push('<');
                rest = after;
            }
        }
    }
    current.push_str(rest);
    if !current.is_empty() {
        words.push(TimedWord::new(start, current));
    }

    (saw_marker && !words.is_empty()).then_some(words)
}

/// Parses an LRC timestamp such as `01:02.50` into seconds.
///
/// Colon-separated fields are folded base 60, so `ss.xx`, `mm:ss.xx` and
/// `hh:mm:ss.xx` are all accepted. A field that fails to parse counts as 0,
/// but a stamp where no field parses, or that contains letters, is rejected.
pub fn parse_timestamp(stamp: &str) -> Option<f64> {
    let stamp = stamp.trim();
    if stamp.is_empty() || stamp.chars().any(char::is_alphabetic) {
        return None;
    }

    let mut parsed_any = false;
    let seconds = stamp.split(':').fold(0.0, |total, field| {
        let value = match field.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                parsed_any = true;
                value
            }
            _ => 0.0,
        };
        total * 60.0 + value
    });

    parsed_any.then(|| non_negative(seconds))
}

/// Reads an LRC file from disk and parses it with `parser`.
pub fn load_lyric_file<P>(parser: &P, path: impl AsRef<Path>) -> Result<Lyric>
where
    P: LyricParser + ?Sized,
{
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = raw.len(), "loaded lyric file");
    Ok(parser.parse(&raw))
}

fn split_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines()
        .flat_map(|line| {
            line.split(['\r', '\u{0B}', '\u{0C}', '\u{85}', '\u{2028}', '\u{2029}'])
        })
}
