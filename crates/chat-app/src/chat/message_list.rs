use std::fmt::Display;

use chrono::{Local, TimeZone};
use doodle_api::{CreatedAt, Message};
use unicode_width::UnicodeWidthStr;

use crate::chat::entities::decode_html_entities;

pub const LOADING_PLACEHOLDER: &str = "Loading messages...";
pub const EMPTY_PLACEHOLDER: &str = "No messages yet";
const TIMESTAMP_FORMAT: &str = "%-d %b %Y %H:%M";
const MIN_BUBBLE_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Author,
    Body,
    Timestamp,
    Placeholder,
    Gap,
}

/// One terminal row of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub text: String,
    pub align: Align,
    pub kind: LineKind,
    pub own: bool,
}

impl TranscriptLine {
    fn placeholder(text: &str) -> Self {
        Self {
            text: text.to_string(),
            align: Align::Center,
            kind: LineKind::Placeholder,
            own: false,
        }
    }

    /// Columns of padding that place the line within a row of `width`
    /// columns, measured by display width.
    pub fn leading_padding(&self, width: usize) -> usize {
        let free = width.saturating_sub(self.text.width());
        match self.align {
            Align::Left => 0,
            Align::Right => free,
            Align::Center => free / 2,
        }
    }

    fn gap() -> Self {
        Self {
            text: String::new(),
            align: Align::Left,
            kind: LineKind::Gap,
            own: false,
        }
    }
}

/// Lays the messages out as bubbles in the viewer's local time zone.
pub fn render_transcript(
    messages: &[Message],
    loading: bool,
    current_user: &str,
    width: usize,
) -> Vec<TranscriptLine> {
    render_transcript_in(messages, loading, current_user, width, &Local)
}

pub fn render_transcript_in<Tz>(
    messages: &[Message],
    loading: bool,
    current_user: &str,
    width: usize,
    tz: &Tz,
) -> Vec<TranscriptLine>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if loading {
        return vec![TranscriptLine::placeholder(LOADING_PLACEHOLDER)];
    }
    if messages.is_empty() {
        return vec![TranscriptLine::placeholder(EMPTY_PLACEHOLDER)];
    }

    let bubble_width = bubble_width(width);
    let mut lines = Vec::new();
    let mut previous_author: Option<&str> = None;

    for message in messages {
        let own = message.author == current_user;
        let show_author = previous_author != Some(message.author.as_str());
        previous_author = Some(message.author.as_str());
        let align = if own { Align::Right } else { Align::Left };
        let line = |text: String, kind: LineKind| TranscriptLine {
            text,
            align,
            kind,
            own,
        };

        if !lines.is_empty() {
            lines.push(TranscriptLine::gap());
        }
        if show_author && !own {
            lines.push(line(
                decode_html_entities(&message.author).into_owned(),
                LineKind::Author,
            ));
        }
        for row in wrap_text(&decode_html_entities(&message.text), bubble_width) {
            lines.push(line(row, LineKind::Body));
        }
        lines.push(line(
            format_timestamp(&message.created_at, tz),
            LineKind::Timestamp,
        ));
    }

    lines
}

/// `D Mon YYYY HH:MM` in `tz`, or the raw value when it does not parse.
pub fn format_timestamp<Tz>(created_at: &CreatedAt, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match created_at.to_datetime() {
        Some(at) => at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        None => created_at.as_str().to_string(),
    }
}

fn bubble_width(width: usize) -> usize {
    (width * 2 / 3).max(MIN_BUBBLE_WIDTH).min(width.max(1))
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|row| row.into_owned())
        .collect()
}
