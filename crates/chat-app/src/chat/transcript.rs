use doodle_sync::{ScrollFollow, ScrollIntent, SyncSnapshot, ViewportMetrics};

use crate::chat::message_list::TranscriptLine;

/// Nominal height of one terminal row, so row offsets map onto the pixel
/// threshold the follow controller works with.
pub const ROW_HEIGHT_PX: f32 = 20.0;

/// Fixed-height window over the rendered transcript.
pub struct TranscriptViewport {
    lines: Vec<TranscriptLine>,
    rows: usize,
    top: usize,
    follow: ScrollFollow,
}

impl TranscriptViewport {
    pub fn new(rows: usize, threshold_px: f32) -> Self {
        Self {
            lines: Vec::new(),
            rows: rows.max(1),
            top: 0,
            follow: ScrollFollow::new(threshold_px),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn is_following(&self) -> bool {
        self.follow.is_near_bottom()
    }

    pub fn metrics(&self) -> ViewportMetrics {
        ViewportMetrics::new(
            self.lines.len() as f32 * ROW_HEIGHT_PX,
            self.top as f32 * ROW_HEIGHT_PX,
            self.rows as f32 * ROW_HEIGHT_PX,
        )
    }

    pub fn visible(&self) -> &[TranscriptLine] {
        let end = (self.top + self.rows).min(self.lines.len());
        &self.lines[self.top.min(end)..end]
    }

    /// Applies a snapshot's collection change. The follow decision uses the
    /// scroll position recorded before the new lines arrive.
    pub fn sync(&mut self, snapshot: &SyncSnapshot, lines: Vec<TranscriptLine>) -> ScrollIntent {
        let intent = self.follow.observe(snapshot);
        self.set_lines(lines);
        if intent.scrolls() {
            self.top = self.max_top();
            self.follow.on_scroll(self.metrics());
        }
        intent
    }

    /// Replaces the rendered lines without treating it as a collection change,
    /// e.g. after a resize or a change of the local author.
    pub fn set_lines(&mut self, lines: Vec<TranscriptLine>) {
        self.lines = lines;
        self.top = self.top.min(self.max_top());
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_to(self.top.saturating_sub(rows));
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_to(self.top.saturating_add(rows));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_to(self.max_top());
    }

    fn scroll_to(&mut self, top: usize) {
        self.top = top.min(self.max_top());
        self.follow.on_scroll(self.metrics());
    }

    fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use doodle_api::{ApiResult, BoxFuture, ListQuery, Message, MessageStore, NewMessage};
    use doodle_sync::{SyncConfig, SyncEngine};

    use super::*;
    use crate::chat::message_list::{Align, LineKind};

    fn lines(count: usize) -> Vec<TranscriptLine> {
        (0..count)
            .map(|index| TranscriptLine {
                text: format!("row {index}"),
                align: Align::Left,
                kind: LineKind::Body,
                own: false,
            })
            .collect()
    }

    #[test]
    fn visible_window_is_clamped_to_content() {
        let mut viewport = TranscriptViewport::new(5, 150.0);
        viewport.set_lines(lines(3));
        assert_eq!(viewport.visible().len(), 3);

        viewport.set_lines(lines(12));
        viewport.scroll_to_bottom();
        assert_eq!(viewport.top(), 7);
        assert_eq!(viewport.visible()[0].text, "row 7");

        viewport.set_lines(lines(6));
        assert_eq!(viewport.top(), 1);
    }

    #[test]
    fn metrics_map_rows_onto_pixels() {
        let mut viewport = TranscriptViewport::new(10, 150.0);
        viewport.set_lines(lines(40));
        viewport.scroll_to_bottom();
        viewport.scroll_up(7);

        let metrics = viewport.metrics();
        assert_eq!(metrics.scroll_height, 800.0);
        assert_eq!(metrics.client_height, 200.0);
        assert_eq!(metrics.distance_from_bottom(), 140.0);
        assert!(viewport.is_following());

        viewport.scroll_up(1);
        assert!(!viewport.is_following());
    }

    #[test]
    fn scrolling_away_from_bottom_stops_following() {
        let mut viewport = TranscriptViewport::new(10, 150.0);
        viewport.set_lines(lines(50));
        viewport.scroll_to_bottom();
        assert!(viewport.is_following());

        viewport.scroll_up(30);
        assert!(!viewport.is_following());

        viewport.scroll_down(100);
        assert!(viewport.is_following());
        assert_eq!(viewport.top(), 40);
    }

    #[tokio::test]
    async fn first_load_jumps_and_later_appends_respect_position() {
        let store = Arc::new(FixedStore {
            history: (0..30).map(message).collect(),
            reply: message(99),
        });
        let engine = SyncEngine::new(store, SyncConfig::new("User"));
        let mut viewport = TranscriptViewport::new(10, 150.0);

        engine.initial_load().await;
        let intent = viewport.sync(&engine.snapshot(), lines(30));
        assert_eq!(intent, ScrollIntent::JumpToBottom);
        assert_eq!(viewport.top(), 20);

        viewport.scroll_up(15);
        engine.send_message("hi").await.unwrap();
        let intent = viewport.sync(&engine.snapshot(), lines(33));
        assert_eq!(intent, ScrollIntent::Stay);
        assert_eq!(viewport.top(), 5);

        viewport.scroll_to_bottom();
        let intent = viewport.sync(&engine.snapshot(), lines(33));
        assert_eq!(intent, ScrollIntent::Stay);
    }

    struct FixedStore {
        history: Vec<Message>,
        reply: Message,
    }

    impl MessageStore for FixedStore {
        fn list<'a>(&'a self, _query: ListQuery) -> BoxFuture<'a, ApiResult<Vec<Message>>> {
            Box::pin(async move { Ok(self.history.clone()) })
        }

        fn create<'a>(&'a self, _draft: NewMessage) -> BoxFuture<'a, ApiResult<Message>> {
            Box::pin(async move { Ok(self.reply.clone()) })
        }
    }

    fn message(index: usize) -> Message {
        Message::new(
            index.to_string(),
            "Bob",
            "hello",
            format!("2024-01-01T10:{:02}:00Z", index % 60),
        )
    }
}
