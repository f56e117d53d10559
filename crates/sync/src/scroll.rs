use crate::collection::CollectionChange;
use crate::snapshot::SyncSnapshot;

/// Distance from the true bottom, in viewport units, that still counts as
/// "at the bottom" for follow purposes.
pub const NEAR_BOTTOM_THRESHOLD: f32 = 150.0;

/// Geometry of the scrollable transcript at one scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_height: f32,
    pub scroll_top: f32,
    pub client_height: f32,
}

impl ViewportMetrics {
    pub fn new(scroll_height: f32, scroll_top: f32, client_height: f32) -> Self {
        Self {
            scroll_height,
            scroll_top,
            client_height,
        }
    }

    pub fn distance_from_bottom(&self) -> f32 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }

    pub fn is_near_bottom(&self, threshold: f32) -> bool {
        self.distance_from_bottom() < threshold
    }
}

/// Command for the presentation layer after a collection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIntent {
    Stay,
    /// Position at the newest message without animation.
    JumpToBottom,
    /// Animate to the newest message.
    SmoothToBottom,
}

impl ScrollIntent {
    pub fn scrolls(&self) -> bool {
        !matches!(self, Self::Stay)
    }
}

/// Decides whether new messages pull the viewport to the bottom.
///
/// Reads only collection deltas and viewport geometry; the judgment always
/// reflects the last scroll event committed before the change arrived.
#[derive(Debug, Clone)]
pub struct ScrollFollow {
    threshold: f32,
    near_bottom: bool,
    positioned_initially: bool,
    last_len: usize,
    last_revision: u64,
}

impl ScrollFollow {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
            near_bottom: true,
            positioned_initially: false,
            last_len: 0,
            last_revision: 0,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_near_bottom(&self) -> bool {
        self.near_bottom
    }

    /// Records one viewport scroll event.
    pub fn on_scroll(&mut self, metrics: ViewportMetrics) {
        self.near_bottom = metrics.is_near_bottom(self.threshold);
    }

    /// Applies the change carried by `snapshot`, at most once per revision.
    pub fn observe(&mut self, snapshot: &SyncSnapshot) -> ScrollIntent {
        if snapshot.revision() <= self.last_revision {
            return ScrollIntent::Stay;
        }
        self.last_revision = snapshot.revision();

        match snapshot.last_change() {
            Some(change) => self.on_change(change),
            None => ScrollIntent::Stay,
        }
    }

    pub fn on_change(&mut self, change: CollectionChange) -> ScrollIntent {
        let grew = change.len() > self.last_len;
        self.last_len = change.len();

        match change {
            CollectionChange::Replaced { .. } if !self.positioned_initially => {
                self.positioned_initially = true;
                self.near_bottom = true;
                ScrollIntent::JumpToBottom
            }
            CollectionChange::Replaced { .. } if grew && self.near_bottom => {
                ScrollIntent::JumpToBottom
            }
            CollectionChange::Appended { added, .. } if added > 0 && grew && self.near_bottom => {
                ScrollIntent::SmoothToBottom
            }
            CollectionChange::Replaced { .. } | CollectionChange::Appended { .. } => {
                ScrollIntent::Stay
            }
        }
    }

    /// Forgets all history, e.g. when the view is rebuilt.
    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }
}

impl Default for ScrollFollow {
    fn default() -> Self {
        Self::new(NEAR_BOTTOM_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appended(added: usize, len: usize) -> CollectionChange {
        CollectionChange::Appended { added, len }
    }

    #[test]
    fn distance_uses_scroll_height_minus_top_minus_client() {
        let metrics = ViewportMetrics::new(2_000.0, 1_500.0, 400.0);

        assert_eq!(metrics.distance_from_bottom(), 100.0);
        assert!(metrics.is_near_bottom(NEAR_BOTTOM_THRESHOLD));
        assert!(!ViewportMetrics::new(2_000.0, 1_000.0, 400.0).is_near_bottom(150.0));
    }

    #[test]
    fn first_load_always_jumps_to_bottom() {
        let mut follow = ScrollFollow::default();
        follow.on_scroll(ViewportMetrics::new(5_000.0, 0.0, 400.0));

        let intent = follow.on_change(CollectionChange::Replaced { len: 20 });

        assert_eq!(intent, ScrollIntent::JumpToBottom);
        assert!(follow.is_near_bottom());
    }

    #[test]
    fn append_scrolls_only_when_near_bottom() {
        let mut follow = ScrollFollow::default();
        follow.on_change(CollectionChange::Replaced { len: 3 });

        follow.on_scroll(ViewportMetrics::new(3_000.0, 0.0, 400.0));
        assert_eq!(follow.on_change(appended(1, 4)), ScrollIntent::Stay);

        follow.on_scroll(ViewportMetrics::new(3_000.0, 2_550.0, 400.0));
        assert_eq!(follow.on_change(appended(2, 6)), ScrollIntent::SmoothToBottom);
    }

    #[test]
    fn same_length_is_not_a_trigger() {
        let mut follow = ScrollFollow::default();
        follow.on_change(CollectionChange::Replaced { len: 3 });

        assert_eq!(follow.on_change(appended(0, 3)), ScrollIntent::Stay);
        assert_eq!(
            follow.on_change(CollectionChange::Replaced { len: 3 }),
            ScrollIntent::Stay
        );
    }

    #[test]
    fn later_reload_respects_scroll_position() {
        let mut follow = ScrollFollow::default();
        follow.on_change(CollectionChange::Replaced { len: 3 });
        follow.on_scroll(ViewportMetrics::new(3_000.0, 0.0, 400.0));

        assert_eq!(
            follow.on_change(CollectionChange::Replaced { len: 5 }),
            ScrollIntent::Stay
        );
    }
}
