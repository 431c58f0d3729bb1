//! Ordered playback queue.

use serde::{Deserialize, Serialize};

/// One item to play: where the audio lives and what to call it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackItem {
    pub uri: String,
    /// Caller-chosen identifier, e.g. `"2:255"` for a verse.
    pub identifier: String,
}

impl PlaybackItem {
    pub fn new(uri: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            identifier: identifier.into(),
        }
    }
}

/// Items played one after another, with a cursor on the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackQueue {
    items: Vec<PlaybackItem>,
    cursor: usize,
}

impl PlaybackQueue {
    pub fn new(items: Vec<PlaybackItem>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn current(&self) -> Option<&PlaybackItem> {
        self.items.get(self.cursor)
    }

    /// Move to the next item, if there is one.
    pub fn advance(&mut self) -> Option<&PlaybackItem> {
        if self.cursor + 1 >= self.items.len() {
            return None;
        }
        self.cursor += 1;
        self.items.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }
}

impl FromIterator<PlaybackItem> for PlaybackQueue {
    fn from_iter<I: IntoIterator<Item = PlaybackItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_stops_at_last_item() {
        let mut queue: PlaybackQueue = ["1:1", "1:2"]
            .iter()
            .map(|id| PlaybackItem::new(format!("https://cdn/{}.mp3", id), *id))
            .collect();

        assert_eq!(queue.current().map(|i| i.identifier.as_str()), Some("1:1"));
        assert_eq!(queue.advance().map(|i| i.identifier.as_str()), Some("1:2"));
        assert_eq!(queue.cursor(), 1);
        assert!(queue.advance().is_none());
        assert_eq!(queue.cursor(), 1);

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.current().is_none());
    }
}
