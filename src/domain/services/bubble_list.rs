#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

use std::collections::HashMap;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::Bubble;
use super::BubbleAlignment;
use crate::domain::models::Author;
use crate::domain::models::Message;

struct BubbleCacheEntry<'a> {
    text_len: usize,
    lines: Vec<Line<'a>>,
}

/// Renders the transcript as bubbles, caching each message's lines until its text
/// or the window width changes.
#[derive(Default)]
pub struct BubbleList<'a> {
    cache: HashMap<usize, BubbleCacheEntry<'a>>,
    line_width: usize,
    lines_len: usize,
}

impl<'a> BubbleList<'a> {
    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        if self.line_width != line_width || messages.len() < self.cache.len() {
            self.cache.clear();
            self.line_width = line_width;
        }

        self.lines_len = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                if let Some(cache_entry) = self.cache.get(&idx) {
                    if cache_entry.text_len == message.text.len() {
                        return cache_entry.lines.len();
                    }
                }

                let mut align = BubbleAlignment::Left;
                if message.author == Author::User {
                    align = BubbleAlignment::Right;
                }

                let lines = Bubble::new(message, align, line_width).as_lines();
                let lines_len = lines.len();
                self.cache.insert(
                    idx,
                    BubbleCacheEntry {
                        text_len: message.text.len(),
                        lines,
                    },
                );

                return lines_len;
            })
            .sum();
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, scroll: u16) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line<'a>> = indexes
            .iter()
            .filter_map(|idx| return self.cache.get(idx))
            .flat_map(|entry| return entry.lines.to_owned())
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}
