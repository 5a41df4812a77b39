#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::domain::models::Author;
use crate::domain::models::Message;
use crate::domain::models::MessageType;

#[derive(PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

pub struct Bubble<'a> {
    alignment: BubbleAlignment,
    message: &'a Message,
    window_max_width: usize,
}

pub struct BubbleConfig {
    /// Left border + left padding + right padding + right border.
    pub border_elements_length: usize,
    /// Scrollbar column.
    pub scrollbar_length: usize,
    pub outer_padding_percentage: f32,
}

fn char_len(text: &str) -> usize {
    return text.chars().count();
}

/// Greedy word wrap. Words wider than `width` are split mid-word.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = vec![];
    let mut current = String::new();

    for word in line.split(' ') {
        let mut word = word.to_string();
        while char_len(&word) > width {
            if !current.is_empty() {
                lines.push(current);
                current = String::new();
            }
            let head = word.chars().take(width).collect::<String>();
            word = word.chars().skip(width).collect::<String>();
            lines.push(head);
        }

        if current.is_empty() {
            current = word;
        } else if char_len(&current) + 1 + char_len(&word) <= width {
            current = format!("{current} {word}");
        } else {
            lines.push(current);
            current = word;
        }
    }

    lines.push(current);
    return lines;
}

impl<'a> Bubble<'a> {
    pub fn new(message: &'a Message, alignment: BubbleAlignment, window_max_width: usize) -> Bubble<'a> {
        return Bubble {
            alignment,
            message,
            window_max_width,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            border_elements_length: 4,
            scrollbar_length: 1,
            outer_padding_percentage: 0.04,
        };
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let max_line_length = self.max_line_length();
        let username = self.message.author.to_string();

        let text_lines = self
            .message
            .text
            .split('\n')
            .flat_map(|line| return wrap_line(line, max_line_length))
            .collect::<Vec<String>>();

        let inner_length = text_lines
            .iter()
            .map(|line| return char_len(line))
            .max()
            .unwrap_or_default()
            .max(char_len(&username));

        let top_fill = "─".repeat((inner_length + 2).saturating_sub(char_len(&username)));
        let mut lines = vec![self.border_line(format!("╭{username}{top_fill}╮"), inner_length)];

        for text in text_lines {
            let fill = " ".repeat(inner_length - char_len(&text));
            lines.push(self.text_line(text, fill, inner_length));
        }

        let bottom_fill = "─".repeat(inner_length + 2);
        lines.push(self.border_line(format!("╰{bottom_fill}╯"), inner_length));

        return lines;
    }

    fn max_line_length(&self) -> usize {
        let style_config = Bubble::style_config();
        let min_outer_padding = (self.window_max_width as f32
            * style_config.outer_padding_percentage)
            .ceil() as usize;

        return self
            .window_max_width
            .saturating_sub(style_config.border_elements_length)
            .saturating_sub(style_config.scrollbar_length)
            .saturating_sub(min_outer_padding)
            .max(char_len(&self.message.author.to_string()))
            .max(1);
    }

    fn outer_padding(&self, inner_length: usize) -> Span<'static> {
        let bubble_length = inner_length + Bubble::style_config().border_elements_length;
        let padding = self
            .window_max_width
            .saturating_sub(Bubble::style_config().scrollbar_length)
            .saturating_sub(bubble_length);

        return Span::from(" ".repeat(padding));
    }

    fn align(&self, mut spans: Vec<Span<'static>>, inner_length: usize) -> Line<'static> {
        if self.alignment == BubbleAlignment::Right {
            spans.insert(0, self.outer_padding(inner_length));
        }

        return Line::from(spans);
    }

    fn border_line(&self, text: String, inner_length: usize) -> Line<'static> {
        return self.align(vec![self.highlight_span(text)], inner_length);
    }

    fn text_line(&self, text: String, fill: String, inner_length: usize) -> Line<'static> {
        let spans = vec![
            self.highlight_span("│ ".to_string()),
            Span::from(text),
            self.highlight_span(format!("{fill} │")),
        ];

        return self.align(spans, inner_length);
    }

    fn highlight_span(&self, text: String) -> Span<'static> {
        if self.message.message_type() == MessageType::Error {
            return Span::styled(text, Style::default().fg(Color::Red));
        }

        match self.message.author {
            Author::UploadiT => return Span::styled(text, Style::default().fg(Color::Cyan)),
            Author::Bot => return Span::styled(text, Style::default().fg(Color::Green)),
            Author::User => return Span::from(text),
        }
    }
}
