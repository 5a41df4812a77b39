#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::FileHandle;
use super::SessionStatus;
use super::UploadedFile;
use super::MAX_FILES;

/// Side panel listing what the session holds and what is queued for upload.
pub struct Inventory<'a> {
    pub status: SessionStatus,
    pub clearing: bool,
    pub uploaded: &'a [UploadedFile],
    pub pending: &'a [FileHandle],
    pub uploading: bool,
}

fn list_lines(names: Vec<String>) -> Vec<Line<'static>> {
    if names.is_empty() {
        return vec![Line::from(Span::styled(
            "  (none)",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    return names
        .into_iter()
        .map(|name| return Line::from(format!("- {name}")))
        .collect();
}

impl<'a> Inventory<'a> {
    pub fn lines(&self) -> Vec<Line<'static>> {
        let heading = Style::default().add_modifier(Modifier::BOLD);

        let (status, color) = match (self.clearing, self.status) {
            (true, _) => ("clearing".to_string(), Color::Yellow),
            (false, SessionStatus::Active) => (self.status.to_string(), Color::Green),
            (false, SessionStatus::Failed) => (self.status.to_string(), Color::Red),
            (false, status) => (status.to_string(), Color::Yellow),
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Session ", heading),
                Span::styled(status, Style::default().fg(color)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("Uploaded ({}/{MAX_FILES})", self.uploaded.len()),
                heading,
            )),
        ];
        lines.extend(list_lines(
            self.uploaded.iter().map(|e| return e.name.to_string()).collect(),
        ));

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Selected", heading)));
        lines.extend(list_lines(
            self.pending.iter().map(|e| return e.name.to_string()).collect(),
        ));

        if self.uploading {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Uploading...",
                Style::default().fg(Color::Yellow),
            )));
        }

        return lines;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        frame.render_widget(
            Paragraph::new(self.lines()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("Documents")
                    .padding(Padding::new(1, 1, 0, 0)),
            ),
            rect,
        );
    }
}
