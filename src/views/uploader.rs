use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::path::PathBuf;

use super::{Action, TextField};
use crate::models::ScreeningResult;

pub const NO_FILE_SELECTED: &str = "Please select a resume file to upload.";

/// Resume file picker. It only collects the path; the app shell performs the
/// upload and reports back through [`Uploader::finished`].
#[derive(Debug, Default)]
pub struct Uploader {
    pub path: TextField,
    pub editing: bool,
    pub uploading: bool,
    pub error: Option<String>,
    pub last_screened: Option<String>,
}

impl Uploader {
    pub fn begin_editing(&mut self) {
        if !self.uploading {
            self.editing = true;
        }
    }

    pub fn selected_file(&self) -> Option<PathBuf> {
        let path = self.path.value().trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Keys while the path field has focus.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.editing = false;
                Action::None
            }
            KeyCode::Enter => self.submit(),
            _ => {
                if !self.uploading {
                    self.path.handle_key(key, false);
                }
                Action::None
            }
        }
    }

    pub fn submit(&mut self) -> Action {
        if self.uploading {
            return Action::None;
        }
        match self.selected_file() {
            Some(path) => {
                self.uploading = true;
                self.editing = false;
                self.error = None;
                Action::Upload(path)
            }
            None => {
                self.error = Some(NO_FILE_SELECTED.to_string());
                Action::None
            }
        }
    }

    /// The selected path is left in place after a successful upload.
    pub fn finished(&mut self, outcome: Result<&ScreeningResult, String>) {
        self.uploading = false;
        match outcome {
            Ok(result) => {
                self.error = None;
                self.last_screened = Some(format!(
                    "{} screened: score {} ({})",
                    result.file_name,
                    result.score_text(),
                    result.pass_fail()
                ));
            }
            Err(message) => self.error = Some(message),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let title = if self.uploading {
            "Upload Resume (uploading...)"
        } else if self.editing {
            "Upload Resume (Enter upload, Esc cancel)"
        } else {
            "Upload Resume (u select file)"
        };
        let border = if self.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw("File: "),
            Span::styled(
                self.path.value().to_string(),
                Style::default().fg(Color::White),
            ),
        ];
        if self.editing {
            spans.push(Span::raw("_"));
        }
        if self.uploading {
            spans.push(Span::styled(
                "  Uploading and screening...",
                Style::default().fg(Color::Yellow),
            ));
        } else if let Some(error) = &self.error {
            spans.push(Span::styled(
                format!("  {}", error),
                Style::default().fg(Color::Red),
            ));
        } else if let Some(done) = &self.last_screened {
            spans.push(Span::styled(
                format!("  {}", done),
                Style::default().fg(Color::Green),
            ));
        }

        let widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        );
        f.render_widget(widget, area);
    }
}
