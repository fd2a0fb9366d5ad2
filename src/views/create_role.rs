use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{Action, TextField};
use crate::router::Route;

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const DESCRIPTION_REQUIRED: &str = "Description is required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
}

/// Title + description form. Contents survive a failed submit so the user
/// can correct them.
#[derive(Debug)]
pub struct CreateRoleForm {
    pub title: TextField,
    pub description: TextField,
    pub focus: Field,
    pub submitting: bool,
    pub error: Option<String>,
}

impl CreateRoleForm {
    pub fn new() -> Self {
        Self {
            title: TextField::default(),
            description: TextField::default(),
            focus: Field::Title,
            submitting: false,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return self.submit();
        }
        match key.code {
            KeyCode::Esc => Action::Navigate(Route::RoleList),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Field::Title => Field::Description,
                    Field::Description => Field::Title,
                };
                Action::None
            }
            KeyCode::Enter if self.focus == Field::Title => {
                self.focus = Field::Description;
                Action::None
            }
            _ => {
                if !self.submitting {
                    match self.focus {
                        Field::Title => self.title.handle_key(key, false),
                        Field::Description => self.description.handle_key(key, true),
                    };
                }
                Action::None
            }
        }
    }

    /// Validate and hand the role to the app shell. A second submit while the
    /// first is still in flight is ignored.
    pub fn submit(&mut self) -> Action {
        if self.submitting {
            return Action::None;
        }
        let title = self.title.value().trim();
        if title.is_empty() {
            self.error = Some(TITLE_REQUIRED.to_string());
            self.focus = Field::Title;
            return Action::None;
        }
        if self.description.value().trim().is_empty() {
            self.error = Some(DESCRIPTION_REQUIRED.to_string());
            self.focus = Field::Description;
            return Action::None;
        }

        self.submitting = true;
        self.error = None;
        Action::CreateRole {
            title: title.to_string(),
            description: self.description.value().to_string(),
        }
    }

    pub fn failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(area);

        let focused = Style::default().fg(Color::Yellow);
        let style_for = |field: Field| {
            if self.focus == field {
                focused
            } else {
                Style::default()
            }
        };

        let title = Paragraph::new(self.title.value().to_string()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style_for(Field::Title))
                .title("Job Title"),
        );
        f.render_widget(title, chunks[0]);

        let description = Paragraph::new(self.description.value().to_string())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style_for(Field::Description))
                    .title("Job Description"),
            );
        f.render_widget(description, chunks[1]);

        let status = if self.submitting {
            Paragraph::new("Creating role and generating rubric...")
                .style(Style::default().fg(Color::Yellow))
        } else if let Some(error) = &self.error {
            Paragraph::new(format!("Error: {}", error)).style(Style::default().fg(Color::Red))
        } else {
            Paragraph::new("Tab switch field   Ctrl+S create role & generate rubric   Esc cancel")
                .style(Style::default().fg(Color::DarkGray))
        };
        f.render_widget(status.wrap(Wrap { trim: true }), chunks[2]);
    }
}
