//! Screens of the dashboard. Each holds its own fetched state, turns key
//! presses into [`Action`]s for the app shell, and renders itself.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, TableState, Wrap},
    Frame,
};
use std::path::PathBuf;

use crate::api::ApiError;
use crate::router::Route;

pub mod create_role;
pub mod results_table;
pub mod role_detail;
pub mod role_list;
pub mod uploader;

/// What a key press asks the app shell to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Navigate(Route),
    Reload,
    CreateRole { title: String, description: String },
    Upload(PathBuf),
    Export,
}

/// Fetched state of a screen: exactly one of these is rendered.
#[derive(Debug)]
pub enum Loadable<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> Loadable<T> {
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(e) => Loadable::Failed(e.to_string()),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Single text input. Multi-line fields take Enter as a newline.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    value: String,
}

impl TextField {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns whether the key edited the field.
    pub fn handle_key(&mut self, key: &KeyEvent, multiline: bool) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.value.push(c),
            KeyCode::Backspace => {
                self.value.pop();
            }
            KeyCode::Enter if multiline => self.value.push('\n'),
            _ => return false,
        }
        true
    }
}

/// Move a table selection one row, wrapping at both ends.
pub fn step_selection(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match state.selected() {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(next));
}

pub fn render_loading(f: &mut Frame, area: Rect, title: &str) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    f.render_widget(Paragraph::new("Loading...").block(block), area);
}

pub fn render_error(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let text = Paragraph::new(format!("Error: {}", message))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(text, area);
}
