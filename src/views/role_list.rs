use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::{render_error, render_loading, step_selection, Action, Loadable};
use crate::api::ApiError;
use crate::models::RoleSummary;
use crate::router::Route;

const TITLE: &str = "Roles";

pub struct RoleListView {
    pub roles: Loadable<Vec<RoleSummary>>,
    table_state: TableState,
}

impl RoleListView {
    pub fn new() -> Self {
        Self {
            roles: Loadable::Loading,
            table_state: TableState::default(),
        }
    }

    pub fn reload(&mut self) {
        self.roles = Loadable::Loading;
    }

    pub fn loaded(&mut self, result: Result<Vec<RoleSummary>, ApiError>) {
        self.roles = Loadable::from_result(result);
        let has_rows = self.roles.ready().map_or(false, |r| !r.is_empty());
        self.table_state.select(if has_rows { Some(0) } else { None });
    }

    pub fn selected_role(&self) -> Option<&RoleSummary> {
        let roles = self.roles.ready()?;
        self.table_state.selected().and_then(|i| roles.get(i))
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('n') => Action::Navigate(Route::CreateRole),
            KeyCode::Char('r') => Action::Reload,
            KeyCode::Enter => match self.selected_role() {
                Some(role) => Action::Navigate(Route::RoleDetail(role.id.clone())),
                None => Action::None,
            },
            KeyCode::Down | KeyCode::Up => {
                let len = self.roles.ready().map_or(0, Vec::len);
                step_selection(&mut self.table_state, len, key.code == KeyCode::Down);
                Action::None
            }
            _ => Action::None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let roles = match &self.roles {
            Loadable::Loading => return render_loading(f, area, TITLE),
            Loadable::Failed(message) => return render_error(f, area, TITLE, message),
            Loadable::Ready(roles) => roles,
        };

        if roles.is_empty() {
            let empty = Paragraph::new("No roles yet. Press n to create one.")
                .block(Block::default().borders(Borders::ALL).title(TITLE));
            f.render_widget(empty, area);
            return;
        }

        let header_cells = ["Title", "Created", "ID"].iter().map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        });
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let rows = roles.iter().map(|role| {
            Row::new(vec![
                Cell::from(role.title.clone()),
                Cell::from(role.created_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(role.id.to_string()),
            ])
        });

        let widths = [
            Constraint::Percentage(55),
            Constraint::Length(17),
            Constraint::Min(8),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} ({})", TITLE, roles.len())),
            )
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .fg(Color::Yellow),
            )
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }
}
