use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::path::PathBuf;

use super::results_table::{render_evaluation, ResultsTable};
use super::uploader::Uploader;
use super::{render_error, render_loading, Action, Loadable};
use crate::api::ApiError;
use crate::models::{RecordId, Role, ScreeningResult};
use crate::router::Route;

const TITLE: &str = "Role";

/// A role together with every result screened against it.
#[derive(Debug, Clone)]
pub struct RoleDetail {
    pub role: Role,
    pub results: Vec<ScreeningResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct RoleDetailView {
    pub role_id: RecordId,
    pub detail: Loadable<RoleDetail>,
    pub uploader: Uploader,
    pub notice: Option<Notice>,
    table: ResultsTable,
}

impl RoleDetailView {
    pub fn new(role_id: RecordId) -> Self {
        Self {
            role_id,
            detail: Loadable::Loading,
            uploader: Uploader::default(),
            notice: None,
            table: ResultsTable::default(),
        }
    }

    pub fn reload(&mut self) {
        self.detail = Loadable::Loading;
    }

    pub fn loaded(&mut self, result: Result<RoleDetail, ApiError>) {
        self.detail = Loadable::from_result(result);
        let len = self.results().len();
        self.table.reset(len);
    }

    pub fn results(&self) -> &[ScreeningResult] {
        self.detail
            .ready()
            .map(|d| d.results.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_result(&self) -> Option<&ScreeningResult> {
        self.table.selected(self.results())
    }

    pub fn export_finished(&mut self, outcome: anyhow::Result<PathBuf>) {
        self.notice = Some(match outcome {
            Ok(path) => Notice::Info(format!(
                "Exported {} results to {}",
                self.results().len(),
                path.display()
            )),
            Err(e) => Notice::Error(format!("Export failed: {:#}", e)),
        });
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        // The uploader is only drawn once the role has loaded.
        let ready = self.detail.ready().is_some();
        if self.uploader.editing && ready {
            return self.uploader.handle_key(key);
        }
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => Action::Navigate(Route::RoleList),
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') => Action::Reload,
            KeyCode::Char('u') if ready => {
                self.uploader.begin_editing();
                Action::None
            }
            // Nothing to export until at least one resume has been screened.
            KeyCode::Char('e') if !self.results().is_empty() => Action::Export,
            KeyCode::Down | KeyCode::Up => {
                let len = self.results().len();
                self.table.step(len, key.code == KeyCode::Down);
                Action::None
            }
            _ => Action::None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let detail = match &self.detail {
            Loadable::Loading => return render_loading(f, area, TITLE),
            Loadable::Failed(message) => return render_error(f, area, TITLE, message),
            Loadable::Ready(detail) => detail,
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[0]);
        render_role(f, top[0], &detail.role);
        render_rubric(f, top[1], &detail.role);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        self.table.render(f, middle[0], &detail.results);
        render_evaluation(f, middle[1], self.selected_result());

        self.uploader.render(f, rows[2]);

        let footer = match &self.notice {
            Some(Notice::Info(text)) => {
                Paragraph::new(text.clone()).style(Style::default().fg(Color::Green))
            }
            Some(Notice::Error(text)) => {
                Paragraph::new(text.clone()).style(Style::default().fg(Color::Red))
            }
            None => {
                let export = if detail.results.is_empty() {
                    ""
                } else {
                    "   e export CSV"
                };
                Paragraph::new(format!(
                    "↑/↓ select   u upload{}   r reload   Esc back",
                    export
                ))
                .style(Style::default().fg(Color::DarkGray))
            }
        };
        f.render_widget(footer, rows[3]);
    }
}

fn render_role(f: &mut Frame, area: Rect, role: &Role) {
    let lines = vec![
        Line::from(Span::styled(
            role.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Created {}", role.created_at.format("%Y-%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(role.description.clone()),
    ];
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(TITLE));
    f.render_widget(widget, area);
}

fn render_rubric(f: &mut Frame, area: Rect, role: &Role) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Evaluation Rubric");
    let widget = match role.rubric() {
        Some(rubric) => Paragraph::new(rubric.to_string()),
        None => Paragraph::new("No rubric has been generated for this role yet.")
            .style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(widget.wrap(Wrap { trim: false }).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{key, screen_text};

    fn detail(results: &str) -> RoleDetail {
        RoleDetail {
            role: serde_json::from_str(
                r#"{"id": 5, "title": "Data Engineer", "description": "Pipelines",
                    "rubric_text": "1. SQL (50%)", "created_at": "2024-06-01T08:00:00Z"}"#,
            )
            .unwrap(),
            results: serde_json::from_str(results).unwrap(),
        }
    }

    const TWO_RESULTS: &str = r#"[
        {"id": 1, "file_name": "alice.pdf", "score": 82, "evaluation_details": {"pass_fail_status": "Pass"}},
        {"id": 2, "file_name": "bob.pdf", "score": 40, "evaluation_details": {"pass_fail_status": "Fail"}}
    ]"#;

    #[test]
    fn export_is_gated_on_results() {
        let mut view = RoleDetailView::new(RecordId::new("5"));
        assert_eq!(view.handle_key(&key(KeyCode::Char('e'))), Action::None);

        view.loaded(Ok(detail("[]")));
        assert_eq!(view.handle_key(&key(KeyCode::Char('e'))), Action::None);

        view.loaded(Ok(detail(TWO_RESULTS)));
        assert_eq!(view.handle_key(&key(KeyCode::Char('e'))), Action::Export);
    }

    #[test]
    fn editing_upload_path_captures_keys() {
        let mut view = RoleDetailView::new(RecordId::new("5"));
        view.loaded(Ok(detail("[]")));
        view.handle_key(&key(KeyCode::Char('u')));
        assert!(view.uploader.editing);

        // 'q' and 'e' are part of the path, not shortcuts.
        for c in "queue.pdf".chars() {
            assert_eq!(view.handle_key(&key(KeyCode::Char(c))), Action::None);
        }
        assert_eq!(
            view.handle_key(&key(KeyCode::Enter)),
            Action::Upload(PathBuf::from("queue.pdf"))
        );
    }

    #[test]
    fn uploader_ignored_until_role_loads() {
        let mut view = RoleDetailView::new(RecordId::new("404"));
        view.handle_key(&key(KeyCode::Char('u')));
        assert!(!view.uploader.editing);

        view.loaded(Err(ApiError::Server {
            status: 404,
            message: "Role not found".into(),
        }));
        view.handle_key(&key(KeyCode::Char('u')));
        assert!(!view.uploader.editing);
        for c in "cv.pdf".chars() {
            view.handle_key(&key(KeyCode::Char(c)));
        }
        assert_eq!(view.handle_key(&key(KeyCode::Enter)), Action::None);
        assert_eq!(view.uploader.path.value(), "");
    }

    #[test]
    fn editing_stops_capturing_keys_while_reloading() {
        let mut view = RoleDetailView::new(RecordId::new("5"));
        view.loaded(Ok(detail("[]")));
        view.handle_key(&key(KeyCode::Char('u')));
        view.reload();
        assert_eq!(view.handle_key(&key(KeyCode::Enter)), Action::None);
        assert_eq!(view.handle_key(&key(KeyCode::Char('q'))), Action::Quit);
    }

    #[test]
    fn selection_moves_through_results() {
        let mut view = RoleDetailView::new(RecordId::new("5"));
        view.loaded(Ok(detail(TWO_RESULTS)));
        assert_eq!(view.selected_result().unwrap().file_name, "alice.pdf");
        view.handle_key(&key(KeyCode::Down));
        assert_eq!(view.selected_result().unwrap().file_name, "bob.pdf");
    }

    #[test]
    fn export_outcome_is_reported() {
        let mut view = RoleDetailView::new(RecordId::new("5"));
        view.loaded(Ok(detail(TWO_RESULTS)));
        view.export_finished(Ok(PathBuf::from("out/candidate_evaluation_results.csv")));
        assert_eq!(
            view.notice,
            Some(Notice::Info(
                "Exported 2 results to out/candidate_evaluation_results.csv".into()
            ))
        );
    }

    #[test]
    fn renders_role_rubric_and_results() {
        let mut view = RoleDetailView::new(RecordId::new("5"));
        view.loaded(Ok(detail(TWO_RESULTS)));
        let text = screen_text(120, 30, |f, area| view.render(f, area));
        assert!(text.contains("Data Engineer"));
        assert!(text.contains("1. SQL (50%)"));
        assert!(text.contains("alice.pdf"));
        assert!(text.contains("e export CSV"));
    }

    #[test]
    fn failed_fetch_shows_message() {
        let mut view = RoleDetailView::new(RecordId::new("404"));
        view.loaded(Err(ApiError::Server {
            status: 500,
            message: "Error fetching role details: Role not found".into(),
        }));
        let text = screen_text(80, 6, |f, area| view.render(f, area));
        assert!(text.contains("Error: Error fetching role details: Role not found"));
    }
}
