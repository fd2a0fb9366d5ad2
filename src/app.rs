//! App shell: owns the current screen, runs API calls as tokio tasks and
//! routes their responses back to the screen that asked for them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ScreeningApi};
use crate::config::Config;
use crate::csv_export::save_export;
use crate::models::{RecordId, Role, RoleSummary, ScreeningResult};
use crate::router::Route;
use crate::views::create_role::CreateRoleForm;
use crate::views::role_detail::{RoleDetail, RoleDetailView};
use crate::views::role_list::RoleListView;
use crate::views::Action;

/// Outcome of one API task.
#[derive(Debug)]
pub enum Message {
    RolesLoaded(Result<Vec<RoleSummary>, ApiError>),
    RoleCreated(Result<Role, ApiError>),
    DetailLoaded(Result<RoleDetail, ApiError>),
    UploadFinished(Result<ScreeningResult, ApiError>),
}

/// A [`Message`] stamped with the visit of the screen that started the task
/// and the page fetch that was current at the time.
#[derive(Debug)]
pub struct Envelope {
    pub visit: u64,
    pub fetch: u64,
    pub message: Message,
}

enum Page {
    RoleList(RoleListView),
    CreateRole(CreateRoleForm),
    RoleDetail(RoleDetailView),
}

pub struct App {
    api: Arc<dyn ScreeningApi>,
    rubric_guidance: String,
    export_dir: PathBuf,
    route: Route,
    page: Page,
    /// Bumped on every navigation; responses from older visits are dropped.
    visit: u64,
    /// Bumped on every page load, so only the newest reload lands.
    fetch: u64,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
    quit: bool,
}

impl App {
    /// Must be called inside a tokio runtime: entering the first screen
    /// starts its fetch.
    pub fn new(api: Arc<dyn ScreeningApi>, config: &Config, route: Route) -> Self {
        let (tx, rx) = unbounded_channel();
        let mut app = Self {
            api,
            rubric_guidance: config.rubric_guidance.clone(),
            export_dir: config.export_dir.clone(),
            route: Route::RoleList,
            page: Page::RoleList(RoleListView::new()),
            visit: 0,
            fetch: 0,
            tx,
            rx,
            quit: false,
        };
        app.navigate(route);
        app
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn navigate(&mut self, route: Route) {
        self.visit += 1;
        info!(route = %route, visit = self.visit, "navigating");
        self.page = match &route {
            Route::RoleList => Page::RoleList(RoleListView::new()),
            Route::CreateRole => Page::CreateRole(CreateRoleForm::new()),
            Route::RoleDetail(id) => Page::RoleDetail(RoleDetailView::new(id.clone())),
        };
        self.route = route;
        self.fetch_page();
    }

    /// Put the current screen back into its loading state and fetch again.
    fn reload(&mut self) {
        match &mut self.page {
            Page::RoleList(view) => view.reload(),
            Page::RoleDetail(view) => view.reload(),
            Page::CreateRole(_) => return,
        }
        self.fetch_page();
    }

    fn fetch_page(&mut self) {
        self.fetch += 1;
        match &self.page {
            Page::RoleList(_) => {
                self.spawn(|api| async move { Message::RolesLoaded(api.list_roles().await) })
            }
            Page::RoleDetail(view) => {
                let role_id = view.role_id.clone();
                self.spawn(move |api| async move {
                    Message::DetailLoaded(load_detail(api.as_ref(), &role_id).await)
                })
            }
            Page::CreateRole(_) => {}
        }
    }

    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<dyn ScreeningApi>) -> Fut,
        Fut: Future<Output = Message> + Send + 'static,
    {
        let fut = task(Arc::clone(&self.api));
        let tx = self.tx.clone();
        let visit = self.visit;
        let fetch = self.fetch;
        tokio::spawn(async move {
            let message = fut.await;
            // Only fails once the app itself has been dropped.
            let _ = tx.send(Envelope {
                visit,
                fetch,
                message,
            });
        });
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        let action = match &mut self.page {
            Page::RoleList(view) => view.handle_key(&key),
            Page::CreateRole(form) => form.handle_key(&key),
            Page::RoleDetail(view) => view.handle_key(&key),
        };
        self.perform(action);
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.quit = true,
            Action::Navigate(route) => self.navigate(route),
            Action::Reload => self.reload(),
            Action::CreateRole { title, description } => {
                let guidance = self.rubric_guidance.clone();
                self.spawn(move |api| async move {
                    Message::RoleCreated(
                        api.create_role(&title, &description, Some(&guidance))
                            .await,
                    )
                });
            }
            Action::Upload(path) => {
                if let Page::RoleDetail(view) = &self.page {
                    let role_id = view.role_id.clone();
                    self.spawn(move |api| async move {
                        Message::UploadFinished(api.upload_resume(&role_id, &path).await)
                    });
                }
            }
            Action::Export => {
                if let Page::RoleDetail(view) = &mut self.page {
                    let outcome = save_export(&self.export_dir, view.results());
                    if let Err(e) = &outcome {
                        warn!(error = %e, "export failed");
                    }
                    view.export_finished(outcome);
                }
            }
        }
    }

    /// Apply every response that has already arrived.
    pub fn drain_messages(&mut self) {
        while let Ok(envelope) = self.rx.try_recv() {
            self.apply(envelope);
        }
    }

    /// Wait for the next response. The app holds a sender, so this never
    /// yields `None` while the app is alive.
    #[cfg(test)]
    pub async fn next_message(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub fn apply(&mut self, envelope: Envelope) {
        if envelope.visit != self.visit {
            debug!(
                visit = envelope.visit,
                current = self.visit,
                "discarding response for a screen that is no longer shown"
            );
            return;
        }
        let page_load = matches!(
            envelope.message,
            Message::RolesLoaded(_) | Message::DetailLoaded(_)
        );
        if page_load && envelope.fetch != self.fetch {
            debug!(
                fetch = envelope.fetch,
                current = self.fetch,
                "discarding superseded page load"
            );
            return;
        }

        let mut next_route = None;
        let mut refetch = false;
        match (envelope.message, &mut self.page) {
            (Message::RolesLoaded(result), Page::RoleList(view)) => {
                if let Err(e) = &result {
                    warn!(error = %e, "loading roles failed");
                }
                view.loaded(result);
            }
            (Message::RoleCreated(Ok(role)), Page::CreateRole(_)) => {
                info!(id = %role.id, title = %role.title, "role created");
                next_route = Some(Route::RoleList);
            }
            (Message::RoleCreated(Err(e)), Page::CreateRole(form)) => {
                warn!(error = %e, "creating role failed");
                form.failed(e.to_string());
            }
            (Message::DetailLoaded(result), Page::RoleDetail(view)) => {
                if let Err(e) = &result {
                    warn!(role = %view.role_id, error = %e, "loading role failed");
                }
                view.loaded(result);
            }
            (Message::UploadFinished(result), Page::RoleDetail(view)) => match result {
                Ok(screened) => {
                    view.uploader.finished(Ok(&screened));
                    refetch = true;
                }
                Err(e) => {
                    warn!(role = %view.role_id, error = %e, "upload failed");
                    view.uploader.finished(Err(e.to_string()));
                }
            },
            (message, _) => debug!(?message, "response does not belong to the current screen"),
        }

        if let Some(route) = next_route {
            self.navigate(route);
        } else if refetch {
            self.reload();
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(f.size());

        let mut header = vec![
            Span::styled(
                "Resume Screener",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::raw(self.route.title()),
            Span::styled(
                format!("  {}", self.route),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let Page::RoleList(_) = self.page {
            header.push(Span::styled(
                "   ↑/↓ select  Enter open  n new role  r reload  q quit",
                Style::default().fg(Color::DarkGray),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(header)), chunks[0]);

        match &mut self.page {
            Page::RoleList(view) => view.render(f, chunks[1]),
            Page::CreateRole(form) => form.render(f, chunks[1]),
            Page::RoleDetail(view) => view.render(f, chunks[1]),
        }
    }
}

/// Role first, then its results; either failing fails the whole screen.
pub async fn load_detail(
    api: &dyn ScreeningApi,
    role_id: &RecordId,
) -> Result<RoleDetail, ApiError> {
    let role = api.get_role_details(role_id).await?;
    let results = api.get_role_results(role_id).await?;
    Ok(RoleDetail { role, results })
}
