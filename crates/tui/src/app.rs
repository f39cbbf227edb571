use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use autoparts_core::{
    validation::{LoginForm, RegistrationForm},
    AppServices, Error, FormDraft, PendingDelete, SessionStatus,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::form::{
    self, FieldSpec, FormView, CATEGORY_FIELDS, LOGIN_FIELDS, PART_FIELDS, REGISTER_FIELDS,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MENU_ITEMS: [&str; 4] = ["Categories", "Parts", "Log out", "Quit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    Register,
    Dashboard,
    Categories,
    Parts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Form,
}

enum AppEvent {
    Input(Event),
    Tick,
}

struct Theme {
    accent: Color,
    muted: Color,
    selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::Rgb(40, 44, 52),
        }
    }
}

/// Terminal front-end over the inventory services.
pub struct AutopartsApp {
    services: AppServices,
    screen: Screen,
    focus: Focus,
    login: LoginForm,
    registration: RegistrationForm,
    form: FormView,
    cursor: usize,
    menu_cursor: usize,
    pending_delete: Option<PendingDelete>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl AutopartsApp {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            screen: Screen::Login,
            focus: Focus::List,
            login: LoginForm::default(),
            registration: RegistrationForm::default(),
            form: FormView::default(),
            cursor: 0,
            menu_cursor: 0,
            pending_delete: None,
            status: "Ready".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.restore_session().await;

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    self.handle_key(key).await;
                }
                Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => {}
                None => break,
            }
            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    async fn restore_session(&mut self) {
        match self.services.session.restore() {
            Ok(SessionStatus::Authenticated(profile)) => {
                self.enter_dashboard(format!("Welcome back, {}", profile.display_name()));
            }
            Ok(SessionStatus::ProfileIncomplete) => {
                let message = match self.services.session.refresh_profile().await {
                    Ok(profile) => format!("Welcome back, {}", profile.display_name()),
                    Err(err) if err.is_auth() => {
                        self.report(err);
                        return;
                    }
                    Err(err) => {
                        warn!(error = %err, "restored session without profile");
                        "Session restored (profile unavailable)".to_string()
                    }
                };
                self.enter_dashboard(message);
            }
            Ok(SessionStatus::Anonymous) => {
                self.status = "Log in to continue".to_string();
            }
            Err(err) => {
                error!(error = %err, "session restore failed");
                self.status = format!("Could not restore session: {err}");
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key).await,
            Screen::Register => self.handle_register_key(key).await,
            Screen::Dashboard => self.handle_dashboard_key(key).await,
            Screen::Categories | Screen::Parts => {
                if self.pending_delete.is_some() {
                    self.handle_delete_prompt_key(key).await;
                } else if self.focus == Focus::List {
                    self.handle_list_key(key).await;
                } else {
                    self.handle_form_key(key).await;
                }
            }
        }
    }

    async fn handle_login_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('n') {
            self.screen = Screen::Register;
            self.form.reset();
            self.status = "Create an account".to_string();
            return;
        }
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit_login().await,
            code => self.edit_active_form(code),
        }
    }

    async fn handle_register_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Login;
                self.form.reset();
                self.status = "Log in to continue".to_string();
            }
            KeyCode::Enter => self.submit_registration().await,
            code => self.edit_active_form(code),
        }
    }

    async fn submit_login(&mut self) {
        self.form.errors = Default::default();
        let result = self
            .services
            .session
            .login(&self.login.email, &self.login.password)
            .await;
        match result {
            Ok(profile) => {
                self.login = LoginForm::default();
                self.enter_dashboard(format!("Welcome, {}", profile.display_name()));
            }
            Err(Error::ProfileIncomplete) => {
                self.login = LoginForm::default();
                self.enter_dashboard("Logged in, but the server sent no profile".to_string());
            }
            Err(err) => self.report(err),
        }
    }

    async fn submit_registration(&mut self) {
        self.form.errors = Default::default();
        match self.services.session.register(&self.registration).await {
            Ok(profile) => {
                self.registration = RegistrationForm::default();
                self.enter_dashboard(format!("Account created. Welcome, {}", profile.display_name()));
            }
            Err(Error::ProfileIncomplete) => {
                self.registration = RegistrationForm::default();
                self.enter_dashboard("Account created, but the server sent no profile".to_string());
            }
            Err(err) => self.report(err),
        }
    }

    async fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_cursor = (self.menu_cursor + 1) % MENU_ITEMS.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = (self.menu_cursor + MENU_ITEMS.len() - 1) % MENU_ITEMS.len();
            }
            KeyCode::Enter => match self.menu_cursor {
                0 => self.open_resource(Screen::Categories).await,
                1 => self.open_resource(Screen::Parts).await,
                2 => self.logout(),
                _ => self.should_quit = true,
            },
            _ => {}
        }
    }

    async fn open_resource(&mut self, screen: Screen) {
        if !self.services.session.status().has_token() {
            self.screen = Screen::Login;
            self.status = "Log in to continue".to_string();
            return;
        }
        self.screen = screen;
        self.focus = Focus::List;
        self.cursor = 0;
        self.pending_delete = None;
        self.form.reset();
        self.services.categories.cancel_edit();
        self.services.parts.cancel_edit();
        self.reload().await;
    }

    async fn reload(&mut self) {
        let result = match self.screen {
            Screen::Categories => self
                .services
                .categories
                .list()
                .await
                .map(|items| items.len()),
            Screen::Parts => self
                .services
                .parts
                .load()
                .await
                .map(|_| self.services.parts.items().len()),
            _ => return,
        };
        match result {
            Ok(total) => {
                self.clamp_cursor();
                self.status = format!("{total} records loaded");
            }
            Err(err) => self.report(err),
        }
    }

    async fn handle_list_key(&mut self, key: KeyEvent) {
        let total = self.item_count();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Dashboard;
                self.status = "Choose a section".to_string();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if total > 0 {
                    self.cursor = (self.cursor + 1).min(total - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char('r') => self.reload().await,
            KeyCode::Char('n') => {
                self.cancel_edit();
                self.focus = Focus::Form;
                self.status = "New record".to_string();
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    let result = match self.screen {
                        Screen::Parts => self.services.parts.begin_edit(&id).map(|_| ()),
                        _ => self.services.categories.begin_edit(&id).map(|_| ()),
                    };
                    match result {
                        Ok(()) => {
                            self.form.reset();
                            self.focus = Focus::Form;
                            self.status = "Editing record".to_string();
                        }
                        Err(err) => self.report(err),
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    let pending = match self.screen {
                        Screen::Parts => self.services.parts.request_delete(&id),
                        _ => self.services.categories.request_delete(&id),
                    };
                    self.pending_delete = Some(pending);
                }
            }
            _ => {}
        }
    }

    async fn handle_delete_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Some(pending) = self.pending_delete.take() else {
                    return;
                };
                let confirmed = pending.confirm();
                let result = match self.screen {
                    Screen::Parts => self.services.parts.delete(confirmed).await,
                    _ => self.services.categories.delete(confirmed).await,
                };
                match result {
                    Ok(()) => {
                        self.clamp_cursor();
                        self.status = "Record deleted".to_string();
                    }
                    Err(err) => self.report(err),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_delete = None;
                self.status = "Delete cancelled".to_string();
            }
            _ => {}
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.cancel_edit();
                self.focus = Focus::List;
                self.status = "Edit discarded".to_string();
            }
            KeyCode::Enter => {
                self.form.errors = Default::default();
                let result = match self.screen {
                    Screen::Parts => self.services.parts.submit().await.map(|part| part.name),
                    _ => self
                        .services
                        .categories
                        .submit()
                        .await
                        .map(|category| category.name),
                };
                match result {
                    Ok(name) => {
                        info!(%name, "record saved");
                        self.form.reset();
                        self.focus = Focus::List;
                        self.clamp_cursor();
                        self.status = format!("Saved \"{name}\"");
                    }
                    Err(err) => self.report(err),
                }
            }
            KeyCode::Left | KeyCode::Right if self.focused_key() == Some("categoryId") => {
                let delta = if key.code == KeyCode::Left { -1 } else { 1 };
                self.cycle_category(delta);
            }
            KeyCode::Char(_) if self.focused_key() == Some("categoryId") => {}
            code => self.edit_active_form(code),
        }
    }

    fn edit_active_form(&mut self, code: KeyCode) {
        let total = self.active_fields().len();
        match code {
            KeyCode::Tab | KeyCode::Down => self.form.move_focus(1, total),
            KeyCode::BackTab | KeyCode::Up => self.form.move_focus(-1, total),
            code => {
                let Some(key) = self.focused_key() else {
                    return;
                };
                let edited = match self.active_draft_mut() {
                    Some(draft) => form::edit_text(draft, key, code),
                    None => false,
                };
                if edited {
                    self.form.clear_error(key);
                }
            }
        }
    }

    fn cycle_category(&mut self, delta: isize) {
        let ids: Vec<String> = self
            .services
            .parts
            .categories()
            .iter()
            .map(|category| category.id.clone())
            .collect();
        if ids.is_empty() {
            self.status = "No categories loaded".to_string();
            return;
        }
        let draft = self.services.parts.draft_mut();
        let next = match ids.iter().position(|id| *id == draft.category_id) {
            Some(current) => (current as isize + delta).rem_euclid(ids.len() as isize) as usize,
            None => 0,
        };
        draft.category_id = ids[next].clone();
    }

    fn cancel_edit(&mut self) {
        self.form.reset();
        match self.screen {
            Screen::Parts => self.services.parts.cancel_edit(),
            _ => self.services.categories.cancel_edit(),
        }
    }

    fn logout(&mut self) {
        if let Err(err) = self.services.session.logout() {
            error!(error = %err, "logout failed to clear storage");
        }
        self.screen = Screen::Login;
        self.form.reset();
        self.status = "Logged out".to_string();
    }

    fn enter_dashboard(&mut self, message: String) {
        self.screen = Screen::Dashboard;
        self.menu_cursor = 0;
        self.form.reset();
        self.status = message;
    }

    /// Surface an error. Rejected credentials end the session.
    fn report(&mut self, err: Error) {
        match self.services.session.expire_on(&err) {
            Ok(true) => {
                self.status = rejected_credentials_status(self.screen).to_string();
                self.screen = Screen::Login;
                self.pending_delete = None;
                self.form.reset();
                return;
            }
            Ok(false) => {}
            Err(storage) => error!(error = %storage, "failed to clear expired session"),
        }
        match err {
            Error::Validation(errors) => {
                self.status = errors
                    .iter()
                    .next()
                    .map(|first| format!("Check the form: {}", first.message))
                    .unwrap_or_else(|| "Check the form".to_string());
                self.form.errors = errors;
            }
            Error::NotFound(message) => {
                self.status = format!("Not found: {message} (press r to reload)");
            }
            err if err.is_recoverable() => {
                self.status = format!("Temporary problem, try again: {err}");
            }
            err => self.status = format!("Error: {err}"),
        }
    }

    fn active_fields(&self) -> &'static [FieldSpec] {
        match self.screen {
            Screen::Login => LOGIN_FIELDS,
            Screen::Register => REGISTER_FIELDS,
            Screen::Categories => CATEGORY_FIELDS,
            Screen::Parts => PART_FIELDS,
            Screen::Dashboard => &[],
        }
    }

    fn focused_key(&self) -> Option<&'static str> {
        self.active_fields().get(self.form.focus).map(|spec| spec.key)
    }

    fn active_draft(&self) -> Option<&dyn FormDraft> {
        match self.screen {
            Screen::Login => Some(&self.login as &dyn FormDraft),
            Screen::Register => Some(&self.registration as &dyn FormDraft),
            Screen::Categories => Some(self.services.categories.draft() as &dyn FormDraft),
            Screen::Parts => Some(self.services.parts.draft() as &dyn FormDraft),
            Screen::Dashboard => None,
        }
    }

    fn active_draft_mut(&mut self) -> Option<&mut dyn FormDraft> {
        match self.screen {
            Screen::Login => Some(&mut self.login as &mut dyn FormDraft),
            Screen::Register => Some(&mut self.registration as &mut dyn FormDraft),
            Screen::Categories => Some(self.services.categories.draft_mut() as &mut dyn FormDraft),
            Screen::Parts => Some(self.services.parts.draft_mut() as &mut dyn FormDraft),
            Screen::Dashboard => None,
        }
    }

    fn item_count(&self) -> usize {
        match self.screen {
            Screen::Categories => self.services.categories.items().len(),
            Screen::Parts => self.services.parts.items().len(),
            _ => 0,
        }
    }

    fn selected_id(&self) -> Option<String> {
        match self.screen {
            Screen::Categories => self
                .services
                .categories
                .items()
                .get(self.cursor)
                .map(|category| category.id.clone()),
            Screen::Parts => self
                .services
                .parts
                .items()
                .get(self.cursor)
                .map(|part| part.id.clone()),
            _ => None,
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.item_count().saturating_sub(1));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Login => self.render_auth_form(frame, chunks[1], "Log in", LOGIN_FIELDS),
            Screen::Register => {
                self.render_auth_form(frame, chunks[1], "Register", REGISTER_FIELDS)
            }
            Screen::Dashboard => self.render_dashboard(frame, chunks[1]),
            Screen::Categories | Screen::Parts => self.render_resource(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);
        if let Some(pending) = &self.pending_delete {
            self.render_delete_prompt(frame, area, pending);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let user = match self.services.session.status() {
            SessionStatus::Authenticated(profile) => profile.display_name(),
            SessionStatus::ProfileIncomplete => "signed in".to_string(),
            SessionStatus::Anonymous => "not signed in".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(
                "Auto-parts inventory",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" · {user}"), Style::default().fg(self.theme.muted)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_auth_form(&self, frame: &mut Frame, area: Rect, title: &str, fields: &[FieldSpec]) {
        let height = (fields.len() as u16) * 3 + 3;
        let form_area = centered_rect(56, height, area);
        let Some(draft) = self.active_draft() else {
            return;
        };
        let lines = form::render_fields(fields, draft, &self.form, true, |_, raw| raw.to_string());
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false });
        frame.render_widget(Clear, form_area);
        frame.render_widget(paragraph, form_area);
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let menu_area = centered_rect(32, (MENU_ITEMS.len() as u16) * 2 + 2, area);
        let lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| {
                let entry = if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(format!("  {item}"))
                };
                [entry, Line::from("")]
            })
            .collect();
        let menu = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
    }

    fn render_resource(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        self.render_list(frame, columns[0]);
        self.render_resource_form(frame, columns[1]);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let (title, items): (&str, Vec<ListItem>) = match self.screen {
            Screen::Parts => {
                let parts = &self.services.parts;
                let items = parts
                    .items()
                    .iter()
                    .map(|part| {
                        let category = parts.category_name(&part.category_id).unwrap_or("?");
                        ListItem::new(Line::from(vec![
                            Span::styled(
                                part.name.clone(),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!(
                                    " · {category} · Price: ${:.2} | Stock: {}",
                                    part.price, part.stock
                                ),
                                Style::default().fg(self.theme.muted),
                            ),
                        ]))
                    })
                    .collect();
                ("Parts", items)
            }
            _ => {
                let items = self
                    .services
                    .categories
                    .items()
                    .iter()
                    .map(|category| {
                        let mut spans = vec![Span::styled(
                            category.name.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )];
                        if let Some(description) = &category.description {
                            spans.push(Span::styled(
                                format!(" · {description}"),
                                Style::default().fg(self.theme.muted),
                            ));
                        }
                        ListItem::new(Line::from(spans))
                    })
                    .collect();
                ("Categories", items)
            }
        };

        let empty = items.is_empty();
        let mut list_state = ListState::default();
        if !empty {
            list_state.select(Some(self.cursor));
        }
        let border_style = if self.focus == Focus::List {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        if empty {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                "No records.",
                Style::default().fg(self.theme.muted),
            )))
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_resource_form(&self, frame: &mut Frame, area: Rect) {
        let (fields, editing, noun) = match self.screen {
            Screen::Parts => (PART_FIELDS, self.services.parts.parts().editing(), "part"),
            _ => (CATEGORY_FIELDS, self.services.categories.editing(), "category"),
        };
        let title = if editing.is_some() {
            format!("Edit {noun}")
        } else {
            format!("New {noun}")
        };
        let Some(draft) = self.active_draft() else {
            return;
        };
        let parts = &self.services.parts;
        let lines = form::render_fields(
            fields,
            draft,
            &self.form,
            self.focus == Focus::Form,
            |spec, raw| {
                if spec.key != "categoryId" {
                    return raw.to_string();
                }
                match parts.category_name(raw) {
                    Some(name) => format!("◀ {name} ▶"),
                    None if raw.is_empty() => "◀ select ▶".to_string(),
                    None => format!("◀ {raw} ▶"),
                }
            },
        );
        let border_style = if self.focus == Focus::Form {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        };
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let help = match (self.screen, self.focus) {
            (Screen::Login, _) => "Enter log in · Tab next field · Ctrl+N register · Esc quit",
            (Screen::Register, _) => "Enter create account · Tab next field · Esc back",
            (Screen::Dashboard, _) => "j/k move · Enter open · q quit",
            (_, Focus::List) => "j/k move · n new · e edit · d delete · r reload · Esc back",
            (_, Focus::Form) => "Tab next field · ←/→ pick category · Enter save · Esc cancel",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_delete_prompt(&self, frame: &mut Frame, area: Rect, pending: &PendingDelete) {
        let width = (pending.prompt().chars().count() as u16 + 6).max(30);
        let prompt_area = centered_rect(width, 5, area);
        let paragraph = Paragraph::new(vec![
            Line::from(pending.prompt().to_string()),
            Line::from(""),
            Line::from(Span::styled(
                "y confirm · n cancel",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title("Confirm"),
        );
        frame.render_widget(Clear, prompt_area);
        frame.render_widget(paragraph, prompt_area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Status shown when the server rejects the credentials in use.
fn rejected_credentials_status(screen: Screen) -> &'static str {
    match screen {
        Screen::Login | Screen::Register => "Invalid credentials",
        _ => "Session expired, log in again",
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_login_is_not_reported_as_expiry() {
        assert_eq!(rejected_credentials_status(Screen::Login), "Invalid credentials");
        assert_eq!(rejected_credentials_status(Screen::Register), "Invalid credentials");
        assert_eq!(
            rejected_credentials_status(Screen::Parts),
            "Session expired, log in again"
        );
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(80, 20, area), area);
    }
}
