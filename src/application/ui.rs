use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Inventory;
use crate::domain::models::Loading;
use crate::domain::models::SlashCommand;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;
use crate::infrastructure::backends::BackendManager;

const INVENTORY_WIDTH: u16 = 32;

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<'_>,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut events = EventsService::new(rx);
    let mut textarea = TextArea::default();
    let mut loading = Loading::default();

    app_state.start_session(&tx)?;

    loop {
        terminal.draw(|frame| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Min(1), Constraint::Length(INVENTORY_WIDTH)])
                .split(frame.size());

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Min(1), Constraint::Max(4)])
                .split(columns[0]);

            if rows[0].width != app_state.last_known_width
                || rows[0].height != app_state.last_known_height
            {
                app_state.set_rect(rows[0]);
            }

            app_state
                .bubble_list
                .render(frame, rows[0], app_state.scroll.position);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                rows[0].inner(&Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut app_state.scroll.scrollbar_state,
            );

            let uploads = app_state.orchestrator.uploads();
            Inventory {
                status: app_state.orchestrator.session().status(),
                clearing: app_state.orchestrator.is_clearing(),
                uploaded: uploads.uploaded_files(),
                pending: uploads.pending_selection(),
                uploading: uploads.is_uploading(),
            }
            .render(frame, columns[1]);

            if app_state.is_asking() {
                loading.render(frame, rows[1]);
            } else {
                frame.render_widget(textarea.widget(), rows[1]);
            }
        })?;

        match events.next().await? {
            Event::KeyboardCTRLC() => {
                if app_state.orchestrator.cancel_ask() || app_state.orchestrator.cancel_upload() {
                    continue;
                }
                break;
            }
            Event::KeyboardEnter() => {
                if app_state.is_asking() {
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                if SlashCommand::parse(&input_str).is_some() {
                    textarea = TextArea::default();
                    if app_state.handle_slash_commands(&input_str, &tx)? {
                        break;
                    }
                    continue;
                }

                app_state.submit_question(&input_str, &tx)?;
            }
            Event::KeyboardCharInput(input) => {
                if !app_state.is_asking() {
                    textarea.input(input);
                }
            }
            Event::KeyboardPaste(text) => {
                if app_state.is_asking() {
                    continue;
                }
                for (idx, line) in text.replace('\r', "").split('\n').enumerate() {
                    if idx > 0 {
                        textarea.insert_newline();
                    }
                    textarea.insert_str(line);
                }
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UITick() => {
                loading.tick();
            }
            Event::UIResize() => (),
            Event::SessionCreated(res) => {
                app_state.handle_session_created(res, &tx)?;
            }
            Event::FilesRefreshed(request, res) => {
                app_state.handle_files_refreshed(&request, res);
            }
            Event::UploadFinished(request, res) => {
                app_state.handle_upload_finished(&request, res, &tx)?;
            }
            Event::AskFinished(request, res) => {
                if app_state.handle_ask_finished(&request, res) {
                    textarea = TextArea::default();
                }
            }
            Event::SessionCleared(request, res) => {
                app_state.handle_session_cleared(&request, res, &tx)?;
            }
        }
    }

    return Ok(());
}

/// Best effort terminal restore for the panic hook. Errors are ignored since the
/// process is already going down.
pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let backend = BackendManager::get()?;
    let mut app_state = AppState::new(&backend).await?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let res = start_loop(&mut terminal, &mut app_state, tx, rx).await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return res;
}
