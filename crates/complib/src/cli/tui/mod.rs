//! Terminal user interface for the component library.

pub mod app;
pub mod clipboard;
pub mod components;
pub mod event;
pub mod ui;

use anyhow::Result;
use clap::Args;
use complib::gateway::BackendGateway;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, prelude::*, Terminal};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::tui::app::App;
use crate::cli::tui::clipboard::Osc52Clipboard;
use crate::cli::tui::event::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Default, Args)]
pub struct TuiArgs {}

pub async fn run(_args: TuiArgs, gateway: Arc<dyn BackendGateway>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(gateway, Box::new(Osc52Clipboard));
    app.start();
    let events = EventHandler::new(TICK_RATE);

    let result = run_app(&mut terminal, &mut app, &events).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        match events.next().await {
            Event::Key(key) => app.handle_key(key),
            Event::Tick => app.tick(),
            Event::Resize => {}
        }
    }

    Ok(())
}
