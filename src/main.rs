//! grocer - terminal grocery ordering client
//!
//! Browse the product catalog, keep a cart with per-product volumes, place
//! orders and review past orders, all against a remote order backend.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use tracing::info;

use grocer::application::{App, AppMode, CartStore};
use grocer::infrastructure::{
    Config, HttpBackend, ProductStore, PurchasedItemTable, TracingAnalytics, UserStore, logging,
};
use grocer::presentation::{InputHandler, render_ui};

const CONFIG_ENV: &str = "GROCER_CONFIG";
const TICK: Duration = Duration::from_millis(200);

/// Entry point for the grocer terminal client.
///
/// Loads configuration and local stores before touching the terminal, so
/// startup failures are printed normally.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("grocer.toml"));
    let config = Config::load(&config_path)?;
    logging::init(&config)?;
    info!(backend = %config.backend_url, data_dir = %config.data_dir.display(), "starting");

    let products = Rc::new(ProductStore::load(&config.catalog_path())?);
    let users = Rc::new(RefCell::new(UserStore::open(&config.user_path())?));
    let table = PurchasedItemTable::open(&config.purchased_items_path())?;
    let cart = CartStore::new(table, Rc::clone(&products), Rc::clone(&users));
    let backend = Arc::new(HttpBackend::new(config.backend_url.clone(), config.request_timeout())?);

    let mut app = App::new(config, products, users, cart, backend, Rc::new(TracingAnalytics));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    info!("stopped");

    Ok(())
}

/// Draws, delivers finished backend calls and dispatches key presses until
/// the user quits with `q` in normal mode or `Esc` on the sign-up form.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| render_ui(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match (key.code, app.mode) {
                    (KeyCode::Char('q'), AppMode::Normal) => return Ok(()),
                    (KeyCode::Esc, AppMode::Editing) => return Ok(()),
                    _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                }
            }
        }
    }
}
