//! Skycast - Weather lookup in the terminal
//!
//! A terminal UI that shows current conditions and a multi-day forecast for
//! a city typed by the user (with autocomplete) or for the current location.

use std::io;
use std::panic;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use skycast::app::{Action, App};
use skycast::cache::{FileStore, KeyValueStore, MemoryStore, WeatherCache};
use skycast::cli::{AppConfig, CacheLocation, Cli, LocationSource};
use skycast::data::{
    FixedLocation, GeoError, IpGeolocator, LocationProvider, Unsupported, WeatherApiClient,
};
use skycast::runtime::EffectRunner;
use skycast::{logging, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Opens the configured store and drops entries that are already stale
fn build_cache(config: &AppConfig) -> WeatherCache {
    let store: Box<dyn KeyValueStore> = match &config.cache {
        CacheLocation::Memory => Box::new(MemoryStore::new()),
        CacheLocation::Dir(dir) => Box::new(FileStore::with_dir(dir.clone())),
        CacheLocation::Default => match FileStore::new() {
            Some(store) => Box::new(store),
            None => {
                warn!("no cache directory available, caching in memory");
                Box::new(MemoryStore::new())
            }
        },
    };

    let mut cache = WeatherCache::new(store, config.cache_ttl);
    let evicted = cache.evict_expired();
    if evicted > 0 {
        info!(evicted, "removed stale cache entries");
    }
    cache
}

fn build_locator(source: &LocationSource) -> Result<Arc<dyn LocationProvider>, GeoError> {
    Ok(match source {
        LocationSource::None => Arc::new(Unsupported),
        LocationSource::Fixed {
            latitude,
            longitude,
        } => Arc::new(FixedLocation::new(*latitude, *longitude)?),
        LocationSource::IpLookup { url } => Arc::new(IpGeolocator::new(url.clone())),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    if let Some(path) = logging::init(config.log_file.clone()) {
        info!(log = %path.display(), api = %config.api_url, "skycast starting");
    }

    let client = WeatherApiClient::new(&config.api_url)?;
    let locator = build_locator(&config.location)?;
    let cache = build_cache(&config);

    let mut app = App::new(cache, config.forecast_days, locator.is_supported());
    let mut runner = EffectRunner::new(client, locator, config.debounce);

    if let Some(city) = &config.initial_city {
        app.query = city.clone();
        runner.apply(&mut app, Action::Search);
    }

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    loop {
        // Apply finished requests before drawing
        runner.pump(&mut app);

        terminal.draw(|f| ui::render(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let effects = app.handle_key(key);
                    runner.run_all(effects);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("skycast exiting");
    Ok(())
}
