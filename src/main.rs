// ============================================================================
// Coinboard - Tableau de bord des cryptomonnaies
// ============================================================================
// Programme TUI qui affiche le classement des cryptos par capitalisation
// Charge les pages depuis CoinGecko, trie/filtre/pagine côté client
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : un worker thread possède le runtime tokio
// 4. Channels mpsc : le worker renvoie des résultats, App reste à la boucle
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use coinboard::api::{MarketClient, MarketPage};
use coinboard::app::App;
use coinboard::config::{Config, PreferenceStore, Preferences};
use coinboard::models::{PageRequest, ViewState};
use coinboard::ui::{events::Event, EventHandler, render};

// ============================================================================
// WorkerCommand / WorkerResult : protocole avec le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - La boucle principale envoie des requêtes de page
// - Le worker exécute les appels HTTP async et renvoie le résultat
// - Chaque résultat porte sa requête : App écarte les réponses périmées
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum WorkerCommand {
    /// Charger une page du classement
    FetchPage(PageRequest),
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum WorkerResult {
    PageLoaded {
        request: PageRequest,
        page: MarketPage,
    },

    FetchFailed {
        request: PageRequest,
        error: String,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f logs/coinboard.log
/// RUST_LOG=coinboard=trace cargo run
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "coinboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // Utile : UI et worker écrivent tous les deux
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour coinboard, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinboard=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::load();

    // Logging avant tout le reste ; si ça échoue on continue sans
    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(
        api = %config.api_base_url,
        refresh_secs = config.refresh_interval_secs,
        page_size = config.default_page_size,
        "Coinboard starting up"
    );

    let preferences = PreferenceStore::new();
    let theme = preferences.load().theme();

    let app = App::new(
        ViewState::with_page_size(config.page_size()),
        theme,
        config.refresh_interval(),
    );

    // Channels avec le worker
    // - command_tx/rx : requêtes de page
    // - result_tx/rx : pages chargées ou erreurs
    let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
    let (result_tx, result_rx) = mpsc::channel::<WorkerResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(&config, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::default();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, &preferences, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Worker thread
// ============================================================================
// CONCEPT : Thread + async runtime
// - std::thread::spawn() : crée un thread OS
// - tokio::runtime::Runtime : runtime async propre à ce thread
// - block_on() bloque le worker, jamais l'UI
// ============================================================================

/// Lance le worker qui exécute les appels HTTP en arrière-plan
///
/// Si le runtime ou le client HTTP ne peuvent pas être créés, le worker
/// répond à chaque commande par un échec : l'UI reste utilisable et affiche
/// l'erreur.
fn spawn_background_worker(
    config: &Config,
    command_rx: mpsc::Receiver<WorkerCommand>,
    result_tx: mpsc::Sender<WorkerResult>,
) {
    let client = MarketClient::new(config);

    std::thread::spawn(move || {
        let setup = tokio::runtime::Runtime::new()
            .context("Échec de la création du runtime tokio")
            .and_then(|runtime| client.map(|client| (runtime, client)));

        let (runtime, client) = match setup {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = ?e, "Worker setup failed");
                let message = format!("{:#}", e);
                while let Ok(WorkerCommand::FetchPage(request)) = command_rx.recv() {
                    let _ = result_tx.send(WorkerResult::FetchFailed {
                        request,
                        error: message.clone(),
                    });
                }
                return;
            }
        };

        // Boucle de traitement : se termine quand la boucle principale
        // lâche command_tx
        while let Ok(command) = command_rx.recv() {
            // Seule la requête la plus récente compte : les autres sont périmées
            let command = latest_command(command, &command_rx);
            debug!(?command, "Worker received command");

            match command {
                WorkerCommand::FetchPage(request) => {
                    let result = runtime.block_on(client.fetch_page(request));

                    let message = match result {
                        Ok(page) => WorkerResult::PageLoaded { request, page },
                        Err(e) => {
                            error!(?request, error = ?e, "Failed to fetch market page");
                            WorkerResult::FetchFailed {
                                request,
                                error: format!("{:#}", e),
                            }
                        }
                    };

                    if result_tx.send(message).is_err() {
                        break;
                    }
                }
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

/// Vide les commandes en attente et ne garde que la dernière
fn latest_command(
    first: WorkerCommand,
    command_rx: &mpsc::Receiver<WorkerCommand>,
) -> WorkerCommand {
    let mut latest = first;
    let mut skipped = 0;
    while let Ok(next) = command_rx.try_recv() {
        latest = next;
        skipped += 1;
    }
    if skipped > 0 {
        debug!(skipped, "Skipped superseded page requests");
    }
    latest
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker (pages, erreurs)
//   1. Envoi d'une requête si la pagination a changé ou si un
//      rafraîchissement est dû
//   2. Rendu
//   3. Événements clavier
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    events: &EventHandler,
    preferences: &PreferenceStore,
    command_tx: mpsc::Sender<WorkerCommand>,
    result_rx: mpsc::Receiver<WorkerResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // 0. RÉSULTATS : on vide le channel sans bloquer
        while worker_alive {
            match result_rx.try_recv() {
                Ok(WorkerResult::PageLoaded { request, page }) => {
                    if page.dropped > 0 {
                        warn!(dropped = page.dropped, "Some market records were malformed");
                    }
                    app.apply_page(request, page);
                }
                Ok(WorkerResult::FetchFailed { request, error }) => {
                    app.record_failure(request, error);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    worker_alive = false;
                }
            }
        }

        // 1. FETCH : la requête reflète toujours la pagination courante
        if let Some(request) = app.next_fetch(Instant::now()) {
            debug!(?request, "Dispatching page request");
            if command_tx.send(WorkerCommand::FetchPage(request)).is_err() {
                app.record_failure(request, "Worker indisponible".to_string());
            }
        }

        // 2. RENDER
        terminal.draw(|frame| render(frame, &app))?;

        // 3. INPUT
        match events.next() {
            Ok(event) => handle_event(&mut app, event, preferences),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT : Event Handler Pattern
// - En mode saisie, toutes les touches vont au buffer
// - Sinon, chaque touche correspond à une action sur App
// - Toute touche autre que 'q' annule une demande de quit en attente
// ============================================================================

fn handle_event(app: &mut App, event: Event, preferences: &PreferenceStore) {
    use coinboard::ui::events::{
        get_char_from_event, input_target_from_event, is_backspace_event, is_down_event,
        is_enter_event, is_escape_event, is_favorite_event, is_favorites_only_event,
        is_larger_page_event, is_next_page_event, is_previous_page_event, is_quit_event,
        is_refresh_event, is_reset_filters_event, is_smaller_page_event, is_theme_event,
        is_up_event, sort_key_from_event,
    };

    if matches!(event, Event::Tick) {
        return;
    }

    // ========================================
    // Input Mode : saisie d'un filtre
    // ========================================
    if app.is_in_input_mode() {
        if is_enter_event(&event) {
            app.submit_input();
        } else if is_escape_event(&event) {
            debug!("Filter input cancelled");
            app.cancel_input();
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if let Some(c) = get_char_from_event(&event) {
            app.append_char(c);
        }
        return;
    }

    // Two-step quit : première pression demande confirmation
    if is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }

    app.cancel_quit();

    if let Some(key) = sort_key_from_event(&event) {
        app.sort_by(key);
    } else if let Some(target) = input_target_from_event(&event) {
        debug!(?target, "User started filter input");
        app.start_input(target);
    } else if is_up_event(&event) {
        app.navigate_up();
    } else if is_down_event(&event) {
        app.navigate_down();
    } else if is_favorite_event(&event) {
        app.toggle_selected_favorite();
    } else if is_favorites_only_event(&event) {
        app.toggle_show_only_favorites();
    } else if is_reset_filters_event(&event) {
        info!("User reset filters");
        app.reset_filters();
    } else if is_next_page_event(&event) {
        app.next_page();
    } else if is_previous_page_event(&event) {
        app.previous_page();
    } else if is_larger_page_event(&event) {
        app.next_page_size();
    } else if is_smaller_page_event(&event) {
        app.previous_page_size();
    } else if is_refresh_event(&event) {
        info!("User requested refresh");
        app.request_refresh();
    } else if is_theme_event(&event) {
        let theme = app.toggle_theme();
        info!(theme = theme.label(), "Theme changed");
        if let Err(e) = preferences.save(&Preferences::with_theme(theme)) {
            warn!(error = ?e, "Failed to save preferences");
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// - Raw mode : on reçoit tous les caractères directement
// - Alternate screen : écran secondaire (ne pollue pas l'historique)
//
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch(page: u32) -> WorkerCommand {
        WorkerCommand::FetchPage(PageRequest { page, per_page: 10 })
    }

    fn page_of(command: WorkerCommand) -> u32 {
        match command {
            WorkerCommand::FetchPage(request) => request.page,
        }
    }

    #[test]
    fn test_latest_command_skips_superseded_requests() {
        let (tx, rx) = mpsc::channel();
        for page in 2..=10 {
            tx.send(fetch(page)).unwrap();
        }

        let first = rx.recv().unwrap();
        assert_eq!(page_of(latest_command(first, &rx)), 10);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_latest_command_without_backlog() {
        let (tx, rx) = mpsc::channel::<WorkerCommand>();
        assert_eq!(page_of(latest_command(fetch(3), &rx)), 3);
        drop(tx);
    }
}
