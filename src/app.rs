// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Un seul propriétaire : la boucle principale possède App, le worker ne
//    fait que renvoyer des résultats par channel
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Garantit la cohérence de l'état
// ============================================================================

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::MarketPage;
use crate::config::Theme;
use crate::models::{AssetRecord, FilterUpdate, PageRequest, PageSize, SortKey, ViewState};
use crate::pipeline;

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : le tableau de marché
    Dashboard,

    /// Mode saisie : capture du texte pour un filtre
    /// - Enter valide, ESC annule
    InputMode,
}

/// Champ de filtre en cours de saisie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Search,
    PriceMin,
    PriceMax,
    Change24hMin,
}

impl InputTarget {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputTarget::Search => "Search: ",
            InputTarget::PriceMin => "Min price ($): ",
            InputTarget::PriceMax => "Max price ($): ",
            InputTarget::Change24hMin => "Min 24h change (%): ",
        }
    }

    /// Convertit la saisie en mise à jour de filtre
    ///
    /// Une saisie non numérique efface la contrainte (pas d'erreur affichée).
    pub fn to_update(&self, raw: &str) -> FilterUpdate {
        let update = FilterUpdate::new();
        match self {
            InputTarget::Search => update.search_term(raw),
            InputTarget::PriceMin => update.price_min_input(raw),
            InputTarget::PriceMax => update.price_max_input(raw),
            InputTarget::Change24hMin => update.percent_change_24h_min_input(raw),
        }
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Première pression de 'q' reçue, attend la confirmation
    pub confirm_quit: bool,

    /// Page courante renvoyée par la source de données (lecture seule)
    pub assets: Vec<AssetRecord>,

    /// Tri, filtres, favoris, pagination
    pub view: ViewState,

    /// Index de la ligne sélectionnée dans les lignes dérivées
    pub selected_index: usize,

    /// Horodatage de la dernière page reçue
    pub updated_at: Option<DateTime<Utc>>,

    /// Dernière erreur de chargement, à afficher
    pub error: Option<String>,

    pub theme: Theme,

    pub current_screen: Screen,

    /// Champ de filtre en cours de saisie (mode Input)
    pub input_target: Option<InputTarget>,

    /// Buffer de saisie pour le mode Input
    pub input_buffer: String,

    /// Requête actuellement en cours côté worker
    in_flight: Option<PageRequest>,

    /// Dernière requête envoyée au worker
    last_dispatched: Option<PageRequest>,

    /// Instant du dernier envoi (pour le rafraîchissement périodique)
    last_fetch_at: Option<Instant>,

    refresh_interval: Duration,
}

impl App {
    /// Crée une App sans données ; la première page sera demandée par next_fetch
    pub fn new(view: ViewState, theme: Theme, refresh_interval: Duration) -> Self {
        Self {
            running: true,
            confirm_quit: false,
            assets: Vec::new(),
            view,
            selected_index: 0,
            updated_at: None,
            error: None,
            theme,
            current_screen: Screen::Dashboard,
            input_target: None,
            input_buffer: String::new(),
            in_flight: None,
            last_dispatched: None,
            last_fetch_at: None,
            refresh_interval,
        }
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Two-step quit : première pression de 'q'
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Lignes dérivées et sélection
    // ========================================================================

    /// Lignes à afficher (tri + filtre sur la page courante)
    pub fn rows(&self) -> Vec<&AssetRecord> {
        pipeline::derive_refs(&self.assets, &self.view)
    }

    pub fn selected_asset(&self) -> Option<&AssetRecord> {
        self.rows().get(self.selected_index).copied()
    }

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.rows().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Garde la sélection dans les bornes après un changement de lignes
    fn clamp_selection(&mut self) {
        let max_index = self.rows().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    // ========================================================================
    // Actions utilisateur (toutes passent par ViewState)
    // ========================================================================

    pub fn sort_by(&mut self, key: SortKey) {
        self.view.set_sort(key);
        debug!(key = ?self.view.sort.key, direction = ?self.view.sort.direction, "Sort changed");
    }

    /// Ajoute ou retire la ligne sélectionnée des favoris
    pub fn toggle_selected_favorite(&mut self) {
        if let Some(id) = self.selected_asset().map(|asset| asset.id.clone()) {
            self.view.toggle_favorite(&id);
            info!(id = %id, favorite = self.view.is_favorite(&id), "Favorite toggled");
            self.clamp_selection();
        }
    }

    pub fn toggle_show_only_favorites(&mut self) {
        let enabled = !self.view.show_only_favorites;
        self.view.set_show_only_favorites(enabled);
        self.selected_index = 0;
    }

    pub fn apply_filter(&mut self, update: FilterUpdate) {
        self.view.set_filter(update);
        self.selected_index = 0;
    }

    pub fn reset_filters(&mut self) {
        self.view.reset_filters();
        self.selected_index = 0;
    }

    pub fn next_page(&mut self) {
        self.view.next_page();
    }

    pub fn previous_page(&mut self) {
        self.view.previous_page();
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.view.set_page_size(page_size);
    }

    pub fn next_page_size(&mut self) {
        self.set_page_size(self.view.pagination.page_size.next());
    }

    pub fn previous_page_size(&mut self) {
        self.set_page_size(self.view.pagination.page_size.previous());
    }

    /// Bascule clair/sombre et retourne le nouveau thème
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    // ========================================================================
    // Chargement des pages
    // ========================================================================

    /// Retourne la requête à envoyer au worker, s'il y en a une
    ///
    /// - la pagination a changé depuis le dernier envoi : nouvelle page
    /// - sinon, l'intervalle de rafraîchissement est écoulé : même page
    ///
    /// Une nouvelle page remplace conceptuellement la requête en cours ;
    /// la réponse de l'ancienne sera écartée par apply_page.
    pub fn next_fetch(&mut self, now: Instant) -> Option<PageRequest> {
        let request = self.view.page_request();
        let changed = self.last_dispatched != Some(request);

        if !changed && !self.refresh_due(now) {
            return None;
        }

        self.last_dispatched = Some(request);
        self.in_flight = Some(request);
        self.last_fetch_at = Some(now);
        Some(request)
    }

    /// Vrai si aucune requête n'est en cours et que l'intervalle est écoulé
    pub fn refresh_due(&self, now: Instant) -> bool {
        self.in_flight.is_none()
            && self
                .last_fetch_at
                .map_or(true, |t| now.saturating_duration_since(t) >= self.refresh_interval)
    }

    /// Demande un rafraîchissement immédiat (touche 'r')
    pub fn request_refresh(&mut self) {
        self.last_fetch_at = None;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Vrai si `request` correspond encore à la pagination affichée
    fn is_current(&self, request: PageRequest) -> bool {
        request == self.view.page_request()
    }

    fn settle(&mut self, request: PageRequest) {
        if self.in_flight == Some(request) {
            self.in_flight = None;
        }
    }

    /// Remplace la collection par une page reçue
    ///
    /// Retourne false (et ne touche à rien) si la réponse concerne une page
    /// qui n'est plus affichée.
    pub fn apply_page(&mut self, request: PageRequest, page: MarketPage) -> bool {
        self.settle(request);

        if !self.is_current(request) {
            debug!(?request, current = ?self.view.page_request(), "Discarding stale page");
            return false;
        }

        info!(page = request.page, assets = page.assets.len(), "Market page applied");
        self.assets = page.assets;
        self.updated_at = Some(page.updated_at);
        self.error = None;
        self.clamp_selection();
        true
    }

    /// Enregistre un échec de chargement ; les données précédentes restent
    pub fn record_failure(&mut self, request: PageRequest, message: String) -> bool {
        self.settle(request);

        if !self.is_current(request) {
            debug!(?request, "Ignoring failure for stale request");
            return false;
        }

        warn!(page = request.page, error = %message, "Market page failed to load");
        self.error = Some(message);
        true
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode saisie pour un champ de filtre
    ///
    /// Le buffer est prérempli avec la valeur actuelle du filtre.
    pub fn start_input(&mut self, target: InputTarget) {
        let filter = &self.view.filter;
        let current = match target {
            InputTarget::Search => filter.search_term.clone(),
            InputTarget::PriceMin => filter.price_min.map(|v| v.to_string()),
            InputTarget::PriceMax => filter.price_max.map(|v| v.to_string()),
            InputTarget::Change24hMin => filter.percent_change_24h_min.map(|v| v.to_string()),
        };

        self.current_screen = Screen::InputMode;
        self.input_target = Some(target);
        self.input_buffer = current.unwrap_or_default();
    }

    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_target = None;
        self.input_buffer.clear();
    }

    /// Valide la saisie et l'applique au filtre
    pub fn submit_input(&mut self) {
        if let Some(target) = self.input_target.take() {
            let raw = std::mem::take(&mut self.input_buffer);
            debug!(?target, input = %raw, "Filter input submitted");
            self.apply_filter(target.to_update(&raw));
        }
        self.current_screen = Screen::Dashboard;
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }

    pub fn input_prompt(&self) -> &'static str {
        self.input_target.map(|t| t.prompt()).unwrap_or_default()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(ViewState::new(), Theme::default(), Duration::from_secs(60))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[&str]) -> MarketPage {
        MarketPage {
            assets: ids
                .iter()
                .enumerate()
                .map(|(i, id)| AssetRecord::new(*id, i as u32 + 1, *id, *id, 10.0 * (i + 1) as f64))
                .collect(),
            updated_at: Utc::now(),
            dropped: 0,
        }
    }

    #[test]
    fn test_app_creation() {
        let app = App::default();
        assert!(app.is_running());
        assert!(app.assets.is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::default();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_first_fetch_then_nothing_until_change() {
        let mut app = App::default();
        let now = Instant::now();

        let first = app.next_fetch(now);
        assert_eq!(first, Some(PageRequest { page: 1, per_page: 10 }));
        assert!(app.is_loading());
        assert_eq!(app.next_fetch(now), None);

        assert!(app.apply_page(PageRequest { page: 1, per_page: 10 }, page(&["a", "b"])));
        assert!(!app.is_loading());
        assert_eq!(app.next_fetch(now), None);

        app.next_page();
        assert_eq!(app.next_fetch(now), Some(PageRequest { page: 2, per_page: 10 }));
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut app = App::default();
        let now = Instant::now();
        let old = app.next_fetch(now).unwrap();

        app.next_page();
        let new = app.next_fetch(now).unwrap();
        assert_ne!(old, new);

        assert!(!app.apply_page(old, page(&["stale"])));
        assert!(app.assets.is_empty());
        // La requête courante est toujours en attente
        assert!(app.is_loading());

        assert!(app.apply_page(new, page(&["fresh"])));
        assert_eq!(app.assets[0].id, "fresh");
    }

    #[test]
    fn test_failure_keeps_previous_assets() {
        let mut app = App::default();
        let now = Instant::now();
        let request = app.next_fetch(now).unwrap();
        app.apply_page(request, page(&["a", "b", "c"]));

        app.request_refresh();
        let again = app.next_fetch(now).unwrap();
        assert!(app.record_failure(again, "HTTP 429".to_string()));

        assert_eq!(app.assets.len(), 3);
        assert_eq!(app.error.as_deref(), Some("HTTP 429"));
        assert!(!app.is_loading());

        let request = app.next_fetch(now + Duration::from_secs(61)).unwrap();
        app.apply_page(request, page(&["a"]));
        assert!(app.error.is_none());
    }

    #[test]
    fn test_refresh_interval() {
        let mut app = App::new(ViewState::new(), Theme::Dark, Duration::from_secs(30));
        let start = Instant::now();
        let request = app.next_fetch(start).unwrap();
        app.apply_page(request, page(&["a"]));

        assert_eq!(app.next_fetch(start + Duration::from_secs(10)), None);
        assert_eq!(app.next_fetch(start + Duration::from_secs(30)), Some(request));
    }

    #[test]
    fn test_filter_input_resets_page_and_triggers_fetch() {
        let mut app = App::default();
        let now = Instant::now();
        app.view.set_page(3);
        let request = app.next_fetch(now).unwrap();
        app.apply_page(request, page(&["bitcoin", "ether"]));

        app.start_input(InputTarget::Search);
        for c in "bit".chars() {
            app.append_char(c);
        }
        app.submit_input();

        assert!(!app.is_in_input_mode());
        assert_eq!(app.view.pagination.page, 1);
        assert_eq!(app.next_fetch(now), Some(PageRequest { page: 1, per_page: 10 }));
    }

    #[test]
    fn test_non_numeric_input_clears_bound() {
        let mut app = App::default();
        app.apply_filter(FilterUpdate::new().price_min(Some(5.0)));

        app.start_input(InputTarget::PriceMin);
        assert_eq!(app.input_buffer, "5");
        app.input_buffer = "cinq".to_string();
        app.submit_input();

        assert_eq!(app.view.filter.price_min, None);
    }

    #[test]
    fn test_navigation_and_favorites() {
        let mut app = App::default();
        let request = app.next_fetch(Instant::now()).unwrap();
        app.apply_page(request, page(&["a", "b", "c"]));

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        app.toggle_selected_favorite();
        assert!(app.view.is_favorite("c"));

        app.toggle_show_only_favorites();
        assert_eq!(app.rows().len(), 1);
        assert_eq!(app.selected_asset().map(|a| a.id.as_str()), Some("c"));

        app.navigate_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_toggle_theme() {
        let mut app = App::default();
        assert_eq!(app.toggle_theme(), Theme::Dark);
        assert_eq!(app.toggle_theme(), Theme::Light);
    }
}
