// ============================================================================
// Structure : ViewState
// ============================================================================
// État de la vue du tableau : tri, filtres, favoris et pagination
//
// CONCEPTS RUST :
// 1. Enum fermé (SortKey) au lieu d'un accès dynamique aux champs
// 2. Option<Option<T>> : "champ absent" vs "contrainte effacée" dans un merge
// 3. Méthodes &mut self : seules les opérations du store modifient l'état
//
// PATTERN : même principe que App (Application State)
// - Tous les champs sont lus librement
// - Toutes les modifications passent par les méthodes
// ============================================================================

use std::collections::HashSet;

// ============================================================================
// Tri
// ============================================================================

/// Colonnes triables du tableau
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Rank,
    Name,
    Symbol,
    Price,
    PercentChange1h,
    PercentChange24h,
    PercentChange7d,
    MarketCap,
    Volume24h,
    CirculatingSupply,
    MaxSupply,
}

impl SortKey {
    /// Retourne le label court pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Rank => "#",
            SortKey::Name => "Name",
            SortKey::Symbol => "Symbol",
            SortKey::Price => "Price",
            SortKey::PercentChange1h => "1h %",
            SortKey::PercentChange24h => "24h %",
            SortKey::PercentChange7d => "7d %",
            SortKey::MarketCap => "Market Cap",
            SortKey::Volume24h => "Volume(24h)",
            SortKey::CirculatingSupply => "Circulating Supply",
            SortKey::MaxSupply => "Max Supply",
        }
    }
}

/// Sens du tri
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Inverse le sens
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Configuration du tri : colonne + sens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Rank,
            direction: SortDirection::Ascending,
        }
    }
}

// ============================================================================
// Filtres
// ============================================================================

/// Prédicat de filtrage (toutes les conditions sont combinées en ET)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterPredicate {
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub percent_change_24h_min: Option<f64>,
    /// Terme de recherche (insensible à la casse, sur le nom ou le symbole)
    pub search_term: Option<String>,
}

impl FilterPredicate {
    /// Vrai si aucune contrainte n'est active
    pub fn is_empty(&self) -> bool {
        self.price_min.is_none()
            && self.price_max.is_none()
            && self.percent_change_24h_min.is_none()
            && self.search_term.is_none()
    }
}

/// Mise à jour partielle du prédicat
///
/// CONCEPT RUST : Option<Option<T>>
/// - None : le champ n'est pas touché par le merge
/// - Some(None) : la contrainte est effacée
/// - Some(Some(v)) : la contrainte vaut v
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterUpdate {
    pub price_min: Option<Option<f64>>,
    pub price_max: Option<Option<f64>>,
    pub percent_change_24h_min: Option<Option<f64>>,
    pub search_term: Option<Option<String>>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price_min(mut self, value: Option<f64>) -> Self {
        self.price_min = Some(value.filter(|v| v.is_finite()));
        self
    }

    pub fn price_max(mut self, value: Option<f64>) -> Self {
        self.price_max = Some(value.filter(|v| v.is_finite()));
        self
    }

    pub fn percent_change_24h_min(mut self, value: Option<f64>) -> Self {
        self.percent_change_24h_min = Some(value.filter(|v| v.is_finite()));
        self
    }

    /// Terme de recherche (une chaîne vide efface la recherche)
    pub fn search_term(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search_term = Some(if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        });
        self
    }

    /// Borne de prix minimale saisie par l'utilisateur
    pub fn price_min_input(self, raw: &str) -> Self {
        self.price_min(parse_bound(raw))
    }

    pub fn price_max_input(self, raw: &str) -> Self {
        self.price_max(parse_bound(raw))
    }

    pub fn percent_change_24h_min_input(self, raw: &str) -> Self {
        self.percent_change_24h_min(parse_bound(raw))
    }
}

/// Convertit une saisie utilisateur en borne numérique
///
/// Une saisie vide, non numérique ou non finie signifie "pas de contrainte".
pub fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

// ============================================================================
// Pagination
// ============================================================================

/// Tailles de page autorisées
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    Five,
    #[default]
    Ten,
    TwentyFive,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Five,
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
    ];

    /// Nombre de lignes par page
    pub fn count(&self) -> u32 {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
        }
    }

    /// Retourne la taille correspondante, ou None hors de l'ensemble autorisé
    pub fn from_count(count: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.count() == count)
    }

    /// Taille suivante (5 → 10 → 25 → 50 → 5)
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Taille précédente (50 → 25 → 10 → 5 → 50)
    pub fn previous(&self) -> Self {
        let index = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Curseur de pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page courante (>= 1)
    pub page: u32,
    pub page_size: PageSize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

/// Requête de page envoyée à la source de données
///
/// Sert aussi d'étiquette pour écarter les réponses obsolètes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

// ============================================================================
// ViewState
// ============================================================================

/// État de la vue, possédé par App
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub sort: SortConfig,
    pub filter: FilterPredicate,
    pub favorites: HashSet<String>,
    pub show_only_favorites: bool,
    pub pagination: Pagination,
}

impl ViewState {
    /// État par défaut : rang croissant, aucun filtre, page 1
    pub fn new() -> Self {
        Self::default()
    }

    /// État par défaut avec une taille de page donnée (config)
    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            pagination: Pagination { page: 1, page_size },
            ..Self::default()
        }
    }

    /// Trie par `key` ; la même colonne inverse le sens
    pub fn set_sort(&mut self, key: SortKey) {
        if self.sort.key == key {
            self.sort.direction = self.sort.direction.flipped();
        } else {
            self.sort = SortConfig {
                key,
                direction: SortDirection::Ascending,
            };
        }
    }

    /// Fusionne une mise à jour partielle du filtre et revient à la page 1
    pub fn set_filter(&mut self, update: FilterUpdate) {
        if let Some(value) = update.price_min {
            self.filter.price_min = value;
        }
        if let Some(value) = update.price_max {
            self.filter.price_max = value;
        }
        if let Some(value) = update.percent_change_24h_min {
            self.filter.percent_change_24h_min = value;
        }
        if let Some(value) = update.search_term {
            self.filter.search_term = value;
        }
        self.pagination.page = 1;
    }

    /// Ajoute ou retire un favori
    pub fn toggle_favorite(&mut self, id: &str) {
        if !self.favorites.remove(id) {
            self.favorites.insert(id.to_string());
        }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn set_show_only_favorites(&mut self, enabled: bool) {
        self.show_only_favorites = enabled;
    }

    /// Efface tous les filtres (y compris "favoris seulement") et revient à la page 1
    pub fn reset_filters(&mut self) {
        self.filter = FilterPredicate::default();
        self.show_only_favorites = false;
        self.pagination.page = 1;
    }

    /// Change de page ; une valeur inférieure à 1 est ramenée à 1
    pub fn set_page(&mut self, page: u32) {
        self.pagination.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.pagination.page.saturating_add(1));
    }

    /// Page précédente (sans effet sur la page 1)
    pub fn previous_page(&mut self) {
        self.set_page(self.pagination.page.saturating_sub(1));
    }

    /// Change la taille de page et revient à la page 1
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.pagination.page_size = page_size;
        self.pagination.page = 1;
    }

    /// Requête correspondant à la pagination courante
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.pagination.page,
            per_page: self.pagination.page_size.count(),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ViewState::new();
        assert_eq!(state.sort.key, SortKey::Rank);
        assert_eq!(state.sort.direction, SortDirection::Ascending);
        assert!(state.filter.is_empty());
        assert!(!state.show_only_favorites);
        assert_eq!(state.page_request(), PageRequest { page: 1, per_page: 10 });
    }

    #[test]
    fn test_set_sort_same_key_flips() {
        let mut state = ViewState::new();
        state.set_sort(SortKey::Rank);
        assert_eq!(state.sort.direction, SortDirection::Descending);
        state.set_sort(SortKey::Rank);
        assert_eq!(state.sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_set_sort_new_key_resets_to_ascending() {
        let mut state = ViewState::new();
        state.set_sort(SortKey::Price);
        state.set_sort(SortKey::Price);
        assert_eq!(state.sort.direction, SortDirection::Descending);

        state.set_sort(SortKey::Name);
        assert_eq!(state.sort.key, SortKey::Name);
        assert_eq!(state.sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_set_filter_merges_and_resets_page() {
        let mut state = ViewState::new();
        state.set_page(3);

        state.set_filter(FilterUpdate::new().search_term("bit"));
        assert_eq!(state.pagination.page, 1);
        assert_eq!(state.filter.search_term.as_deref(), Some("bit"));

        state.set_filter(FilterUpdate::new().price_min(Some(10.0)));
        assert_eq!(state.filter.price_min, Some(10.0));
        // Le terme de recherche n'est pas touché
        assert_eq!(state.filter.search_term.as_deref(), Some("bit"));
    }

    #[test]
    fn test_invalid_filter_input_means_no_constraint() {
        let mut state = ViewState::new();
        state.set_filter(FilterUpdate::new().price_min_input("12.5"));
        assert_eq!(state.filter.price_min, Some(12.5));

        state.set_filter(FilterUpdate::new().price_min_input("douze"));
        assert_eq!(state.filter.price_min, None);

        state.set_filter(FilterUpdate::new().price_max_input("NaN"));
        assert_eq!(state.filter.price_max, None);

        state.set_filter(FilterUpdate::new().search_term("   "));
        assert_eq!(state.filter.search_term, None);
    }

    #[test]
    fn test_toggle_favorite_twice_is_noop() {
        let mut state = ViewState::new();
        state.toggle_favorite("ethereum");
        let before = state.favorites.clone();

        state.toggle_favorite("bitcoin");
        assert!(state.is_favorite("bitcoin"));
        state.toggle_favorite("bitcoin");

        assert_eq!(state.favorites, before);
    }

    #[test]
    fn test_reset_filters() {
        let mut state = ViewState::new();
        state.set_filter(
            FilterUpdate::new()
                .price_min(Some(1.0))
                .percent_change_24h_min(Some(-5.0)),
        );
        state.set_show_only_favorites(true);
        state.toggle_favorite("bitcoin");
        state.set_page(4);

        state.reset_filters();
        assert!(state.filter.is_empty());
        assert!(!state.show_only_favorites);
        assert_eq!(state.pagination.page, 1);
        // Les favoris eux-mêmes sont conservés
        assert!(state.is_favorite("bitcoin"));
    }

    #[test]
    fn test_set_page_clamps_to_one() {
        let mut state = ViewState::new();
        state.set_page(0);
        assert_eq!(state.pagination.page, 1);

        state.previous_page();
        assert_eq!(state.pagination.page, 1);

        state.next_page();
        state.next_page();
        assert_eq!(state.pagination.page, 3);
    }

    #[test]
    fn test_set_page_size_resets_page() {
        let mut state = ViewState::new();
        state.set_page(5);
        state.set_page_size(PageSize::Fifty);
        assert_eq!(state.page_request(), PageRequest { page: 1, per_page: 50 });
    }

    #[test]
    fn test_page_size_from_count() {
        assert_eq!(PageSize::from_count(25), Some(PageSize::TwentyFive));
        assert_eq!(PageSize::from_count(7), None);
        assert_eq!(PageSize::Fifty.next(), PageSize::Five);
        assert_eq!(PageSize::Five.previous(), PageSize::Fifty);
    }
}
