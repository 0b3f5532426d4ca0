// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : traduire une touche en action
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

use crate::app::InputTarget;
use crate::models::SortKey;

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement, résultats du worker)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus tick_rate
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // Sur certains OS, on reçoit Press ET Release : on garde Press
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

// ============================================================================
// Helpers : convertir KeyEvent en action
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// 'q' : quitter (two-step)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    )
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    )
}

/// 'f' : ajouter/retirer la ligne sélectionnée des favoris
pub fn is_favorite_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('f')))
}

/// 'F' : n'afficher que les favoris
pub fn is_favorites_only_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('F')))
}

/// 'x' : effacer les filtres
pub fn is_reset_filters_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('x') | KeyCode::Char('X')))
}

/// 'n' ou flèche droite : page suivante
pub fn is_next_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right | KeyCode::Char('n')))
}

/// 'b' ou flèche gauche : page précédente
pub fn is_previous_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left | KeyCode::Char('b')))
}

/// '+' : taille de page suivante
pub fn is_larger_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('+') | KeyCode::Char('=')))
}

/// '-' : taille de page précédente
pub fn is_smaller_page_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('-')))
}

/// 't' : basculer le thème
pub fn is_theme_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('t') | KeyCode::Char('T')))
}

/// 'r' : rafraîchir maintenant
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// Chiffres 1 à 9 : trier par colonne (même ordre que le tableau)
/// - '0' : offre maximale, 's' : symbole (colonnes sans en-tête dédié)
pub fn sort_key_from_event(event: &Event) -> Option<SortKey> {
    match key_code(event)? {
        KeyCode::Char('1') => Some(SortKey::Rank),
        KeyCode::Char('2') => Some(SortKey::Name),
        KeyCode::Char('3') => Some(SortKey::Price),
        KeyCode::Char('4') => Some(SortKey::PercentChange1h),
        KeyCode::Char('5') => Some(SortKey::PercentChange24h),
        KeyCode::Char('6') => Some(SortKey::PercentChange7d),
        KeyCode::Char('7') => Some(SortKey::MarketCap),
        KeyCode::Char('8') => Some(SortKey::Volume24h),
        KeyCode::Char('9') => Some(SortKey::CirculatingSupply),
        KeyCode::Char('0') => Some(SortKey::MaxSupply),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(SortKey::Symbol),
        _ => None,
    }
}

/// Touches qui ouvrent la saisie d'un filtre
/// - '/' : recherche
/// - 'm' / 'M' : prix min / max
/// - 'c' : variation 24h minimale
pub fn input_target_from_event(event: &Event) -> Option<InputTarget> {
    match key_code(event)? {
        KeyCode::Char('/') => Some(InputTarget::Search),
        KeyCode::Char('m') => Some(InputTarget::PriceMin),
        KeyCode::Char('M') => Some(InputTarget::PriceMax),
        KeyCode::Char('c') => Some(InputTarget::Change24hMin),
        _ => None,
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event)? {
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(sort_key_from_event(&key(KeyCode::Char('3'))), Some(SortKey::Price));
        assert_eq!(sort_key_from_event(&key(KeyCode::Char('0'))), Some(SortKey::MaxSupply));
        assert_eq!(sort_key_from_event(&key(KeyCode::Char('s'))), Some(SortKey::Symbol));
        assert_eq!(sort_key_from_event(&key(KeyCode::Char('a'))), None);
        assert_eq!(sort_key_from_event(&Event::Tick), None);
    }

    #[test]
    fn test_favorite_keys_are_case_sensitive() {
        assert!(is_favorite_event(&key(KeyCode::Char('f'))));
        assert!(!is_favorite_event(&key(KeyCode::Char('F'))));
        assert!(is_favorites_only_event(&key(KeyCode::Char('F'))));
    }

    #[test]
    fn test_input_targets() {
        assert_eq!(
            input_target_from_event(&key(KeyCode::Char('/'))),
            Some(InputTarget::Search)
        );
        assert_eq!(
            input_target_from_event(&key(KeyCode::Char('M'))),
            Some(InputTarget::PriceMax)
        );
        assert_eq!(get_char_from_event(&key(KeyCode::Enter)), None);
    }
}
