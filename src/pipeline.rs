// ============================================================================
// Pipeline de dérivation
// ============================================================================
// Transforme la collection d'actifs + l'état de vue en lignes à afficher
//
//   assets ──► tri stable (SortConfig) ──► filtre (FilterPredicate, favoris) ──► lignes
//
// La pagination n'est pas appliquée ici : la page affichée est celle que la
// source de données a renvoyée, triée et filtrée sur place.
//
// CONCEPTS RUST :
// 1. sort_by est stable : à valeur égale, l'ordre d'entrée est conservé
// 2. Ordering::reverse() pour inverser le sens sans toucher aux valeurs absentes
// 3. Emprunts : derive_refs ne clone rien, derive clone seulement le résultat
// ============================================================================

use std::cmp::Ordering;

use crate::models::{AssetRecord, SortConfig, SortDirection, SortKey, ViewState};

/// Valeur d'une colonne pour un actif
#[derive(Debug, Clone, Copy)]
enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
}

/// Extrait la valeur triable (None si absente ou NaN)
fn sort_value(asset: &AssetRecord, key: SortKey) -> Option<SortValue<'_>> {
    let number = match key {
        SortKey::Name => return Some(SortValue::Text(&asset.name)),
        SortKey::Symbol => return Some(SortValue::Text(&asset.symbol)),
        SortKey::Rank => Some(f64::from(asset.rank)),
        SortKey::Price => Some(asset.price),
        SortKey::PercentChange1h => asset.percent_change_1h,
        SortKey::PercentChange24h => asset.percent_change_24h,
        SortKey::PercentChange7d => asset.percent_change_7d,
        SortKey::MarketCap => Some(asset.market_cap),
        SortKey::Volume24h => Some(asset.volume_24h),
        SortKey::CirculatingSupply => asset.circulating_supply,
        SortKey::MaxSupply => asset.max_supply,
    };
    number.filter(|n| !n.is_nan()).map(SortValue::Number)
}

/// Comparaison texte insensible à la casse, départagée par la chaîne brute
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_defined(a: SortValue<'_>, b: SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(x), SortValue::Text(y)) => collate(x, y),
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(&y),
        // Une colonne donnée a toujours le même type de valeur
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
    }
}

/// Compare deux actifs selon la configuration de tri
///
/// Les valeurs absentes passent toujours en dernier, quel que soit le sens.
pub fn compare_assets(a: &AssetRecord, b: &AssetRecord, sort: SortConfig) -> Ordering {
    match (sort_value(a, sort.key), sort_value(b, sort.key)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = compare_defined(x, y);
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

/// Vrai si l'actif satisfait toutes les conditions actives
pub fn matches(asset: &AssetRecord, state: &ViewState) -> bool {
    if state.show_only_favorites && !state.is_favorite(&asset.id) {
        return false;
    }

    let filter = &state.filter;

    if let Some(min) = filter.price_min {
        if asset.price < min {
            return false;
        }
    }
    if let Some(max) = filter.price_max {
        if asset.price > max {
            return false;
        }
    }

    // Une variation inconnue échoue dès que la borne est définie
    if let Some(min) = filter.percent_change_24h_min {
        match asset.percent_change_24h {
            Some(change) if change >= min => {}
            _ => return false,
        }
    }

    if let Some(term) = &filter.search_term {
        let term = term.to_lowercase();
        if !asset.name.to_lowercase().contains(&term)
            && !asset.symbol.to_lowercase().contains(&term)
        {
            return false;
        }
    }

    true
}

/// Lignes à afficher, par référence (aucun clone)
pub fn derive_refs<'a>(assets: &'a [AssetRecord], state: &ViewState) -> Vec<&'a AssetRecord> {
    let mut rows: Vec<&AssetRecord> = assets.iter().collect();
    rows.sort_by(|a, b| compare_assets(a, b, state.sort));
    rows.retain(|asset| matches(asset, state));
    rows
}

/// Lignes à afficher : sous-ensemble trié et filtré de `assets`
pub fn derive(assets: &[AssetRecord], state: &ViewState) -> Vec<AssetRecord> {
    derive_refs(assets, state).into_iter().cloned().collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterUpdate;

    fn asset(id: &str, rank: u32, name: &str, symbol: &str, price: f64) -> AssetRecord {
        AssetRecord::new(id, rank, name, symbol, price)
    }

    fn with_change(mut a: AssetRecord, change_24h: Option<f64>) -> AssetRecord {
        a.percent_change_24h = change_24h;
        a
    }

    fn ids(rows: &[AssetRecord]) -> Vec<&str> {
        rows.iter().map(|a| a.id.as_str()).collect()
    }

    fn sample() -> Vec<AssetRecord> {
        vec![
            with_change(asset("eth", 2, "Ethereum", "ETH", 3200.0), Some(-1.5)),
            with_change(asset("btc", 1, "Bitcoin", "BTC", 65000.0), Some(2.0)),
            with_change(asset("usdt", 3, "Tether", "USDT", 1.0), None),
            with_change(asset("wbtc", 15, "Wrapped Bitcoin", "WBTC", 64900.0), Some(1.9)),
            with_change(asset("doge", 8, "Dogecoin", "DOGE", 0.15), Some(8.4)),
        ]
    }

    #[test]
    fn test_default_state_sorts_by_rank() {
        let rows = derive(&sample(), &ViewState::new());
        assert_eq!(ids(&rows), vec!["btc", "eth", "usdt", "doge", "wbtc"]);
    }

    #[test]
    fn test_derive_is_idempotent_and_never_grows() {
        let assets = sample();
        let mut state = ViewState::new();
        state.set_sort(SortKey::Price);
        state.set_filter(FilterUpdate::new().price_min(Some(1.0)));

        let first = derive(&assets, &state);
        let second = derive(&assets, &state);
        assert_eq!(first, second);
        assert!(first.len() <= assets.len());
    }

    #[test]
    fn test_missing_values_sort_last_in_both_directions() {
        let assets = sample();
        let mut state = ViewState::new();

        state.set_sort(SortKey::PercentChange24h);
        let ascending = derive(&assets, &state);
        assert_eq!(ascending.last().map(|a| a.id.as_str()), Some("usdt"));

        state.set_sort(SortKey::PercentChange24h);
        assert_eq!(state.sort.direction, SortDirection::Descending);
        let descending = derive(&assets, &state);
        assert_eq!(descending.last().map(|a| a.id.as_str()), Some("usdt"));
    }

    #[test]
    fn test_flipping_direction_reverses_defined_values() {
        let assets = sample();
        let mut state = ViewState::new();
        state.set_sort(SortKey::PercentChange24h);
        let ascending: Vec<AssetRecord> = derive(&assets, &state)
            .into_iter()
            .filter(|a| a.percent_change_24h.is_some())
            .collect();

        state.set_sort(SortKey::PercentChange24h);
        let mut descending: Vec<AssetRecord> = derive(&assets, &state)
            .into_iter()
            .filter(|a| a.percent_change_24h.is_some())
            .collect();
        descending.reverse();

        assert_eq!(ids(&ascending), ids(&descending));
    }

    #[test]
    fn test_sort_is_stable_for_equal_and_missing_keys() {
        let capped = |id: &str, rank: u32, max: Option<f64>| {
            let mut a = asset(id, rank, id, id, 1.0);
            a.max_supply = max;
            a
        };
        let assets = vec![
            capped("a", 1, Some(5.0)),
            capped("b", 2, None),
            capped("c", 3, Some(5.0)),
            capped("d", 4, None),
        ];

        let mut state = ViewState::new();
        state.set_sort(SortKey::MaxSupply);
        assert_eq!(ids(&derive(&assets, &state)), vec!["a", "c", "b", "d"]);

        state.set_sort(SortKey::MaxSupply);
        assert_eq!(state.sort.direction, SortDirection::Descending);
        assert_eq!(ids(&derive(&assets, &state)), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_sort_by_symbol() {
        let mut state = ViewState::new();
        state.set_sort(SortKey::Symbol);
        assert_eq!(
            ids(&derive(&sample(), &state)),
            vec!["btc", "doge", "eth", "usdt", "wbtc"]
        );
    }

    #[test]
    fn test_text_sort_ignores_case() {
        let assets = vec![
            asset("a", 1, "bitcoin cash", "BCH", 400.0),
            asset("b", 2, "Avalanche", "AVAX", 30.0),
            asset("c", 3, "Cardano", "ADA", 0.5),
        ];
        let mut state = ViewState::new();
        state.set_sort(SortKey::Name);
        assert_eq!(ids(&derive(&assets, &state)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let assets = vec![
            asset("five", 1, "Five", "FIV", 5.0),
            asset("fifty", 2, "Fifty", "FIF", 50.0),
            asset("hundred", 3, "Hundred", "HUN", 100.0),
            asset("big", 4, "Big", "BIG", 150.0),
        ];
        let mut state = ViewState::new();
        state.set_filter(
            FilterUpdate::new()
                .price_min(Some(10.0))
                .price_max(Some(100.0)),
        );
        assert_eq!(ids(&derive(&assets, &state)), vec!["fifty", "hundred"]);
    }

    #[test]
    fn test_change_bound_excludes_missing_change() {
        let mut state = ViewState::new();
        state.set_filter(FilterUpdate::new().percent_change_24h_min(Some(0.0)));
        let rows = derive(&sample(), &state);
        assert_eq!(ids(&rows), vec!["btc", "doge", "wbtc"]);
    }

    #[test]
    fn test_search_matches_name_or_symbol() {
        let mut state = ViewState::new();
        state.set_filter(FilterUpdate::new().search_term("BIT"));
        assert_eq!(ids(&derive(&sample(), &state)), vec!["btc", "wbtc"]);

        state.set_filter(FilterUpdate::new().search_term("usd"));
        assert_eq!(ids(&derive(&sample(), &state)), vec!["usdt"]);
    }

    #[test]
    fn test_show_only_favorites() {
        let mut state = ViewState::new();
        state.toggle_favorite("doge");
        state.toggle_favorite("eth");

        state.set_show_only_favorites(true);
        assert_eq!(ids(&derive(&sample(), &state)), vec!["eth", "doge"]);

        state.set_show_only_favorites(false);
        assert_eq!(derive(&sample(), &state).len(), 5);
    }

    #[test]
    fn test_end_to_end_price_ascending() {
        let assets = vec![
            asset("b", 2, "B", "B", 150.0),
            asset("a", 1, "A", "A", 50.0),
        ];
        let mut state = ViewState::new();
        state.set_sort(SortKey::Price);
        let rows = derive(&assets, &state);
        assert_eq!(ids(&rows), vec!["a", "b"]);
    }

    #[test]
    fn test_derive_refs_borrows_input() {
        let assets = sample();
        let rows = derive_refs(&assets, &ViewState::new());
        assert!(std::ptr::eq(rows[0], &assets[1]));
    }
}
