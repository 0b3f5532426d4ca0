// ============================================================================
// Structure : AssetRecord
// ============================================================================
// Représente l'instantané de marché d'une cryptomonnaie (une ligne du tableau)
//
// CONCEPTS RUST :
// 1. Option<f64> : valeurs absentes (variation inconnue, offre illimitée)
// 2. Immutabilité : un AssetRecord n'est jamais modifié après création,
//    une nouvelle page remplace toute la collection
// ============================================================================

use serde::{Deserialize, Serialize};

/// Instantané de marché d'un actif
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Identifiant stable (ex: "bitcoin")
    pub id: String,

    /// Rang par capitalisation (>= 1, pas forcément contigu)
    pub rank: u32,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// Ticker en majuscules (ex: "BTC")
    pub symbol: String,

    /// URI du logo
    pub logo: String,

    /// Prix en USD (>= 0)
    pub price: f64,

    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,

    pub market_cap: f64,
    pub volume_24h: f64,

    pub circulating_supply: Option<f64>,

    /// Offre maximale (None = illimitée)
    pub max_supply: Option<f64>,

    /// Échantillons de prix récents pour la sparkline (peut être vide)
    pub sparkline: Vec<f64>,
}

impl AssetRecord {
    /// Crée un enregistrement minimal (les champs optionnels sont vides)
    pub fn new(
        id: impl Into<String>,
        rank: u32,
        name: impl Into<String>,
        symbol: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            rank,
            name: name.into(),
            symbol: symbol.into(),
            logo: String::new(),
            price,
            percent_change_1h: None,
            percent_change_24h: None,
            percent_change_7d: None,
            market_cap: 0.0,
            volume_24h: 0.0,
            circulating_supply: None,
            max_supply: None,
            sparkline: Vec::new(),
        }
    }

    /// Volume 24h exprimé en unités de l'actif (volume / prix)
    ///
    /// Heuristique d'affichage uniquement : un prix nul donne une valeur
    /// non finie, que `format_supply` affiche comme "N/A".
    pub fn turnover(&self) -> f64 {
        self.volume_24h / self.price
    }

    /// Pourcentage de l'offre maximale déjà en circulation (0 à 100)
    ///
    /// Un actif sans offre maximale affiche une barre pleine.
    pub fn supply_progress(&self) -> f64 {
        match (self.circulating_supply, self.max_supply) {
            (Some(circulating), Some(max)) if max > 0.0 => {
                (circulating / max * 100.0).clamp(0.0, 100.0)
            }
            (None, Some(_)) => 0.0,
            _ => 100.0,
        }
    }

    /// Retourne true si l'actif est en hausse sur 7 jours
    ///
    /// Sert à colorer la sparkline comme le prix 7d.
    pub fn is_up_7d(&self) -> bool {
        self.percent_change_7d.map(|c| c >= 0.0).unwrap_or(true)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_creation() {
        let asset = AssetRecord::new("bitcoin", 1, "Bitcoin", "BTC", 65000.0);
        assert_eq!(asset.id, "bitcoin");
        assert_eq!(asset.percent_change_24h, None);
        assert!(asset.sparkline.is_empty());
    }

    #[test]
    fn test_turnover_zero_price_is_not_finite() {
        let mut asset = AssetRecord::new("dead", 900, "Dead Coin", "DEAD", 0.0);
        asset.volume_24h = 1000.0;
        assert!(!asset.turnover().is_finite());

        asset.price = 2.0;
        assert_eq!(asset.turnover(), 500.0);
    }

    #[test]
    fn test_supply_progress() {
        let mut asset = AssetRecord::new("bitcoin", 1, "Bitcoin", "BTC", 65000.0);
        assert_eq!(asset.supply_progress(), 100.0);

        asset.circulating_supply = Some(10_500_000.0);
        asset.max_supply = Some(21_000_000.0);
        assert_eq!(asset.supply_progress(), 50.0);

        asset.circulating_supply = None;
        assert_eq!(asset.supply_progress(), 0.0);
    }
}
