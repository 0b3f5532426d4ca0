// ============================================================================
// Module : api
// ============================================================================
// Clients API pour récupérer les données de marché (CoinGecko)
// ============================================================================

pub mod coingecko;  // Client API CoinGecko

// Re-export des types principaux
pub use coingecko::{MarketClient, MarketPage, RecordError};
