// ============================================================================
// Coinboard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;      // Client CoinGecko et normalisation
pub mod app;      // État de l'application
pub mod config;   // Configuration et préférences
pub mod format;   // Formatage des montants, pourcentages, dates
pub mod models;   // Structures de données
pub mod pipeline; // Tri + filtre des lignes affichées
pub mod ui;       // Interface utilisateur
