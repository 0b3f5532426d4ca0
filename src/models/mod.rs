// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod asset;      // Instantané de marché d'un actif
pub mod view_state; // Tri, filtres, favoris, pagination

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use coinboard::models::asset::AssetRecord;
// On peut faire : use coinboard::models::AssetRecord;
pub use asset::AssetRecord;
pub use view_state::{
    FilterPredicate, FilterUpdate, PageRequest, PageSize, Pagination, SortConfig, SortDirection,
    SortKey, ViewState,
};
