// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère une page du classement des cryptomonnaies (/coins/markets)
// et la normalise en AssetRecord
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : requête HTTP non-bloquante (reqwest)
// 2. serde_json::Value : décodage enregistrement par enregistrement, pour
//    qu'un enregistrement invalide ne fasse pas échouer toute la page
// 3. thiserror : erreurs typées pour la validation (RecordError)
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::models::{AssetRecord, PageRequest};

// ============================================================================
// Structures pour parser la réponse JSON de CoinGecko
// ============================================================================
// Tous les champs sont optionnels : la validation se fait ensuite dans
// normalize_record, qui décide quels champs sont obligatoires
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawMarket {
    id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    market_cap_rank: Option<u32>,
    total_volume: Option<f64>,
    circulating_supply: Option<f64>,
    max_supply: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_1h_in_currency: Option<f64>,
    price_change_percentage_24h_in_currency: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
    sparkline_in_7d: Option<RawSparkline>,
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSparkline {
    #[serde(default)]
    price: Vec<Option<f64>>,
}

// ============================================================================
// Erreurs de validation
// ============================================================================

/// Enregistrement source inutilisable (il sera ignoré, pas la page)
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("champ obligatoire manquant : {0}")]
    MissingField(&'static str),

    #[error("valeur négative pour {0}")]
    Negative(&'static str),

    #[error("enregistrement illisible : {0}")]
    Decode(String),
}

/// Page de marché normalisée
#[derive(Debug, Clone, PartialEq)]
pub struct MarketPage {
    pub assets: Vec<AssetRecord>,

    /// Dernière mise à jour des données (la plus récente de la page)
    pub updated_at: DateTime<Utc>,

    /// Nombre d'enregistrements ignorés car invalides
    pub dropped: usize,
}

// ============================================================================
// Client
// ============================================================================

/// Client HTTP vers l'API de marché
///
/// CONCEPT : un seul reqwest::Client réutilisé (pool de connexions)
#[derive(Debug, Clone)]
pub struct MarketClient {
    client: reqwest::Client,
    base_url: String,
}

impl MarketClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.api_base_url, config.request_timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("coinboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Récupère une page du classement
    ///
    /// # Erreurs
    /// Réseau, timeout, statut HTTP non 2xx ou réponse qui n'est pas un
    /// tableau JSON. Les enregistrements invalides individuels ne sont pas
    /// des erreurs : ils sont ignorés et comptés dans `dropped`.
    #[instrument(skip(self), fields(page = request.page, per_page = request.per_page))]
    pub async fn fetch_page(&self, request: PageRequest) -> Result<MarketPage> {
        let url = build_markets_url(&self.base_url, request);
        debug!(url = %url, "Built CoinGecko markets URL");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Échec de la requête HTTP vers CoinGecko")?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(status = %status, "CoinGecko returned error status");
            anyhow::bail!("CoinGecko a retourné une erreur : HTTP {}", status);
        }

        let values: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Échec du parsing JSON de la réponse CoinGecko")?;

        let page = parse_markets(values, Utc::now());
        info!(
            assets = page.assets.len(),
            dropped = page.dropped,
            "Successfully fetched market page"
        );
        Ok(page)
    }
}

/// Construit l'URL de /coins/markets pour une page donnée
fn build_markets_url(base_url: &str, request: PageRequest) -> String {
    format!(
        "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page={}&sparkline=true&price_change_percentage=1h,24h,7d",
        base_url, request.per_page, request.page
    )
}

/// Normalise une réponse complète, en ignorant les enregistrements invalides
///
/// `fetched_at` sert d'horodatage si aucun enregistrement n'a de last_updated.
fn parse_markets(values: Vec<serde_json::Value>, fetched_at: DateTime<Utc>) -> MarketPage {
    let total = values.len();
    let mut assets = Vec::with_capacity(total);
    let mut updated_at: Option<DateTime<Utc>> = None;
    let mut dropped = 0;

    for value in values {
        let raw: RawMarket = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %RecordError::Decode(e.to_string()), "Dropping malformed record");
                dropped += 1;
                continue;
            }
        };

        let record_time = raw
            .last_updated
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        match normalize_record(raw) {
            Ok(asset) => {
                if let Some(t) = record_time {
                    updated_at = Some(updated_at.map_or(t, |current| current.max(t)));
                }
                assets.push(asset);
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed record");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, total, "Skipped records with missing or invalid data");
    }

    MarketPage {
        assets,
        updated_at: updated_at.unwrap_or(fetched_at),
        dropped,
    }
}

/// Convertit un enregistrement brut en AssetRecord
///
/// Obligatoires : id, symbol, name, current_price (>= 0), market_cap_rank (>= 1).
/// Une offre maximale inférieure à l'offre en circulation est ignorée
/// (l'actif est alors considéré sans plafond).
fn normalize_record(raw: RawMarket) -> Result<AssetRecord, RecordError> {
    let id = raw
        .id
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField("id"))?;
    let symbol = raw
        .symbol
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField("symbol"))?;
    let name = raw
        .name
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField("name"))?;
    let price = raw
        .current_price
        .ok_or(RecordError::MissingField("current_price"))?;
    let rank = raw
        .market_cap_rank
        .filter(|r| *r >= 1)
        .ok_or(RecordError::MissingField("market_cap_rank"))?;

    if price < 0.0 {
        return Err(RecordError::Negative("current_price"));
    }

    let circulating_supply = raw.circulating_supply.filter(|s| *s >= 0.0);
    let max_supply = match (circulating_supply, raw.max_supply.filter(|m| *m >= 0.0)) {
        (Some(circulating), Some(max)) if max < circulating => {
            debug!(
                id = %id,
                circulating,
                max,
                "Max supply below circulating supply, treating as uncapped"
            );
            None
        }
        (_, max) => max,
    };

    let sparkline = raw
        .sparkline_in_7d
        .map(|s| s.price.into_iter().flatten().filter(|p| p.is_finite()).collect())
        .unwrap_or_default();

    Ok(AssetRecord {
        id,
        rank,
        name,
        symbol: symbol.to_uppercase(),
        logo: raw.image.unwrap_or_default(),
        price,
        percent_change_1h: raw.price_change_percentage_1h_in_currency,
        percent_change_24h: raw
            .price_change_percentage_24h_in_currency
            .or(raw.price_change_percentage_24h),
        percent_change_7d: raw.price_change_percentage_7d_in_currency,
        market_cap: raw.market_cap.unwrap_or(0.0).max(0.0),
        volume_24h: raw.total_volume.unwrap_or(0.0).max(0.0),
        circulating_supply,
        max_supply,
        sparkline,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
