// ============================================================================
// Configuration et préférences
// ============================================================================
// - Config : paramètres de lancement (API, rafraîchissement, logs)
// - Preferences : thème clair/sombre, relu au démarrage et écrit à chaque bascule
//
// Fichiers (Linux) :
// - ~/.config/coinboard/config.json      (optionnel)
// - ~/.config/coinboard/preferences.json (créé au premier changement de thème)
//
// CONCEPTS RUST :
// 1. #[serde(default)] : les champs absents du JSON prennent la valeur par défaut
// 2. Result + Context (anyhow) : erreurs de fichier avec un message lisible
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::PageSize;

const APP_DIR: &str = "coinboard";
const CONFIG_FILE: &str = "config.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// Répertoire de configuration de l'application (ex: ~/.config/coinboard)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

// ============================================================================
// Config
// ============================================================================

/// Paramètres de lancement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL de base de l'API CoinGecko
    pub api_base_url: String,

    /// Intervalle de rafraîchissement automatique, en secondes
    pub refresh_interval_secs: u64,

    /// Timeout des requêtes HTTP, en secondes
    pub request_timeout_secs: u64,

    /// Nombre de lignes par page au démarrage (5, 10, 25 ou 50)
    pub default_page_size: u32,

    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.coingecko.com/api/v3".to_string(),
            refresh_interval_secs: 60,
            request_timeout_secs: 10,
            default_page_size: 10,
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl Config {
    /// Charge la config depuis le répertoire utilisateur, puis applique
    /// les variables d'environnement
    ///
    /// Un fichier absent ou illisible n'est pas une erreur : on garde les
    /// valeurs par défaut.
    pub fn load() -> Self {
        let mut config = match config_dir() {
            Some(dir) => Self::load_from(&dir.join(CONFIG_FILE)).unwrap_or_else(|e| {
                warn!(error = ?e, "Invalid config file, using defaults");
                Self::default()
            }),
            None => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.sanitize();
        config
    }

    /// Lit un fichier de config JSON (défauts si le fichier n'existe pas)
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Échec de la lecture de {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Config JSON invalide dans {}", path.display()))?;

        info!(?path, "Config loaded");
        Ok(config)
    }

    /// Surcharges par variables d'environnement
    ///
    /// - COINBOARD_API_URL : URL de base de l'API
    /// - COINBOARD_REFRESH_SECS : intervalle de rafraîchissement
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("COINBOARD_API_URL").filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = var("COINBOARD_REFRESH_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.refresh_interval_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid COINBOARD_REFRESH_SECS"),
            }
        }
    }

    /// Ramène les valeurs invalides aux défauts
    fn sanitize(&mut self) {
        let defaults = Self::default();

        if PageSize::from_count(self.default_page_size).is_none() {
            warn!(value = self.default_page_size, "Unsupported default_page_size, using 10");
            self.default_page_size = defaults.default_page_size;
        }
        if self.refresh_interval_secs == 0 {
            warn!("refresh_interval_secs must be positive, using default");
            self.refresh_interval_secs = defaults.refresh_interval_secs;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = defaults.request_timeout_secs;
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::from_count(self.default_page_size).unwrap_or_default()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Theme + Preferences
// ============================================================================

/// Thème de l'interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "☀ light",
            Theme::Dark => "☾ dark",
        }
    }
}

/// Préférence persistée : un simple drapeau clair/sombre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub dark_mode: bool,
}

impl Preferences {
    pub fn theme(&self) -> Theme {
        if self.dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn with_theme(theme: Theme) -> Self {
        Self {
            dark_mode: theme == Theme::Dark,
        }
    }
}

/// Stockage des préférences dans un fichier JSON
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
}

impl PreferenceStore {
    /// Stockage dans le répertoire de config utilisateur
    ///
    /// Sans répertoire de config, les préférences ne sont pas persistées.
    pub fn new() -> Self {
        Self {
            path: config_dir().map(|dir| dir.join(PREFERENCES_FILE)),
        }
    }

    /// Stockage à un chemin précis (tests)
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Lit les préférences (défaut : thème clair)
    pub fn load(&self) -> Preferences {
        let Some(path) = &self.path else {
            return Preferences::default();
        };

        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(?path, error = %e, "Unreadable preferences, using defaults");
                Preferences::default()
            }),
            Err(e) => {
                debug!(?path, error = %e, "No preferences file yet");
                Preferences::default()
            }
        }
    }

    /// Écrit les préférences sur disque
    pub fn save(&self, preferences: &Preferences) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Échec de la création du répertoire de configuration")?;
        }

        let content = serde_json::to_string_pretty(preferences)?;
        fs::write(path, content)
            .with_context(|| format!("Échec de l'écriture de {}", path.display()))?;

        debug!(?path, dark_mode = preferences.dark_mode, "Preferences saved");
        Ok(())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
