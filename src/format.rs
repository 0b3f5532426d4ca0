// ============================================================================
// Formatage des valeurs de marché
// ============================================================================
// Fonctions pures qui transforment les nombres en texte affichable :
// prix, capitalisations, offres en circulation, variations en pourcentage
//
// CONCEPTS RUST :
// 1. Fonctions totales : aucune ne panique, les valeurs non finies donnent "N/A"
// 2. impl Display : PercentChange s'affiche directement avec format!("{}")
// ============================================================================

use std::fmt;

use chrono::{DateTime, Local, Utc};

/// Texte affiché quand une valeur est absente
pub const NOT_AVAILABLE: &str = "N/A";

/// Seuils des suffixes (inclusifs : 1e9 exactement donne "B")
const MAGNITUDE_UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Formate un prix en dollars US
///
/// - |valeur| < 1 : entre 4 et 6 décimales (ex: "$0.000123", "$0.5000")
/// - sinon : 2 décimales avec séparateurs de milliers (ex: "$64,231.50")
/// - le signe est conservé : "-$12.00"
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let abs = value.abs();
    let body = if abs < 1.0 {
        trim_fraction(format!("{:.6}", abs), 4)
    } else {
        group_thousands(&format!("{:.2}", abs))
    };

    format!("{}${}", sign_prefix(value, &body), body)
}

/// Formate un grand montant avec suffixe T/B/M/K (ex: "$1.23B")
///
/// En dessous de 1 000, affiche le montant simple à 2 décimales ("$999.00").
pub fn format_magnitude(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let body = scaled(value.abs());
    format!("{}${}", sign_prefix(value, &body), body)
}

/// Formate une quantité d'actif avec suffixe et unité (ex: "19.70M BTC")
///
/// Retourne "N/A" si la valeur est absente, nulle ou non finie
/// (par exemple un volume divisé par un prix nul).
pub fn format_supply(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => {
            let body = scaled(v.abs());
            format!("{}{} {}", sign_prefix(v, &body), body, unit)
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Sens d'une variation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
        }
    }
}

/// Variation en pourcentage prête à afficher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PercentChange {
    NotAvailable,
    Change {
        direction: Direction,
        /// Valeur absolue à 2 décimales, avec "%" (ex: "2.34%")
        magnitude: String,
    },
}

impl PercentChange {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            PercentChange::NotAvailable => None,
            PercentChange::Change { direction, .. } => Some(*direction),
        }
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentChange::NotAvailable => f.write_str(NOT_AVAILABLE),
            PercentChange::Change { direction, magnitude } => {
                write!(f, "{} {}", direction.arrow(), magnitude)
            }
        }
    }
}

/// Formate une variation : flèche selon le signe (>= 0 : hausse), valeur absolue
pub fn format_percent(value: Option<f64>) -> PercentChange {
    match value {
        Some(v) if !v.is_nan() => {
            let direction = if v >= 0.0 { Direction::Up } else { Direction::Down };
            PercentChange::Change {
                direction,
                magnitude: format!("{:.2}%", v.abs()),
            }
        }
        _ => PercentChange::NotAvailable,
    }
}

/// Heure locale de la dernière mise à jour (ex: "14:32:05")
pub fn format_updated_at(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

// ============================================================================
// Helpers
// ============================================================================

/// Applique le premier suffixe dont le seuil est atteint
fn scaled(abs: f64) -> String {
    MAGNITUDE_UNITS
        .iter()
        .find(|(threshold, _)| abs >= *threshold)
        .map(|(threshold, suffix)| format!("{:.2}{}", abs / threshold, suffix))
        .unwrap_or_else(|| format!("{:.2}", abs))
}

/// "-" seulement si la valeur arrondie n'est pas nulle
fn sign_prefix(value: f64, body: &str) -> &'static str {
    if value < 0.0 && body.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    }
}

/// Retire les zéros finaux en gardant au moins `min_digits` décimales
fn trim_fraction(mut text: String, min_digits: usize) -> String {
    let Some(dot) = text.find('.') else {
        return text;
    };
    while text.len() - dot - 1 > min_digits && text.ends_with('0') {
        text.pop();
    }
    text
}

/// Insère des virgules tous les 3 chiffres dans la partie entière
fn group_thousands(text: &str) -> String {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text, None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(64231.5), "$64,231.50");
        assert_eq!(format_currency(1.0), "$1.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(0.5), "$0.5000");
        assert_eq!(format_currency(0.000123), "$0.000123");
        assert_eq!(format_currency(0.12345678), "$0.123457");
    }

    #[test]
    fn test_format_currency_zero_and_negative() {
        assert_eq!(format_currency(0.0), "$0.0000");
        assert_eq!(format_currency(-0.0), "$0.0000");
        assert_eq!(format_currency(-12.0), "-$12.00");
        assert_eq!(format_currency(-0.25), "-$0.2500");
    }

    #[test]
    fn test_format_magnitude() {
        assert_eq!(format_magnitude(1_000_000_000.0), "$1.00B");
        assert_eq!(format_magnitude(999.0), "$999.00");
        assert_eq!(format_magnitude(1_000.0), "$1.00K");
        assert_eq!(format_magnitude(2_500_000.0), "$2.50M");
        assert_eq!(format_magnitude(1.5e12), "$1.50T");
        assert_eq!(format_magnitude(0.0), "$0.00");
        assert_eq!(format_magnitude(-3_000_000.0), "-$3.00M");
    }

    #[test]
    fn test_format_supply() {
        assert_eq!(format_supply(Some(19_700_000.0), "BTC"), "19.70M BTC");
        assert_eq!(format_supply(Some(21.0), "BTC"), "21.00 BTC");
        assert_eq!(format_supply(Some(0.0), "BTC"), NOT_AVAILABLE);
        assert_eq!(format_supply(None, "BTC"), NOT_AVAILABLE);
        assert_eq!(format_supply(Some(f64::INFINITY), "BTC"), NOT_AVAILABLE);
        assert_eq!(format_supply(Some(f64::NAN), "BTC"), NOT_AVAILABLE);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(None), PercentChange::NotAvailable);
        assert_eq!(format_percent(Some(2.346)).to_string(), "▲ 2.35%");
        assert_eq!(format_percent(Some(-1.0)).to_string(), "▼ 1.00%");
        assert_eq!(format_percent(Some(0.0)).direction(), Some(Direction::Up));
        assert_eq!(format_percent(None).to_string(), "N/A");
    }

    #[test]
    fn test_format_updated_at_shape() {
        let text = format_updated_at(Utc::now());
        assert_eq!(text.len(), 8);
        assert_eq!(text.matches(':').count(), 2);
    }
}
