// ============================================================================
// Sparkline texte
// ============================================================================
// Mini-graphique de tendance sur 7 jours, rendu avec les blocs Unicode
// ▁▂▃▄▅▆▇█ pour tenir dans une cellule de tableau
//
// CONCEPTS RUST :
// 1. chunks() : découpe une slice en groupes (un groupe = un caractère)
// 2. fold : min/max en une passe
// ============================================================================

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Réduit la série à `width` points (moyenne de chaque groupe)
fn resample(series: &[f64], width: usize) -> Vec<f64> {
    if series.len() <= width {
        return series.to_vec();
    }

    let chunk = series.len().div_ceil(width);
    series
        .chunks(chunk)
        .map(|group| group.iter().sum::<f64>() / group.len() as f64)
        .collect()
}

/// Rend la série en une chaîne d'au plus `width` caractères
///
/// Une série vide donne une chaîne vide ; une série plate donne une ligne
/// au niveau médian.
pub fn sparkline_text(series: &[f64], width: usize) -> String {
    let points: Vec<f64> = series.iter().copied().filter(|p| p.is_finite()).collect();
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let samples = resample(&points, width);
    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    let range = max - min;

    samples
        .iter()
        .map(|&p| {
            if range <= f64::EPSILON {
                LEVELS[LEVELS.len() / 2 - 1]
            } else {
                let ratio = (p - min) / range;
                let index = (ratio * (LEVELS.len() - 1) as f64).round() as usize;
                LEVELS[index.min(LEVELS.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        assert_eq!(sparkline_text(&[], 10), "");
        assert_eq!(sparkline_text(&[1.0, 2.0], 0), "");
    }

    #[test]
    fn test_rising_series() {
        let text = sparkline_text(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 8);
        assert_eq!(text, "▁▂▃▄▅▆▇█");
    }

    #[test]
    fn test_flat_series() {
        assert_eq!(sparkline_text(&[5.0, 5.0, 5.0], 10), "▄▄▄");
    }

    #[test]
    fn test_long_series_is_resampled() {
        let series: Vec<f64> = (0..168).map(|i| i as f64).collect();
        let text = sparkline_text(&series, 20);
        assert!(text.chars().count() <= 20);
        assert!(text.starts_with('▁'));
        assert!(text.ends_with('█'));
    }
}
