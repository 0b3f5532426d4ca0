// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine le tableau de marché en utilisant les widgets de ratatui
//
//   ┌ Coinboard ──────────────────────────────────────────┐  header
//   │ Cryptocurrency Market  Updated: 14:32:05 · 10 assets │
//   ├──────────────────────────────────────────────────────┤
//   │ ★ #  Name  Price  1h %  24h %  7d % ...  7D Chart    │  tableau
//   ├──────────────────────────────────────────────────────┤
//   │ filtres actifs / raccourcis / saisie                 │  footer
//   └──────────────────────────────────────────────────────┘
//
// CONCEPTS RATATUI :
// 1. Table + TableState : lignes avec sélection
// 2. Layout : découpage de l'espace en zones
// 3. Style : couleurs issues de la Palette du thème
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::format::{
    format_currency, format_magnitude, format_percent, format_supply, format_updated_at,
    Direction as Trend, PercentChange,
};
use crate::models::{AssetRecord, SortKey};
use crate::ui::sparkline::sparkline_text;
use crate::ui::theme::Palette;

/// Largeur de la colonne sparkline, en caractères
const SPARKLINE_WIDTH: u16 = 24;

/// Colonnes du tableau : (titre, colonne de tri associée, largeur)
const COLUMNS: [(&str, Option<SortKey>, u16); 11] = [
    ("★", None, 2),
    ("#", Some(SortKey::Rank), 5),
    ("Name", Some(SortKey::Name), 22),
    ("Price", Some(SortKey::Price), 14),
    ("1h %", Some(SortKey::PercentChange1h), 9),
    ("24h %", Some(SortKey::PercentChange24h), 9),
    ("7d %", Some(SortKey::PercentChange7d), 9),
    ("Market Cap", Some(SortKey::MarketCap), 12),
    ("Volume(24h)", Some(SortKey::Volume24h), 24),
    ("Circulating Supply", Some(SortKey::CirculatingSupply), 34),
    ("7D Chart", None, SPARKLINE_WIDTH),
];

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme);
    let area = frame.size();

    // Fond du thème sur tout l'écran
    frame.render_widget(Block::default().style(palette.base()), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Tableau
            Constraint::Length(4), // Footer
        ])
        .split(area);

    render_header(frame, app, &palette, chunks[0]);
    render_table(frame, app, &palette, chunks[1]);

    if app.is_in_input_mode() {
        render_input_footer(frame, app, &palette, chunks[2]);
    } else {
        render_footer(frame, app, &palette, chunks[2]);
    }
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" Coinboard ")
        .title_alignment(Alignment::Center)
        .style(palette.base());

    let updated = app
        .updated_at
        .map(format_updated_at)
        .unwrap_or_else(|| "--:--:--".to_string());

    let mut spans = vec![
        Span::styled(
            "Cryptocurrency Market",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("   ⏱ Updated: {}", updated), Style::default().fg(palette.muted)),
        Span::styled(
            format!("  │  {} assets", app.rows().len()),
            Style::default().fg(palette.muted),
        ),
        Span::styled(format!("  │  {}", app.theme.label()), Style::default().fg(palette.muted)),
    ];

    if app.is_loading() {
        spans.push(Span::styled(
            "  ⟳ Chargement...",
            Style::default().fg(palette.accent),
        ));
    }

    if let Some(error) = &app.error {
        spans.push(Span::styled(
            format!("  ⚠ {}", error),
            Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tableau
// ============================================================================

fn render_table(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(format!(
            " 📊 Page {} · {} par page ",
            app.view.pagination.page,
            app.view.pagination.page_size.count()
        ))
        .style(palette.base());

    let rows = app.rows();

    // États vides : chargement initial, erreur sans données, aucun résultat
    if rows.is_empty() {
        let (title, hint, color) = if app.assets.is_empty() {
            match &app.error {
                Some(error) => ("Impossible de charger les données", error.as_str(), palette.error),
                None if app.is_loading() => (
                    "Chargement des données crypto...",
                    "Récupération des dernières informations de marché",
                    palette.accent,
                ),
                None => ("Aucune donnée", "Appuyez sur [r] pour rafraîchir", palette.muted),
            }
        } else if app.view.show_only_favorites {
            ("Aucun résultat", "Aucun favori pour l'instant.", palette.muted)
        } else {
            ("Aucun résultat", "Essayez d'ajuster les filtres.", palette.muted)
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(hint, Style::default().fg(palette.muted))),
        ];
        frame.render_widget(
            Paragraph::new(text).block(block).alignment(Alignment::Center),
            area,
        );
        return;
    }

    let header = Row::new(
        COLUMNS
            .iter()
            .map(|(title, key, _)| header_cell(app, palette, title, *key)),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let body: Vec<Row> = rows
        .iter()
        .map(|asset| asset_row(asset, app.view.is_favorite(&asset.id), palette))
        .collect();

    let widths: Vec<Constraint> = COLUMNS.iter().map(|(_, _, w)| Constraint::Length(*w)).collect();

    let table = Table::new(body, widths)
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(palette.highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(rows.len() - 1)));
    frame.render_stateful_widget(table, area, &mut state);
}

/// Titre de colonne, avec flèche si c'est la colonne de tri
fn header_cell<'a>(app: &App, palette: &Palette, title: &'a str, key: Option<SortKey>) -> Cell<'a> {
    match key {
        Some(key) if key == app.view.sort.key => Cell::from(Span::styled(
            format!("{} {}", title, app.view.sort.direction.arrow()),
            Style::default().fg(palette.accent),
        )),
        _ => Cell::from(Span::styled(title, Style::default().fg(palette.muted))),
    }
}

/// Style d'une variation selon son sens
fn percent_cell(change: PercentChange, palette: &Palette) -> Cell<'static> {
    let color = match change.direction() {
        Some(Trend::Up) => palette.up,
        Some(Trend::Down) => palette.down,
        None => palette.muted,
    };
    Cell::from(Span::styled(change.to_string(), Style::default().fg(color)))
}

/// Une ligne du tableau pour un actif
fn asset_row(asset: &AssetRecord, is_favorite: bool, palette: &Palette) -> Row<'static> {
    let star = if is_favorite {
        Span::styled("★", Style::default().fg(palette.favorite))
    } else {
        Span::styled("☆", Style::default().fg(palette.muted))
    };

    let name = Line::from(vec![
        Span::styled(asset.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(asset.symbol.clone(), Style::default().fg(palette.muted)),
    ]);

    let volume = format!(
        "{} ({})",
        format_magnitude(asset.volume_24h),
        format_supply(Some(asset.turnover()), &asset.symbol)
    );

    let supply = match asset.max_supply {
        Some(max) => format!(
            "{} of {} ({:.0}%)",
            format_supply(asset.circulating_supply, &asset.symbol),
            format_supply(Some(max), &asset.symbol),
            asset.supply_progress()
        ),
        None => format_supply(asset.circulating_supply, &asset.symbol),
    };

    let chart_color = if asset.is_up_7d() { palette.up } else { palette.down };
    let chart = sparkline_text(&asset.sparkline, SPARKLINE_WIDTH as usize);

    let cells = vec![
        Cell::from(star),
        Cell::from(asset.rank.to_string()),
        Cell::from(name),
        Cell::from(format_currency(asset.price)),
        percent_cell(format_percent(asset.percent_change_1h), palette),
        percent_cell(format_percent(asset.percent_change_24h), palette),
        percent_cell(format_percent(asset.percent_change_7d), palette),
        Cell::from(format_magnitude(asset.market_cap)),
        Cell::from(volume),
        Cell::from(supply),
        Cell::from(Span::styled(chart, Style::default().fg(chart_color))),
    ];

    let row = Row::new(cells);
    if is_favorite {
        row.style(Style::default().fg(palette.text).add_modifier(Modifier::ITALIC))
    } else {
        row
    }
}

// ============================================================================
// Footer : filtres actifs + raccourcis
// ============================================================================

/// Résumé des filtres actifs (ex: "price ≥ 10 · search \"bit\"")
fn filters_summary(app: &App) -> String {
    let filter = &app.view.filter;
    let mut parts = Vec::new();

    if app.view.show_only_favorites {
        parts.push("favorites only".to_string());
    }
    if let Some(min) = filter.price_min {
        parts.push(format!("price ≥ {}", min));
    }
    if let Some(max) = filter.price_max {
        parts.push(format!("price ≤ {}", max));
    }
    if let Some(min) = filter.percent_change_24h_min {
        parts.push(format!("24h ≥ {}%", min));
    }
    if let Some(term) = &filter.search_term {
        parts.push(format!("search \"{}\"", term));
    }

    if parts.is_empty() {
        "aucun filtre".to_string()
    } else {
        parts.join(" · ")
    }
}

fn render_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(palette.base());

    let status = Line::from(vec![
        Span::styled("Sort: ", Style::default().fg(palette.muted)),
        Span::raw(format!(
            "{} {}",
            app.view.sort.key.label(),
            app.view.sort.direction.arrow()
        )),
        Span::styled("   Filters: ", Style::default().fg(palette.muted)),
        Span::raw(filters_summary(app)),
    ]);

    let hint = palette.key_hint();
    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(palette.favorite).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(palette.error)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(palette.favorite).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", hint),
            Span::raw(" Quit  "),
            Span::styled("[↑↓]", hint),
            Span::raw(" Move  "),
            Span::styled("[0-9 s]", hint),
            Span::raw(" Sort  "),
            Span::styled("[f/F]", hint),
            Span::raw(" Fav  "),
            Span::styled("[/ m M c]", hint),
            Span::raw(" Filter  "),
            Span::styled("[x]", hint),
            Span::raw(" Reset  "),
            Span::styled("[←→]", hint),
            Span::raw(" Page  "),
            Span::styled("[+-]", hint),
            Span::raw(" Size  "),
            Span::styled("[t]", hint),
            Span::raw(" Theme  "),
            Span::styled("[r]", hint),
            Span::raw(" Refresh"),
        ])
    };

    let paragraph = Paragraph::new(vec![status, shortcuts])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie : prompt + buffer + curseur
fn render_input_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.up))
        .style(palette.base());

    let input_line = Line::from(vec![
        Span::styled(app.input_prompt(), palette.key_hint()),
        Span::raw(app.input_buffer.as_str()),
        Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let help_line = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(palette.up).add_modifier(Modifier::BOLD)),
        Span::raw(" Confirm  "),
        Span::styled("[ESC]", Style::default().fg(palette.down).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel  "),
        Span::styled("(vide = pas de contrainte)", Style::default().fg(palette.muted)),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterUpdate;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_filters_summary() {
        let mut app = App::default();
        assert_eq!(filters_summary(&app), "aucun filtre");

        app.apply_filter(FilterUpdate::new().price_min(Some(10.0)).search_term("bit"));
        assert_eq!(filters_summary(&app), "price ≥ 10 · search \"bit\"");
    }

    #[test]
    fn test_render_loading_state() {
        let mut app = App::default();
        app.next_fetch(std::time::Instant::now());

        let mut terminal = Terminal::new(TestBackend::new(200, 20)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("Chargement des données crypto"));
    }

    #[test]
    fn test_render_rows() {
        let mut app = App::default();
        let request = app.next_fetch(std::time::Instant::now()).unwrap();
        let mut btc = AssetRecord::new("bitcoin", 1, "Bitcoin", "BTC", 64231.5);
        btc.percent_change_24h = Some(2.5);
        btc.sparkline = vec![1.0, 2.0, 3.0];
        app.apply_page(
            request,
            crate::api::MarketPage {
                assets: vec![btc],
                updated_at: chrono::Utc::now(),
                dropped: 0,
            },
        );

        let mut terminal = Terminal::new(TestBackend::new(200, 20)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Bitcoin"));
        assert!(text.contains("$64,231.50"));
        assert!(text.contains("▲ 2.50%"));
    }
}
