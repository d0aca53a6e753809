use crate::signals::{Category, Direction, SignalRow};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};

fn label_cell(label: Option<Direction>) -> Cell {
    let cell = match label {
        Some(Direction::Up) => Cell::new("▲ Up").fg(Color::Rgb { r: 0, g: 200, b: 0 }),
        Some(Direction::Down) => Cell::new("▼ Down").fg(Color::Rgb { r: 220, g: 50, b: 50 }),
        None => Cell::new("-").fg(Color::DarkGrey),
    };
    cell.set_alignment(CellAlignment::Center)
}

/// One line per retained signal row, newest date first.
pub fn render_signal_table(rows: &[SignalRow]) -> String {
    let mut sorted: Vec<&SignalRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.instrument_name.cmp(&b.instrument_name))
    });

    let mut header = vec![
        Cell::new("Date").add_attribute(Attribute::Bold),
        Cell::new("Instrument").add_attribute(Attribute::Bold),
        Cell::new("Ticker").add_attribute(Attribute::Bold),
    ];
    header.extend(
        Category::ALL
            .iter()
            .map(|c| Cell::new(c.name()).add_attribute(Attribute::Bold)),
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for row in sorted {
        let mut cells = vec![
            Cell::new(row.date.format("%Y-%m-%d")).fg(Color::DarkGrey),
            Cell::new(&row.instrument_name).fg(Color::Rgb { r: 0, g: 255, b: 255 }),
            Cell::new(&row.instrument_id),
        ];
        cells.extend(Category::ALL.iter().map(|c| label_cell(row.labels.get(*c))));
        table.add_row(cells);
    }

    table.to_string()
}
