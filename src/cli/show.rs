use super::ui;
use crate::core::config::AppConfig;
use crate::core::rates::rate_scale;
use crate::dashboard::{RateChange, current_rates};
use anyhow::Result;
use comfy_table::Cell;

/// Prints the latest stored rates with the change against the previous day.
pub fn run(config: &AppConfig) -> Result<()> {
    let store = super::open_store(config)?;
    let (latest, changes) = current_rates(&store)?;

    println!(
        "Rates on {} ({} per unit)\n",
        ui::style_text(&latest.date().to_string(), ui::StyleType::Title),
        config.home_currency
    );
    println!("{}", rates_table(&config.home_currency, &changes));
    Ok(())
}

fn rates_table(home_currency: &str, changes: &[RateChange]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(home_currency),
        ui::header_cell("Change"),
        ui::header_cell("Change (%)"),
    ]);

    for change in changes {
        let dp = rate_scale(change.rate) as usize;
        table.add_row(vec![
            Cell::new(&change.currency),
            ui::rate_cell(change.rate),
            change
                .change
                .map_or_else(ui::na_cell, |c| ui::change_cell(c, "", dp)),
            change
                .change_pct
                .map_or_else(ui::na_cell, |p| ui::change_cell(p, "%", 2)),
        ]);
    }
    table.to_string()
}
