pub mod analysis;
pub mod regression;
pub mod returns;

use capm_core::prices::PriceTable;
use tracing::info;

use crate::config::RunConfig;
use crate::input;

/// Load the price table named by the resolved config, or a JSON table piped
/// on stdin when no path is given.
pub fn load_table(config: &RunConfig) -> Result<PriceTable, Box<dyn std::error::Error>> {
    let table = if let Some(ref path) = config.data {
        if input::file::has_extension(path, "json") {
            let table: PriceTable = input::file::read_json(path)?;
            table.validate()?;
            table
        } else {
            input::csv_table::read_price_csv(path, config)?
        }
    } else if let Some(table) = input::stdin::read_stdin::<PriceTable>()? {
        table.validate()?;
        table
    } else {
        return Err("--input <prices.csv|prices.json> or a JSON table on stdin required".into());
    };
    info!(
        periods = table.len(),
        market = %table.market,
        stocks = table.stocks.len(),
        "price table ready"
    );
    Ok(table)
}
