use chrono::NaiveDate;
use nyiso::{clean, resample_hourly, Nyiso, NyisoError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), NyisoError> {
    // RUST_LOG=info shows cache hits, retries and skipped periods
    env_logger::init();
    configure_polars_display();

    let client = Nyiso::new().await?;
    let raw = client
        .fetch_range_raw()
        .dataset("load_actual")
        .start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .end(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap())
        .call()
        .await?;
    println!("Raw rows: {}", raw.height());

    let load = clean(&raw, "load_actual", client.registry())?;
    let hourly = resample_hourly(&load, "load_mw", &["zone"])?;
    println!("{}", hourly);

    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
