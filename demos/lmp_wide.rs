use chrono::NaiveDate;
use nyiso::{flag_outliers, pivot_zones, Nyiso, NyisoError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), NyisoError> {
    env_logger::init();
    // show every zone column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");

    let client = Nyiso::new().await?;
    let prices = client
        .fetch_range()
        .dataset("lmp_dayahead")
        .start(NaiveDate::from_ymd_opt(2023, 11, 4).unwrap())
        .end(NaiveDate::from_ymd_opt(2023, 11, 6).unwrap())
        .call()
        .await?;

    let flagged = flag_outliers(&prices, &["lmp_total"])?;
    if let Ok(flags) = flagged.column("lmp_total_outlier") {
        let count = flags.bool()?.into_iter().filter(|f| *f == Some(true)).count();
        println!("Outlier prices: {}", count);
    }

    let wide = pivot_zones(&prices, "lmp_total")?;
    println!("{}", wide);

    Ok(())
}
