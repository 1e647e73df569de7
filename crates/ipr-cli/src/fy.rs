//! # FY Subcommand
//!
//! Prints the April–March financial year containing a date, with the short
//! code and counter key used for reference codes.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use ipr_core::{FinancialYear, FinancialYearClock};

/// Arguments for the `ipr fy` subcommand.
#[derive(Args, Debug)]
pub struct FyArgs {
    /// Local date, `YYYY-MM-DD`. Defaults to today in IST.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the fy subcommand.
pub fn run_fy(args: &FyArgs) -> Result<u8> {
    let date = args
        .date
        .unwrap_or_else(|| FinancialYearClock::default().local_date(chrono::Utc::now()));
    println!("{}", render(date, args.json)?);
    Ok(0)
}

fn render(date: NaiveDate, json: bool) -> Result<String> {
    let fy = FinancialYear::for_date(date);
    let (start, end) = fy
        .range()
        .ok_or_else(|| anyhow::anyhow!("{date} is outside the supported date range"))?;
    tracing::debug!(%date, fy = %fy, "resolved financial year");

    if json {
        let value = serde_json::json!({
            "date": date,
            "year": fy.start_year(),
            "label": fy.to_string(),
            "short": fy.short(),
            "counter_key": fy.counter_key(),
            "start": start,
            "end": end,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(format!(
            "{fy} ({start} to {end})\nshort: {}\ncounter: {}",
            fy.short(),
            fy.counter_key()
        ))
    }
}
