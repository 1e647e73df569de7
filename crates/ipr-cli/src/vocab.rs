//! # Vocab Subcommand
//!
//! Lists the system vocabulary every deployment is seeded with.

use anyhow::{Context, Result};
use clap::Args;
use ipr_core::seed::{SystemOption, SYSTEM_OPTIONS};
use ipr_core::Category;
use serde::Serialize;

/// Arguments for the `ipr vocab` subcommand.
#[derive(Args, Debug)]
pub struct VocabArgs {
    /// Restrict to one category (e.g. `STATE_NAME`).
    #[arg(long)]
    pub category: Option<String>,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Row {
    #[serde(rename = "type")]
    category: Category,
    value: &'static str,
    display_name: &'static str,
}

impl From<&SystemOption> for Row {
    fn from(o: &SystemOption) -> Self {
        Self {
            category: o.category,
            value: o.value,
            display_name: o.display_name,
        }
    }
}

/// Execute the vocab subcommand.
pub fn run_vocab(args: &VocabArgs) -> Result<u8> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .context("invalid --category")?;
    println!("{}", render(category, args.json)?);
    Ok(0)
}

fn render(category: Option<Category>, json: bool) -> Result<String> {
    let rows: Vec<Row> = SYSTEM_OPTIONS
        .iter()
        .filter(|o| category.map_or(true, |c| o.category == c))
        .map(Row::from)
        .collect();

    if json {
        return Ok(serde_json::to_string_pretty(&rows)?);
    }
    let lines: Vec<String> = rows
        .iter()
        .map(|r| format!("{:<12} {:<5} {}", r.category.as_str(), r.value, r.display_name))
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_seeded_option() {
        let out = render(None, false).unwrap();
        assert_eq!(out.lines().count(), SYSTEM_OPTIONS.len());
        assert!(out.contains("Karnataka"));
    }

    #[test]
    fn json_filters_by_category() {
        let out = render(Some(Category::ClientCode), true).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r["type"] == "CLIENT_CODE"));
        assert!(rows.iter().any(|r| r["value"] == "HFEX" && r["displayName"].is_string()));
    }
}
