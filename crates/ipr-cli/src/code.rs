//! # Code Subcommand
//!
//! Previews the reference code the registry would generate for a set of
//! field values and counter positions. Values are normalised and checked
//! against the field-length policy exactly as on create; vocabulary
//! membership is not checked.

use anyhow::{bail, Result};
use clap::Args;
use ipr_core::{EntryInput, FinancialYearClock, ValidationError};

/// Arguments for the `ipr code` subcommand.
#[derive(Args, Debug)]
pub struct CodeArgs {
    #[arg(long)]
    pub particulars: String,

    #[arg(long)]
    pub client_code: String,

    /// Capacity in MW; rounded half-up in the code.
    #[arg(long)]
    pub capacity: f64,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub site: String,

    /// Two-digit FY code. Defaults to the current financial year.
    #[arg(long)]
    pub fy_short: Option<String>,

    /// Cumulative serial (SL_NO).
    #[arg(long, default_value_t = 1)]
    pub cumulative: u64,

    /// Position within the financial year.
    #[arg(long, default_value_t = 1)]
    pub incremental: u64,
}

/// Execute the code subcommand.
///
/// Returns exit code 0 on success, 1 when the values violate the policy.
pub fn run_code(args: &CodeArgs) -> Result<u8> {
    match preview(args) {
        Ok(code) => {
            println!("{code}");
            Ok(0)
        }
        Err(PreviewError::Invalid(err)) => {
            for violation in err.violations() {
                eprintln!("{}: {}", violation.field, violation.reason);
            }
            Ok(1)
        }
        Err(PreviewError::Usage(msg)) => bail!(msg),
    }
}

#[derive(Debug)]
enum PreviewError {
    Invalid(ValidationError),
    Usage(String),
}

fn preview(args: &CodeArgs) -> Result<String, PreviewError> {
    let fy_short = match &args.fy_short {
        Some(s) if s.len() == 2 && s.chars().all(|c| c.is_ascii_digit()) => s.clone(),
        Some(s) => {
            return Err(PreviewError::Usage(format!(
                "--fy-short must be two digits, got {s:?}"
            )))
        }
        None => FinancialYearClock::default().current().short(),
    };
    if args.cumulative == 0 || args.incremental == 0 {
        return Err(PreviewError::Usage(
            "--cumulative and --incremental start at 1".to_string(),
        ));
    }

    let input = EntryInput {
        particulars: args.particulars.clone(),
        client_code: args.client_code.clone(),
        capacity_mw: args.capacity,
        state_name: args.state.clone(),
        site_name: args.site.clone(),
        custom_fields: Vec::new(),
    };
    let fields = input.normalize();
    let violations = fields.policy_violations();
    if !violations.is_empty() {
        return Err(PreviewError::Invalid(ValidationError::new(violations)));
    }

    Ok(ipr_core::generate(
        &fields,
        &fy_short,
        args.cumulative,
        args.incremental,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CodeArgs {
        CodeArgs {
            particulars: "tc".into(),
            client_code: "hfex".into(),
            capacity: 99.5,
            state: "KA".into(),
            site: "SJPR".into(),
            fy_short: Some("26".into()),
            cumulative: 5,
            incremental: 1,
        }
    }

    #[test]
    fn preview_normalises_and_rounds() {
        assert_eq!(
            preview(&args()).unwrap(),
            "IPR/TC/HFEX/100MW/KA/SJPR/26005/01"
        );
    }

    #[test]
    fn preview_widens_large_counters() {
        let a = CodeArgs {
            cumulative: 1234,
            incremental: 100,
            ..args()
        };
        assert!(preview(&a).unwrap().ends_with("/261234/100"));
    }

    #[test]
    fn preview_reports_policy_violations() {
        let a = CodeArgs {
            client_code: "H".into(),
            capacity: 0.0,
            ..args()
        };
        let Err(PreviewError::Invalid(err)) = preview(&a) else {
            panic!("expected policy violations");
        };
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn preview_rejects_bad_fy_short() {
        let a = CodeArgs {
            fy_short: Some("2026".into()),
            ..args()
        };
        assert!(matches!(preview(&a), Err(PreviewError::Usage(_))));
    }
}
