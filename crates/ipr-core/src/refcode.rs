//! # Reference Code Generator
//!
//! ```text
//! IPR/{PARTICULARS}/{CLIENT_CODE}/{round(CAPACITY_MW)}MW/{STATE_NAME}/{SITE_NAME}/{FY2}{CUM:03}/{INC:02}
//! ```
//!
//! A pure function of the five entry fields, the two-digit financial year,
//! and the two counter values. Categorical segments are upper-cased;
//! capacity is rounded half-up for display only. Counters are zero-padded
//! and widen past 999 / 99 instead of truncating.

use crate::entry::EntryFields;

/// Leading segment of every reference code.
pub const CODE_PREFIX: &str = "IPR";

/// Capacity as shown in the code: nearest integer, halves rounded up.
pub fn display_capacity(capacity_mw: f64) -> i64 {
    // f64::round rounds halves away from zero, which is half-up for the
    // strictly positive capacities the policy admits. The policy's upper
    // bound keeps the cast exact.
    capacity_mw.round() as i64
}

/// Compose the reference code.
pub fn generate(fields: &EntryFields, fy_short: &str, cumulative: u64, incremental: u64) -> String {
    format!(
        "{CODE_PREFIX}/{}/{}/{}MW/{}/{}/{fy_short}{cumulative:03}/{incremental:02}",
        fields.particulars.to_uppercase(),
        fields.client_code.to_uppercase(),
        display_capacity(fields.capacity_mw),
        fields.state_name.to_uppercase(),
        fields.site_name.to_uppercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(capacity_mw: f64) -> EntryFields {
        EntryFields {
            particulars: "TC".into(),
            client_code: "HFEX".into(),
            capacity_mw,
            state_name: "KA".into(),
            site_name: "SJPR".into(),
        }
    }

    #[test]
    fn test_canonical_example() {
        assert_eq!(
            generate(&fields(100.4), "26", 5, 1),
            "IPR/TC/HFEX/100MW/KA/SJPR/26005/01"
        );
    }

    #[test]
    fn test_halves_round_up() {
        assert_eq!(display_capacity(100.5), 101);
        assert_eq!(display_capacity(2.5), 3);
        assert_eq!(display_capacity(0.4), 0);
    }

    #[test]
    fn test_counters_widen_past_padding() {
        assert_eq!(
            generate(&fields(1.0), "27", 1234, 150),
            "IPR/TC/HFEX/1MW/KA/SJPR/271234/150"
        );
    }

    #[test]
    fn test_lowercase_segments_are_uppercased() {
        let f = EntryFields {
            particulars: "gc".into(),
            client_code: "adn".into(),
            capacity_mw: 49.6,
            state_name: "tn".into(),
            site_name: "grid".into(),
        };
        assert_eq!(generate(&f, "05", 12, 3), "IPR/GC/ADN/50MW/TN/GRID/05012/03");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_fields() -> impl Strategy<Value = EntryFields> {
        (
            "[A-Z]{1,8}",
            "[A-Z]{2,4}",
            0.01f64..100_000.0,
            "[A-Z]{2,4}",
            "[A-Z]{2,4}",
        )
            .prop_map(|(p, c, mw, st, si)| EntryFields {
                particulars: p,
                client_code: c,
                capacity_mw: mw,
                state_name: st,
                site_name: si,
            })
    }

    proptest! {
        /// Same inputs, same code, every time.
        #[test]
        fn generate_is_deterministic(
            f in arb_fields(),
            fy in 0u32..100,
            cum in 1u64..1_000_000,
            inc in 1u64..10_000,
        ) {
            let fy_short = format!("{fy:02}");
            let a = generate(&f, &fy_short, cum, inc);
            let b = generate(&f, &fy_short, cum, inc);
            prop_assert_eq!(a, b);
        }

        /// Eight slash-separated segments; the serial segment ends with the
        /// padded cumulative counter.
        #[test]
        fn generate_has_fixed_shape(
            f in arb_fields(),
            cum in 1u64..1_000_000,
            inc in 1u64..10_000,
        ) {
            let code = generate(&f, "26", cum, inc);
            let parts: Vec<&str> = code.split('/').collect();
            prop_assert_eq!(parts.len(), 8);
            prop_assert_eq!(parts[0], "IPR");
            prop_assert!(parts[3].ends_with("MW"));
            let padded = format!("{cum:03}");
            prop_assert_eq!(parts[6], format!("26{padded}"));
            prop_assert_eq!(parts[7], format!("{inc:02}"));
        }

        /// Distinct cumulative counters yield distinct codes.
        #[test]
        fn cumulative_counter_separates_codes(
            f in arb_fields(),
            a in 1u64..100_000,
            b in 1u64..100_000,
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(generate(&f, "26", a, 1), generate(&f, "26", b, 1));
        }
    }
}
