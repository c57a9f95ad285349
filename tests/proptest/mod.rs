//! Property-based tests for deterministic naming and eligibility
//!
//! These verify that:
//! 1. Encrypted snapshot names parse back to exactly the structured name
//!    that rendered them
//! 2. Name derivation is deterministic
//! 3. Replica and cluster-flavored identifiers are never eligible

use proptest::prelude::*;

use encryption_migrator::{EligibilityFilter, EncryptedSnapshotName, RunDate, SnapshotName};

fn run_date_strategy() -> impl Strategy<Value = RunDate> {
    (1970u32..2100u32, 1u32..=12u32, 1u32..=28u32).prop_map(|(y, m, d)| {
        RunDate::parse(&format!("{y:04}{m:02}{d:02}")).expect("generated stamp is valid")
    })
}

proptest! {
    #[test]
    fn encrypted_parse_inverts_render(
        base in "[a-z][a-z0-9-]{0,30}",
        run_date in run_date_strategy(),
    ) {
        let snapshot = SnapshotName::new(base.clone(), run_date);
        let rendered = snapshot.encrypted().to_string();
        let parsed = EncryptedSnapshotName::parse(&rendered).unwrap();
        prop_assert_eq!(parsed.base(), base.as_str());
        prop_assert_eq!(parsed.source(), &snapshot);
        prop_assert_eq!(parsed.to_string(), rendered);
    }

    #[test]
    fn name_derivation_is_deterministic(
        base in "[a-z][a-z0-9-]{0,30}",
        run_date in run_date_strategy(),
    ) {
        let first = SnapshotName::new(base.clone(), run_date.clone()).to_string();
        let second = SnapshotName::new(base, run_date).to_string();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn replica_and_cluster_ids_never_eligible(
        prefix in "[a-z]{1,10}",
        suffix in "[a-z0-9]{0,5}",
    ) {
        let filter = EligibilityFilter::default();
        let replica_id = format!("{prefix}-replica{suffix}");
        let aurora_id = format!("{prefix}-aurora{suffix}");
        let old_id = format!("{prefix}{suffix}-old");
        prop_assert!(!filter.is_eligible(&replica_id));
        prop_assert!(!filter.is_eligible(&aurora_id));
        prop_assert!(!filter.is_eligible(&old_id));
    }

    #[test]
    fn run_date_accepts_exactly_eight_digits(stamp in "[0-9]{8}") {
        prop_assert!(RunDate::parse(&stamp).is_ok());
    }

    #[test]
    fn run_date_rejects_other_lengths(stamp in "[0-9]{0,7}|[0-9]{9,12}") {
        prop_assert!(RunDate::parse(&stamp).is_err());
    }
}
