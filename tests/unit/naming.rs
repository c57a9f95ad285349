//! Tests for deterministic name derivation

use encryption_migrator::naming::{
    renamed_original, replica_name, EncryptedSnapshotName, NameError, RunDate, SnapshotName,
};

mod run_date_tests {
    use super::*;

    #[test]
    fn test_parse_valid_stamp() {
        let date = RunDate::parse("20240115").unwrap();
        assert_eq!(date.as_str(), "20240115");
        assert_eq!(date.to_string(), "20240115");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(matches!(
            RunDate::parse("202401"),
            Err(NameError::InvalidRunDate(_))
        ));
        assert!(matches!(
            RunDate::parse("202401155"),
            Err(NameError::InvalidRunDate(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(RunDate::parse("2024-1-5").is_err());
        assert!(RunDate::parse("2024011a").is_err());
        assert!(RunDate::parse("").is_err());
    }

    #[test]
    fn test_today_is_a_valid_stamp() {
        let today = RunDate::today();
        assert!(RunDate::parse(today.as_str()).is_ok());
    }
}

mod snapshot_name_tests {
    use super::*;

    fn run_date() -> RunDate {
        RunDate::parse("20240115").unwrap()
    }

    #[test]
    fn test_render_base_and_date() {
        let name = SnapshotName::new("orders-db", run_date());
        assert_eq!(name.to_string(), "orders-db-20240115");
        assert_eq!(name.base(), "orders-db");
        assert_eq!(name.run_date().as_str(), "20240115");
    }

    #[test]
    fn test_encrypted_render() {
        let name = SnapshotName::new("orders-db", run_date());
        assert_eq!(name.encrypted().to_string(), "orders-db-20240115-encrypted");
    }

    #[test]
    fn test_encrypted_parse_inverts_render() {
        let name = SnapshotName::new("orders-db", run_date());
        let parsed = EncryptedSnapshotName::parse("orders-db-20240115-encrypted").unwrap();
        assert_eq!(parsed.base(), "orders-db");
        assert_eq!(parsed.source(), &name);
    }

    #[test]
    fn test_parse_base_with_hyphens_and_digits() {
        let parsed = EncryptedSnapshotName::parse("app-db-2-west-20240115-encrypted").unwrap();
        assert_eq!(parsed.base(), "app-db-2-west");
        assert_eq!(parsed.source().run_date().as_str(), "20240115");
    }

    #[test]
    fn test_parse_rejects_missing_marker() {
        assert!(matches!(
            EncryptedSnapshotName::parse("orders-db-20240115"),
            Err(NameError::NotEncrypted(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_date_stamp() {
        assert!(EncryptedSnapshotName::parse("orders-db-2024-encrypted").is_err());
        assert!(EncryptedSnapshotName::parse("orders-db-encrypted").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_base() {
        assert!(EncryptedSnapshotName::parse("-20240115-encrypted").is_err());
    }
}

mod derived_name_tests {
    use super::*;

    #[test]
    fn test_renamed_original() {
        assert_eq!(renamed_original("orders-db"), "orders-db-old");
    }

    #[test]
    fn test_replica_name() {
        assert_eq!(replica_name("orders-db"), "orders-db-replica");
    }
}
