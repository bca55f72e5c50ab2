//! Property-based tests for typed round-trips.
//!
//! Every scalar kind must read back exactly what was written.

use std::collections::BTreeSet;

use proptest::prelude::*;
use typed_prefs::{MemoryBackend, MemoryProvider, Preferences, PreferencesBuilder};

fn open() -> Preferences<MemoryBackend> {
    PreferencesBuilder::new(MemoryProvider::new())
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn roundtrip_string(key in "[a-zA-Z0-9._-]{1,24}", value in ".*") {
        let prefs = open();
        prop_assert!(prefs.save_string(&key, &value));
        prop_assert_eq!(prefs.fetch_string(&key).unwrap(), Some(value));
    }

    #[test]
    fn roundtrip_integer(value in any::<i32>()) {
        let prefs = open();
        prop_assert!(prefs.save_integer("Integer", value));
        prop_assert_eq!(prefs.fetch_integer("Integer").unwrap(), value);
    }

    #[test]
    fn roundtrip_long(value in any::<i64>()) {
        let prefs = open();
        prop_assert!(prefs.save_long("Long", value));
        prop_assert_eq!(prefs.fetch_long("Long").unwrap(), value);
    }

    #[test]
    fn roundtrip_float(value in any::<f32>().prop_filter("NaN never compares equal", |f| !f.is_nan())) {
        let prefs = open();
        prop_assert!(prefs.save_float("Float", value));
        prop_assert_eq!(prefs.fetch_float("Float").unwrap().to_bits(), value.to_bits());
    }

    #[test]
    fn roundtrip_boolean(value in any::<bool>()) {
        let prefs = open();
        prop_assert!(prefs.save_boolean("Boolean", value));
        prop_assert_eq!(prefs.fetch_boolean("Boolean").unwrap(), value);
    }

    #[test]
    fn roundtrip_string_set(value in prop::collection::btree_set(".{0,12}", 0..8)) {
        let prefs = open();
        prop_assert!(prefs.save_string_set("Set", value.clone()));
        prop_assert_eq!(prefs.fetch_string_set("Set").unwrap(), value);
    }

    #[test]
    fn removed_keys_are_absent(keys in prop::collection::btree_set("[a-z]{1,8}", 1..10)) {
        let prefs = open();
        for key in &keys {
            prop_assert!(prefs.save_integer(key, 1));
        }
        prefs.remove_all().wait().unwrap();
        for key in &keys {
            prop_assert!(!prefs.contains(key).unwrap());
        }
        let empty: BTreeSet<String> = BTreeSet::new();
        prop_assert_eq!(prefs.keys().unwrap().into_iter().collect::<BTreeSet<_>>(), empty);
    }
}
