//! Property-based tests for key generation and URL round trips.

use proptest::prelude::*;

use super::key::{KeyGenerator, RandomIds, split_filename};
use super::mock::{FixedClock, MockClient};
use super::upload::size_in_kb;
use super::urls::{public_url, resolve_key};

/// Filename stems as browsers send them, spaces and punctuation included.
fn stem_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _()+,-]{1,40}"
}

fn extension_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,5}".prop_map(|ext| format!(".{ext}"))
}

fn generator() -> KeyGenerator<RandomIds, FixedClock> {
    KeyGenerator::with_sources(RandomIds, FixedClock::at(1_700_000_000))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Keys keep exactly the extension of the original filename.
    #[test]
    fn prop_key_keeps_extension(stem in stem_strategy(), ext in extension_strategy()) {
        let key = generator().generate(&format!("{stem}{ext}"));
        let suffix = format!("_1700000000{ext}");

        prop_assert!(key.ends_with(&suffix));
        prop_assert_eq!(split_filename(&key).1, ext.as_str());
    }

    /// Filenames without a dot produce keys ending in the timestamp.
    #[test]
    fn prop_key_without_extension(stem in stem_strategy()) {
        let key = generator().generate(&stem);

        prop_assert!(key.ends_with("_1700000000"));
        prop_assert_eq!(split_filename(&key).1, "");
    }

    /// The stem survives at the front of the key.
    #[test]
    fn prop_key_starts_with_stem(stem in stem_strategy(), ext in extension_strategy()) {
        let key = generator().generate(&format!("{stem}{ext}"));
        let prefix = format!("{stem}-");

        prop_assert!(key.starts_with(&prefix));
    }

    /// Resolving a public URL yields the key it was issued for.
    #[test]
    fn prop_public_url_round_trip(
        stem in stem_strategy(),
        ext in prop::option::of(extension_strategy()),
        bucket in "[a-z0-9][a-z0-9.-]{2,20}",
    ) {
        let client = MockClient::new("https://s3.example.com", &bucket);
        let filename = format!("{stem}{}", ext.unwrap_or_default());
        let key = generator().generate(&filename);

        let url = public_url(&client, &key);
        prop_assert_eq!(resolve_key(&url).expect("issued URL resolves"), key);
    }

    /// KiB rounding is half-up and never off by more than half a KiB.
    #[test]
    fn prop_size_in_kb_half_up(bytes in 0u64..(1u64 << 40)) {
        let kb = size_in_kb(bytes);
        let doubled = bytes * 2;

        prop_assert!(kb * 2048 <= doubled + 1024);
        prop_assert!(doubled < kb * 2048 + 1024);
    }
}
