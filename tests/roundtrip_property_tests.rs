use indexmap::IndexMap;
use proptest::prelude::*;
use stringsync::{
    Direction, Document, Entry, Mapping, Parser, PluralEntry, ResourceKind,
    formats::{StringsFormat, StringsdictFormat},
    merge, normalize,
};

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("valid key regex")
}

fn word_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_\\-,!\\?%@]{1,8}").expect("valid word regex")
}

/// Space-separated tokens mixing plain words with the markup a value can
/// carry: ellipses, escaped line breaks and quotes, inline tags and style
/// tokens.
fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => word_strategy(),
        1 => Just("...".to_string()),
        1 => Just("\\n".to_string()),
        1 => Just("\\\"".to_string()),
        1 => prop::sample::select(vec!["<b>", "</b>", "<i>", "</i>", "[a]", "[/a]"])
            .prop_map(str::to_string),
    ]
}

/// A lone quote, a doubled quote or an inner apostrophe.
fn single_quote_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("'".to_string()),
        Just("''".to_string()),
        proptest::string::string_regex("[a-z]{1,5}'[a-z]{1,5}").expect("valid apostrophe regex"),
    ]
}

/// Values hold at most one single-quote token; pairing quotes across words
/// depends on the surrounding text and is covered by the normalizer's own
/// tests.
fn value_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(token_strategy(), 1..6),
        prop::option::of((single_quote_strategy(), any::<prop::sample::Index>())),
    )
        .prop_map(|(mut tokens, quote)| {
            if let Some((quote, index)) = quote {
                let at = index.index(tokens.len() + 1);
                tokens.insert(at, quote);
            }
            tokens.join(" ")
        })
}

fn plural_value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_%@]{1,20}").expect("valid plural value regex")
}

fn comment_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 ,\\.]{0,20}").expect("valid comment regex")
}

fn flat_dataset_strategy() -> impl Strategy<Value = IndexMap<String, (String, String)>> {
    prop::collection::vec((key_strategy(), (comment_strategy(), value_strategy())), 1..8)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn category_strategy() -> impl Strategy<Value = IndexMap<String, String>> {
    prop::collection::btree_map(
        prop::sample::select(vec!["zero", "one", "two", "few", "many", "other"]),
        plural_value_strategy(),
        1..6,
    )
    .prop_map(|variants| {
        variants
            .into_iter()
            .map(|(category, value)| (category.to_string(), value))
            .collect()
    })
}

fn plural_dataset_strategy() -> impl Strategy<Value = Mapping<PluralEntry>> {
    prop::collection::vec((key_strategy(), key_strategy(), category_strategy()), 1..5).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(key, context, variants)| {
                    let entry = PluralEntry {
                        format_variable: format!("%#@{}@", context),
                        format_context: context,
                        variants,
                    };
                    (key, entry)
                })
                .collect()
        },
    )
}

fn render_flat(values: &IndexMap<String, (String, String)>) -> String {
    values
        .iter()
        .map(|(key, (comment, value))| format!("/* {} */\n\"{}\"=\"{}\";\n", comment, key, value))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn strings_roundtrip_is_stable(values in flat_dataset_strategy()) {
        let text = render_flat(&values);
        for direction in [Direction::Download, Direction::Upload] {
            let decoded = StringsFormat::decode(&text, direction)?;
            let reencoded = StringsFormat::decode(&decoded.encode(direction), direction)?;
            prop_assert_eq!(&decoded, &reencoded);
            prop_assert_eq!(decoded.entries.len(), values.len());
        }
    }

    #[test]
    fn strings_roundtrip_keeps_order(values in flat_dataset_strategy()) {
        let decoded = StringsFormat::decode(&render_flat(&values), Direction::Download)?;
        let keys: Vec<&str> = decoded.entries.keys().collect();
        let expected: Vec<&str> = values.keys().map(String::as_str).collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn stringsdict_roundtrip_keeps_every_category(entries in plural_dataset_strategy()) {
        let text = StringsdictFormat::new(entries.clone()).encode(Direction::Download);
        let decoded = StringsdictFormat::decode(&text, Direction::Download)?;
        prop_assert_eq!(&decoded.entries, &entries);

        let document = Document::decode(&text, Direction::Download, ResourceKind::Stringsdict)?;
        let again = Document::decode(
            &document.encode(Direction::Download),
            Direction::Download,
            ResourceKind::Stringsdict,
        )?;
        prop_assert_eq!(document, again);
    }

    #[test]
    fn download_normalization_is_idempotent(value in value_strategy()) {
        let once = normalize(&value, Direction::Download);
        prop_assert_eq!(normalize(&once, Direction::Download), once);
    }

    #[test]
    fn merge_prefers_overlay(
        base in flat_dataset_strategy(),
        overlay in flat_dataset_strategy(),
    ) {
        let to_mapping = |values: &IndexMap<String, (String, String)>| -> Mapping<Entry> {
            values
                .iter()
                .map(|(key, (comment, value))| {
                    (key.clone(), Entry::new(Some(comment.as_str()), value.as_str()))
                })
                .collect()
        };
        let (base, overlay) = (to_mapping(&base), to_mapping(&overlay));
        let merged = merge::merge(&base, &overlay, false);

        for (key, entry) in overlay.iter() {
            prop_assert_eq!(merged.get(key), Some(entry));
        }
        for (key, entry) in base.iter() {
            if !overlay.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(entry));
            }
        }
        prop_assert!(merge::changed_entries(&merged, &overlay).is_empty());
    }
}
