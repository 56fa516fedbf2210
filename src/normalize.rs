//! Typographic normalization of string values.
//!
//! Values travelling to the translation service get their straight quotes,
//! primes, apostrophes and ellipses rewritten to typographic forms, and every
//! line break collapsed into the [`LINE_BREAK`] sentinel. Values travelling
//! back get the sentinel expanded to an escaped `\n` and the inline style
//! tokens (`[a]`, `[/b]`, ...) uppercased.
//!
//! Inline markup tags are swapped for positional placeholders (` <t N> `)
//! before any rewriting and restored verbatim afterwards. Restoration is a
//! plain substring replacement, so a value that already contains the literal
//! text ` <t 0> ` cannot be told apart from a placeholder.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::Direction;

/// Sentinel stored on the service side in place of a line break.
pub const LINE_BREAK: &str = "[Br]";

lazy_static! {
    // `<s...` and `<d...` are left alone so `<string>`/`<dict>` are never captured.
    static ref INLINE_TAG_REGEX: Regex = Regex::new(r"<[^\[sd][^>]*>").unwrap();

    static ref UPLOAD_RULES: Vec<Rule> = vec![
        Rule::new("triple prime", r"'''", "‴"),
        Rule::new("opening double quote", r#"(\W|^)"(\w)"#, "${1}“${2}"),
        Rule::new("closing double quote", r#"(“[^"]*)"([^"]*$|[^“"]*“)"#, "${1}”${2}"),
        Rule::new("trailing double quote", r#"([^0-9])""#, "${1}”"),
        Rule::new("double prime", r"''", "″"),
        Rule::new("opening single quote", r"(\W|^)'(\S)", "${1}‘${2}"),
        Rule::new("inter-word apostrophe", r"([A-z0-9])'([A-z])", "${1}’${2}"),
        Rule::new(
            "abbreviated year",
            r"(‘)([0-9]{2}[^’]*)(‘([^0-9]|$)|$|’[A-z])",
            "’${2}${3}",
        ),
        Rule::new("closing single quote", r"((‘[^']*)|[A-z])'([^0-9]|$)", "${1}’${3}"),
        Rule::with_lookahead(
            "backwards apostrophe",
            r"(\B|^)‘",
            r"^([^‘’]*’\b)*([^‘’]*\B\W[‘’]\b|[^‘’]*$)",
            "${1}’",
        ),
        Rule::new("generic double quote", r#"""#, "″"),
        Rule::new("generic single quote", r"'", "′"),
        Rule::new("ellipsis", r"\.\.\.", "…"),
    ];
}

/// Inline style tokens that are uppercased on the way back to the repository.
const STYLE_TOKENS: [(&str, &str); 14] = [
    ("[x]", "[X]"),
    ("[/x]", "[/X]"),
    ("[a]", "[A]"),
    ("[/a]", "[/A]"),
    ("[b]", "[B]"),
    ("[/b]", "[/B]"),
    ("[a1]", "[A1]"),
    ("[/a1]", "[/A1]"),
    ("[a2]", "[A2]"),
    ("[/a2]", "[/A2]"),
    ("[x1]", "[X1]"),
    ("[/x1]", "[/X1]"),
    ("[x2]", "[X2]"),
    ("[/x2]", "[/X2]"),
];

/// Line break spellings collapsed on upload. Each `\r\n` form precedes its
/// `\r` and `\n` forms so a Windows break becomes a single sentinel.
const LINE_BREAKS: [&str; 6] = ["\r\n", "\r", "\n", r"\r\n", r"\r", r"\n"];

/// One substitution step of the upload pipeline.
///
/// Rules run strictly in table order and each one sees the output of the
/// previous one. A rule with a lookahead only rewrites a match when the text
/// following it (in the input of that rule) matches the anchored lookahead
/// pattern.
#[derive(Debug)]
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    lookahead: Option<Regex>,
    replacement: &'static str,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Rule {
            name,
            pattern: Regex::new(pattern).unwrap(),
            lookahead: None,
            replacement,
        }
    }

    fn with_lookahead(
        name: &'static str,
        pattern: &str,
        lookahead: &str,
        replacement: &'static str,
    ) -> Self {
        Rule {
            lookahead: Some(Regex::new(lookahead).unwrap()),
            ..Rule::new(name, pattern, replacement)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, text: &str) -> String {
        let Some(lookahead) = &self.lookahead else {
            return self
                .pattern
                .replace_all(text, self.replacement)
                .into_owned();
        };

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for caps in self.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if !lookahead.is_match(&text[whole.end()..]) {
                continue;
            }
            result.push_str(&text[last..whole.start()]);
            caps.expand(self.replacement, &mut result);
            last = whole.end();
        }
        result.push_str(&text[last..]);
        result
    }
}

/// The ordered upload rule table.
///
/// The order is load-bearing: the triple prime must be consumed before the
/// generic single quote rewrites quotes one at a time, opening quotes must be
/// placed before the closing-quote rules look for them, and so on.
pub fn upload_rules() -> &'static [Rule] {
    &UPLOAD_RULES
}

/// Applies `rules` to `text` in iteration order.
pub fn apply_rules<'a>(text: &str, rules: impl IntoIterator<Item = &'a Rule>) -> String {
    rules
        .into_iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Normalizes a single string value for the given direction.
///
/// Only values go through here; keys and comments are never rewritten.
pub fn normalize(text: &str, direction: Direction) -> String {
    let (mut result, tags) = protect_tags(text);

    match direction {
        Direction::Upload => {
            for line_break in LINE_BREAKS {
                result = result.replace(line_break, LINE_BREAK);
            }
            result = result.replace('\\', "");
            result = apply_rules(&result, upload_rules());
        }
        Direction::Download => {
            result = ellipsis_rule().apply(&result);
            for (lower, upper) in STYLE_TOKENS {
                result = result.replace(lower, upper);
            }
            result = result.replace(['\n', '\r'], "");
            result = result.replace(LINE_BREAK, r"\n");
        }
    }

    restore_tags(result, &tags)
}

fn ellipsis_rule() -> &'static Rule {
    &UPLOAD_RULES[UPLOAD_RULES.len() - 1]
}

fn placeholder(index: usize) -> String {
    format!(" <t {}> ", index)
}

fn protect_tags(text: &str) -> (String, Vec<String>) {
    let tags: Vec<String> = INLINE_TAG_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    let protected = tags
        .iter()
        .enumerate()
        .fold(text.to_string(), |acc, (index, tag)| {
            acc.replace(tag.as_str(), &placeholder(index))
        });
    (protected, tags)
}

fn restore_tags(text: String, tags: &[String]) -> String {
    tags.iter()
        .enumerate()
        .fold(text, |acc, (index, tag)| acc.replace(&placeholder(index), tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(text: &str) -> String {
        normalize(text, Direction::Upload)
    }

    fn download(text: &str) -> String {
        normalize(text, Direction::Download)
    }

    #[test]
    fn test_double_quotes_become_smart_quotes() {
        assert_eq!(upload(r#"He said "hello""#), "He said “hello”");
    }

    #[test]
    fn test_apostrophe_inside_word() {
        assert_eq!(upload("it's"), "it’s");
    }

    #[test]
    fn test_abbreviated_year() {
        assert_eq!(upload("'93 memories"), "’93 memories");
    }

    #[test]
    fn test_single_quoted_phrase() {
        assert_eq!(upload("Tap 'Save' now"), "Tap ‘Save’ now");
    }

    #[test]
    fn test_primes_for_measurements() {
        assert_eq!(upload("5'''"), "5‴");
        assert_eq!(upload("12\""), "12″");
    }

    #[test]
    fn test_upload_ellipsis() {
        assert_eq!(upload("Loading..."), "Loading…");
    }

    #[test]
    fn test_escaped_quotes_lose_backslashes() {
        assert_eq!(upload(r#"Say \"hi\""#), "Say “hi”");
    }

    #[test]
    fn test_line_breaks_collapse_to_sentinel() {
        assert_eq!(upload("one\ntwo"), "one[Br]two");
        assert_eq!(upload("one\r\ntwo"), "one[Br]two");
        assert_eq!(upload(r"one\ntwo"), "one[Br]two");
        assert_eq!(upload(r"one\r\ntwo"), "one[Br]two");
    }

    #[test]
    fn test_markup_is_protected_from_quote_rules() {
        assert_eq!(
            upload(r#"<a href="https://mega.io">Open</a>"#),
            r#"<a href="https://mega.io">Open</a>"#
        );
    }

    #[test]
    fn test_download_ellipsis_is_idempotent() {
        let once = download("a...b");
        assert_eq!(once, "a…b");
        assert_eq!(download(&once), once);
    }

    #[test]
    fn test_download_uppercases_style_tokens() {
        assert_eq!(
            download("[a]Terms[/a] and [b]Privacy[/b] [x1]x[/x1]"),
            "[A]Terms[/A] and [B]Privacy[/B] [X1]x[/X1]"
        );
        assert_eq!(download("[a1]one[/a1]"), "[A1]one[/A1]");
    }

    #[test]
    fn test_download_expands_sentinel_and_drops_raw_newlines() {
        assert_eq!(download("one[Br]two"), r"one\ntwo");
        assert_eq!(download("one\ntwo\r"), "onetwo");
    }

    #[test]
    fn test_download_leaves_quotes_alone() {
        assert_eq!(download(r#"He said "hello""#), r#"He said "hello""#);
    }

    #[test]
    fn test_upload_then_download_restores_line_breaks() {
        assert_eq!(download(&upload("first\nsecond")), r"first\nsecond");
    }

    #[test]
    fn test_rule_table_order() {
        let names: Vec<_> = upload_rules().iter().map(Rule::name).collect();
        assert_eq!(names.first(), Some(&"triple prime"));
        assert_eq!(names.last(), Some(&"ellipsis"));
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn test_swapping_rules_changes_result() {
        let rules = upload_rules();
        let in_order = apply_rules("5'''", rules);

        let generic_single = rules
            .iter()
            .position(|rule| rule.name() == "generic single quote")
            .unwrap();
        let mut swapped: Vec<&Rule> = rules.iter().collect();
        swapped.swap(0, generic_single);
        let out_of_order = apply_rules("5'''", swapped);

        assert_eq!(in_order, "5‴");
        assert_eq!(out_of_order, "5′′′");
    }

    #[test]
    fn test_swapping_opening_and_trailing_double_quote_rules() {
        let rules = upload_rules();
        let mut swapped: Vec<&Rule> = rules.iter().collect();
        swapped.swap(1, 3);
        assert_ne!(
            apply_rules(r#"He said "hello""#, swapped),
            apply_rules(r#"He said "hello""#, rules)
        );
    }

    #[test]
    fn test_backwards_apostrophe_lookahead() {
        let rule = upload_rules()
            .iter()
            .find(|rule| rule.name() == "backwards apostrophe")
            .unwrap();
        // No closing quote follows, so the opening quote is really an apostrophe.
        assert_eq!(rule.apply("rock ‘n roll"), "rock ’n roll");
        // A matching closing quote follows, so the opening quote stays.
        assert_eq!(rule.apply("say ‘hi’ there"), "say ‘hi’ there");
    }
}
