//! Support for Apple `.stringsdict` plural property lists.
//!
//! Each outer key maps to a dictionary holding the format variable, the name
//! of the rule context and a nested rule dictionary of plural categories.
//! Keys and values are kept in their raw XML form, so entities and inline
//! markup pass through unchanged.

use quick_xml::{Reader, events::Event};

use crate::{
    error::Error,
    normalize::normalize,
    traits::Parser,
    types::{Direction, Mapping, PluralEntry},
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const PLIST_DOCTYPE: &str = r#"<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">"#;
const FORMAT_KEY: &str = "NSStringLocalizedFormatKey";
const SPEC_TYPE_KEY: &str = "NSStringFormatSpecTypeKey";
const PLURAL_RULE_TYPE: &str = "NSStringPluralRuleType";

/// Represents an Apple `.stringsdict` plural file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Format {
    pub entries: Mapping<PluralEntry>,
}

impl Format {
    pub fn new(entries: Mapping<PluralEntry>) -> Self {
        Format { entries }
    }
}

impl Parser for Format {
    fn decode(text: &str, direction: Direction) -> Result<Self, Error> {
        let document = Element::parse(text)?;
        let root = document
            .descendants_or_self()
            .find(|element| element.name == "dict")
            .ok_or_else(|| Error::MalformedPlist("no root dictionary".to_string()))?;

        let mut entries = Mapping::new();
        let mut key = "";
        for child in &root.children {
            match child.name.as_str() {
                "key" => key = child.inner.as_str(),
                "dict" => {
                    entries.insert(key, plural_entry(child, direction)?);
                }
                _ => {}
            }
        }

        Ok(Format { entries })
    }

    /// Values are written as stored; `direction` only matters when decoding.
    fn encode(&self, _direction: Direction) -> String {
        let mut writer = PlistWriter::default();
        writer.line(XML_DECLARATION);
        writer.line(PLIST_DOCTYPE);
        writer.open(r#"plist version="1.0""#);
        writer.open("dict");

        for (key, entry) in self.entries.iter() {
            writer.leaf("key", key);
            writer.open("dict");
            writer.leaf("key", FORMAT_KEY);
            writer.leaf("string", &entry.format_variable);
            writer.leaf("key", &entry.format_context);
            writer.open("dict");
            writer.leaf("key", SPEC_TYPE_KEY);
            writer.leaf("string", PLURAL_RULE_TYPE);
            for (category, value) in &entry.variants {
                writer.leaf("key", category);
                writer.leaf("string", value);
            }
            writer.close("dict");
            writer.close("dict");
        }

        writer.close("dict");
        writer.close("plist");
        writer.finish()
    }
}

/// Succeeds when `text` is a well-formed XML document with a single root.
pub(crate) fn check_well_formed(text: &str) -> Result<(), Error> {
    Element::parse(text).map(|_| ())
}

/// Reads one outer entry. The first `string` below it is the format variable
/// and the second `key` names the context; the first nested `dict` holds two
/// control elements followed by category/value pairs.
fn plural_entry(node: &Element, direction: Direction) -> Result<PluralEntry, Error> {
    let missing = |what: &str| Error::MalformedPlist(format!("plural entry without {}", what));

    let format_variable = node
        .descendants()
        .find(|element| element.name == "string")
        .ok_or_else(|| missing("a format variable"))?;
    let format_context = node
        .descendants()
        .filter(|element| element.name == "key")
        .nth(1)
        .ok_or_else(|| missing("a context key"))?;
    let rules = node
        .descendants()
        .find(|element| element.name == "dict")
        .ok_or_else(|| missing("a rule dictionary"))?;

    let mut variants = indexmap::IndexMap::new();
    let mut category = "";
    for child in rules.children.iter().skip(2) {
        match child.name.as_str() {
            "key" => category = child.inner.as_str(),
            "string" => {
                variants.insert(category.to_string(), normalize(&child.inner, direction));
            }
            _ => {}
        }
    }

    Ok(PluralEntry {
        format_variable: format_variable.inner.clone(),
        format_context: format_context.inner.clone(),
        variants,
    })
}

/// An XML element with its element children and the raw text between its
/// start and end tags.
#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    inner: String,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Element {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    /// Builds the tree of a whole document and returns its single root.
    fn parse(text: &str) -> Result<Element, Error> {
        let mut reader = Reader::from_str(text);
        let mut open: Vec<(Element, usize)> = Vec::new();
        let mut roots: Vec<Element> = Vec::new();

        loop {
            let event_start = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(start) => {
                    let inner_start = reader.buffer_position() as usize;
                    open.push((Element::named(start.name().as_ref()), inner_start));
                }
                Event::Empty(start) => {
                    attach(&mut open, &mut roots, Element::named(start.name().as_ref()));
                }
                Event::End(_) => {
                    let (mut element, inner_start) = open.pop().ok_or_else(|| {
                        Error::MalformedPlist("closing tag without an opening tag".to_string())
                    })?;
                    element.inner = text[inner_start..event_start].to_string();
                    attach(&mut open, &mut roots, element);
                }
                Event::Text(content) => {
                    // Resolves entities so undefined references are rejected.
                    let content = content.unescape()?;
                    if open.is_empty() && !content.trim().is_empty() {
                        return Err(Error::MalformedPlist(
                            "text outside the root element".to_string(),
                        ));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some((element, _)) = open.last() {
            return Err(Error::MalformedPlist(format!(
                "unclosed element <{}>",
                element.name
            )));
        }

        let mut roots = roots.into_iter();
        match (roots.next(), roots.next()) {
            (Some(root), None) => Ok(root),
            (None, _) => Err(Error::MalformedPlist("no root element".to_string())),
            (Some(_), Some(_)) => Err(Error::MalformedPlist(
                "more than one root element".to_string(),
            )),
        }
    }

    /// Every element below `self` in document order.
    fn descendants(&self) -> impl Iterator<Item = &Element> {
        self.children
            .iter()
            .flat_map(|child| child.descendants_or_self())
    }

    fn descendants_or_self(&self) -> Box<dyn Iterator<Item = &Element> + '_> {
        Box::new(std::iter::once(self).chain(self.descendants()))
    }
}

fn attach(open: &mut [(Element, usize)], roots: &mut Vec<Element>, element: Element) {
    match open.last_mut() {
        Some((parent, _)) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// Line-oriented writer that indents two spaces per open element.
#[derive(Debug, Default)]
struct PlistWriter {
    out: String,
    depth: usize,
}

impl PlistWriter {
    fn line(&mut self, content: &str) {
        self.out.push_str(&"  ".repeat(self.depth));
        self.out.push_str(content);
        self.out.push('\n');
    }

    fn open(&mut self, start: &str) {
        self.line(&format!("<{}>", start));
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", name));
    }

    fn leaf(&mut self, name: &str, value: &str) {
        self.line(&format!("<{name}>{value}</{name}>"));
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const ITEMS: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
        <plist version="1.0">
          <dict>
            <key>items</key>
            <dict>
              <key>NSStringLocalizedFormatKey</key>
              <string>%d items</string>
              <key>items_rule</key>
              <dict>
                <key>NSStringFormatSpecTypeKey</key>
                <string>NSStringPluralRuleType</string>
                <key>one</key>
                <string>%d item</string>
                <key>other</key>
                <string>%d items</string>
              </dict>
            </dict>
          </dict>
        </plist>"#};

    #[test]
    fn test_parse_items_example() {
        let parsed = Format::decode(ITEMS, Direction::Upload).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        let entry = parsed.entries.get("items").unwrap();
        assert_eq!(entry.format_variable, "%d items");
        assert_eq!(entry.format_context, "items_rule");
        assert_eq!(entry.variants.get("one").map(String::as_str), Some("%d item"));
        assert_eq!(
            entry.variants.get("other").map(String::as_str),
            Some("%d items")
        );
    }

    #[test]
    fn test_encode_reproduces_layout() {
        let parsed = Format::decode(ITEMS, Direction::Download).unwrap();
        assert_eq!(parsed.encode(Direction::Download), ITEMS);
    }

    #[test]
    fn test_round_trip_keeps_every_category() {
        let parsed = Format::decode(ITEMS, Direction::Download).unwrap();
        let reparsed =
            Format::decode(&parsed.encode(Direction::Download), Direction::Download).unwrap();
        assert_eq!(parsed, reparsed);
        assert_eq!(reparsed.entries.get("items").unwrap().variants.len(), 2);
    }

    #[test]
    fn test_values_keep_raw_markup_and_entities() {
        let content = indoc! {r#"
            <plist version="1.0"><dict>
              <key>files</key>
              <dict>
                <key>NSStringLocalizedFormatKey</key>
                <string>%#@files@</string>
                <key>files</key>
                <dict>
                  <key>NSStringFormatSpecTypeKey</key>
                  <string>NSStringPluralRuleType</string>
                  <key>one</key>
                  <string>[A]1[/A] file &amp; folder</string>
                  <key>other</key>
                  <string>%d files...</string>
                </dict>
              </dict>
            </dict></plist>
        "#};
        let parsed = Format::decode(content, Direction::Download).unwrap();
        let entry = parsed.entries.get("files").unwrap();
        assert_eq!(entry.format_variable, "%#@files@");
        assert_eq!(entry.variants["one"], "[A]1[/A] file &amp; folder");
        assert_eq!(entry.variants["other"], "%d files…");
    }

    #[test]
    fn test_upload_normalizes_category_values() {
        let content = ITEMS.replace("<string>%d item</string>", "<string>%d user's item</string>");
        let parsed = Format::decode(&content, Direction::Upload).unwrap();
        assert_eq!(
            parsed.entries.get("items").unwrap().variants["one"],
            "%d user’s item"
        );
    }

    #[test]
    fn test_multiple_entries_keep_order() {
        let mut entries = Mapping::new();
        for key in ["b", "a"] {
            entries.insert(
                key,
                PluralEntry::new(
                    "%#@r@",
                    "r",
                    vec![("other".to_string(), "%d".to_string())],
                ),
            );
        }
        let encoded = Format::new(entries).encode(Direction::Download);
        let parsed = Format::decode(&encoded, Direction::Download).unwrap();
        let keys: Vec<_> = parsed.entries.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = Format::decode("<plist><dict><key>a</dict></plist>", Direction::Upload);
        assert!(matches!(result, Err(Error::XmlParse(_))));

        let unclosed = Format::decode("<plist><dict>", Direction::Upload);
        assert!(matches!(
            unclosed,
            Err(Error::MalformedPlist(_)) | Err(Error::XmlParse(_))
        ));
    }

    #[test]
    fn test_missing_root_dictionary() {
        let result = Format::decode("<plist version=\"1.0\"/>", Direction::Upload);
        assert!(matches!(result, Err(Error::MalformedPlist(_))));
    }

    #[test]
    fn test_incomplete_entry_is_rejected() {
        let content = "<plist><dict><key>x</key><dict><key>only</key></dict></dict></plist>";
        let result = Format::decode(content, Direction::Upload);
        assert!(matches!(result, Err(Error::MalformedPlist(_))));
    }

    #[test]
    fn test_writer_indents_by_depth() {
        let mut writer = PlistWriter::default();
        writer.open("dict");
        writer.leaf("key", "k");
        writer.open("dict");
        writer.leaf("string", "v");
        writer.close("dict");
        writer.close("dict");
        assert_eq!(
            writer.finish(),
            "<dict>\n  <key>k</key>\n  <dict>\n    <string>v</string>\n  </dict>\n</dict>"
        );
    }
}
