use std::fs;

use indoc::indoc;
use stringsync::{
    Direction, Entry, Parser,
    formats::{StringsFormat, StringsdictFormat},
};
use tempfile::TempDir;

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    bytes
}

#[test]
fn test_read_utf16_strings_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Localizable.strings");
    let text = indoc! {r#"
        /* Greeting */
        "hello"="Hello...";
        "unchanged"="Still greeting";
    "#};
    fs::write(&path, utf16le_with_bom(text)).unwrap();

    let format = StringsFormat::read_from(&path, Direction::Download).unwrap();
    assert_eq!(
        format.entries.get("hello"),
        Some(&Entry::new(Some("Greeting"), "Hello…"))
    );
    assert_eq!(
        format.entries.get("unchanged").and_then(|entry| entry.comment.as_deref()),
        Some("Greeting")
    );
}

#[test]
fn test_write_then_read_plural_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Localizable.stringsdict");
    let text = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
        <plist version="1.0">
          <dict>
            <key>files</key>
            <dict>
              <key>NSStringLocalizedFormatKey</key>
              <string>%#@files@</string>
              <key>files</key>
              <dict>
                <key>NSStringFormatSpecTypeKey</key>
                <string>NSStringPluralRuleType</string>
                <key>one</key>
                <string>%d file</string>
                <key>other</key>
                <string>%d files</string>
              </dict>
            </dict>
          </dict>
        </plist>
    "#};

    let format = StringsdictFormat::decode(text, Direction::Download).unwrap();
    format.write_to(&path, Direction::Download).unwrap();

    let reread = StringsdictFormat::read_from(&path, Direction::Download).unwrap();
    assert_eq!(reread, format);
    let entry = reread.entries.get("files").unwrap();
    assert_eq!(entry.format_variable, "%#@files@");
    assert_eq!(entry.variants.get("one").map(String::as_str), Some("%d file"));
    assert_eq!(entry.variants.len(), 2);
}
