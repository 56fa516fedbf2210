//! Traits for direction-aware parsing and serialization in stringsync.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use crate::{error::Error, types::Direction};

/// A trait for decoding and encoding one resource file.
///
/// Values are normalized for `direction` while decoding; encoding produces
/// the on-disk text for the same direction.
///
/// # Example
///
/// ```rust,no_run
/// use stringsync::{Direction, traits::Parser};
/// let format = stringsync::formats::strings::Format::read_from(
///     "Base.lproj/Localizable.strings",
///     Direction::Upload,
/// )?;
/// format.write_to("upload.strings", Direction::Upload)?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Decode from already-decoded text.
    fn decode(text: &str, direction: Direction) -> Result<Self, Error>
    where
        Self: Sized;

    /// Encode to text.
    fn encode(&self, direction: Direction) -> String;

    /// Decode from any reader, sniffing a BOM (UTF-8 or UTF-16) first.
    fn from_reader<R: Read>(reader: R, direction: Direction) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(reader);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded)?;
        Self::decode(&decoded, direction)
    }

    /// Decode from file path.
    fn read_from<P: AsRef<Path>>(path: P, direction: Direction) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path)?;
        Self::from_reader(file, direction)
    }

    /// Write the UTF-8 encoding to any writer.
    fn to_writer<W: Write>(&self, mut writer: W, direction: Direction) -> Result<(), Error> {
        writer.write_all(self.encode(direction).as_bytes())?;
        Ok(())
    }

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P, direction: Direction) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer, direction)?;
        writer.flush()?;
        Ok(())
    }
}
