/*!
 * Encoding and decoding of `.xcstrings` payloads.
 *
 * Xcode writes string catalogs as pretty-printed JSON with two-space
 * indentation and a `" : "` separator between keys and values. Keys are
 * already sorted because the document model only uses ordered maps, so the
 * output is byte-stable for equal documents.
 */

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

use crate::errors::DocumentError;

use super::document::LocalizationDocument;

/// JSON formatter reproducing Xcode's string catalog layout.
#[derive(Debug, Clone)]
pub struct CatalogFormatter<'a> {
    current_indent: usize,
    has_value: bool,
    indent: &'a [u8],
}

impl<'a> CatalogFormatter<'a> {
    pub fn new() -> Self {
        Self::with_indent(b"  ")
    }

    pub fn with_indent(indent: &'a [u8]) -> Self {
        Self {
            current_indent: 0,
            has_value: false,
            indent,
        }
    }
}

impl Default for CatalogFormatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn write_indent<W>(writer: &mut W, n: usize, indent: &[u8]) -> io::Result<()>
where
    W: ?Sized + io::Write,
{
    for _ in 0..n {
        writer.write_all(indent)?;
    }
    Ok(())
}

impl Formatter for CatalogFormatter<'_> {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            write_indent(writer, self.current_indent, self.indent)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(if first { b"\n" } else { b",\n" })?;
        write_indent(writer, self.current_indent, self.indent)
    }

    fn end_array_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            write_indent(writer, self.current_indent, self.indent)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(if first { b"\n" } else { b",\n" })?;
        write_indent(writer, self.current_indent, self.indent)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b" : ")
    }

    fn end_object_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.has_value = true;
        Ok(())
    }
}

/// Serialize a document with the catalog formatter.
pub fn encode(document: &LocalizationDocument) -> Result<Vec<u8>, DocumentError> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, CatalogFormatter::new());
    document
        .serialize(&mut serializer)
        .map_err(|e| DocumentError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Parse a catalog payload.
///
/// A payload that is empty or only whitespace stands for a new file and
/// decodes to `LocalizationDocument::default()`.
pub fn decode(bytes: &[u8]) -> Result<LocalizationDocument, DocumentError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(LocalizationDocument::default());
    }

    serde_json::from_slice(bytes).map_err(|e| DocumentError::Malformed(e.to_string()))
}
