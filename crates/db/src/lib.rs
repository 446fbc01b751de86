use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::events::{BytesText, Event};
use quick_xml::se::Serializer;
use quick_xml::{Reader, Writer};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const DEFAULT_FILE: &str = "orders.xml";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// A single XML document on disk holding one serde value.
#[derive(Debug, Clone)]
pub struct XmlStore {
    path: PathBuf,
}

impl XmlStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self { path },
            None => Self {
                path: PathBuf::from(DEFAULT_FILE),
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the document with `value`. The root element is named after the
    /// serialized type.
    pub fn set<T>(&self, value: &T) -> Result<()>
    where
        T: Sized + Serialize,
    {
        let mut body = String::new();
        let mut serializer = Serializer::new(&mut body);
        serializer.indent(' ', 2);
        value
            .serialize(serializer)
            .with_context(|| format!("Failed to serialize {}", self.path.display()))?;
        let body = keep_edge_whitespace(&body)
            .with_context(|| format!("Failed to serialize {}", self.path.display()))?;

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{XML_DECLARATION}")?;
        writer.write_all(body.as_bytes())?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        log::debug!("wrote {} bytes to {}", body.len(), self.path.display());
        Ok(())
    }

    pub fn get<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let xml = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        quick_xml::de::from_str(&xml)
            .with_context(|| format!("Failed to deserialize {}", self.path.display()))
    }
}

/// The deserializer trims raw element text, so leading and trailing
/// whitespace of a value is written as character references instead.
/// Text directly between a start tag and its end tag is a value; any other
/// text in the serializer output is indentation.
fn keep_edge_whitespace(body: &str) -> Result<String> {
    let mut reader = Reader::from_str(body);
    let mut events = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => events.push(event),
        }
    }

    let mut writer = Writer::new(Vec::with_capacity(body.len()));
    for (index, event) in events.iter().enumerate() {
        let is_value = index > 0
            && matches!(events[index - 1], Event::Start(_))
            && matches!(events.get(index + 1), Some(Event::End(_)));

        match event {
            Event::Text(text) if is_value => {
                let escaped = std::str::from_utf8(text)?;
                writer.write_event(Event::Text(BytesText::from_escaped(encode_edges(escaped))))?;
            }
            event => writer.write_event(event)?,
        }
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

fn encode_edges(escaped: &str) -> String {
    let is_xml_whitespace = |c: char| matches!(c, ' ' | '\t' | '\n' | '\r');
    let start = escaped.len() - escaped.trim_start_matches(is_xml_whitespace).len();
    let core = escaped[start..].trim_end_matches(is_xml_whitespace);
    let end = start + core.len();

    let reference = |c: char| format!("&#{};", u32::from(c));
    let mut encoded: String = escaped[..start].chars().map(reference).collect();
    encoded.push_str(core);
    encoded.extend(escaped[end..].chars().map(reference));
    encoded
}
