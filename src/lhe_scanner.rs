//! Streaming discovery of the weight variants declared in an LHE header.
//!
//! The scan walks the document event by event and stops as soon as the first
//! `<event>` (or stray `<wgt>`) begins, so its cost is bounded by the header
//! region no matter how many gigabytes of events follow. Nothing of the
//! document is retained beyond the returned [`WeightCatalog`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::err::{Error, Result};
use crate::weights::{WeightCatalog, WeightDef, WeightEntry, WeightGroupShell};

/// Version reported when the root element carries no `version` attribute.
pub const DEFAULT_LHE_VERSION: &str = "3.0";

pub(crate) fn open_reader(path: &Path) -> Result<Reader<BufReader<File>>> {
    let f = File::open(path).map_err(|source| Error::FailedToOpenFile {
        source,
        path: path.to_path_buf(),
    })?;
    Ok(Reader::from_reader(BufReader::new(f)))
}

/// Scans the header of the file at `path` and returns the declared weight
/// variants. A file declaring no weight groups yields an empty catalog.
pub fn scan_weights(path: impl AsRef<Path>) -> Result<WeightCatalog> {
    let mut reader = open_reader(path.as_ref())?;
    scan_weights_from(&mut reader)
}

pub(crate) fn scan_weights_from<R: BufRead>(reader: &mut Reader<R>) -> Result<WeightCatalog> {
    let mut catalog = WeightCatalog::new(DEFAULT_LHE_VERSION);
    let mut buf = Vec::new();

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(e) => match e.name().as_ref() {
                b"LesHouchesEvents" => {
                    if let Some(version) = attribute_value(&e, b"version")? {
                        catalog.set_version(version);
                    }
                }
                b"weightgroup" => {
                    let shell = WeightGroupShell {
                        attributes: attributes_owned(&e)?,
                    };
                    scan_weight_group(reader, &shell, &mut catalog)?;
                }
                // Event bulk reached, the header is behind us.
                b"event" | b"wgt" => break,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"event" | b"wgt" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(
        "discovered {} weight id(s), LHE version {}",
        catalog.len(),
        catalog.version()
    );
    Ok(catalog)
}

/// Consumes the body of one `<weightgroup>`, recording every child `<weight>`
/// under the group's stripped-down shell.
fn scan_weight_group<R: BufRead>(
    reader: &mut Reader<R>,
    shell: &WeightGroupShell,
    catalog: &mut WeightCatalog,
) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(e) if e.name().as_ref() == b"weight" => {
                let attributes = attributes_owned(&e)?;
                let content = read_text_content(reader, "weight")?;
                record_weight(shell, attributes, content, catalog);
            }
            Event::Empty(e) if e.name().as_ref() == b"weight" => {
                record_weight(shell, attributes_owned(&e)?, String::new(), catalog);
            }
            Event::End(e) if e.name().as_ref() == b"weightgroup" => return Ok(()),
            Event::Eof => {
                return Err(Error::TruncatedDocument {
                    element: "weightgroup",
                });
            }
            _ => {}
        }
        buf.clear();
    }
}

fn record_weight(
    shell: &WeightGroupShell,
    attributes: Vec<(String, String)>,
    content: String,
    catalog: &mut WeightCatalog,
) {
    let Some(id) = attributes
        .iter()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.clone())
    else {
        warn!("skipping a <weight> declaration without an id attribute");
        return;
    };

    catalog.insert(WeightEntry {
        group: shell.clone(),
        def: WeightDef {
            id,
            attributes,
            content,
        },
    });
}

/// Accumulates the text content of an element whose start tag was just
/// consumed, up to and including its end tag. Nested markup is dropped.
fn read_text_content<R: BufRead>(reader: &mut Reader<R>, element: &'static str) -> Result<String> {
    let mut buf = Vec::new();
    let mut content = String::new();
    let mut depth = 0usize;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Text(e) if depth == 0 => content.push_str(&e.unescape()?),
            Event::CData(e) if depth == 0 => {
                content.push_str(&String::from_utf8_lossy(&e.into_inner()))
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(content);
                }
                depth -= 1;
            }
            Event::Eof => return Err(Error::TruncatedDocument { element }),
            _ => {}
        }
        buf.clear();
    }
}

/// Returns the unescaped value of `name` on a start tag, if present.
pub(crate) fn attribute_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// All attributes of a start tag as owned, unescaped pairs in document order.
pub(crate) fn attributes_owned(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        out.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            attr.unescape_value()?.into_owned(),
        ));
    }
    Ok(out)
}
