//! Per-weight re-emission of a multi-weight LHE file.
//!
//! One output file is produced per weight id, in ascending id order. Each
//! file is written by two independent streaming passes over the input: the
//! first rewrites the header (pruning `<initrwgt>` down to the single target
//! weight) and copies `<init>` verbatim, the second copies every `<event>`
//! with its `<rwgt>` block reduced to the one matching `<wgt>`. Re-reading
//! the input per pass is what keeps peak memory independent of event count;
//! inputs too large to hold in memory are the normal case, not the edge case.
//!
//! Emission rules:
//! - The root open tag is rebuilt from the scanned version attribute; text
//!   outside `<header>`, `<init>` and `<event>` elements is not carried over.
//! - Content inside copied elements is emitted verbatim, escaping included.
//! - Events keep their input order. No buffering beyond the current element.

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::err::{Error, Result};
use crate::lhe_scanner::{attribute_value, open_reader, scan_weights};
use crate::weights::{WeightCatalog, WeightEntry};

const ROOT_TAG: &str = "LesHouchesEvents";
const PROGRESS_INTERVAL: u64 = 100_000;

/// Splits a multi-weight LHE file into one single-weight file per variant.
pub struct LheSplitter {
    input: PathBuf,
    catalog: WeightCatalog,
}

impl LheSplitter {
    /// Scans the header of `path` and prepares a splitter for the weight
    /// variants it declares.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let input = path.as_ref().to_path_buf();
        let catalog = scan_weights(&input)?;
        Ok(LheSplitter { input, catalog })
    }

    pub fn catalog(&self) -> &WeightCatalog {
        &self.catalog
    }

    /// Produces one output file per declared weight id, ascending, and
    /// returns the paths written. An empty catalog writes nothing.
    ///
    /// The first failing pass aborts the remaining ids; its partial output
    /// file is removed before the error is returned.
    pub fn split(&self) -> Result<Vec<PathBuf>> {
        let total = self.catalog.len();
        let mut written = Vec::with_capacity(total);

        for (idx, (id, entry)) in self.catalog.iter().enumerate() {
            info!("now expanding weight {}/{}: id {}", idx + 1, total, id);
            written.push(self.emit_single_weight(id, entry)?);
        }

        info!("wrote {} single-weight file(s)", written.len());
        Ok(written)
    }

    /// Produces the output file for a single declared weight id.
    pub fn split_weight(&self, id: &str) -> Result<PathBuf> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::UnknownWeightId { id: id.to_string() })?;
        self.emit_single_weight(id, entry)
    }

    fn emit_single_weight(&self, id: &str, entry: &WeightEntry) -> Result<PathBuf> {
        let output = output_path_for(&self.input, id);
        info!("writing new LHE file to {}", output.display());

        if let Err(e) = self.write_single_weight(id, entry, &output) {
            // A partial file is worse than no file: drop it before propagating.
            if let Err(remove_err) = fs::remove_file(&output) {
                warn!(
                    "failed to remove partial output {}: {}",
                    output.display(),
                    remove_err
                );
            }
            return Err(e);
        }
        Ok(output)
    }

    fn write_single_weight(&self, id: &str, entry: &WeightEntry, output: &Path) -> Result<()> {
        let sink = File::create(output).map_err(|source| Error::FailedToCreateFile {
            source,
            path: output.to_path_buf(),
        })?;
        let mut writer = Writer::new(BufWriter::new(sink));

        let mut root = BytesStart::new(ROOT_TAG);
        root.push_attribute(("version", self.catalog.version()));
        writer.write_event(Event::Start(root))?;
        write_newline(&mut writer)?;

        self.write_header_and_init(entry, &mut writer)?;
        self.write_filtered_events(id, &mut writer)?;

        writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;
        write_newline(&mut writer)?;
        writer.into_inner().flush()?;
        Ok(())
    }

    /// First sub-pass: emits the rewritten `<header>` and a verbatim `<init>`,
    /// then stops without parsing into the event bulk.
    fn write_header_and_init<W: Write>(
        &self,
        entry: &WeightEntry,
        writer: &mut Writer<W>,
    ) -> Result<()> {
        let mut reader = open_reader(&self.input)?;
        let mut buf = Vec::new();

        loop {
            let pos = reader.buffer_position();
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::xml(e, pos))?
            {
                Event::Start(e) if e.name().as_ref() == b"header" => {
                    writer.write_event(Event::Start(e))?;
                    rewrite_header_body(&mut reader, writer, entry)?;
                    write_newline(writer)?;
                }
                Event::Start(e) if e.name().as_ref() == b"init" => {
                    writer.write_event(Event::Start(e))?;
                    copy_to_end(&mut reader, writer, "init")?;
                    write_newline(writer)?;
                    return Ok(());
                }
                Event::Empty(e) if e.name().as_ref() == b"header" => {
                    return Err(Error::MissingInitRwgt);
                }
                Event::Empty(e) if e.name().as_ref() == b"init" => {
                    writer.write_event(Event::Empty(e))?;
                    write_newline(writer)?;
                    return Ok(());
                }
                Event::Eof => return Err(Error::TruncatedDocument { element: "init" }),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Second sub-pass: re-reads the input and emits every `<event>` with its
    /// `<rwgt>` reduced to the single `<wgt>` matching `id`.
    fn write_filtered_events<W: Write>(&self, id: &str, writer: &mut Writer<W>) -> Result<()> {
        info!("  iterating over events");
        let mut reader = open_reader(&self.input)?;
        let mut buf = Vec::new();
        let mut event_number: u64 = 0;

        loop {
            let pos = reader.buffer_position();
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::xml(e, pos))?
            {
                Event::Start(e) if e.name().as_ref() == b"event" => {
                    writer.write_event(Event::Start(e))?;
                    copy_filtered_event(&mut reader, writer, id, event_number)?;
                    write_newline(writer)?;
                    event_number += 1;
                    if event_number % PROGRESS_INTERVAL == 0 {
                        info!("  ... processed {} events", event_number);
                    }
                }
                Event::Empty(e) if e.name().as_ref() == b"event" => {
                    return Err(Error::MissingRwgt { event_number });
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        info!("  processed {} events in total", event_number);
        Ok(())
    }
}

/// Copies the body of one `<header>` verbatim, replacing its direct-child
/// `<initrwgt>` with a block declaring exactly the target weight.
fn rewrite_header_body<R: BufRead, W: Write>(
    reader: &mut Reader<R>,
    writer: &mut Writer<W>,
    entry: &WeightEntry,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut replaced = false;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(e) if depth == 0 && e.name().as_ref() == b"initrwgt" => {
                writer.write_event(Event::Start(e))?;
                write_weight_entry(writer, entry)?;
                skip_to_end(reader, "initrwgt")?;
                writer.write_event(Event::End(BytesEnd::new("initrwgt")))?;
                replaced = true;
            }
            Event::Empty(e) if depth == 0 && e.name().as_ref() == b"initrwgt" => {
                // A self-closed <initrwgt/> still has to grow the weight block.
                writer.write_event(Event::Start(e))?;
                write_weight_entry(writer, entry)?;
                writer.write_event(Event::End(BytesEnd::new("initrwgt")))?;
                replaced = true;
            }
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                writer.write_event(Event::End(e))?;
                if depth == 0 {
                    return if replaced {
                        Ok(())
                    } else {
                        Err(Error::MissingInitRwgt)
                    };
                }
                depth -= 1;
            }
            Event::Eof => return Err(Error::TruncatedDocument { element: "header" }),
            other => writer.write_event(other)?,
        }
        buf.clear();
    }
}

/// Emits the single-weight replacement content of `<initrwgt>`: the group
/// shell rebuilt from its recorded attributes, holding one `<weight>`.
fn write_weight_entry<W: Write>(writer: &mut Writer<W>, entry: &WeightEntry) -> Result<()> {
    write_newline(writer)?;

    let mut group = BytesStart::new("weightgroup");
    for (key, value) in &entry.group.attributes {
        group.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(group))?;
    write_newline(writer)?;

    let mut weight = BytesStart::new("weight");
    for (key, value) in &entry.def.attributes {
        weight.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(weight))?;
    writer.write_event(Event::Text(BytesText::new(&entry.def.content)))?;
    writer.write_event(Event::End(BytesEnd::new("weight")))?;
    write_newline(writer)?;

    writer.write_event(Event::End(BytesEnd::new("weightgroup")))?;
    write_newline(writer)?;
    Ok(())
}

/// Copies one `<event>` body verbatim up to and including its end tag,
/// filtering the direct-child `<rwgt>` block down to the matching `<wgt>`.
fn copy_filtered_event<R: BufRead, W: Write>(
    reader: &mut Reader<R>,
    writer: &mut Writer<W>,
    id: &str,
    event_number: u64,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut saw_rwgt = false;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(e) if depth == 0 && e.name().as_ref() == b"rwgt" => {
                saw_rwgt = true;
                writer.write_event(Event::Start(e))?;
                copy_filtered_rwgt(reader, writer, id)?;
            }
            Event::Empty(e) if depth == 0 && e.name().as_ref() == b"rwgt" => {
                saw_rwgt = true;
                writer.write_event(Event::Empty(e))?;
            }
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                if depth == 0 {
                    if !saw_rwgt {
                        return Err(Error::MissingRwgt { event_number });
                    }
                    writer.write_event(Event::End(e))?;
                    return Ok(());
                }
                depth -= 1;
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => return Err(Error::TruncatedDocument { element: "event" }),
            other => writer.write_event(other)?,
        }
        buf.clear();
    }
}

/// Copies the inside of an already-opened `<rwgt>` block, keeping only the
/// first `<wgt>` whose id matches; every other `<wgt>` subtree is dropped.
/// No match at all leaves the emitted block empty.
fn copy_filtered_rwgt<R: BufRead, W: Write>(
    reader: &mut Reader<R>,
    writer: &mut Writer<W>,
    id: &str,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut kept = false;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(e) if e.name().as_ref() == b"wgt" => {
                if !kept && attribute_value(&e, b"id")?.as_deref() == Some(id) {
                    kept = true;
                    writer.write_event(Event::Start(e))?;
                    copy_to_end(reader, writer, "wgt")?;
                } else {
                    skip_to_end(reader, "wgt")?;
                }
            }
            Event::Empty(e) if e.name().as_ref() == b"wgt" => {
                if !kept && attribute_value(&e, b"id")?.as_deref() == Some(id) {
                    kept = true;
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) if e.name().as_ref() == b"rwgt" => {
                writer.write_event(Event::End(e))?;
                return Ok(());
            }
            Event::Eof => return Err(Error::TruncatedDocument { element: "rwgt" }),
            other => writer.write_event(other)?,
        }
        buf.clear();
    }
}

/// Copies events verbatim until the end tag matching an already-consumed
/// start tag, inclusive.
fn copy_to_end<R: BufRead, W: Write>(
    reader: &mut Reader<R>,
    writer: &mut Writer<W>,
    element: &'static str,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                writer.write_event(Event::End(e))?;
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(Error::TruncatedDocument { element }),
            other => writer.write_event(other)?,
        }
        buf.clear();
    }
}

/// Discards events until the end tag matching an already-consumed start tag.
fn skip_to_end<R: BufRead>(reader: &mut Reader<R>, element: &'static str) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::xml(e, pos))?
        {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(Error::TruncatedDocument { element }),
            _ => {}
        }
        buf.clear();
    }
}

fn write_newline<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    Ok(())
}

/// Derives the output path for one weight id by inserting it before the last
/// extension: `sample.lhe` with id `1001` becomes `sample.1001.lhe`. A path
/// whose file name has no extension gets `.1001` appended instead.
pub fn output_path_for(input: &Path, id: &str) -> PathBuf {
    match input.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => input.with_extension(format!("{id}.{ext}")),
        None => {
            let mut name = input.as_os_str().to_os_string();
            name.push(format!(".{id}"));
            PathBuf::from(name)
        }
    }
}
