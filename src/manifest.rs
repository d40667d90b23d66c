//! Target manifest patching
//!
//! Rewrites the one `ItemGroup` of an MSBuild project file that this tool
//! owns, replacing its children with linked `Compile` items.
//!
//! The document is streamed event by event, so everything outside the managed
//! group (declaration, comments, other groups, whitespace) is written back
//! exactly as it was read.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;
use std::fs;
use std::io::ErrorKind;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;

use crate::mirror::LinkDescriptor;
use crate::scaffold::{ASSEMBLY_INFO_FILE, PROPERTIES_DIR};

/// Default namespace of MSBuild project files
pub const MSBUILD_NAMESPACE: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

const CONTAINER_ELEMENT: &str = "ItemGroup";
const TRACKED_ELEMENT: &str = "Compile";
const LINK_ELEMENT: &str = "Link";
const INCLUDE_ATTRIBUTE: &str = "Include";
const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Target project file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read target project file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed target project at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error(
        "Target project has no <ItemGroup> holding <Compile> items and no empty <ItemGroup> to fill"
    )]
    NoInsertionPoint,
    #[error("Failed to render target project: {0}")]
    Render(String),
    #[error("Failed to write target project file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The container chosen to receive the link items.
///
/// The index counts `ItemGroup` elements directly under the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// A group that already held `Compile` items
    Tracked(usize),
    /// Fallback: a group with no child elements at all
    Empty(usize),
}

impl InsertionPoint {
    pub fn index(self) -> usize {
        match self {
            InsertionPoint::Tracked(index) | InsertionPoint::Empty(index) => index,
        }
    }
}

/// Outcome of a patch
#[derive(Debug)]
pub struct PatchResult {
    /// Patched document text
    pub content: String,
    pub insertion: InsertionPoint,
    /// Child elements removed from the managed group
    pub removed: usize,
    /// `Compile` items written, including the metadata entry
    pub written: usize,
}

/// Include path of the fixed assembly-metadata entry.
pub fn metadata_include() -> String {
    format!("{PROPERTIES_DIR}{MAIN_SEPARATOR}{ASSEMBLY_INFO_FILE}")
}

/// Patch the project file at `path` in place.
///
/// With `dry_run` the patched document is produced but not written.
pub fn patch_manifest(
    path: &Path,
    links: &[LinkDescriptor],
    dry_run: bool,
) -> Result<PatchResult, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ManifestError::NotFound(path.to_path_buf())
        } else {
            ManifestError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let result = patch_document(&content, links)?;

    if !dry_run {
        fs::write(path, &result.content).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    tracing::debug!(
        path = %path.display(),
        removed = result.removed,
        written = result.written,
        "Patched target project"
    );

    Ok(result)
}

/// Patch project file text, returning the rewritten document.
pub fn patch_document(
    content: &str,
    links: &[LinkDescriptor],
) -> Result<PatchResult, ManifestError> {
    let (bom, body) = match content.strip_prefix(UTF8_BOM) {
        Some(rest) => (true, rest),
        None => (false, content),
    };

    let insertion = select_insertion_point(body)?;
    let newline = if body.contains("\r\n") { "\r\n" } else { "\n" };

    let mut reader = NsReader::from_str(body);
    let mut writer = Writer::new(Vec::with_capacity(body.len() + links.len() * 128));
    let mut depth = 0usize;
    let mut ordinal = 0usize;
    let mut indent = String::new();
    let mut removed = 0usize;

    loop {
        let (in_namespace, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (is_msbuild(&ns), event),
            Err(e) => return Err(malformed(&reader, e)),
        };

        match event {
            Event::Start(e) if is_container(depth, in_namespace, &e) => {
                let selected = ordinal == insertion.index();
                ordinal += 1;
                if !selected {
                    depth += 1;
                    emit(&mut writer, Event::Start(e))?;
                    continue;
                }

                let end = e.to_end().into_owned();
                emit(&mut writer, Event::Start(e))?;
                removed = skip_children(&mut reader)?;
                write_entries(&mut writer, links, &indent, newline)?;
                emit(&mut writer, Event::End(end))?;
            }
            Event::Empty(e) if is_container(depth, in_namespace, &e) => {
                let selected = ordinal == insertion.index();
                ordinal += 1;
                if !selected {
                    emit(&mut writer, Event::Empty(e))?;
                    continue;
                }

                let end = e.to_end().into_owned();
                emit(&mut writer, Event::Start(expand_empty(&e)))?;
                write_entries(&mut writer, links, &indent, newline)?;
                emit(&mut writer, Event::End(end))?;
            }
            Event::Start(e) => {
                depth += 1;
                emit(&mut writer, Event::Start(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                emit(&mut writer, Event::End(e))?;
            }
            Event::Text(e) => {
                indent = trailing_indent(&e);
                emit(&mut writer, Event::Text(e))?;
            }
            Event::Eof => break,
            other => emit(&mut writer, other)?,
        }
    }

    let mut content = String::from_utf8(writer.into_inner())
        .map_err(|e| ManifestError::Render(e.to_string()))?;
    if bom {
        content.insert(0, UTF8_BOM);
    }

    Ok(PatchResult {
        content,
        insertion,
        removed,
        written: links.len() + 1,
    })
}

#[derive(Debug, Default)]
struct ContainerScan {
    has_elements: bool,
    has_tracked: bool,
}

/// Pick the group to rewrite: the first holding `Compile` items, otherwise
/// the first without any child elements.
pub fn select_insertion_point(content: &str) -> Result<InsertionPoint, ManifestError> {
    let mut reader = NsReader::from_str(content);
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<ContainerScan> = None;
    let mut containers = Vec::new();

    loop {
        let (in_namespace, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (is_msbuild(&ns), event),
            Err(e) => return Err(malformed(&reader, e)),
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                if depth == 0 {
                    seen_root = true;
                } else if is_container(depth, in_namespace, e) {
                    if is_empty {
                        containers.push(ContainerScan::default());
                    } else {
                        current = Some(ContainerScan::default());
                    }
                } else if depth == 2
                    && let Some(scan) = current.as_mut()
                {
                    scan.has_elements = true;
                    if in_namespace && e.local_name().as_ref() == TRACKED_ELEMENT.as_bytes() {
                        scan.has_tracked = true;
                    }
                }

                if !is_empty {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1
                    && let Some(scan) = current.take()
                {
                    containers.push(scan);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root || depth != 0 {
        return Err(ManifestError::Malformed {
            position: reader.buffer_position() as u64,
            message: "document has no complete root element".to_string(),
        });
    }

    if let Some(index) = containers.iter().position(|c| c.has_tracked) {
        return Ok(InsertionPoint::Tracked(index));
    }
    if let Some(index) = containers.iter().position(|c| !c.has_elements) {
        return Ok(InsertionPoint::Empty(index));
    }
    Err(ManifestError::NoInsertionPoint)
}

fn is_msbuild(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == MSBUILD_NAMESPACE.as_bytes())
}

fn is_container(depth: usize, in_namespace: bool, element: &BytesStart) -> bool {
    depth == 1 && in_namespace && element.local_name().as_ref() == CONTAINER_ELEMENT.as_bytes()
}

/// Consume everything up to and including the end tag of the element whose
/// start tag was just read. Returns the number of direct child elements.
fn skip_children(reader: &mut NsReader<&[u8]>) -> Result<usize, ManifestError> {
    let mut depth = 0usize;
    let mut children = 0usize;

    loop {
        match reader.read_event().map_err(|e| malformed(reader, e))? {
            Event::Start(_) => {
                if depth == 0 {
                    children += 1;
                }
                depth += 1;
            }
            Event::Empty(_) if depth == 0 => children += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(children);
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ManifestError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: format!("unclosed <{CONTAINER_ELEMENT}>"),
                });
            }
            _ => {}
        }
    }
}

fn write_entries(
    writer: &mut Writer<Vec<u8>>,
    links: &[LinkDescriptor],
    container_indent: &str,
    newline: &str,
) -> Result<(), ManifestError> {
    let unit = if container_indent.contains('\t') {
        "\t"
    } else {
        "  "
    };
    let item_indent = format!("{newline}{container_indent}{unit}");
    let link_indent = format!("{item_indent}{unit}");

    for link in links {
        let mut compile = BytesStart::new(TRACKED_ELEMENT);
        compile.push_attribute((INCLUDE_ATTRIBUTE, link.include.as_str()));

        emit(writer, Event::Text(BytesText::new(&item_indent)))?;
        emit(writer, Event::Start(compile))?;
        emit(writer, Event::Text(BytesText::new(&link_indent)))?;
        emit(writer, Event::Start(BytesStart::new(LINK_ELEMENT)))?;
        emit(writer, Event::Text(BytesText::new(&link.alias)))?;
        emit(writer, Event::End(BytesEnd::new(LINK_ELEMENT)))?;
        emit(writer, Event::Text(BytesText::new(&item_indent)))?;
        emit(writer, Event::End(BytesEnd::new(TRACKED_ELEMENT)))?;
    }

    let metadata = metadata_include();
    let mut compile = BytesStart::new(TRACKED_ELEMENT);
    compile.push_attribute((INCLUDE_ATTRIBUTE, metadata.as_str()));
    emit(writer, Event::Text(BytesText::new(&item_indent)))?;
    emit(writer, Event::Empty(compile))?;

    let closing = format!("{newline}{container_indent}");
    emit(writer, Event::Text(BytesText::new(&closing)))
}

/// Start tag equivalent of a self-closing element, without the whitespace
/// that preceded `/>`.
fn expand_empty(element: &BytesStart) -> BytesStart<'static> {
    let content = String::from_utf8_lossy(element).trim_end().to_string();
    BytesStart::from_content(content, element.name().as_ref().len())
}

/// Whitespace following the last line break of a text node, used as the
/// indentation of the element that comes next.
fn trailing_indent(text: &BytesText) -> String {
    let raw = String::from_utf8_lossy(text);
    match raw.rfind('\n') {
        Some(pos) => raw[pos + 1..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect(),
        None => String::new(),
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<(), ManifestError> {
    writer
        .write_event(event)
        .map_err(|e| ManifestError::Render(e.to_string()))
}

fn malformed(reader: &NsReader<&[u8]>, error: quick_xml::Error) -> ManifestError {
    ManifestError::Malformed {
        position: reader.buffer_position() as u64,
        message: error.to_string(),
    }
}
