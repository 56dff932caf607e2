//! Text extractors for file-like objects (PDF, OOXML, plain text, external
//! utilities).
//!
//! Each extractor implements [`TextExtractor`] and is registered into an
//! [`ExtractorChain`] by [`build_chain`]. Failures are reported as warnings on
//! stderr and treated as "no text" so projection carries on without the
//! `text` field.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use solr_bridge_core::extract::{ExtractorChain, TextExtractor};

use crate::config::ExtractorsConfig;

/// Maximum sheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet (avoids unbounded memory).
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Directories searched for external utilities when no path is configured.
const UTILITY_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin"];

#[derive(Debug)]
pub enum ExtractError {
    Io(String),
    Pdf(String),
    Ooxml(String),
    Command(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "read failed: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
            ExtractError::Command(e) => write!(f, "external extractor failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Turn an extraction result into the chain's `Option`, warning on failure.
fn report(name: &str, path: &Path, result: Result<String, ExtractError>) -> Option<String> {
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("Warning: {} could not extract {}: {}", name, path.display(), e);
            None
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ExtractError> {
    std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))
}

/// PDF text via `pdf-extract`.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn extract(&self, path: &Path) -> Option<String> {
        report(self.name(), path, read_file(path).and_then(|b| extract_pdf(&b)))
    }
}

/// Word, PowerPoint and Excel (OOXML) documents.
pub struct OfficeExtractor;

impl TextExtractor for OfficeExtractor {
    fn name(&self) -> &str {
        "ooxml"
    }

    fn extensions(&self) -> &[&'static str] {
        &["docx", "pptx", "xlsx"]
    }

    fn priority(&self) -> i32 {
        100
    }

    fn extract(&self, path: &Path) -> Option<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let result = read_file(path).and_then(|bytes| match extension.as_str() {
            "docx" => extract_docx(&bytes),
            "pptx" => extract_pptx(&bytes),
            _ => extract_xlsx(&bytes),
        });
        report(self.name(), path, result)
    }
}

/// Files that already are text.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt", "md", "csv"]
    }

    fn priority(&self) -> i32 {
        200
    }

    fn extract(&self, path: &Path) -> Option<String> {
        let result = read_file(path).map(|b| String::from_utf8_lossy(&b).into_owned());
        report(self.name(), path, result)
    }
}

/// An external utility that prints a document's text on stdout.
pub struct CommandExtractor {
    name: &'static str,
    program: PathBuf,
    args: &'static [&'static str],
    extensions: &'static [&'static str],
    priority: i32,
}

impl CommandExtractor {
    /// `pdftotext -enc UTF-8 <file> -`
    pub fn pdftotext(program: PathBuf) -> Self {
        Self {
            name: "pdftotext",
            program,
            args: &["-enc", "UTF-8"],
            extensions: &["pdf"],
            priority: 50,
        }
    }

    /// `catdoc <file>`
    pub fn catdoc(program: PathBuf) -> Self {
        Self {
            name: "catdoc",
            program,
            args: &[],
            extensions: &["doc"],
            priority: 100,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, path: &Path) -> Result<String, ExtractError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args).arg(path);
        if self.name == "pdftotext" {
            cmd.arg("-");
        }
        let output = cmd
            .output()
            .map_err(|e| ExtractError::Command(format!("{}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            return Err(ExtractError::Command(format!(
                "{} exited with {}",
                self.name, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextExtractor for CommandExtractor {
    fn name(&self) -> &str {
        self.name
    }

    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn extract(&self, path: &Path) -> Option<String> {
        report(self.name, path, self.run(path))
    }
}

/// Find an external utility: the configured path if it exists, else the
/// standard binary directories.
pub fn locate_utility(name: &str, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }
    UTILITY_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|p| p.is_file())
}

/// Every built-in extractor plus the external utilities that are installed.
pub fn build_chain(config: &ExtractorsConfig) -> ExtractorChain {
    let mut chain = ExtractorChain::new();
    chain.register(Box::new(PdfExtractor));
    chain.register(Box::new(OfficeExtractor));
    chain.register(Box::new(PlainTextExtractor));
    if let Some(program) = locate_utility("pdftotext", config.pdftotext.as_deref()) {
        chain.register(Box::new(CommandExtractor::pdftotext(program)));
    }
    if let Some(program) = locate_utility("catdoc", config.catdoc.as_deref()) {
        chain.register(Box::new(CommandExtractor::catdoc(program)));
    }
    chain
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::Pdf("parser panicked".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    collect_t_elements(&xml, " ")
}

fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let slide_names = numbered_entries(&archive, "ppt/slides/slide");
    let mut out = String::new();
    for name in slide_names {
        let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        let text = collect_t_elements(&xml, " ")?;
        if !out.is_empty() && !text.is_empty() {
            out.push(' ');
        }
        out.push_str(&text);
    }
    Ok(out)
}

/// Entries named `<prefix>N.xml`, ordered by N.
fn numbered_entries(archive: &zip::ZipArchive<std::io::Cursor<&[u8]>>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// Text of every `<*:t>` element, joined by `sep`.
fn collect_t_elements(xml: &[u8], sep: &str) -> Result<String, ExtractError> {
    let mut parts: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        parts.push(te.unescape().unwrap_or_default().into_owned());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(parts.join(sep))
}

fn extract_xlsx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_names = numbered_entries(&archive, "xl/worksheets/sheet");
    let mut out = String::new();
    for name in sheet_names.into_iter().take(XLSX_MAX_SHEETS) {
        let sheet_xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        let cell_texts = extract_xlsx_sheet_cells(&sheet_xml, &shared_strings)?;
        if !out.is_empty() && !cell_texts.is_empty() {
            out.push(' ');
        }
        out.push_str(&cell_texts);
    }
    Ok(out)
}

fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                } else if in_si && e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        strings.push(te.unescape().unwrap_or_default().into_owned());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn extract_xlsx_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<String, ExtractError> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_v = false;
    let mut cell_is_shared_str = false;
    while cells.len() < XLSX_MAX_CELLS_PER_SHEET {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = e.attributes().any(|a| {
                        a.as_ref()
                            .map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                } else if e.local_name().as_ref() == b"v" {
                    in_v = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_v => {
                let v = te.unescape().unwrap_or_default();
                let s = v.trim();
                if cell_is_shared_str {
                    if let Some(text) = s.parse::<usize>().ok().and_then(|i| shared_strings.get(i)) {
                        cells.push(text.clone());
                    }
                } else if !s.is_empty() {
                    cells.push(s.to_string());
                }
                in_v = false;
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"v" {
                    in_v = false;
                } else if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join(" "))
}
