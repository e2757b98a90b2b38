//! Flat text and JSON export of generated variations.
//!
//! # Text format
//!
//! One section per variation, in output order, separated by a `---` line:
//!
//! ```text
//! # Variation 1
//! technique: Step-by-Step Thinking
//! source: anu
//! quantum: yes
//! length: 57
//!
//! Let's think through this step-by-step:
//!
//! Explain quantum computing
//!
//! ---
//!
//! # Variation 2
//! ...
//! ```
//!
//! `length` is the byte length of the text, which lets [`parse_document`]
//! restore arbitrary text (including lines that look like headers or
//! separators) exactly.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::generator::{Generation, Variation};

const SEPARATOR: &str = "\n---\n\n";

/// Render variations as a text document.
///
/// Fails if a technique or source name contains a line break, since names
/// are stored on single header lines.
pub fn to_document(variations: &[Variation]) -> Result<String> {
    let mut sections = Vec::with_capacity(variations.len());
    for v in variations {
        for (field, value) in [("technique", &v.technique_name), ("source", &v.source_name)] {
            if value.contains(['\n', '\r']) {
                return Err(Error::Export(format!(
                    "{field} name of variation {} contains a line break",
                    v.index
                )));
            }
        }
        sections.push(format!(
            "# Variation {}\ntechnique: {}\nsource: {}\nquantum: {}\nlength: {}\n\n{}\n",
            v.index,
            v.technique_name,
            v.source_name,
            if v.quantum_verified { "yes" } else { "no" },
            v.text.len(),
            v.text
        ));
    }
    Ok(sections.join(SEPARATOR))
}

/// Parse a document produced by [`to_document`].
pub fn parse_document(doc: &str) -> Result<Vec<Variation>> {
    let mut rest = doc;
    let mut variations = Vec::new();
    if rest.is_empty() {
        return Ok(variations);
    }

    loop {
        let index = take_line(&mut rest)?
            .strip_prefix("# Variation ")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| Error::Export("expected '# Variation N' header".to_string()))?;
        let technique_name = take_field(&mut rest, "technique")?.to_string();
        let source_name = take_field(&mut rest, "source")?.to_string();
        let quantum_verified = match take_field(&mut rest, "quantum")? {
            "yes" => true,
            "no" => false,
            other => return Err(Error::Export(format!("invalid quantum flag {other:?}"))),
        };
        let length = take_field(&mut rest, "length")?
            .parse::<usize>()
            .map_err(|_| Error::Export("invalid length".to_string()))?;
        if !take_line(&mut rest)?.is_empty() {
            return Err(Error::Export(
                "expected blank line after header".to_string(),
            ));
        }

        let text = rest
            .get(..length)
            .ok_or_else(|| Error::Export(format!("variation {index} text is truncated")))?;
        rest = rest[length..]
            .strip_prefix('\n')
            .ok_or_else(|| Error::Export(format!("variation {index} text length mismatch")))?;

        variations.push(Variation {
            index,
            text: text.to_string(),
            technique_name,
            source_name,
            quantum_verified,
        });

        if rest.is_empty() {
            return Ok(variations);
        }
        rest = rest
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| Error::Export("expected '---' between variations".to_string()))?;
    }
}

fn take_line<'a>(rest: &mut &'a str) -> Result<&'a str> {
    let (line, tail) = rest
        .split_once('\n')
        .ok_or_else(|| Error::Export("unexpected end of document".to_string()))?;
    *rest = tail;
    Ok(line)
}

fn take_field<'a>(rest: &mut &'a str, field: &str) -> Result<&'a str> {
    let line = take_line(rest)?;
    line.strip_prefix(field)
        .and_then(|l| l.strip_prefix(": "))
        .ok_or_else(|| Error::Export(format!("expected '{field}:' line, found {line:?}")))
}

/// Write the text document for `variations` to `path`.
pub fn write_document(path: &Path, variations: &[Variation]) -> Result<()> {
    fs::write(path, to_document(variations)?)?;
    Ok(())
}

/// Read and parse a text document from `path`.
pub fn read_document(path: &Path) -> Result<Vec<Variation>> {
    parse_document(&fs::read_to_string(path)?)
}

/// Pretty JSON for a whole generation.
pub fn to_json(generation: &Generation) -> Result<String> {
    Ok(serde_json::to_string_pretty(generation)?)
}

pub fn from_json(json: &str) -> Result<Generation> {
    Ok(serde_json::from_str(json)?)
}

/// `quantum_prompts_<unix seconds>.txt`
pub fn default_export_file_name(unix_secs: u64) -> String {
    format!("quantum_prompts_{unix_secs}.txt")
}
