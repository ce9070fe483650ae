//! Instruction listing parser
//!
//! A listing is a disassembly split into per-function sections by header
//! lines. The parser is a two-state scanner: outside any function, or inside
//! function X. A header opens a fresh zero counter; every instruction-shaped
//! line inside a section increments it; anything else (column legends,
//! separators, constant pools, blank lines) is noise. There is no end marker,
//! the next header closes the current section.
//!
//! Supported listings:
//! - GS bytecode (`.opcode.dis`): `func name(a, b) locals=..` then rows of
//!   `idx off line:col OPCODE a b note`
//! - GS IR (`.ir.dis`): same headers, rows of `idx line:col OP a b delta note`
//! - Python `dis` output: `Disassembly of <code object name at 0x.., file "..", line N>:`
//!   then rows whose first token after line/offset/label columns is an
//!   upper-case mnemonic

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Format of a GS instruction listing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ListingFormat {
    /// Bytecode disassembly: `idx off line:col op ...`
    #[default]
    Opcode,
    /// IR disassembly: `idx line:col op ...`
    Ir,
}

/// Header and instruction-line grammar of one listing format
#[derive(Debug, Clone)]
pub struct ListingDialect {
    header: Regex,
    instruction: Regex,
}

impl ListingDialect {
    /// Build a dialect from raw patterns
    ///
    /// The header pattern must capture the function name in a `name` group
    /// (or its first group); an optional `line` group carries the first
    /// source line of the function.
    pub fn new(header: &str, instruction: &str) -> Result<Self> {
        Ok(Self {
            header: Regex::new(header)?,
            instruction: Regex::new(instruction)?,
        })
    }

    /// GS bytecode listing (`<index> <offset> <line:col> <opcode>`)
    pub fn gs_opcode() -> Result<Self> {
        Self::new(
            r"^func\s+(?P<name>[^(]+)\(",
            r"^\s*\d+\s+\d+\s+\d+:\d+\s+\S+",
        )
    }

    /// GS IR listing (`<index> <line:col> <opcode>`, no offset column)
    pub fn gs_ir() -> Result<Self> {
        Self::new(r"^func\s+(?P<name>[^(]+)\(", r"^\s*\d+\s+\d+:\d+\s+\S+")
    }

    /// Dialect for a GS listing format
    pub fn for_format(format: ListingFormat) -> Result<Self> {
        match format {
            ListingFormat::Opcode => Self::gs_opcode(),
            ListingFormat::Ir => Self::gs_ir(),
        }
    }

    /// CPython `dis` module output (3.11 through 3.13 layouts)
    pub fn python_dis() -> Result<Self> {
        Self::new(
            r#"^Disassembly of <code object (?P<name>\S+) at 0x[0-9A-Fa-f]+, file "[^"]*", line (?P<line>\d+)>:"#,
            r"^\s*(?:(?:\d+|--)\s+)?(?:-->\s+)?(?:>>\s+)?(?:\d+\s+)?(?:L\d+:\s+)?[A-Z_]{2,}(?:\s|$)",
        )
    }

    fn header<'t>(&self, line: &'t str) -> Option<(&'t str, Option<usize>)> {
        let caps = self.header.captures(line)?;
        let name = caps.name("name").or_else(|| caps.get(1))?.as_str().trim();
        let first_line = caps.name("line").and_then(|m| m.as_str().parse().ok());
        Some((name, first_line))
    }

    /// Whether a line has the instruction-row shape
    pub fn is_instruction(&self, line: &str) -> bool {
        self.instruction.is_match(line)
    }
}

/// One function section of a listing, in listing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSection {
    pub name: String,
    /// First source line, when the header carries one
    pub first_line: Option<usize>,
    pub count: u64,
}

/// Parsed listing: ordered sections plus a name-keyed count map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionListing {
    sections: Vec<ListingSection>,
    counts: HashMap<String, u64>,
}

impl InstructionListing {
    /// Scan a listing
    pub fn parse(text: &str, dialect: &ListingDialect) -> Self {
        let mut sections: Vec<ListingSection> = Vec::new();
        let mut current: Option<usize> = None;

        for line in text.lines() {
            if let Some((name, first_line)) = dialect.header(line) {
                current = Some(sections.len());
                sections.push(ListingSection {
                    name: name.to_string(),
                    first_line,
                    count: 0,
                });
                continue;
            }

            if let Some(idx) = current {
                if dialect.is_instruction(line) {
                    sections[idx].count += 1;
                }
            }
        }

        // A repeated header opens a fresh counter, so the later section wins
        let mut counts = HashMap::with_capacity(sections.len());
        for section in &sections {
            if counts.insert(section.name.clone(), section.count).is_some() {
                tracing::warn!("Listing declares `{}` more than once", section.name);
            }
        }

        tracing::debug!(
            "Parsed {} listing sections, {} instructions",
            sections.len(),
            sections.iter().map(|s| s.count).sum::<u64>()
        );

        Self { sections, counts }
    }

    /// Instruction count for a function, if the listing has it
    pub fn count(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    /// Name-keyed counts
    pub fn counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    /// Sections in listing order
    pub fn sections(&self) -> &[ListingSection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Parse a GS bytecode listing into name → instruction count
pub fn parse_gs_listing(text: &str) -> Result<HashMap<String, u64>> {
    let dialect = ListingDialect::gs_opcode()?;
    Ok(InstructionListing::parse(text, &dialect).counts)
}
