//! Host-side instruction counting
//!
//! The host implementation is never executed here. A [`HostInstructionCounter`]
//! answers one question: given a function name, does it resolve to a callable
//! in the host module, and how many instructions does that callable hold?
//! Resolution failure is structural (the two suites have drifted apart) and
//! therefore an error, unlike a missing GS count.

use crate::error::{ParityError, Result};
use crate::host_source::HostModule;
use crate::listing::{InstructionListing, ListingDialect};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Capability: resolve a host function and count its instructions
pub trait HostInstructionCounter {
    /// Instruction count of the named host function
    ///
    /// Returns [`ParityError::UnresolvedHostFunction`] when the name does not
    /// resolve to a callable.
    fn instruction_count(&self, name: &str) -> Result<u64>;
}

/// Counts taken from the host's own disassembly (`python -m dis module.py`)
///
/// A name resolves only when it is a top-level function of the host module
/// and the disassembly holds a code object for it. Methods, nested functions
/// and earlier rebound definitions may share the name; the code object whose
/// first line matches the definition the name is bound to is preferred.
#[derive(Debug, Clone)]
pub struct DisassemblyCounter {
    counts: HashMap<String, u64>,
}

impl DisassemblyCounter {
    /// Build from disassembly text and the parsed host module
    pub fn new(disassembly: &str, module: &HostModule) -> Result<Self> {
        let dialect = ListingDialect::python_dis()?;
        let listing = InstructionListing::parse(disassembly, &dialect);
        Ok(Self::from_listing(&listing, module))
    }

    /// Build from an already parsed disassembly
    pub fn from_listing(listing: &InstructionListing, module: &HostModule) -> Self {
        let mut counts = HashMap::new();

        for span in module.scopes().iter() {
            let expected_line = module.code_first_line(&span.name);
            let mut candidates = listing
                .sections()
                .iter()
                .filter(|section| section.name == span.name);

            let Some(first) = candidates.next() else {
                tracing::warn!("No code object for host function `{}`", span.name);
                continue;
            };

            let matched = std::iter::once(first)
                .chain(candidates)
                .find(|section| section.first_line.is_some() && section.first_line == expected_line);
            let chosen = match matched {
                Some(section) => section,
                None => {
                    tracing::warn!(
                        "No code object for `{}` starts on line {:?}; using the one on line {:?}",
                        span.name,
                        expected_line,
                        first.first_line
                    );
                    first
                }
            };
            counts.insert(span.name.clone(), chosen.count);
        }

        tracing::debug!("Resolved {} host functions from disassembly", counts.len());
        Self { counts }
    }
}

impl HostInstructionCounter for DisassemblyCounter {
    fn instruction_count(&self, name: &str) -> Result<u64> {
        self.counts
            .get(name)
            .copied()
            .ok_or_else(|| ParityError::UnresolvedHostFunction {
                name: name.to_string(),
            })
    }
}

/// Precomputed `{ "function": count }` table
#[derive(Debug, Clone, Default)]
pub struct CountTable {
    counts: BTreeMap<String, u64>,
}

impl CountTable {
    /// Load a JSON count table
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = crate::error::read_input(path)?;
        Self::from_contents(path, &contents)
    }

    /// Parse a table already read from `path`
    pub fn from_contents(path: &Path, contents: &str) -> Result<Self> {
        Self::from_json(contents).map_err(|e| ParityError::InvalidCountTable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse a JSON count table
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let counts: BTreeMap<String, u64> = serde_json::from_str(json)?;
        Ok(Self { counts })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for CountTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

impl HostInstructionCounter for CountTable {
    fn instruction_count(&self, name: &str) -> Result<u64> {
        self.counts
            .get(name)
            .copied()
            .ok_or_else(|| ParityError::UnresolvedHostFunction {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HOST_SOURCE: &str = "\
class Animal:
    def speak(self):
        return 1


def speak():
    return 2


def helper():
    pass
";

    const HOST_DIS: &str = r#"  0           0 RESUME                   0

Disassembly of <code object Animal at 0x1000, file "demo.py", line 1>:
  1           0 RESUME                   0
              2 LOAD_NAME                0 (__name__)
              4 RETURN_CONST             0 (None)

Disassembly of <code object speak at 0x1200, file "demo.py", line 6>:
  6           0 RESUME                   0
  7           2 LOAD_CONST               1 (2)
              4 NOP
              6 RETURN_VALUE

Disassembly of <code object speak at 0x1100, file "demo.py", line 2>:
  2           0 RESUME                   0
  3           2 RETURN_CONST             1 (1)
"#;

    #[test]
    fn test_disassembly_prefers_top_level_code_object() {
        let module = HostModule::parse(HOST_SOURCE).unwrap();
        let counter = DisassemblyCounter::new(HOST_DIS, &module).unwrap();
        assert_eq!(counter.instruction_count("speak").unwrap(), 4);
    }

    #[test]
    fn test_disassembly_missing_code_object_is_unresolved() {
        let module = HostModule::parse(HOST_SOURCE).unwrap();
        let counter = DisassemblyCounter::new(HOST_DIS, &module).unwrap();
        let err = counter.instruction_count("helper").unwrap_err();
        assert!(matches!(err, ParityError::UnresolvedHostFunction { ref name } if name == "helper"));
    }

    #[test]
    fn test_disassembly_non_top_level_is_unresolved() {
        let module = HostModule::parse(HOST_SOURCE).unwrap();
        let counter = DisassemblyCounter::new(HOST_DIS, &module).unwrap();
        assert!(counter.instruction_count("Animal").is_err());
    }

    #[test]
    fn test_disassembly_counts_rebound_definition() {
        let source = "def f():\n    return 1\n\n\ndef f():\n    a = 1\n    b = 2\n    return a + b\n";
        let disassembly = r#"  0           0 RESUME                   0

Disassembly of <code object f at 0x2000, file "edge.py", line 1>:
  1           0 RESUME                   0
  2           2 RETURN_CONST             1 (1)

Disassembly of <code object f at 0x2100, file "edge.py", line 5>:
  5           0 RESUME                   0
  6           2 LOAD_CONST               1 (1)
              4 STORE_FAST               0 (a)
  7           6 LOAD_CONST               2 (2)
              8 STORE_FAST               1 (b)
  8          10 LOAD_FAST_LOAD_FAST     1 (a, b)
             12 BINARY_OP                0 (+)
             16 RETURN_VALUE
"#;
        let module = HostModule::parse(source).unwrap();
        let counter = DisassemblyCounter::new(disassembly, &module).unwrap();
        assert_eq!(counter.instruction_count("f").unwrap(), 8);
    }

    #[test]
    fn test_disassembly_falls_back_to_first_code_object() {
        // Stale listing: no code object starts on the `def speak` line
        let disassembly = r#"Disassembly of <code object speak at 0x1100, file "demo.py", line 2>:
  2           0 RESUME                   0
  3           2 RETURN_CONST             1 (1)

Disassembly of <code object speak at 0x1300, file "demo.py", line 40>:
 40           0 RESUME                   0
"#;
        let module = HostModule::parse(HOST_SOURCE).unwrap();
        let counter = DisassemblyCounter::new(disassembly, &module).unwrap();
        assert_eq!(counter.instruction_count("speak").unwrap(), 2);
    }

    #[test]
    fn test_count_table_lookup() {
        let table = CountTable::from_json(r#"{"foo": 5, "bar": 2}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.instruction_count("foo").unwrap(), 5);
        assert!(table.instruction_count("baz").is_err());
    }

    #[test]
    fn test_count_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"main": 12}"#).unwrap();
        file.flush().unwrap();

        let table = CountTable::from_file(file.path()).unwrap();
        assert_eq!(table.instruction_count("main").unwrap(), 12);
    }

    #[test]
    fn test_count_table_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json }").unwrap();
        file.flush().unwrap();

        let err = CountTable::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ParityError::InvalidCountTable { .. }));
    }

    #[test]
    fn test_count_table_negative_count_rejected() {
        assert!(CountTable::from_json(r#"{"foo": -1}"#).is_err());
    }
}
