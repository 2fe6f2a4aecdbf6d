//! Symbol-matching patterns.
//!
//! A pattern is immutable once registered. Matching is pure: it compares
//! against the symbol's display or linker-level name, where a missing
//! mangled name falls back to the display name.

use std::fmt;

use regex::Regex;

use crate::debugger::Symbol;

/// One symbol-matching rule.
#[derive(Debug, Clone)]
pub enum SymbolPattern {
    /// Exact match on the linker-level (mangled) name.
    ExactSystemName(String),
    /// Regex search over the linker-level name.
    RegexSystemName(Regex),
    /// Exact match on the display name.
    ExactDisplayName(String),
    /// Regex search over the display name.
    RegexDisplayName(Regex),
    /// Resolves directly against a file:line location, independent of
    /// symbol enumeration.
    SourceLocation { file: String, line: u32 },
}

impl SymbolPattern {
    pub fn system_name(name: &str) -> Self {
        SymbolPattern::ExactSystemName(name.to_string())
    }

    pub fn system_regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(SymbolPattern::RegexSystemName(Regex::new(pattern)?))
    }

    pub fn display_name(name: &str) -> Self {
        SymbolPattern::ExactDisplayName(name.to_string())
    }

    pub fn display_regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(SymbolPattern::RegexDisplayName(Regex::new(pattern)?))
    }

    pub fn source_location(file: &str, line: u32) -> Self {
        SymbolPattern::SourceLocation { file: file.to_string(), line }
    }

    /// Whether this pattern resolves against the symbol table at all.
    /// Source-location patterns resolve against line tables instead.
    pub fn is_symbolic(&self) -> bool {
        !matches!(self, SymbolPattern::SourceLocation { .. })
    }

    /// Test the pattern against one symbol.
    ///
    /// The display name defaults to empty when absent; the system name
    /// falls back to the display name when absent.
    pub fn matches(&self, symbol: &Symbol) -> bool {
        let display = symbol.display_name.as_deref().unwrap_or("");
        let system = symbol.system_name.as_deref().unwrap_or(display);

        match self {
            SymbolPattern::ExactSystemName(name) => name == system,
            SymbolPattern::RegexSystemName(re) => re.is_match(system),
            SymbolPattern::ExactDisplayName(name) => name == display,
            SymbolPattern::RegexDisplayName(re) => re.is_match(display),
            SymbolPattern::SourceLocation { .. } => false,
        }
    }
}

impl fmt::Display for SymbolPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolPattern::ExactSystemName(name) => write!(f, "{name}"),
            SymbolPattern::RegexSystemName(re) => write!(f, "/{}/", re.as_str()),
            SymbolPattern::ExactDisplayName(name) => write!(f, "{name}"),
            SymbolPattern::RegexDisplayName(re) => write!(f, "/{}/", re.as_str()),
            SymbolPattern::SourceLocation { file, line } => write!(f, "{file}:{line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(system: Option<&str>, display: Option<&str>) -> Symbol {
        Symbol {
            system_name: system.map(str::to_string),
            display_name: display.map(str::to_string),
        }
    }

    #[test]
    fn exact_system_name_matches_mangled() {
        let pattern = SymbolPattern::system_name("__rust_alloc");
        assert!(pattern.matches(&sym(Some("__rust_alloc"), Some("alloc"))));
        assert!(!pattern.matches(&sym(Some("__rust_dealloc"), Some("__rust_alloc"))));
    }

    #[test]
    fn system_name_falls_back_to_display_when_mangled_absent() {
        let pattern = SymbolPattern::system_name("main");
        assert!(pattern.matches(&sym(None, Some("main"))));
    }

    #[test]
    fn regex_searches_anywhere_in_the_name() {
        let pattern = SymbolPattern::system_regex("5clone17h").unwrap();
        assert!(pattern.matches(&sym(Some("_ZN3foo5clone17h0123456789abcdefE"), None)));
        assert!(!pattern.matches(&sym(Some("_ZN3foo4drop17h0123456789abcdefE"), None)));
    }

    #[test]
    fn display_patterns_ignore_the_mangled_name() {
        let pattern = SymbolPattern::display_regex("^core::ptr::drop_in_place").unwrap();
        assert!(pattern.matches(&sym(Some("_ZN4core3ptr13drop_in_place17h0E"), Some("core::ptr::drop_in_place<alloc::string::String>"))));
        assert!(!pattern.matches(&sym(Some("core::ptr::drop_in_place"), Some("something_else"))));
    }

    #[test]
    fn source_location_never_matches_symbols() {
        let pattern = SymbolPattern::source_location("sync/mutex.rs", 501);
        assert!(!pattern.matches(&sym(Some("anything"), Some("anything"))));
        assert_eq!(pattern.to_string(), "sync/mutex.rs:501");
    }

    #[test]
    fn nameless_symbol_matches_nothing() {
        let nameless = sym(None, None);
        assert!(!SymbolPattern::system_name("x").matches(&nameless));
        assert!(!SymbolPattern::display_name("x").matches(&nameless));
        // an empty-pattern regex does match the empty fallback name
        assert!(SymbolPattern::system_regex("^$").unwrap().matches(&nameless));
    }
}
