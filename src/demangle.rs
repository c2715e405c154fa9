//! Best-effort symbol demangling
//!
//! Rust (legacy and v0) and Itanium C++ manglings are recognised through
//! `backtrace::SymbolName`. Only names carrying a mangling prefix are tried,
//! so a C function named `f` stays `f` rather than decoding as `float`.

use backtrace::SymbolName;
use std::fmt::Write;

/// Itanium (with up to two extra leading underscores) and Rust v0 prefixes
const MANGLING_PREFIXES: [&str; 4] = ["_Z", "__Z", "___Z", "_R"];

pub fn is_mangled(name: &str) -> bool {
    MANGLING_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Demangle a linkage name, falling back to the input when it is not mangled
pub fn demangle(mangled: &str) -> String {
    if !is_mangled(mangled) {
        return mangled.to_string();
    }
    let symbol = SymbolName::new(mangled.as_bytes());
    let mut demangled = String::new();
    if write!(demangled, "{}", symbol).is_err() || demangled.is_empty() {
        return mangled.to_string();
    }
    demangled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_c_name_unchanged() {
        assert_eq!(demangle("main"), "main");
        assert_eq!(demangle("compute_checksum"), "compute_checksum");
    }

    #[test]
    fn test_single_letter_c_name_unchanged() {
        for name in ["f", "i", "v", "d", "e", "c", "b", "s", "x", "Dn"] {
            assert_eq!(demangle(name), name);
        }
    }

    #[test]
    fn test_is_mangled() {
        assert!(is_mangled("_Z3sumPii"));
        assert!(is_mangled("__Z3sumPii"));
        assert!(is_mangled("_RNvCs1234_7mycrate3foo"));
        assert!(!is_mangled("main"));
        assert!(!is_mangled("Dn"));
    }

    #[test]
    fn test_itanium_cpp_name() {
        assert_eq!(demangle("_Z3sumPii"), "sum(int*, int)");
    }

    #[test]
    fn test_rust_legacy_name() {
        let name = demangle("_ZN4core3fmt5write17h0123456789abcdefE");
        assert!(name.starts_with("core::fmt::write"), "got {}", name);
    }

    #[test]
    fn test_garbage_falls_back() {
        assert_eq!(demangle("_Z"), "_Z");
        assert_eq!(demangle(""), "");
    }
}
