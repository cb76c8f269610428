//! Sorting compiler failures into compile and link errors.

/// Linker failures across GNU ld, lld and Apple ld64.
const LINK_PATTERNS: &[&str] = &[
  "error: linking with",
  "cannot find -l",
  "unable to find library -l",
  "undefined reference to",
  "ld: library not found",
  "ld returned 1 exit status",
  "Undefined symbols for architecture",
];

/// A `*-sys` build script that could not locate a native library.
const PKG_CONFIG_PATTERNS: &[&str] = &[
  "was not found in the pkg-config search path",
  "The system library `",
  "Could not run `PKG_CONFIG",
  "pkg-config has not been configured to support cross-compilation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  Compile,
  Link,
}

/// Classify failed-build diagnostics.
///
/// Anything that is not recognizably a missing or unlinkable native library
/// is a compile error.
pub fn classify(diagnostics: &str) -> FailureKind {
  let is_link = LINK_PATTERNS
    .iter()
    .chain(PKG_CONFIG_PATTERNS)
    .any(|pattern| diagnostics.contains(pattern));
  if is_link { FailureKind::Link } else { FailureKind::Compile }
}
