/// Required-versus-supported extension check
///
/// Both instance and device bring-up run the same check: every required name must appear
/// in the list the platform reports, otherwise startup fails listing what is missing.

use rustc_hash::FxHashSet;
use crate::error::{Error, ExtensionKind, Result};

/// Names in `required` that are absent from `supported`
///
/// Preserves the order of `required` and reports each missing name once.
pub fn missing_extensions<R, S>(required: &[R], supported: &[S]) -> Vec<String>
where
    R: AsRef<str>,
    S: AsRef<str>,
{
    let supported: FxHashSet<&str> = supported.iter().map(AsRef::as_ref).collect();
    let mut seen = FxHashSet::default();

    required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !supported.contains(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Fail with `Error::MissingExtensions` unless every required name is supported
pub fn ensure_supported<R, S>(kind: ExtensionKind, required: &[R], supported: &[S]) -> Result<()>
where
    R: AsRef<str>,
    S: AsRef<str>,
{
    let missing = missing_extensions(required, supported);
    if missing.is_empty() {
        return Ok(());
    }

    crate::engine_error!(
        "prerotation::extensions",
        "Missing {} extensions: {}",
        kind,
        missing.join(", ")
    );
    Err(Error::MissingExtensions { kind, missing })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "extensions_tests.rs"]
mod tests;
