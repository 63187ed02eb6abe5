//! Internal utilities.

/// Splits a comma-separated CLI list, trimming whitespace and skipping
/// empty entries.
pub fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Checks whether the process runs with an effective UID of 0.
///
/// The configuration store silently rejects writes from unprivileged
/// processes, so callers use this to warn early.
#[must_use]
pub fn is_root() -> bool {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
