use crate::error::ValidationError;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Conservative maximum path length for hosts that cap it (Windows MAX_PATH).
pub const DEFAULT_MAX_PATH_LEN: usize = 260;

const ILLEGAL_CHARS: [char; 4] = ['<', '>', '"', '|'];

const MAX_LINK_HOPS: usize = 40;

/// Validates a user-supplied relative backup directory and resolves it under `trusted_root`.
///
/// Never touches the filesystem beyond canonicalizing existing ancestors, so a rejected
/// path leaves no trace.
pub fn validate_backup_path(candidate: &str, trusted_root: &Path) -> Result<PathBuf, ValidationError> {
    validate_backup_path_with_limit(candidate, trusted_root, DEFAULT_MAX_PATH_LEN)
}

pub fn validate_backup_path_with_limit(
    candidate: &str,
    trusted_root: &Path,
    max_len: usize,
) -> Result<PathBuf, ValidationError> {
    if candidate.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if candidate.contains('\0') {
        return Err(ValidationError::NullByte);
    }
    if candidate.chars().any(|ch| ch.is_control() || ILLEGAL_CHARS.contains(&ch)) {
        return Err(ValidationError::InvalidCharacters);
    }
    if has_drive_prefix(candidate) || is_singly_rooted(candidate) {
        return Err(ValidationError::Absolute);
    }
    if candidate.starts_with("\\\\") || candidate.starts_with("//") {
        return Err(ValidationError::NetworkPath);
    }

    let root = fs::canonicalize(trusted_root).map_err(|err| ValidationError::RootUnavailable {
        root: trusted_root.to_path_buf(),
        reason: err.to_string(),
    })?;
    let mut joined = root.clone();
    for segment in candidate.split(['/', '\\']) {
        joined.push(segment);
    }
    let resolved = resolve_existing_prefix(&normalize_lexically(&joined))
        .ok_or_else(|| ValidationError::OutsideRoot { root: root.clone() })?;

    let len = resolved.as_os_str().to_string_lossy().chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong { len, max: max_len });
    }
    if !resolved.starts_with(&root) {
        return Err(ValidationError::OutsideRoot { root });
    }
    Ok(resolved)
}

fn has_drive_prefix(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!((chars.next(), chars.next()), (Some(letter), Some(':')) if letter.is_ascii_alphabetic())
}

// A doubled leading separator is a network share and is reported separately.
fn is_singly_rooted(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match (chars.next(), chars.next()) {
        (Some(first), second) if is_separator(first) => !second.is_some_and(is_separator),
        _ => false,
    }
}

fn is_separator(ch: char) -> bool {
    ch == '/' || ch == '\\'
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Canonicalizes the deepest ancestor that exists so symlinks inside the root are followed,
/// then re-appends the part that has not been created yet. Dangling links are followed by
/// hand; `None` means a link could not be resolved.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut pending = Vec::new();
    let mut hops = 0usize;
    loop {
        if let Ok(canonical) = fs::canonicalize(&existing) {
            let mut resolved = canonical;
            for name in pending.iter().rev() {
                resolved.push(name);
            }
            return Some(resolved);
        }
        // canonicalize also fails on a link whose target is missing.
        if fs::symlink_metadata(&existing).is_ok_and(|meta| meta.file_type().is_symlink()) {
            hops += 1;
            if hops > MAX_LINK_HOPS {
                return None;
            }
            let target = fs::read_link(&existing).ok()?;
            let base = existing.parent().map(Path::to_path_buf).unwrap_or_default();
            existing = normalize_lexically(&base.join(target));
            continue;
        }
        pending.push(existing.file_name()?.to_os_string());
        if !existing.pop() {
            return None;
        }
    }
}
