use std::fmt;

use crate::engine::assets::AssetNamespace;

/// Number of digits in a millisecond epoch stamp for any date this side of 2286.
const STAMP_DIGITS: usize = 13;

/// A local, logical reference to a stored asset: `/<alias>/<filename>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    namespace: AssetNamespace,
    filename: String,
}

impl VirtualPath {
    pub fn new(namespace: AssetNamespace, filename: &str) -> Self {
        Self {
            namespace,
            filename: filename.to_string(),
        }
    }

    /// Parses a local path after [`clean_path`]. Anything that is not
    /// `/<known alias>/<non-empty filename>` yields `None`.
    pub fn parse(src: &str) -> Option<Self> {
        let cleaned = clean_path(src);
        let rest = cleaned.strip_prefix('/')?;
        let (alias, filename) = rest.split_once('/')?;
        if filename.is_empty() || filename.contains('/') {
            return None;
        }
        let namespace = AssetNamespace::from_alias(alias)?;
        Some(Self::new(namespace, filename))
    }

    pub fn namespace(&self) -> AssetNamespace {
        self.namespace
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.namespace.alias(), self.filename)
    }
}

/// True when `src` starts with a recognised local alias, e.g. `/images/`.
pub fn is_local(src: &str) -> bool {
    AssetNamespace::ALL
        .iter()
        .any(|ns| src.starts_with(&format!("/{}/", ns.alias())))
}

/// Reduces an upload's original name to `[A-Za-z0-9.]` with a `.jpg` extension.
pub fn sanitize_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "image.jpg".to_string()
    } else {
        format!("{}.jpg", cleaned)
    }
}

fn stamp_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() > STAMP_DIGITS
        && bytes[..STAMP_DIGITS].iter().all(u8::is_ascii_digit)
        && bytes[STAMP_DIGITS] == b'-'
    {
        Some(STAMP_DIGITS + 1)
    } else {
        None
    }
}

/// Collapses stacked `<stamp>-` prefixes down to the innermost one.
pub fn clean_filename(filename: &str) -> &str {
    let mut name = filename;
    while let Some(len) = stamp_len(name) {
        if stamp_len(&name[len..]).is_none() {
            break;
        }
        name = &name[len..];
    }
    name
}

/// Strips query strings and fragments and collapses re-applied stamp prefixes.
///
/// Running it on its own output is a no-op.
pub fn clean_path(src: &str) -> String {
    let end = src.find(['?', '#']).unwrap_or(src.len());
    let path = &src[..end];
    match path.rfind('/') {
        Some(idx) => format!("{}{}", &path[..=idx], clean_filename(&path[idx + 1..])),
        None => clean_filename(path).to_string(),
    }
}
