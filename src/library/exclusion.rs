use std::collections::BTreeSet;

/// Segment names to skip during playback.
///
/// Names are compared case-insensitively and without extension, so
/// `"SPC1.ACM"`, `"spc1"` and `" SPC1 "` are the same filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
    enabled: bool,
}

/// Canonical form of a segment name: trimmed, extension stripped, upper-cased.
pub fn normalize_segment_name(name: &str) -> String {
    let name = name.trim();
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.trim_end(),
        _ => name,
    };
    stem.to_ascii_uppercase()
}

impl ExclusionSet {
    pub fn new(enabled: bool) -> Self {
        Self {
            names: BTreeSet::new(),
            enabled,
        }
    }

    pub fn from_names<I, S>(names: I, enabled: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new(enabled);
        for n in names {
            set.insert(n.as_ref());
        }
        set
    }

    /// Add a filter. Returns `false` for blanks and names already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = normalize_segment_name(name);
        if key.is_empty() {
            return false;
        }
        self.names.insert(key)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(&normalize_segment_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_segment_name(name))
    }

    /// Whether playback should skip the segment `name` right now.
    pub fn excludes(&self, name: &str) -> bool {
        self.enabled && self.contains(name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
