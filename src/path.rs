//! Dotted-path addressing into `serde_json::Value` trees.
//!
//! Segments are split on `.` and matched in this order:
//! - `[n]` / `[-n]` index a sequence from the front / from the back
//! - `\[...]` is a literal key; the leading backslash is dropped
//! - anything else is a literal key, exactly as written
//!
//! Resolution never fails loudly: any segment that cannot be satisfied makes
//! the whole lookup absent (`None`).
use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static INDEX_SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(-?\d+)\]$").expect("index regex"));

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Sequence index; negative values count from the end (`-1` = last).
    Index(isize),
    /// Mapping key.
    Key(String),
}

impl Segment {
    pub fn parse(raw: &str) -> Self {
        if let Some(caps) = INDEX_SYNTAX.captures(raw) {
            let digits = &caps[1];
            // Out-of-range literals can never hit an element; saturate so they resolve absent.
            let saturated = match digits.starts_with('-') {
                true => isize::MIN,
                false => isize::MAX,
            };
            let index = digits.parse::<isize>().unwrap_or(saturated);
            return Segment::Index(index);
        }
        match raw.strip_prefix("\\[") {
            Some(rest) => Segment::Key(format!("[{rest}")),
            None => Segment::Key(raw.to_string()),
        }
    }

    /// Apply one segment to the current value.
    pub fn step<'a>(&self, current: &'a Value) -> Option<&'a Value> {
        match (self, current) {
            (Segment::Index(index), Value::Array(items)) => {
                let at = if *index < 0 {
                    (items.len() as isize).checked_add(*index)?
                } else {
                    *index
                };
                usize::try_from(at).ok().and_then(|at| items.get(at))
            }
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            _ => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// API
// ————————————————————————————————————————————————————————————————————————————

/// Split a path into segments. The empty path has no segments and denotes the root.
pub fn parse(path: &str) -> Vec<Segment> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').map(Segment::parse).collect()
}

pub fn walk<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |current, segment| segment.step(current))
}

/// Resolve `path` against `root`; `None` means absent.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    walk(root, &parse(path))
}

/// Spell a segment list back as a path, for diagnostics.
///
/// Keys that look like index syntax are escaped. Lookups never go through
/// this text: keys holding `.` or starting with `\[` have no exact spelling.
pub fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Index(index) => Cow::Owned(format!("[{index}]")),
            Segment::Key(key) => escape(key),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn escape(key: &str) -> Cow<'_, str> {
    if INDEX_SYNTAX.is_match(key) {
        Cow::Owned(format!("\\{key}"))
    } else {
        Cow::Borrowed(key)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
