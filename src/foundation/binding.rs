//! Structured data-model field paths.
//!
//! A field path is a dotted sequence of segments, each optionally carrying an
//! array index: `Orders.items[2].name`. Repeating-row expansion rewrites the
//! index-free template paths from the layout into concrete per-row paths, and
//! expression evaluation transposes lookups into the row of the evaluation
//! context.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPart {
    pub base: String,
    pub index: Option<usize>,
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBinding {
    parts: Vec<BindingPart>,
}

impl DataBinding {
    pub fn parts(&self) -> &[BindingPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Copies array indices from `self` onto `path`, segment by segment, for
    /// as long as the segment bases match. Stops early if `path` already
    /// carries an index on a segment (an explicit index in the source wins,
    /// and adding our row index past that point would be meaningless).
    ///
    /// With `self` = `Model.Group[1].Nested[2].Name` and `path` =
    /// `Model.Group.Nested.Age`, the result is `Model.Group[1].Nested[2].Age`.
    pub fn transpose(&self, path: &str) -> String {
        let Ok(mut theirs) = DataBinding::from_str(path) else {
            return path.to_owned();
        };

        for (i, ours) in self.parts.iter().enumerate() {
            let Some(their_part) = theirs.parts.get_mut(i) else {
                break;
            };
            if their_part.base != ours.base {
                break;
            }
            let Some(idx) = ours.index else {
                continue;
            };
            if their_part.index.is_some() {
                break;
            }
            their_part.index = Some(idx);
        }

        theirs.to_string()
    }
}

impl FromStr for DataBinding {
    type Err = BindingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = Vec::new();
        for seg in s.split('.') {
            if seg.is_empty() {
                return Err(BindingParseError::EmptySegment(s.to_owned()));
            }
            if let Some(open) = seg.find('[') {
                let close = seg
                    .rfind(']')
                    .filter(|&c| c == seg.len() - 1 && c > open)
                    .ok_or_else(|| BindingParseError::MalformedIndex(s.to_owned()))?;
                let index = seg[open + 1..close]
                    .parse::<usize>()
                    .map_err(|_| BindingParseError::MalformedIndex(s.to_owned()))?;
                parts.push(BindingPart {
                    base: seg[..open].to_owned(),
                    index: Some(index),
                });
            } else {
                parts.push(BindingPart {
                    base: seg.to_owned(),
                    index: None,
                });
            }
        }
        Ok(Self { parts })
    }
}

impl fmt::Display for DataBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&part.base)?;
            if let Some(idx) = part.index {
                write!(f, "[{idx}]")?;
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BindingParseError {
    #[error("empty segment in field path '{0}'")]
    EmptySegment(String),
    #[error("malformed array index in field path '{0}'")]
    MalformedIndex(String),
}

/// Rewrites a template field path into a concrete per-row path.
///
/// `group_base` is the group's field as declared in the layout (no indices),
/// `group_current` is the same field with all ancestor row indices already
/// applied. A template binding equal to (or nested under) `group_base` is
/// re-rooted under `group_current[row_index]`; anything else passes through
/// untouched.
pub fn rewrite_for_row(field: &str, group_base: &str, group_current: &str, row_index: usize) -> String {
    if field == group_base {
        format!("{group_current}[{row_index}]")
    } else if let Some(rest) = field.strip_prefix(group_base) {
        if let Some(rest) = rest.strip_prefix('.') {
            format!("{group_current}[{row_index}].{rest}")
        } else {
            field.to_owned()
        }
    } else {
        field.to_owned()
    }
}

/// Substitutes the depth-relative index placeholder `[{depth}]` with a
/// concrete row index: `Teams[{0}].members` at outer row 0 becomes
/// `Teams[0].members`.
pub fn substitute_depth_placeholder(s: &str, depth: usize, row_index: usize) -> String {
    s.replace(&format!("[{{{depth}}}]"), &format!("[{row_index}]"))
}
