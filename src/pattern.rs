//! Segment patterns.
//!
//! A pattern is either a plain name, matched case-insensitively, or a template
//! containing `{key}` / `{key=regex}` placeholders which compiles into an anchored
//! regular expression. Text outside the placeholders is copied into the expression
//! as it is written.

use crate::router::RouterError;

use std::fmt;

use regex::Regex;
use smallvec::SmallVec;

const OPEN: char = '{';
const CLOSE: char = '}';
const ASSIGN: char = '=';
const MATCH_ALL: &str = ".*";
const GROUP_PREFIX: &str = "c";

/// Values captured from one segment, in declaration order.
pub type CapturedValues = SmallVec<[String; 4]>;

pub enum SegmentPattern {
    Plain(Box<str>),
    Template {
        source: Box<str>,
        regex: Regex,
        names: Box<[Box<str>]>,
        /// Group index of each name in `regex`.
        groups: Box<[usize]>,
    },
}

impl SegmentPattern {
    pub fn compile(pattern: &str) -> Result<Self, RouterError> {
        if !pattern.contains(OPEN) {
            if pattern.contains(CLOSE) {
                return Err(RouterError::UnbalancedBraces {
                    pattern: pattern.into(),
                });
            }
            return Ok(Self::Plain(pattern.into()));
        }

        let mut expr = String::with_capacity(pattern.len() + 16);
        let mut names: Vec<Box<str>> = Vec::new();
        let mut placeholder = String::new();
        let mut depth: usize = 0;

        expr.push_str("^(?:");
        for ch in pattern.chars() {
            match (ch, depth) {
                (OPEN, 0) => depth = 1,
                (CLOSE, 0) => {
                    return Err(RouterError::UnbalancedBraces {
                        pattern: pattern.into(),
                    })
                }
                (CLOSE, 1) => {
                    depth = 0;
                    let (name, sub) = split_placeholder(&placeholder);
                    if name.is_empty() {
                        return Err(RouterError::EmptyCaptureName {
                            pattern: pattern.into(),
                        });
                    }
                    // group names are generated so that user sub-patterns may carry
                    // their own groups without shifting capture positions
                    expr.push_str(&format!("(?P<{}{}>{})", GROUP_PREFIX, names.len(), sub));
                    names.push(name.into());
                    placeholder.clear();
                }
                (_, 0) => expr.push(ch),
                (_, d) => {
                    if ch == OPEN {
                        depth = d + 1;
                    } else if ch == CLOSE {
                        depth = d - 1;
                    }
                    placeholder.push(ch);
                }
            }
        }
        if depth != 0 {
            return Err(RouterError::UnbalancedBraces {
                pattern: pattern.into(),
            });
        }
        expr.push_str(")$");

        let regex = Regex::new(&expr).map_err(|source| RouterError::InvalidRegex {
            pattern: pattern.into(),
            source,
        })?;

        let mut groups = vec![0; names.len()];
        for (index, group) in regex.capture_names().enumerate() {
            let slot = group
                .and_then(|g| g.strip_prefix(GROUP_PREFIX))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(slot) = slot.filter(|&s| s < groups.len()) {
                groups[slot] = index;
            }
        }

        Ok(Self::Template {
            source: pattern.into(),
            regex,
            names: names.into_boxed_slice(),
            groups: groups.into_boxed_slice(),
        })
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Plain(name) => name,
            Self::Template { source, .. } => source,
        }
    }

    /// Capture names in left-to-right order. Empty for plain names.
    pub fn names(&self) -> &[Box<str>] {
        match self {
            Self::Plain(_) => &[],
            Self::Template { names, .. } => names,
        }
    }

    /// Matches a whole segment, returning the captured values on success.
    pub fn captures(&self, segment: &str) -> Option<CapturedValues> {
        match self {
            Self::Plain(name) => {
                if eq_ignore_case(name, segment) {
                    Some(CapturedValues::new())
                } else {
                    None
                }
            }
            Self::Template { regex, groups, .. } => {
                let caps = regex.captures(segment)?;
                let values = groups
                    .iter()
                    .map(|&g| caps.get(g).map_or_else(String::new, |m| m.as_str().to_owned()))
                    .collect();
                Some(values)
            }
        }
    }

    pub fn is_match(&self, segment: &str) -> bool {
        match self {
            Self::Plain(name) => eq_ignore_case(name, segment),
            Self::Template { regex, .. } => regex.is_match(segment),
        }
    }
}

impl fmt::Debug for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(name) => f.debug_tuple("Plain").field(name).finish(),
            Self::Template { source, names, .. } => f
                .debug_struct("Template")
                .field("source", source)
                .field("names", names)
                .finish(),
        }
    }
}

fn split_placeholder(body: &str) -> (&str, &str) {
    match body.find(ASSIGN) {
        Some(i) => (&body[..i], &body[i + 1..]),
        None => (body, MATCH_ALL),
    }
}

#[inline]
pub(crate) fn fold_case(name: &str) -> Box<str> {
    name.to_lowercase().into()
}

#[inline]
fn eq_ignore_case(lhs: &str, rhs: &str) -> bool {
    lhs.eq_ignore_ascii_case(rhs) || lhs.to_lowercase() == rhs.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name() {
        let p = SegmentPattern::compile("Home").unwrap();
        assert!(p.is_plain());
        assert!(p.is_match("hOmE"));
        assert!(p.is_match("HOME"));
        assert!(!p.is_match("homes"));
        assert!(p.names().is_empty());
    }

    #[test]
    fn capture_order() {
        let p = SegmentPattern::compile("list_{page}_{number=[0-9]+}").unwrap();
        let names: Vec<&str> = p.names().iter().map(|n| &**n).collect();
        assert_eq!(names, ["page", "number"]);

        let values = p.captures("list_xxx_324234").unwrap();
        assert_eq!(&values[..], ["xxx", "324234"]);
        assert!(p.captures("list_xxx_abc").is_none());
    }

    #[test]
    fn anchored() {
        let p = SegmentPattern::compile("{id=[0-9]+}.html").unwrap();
        assert_eq!(&p.captures("42.html").unwrap()[..], ["42"]);
        assert!(p.captures("x42.html").is_none());
        assert!(p.captures("42.html.bak").is_none());
    }

    #[test]
    fn nested_quantifier_braces() {
        let p = SegmentPattern::compile("{year=[0-9]{4}}").unwrap();
        assert!(p.is_match("2020"));
        assert!(!p.is_match("20201"));
    }

    #[test]
    fn inner_groups_do_not_shift_captures() {
        let p = SegmentPattern::compile("{a=(x|y)+}-{b}").unwrap();
        assert_eq!(&p.captures("xyx-tail").unwrap()[..], ["xyx", "tail"]);

        let p = SegmentPattern::compile("{a=(?P<c9>x)(y)}_{b=[0-9]*}").unwrap();
        assert_eq!(&p.captures("xy_12").unwrap()[..], ["xy", "12"]);
        assert_eq!(&p.captures("xy_").unwrap()[..], ["xy", ""]);
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            SegmentPattern::compile("{id"),
            Err(RouterError::UnbalancedBraces { .. })
        ));
        assert!(matches!(
            SegmentPattern::compile("id}"),
            Err(RouterError::UnbalancedBraces { .. })
        ));
        assert!(matches!(
            SegmentPattern::compile("a}{b}"),
            Err(RouterError::UnbalancedBraces { .. })
        ));
        assert!(matches!(
            SegmentPattern::compile("{=[0-9]+}"),
            Err(RouterError::EmptyCaptureName { .. })
        ));
        assert!(matches!(
            SegmentPattern::compile("{id=[0-9}"),
            Err(RouterError::InvalidRegex { .. })
        ));
    }
}
