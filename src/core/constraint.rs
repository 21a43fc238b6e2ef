use std::cmp::Ordering;
use std::fmt;

use semver::{Prerelease, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("empty constraint")]
    Empty,
    #[error("invalid constraint term '{0}'")]
    InvalidTerm(String),
}

pub type ConstraintResult<T> = std::result::Result<T, ConstraintError>;

/// A parsed version constraint: comma-separated terms are conjunctions,
/// `||` separates disjunctions, and disjunction binds looser than
/// conjunction.
#[derive(Debug, Clone)]
pub struct Constraint {
    raw: String,
    groups: Vec<Vec<Comparator>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Exact,
    NotEqual,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Tilde,
    Caret,
}

/// One operator applied to a version pattern. Wildcard components (`x`,
/// `X`, `*`) and components missing outright are both "unspecified": the
/// comparator constrains only the precision it names.
#[derive(Debug, Clone)]
struct Comparator {
    op: Op,
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Constraint {
    pub fn parse(input: &str) -> ConstraintResult<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ConstraintError::Empty);
        }
        let mut groups = Vec::new();
        for alternative in raw.split("||") {
            let mut comparators = Vec::new();
            for term in alternative.split(',') {
                comparators.push(Comparator::parse(term.trim())?);
            }
            groups.push(comparators);
        }
        Ok(Self {
            raw: raw.to_string(),
            groups,
        })
    }

    /// True when the version satisfies at least one alternative. A
    /// pre-release version only satisfies an alternative in which some
    /// comparator names a pre-release at the same major.minor.patch.
    pub fn check(&self, version: &Version) -> bool {
        self.groups
            .iter()
            .any(|group| group_matches(group, version))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn group_matches(group: &[Comparator], version: &Version) -> bool {
    if !group.iter().all(|comparator| comparator.matches(version)) {
        return false;
    }
    if version.pre.is_empty() {
        return true;
    }
    group
        .iter()
        .any(|comparator| comparator.names_prerelease_of(version))
}

impl Comparator {
    fn parse(term: &str) -> ConstraintResult<Self> {
        let (op, pattern) = split_op(term);
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ConstraintError::InvalidTerm(term.to_string()));
        }
        let bare = pattern
            .strip_prefix('v')
            .or_else(|| pattern.strip_prefix('V'))
            .unwrap_or(pattern);

        // Build metadata is irrelevant to matching but allowed in a term.
        let rest = match bare.split_once('+') {
            Some((rest, _)) => rest,
            None => bare,
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let mut components = core.split('.');
        let major = parse_pattern_component(components.next(), term)?;
        let minor = match major {
            Some(_) => parse_pattern_component(components.next(), term)?,
            // A bare `*` cannot be followed by more components.
            None => match components.next() {
                Some(_) => return Err(ConstraintError::InvalidTerm(term.to_string())),
                None => None,
            },
        };
        let patch = match minor {
            Some(_) => parse_pattern_component(components.next(), term)?,
            None => match components.next() {
                Some(part) if !is_wildcard(part) => {
                    return Err(ConstraintError::InvalidTerm(term.to_string()))
                }
                _ => None,
            },
        };
        if components.next().is_some() {
            return Err(ConstraintError::InvalidTerm(term.to_string()));
        }
        if major.is_none() && op != Op::Exact {
            return Err(ConstraintError::InvalidTerm(term.to_string()));
        }

        let pre = match pre {
            Some(tag) => {
                if patch.is_none() {
                    return Err(ConstraintError::InvalidTerm(term.to_string()));
                }
                Prerelease::new(tag).map_err(|_| ConstraintError::InvalidTerm(term.to_string()))?
            }
            None => Prerelease::EMPTY,
        };

        Ok(Self {
            op,
            major,
            minor,
            patch,
            pre,
        })
    }

    fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Exact => self.matches_exact(version),
            Op::NotEqual => !self.matches_exact(version),
            Op::Greater => self.compare_padded(version) == Ordering::Greater,
            Op::GreaterEq => self.compare_padded(version) != Ordering::Less,
            Op::Less => self.compare_padded(version) == Ordering::Less,
            Op::LessEq => self.compare_padded(version) != Ordering::Greater,
            Op::Tilde => self.matches_tilde(version),
            Op::Caret => self.matches_caret(version),
        }
    }

    fn matches_exact(&self, version: &Version) -> bool {
        if let Some(major) = self.major {
            if version.major != major {
                return false;
            }
        }
        if let Some(minor) = self.minor {
            if version.minor != minor {
                return false;
            }
        }
        if let Some(patch) = self.patch {
            if version.patch != patch {
                return false;
            }
        }
        version.pre == self.pre
    }

    /// Orders the version against the comparator's pattern with missing
    /// components padded to zero, so `> 1.2` means `> 1.2.0`. This is the
    /// interval reading the ordered operators need.
    fn compare_padded(&self, version: &Version) -> Ordering {
        version
            .major
            .cmp(&self.major.unwrap_or(0))
            .then_with(|| version.minor.cmp(&self.minor.unwrap_or(0)))
            .then_with(|| version.patch.cmp(&self.patch.unwrap_or(0)))
            .then_with(|| version.pre.cmp(&self.pre))
    }

    fn matches_tilde(&self, version: &Version) -> bool {
        let Some(major) = self.major else {
            return false;
        };
        if version.major != major {
            return false;
        }
        if let Some(minor) = self.minor {
            if version.minor != minor {
                return false;
            }
        }
        if let Some(patch) = self.patch {
            if version.patch != patch {
                return version.patch > patch;
            }
        }
        version.pre >= self.pre
    }

    fn matches_caret(&self, version: &Version) -> bool {
        let Some(major) = self.major else {
            return false;
        };
        if version.major != major {
            return false;
        }
        let Some(minor) = self.minor else {
            return true;
        };
        let Some(patch) = self.patch else {
            return if major > 0 {
                version.minor >= minor
            } else {
                version.minor == minor
            };
        };
        if major > 0 {
            if version.minor != minor {
                return version.minor > minor;
            } else if version.patch != patch {
                return version.patch > patch;
            }
        } else if minor > 0 {
            if version.minor != minor {
                return false;
            } else if version.patch != patch {
                return version.patch > patch;
            }
        } else if version.minor != minor || version.patch != patch {
            return false;
        }
        version.pre >= self.pre
    }

    fn names_prerelease_of(&self, version: &Version) -> bool {
        !self.pre.is_empty()
            && self.major == Some(version.major)
            && self.minor == Some(version.minor)
            && self.patch == Some(version.patch)
    }
}

fn split_op(term: &str) -> (Op, &str) {
    const OPS: [(&str, Op); 8] = [
        (">=", Op::GreaterEq),
        ("<=", Op::LessEq),
        ("!=", Op::NotEqual),
        ("=", Op::Exact),
        (">", Op::Greater),
        ("<", Op::Less),
        ("^", Op::Caret),
        ("~", Op::Tilde),
    ];
    for (token, op) in OPS {
        if let Some(rest) = term.strip_prefix(token) {
            return (op, rest);
        }
    }
    (Op::Exact, term)
}

fn parse_pattern_component(part: Option<&str>, term: &str) -> ConstraintResult<Option<u64>> {
    let Some(part) = part else {
        return Ok(None);
    };
    if is_wildcard(part) {
        return Ok(None);
    }
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ConstraintError::InvalidTerm(term.to_string()));
    }
    part.parse()
        .map(Some)
        .map_err(|_| ConstraintError::InvalidTerm(term.to_string()))
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}
