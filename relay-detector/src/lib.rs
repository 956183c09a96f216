//! Change detection for `relay-detector`.
//!
//! `detect(previous, head, tags)` compares the current head reference and tag
//! list against the last observed [`Snapshot`] and decides which push
//! operations are due. Values are opaque: equality is byte-exact, never
//! semantic. Re-running with identical inputs always yields "push nothing",
//! which is what makes a failed iteration safely retryable.

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The last observed head reference and tag list for a job.
///
/// `None` fields mean "never observed": a fresh snapshot reports every
/// current value as changed, including an empty tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    head: Option<String>,
    tags: Option<Vec<String>>,
}

impl Snapshot {
    /// Snapshot of values just observed in a successful iteration.
    pub fn observed(head: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            head: Some(head.into()),
            tags: Some(tags),
        }
    }

    /// The last observed head value, if any iteration has succeeded.
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }

    /// The last observed tag list, if any iteration has succeeded.
    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }
}

/// Which push operations the current iteration must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub push_branches: bool,
    pub push_tags: bool,
}

impl Decision {
    /// True when neither branches nor tags need pushing.
    pub fn is_noop(&self) -> bool {
        !self.push_branches && !self.push_tags
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decide which pushes are due, given the previous snapshot and the values
/// observed this iteration. Branch and tag decisions are independent.
pub fn detect(previous: &Snapshot, head: &str, tags: &[String]) -> Decision {
    Decision {
        push_branches: previous.head.as_deref() != Some(head),
        push_tags: previous.tags.as_deref() != Some(tags),
    }
}
