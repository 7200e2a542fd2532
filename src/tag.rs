// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag expressions and their evaluation.
//!
//! Everything here is a pure function over a scenario's tag set: no
//! suspension, no mutation. A raw tag-filter list is partitioned into an
//! include expression and an exclude expression by [`TagFilter::from_raw()`],
//! and a scenario is eligible iff [`has_any()`] holds for the include
//! expression and [`lacks_all()`] holds for the exclude one.

use std::collections::HashMap;

/// Single element of a tag expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TagOperand {
    /// Plain tag, satisfied when present in a scenario's tag set.
    Tag(String),

    /// AND-group, satisfied only when every non-negated member is present
    /// and every `~`-prefixed member is absent.
    AllOf(Vec<String>),
}

impl From<&str> for TagOperand {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_owned())
    }
}

impl From<String> for TagOperand {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

impl From<Vec<String>> for TagOperand {
    fn from(group: Vec<String>) -> Self {
        Self::AllOf(group)
    }
}

/// Indicates whether the given tag set satisfies any element of the given
/// expression.
///
/// An empty expression means "no restriction" and is satisfied by every tag
/// set. A bare `~x` never belongs in an include expression; if one slips
/// through it is treated as the literal tag string `"~x"` here, since
/// negation only carries meaning inside [`TagOperand::AllOf`] groups and in
/// the raw filter partitioning.
#[must_use]
pub fn has_any<S: AsRef<str>>(tags: &[S], expr: &[TagOperand]) -> bool {
    expr.is_empty()
        || expr.iter().any(|operand| match operand {
            TagOperand::Tag(tag) => contains(tags, tag),
            TagOperand::AllOf(group) => has_all(tags, group),
        })
}

/// Indicates whether the given tag set satisfies no element of the given
/// expression.
///
/// This is the negation of [`has_any()`], except that an empty expression is
/// vacuously satisfied by every tag set here too.
#[must_use]
pub fn lacks_all<S: AsRef<str>>(tags: &[S], expr: &[TagOperand]) -> bool {
    expr.is_empty() || !has_any(tags, expr)
}

/// Evaluates an AND-group: every non-negated member present, every
/// `~`-prefixed member absent.
fn has_all<S: AsRef<str>>(tags: &[S], group: &[String]) -> bool {
    group.iter().all(|member| match member.strip_prefix('~') {
        Some(negated) => !contains(tags, negated),
        None => contains(tags, member),
    })
}

fn contains<S: AsRef<str>>(tags: &[S], tag: &str) -> bool {
    tags.iter().any(|t| t.as_ref() == tag)
}

/// Include/exclude tag expressions derived from one raw tag-filter list.
#[derive(Clone, Debug, Default)]
pub struct TagFilter {
    include: Vec<TagOperand>,
    exclude: Vec<TagOperand>,
}

impl TagFilter {
    /// Partitions a raw tag-filter list into this [`TagFilter`].
    ///
    /// Plain entries form the include expression; entries with a leading `~`
    /// form the exclude expression with the prefix stripped. Negation in the
    /// filter means exclusion, not "negated tag on the scenario". AND-groups
    /// always stay on the include side.
    #[must_use]
    pub fn from_raw(raw: impl IntoIterator<Item = TagOperand>) -> Self {
        let mut filter = Self::default();
        for operand in raw {
            match operand {
                TagOperand::Tag(tag) => match tag.strip_prefix('~') {
                    Some(excluded) => filter
                        .exclude
                        .push(TagOperand::Tag(excluded.to_owned())),
                    None => filter.include.push(TagOperand::Tag(tag)),
                },
                group @ TagOperand::AllOf(_) => filter.include.push(group),
            }
        }
        filter
    }

    /// Indicates whether a scenario carrying the given tag set passes this
    /// [`TagFilter`].
    #[must_use]
    pub fn allows<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        has_any(tags, &self.include) && lacks_all(tags, &self.exclude)
    }

    /// Include expression of this [`TagFilter`].
    #[must_use]
    pub fn include(&self) -> &[TagOperand] {
        &self.include
    }

    /// Exclude expression of this [`TagFilter`].
    #[must_use]
    pub fn exclude(&self) -> &[TagOperand] {
        &self.exclude
    }
}

/// Authored per-tag configuration.
///
/// Independent of the include/exclude filter and applied before it: a tag
/// with [`should_run`] unset always wins, regardless of any filters the host
/// passed in.
///
/// [`should_run`]: TagConfig::should_run
#[derive(Clone, Debug)]
pub struct TagConfig {
    /// Tag this configuration applies to (leading `@` optional).
    pub tag: String,

    /// Whether scenarios carrying this tag may run at all.
    pub should_run: bool,

    /// Reason for disabling, logged whenever the tag suppresses a scenario.
    pub reason: Option<String>,

    /// Whether scenarios carrying this tag take the exclusive lock.
    pub exclusive: bool,

    /// Whether scenarios carrying this tag bypass the exclusive lock
    /// entirely.
    pub ignores_lock: bool,

    /// Free-form metadata exposed to steps through the scenario context.
    pub metadata: HashMap<String, String>,
}

impl TagConfig {
    /// Creates an enabled [`TagConfig`] for the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            should_run: true,
            reason: None,
            exclusive: false,
            ignores_lock: false,
            metadata: HashMap::new(),
        }
    }

    /// Creates a disabling [`TagConfig`] with the given reason.
    #[must_use]
    pub fn disabled(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut cfg = Self::new(tag);
        cfg.should_run = false;
        cfg.reason = Some(reason.into());
        cfg
    }

    /// Marks scenarios carrying this tag as exclusive.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Marks scenarios carrying this tag as bypassing the exclusive lock.
    #[must_use]
    pub fn ignoring_lock(mut self) -> Self {
        self.ignores_lock = true;
        self
    }

    /// Attaches one metadata entry to this [`TagConfig`].
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        _ = self.metadata.insert(key.into(), value.into());
        self
    }

    pub(crate) fn applies_to<S: AsRef<str>>(&self, tag: &S) -> bool {
        normalize(tag.as_ref()) == normalize(&self.tag)
    }
}

/// Returns the first configuration disabling any of the given tags, if any.
pub(crate) fn find_disabled<'c, S: AsRef<str>>(
    tags: &[S],
    configs: &'c [TagConfig],
) -> Option<&'c TagConfig> {
    configs
        .iter()
        .filter(|cfg| !cfg.should_run)
        .find(|cfg| tags.iter().any(|tag| cfg.applies_to(tag)))
}

/// Returns every configuration matching any of the given tags, in
/// configuration order.
pub(crate) fn matching<'c, S: AsRef<str>>(
    tags: &[S],
    configs: &'c [TagConfig],
) -> Vec<&'c TagConfig> {
    configs
        .iter()
        .filter(|cfg| tags.iter().any(|tag| cfg.applies_to(tag)))
        .collect()
}

pub(crate) fn normalize(tag: &str) -> &str {
    tag.trim().trim_start_matches('@')
}
