// src/rel/mod.rs

//! Relationships between a stage and its parent stages.
//!
//! A [`Relationship`] decides which new tasks a stage runs and which parent
//! tasks each of them depends on, purely from task tags:
//!
//! - [`one_to_one`]: one new task per parent task.
//! - [`many_to_one`]: fan-in, grouping parent tasks by keyword values.
//! - [`one_to_many`]: fan-out, one new task per parent task and split
//!   combination.
//! - [`many_to_many`]: fan-in followed by fan-out.
//!
//! Generation is a pure function of the parent tasks, the relationship
//! parameters and the stage's `extra_tags`.

pub mod many_to_many;
pub mod many_to_one;
pub mod one_to_many;
pub mod one_to_one;
pub mod params;

use std::fmt;

use crate::errors::Result;
use crate::pipeline::Task;
use crate::types::TagMap;

pub use many_to_one::reduce;
pub use params::{Combinations, Keywords, Split, SplitBy};

/// Read-only view of the stage being materialized.
#[derive(Debug, Clone)]
pub struct StageView<'a> {
    /// Stage name, used in errors and logs.
    pub name: &'a str,
    /// Task lists of the parent stages, in parent-declaration order.
    pub parents: Vec<&'a [Task]>,
    /// Tags merged into every generated task, with highest precedence.
    pub extra_tags: &'a TagMap,
}

impl<'a> StageView<'a> {
    /// All parent tasks, concatenated across parent stages.
    pub fn parent_tasks(&self) -> std::iter::Flatten<std::vec::IntoIter<&'a [Task]>> {
        self.parents.clone().into_iter().flatten()
    }

    pub fn parent_task_count(&self) -> usize {
        self.parents.iter().map(|tasks| tasks.len()).sum()
    }
}

/// A task to be created: its tags plus the parent tasks it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask<'a> {
    pub tags: TagMap,
    pub dependencies: Vec<&'a Task>,
}

/// Lazily produced sequence of new tasks for one stage.
pub type Generated<'a> = Box<dyn Iterator<Item = NewTask<'a>> + 'a>;

/// How a stage's tasks relate to its parent stages' tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Relationship {
    OneToOne,
    ManyToOne { keywords: Keywords },
    OneToMany { split_by: SplitBy },
    ManyToMany { keywords: Keywords, split_by: SplitBy },
}

impl Relationship {
    pub fn one_to_one() -> Self {
        Relationship::OneToOne
    }

    pub fn many_to_one<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Relationship::ManyToOne {
            keywords: Keywords::new(keywords)?,
        })
    }

    pub fn one_to_many(split_by: Vec<Split>) -> Result<Self> {
        Ok(Relationship::OneToMany {
            split_by: SplitBy::new(split_by)?,
        })
    }

    pub fn many_to_many<I, S>(keywords: I, split_by: Vec<Split>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Relationship::ManyToMany {
            keywords: Keywords::new(keywords)?,
            split_by: SplitBy::new(split_by)?,
        })
    }

    /// Name used in pipeline files and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Relationship::OneToOne => "one2one",
            Relationship::ManyToOne { .. } => "many2one",
            Relationship::OneToMany { .. } => "one2many",
            Relationship::ManyToMany { .. } => "many2many",
        }
    }

    /// Compute the new tasks for the stage described by `view`.
    ///
    /// Any error is raised before the iterator is returned; once `Ok`, the
    /// sequence is finite and fully determined by `view`.
    pub fn generate<'a>(&self, view: &StageView<'a>) -> Result<Generated<'a>> {
        match self {
            Relationship::OneToOne => Ok(one_to_one::generate(view)),
            Relationship::ManyToOne { keywords } => many_to_one::generate(view, keywords),
            Relationship::OneToMany { split_by } => Ok(one_to_many::generate(view, split_by)),
            Relationship::ManyToMany { keywords, split_by } => {
                many_to_many::generate(view, keywords, split_by)
            }
        }
    }
}

/// Short form: `o2o`, `m2o`, `o2m`, `m2m`.
impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = match self {
            Relationship::OneToOne => "o2o",
            Relationship::ManyToOne { .. } => "m2o",
            Relationship::OneToMany { .. } => "o2m",
            Relationship::ManyToMany { .. } => "m2m",
        };
        f.write_str(short)
    }
}
