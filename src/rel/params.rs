// src/rel/params.rs

//! Validated relationship parameters: grouping keywords and split
//! declarations.

use std::collections::HashSet;

use crate::errors::{KosmosError, Result};
use crate::types::{TagMap, TagValue};

/// Tag keys used to group parent tasks in fan-in relationships.
///
/// Guaranteed non-empty, with distinct, non-empty entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();

        if keywords.is_empty() {
            return Err(KosmosError::InvalidKeywords(
                "`keywords` must contain at least one keyword".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for k in &keywords {
            if k.is_empty() {
                return Err(KosmosError::InvalidKeywords(
                    "keyword cannot be an empty string".to_string(),
                ));
            }
            if !seen.insert(k.as_str()) {
                return Err(KosmosError::InvalidKeywords(format!(
                    "duplicate keyword '{k}'"
                )));
            }
        }

        Ok(Self(keywords))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True if `tags` carries every keyword.
    pub fn all_present_in(&self, tags: &TagMap) -> bool {
        self.0.iter().all(|k| tags.contains_key(k))
    }

    /// The sub-map of `tags` restricted to these keywords.
    pub fn project(&self, tags: &TagMap) -> TagMap {
        self.0
            .iter()
            .filter_map(|k| tags.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

/// One `(key, values)` fan-out declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub key: String,
    pub values: Vec<TagValue>,
}

impl Split {
    pub fn new<K, I, V>(key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<TagValue>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered list of splits with distinct, non-empty keys.
///
/// An empty list is allowed and produces a single empty combination.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitBy(Vec<Split>);

impl SplitBy {
    pub fn new(splits: Vec<Split>) -> Result<Self> {
        let mut seen = HashSet::new();
        for split in &splits {
            if split.key.is_empty() {
                return Err(KosmosError::InvalidSplitBy(
                    "split key cannot be an empty string".to_string(),
                ));
            }
            if !seen.insert(split.key.as_str()) {
                return Err(KosmosError::InvalidSplitBy(format!(
                    "duplicate split key '{}'",
                    split.key
                )));
            }
        }
        Ok(Self(splits))
    }

    /// Number of combinations [`combinations`](Self::combinations) yields.
    pub fn product_len(&self) -> usize {
        self.0.iter().map(|s| s.values.len()).product()
    }

    /// Cartesian product of all splits, in declaration order.
    ///
    /// The last declared split varies fastest. Each item merges one value
    /// from every split into a single map.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            splits: &self.0,
            indices: vec![0; self.0.len()],
            done: self.0.iter().any(|s| s.values.is_empty()),
        }
    }
}

/// Odometer over the value indices of a [`SplitBy`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    splits: &'a [Split],
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for Combinations<'_> {
    type Item = TagMap;

    fn next(&mut self) -> Option<TagMap> {
        if self.done {
            return None;
        }

        let current: TagMap = self
            .splits
            .iter()
            .zip(&self.indices)
            .map(|(split, &i)| (split.key.clone(), split.values[i].clone()))
            .collect();

        // Advance from the right; if every position wraps we are exhausted.
        self.done = true;
        for pos in (0..self.splits.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.splits[pos].values.len() {
                self.done = false;
                break;
            }
            self.indices[pos] = 0;
        }

        Some(current)
    }
}
