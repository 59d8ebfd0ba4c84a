//! Workload identity

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identifies one workload instance by namespace and name.
///
/// This is the work item handed from a batch producer to its consumer and
/// the key results are aggregated under. It is immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Build the reference for the `index`-th workload of a generated fleet
    pub fn indexed(namespace: impl Into<String>, prefix: &str, index: usize) -> Self {
        Self::new(namespace, format!("{}-{}", prefix, index))
    }

    /// Numeric suffix of the workload name, if any
    pub fn index(&self) -> Option<u64> {
        numeric_suffix(&self.name)
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for WorkloadRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(ns, name))
            }
            _ => Err(CoreError::InvalidWorkloadRef(s.to_string())),
        }
    }
}

/// Parse the trailing run of ASCII digits in a workload name.
///
/// `ksvc-12` yields `Some(12)`, `ksvc` yields `None`.
pub fn numeric_suffix(name: &str) -> Option<u64> {
    let digits = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| &name[i..])?;
    digits.parse().ok()
}

/// Sort items by the numeric suffix of their workload name.
///
/// Names without a suffix sort after numbered ones, then lexically.
pub fn sort_by_numeric_suffix<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &WorkloadRef,
{
    items.sort_by(|a, b| {
        let (a, b) = (key(a), key(b));
        match (a.index(), b.index()) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
}
