use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rig::shared::traits::PathMapping;

/// Prefix/postfix naming rule: every segment of the source path gets the
/// postfix appended, and the whole path is put below the prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonMapping {
    prefix: String,
    postfix: String,
}

impl SkeletonMapping {
    pub fn new(prefix: &str, postfix: &str) -> Self {
        SkeletonMapping {
            prefix: prefix.to_string(),
            postfix: postfix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn postfix(&self) -> &str {
        &self.postfix
    }

    pub fn get(&self, source: &str) -> String {
        let segments: Vec<String> = source
            .split('/')
            .map(|segment| format!("{}{}", segment, &self.postfix))
            .collect();
        format!("{}{}", &self.prefix, segments.join("/"))
    }
}

impl PathMapping for SkeletonMapping {
    fn map_path(&self, source: &str) -> Option<String> {
        let mapped = self.get(source);
        if mapped.is_empty() {
            None
        } else {
            Some(mapped)
        }
    }
}

/// Explicit source path to target path table, for rigs whose names don't
/// follow a prefix/postfix rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    pub entries: HashMap<String, String>,
}

impl TableMapping {
    pub fn new() -> Self {
        TableMapping {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, source: &str, target: &str) -> &mut Self {
        self.entries.insert(source.to_string(), target.to_string());
        self
    }
}

impl PathMapping for TableMapping {
    fn map_path(&self, source: &str) -> Option<String> {
        self.entries
            .get(source)
            .filter(|target| !target.is_empty())
            .cloned()
    }
}
