//! Copyright © 2025-2026 The Moyun Team. All Rights Reserved.
//!
//! This file is part of Dao.
//! The Dao project belongs to the Moyun Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Dao Directory Crawler
//!
//! Filesystem enumeration for the path-backed datasets. The crawler walks a
//! root directory recursively and returns an explicit, lexicographically
//! sorted list of regular files, optionally filtered by a regex applied to
//! the full path. Datasets memoize this list after the first computation and
//! reuse it across epochs, so enumeration order is stable for the lifetime
//! of a dataset.
//!
//! IO errors surface lazily: a missing or unreadable root fails here, at the
//! moment the path is first accessed, not at dataset construction.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::Result;

/// Recursive directory walker producing deterministic file lists.
#[derive(Clone, Debug, Default)]
pub struct DaoDirectoryCrawler;

impl DaoDirectoryCrawler {
    pub fn new() -> Self {
        DaoDirectoryCrawler
    }

    /// Lists every regular file under `root`, recursively, in sorted order.
    ///
    /// When `pattern` is given, only paths whose string form matches the
    /// regex are kept. Directory entries that cannot be read are reported
    /// and skipped rather than aborting the crawl.
    pub fn list_files(&self, root: &Path, pattern: Option<&Regex>) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.collect(root, &mut files)?;
        files.sort();
        if let Some(re) = pattern {
            files.retain(|p| re.is_match(&p.to_string_lossy()));
        }
        Ok(files)
    }

    fn collect(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                self.collect(&path, out)?;
            } else if path.is_file() {
                out.push(path);
            }
        }
        Ok(())
    }
}
