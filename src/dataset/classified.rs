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

//! # Dao Classified Directory Dataset
//!
//! Dataset over a directory tree where the label of every file is the path
//! segment immediately under the dataset root:
//!
//! ```text
//! root/
//!   positive/
//!     a.txt
//!     b.txt
//!   negative/
//!     c.txt
//! ```
//!
//! Only files exactly at `root/<label>/<file>` depth participate; both
//! shallower and deeper files are skipped with a warning. The file list is
//! produced by [`DaoDirectoryCrawler`] (optionally regex-filtered), memoized
//! after the first computation and reused across epochs.
//!
//! Batch mode (`batch_size > 0`) accumulates raw `(content, label)` pairs,
//! hands each full window to the mandatory filter, and flushes a final
//! partial batch; the running dataset size and the maximum step count
//! become authoritative after one full pass. Stream mode (`batch_size ==
//! 0`) is exposed as [`DaoClassifiedDirectoryDataset::stream`] and emits one
//! raw [`DaoRawItem`] per step with no filtering or batching.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crawler::DaoDirectoryCrawler;
use crate::dataset::{
    DaoBatch, DaoBatchStream, DaoDataset, DaoDatasetFilter, DaoRawItem, DaoRawRecord,
};
use crate::errors::{DaoError, Result};

/// Classified directory options.
///
/// - `batch_size` (32): raw pairs per emitted batch; 0 selects stream mode.
/// - `pattern` (None): regex over full paths restricting the crawl.
/// - `unclassified` (false): stream mode emits content without labels.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoClassifiedDirectoryConfig {
    pub batch_size: usize,
    pub pattern: Option<String>,
    pub unclassified: bool,
}

impl Default for DaoClassifiedDirectoryConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            pattern: None,
            unclassified: false,
        }
    }
}

/// Dataset over a one-label-level directory tree.
pub struct DaoClassifiedDirectoryDataset<T> {
    root: PathBuf,
    config: DaoClassifiedDirectoryConfig,
    pattern: Option<Regex>,
    crawler: DaoDirectoryCrawler,
    filter: Option<Box<dyn DaoDatasetFilter<T>>>,
    files: Option<Vec<PathBuf>>,
    dataset_size: usize,
    max_steps: usize,
}

impl<T: Clone + 'static> DaoClassifiedDirectoryDataset<T> {
    /// Builds the dataset; the path pattern is compiled here so a bad
    /// regex is rejected at construction, but the root is not touched
    /// until the first iteration.
    pub fn new(root: impl Into<PathBuf>, config: DaoClassifiedDirectoryConfig) -> Result<Self> {
        let pattern = config
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| DaoError::config(format!("invalid path pattern: {e}")))?;
        Ok(Self {
            root: root.into(),
            config,
            pattern,
            crawler: DaoDirectoryCrawler::new(),
            filter: None,
            files: None,
            dataset_size: 0,
            max_steps: 0,
        })
    }

    /// The memoized file list, crawling on first access.
    pub fn files(&mut self) -> Result<&[PathBuf]> {
        self.ensure_files()?;
        Ok(self.files.as_deref().unwrap_or_default())
    }

    fn ensure_files(&mut self) -> Result<()> {
        if self.files.is_none() {
            let files = self.crawler.list_files(&self.root, self.pattern.as_ref())?;
            self.files = Some(files);
        }
        Ok(())
    }

    /// Stream mode: one raw item per step, no filtering, no batching.
    ///
    /// With `unclassified` set the items carry no label.
    pub fn stream(&mut self) -> Result<DaoClassifiedStream> {
        self.ensure_files()?;
        Ok(DaoClassifiedStream {
            root: self.root.clone(),
            files: self.files.clone().unwrap_or_default(),
            unclassified: self.config.unclassified,
            pos: 0,
        })
    }
}

impl<T: Clone + 'static> DaoDataset<T> for DaoClassifiedDirectoryDataset<T> {
    fn dataset_size(&self) -> usize {
        self.dataset_size
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn set_filter(&mut self, filter: Box<dyn DaoDatasetFilter<T>>) {
        self.filter = Some(filter);
    }

    fn epoch(&mut self) -> Result<DaoBatchStream<'_, T>> {
        if self.config.batch_size == 0 {
            return Err(DaoError::config(
                "batch_size is 0 (stream mode): use stream() for raw records",
            ));
        }
        if self.filter.is_none() {
            return Err(DaoError::config(
                "classified directory dataset requires a filter in batch mode",
            ));
        }
        self.ensure_files()?;
        Ok(Box::new(DaoClassifiedBatches {
            ds: self,
            pos: 0,
            seen: 0,
            steps: 0,
            done: false,
        }))
    }
}

/// Label for `path` when it sits exactly at `root/<label>/<file>` depth.
pub(crate) fn label_of(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut components = rel.components();
    let label = components.next()?;
    components.next()?;
    if components.next().is_some() {
        return None;
    }
    Some(label.as_os_str().to_string_lossy().into_owned())
}

/// Stream-mode iterator of raw items.
pub struct DaoClassifiedStream {
    root: PathBuf,
    files: Vec<PathBuf>,
    unclassified: bool,
    pos: usize,
}

impl Iterator for DaoClassifiedStream {
    type Item = Result<DaoRawItem>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.files.len() {
            let path = self.files[self.pos].clone();
            self.pos += 1;
            let label = match label_of(&self.root, &path) {
                Some(label) => label,
                None => {
                    log::warn!("skipping misplaced file {}", path.display());
                    continue;
                }
            };
            let item = fs::read_to_string(&path)
                .map(|content| DaoRawItem {
                    content,
                    label: if self.unclassified { None } else { Some(label) },
                })
                .map_err(DaoError::from);
            return Some(item);
        }
        None
    }
}

/// Batch-mode iterator accumulating raw pairs into filter-translated
/// tensor batches.
pub struct DaoClassifiedBatches<'a, T> {
    ds: &'a mut DaoClassifiedDirectoryDataset<T>,
    pos: usize,
    seen: usize,
    steps: usize,
    done: bool,
}

impl<'a, T> DaoClassifiedBatches<'a, T> {
    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.ds.dataset_size = self.seen;
            self.ds.max_steps = self.ds.max_steps.max(self.steps);
        }
    }
}

impl<'a, T: Clone + 'static> Iterator for DaoClassifiedBatches<'a, T> {
    type Item = Result<DaoBatch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let batch_size = self.ds.config.batch_size;
        let total_files = self.ds.files.as_ref().map_or(0, Vec::len);
        let mut inputs = Vec::with_capacity(batch_size);
        let mut labels = Vec::with_capacity(batch_size);

        while self.pos < total_files && inputs.len() < batch_size {
            let path = match self.ds.files.as_ref().and_then(|f| f.get(self.pos)) {
                Some(path) => path.clone(),
                None => break,
            };
            self.pos += 1;
            let label = match label_of(&self.ds.root, &path) {
                Some(label) => label,
                None => {
                    log::warn!("skipping misplaced file {}", path.display());
                    continue;
                }
            };
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => return Some(Err(e.into())),
            };
            inputs.push(DaoRawRecord::Text(content));
            labels.push(DaoRawRecord::Text(label));
            self.seen += 1;
        }

        if inputs.is_empty() {
            self.finish();
            return None;
        }

        self.steps += 1;
        // Running counters; authoritative only once the pass completes.
        self.ds.dataset_size = self.ds.dataset_size.max(self.seen);
        self.ds.max_steps = self.ds.max_steps.max(self.steps);

        let filter = match self.ds.filter.as_mut() {
            Some(filter) => filter,
            None => return Some(Err(DaoError::internal("filter detached mid-epoch"))),
        };
        let result = filter.translate(&inputs, Some(&labels));
        if self.pos >= total_files {
            self.finish();
        }
        Some(result)
    }
}
