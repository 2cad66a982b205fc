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

//! # Dao CSV Dataset
//!
//! Dataset over one CSV file or a directory of CSV files. Files are
//! enumerated with [`DaoDirectoryCrawler`] (optionally regex-filtered) and
//! read one at a time with `csv::Reader`; each reader is scoped to its file
//! and dropped as soon as the file is drained. Rows accumulate as
//! [`DaoRawRecord::Fields`] until `batch_size` is reached, the mandatory
//! filter translates the window (splitting inputs from labels itself), and
//! the final partial batch is flushed.
//!
//! When shuffling is on, one row permutation is drawn per translated batch
//! and gathered into both tensors. Single-row batches skip the draw so
//! trivial inputs never touch the generator.

use std::fs::File;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecordsIntoIter};
use ndarray::Axis;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crawler::DaoDirectoryCrawler;
use crate::dataset::{
    draw_permutation, DaoBatch, DaoBatchStream, DaoDataset, DaoDatasetFilter, DaoRawRecord,
};
use crate::errors::{DaoError, Result};

/// CSV dataset options.
///
/// - `batch_size` (32): rows per translated batch.
/// - `shuffle` (true): post-translate row permutation per batch.
/// - `pattern` (None): regex over full paths restricting the crawl.
/// - `delimiter` / `enclosure` / `escape`: RFC4180-like single-byte
///   parameters, defaulting to `,` / `"` / none.
/// - `skip_header` (true): drop the first row of every file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoCsvConfig {
    pub batch_size: usize,
    pub shuffle: bool,
    pub pattern: Option<String>,
    pub delimiter: u8,
    pub enclosure: u8,
    pub escape: Option<u8>,
    pub skip_header: bool,
}

impl Default for DaoCsvConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            pattern: None,
            delimiter: b',',
            enclosure: b'"',
            escape: None,
            skip_header: true,
        }
    }
}

/// Dataset over CSV rows behind a mandatory raw-to-tensor filter.
pub struct DaoCsvDataset<T> {
    source: PathBuf,
    config: DaoCsvConfig,
    pattern: Option<Regex>,
    crawler: DaoDirectoryCrawler,
    filter: Option<Box<dyn DaoDatasetFilter<T>>>,
    files: Option<Vec<PathBuf>>,
    dataset_size: usize,
}

impl<T: Clone + 'static> DaoCsvDataset<T> {
    /// Builds the dataset over a CSV file or a directory of CSV files.
    pub fn new(source: impl Into<PathBuf>, config: DaoCsvConfig) -> Result<Self> {
        let pattern = config
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| DaoError::config(format!("invalid path pattern: {e}")))?;
        Ok(Self {
            source: source.into(),
            config,
            pattern,
            crawler: DaoDirectoryCrawler::new(),
            filter: None,
            files: None,
            dataset_size: 0,
        })
    }

    fn ensure_files(&mut self) -> Result<()> {
        if self.files.is_none() {
            let files = if self.source.is_file() {
                vec![self.source.clone()]
            } else {
                self.crawler
                    .list_files(&self.source, self.pattern.as_ref())?
            };
            self.files = Some(files);
        }
        Ok(())
    }
}

impl<T: Clone + 'static> DaoDataset<T> for DaoCsvDataset<T> {
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
                "CSV dataset has no stream mode: batch_size must be positive",
            ));
        }
        if self.filter.is_none() {
            return Err(DaoError::config("CSV dataset requires a filter"));
        }
        self.ensure_files()?;
        Ok(Box::new(DaoCsvBatches {
            ds: self,
            file_idx: 0,
            records: None,
            seen: 0,
            done: false,
        }))
    }
}

/// Per-epoch iterator reading CSV rows into filter-translated batches.
pub struct DaoCsvBatches<'a, T> {
    ds: &'a mut DaoCsvDataset<T>,
    file_idx: usize,
    records: Option<StringRecordsIntoIter<File>>,
    seen: usize,
    done: bool,
}

impl<'a, T: Clone + 'static> DaoCsvBatches<'a, T> {
    /// Next raw row across file boundaries, opening readers lazily.
    fn next_row(&mut self) -> Option<Result<Vec<String>>> {
        loop {
            if let Some(records) = self.records.as_mut() {
                match records.next() {
                    Some(Ok(record)) => {
                        return Some(Ok(record.iter().map(str::to_string).collect()));
                    }
                    Some(Err(e)) => return Some(Err(e.into())),
                    None => self.records = None,
                }
            }
            let files = self.ds.files.as_ref()?;
            if self.file_idx >= files.len() {
                return None;
            }
            let path = files[self.file_idx].clone();
            self.file_idx += 1;
            let reader = ReaderBuilder::new()
                .delimiter(self.ds.config.delimiter)
                .quote(self.ds.config.enclosure)
                .escape(self.ds.config.escape)
                .has_headers(self.ds.config.skip_header)
                .flexible(true)
                .from_path(&path);
            match reader {
                Ok(reader) => self.records = Some(reader.into_records()),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

impl<'a, T: Clone + 'static> Iterator for DaoCsvBatches<'a, T> {
    type Item = Result<DaoBatch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let batch_size = self.ds.config.batch_size;
        let mut rows = Vec::with_capacity(batch_size);
        while rows.len() < batch_size {
            match self.next_row() {
                Some(Ok(fields)) => rows.push(DaoRawRecord::Fields(fields)),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        if rows.is_empty() {
            self.done = true;
            self.ds.dataset_size = self.seen;
            return None;
        }
        self.seen += rows.len();
        self.ds.dataset_size = self.ds.dataset_size.max(self.seen);

        let filter = match self.ds.filter.as_mut() {
            Some(filter) => filter,
            None => return Some(Err(DaoError::internal("filter detached mid-epoch"))),
        };
        // The filter splits inputs from labels itself, so no raw labels
        // are passed.
        let (mut inputs, mut labels) = match filter.translate(&rows, None) {
            Ok(translated) => translated,
            Err(e) => return Some(Err(e)),
        };

        // Single-row batches skip the draw entirely.
        if self.ds.config.shuffle && inputs.shape()[0] > 1 {
            let perm = draw_permutation(inputs.shape()[0]);
            inputs = inputs.select(Axis(0), &perm);
            labels = labels.map(|l| l.select(Axis(0), &perm));
        }

        Some(Ok((inputs, labels)))
    }
}
