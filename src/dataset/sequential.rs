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

//! # Dao Sequential Dataset
//!
//! Adapts an externally supplied, restartable source of tensor chunks to
//! the batching contract. Each incoming `(inputs, labels)` chunk is run
//! through the in-memory array batching algorithm and the resulting batches
//! are flattened into one numbered sequence, so chunk boundaries are
//! invisible to the consumer.
//!
//! A declared `total_size` caps the number of emitted rows: the final batch
//! is truncated to fit and the source is not pulled further, even when it
//! has more chunks.

use std::collections::VecDeque;

use ndarray::{ArrayD, Axis, Slice};

use crate::dataset::array::{array_batches, DaoArrayDatasetConfig};
use crate::dataset::{DaoBatch, DaoBatchStream, DaoDataset, DaoDatasetFilter};
use crate::errors::Result;

/// One incoming chunk: inputs plus optional aligned labels.
pub type DaoChunk<T> = (ArrayD<T>, Option<ArrayD<T>>);

/// One pass over the external source.
pub type DaoChunkIter<T> = Box<dyn Iterator<Item = Result<DaoChunk<T>>>>;

/// Restartable chunk-source factory; called once per epoch.
pub type DaoChunkSource<T> = Box<dyn FnMut() -> DaoChunkIter<T> + Send>;

/// Sequential dataset options.
///
/// - `batch_size` (32): rows per batch; 0 selects per-row stream mode.
/// - `shuffle` (true): the array algorithm's two permutation layers,
///   applied within each chunk.
/// - `total_size` (None): row-emission cap across the whole epoch.
#[derive(Clone, Copy, Debug)]
pub struct DaoSequentialConfig {
    pub batch_size: usize,
    pub shuffle: bool,
    pub total_size: Option<usize>,
}

impl Default for DaoSequentialConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            total_size: None,
        }
    }
}

/// Dataset over an external chunk source.
pub struct DaoSequentialDataset<T> {
    source: DaoChunkSource<T>,
    config: DaoSequentialConfig,
    filter: Option<Box<dyn DaoDatasetFilter<T>>>,
    seen: usize,
}

impl<T: Clone + 'static> DaoSequentialDataset<T> {
    pub fn new(source: DaoChunkSource<T>, config: DaoSequentialConfig) -> Self {
        Self {
            source,
            config,
            filter: None,
            seen: 0,
        }
    }

    /// Convenience constructor over a fixed chunk list, replayed per epoch.
    pub fn from_chunks(chunks: Vec<DaoChunk<T>>, config: DaoSequentialConfig) -> Self
    where
        T: Send,
    {
        Self::new(
            Box::new(move || {
                let replay: Vec<Result<DaoChunk<T>>> =
                    chunks.iter().cloned().map(Ok).collect();
                Box::new(replay.into_iter())
            }),
            config,
        )
    }
}

impl<T: Clone + 'static> DaoDataset<T> for DaoSequentialDataset<T> {
    /// The declared cap when set, otherwise the row count observed on the
    /// most recent completed pass.
    fn dataset_size(&self) -> usize {
        self.config.total_size.unwrap_or(self.seen)
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn set_filter(&mut self, filter: Box<dyn DaoDatasetFilter<T>>) {
        self.filter = Some(filter);
    }

    fn epoch(&mut self) -> Result<DaoBatchStream<'_, T>> {
        let chunks = (self.source)();
        Ok(Box::new(DaoSequentialBatches {
            ds: self,
            chunks,
            pending: VecDeque::new(),
            emitted: 0,
            done: false,
        }))
    }
}

/// Flattened per-epoch iterator over chunk-local array batches.
pub struct DaoSequentialBatches<'a, T> {
    ds: &'a mut DaoSequentialDataset<T>,
    chunks: DaoChunkIter<T>,
    pending: VecDeque<Result<DaoBatch<T>>>,
    emitted: usize,
    done: bool,
}

impl<'a, T: Clone + 'static> DaoSequentialBatches<'a, T> {
    /// Pulls the next chunk and materializes its batches. The chunk only
    /// lives for the duration of this call, so the batches are collected
    /// eagerly rather than streamed.
    fn refill(&mut self) -> Option<()> {
        while self.pending.is_empty() {
            let chunk = match self.chunks.next()? {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.pending.push_back(Err(e));
                    return Some(());
                }
            };
            let (inputs, labels) = chunk;
            let cfg = DaoArrayDatasetConfig {
                batch_size: self.ds.config.batch_size,
                shuffle: self.ds.config.shuffle,
            };
            let batches: Vec<Result<DaoBatch<T>>> =
                array_batches(&inputs, labels.as_ref(), self.ds.filter.as_deref_mut(), cfg)
                    .collect();
            self.pending.extend(batches);
        }
        Some(())
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.ds.seen = self.emitted;
        }
    }
}

impl<'a, T: Clone + 'static> Iterator for DaoSequentialBatches<'a, T> {
    type Item = Result<DaoBatch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if matches!(self.ds.config.total_size, Some(total) if self.emitted >= total) {
            self.finish();
            return None;
        }
        if self.refill().is_none() {
            self.finish();
            return None;
        }
        let (mut inputs, mut labels) = match self.pending.pop_front()? {
            Ok(batch) => batch,
            Err(e) => return Some(Err(e)),
        };

        if let Some(total) = self.ds.config.total_size {
            let remaining = total - self.emitted;
            let rows = inputs.shape()[0];
            if rows >= remaining {
                inputs = inputs
                    .slice_axis(Axis(0), Slice::from(..remaining))
                    .to_owned();
                labels = labels
                    .map(|l| l.slice_axis(Axis(0), Slice::from(..remaining)).to_owned());
                self.emitted = total;
                self.pending.clear();
                self.finish();
                return Some(Ok((inputs, labels)));
            }
        }

        self.emitted += inputs.shape()[0];
        Some(Ok((inputs, labels)))
    }
}
