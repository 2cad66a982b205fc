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

//! # Dao Dataset Module
//!
//! The dataset family turns raw sources into finite, restartable sequences
//! of tensor batches. Every dataset owns a batch size, optional shuffling,
//! and an optional attached [`DaoDatasetFilter`] converting raw per-item
//! data into tensors.
//!
//! ## Iteration Contract
//!
//! Each call to [`DaoDataset::epoch`] starts a fresh pass producing
//! `ceil(dataset_size / batch_size)` batches; consumers iterate with
//!
//! ```rust
//! for (step, batch) in dataset.epoch()?.enumerate() {
//!     let (inputs, labels) = batch?;
//!     // ...
//! }
//! ```
//!
//! Shuffling redraws its permutations on every epoch from the ambient
//! process-wide generator; there is no per-dataset seed parameter, so
//! callers requiring reproducibility must control the ambient seed
//! themselves. A batch size of 0 selects stream mode: one raw record per
//! emission, no tensor batching.
//!
//! ## Implementations
//!
//! - [`array::DaoNDArrayDataset`]: in-memory tensors.
//! - [`classified::DaoClassifiedDirectoryDataset`]: labeled directory trees.
//! - [`csv::DaoCsvDataset`]: CSV files (feature `csv`).
//! - [`sequential::DaoSequentialDataset`]: externally streamed chunks.
//! - [`text::DaoTextClassifiedDataset`]: two-phase-fitted text corpora.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use ndarray::ArrayD;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::errors::{DaoError, Result};

pub mod array;
pub mod classified;
#[cfg(feature = "csv")]
pub mod csv;
pub mod sequential;
pub mod text;

/// One batch: inputs plus optional labels with matching leading dimension.
/// Batches are produced, consumed, and discarded; the pipeline keeps no
/// persistent batch storage.
pub type DaoBatch<T> = (ArrayD<T>, Option<ArrayD<T>>);

/// Boxed per-epoch batch iterator handed out by [`DaoDataset::epoch`].
pub type DaoBatchStream<'a, T> = Box<dyn Iterator<Item = Result<DaoBatch<T>>> + 'a>;

/// Raw per-item data handed to a [`DaoDatasetFilter`]: text content, parsed
/// CSV fields, or one flattened tensor row.
#[derive(Clone, Debug, PartialEq)]
pub enum DaoRawRecord<T> {
    Text(String),
    Fields(Vec<String>),
    TensorRow(Vec<T>),
}

/// One stream-mode emission from a classified source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaoRawItem {
    pub content: String,
    /// `None` when the source is configured as unclassified.
    pub label: Option<String>,
}

/// Pluggable raw-to-tensor conversion stage attached to a dataset.
///
/// Filter-requiring sources (CSV, classified text) reject iteration without
/// one; array sources use it optionally.
pub trait DaoDatasetFilter<T>: Send {
    fn translate(
        &mut self,
        inputs: &[DaoRawRecord<T>],
        labels: Option<&[DaoRawRecord<T>]>,
    ) -> Result<(ArrayD<T>, Option<ArrayD<T>>)>;
}

/// Shared iteration contract of the dataset family.
pub trait DaoDataset<T> {
    /// Total item count; for streaming sources this may be 0 until the
    /// first full pass has completed.
    fn dataset_size(&self) -> usize;

    /// Configured batch size; 0 means stream mode.
    fn batch_size(&self) -> usize;

    /// Batches per epoch: `ceil(dataset_size / batch_size)`; unused in
    /// stream mode.
    fn num_steps(&self) -> usize {
        let batch = self.batch_size();
        if batch == 0 {
            0
        } else {
            self.dataset_size().div_ceil(batch)
        }
    }

    /// Attaches (or replaces) the raw-to-tensor filter.
    fn set_filter(&mut self, filter: Box<dyn DaoDatasetFilter<T>>);

    /// Starts a fresh epoch. Permutations are redrawn per call; dataset
    /// content is otherwise immutable across epochs.
    fn epoch(&mut self) -> Result<DaoBatchStream<'_, T>>;
}

/// Incrementally built classname → integer-id map for classified sources.
///
/// The first-seen class name receives the next unused id. A validation
/// dataset shares the registry of its training split by reference (via
/// [`DaoSharedLabels`]) so both use the same assignment; keeping the
/// validation split from introducing new names is the caller's
/// responsibility.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DaoLabelRegistry {
    names: Vec<String>,
    ids: HashMap<String, i32>,
}

impl DaoLabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, assigning the next unused id on first sight.
    pub fn get_or_insert(&mut self, name: &str) -> i32 {
        match self.ids.get(name) {
            Some(&id) => id,
            None => {
                let id = self.names.len() as i32;
                self.names.push(name.to_string());
                self.ids.insert(name.to_string(), id);
                id
            }
        }
    }

    /// Id for `name`, failing when the class was never registered.
    pub fn get(&self, name: &str) -> Result<i32> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| DaoError::not_found(format!("class '{name}' is not registered")))
    }

    /// Class names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Label registry shared by reference across train/validation splits.
pub type DaoSharedLabels = Arc<Mutex<DaoLabelRegistry>>;

/// Uniform random permutation of `[0, n)` from the ambient generator.
pub(crate) fn draw_permutation(n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rand::thread_rng());
    order
}

/// Locks shared state, mapping poisoning onto an internal error.
pub(crate) fn lock<T>(shared: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    shared
        .lock()
        .map_err(|_| DaoError::internal("shared state lock poisoned"))
}
