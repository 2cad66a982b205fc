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

//! # Dao Array Dataset
//!
//! In-memory dataset over tensors that are already batch-shaped. Each epoch
//! slices the leading dimension into `ceil(N / batch_size)` windows. With
//! shuffling enabled two independent permutations are drawn per epoch: one
//! over the batch order (when there is more than one batch) and one over the
//! rows inside every emitted batch.
//!
//! The chunk-batching iterator here is also the engine behind
//! [`crate::dataset::sequential::DaoSequentialDataset`], which re-wraps each
//! incoming chunk as an ephemeral in-memory dataset.

use ndarray::{ArrayD, Axis, Slice};
use serde::{Deserialize, Serialize};

use crate::dataset::{
    draw_permutation, DaoBatch, DaoBatchStream, DaoDataset, DaoDatasetFilter, DaoRawRecord,
};
use crate::errors::{DaoError, Result};

/// Array dataset options.
///
/// - `batch_size` (32): rows per batch; 0 selects stream mode (one
///   leading-dim-1 row per step, no shuffling, no filter).
/// - `shuffle` (true): draw the batch-order and intra-batch permutations.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DaoArrayDatasetConfig {
    pub batch_size: usize,
    pub shuffle: bool,
}

impl Default for DaoArrayDatasetConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
        }
    }
}

/// Dataset over in-memory input tensors with optional aligned labels.
pub struct DaoNDArrayDataset<T> {
    inputs: ArrayD<T>,
    labels: Option<ArrayD<T>>,
    config: DaoArrayDatasetConfig,
    filter: Option<Box<dyn DaoDatasetFilter<T>>>,
}

impl<T: Clone + 'static> DaoNDArrayDataset<T> {
    /// Builds the dataset, rejecting label tensors whose leading dimension
    /// differs from the inputs'.
    pub fn new(
        inputs: ArrayD<T>,
        labels: Option<ArrayD<T>>,
        config: DaoArrayDatasetConfig,
    ) -> Result<Self> {
        if inputs.ndim() == 0 {
            return Err(DaoError::shape("inputs tensor must have a leading dimension"));
        }
        if let Some(labels) = &labels {
            if labels.ndim() == 0 || labels.shape()[0] != inputs.shape()[0] {
                return Err(DaoError::shape(format!(
                    "labels leading dimension {:?} does not match inputs {}",
                    labels.shape().first(),
                    inputs.shape()[0]
                )));
            }
        }
        Ok(Self {
            inputs,
            labels,
            config,
            filter: None,
        })
    }

    pub fn inputs(&self) -> &ArrayD<T> {
        &self.inputs
    }

    pub fn labels(&self) -> Option<&ArrayD<T>> {
        self.labels.as_ref()
    }

    /// Concrete per-epoch iterator (the trait's `epoch` boxes this).
    pub fn epoch_iter(&mut self) -> DaoArrayBatches<'_, T> {
        array_batches(
            &self.inputs,
            self.labels.as_ref(),
            self.filter.as_deref_mut(),
            self.config,
        )
    }
}

impl<T: Clone + 'static> DaoDataset<T> for DaoNDArrayDataset<T> {
    fn dataset_size(&self) -> usize {
        self.inputs.shape()[0]
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn set_filter(&mut self, filter: Box<dyn DaoDatasetFilter<T>>) {
        self.filter = Some(filter);
    }

    fn epoch(&mut self) -> Result<DaoBatchStream<'_, T>> {
        Ok(Box::new(self.epoch_iter()))
    }
}

/// Runs the array batching algorithm over borrowed tensors.
///
/// Drawing the batch-order permutation happens here, once per epoch; the
/// intra-batch row permutation is drawn per emitted batch.
pub(crate) fn array_batches<'a, T: Clone>(
    inputs: &'a ArrayD<T>,
    labels: Option<&'a ArrayD<T>>,
    filter: Option<&'a mut (dyn DaoDatasetFilter<T> + 'static)>,
    config: DaoArrayDatasetConfig,
) -> DaoArrayBatches<'a, T> {
    let size = inputs.shape()[0];
    let steps = if config.batch_size == 0 {
        size
    } else {
        size.div_ceil(config.batch_size)
    };
    let order = if config.batch_size > 0 && config.shuffle && steps > 1 {
        draw_permutation(steps)
    } else {
        (0..steps).collect()
    };
    DaoArrayBatches {
        inputs,
        labels,
        filter,
        batch_size: config.batch_size,
        shuffle: config.shuffle,
        size,
        order,
        step: 0,
    }
}

/// Per-epoch batch iterator over array-backed tensors.
pub struct DaoArrayBatches<'a, T> {
    inputs: &'a ArrayD<T>,
    labels: Option<&'a ArrayD<T>>,
    filter: Option<&'a mut (dyn DaoDatasetFilter<T> + 'static)>,
    batch_size: usize,
    shuffle: bool,
    size: usize,
    order: Vec<usize>,
    step: usize,
}

impl<'a, T: Clone> Iterator for DaoArrayBatches<'a, T> {
    type Item = Result<DaoBatch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.order.len() {
            return None;
        }
        let index = self.order[self.step];
        self.step += 1;

        if self.batch_size == 0 {
            // Stream mode: one raw row per step, untouched by filter or
            // shuffling.
            let row = self
                .inputs
                .slice_axis(Axis(0), Slice::from(index..index + 1))
                .to_owned();
            let labels = self
                .labels
                .map(|l| l.slice_axis(Axis(0), Slice::from(index..index + 1)).to_owned());
            return Some(Ok((row, labels)));
        }

        let start = index * self.batch_size;
        let end = ((index + 1) * self.batch_size).min(self.size);
        let mut inputs = self
            .inputs
            .slice_axis(Axis(0), Slice::from(start..end))
            .to_owned();
        let mut labels = self
            .labels
            .map(|l| l.slice_axis(Axis(0), Slice::from(start..end)).to_owned());

        if let Some(filter) = self.filter.as_mut() {
            let raw_inputs = tensor_rows(&inputs);
            let raw_labels = labels.as_ref().map(tensor_rows);
            match filter.translate(&raw_inputs, raw_labels.as_deref()) {
                Ok((translated_inputs, translated_labels)) => {
                    inputs = translated_inputs;
                    labels = translated_labels;
                }
                Err(e) => return Some(Err(e)),
            }
            if let Some(l) = &labels {
                if l.shape()[0] != inputs.shape()[0] {
                    return Some(Err(DaoError::shape(
                        "filter returned tensors with mismatched leading dimensions",
                    )));
                }
            }
        }

        if self.shuffle {
            // Second randomization layer, independent of the batch order.
            let perm = draw_permutation(inputs.shape()[0]);
            inputs = inputs.select(Axis(0), &perm);
            labels = labels.map(|l| l.select(Axis(0), &perm));
        }

        Some(Ok((inputs, labels)))
    }
}

/// Splits a batch tensor into per-row raw records for a filter.
fn tensor_rows<T: Clone>(tensor: &ArrayD<T>) -> Vec<DaoRawRecord<T>> {
    (0..tensor.shape()[0])
        .map(|i| {
            DaoRawRecord::TensorRow(tensor.index_axis(Axis(0), i).iter().cloned().collect())
        })
        .collect()
}
