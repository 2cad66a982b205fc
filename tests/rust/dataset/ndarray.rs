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

//! # Dao Dataset Tests - Array
//!
//! This module contains tests for the in-memory array dataset: batch
//! windowing, shuffle permutations, stream mode, and filter translation.
//!
//! ## Test Categories
//!
//! - **Windowing Tests**: Batch counts, partial final batch, ordering
//! - **Shuffle Tests**: Epoch coverage as an exact permutation
//! - **Filter Tests**: Raw tensor rows through a translate stage
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test ndarray_dataset
//! ```

use std::collections::HashSet;

use dao::{
    DaoArrayDatasetConfig, DaoDataset, DaoDatasetFilter, DaoNDArrayDataset, DaoRawRecord, Result,
};
use ndarray::{Array1, Array2, ArrayD};
use proptest::prelude::*;

/// Rows 0..n with the row index in every column, so any shuffle is
/// recoverable from the first column.
fn indexed_inputs(n: usize, cols: usize) -> ArrayD<f32> {
    Array2::from_shape_fn((n, cols), |(r, _)| r as f32).into_dyn()
}

fn labels(n: usize) -> ArrayD<f32> {
    Array1::from_shape_fn(n, |r| r as f32).into_dyn()
}

/// Tests the partial final batch: 3 rows with batch size 2 and no shuffle
/// yield sizes [2, 1] in original order.
#[test]
fn test_partial_final_batch_in_order() {
    let config = DaoArrayDatasetConfig {
        batch_size: 2,
        shuffle: false,
    };
    let mut ds = DaoNDArrayDataset::new(indexed_inputs(3, 4), Some(labels(3)), config).unwrap();
    assert_eq!(ds.num_steps(), 2);

    let batches: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].0.shape()[0], 2);
    assert_eq!(batches[1].0.shape()[0], 1);

    let seen: Vec<f32> = batches
        .iter()
        .flat_map(|(inputs, _)| {
            (0..inputs.shape()[0]).map(|r| inputs[[r, 0]]).collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(seen, vec![0.0, 1.0, 2.0]);
}

/// Tests that labels stay row-aligned with inputs through shuffling.
#[test]
fn test_labels_stay_aligned_under_shuffle() {
    let config = DaoArrayDatasetConfig {
        batch_size: 4,
        shuffle: true,
    };
    let mut ds = DaoNDArrayDataset::new(indexed_inputs(10, 3), Some(labels(10)), config).unwrap();

    for batch in ds.epoch().unwrap() {
        let (inputs, batch_labels) = batch.unwrap();
        let batch_labels = batch_labels.unwrap();
        for r in 0..inputs.shape()[0] {
            assert_eq!(inputs[[r, 0]], batch_labels[[r]]);
        }
    }
}

/// Tests that a shuffled epoch is an exact permutation: every row appears
/// exactly once across all batches.
#[test]
fn test_shuffled_epoch_covers_all_rows_once() {
    let config = DaoArrayDatasetConfig {
        batch_size: 3,
        shuffle: true,
    };
    let mut ds = DaoNDArrayDataset::new(indexed_inputs(11, 2), None, config).unwrap();

    let mut seen = HashSet::new();
    for batch in ds.epoch().unwrap() {
        let (inputs, _) = batch.unwrap();
        for r in 0..inputs.shape()[0] {
            assert!(seen.insert(inputs[[r, 0]] as usize));
        }
    }
    assert_eq!(seen, (0..11).collect());
}

/// Tests stream mode: batch size 0 yields one leading-dim-1 row per step in
/// original order, ignoring the shuffle flag.
#[test]
fn test_stream_mode() {
    let config = DaoArrayDatasetConfig {
        batch_size: 0,
        shuffle: true,
    };
    let mut ds = DaoNDArrayDataset::new(indexed_inputs(5, 2), Some(labels(5)), config).unwrap();
    assert_eq!(ds.num_steps(), 0);

    let rows: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(rows.len(), 5);
    for (i, (inputs, row_labels)) in rows.iter().enumerate() {
        assert_eq!(inputs.shape(), &[1, 2]);
        assert_eq!(inputs[[0, 0]], i as f32);
        assert_eq!(row_labels.as_ref().unwrap()[[0]], i as f32);
    }
}

/// Tests that a mismatched labels leading dimension is rejected eagerly.
#[test]
fn test_label_length_mismatch_rejected() {
    let result = DaoNDArrayDataset::new(
        indexed_inputs(4, 2),
        Some(labels(5)),
        DaoArrayDatasetConfig::default(),
    );
    assert!(result.is_err());
}

/// Doubles every tensor cell, proving raw rows reach the filter.
struct Doubler;

impl DaoDatasetFilter<f32> for Doubler {
    fn translate(
        &mut self,
        inputs: &[DaoRawRecord<f32>],
        labels: Option<&[DaoRawRecord<f32>]>,
    ) -> Result<(ArrayD<f32>, Option<ArrayD<f32>>)> {
        let rows: Vec<Vec<f32>> = inputs
            .iter()
            .map(|record| match record {
                DaoRawRecord::TensorRow(row) => row.iter().map(|v| v * 2.0).collect(),
                _ => Vec::new(),
            })
            .collect();
        let cols = rows.first().map_or(0, Vec::len);
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let out = Array2::from_shape_vec((inputs.len(), cols), flat)
            .map_err(|e| dao::DaoError::shape(e.to_string()))?
            .into_dyn();
        assert!(labels.is_none());
        Ok((out, None))
    }
}

/// Tests an attached filter: raw rows are handed over per batch and the
/// translated tensors are what the epoch yields.
#[test]
fn test_filter_translates_batches() {
    let config = DaoArrayDatasetConfig {
        batch_size: 2,
        shuffle: false,
    };
    let mut ds = DaoNDArrayDataset::new(indexed_inputs(4, 2), None, config).unwrap();
    ds.set_filter(Box::new(Doubler));

    let batches: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(batches[1].0[[0, 0]], 4.0);
    assert_eq!(batches[1].0[[1, 0]], 6.0);
}

/// Tests that re-iterating starts a fresh epoch with the full row set.
#[test]
fn test_epochs_are_restartable() {
    let config = DaoArrayDatasetConfig {
        batch_size: 4,
        shuffle: true,
    };
    let mut ds = DaoNDArrayDataset::new(indexed_inputs(9, 2), None, config).unwrap();

    for _ in 0..3 {
        let rows: usize = ds
            .epoch()
            .unwrap()
            .map(|b| b.unwrap().0.shape()[0])
            .sum();
        assert_eq!(rows, 9);
    }
}

proptest! {
    /// Batch count: ceil(N/B) batches whose row counts sum to N.
    #[test]
    fn prop_batch_count(n in 1usize..40, batch in 1usize..10, shuffle in any::<bool>()) {
        let config = DaoArrayDatasetConfig { batch_size: batch, shuffle };
        let mut ds = DaoNDArrayDataset::new(indexed_inputs(n, 2), None, config).unwrap();

        let sizes: Vec<usize> = ds
            .epoch()
            .unwrap()
            .map(|b| b.unwrap().0.shape()[0])
            .collect();
        prop_assert_eq!(sizes.len(), n.div_ceil(batch));
        prop_assert_eq!(sizes.iter().sum::<usize>(), n);
    }

    /// Shuffle is a permutation: each row index appears exactly once per
    /// epoch.
    #[test]
    fn prop_shuffle_is_permutation(n in 1usize..30, batch in 1usize..8) {
        let config = DaoArrayDatasetConfig { batch_size: batch, shuffle: true };
        let mut ds = DaoNDArrayDataset::new(indexed_inputs(n, 1), None, config).unwrap();

        let mut seen = Vec::new();
        for b in ds.epoch().unwrap() {
            let (inputs, _) = b.unwrap();
            for r in 0..inputs.shape()[0] {
                seen.push(inputs[[r, 0]] as usize);
            }
        }
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }
}
