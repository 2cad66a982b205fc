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

//! # Dao Dataset Tests - CSV
//!
//! This module contains tests for the CSV dataset: row accumulation and the
//! final partial batch, per-file header skipping, dialect options, the
//! mandatory filter, and the post-translate shuffle.
//!
//! ## Test Categories
//!
//! - **Batching Tests**: Window sizes, multi-file enumeration
//! - **Dialect Tests**: Delimiter and header options
//! - **Configuration Tests**: Filter requirement, stream-mode rejection
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test csv_dataset
//! ```

use std::fs;
use std::path::Path;

use dao::{DaoCsvConfig, DaoCsvDataset, DaoDataset, DaoDatasetFilter, DaoRawRecord, Result};
use ndarray::{Array1, Array2, ArrayD};
use tempfile::TempDir;

/// Splits each row into leading float features and a trailing integer-coded
/// label column.
struct SplitLastColumn;

impl DaoDatasetFilter<f32> for SplitLastColumn {
    fn translate(
        &mut self,
        inputs: &[DaoRawRecord<f32>],
        labels: Option<&[DaoRawRecord<f32>]>,
    ) -> Result<(ArrayD<f32>, Option<ArrayD<f32>>)> {
        assert!(labels.is_none(), "CSV hands all columns through inputs");
        let mut features = Vec::new();
        let mut ids = Vec::with_capacity(inputs.len());
        let mut cols = 0;
        for record in inputs {
            let fields = match record {
                DaoRawRecord::Fields(fields) => fields,
                _ => panic!("expected parsed CSV fields"),
            };
            cols = fields.len() - 1;
            for value in &fields[..cols] {
                features.push(value.parse::<f32>().unwrap());
            }
            ids.push(fields[cols].parse::<f32>().unwrap());
        }
        let inputs = Array2::from_shape_vec((ids.len(), cols), features)
            .map_err(|e| dao::DaoError::shape(e.to_string()))?
            .into_dyn();
        Ok((inputs, Some(Array1::from_vec(ids).into_dyn())))
    }
}

fn write_csv(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn no_shuffle(batch_size: usize) -> DaoCsvConfig {
    DaoCsvConfig {
        batch_size,
        shuffle: false,
        ..DaoCsvConfig::default()
    }
}

/// Tests row batching over one file: header skipped, final partial batch
/// flushed, values preserved in order without shuffling.
#[test]
fn test_single_file_batching() {
    let dir = TempDir::new().unwrap();
    write_csv(
        dir.path(),
        "data.csv",
        "x,y,label\n1,2,0\n3,4,1\n5,6,0\n7,8,1\n9,10,0\n",
    );

    let mut ds =
        DaoCsvDataset::new(dir.path().join("data.csv"), no_shuffle(2)).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));

    let batches: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].0.shape(), &[2, 2]);
    assert_eq!(batches[2].0.shape(), &[1, 2]);
    assert_eq!(batches[2].0[[0, 0]], 9.0);
    assert_eq!(batches[2].1.as_ref().unwrap()[[0]], 0.0);
    assert_eq!(ds.dataset_size(), 5);
}

/// Tests that a directory source enumerates files in sorted order and
/// batches span file boundaries.
#[test]
fn test_directory_source_spans_files() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "a.csv", "x,label\n1,0\n2,1\n3,0\n");
    write_csv(dir.path(), "b.csv", "x,label\n4,1\n5,0\n");

    let mut ds = DaoCsvDataset::new(dir.path(), no_shuffle(4)).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));

    let batches: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(batches.len(), 2);
    // fourth row of the first batch is the first row of b.csv
    assert_eq!(batches[0].0[[3, 0]], 4.0);
    assert_eq!(batches[1].0.shape()[0], 1);
}

/// Tests skip_header = false: the leading row is data.
#[test]
fn test_headerless_files() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "data.csv", "1,0\n2,1\n");

    let config = DaoCsvConfig {
        batch_size: 8,
        shuffle: false,
        skip_header: false,
        ..DaoCsvConfig::default()
    };
    let mut ds = DaoCsvDataset::new(dir.path().join("data.csv"), config).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));

    let batches: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(batches[0].0.shape(), &[2, 1]);
    assert_eq!(batches[0].0[[0, 0]], 1.0);
}

/// Tests a non-default delimiter and quoted fields.
#[test]
fn test_delimiter_and_quotes() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "data.csv", "x;label\n\"1.5\";0\n2.5;1\n");

    let config = DaoCsvConfig {
        batch_size: 8,
        shuffle: false,
        delimiter: b';',
        ..DaoCsvConfig::default()
    };
    let mut ds = DaoCsvDataset::new(dir.path().join("data.csv"), config).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));

    let batches: Vec<_> = ds.epoch().unwrap().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(batches[0].0[[0, 0]], 1.5);
    assert_eq!(batches[0].0[[1, 0]], 2.5);
}

/// Tests the post-translate shuffle: inputs and labels stay row-aligned and
/// the epoch covers every row exactly once.
#[test]
fn test_shuffle_keeps_alignment() {
    let dir = TempDir::new().unwrap();
    let body: String = std::iter::once("x,label\n".to_string())
        .chain((0..20).map(|i| format!("{i},{i}\n")))
        .collect();
    write_csv(dir.path(), "data.csv", &body);

    let config = DaoCsvConfig {
        batch_size: 6,
        ..DaoCsvConfig::default()
    };
    let mut ds = DaoCsvDataset::new(dir.path().join("data.csv"), config).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));

    let mut seen = Vec::new();
    for batch in ds.epoch().unwrap() {
        let (inputs, labels) = batch.unwrap();
        let labels = labels.unwrap();
        for r in 0..inputs.shape()[0] {
            assert_eq!(inputs[[r, 0]], labels[[r]]);
            seen.push(inputs[[r, 0]] as usize);
        }
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..20).collect::<Vec<_>>());
}

/// Tests that iteration without a filter is a configuration error.
#[test]
fn test_filter_is_mandatory() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "data.csv", "x,label\n1,0\n");

    let mut ds =
        DaoCsvDataset::<f32>::new(dir.path().join("data.csv"), no_shuffle(2)).unwrap();
    assert!(ds.epoch().is_err());
}

/// Tests that batch size 0 is rejected: CSV has no stream mode.
#[test]
fn test_stream_mode_rejected() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "data.csv", "x,label\n1,0\n");

    let mut ds = DaoCsvDataset::new(dir.path().join("data.csv"), no_shuffle(0)).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));
    assert!(ds.epoch().is_err());
}

/// Tests that a missing source path fails at first iteration, not at
/// construction.
#[test]
fn test_missing_file_fails_lazily() {
    let mut ds =
        DaoCsvDataset::new("/nonexistent/dao-data.csv", no_shuffle(2)).unwrap();
    ds.set_filter(Box::new(SplitLastColumn));
    // a nonexistent path is treated as a directory source; the crawl fails
    assert!(ds.epoch().is_err());
}
