// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use serde::{Deserialize, Serialize};

use crate::value::column::ColumnData;

/// A constant column: one stored row, logically repeated `len` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantContainer {
	data: Box<ColumnData>,
	len: usize,
}

impl ConstantContainer {
	pub fn new(data: ColumnData, len: usize) -> Self {
		debug_assert_eq!(data.len(), 1, "constant containers store exactly one row");
		Self {
			data: Box::new(data),
			len,
		}
	}

	pub fn data(&self) -> &ColumnData {
		&self.data
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn resized(&self, len: usize) -> Self {
		Self {
			data: self.data.clone(),
			len,
		}
	}

	/// Materializes the repeated row as a full column.
	pub fn unfold(&self) -> ColumnData {
		self.data.take_rows(&vec![0; self.len])
	}
}
