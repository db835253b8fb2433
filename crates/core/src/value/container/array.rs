// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use serde::{Deserialize, Serialize};
use stele_type::Type;

use crate::value::column::ColumnData;

/// An array-valued column: a flat element column plus one cumulative end
/// offset per row. Row `i` owns the elements in
/// `values[offsets[i - 1]..offsets[i]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayContainer {
	element_type: Type,
	offsets: Vec<u64>,
	values: Box<ColumnData>,
}

impl ArrayContainer {
	pub fn new(element_type: Type, offsets: Vec<u64>, values: ColumnData) -> Self {
		debug_assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
		debug_assert_eq!(offsets.last().copied().unwrap_or(0) as usize, values.len());
		Self {
			element_type,
			offsets,
			values: Box::new(values),
		}
	}

	pub fn element_type(&self) -> &Type {
		&self.element_type
	}

	pub fn offsets(&self) -> &[u64] {
		&self.offsets
	}

	pub fn values(&self) -> &ColumnData {
		&self.values
	}

	pub fn into_values(self) -> ColumnData {
		*self.values
	}

	pub fn len(&self) -> usize {
		self.offsets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.offsets.is_empty()
	}

	fn row_range(&self, index: usize) -> (usize, usize) {
		let start = if index == 0 {
			0
		} else {
			self.offsets[index - 1] as usize
		};
		(start, self.offsets[index] as usize)
	}

	pub fn resized(&self, len: usize) -> Self {
		if len <= self.offsets.len() {
			let offsets = self.offsets[..len].to_vec();
			let end = offsets.last().copied().unwrap_or(0) as usize;
			let indices: Vec<usize> = (0..end).collect();
			Self {
				element_type: self.element_type.clone(),
				offsets,
				values: Box::new(self.values.take_rows(&indices)),
			}
		} else {
			// Pad with empty arrays.
			let mut offsets = self.offsets.clone();
			let last = offsets.last().copied().unwrap_or(0);
			offsets.resize(len, last);
			Self {
				element_type: self.element_type.clone(),
				offsets,
				values: self.values.clone(),
			}
		}
	}

	pub fn take_rows(&self, indices: &[usize]) -> Self {
		let mut offsets = Vec::with_capacity(indices.len());
		let mut element_indices = Vec::new();
		let mut end = 0u64;
		for &index in indices {
			let (start, stop) = self.row_range(index);
			end += (stop - start) as u64;
			offsets.push(end);
			element_indices.extend(start..stop);
		}
		Self {
			element_type: self.element_type.clone(),
			offsets,
			values: Box::new(self.values.take_rows(&element_indices)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> ArrayContainer {
		// [[1, 2], [3], []]
		ArrayContainer::new(Type::Int8, vec![2, 3, 3], ColumnData::int8([1, 2, 3]))
	}

	#[test]
	fn test_take_rows_repeats_whole_arrays() {
		let container = sample();
		let taken = container.take_rows(&[1, 1, 0]);
		assert_eq!(taken.offsets(), &[1, 2, 4]);
		assert_eq!(taken.values(), &ColumnData::int8([3, 3, 1, 2]));
	}

	#[test]
	fn test_resized_truncates_elements() {
		let container = sample();
		let resized = container.resized(1);
		assert_eq!(resized.offsets(), &[2]);
		assert_eq!(resized.values(), &ColumnData::int8([1, 2]));
	}

	#[test]
	fn test_resized_pads_with_empty_arrays() {
		let container = sample();
		let resized = container.resized(5);
		assert_eq!(resized.offsets(), &[2, 3, 3, 3, 3]);
		assert_eq!(resized.values(), &ColumnData::int8([1, 2, 3]));
	}
}
