// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::ops::Deref;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberContainer<T> {
	data: Vec<T>,
}

impl<T> NumberContainer<T>
where
	T: Copy + Default,
{
	pub fn new(data: Vec<T>) -> Self {
		Self {
			data,
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			data: Vec::with_capacity(capacity),
		}
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn get(&self, index: usize) -> T {
		self.data[index]
	}

	pub fn push(&mut self, value: T) {
		self.data.push(value);
	}

	pub fn resized(&self, len: usize) -> Self {
		let mut data = self.data.clone();
		data.resize(len, T::default());
		Self {
			data,
		}
	}

	pub fn take_rows(&self, indices: &[usize]) -> Self {
		Self {
			data: indices.iter().map(|&i| self.data[i]).collect(),
		}
	}
}

impl<T> Deref for NumberContainer<T> {
	type Target = [T];

	fn deref(&self) -> &Self::Target {
		self.data.as_slice()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_resized_pads_with_default() {
		let container = NumberContainer::new(vec![1i64, 2]);
		assert_eq!(&*container.resized(4), &[1, 2, 0, 0]);
		assert_eq!(&*container.resized(1), &[1]);
	}

	#[test]
	fn test_take_rows() {
		let container = NumberContainer::new(vec![10i64, 20, 30]);
		assert_eq!(&*container.take_rows(&[0, 0, 2]), &[10, 10, 30]);
	}
}
