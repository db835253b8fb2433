// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::ops::Deref;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utf8Container {
	data: Vec<String>,
}

impl Utf8Container {
	pub fn new(data: Vec<String>) -> Self {
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

	pub fn get(&self, index: usize) -> &str {
		self.data[index].as_str()
	}

	pub fn push(&mut self, value: String) {
		self.data.push(value);
	}

	pub fn resized(&self, len: usize) -> Self {
		let mut data = self.data.clone();
		data.resize(len, String::new());
		Self {
			data,
		}
	}

	pub fn take_rows(&self, indices: &[usize]) -> Self {
		Self {
			data: indices.iter().map(|&i| self.data[i].clone()).collect(),
		}
	}
}

impl Deref for Utf8Container {
	type Target = [String];

	fn deref(&self) -> &Self::Target {
		self.data.as_slice()
	}
}
