// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use serde::{Deserialize, Serialize};

/// A column of untyped, valueless rows; only the row count is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndefinedContainer {
	len: usize,
}

impl UndefinedContainer {
	pub fn new(len: usize) -> Self {
		Self {
			len,
		}
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn push(&mut self) {
		self.len += 1;
	}

	pub fn resized(&self, len: usize) -> Self {
		Self {
			len,
		}
	}

	pub fn take_rows(&self, indices: &[usize]) -> Self {
		debug_assert!(indices.iter().all(|&i| i < self.len));
		Self {
			len: indices.len(),
		}
	}
}
