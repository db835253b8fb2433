// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

mod columns;
mod data;

pub use columns::Columns;
pub use data::ColumnData;

use serde::{Deserialize, Serialize};
use stele_type::Fragment;

/// One named column of a block or of an execution buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
	pub name: Fragment,
	pub data: ColumnData,
}

impl Column {
	pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
		Self {
			name: Fragment::owned_internal(name),
			data,
		}
	}

	pub fn name(&self) -> &str {
		self.name.text()
	}

	pub fn data(&self) -> &ColumnData {
		&self.data
	}

	pub fn data_mut(&mut self) -> &mut ColumnData {
		&mut self.data
	}

	pub fn with_new_data(&self, data: ColumnData) -> Self {
		Self {
			name: self.name.clone(),
			data,
		}
	}
}
