// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A piece of source text a diagnostic or a column name points at. Columns
/// produced internally (not written by a user) carry an owned fragment
/// without a statement position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fragment {
	None,
	Owned {
		text: String,
	},
}

impl Fragment {
	pub fn none() -> Self {
		Fragment::None
	}

	pub fn owned_internal(text: impl Into<String>) -> Self {
		Fragment::Owned {
			text: text.into(),
		}
	}

	pub fn text(&self) -> &str {
		match self {
			Fragment::None => "",
			Fragment::Owned {
				text,
			} => text.as_str(),
		}
	}

	pub fn is_none(&self) -> bool {
		matches!(self, Fragment::None)
	}
}

impl Display for Fragment {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.text())
	}
}

impl Default for Fragment {
	fn default() -> Self {
		Fragment::None
	}
}
