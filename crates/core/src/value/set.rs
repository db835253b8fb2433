// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use serde::{Deserialize, Serialize};
use stele_type::Value;

/// The build side of a membership test. Constructed by the join-matching
/// subsystem; from the engine's point of view it is an opaque lookup table
/// that may still be under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipSet {
	created: bool,
	values: Vec<Value>,
}

impl MembershipSet {
	pub fn created(values: Vec<Value>) -> Self {
		Self {
			created: true,
			values,
		}
	}

	/// A set whose build side has not finished yet.
	pub fn pending() -> Self {
		Self {
			created: false,
			values: Vec::new(),
		}
	}

	pub fn is_created(&self) -> bool {
		self.created
	}

	pub fn total_row_count(&self) -> usize {
		self.values.len()
	}

	pub fn contains(&self, value: &Value) -> bool {
		self.values.iter().any(|v| v == value)
	}
}
