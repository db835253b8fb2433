// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::set::MembershipSet;

/// A column standing in for a membership set. The set itself is shared and
/// row-independent; the container only tracks a nominal row count so the
/// column stays shape-compatible with its block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetContainer {
	set: Arc<MembershipSet>,
	len: usize,
}

impl SetContainer {
	pub fn new(set: Arc<MembershipSet>, len: usize) -> Self {
		Self {
			set,
			len,
		}
	}

	pub fn set(&self) -> &Arc<MembershipSet> {
		&self.set
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn resized(&self, len: usize) -> Self {
		Self {
			set: self.set.clone(),
			len,
		}
	}
}
