// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use serde::{Deserialize, Serialize};

/// Resource limits and compilation switches, consumed at graph-construction
/// time and re-checked after every executed instruction. A limit of zero
/// means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
	pub max_temporary_columns: u64,
	pub max_temporary_non_const_columns: u64,
	/// When hardware compilation of operator bodies is enabled, constant
	/// folding must skip non-deterministic functions so a cached compiled
	/// body never captures one evaluation's result.
	pub compile_expressions: bool,
}
