// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

pub mod value;

pub use stele_type::{Error, Result};
pub use value::{
	column::{Column, ColumnData, Columns},
	set::MembershipSet,
};
