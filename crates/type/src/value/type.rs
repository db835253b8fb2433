// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Scalar column types. Width suffixes are in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
	Undefined,
	Boolean,
	Int8,
	Float8,
	Utf8,
	Array(Box<Type>),
	Set,
}

impl Type {
	pub fn array(element: Type) -> Self {
		Type::Array(Box::new(element))
	}

	pub fn name(&self) -> String {
		match self {
			Type::Undefined => "Undefined".to_string(),
			Type::Boolean => "Boolean".to_string(),
			Type::Int8 => "Int8".to_string(),
			Type::Float8 => "Float8".to_string(),
			Type::Utf8 => "Utf8".to_string(),
			Type::Array(element) => format!("Array({})", element.name()),
			Type::Set => "Set".to_string(),
		}
	}

	pub fn is_array(&self) -> bool {
		matches!(self, Type::Array(_))
	}

	pub fn element_type(&self) -> Option<&Type> {
		match self {
			Type::Array(element) => Some(element),
			_ => None,
		}
	}

	/// Upper bound on the in-memory size of one value, when one exists.
	/// Variable-width types have no bound.
	pub fn maximum_value_size(&self) -> Option<usize> {
		match self {
			Type::Undefined => Some(0),
			Type::Boolean => Some(1),
			Type::Int8 => Some(8),
			Type::Float8 => Some(8),
			Type::Utf8 => None,
			Type::Array(_) => None,
			Type::Set => None,
		}
	}
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name())
	}
}
