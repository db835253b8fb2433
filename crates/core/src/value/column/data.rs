// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stele_type::{Type, Value};

use crate::value::{
	container::{
		ArrayContainer, BoolContainer, ConstantContainer, NumberContainer, SetContainer, UndefinedContainer,
		Utf8Container,
	},
	set::MembershipSet,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
	Undefined(UndefinedContainer),
	Bool(BoolContainer),
	Int8(NumberContainer<i64>),
	Float8(NumberContainer<f64>),
	Utf8(Utf8Container),
	Array(ArrayContainer),
	Set(SetContainer),
	Constant(ConstantContainer),
}

impl ColumnData {
	pub fn undefined(len: usize) -> Self {
		ColumnData::Undefined(UndefinedContainer::new(len))
	}

	pub fn bool(values: impl IntoIterator<Item = bool>) -> Self {
		ColumnData::Bool(BoolContainer::new(values.into_iter().collect()))
	}

	pub fn int8(values: impl IntoIterator<Item = i64>) -> Self {
		ColumnData::Int8(NumberContainer::new(values.into_iter().collect()))
	}

	pub fn float8(values: impl IntoIterator<Item = f64>) -> Self {
		ColumnData::Float8(NumberContainer::new(values.into_iter().collect()))
	}

	pub fn utf8(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
		ColumnData::Utf8(Utf8Container::new(values.into_iter().map(Into::into).collect()))
	}

	pub fn array(element_type: Type, offsets: Vec<u64>, values: ColumnData) -> Self {
		ColumnData::Array(ArrayContainer::new(element_type, offsets, values))
	}

	/// Builds an array column row by row; every row is one element list.
	pub fn array_from_values(element_type: Type, rows: Vec<Vec<Value>>) -> Self {
		let mut offsets = Vec::with_capacity(rows.len());
		let mut values = ColumnData::with_capacity(&element_type, 0);
		let mut end = 0u64;
		for row in rows {
			end += row.len() as u64;
			offsets.push(end);
			for value in row {
				values.push_value(value);
			}
		}
		ColumnData::Array(ArrayContainer::new(element_type, offsets, values))
	}

	pub fn set(set: Arc<MembershipSet>, len: usize) -> Self {
		ColumnData::Set(SetContainer::new(set, len))
	}

	pub fn constant(value: Value, len: usize) -> Self {
		let mut data = ColumnData::with_capacity(&value.get_type(), 1);
		data.push_value(value);
		ColumnData::Constant(ConstantContainer::new(data, len))
	}

	/// Wraps a one-row column as a constant repeated `len` times.
	pub fn constant_of(data: ColumnData, len: usize) -> Self {
		ColumnData::Constant(ConstantContainer::new(data, len))
	}

	pub fn with_capacity(ty: &Type, capacity: usize) -> Self {
		match ty {
			Type::Undefined => ColumnData::Undefined(UndefinedContainer::new(0)),
			Type::Boolean => ColumnData::Bool(BoolContainer::with_capacity(capacity)),
			Type::Int8 => ColumnData::Int8(NumberContainer::with_capacity(capacity)),
			Type::Float8 => ColumnData::Float8(NumberContainer::with_capacity(capacity)),
			Type::Utf8 => ColumnData::Utf8(Utf8Container::with_capacity(capacity)),
			Type::Array(element) => ColumnData::Array(ArrayContainer::new(
				(**element).clone(),
				Vec::new(),
				ColumnData::with_capacity(element, 0),
			)),
			Type::Set => ColumnData::Set(SetContainer::new(Arc::new(MembershipSet::pending()), 0)),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			ColumnData::Undefined(container) => container.len(),
			ColumnData::Bool(container) => container.len(),
			ColumnData::Int8(container) => container.len(),
			ColumnData::Float8(container) => container.len(),
			ColumnData::Utf8(container) => container.len(),
			ColumnData::Array(container) => container.len(),
			ColumnData::Set(container) => container.len(),
			ColumnData::Constant(container) => container.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn get_type(&self) -> Type {
		match self {
			ColumnData::Undefined(_) => Type::Undefined,
			ColumnData::Bool(_) => Type::Boolean,
			ColumnData::Int8(_) => Type::Int8,
			ColumnData::Float8(_) => Type::Float8,
			ColumnData::Utf8(_) => Type::Utf8,
			ColumnData::Array(container) => Type::array(container.element_type().clone()),
			ColumnData::Set(_) => Type::Set,
			ColumnData::Constant(container) => container.data().get_type(),
		}
	}

	pub fn get_value(&self, index: usize) -> Value {
		match self {
			ColumnData::Undefined(_) => Value::Undefined,
			ColumnData::Bool(container) => Value::Boolean(container.get(index)),
			ColumnData::Int8(container) => Value::Int8(container.get(index)),
			ColumnData::Float8(container) => Value::Float8(container.get(index)),
			ColumnData::Utf8(container) => Value::Utf8(container.get(index).to_string()),
			ColumnData::Array(_) => Value::Undefined,
			ColumnData::Set(_) => Value::Undefined,
			ColumnData::Constant(container) => {
				debug_assert!(index < container.len());
				container.data().get_value(0)
			}
		}
	}

	pub fn push_value(&mut self, value: Value) {
		match (self, value) {
			(ColumnData::Undefined(container), Value::Undefined) => container.push(),
			(ColumnData::Bool(container), Value::Boolean(v)) => container.push(v),
			(ColumnData::Int8(container), Value::Int8(v)) => container.push(v),
			(ColumnData::Float8(container), Value::Float8(v)) => container.push(v),
			(ColumnData::Utf8(container), Value::Utf8(v)) => container.push(v),
			_ => debug_assert!(false, "pushed value does not match the container type"),
		}
	}

	pub fn is_constant(&self) -> bool {
		matches!(self, ColumnData::Constant(_))
	}

	/// Materializes a constant column; full columns pass through.
	pub fn convert_to_full(self) -> ColumnData {
		match self {
			ColumnData::Constant(container) => container.unfold(),
			data => data,
		}
	}

	pub fn clone_resized(&self, len: usize) -> ColumnData {
		match self {
			ColumnData::Undefined(container) => ColumnData::Undefined(container.resized(len)),
			ColumnData::Bool(container) => ColumnData::Bool(container.resized(len)),
			ColumnData::Int8(container) => ColumnData::Int8(container.resized(len)),
			ColumnData::Float8(container) => ColumnData::Float8(container.resized(len)),
			ColumnData::Utf8(container) => ColumnData::Utf8(container.resized(len)),
			ColumnData::Array(container) => ColumnData::Array(container.resized(len)),
			ColumnData::Set(container) => ColumnData::Set(container.resized(len)),
			ColumnData::Constant(container) => ColumnData::Constant(container.resized(len)),
		}
	}

	/// Builds a new column whose rows are `self`'s rows at `indices`,
	/// in order, with repetition allowed.
	pub fn take_rows(&self, indices: &[usize]) -> ColumnData {
		match self {
			ColumnData::Undefined(container) => ColumnData::Undefined(container.take_rows(indices)),
			ColumnData::Bool(container) => ColumnData::Bool(container.take_rows(indices)),
			ColumnData::Int8(container) => ColumnData::Int8(container.take_rows(indices)),
			ColumnData::Float8(container) => ColumnData::Float8(container.take_rows(indices)),
			ColumnData::Utf8(container) => ColumnData::Utf8(container.take_rows(indices)),
			ColumnData::Array(container) => ColumnData::Array(container.take_rows(indices)),
			ColumnData::Set(container) => ColumnData::Set(container.resized(indices.len())),
			ColumnData::Constant(container) => ColumnData::Constant(container.resized(indices.len())),
		}
	}

	/// Repeats row `i` as many times as the `i`-th array row has elements,
	/// per the cumulative `offsets`. The result length is the final offset.
	pub fn replicate(&self, offsets: &[u64]) -> ColumnData {
		assert_eq!(offsets.len(), self.len(), "replicate offsets must cover every row");
		match self {
			ColumnData::Set(container) => {
				ColumnData::Set(container.resized(offsets.last().copied().unwrap_or(0) as usize))
			}
			ColumnData::Constant(container) => {
				ColumnData::Constant(container.resized(offsets.last().copied().unwrap_or(0) as usize))
			}
			data => {
				let mut indices = Vec::with_capacity(offsets.last().copied().unwrap_or(0) as usize);
				let mut start = 0u64;
				for (row, &end) in offsets.iter().enumerate() {
					for _ in start..end {
						indices.push(row);
					}
					start = end;
				}
				data.take_rows(&indices)
			}
		}
	}
}
