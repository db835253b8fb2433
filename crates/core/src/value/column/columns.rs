// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use stele_type::Value;

use crate::value::column::{Column, ColumnData};

/// A block: an ordered, name-keyed batch of columns sharing one row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Columns {
	columns: Vec<Column>,
}

impl Deref for Columns {
	type Target = [Column];

	fn deref(&self) -> &Self::Target {
		self.columns.as_slice()
	}
}

impl Columns {
	pub fn new(columns: Vec<Column>) -> Self {
		let n = columns.first().map_or(0, |c| c.data().len());
		assert!(columns.iter().all(|c| c.data().len() == n), "columns of one block must share a row count");
		Self {
			columns,
		}
	}

	pub fn empty() -> Self {
		Self {
			columns: Vec::new(),
		}
	}

	pub fn single_row<'a>(rows: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
		let columns = rows
			.into_iter()
			.map(|(name, value)| {
				let mut data = ColumnData::with_capacity(&value.get_type(), 1);
				data.push_value(value);
				Column::new(name, data)
			})
			.collect();
		Self {
			columns,
		}
	}

	pub fn row_count(&self) -> usize {
		self.columns.first().map_or(0, |c| c.data().len())
	}

	pub fn shape(&self) -> (usize, usize) {
		(self.row_count(), self.columns.len())
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Column> {
		self.columns.iter_mut()
	}

	pub fn has(&self, name: &str) -> bool {
		self.position_by_name(name).is_some()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|c| c.name() == name)
	}

	pub fn position_by_name(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|c| c.name() == name)
	}

	pub fn insert(&mut self, column: Column) {
		self.columns.push(column);
	}

	pub fn replace(&mut self, position: usize, column: Column) {
		self.columns[position] = column;
	}

	pub fn erase(&mut self, position: usize) -> Column {
		self.columns.remove(position)
	}

	/// Removes the named column from the block and returns it.
	pub fn take_by_name(&mut self, name: &str) -> Option<Column> {
		let position = self.position_by_name(name)?;
		Some(self.columns.remove(position))
	}

	pub fn clear(&mut self) {
		self.columns.clear();
	}

	pub fn names(&self) -> Vec<String> {
		self.columns.iter().map(|c| c.name().to_string()).collect()
	}

	pub fn get_row(&self, index: usize) -> Vec<Value> {
		self.columns.iter().map(|c| c.data().get_value(index)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_single_row_mixed_types() {
		let columns = Columns::single_row([
			("bool_col", Value::Boolean(true)),
			("int_col", Value::Int8(42)),
			("str_col", Value::Utf8("hello".to_string())),
		]);

		assert_eq!(columns.shape(), (1, 3));
		assert_eq!(columns.column("bool_col").unwrap().data().get_value(0), Value::Boolean(true));
		assert_eq!(columns.column("int_col").unwrap().data().get_value(0), Value::Int8(42));
		assert_eq!(columns.column("str_col").unwrap().data().get_value(0), Value::Utf8("hello".to_string()));
	}

	#[test]
	fn test_take_by_name_removes_the_column() {
		let mut columns = Columns::new(vec![
			Column::new("a", ColumnData::int8([1, 2])),
			Column::new("b", ColumnData::int8([3, 4])),
		]);

		let taken = columns.take_by_name("a").unwrap();
		assert_eq!(taken.name(), "a");
		assert!(!columns.has("a"));
		assert_eq!(columns.names(), vec!["b".to_string()]);
		assert!(columns.take_by_name("a").is_none());
	}

	#[test]
	fn test_get_row() {
		let columns = Columns::new(vec![
			Column::new("a", ColumnData::int8([1, 2])),
			Column::new("b", ColumnData::utf8(["x", "y"])),
		]);
		assert_eq!(columns.get_row(1), vec![Value::Int8(2), Value::Utf8("y".to_string())]);
	}
}
