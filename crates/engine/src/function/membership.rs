// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::sync::Arc;

use stele_core::{Column, ColumnData};
use stele_type::{
	Type, Value,
	diagnostic::function::{arity_mismatch, set_not_created, unsupported_argument_type},
	return_error,
};

use crate::function::{BoundFunction, ColumnDescriptor, ScalarFunction};

/// Membership test of the left argument against a set column built by the
/// join-matching subsystem.
#[derive(Debug)]
pub struct InFunction;

impl ScalarFunction for InFunction {
	fn name(&self) -> &str {
		"in"
	}

	fn bind(&self, arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
		if arguments.len() != 2 {
			return_error!(arity_mismatch("in", 2, arguments.len()));
		}
		if arguments[1].ty != Type::Set {
			return_error!(unsupported_argument_type("in", &arguments[1].ty));
		}
		Ok(Arc::new(BoundIn {
			result_type: Type::Boolean,
		}))
	}
}

#[derive(Debug)]
struct BoundIn {
	result_type: Type,
}

impl BoundFunction for BoundIn {
	fn name(&self) -> &str {
		"in"
	}

	fn result_type(&self) -> &Type {
		&self.result_type
	}

	fn execute(
		&self,
		arguments: &[Column],
		result_type: &Type,
		row_count: usize,
		dry_run: bool,
	) -> crate::Result<ColumnData> {
		let set_data = arguments[1].data().clone().convert_to_full();
		let ColumnData::Set(container) = set_data else {
			return_error!(unsupported_argument_type("in", &arguments[1].data().get_type()));
		};
		let set = container.set();
		if !set.is_created() {
			return_error!(set_not_created("in"));
		}
		if arguments[0].data().is_constant() {
			let contained = set.contains(&arguments[0].data().get_value(0));
			return Ok(ColumnData::constant(Value::Boolean(contained), row_count));
		}
		if dry_run {
			return Ok(ColumnData::with_capacity(result_type, 0));
		}
		let mut data = ColumnData::with_capacity(result_type, row_count);
		for row in 0..row_count {
			data.push_value(Value::Boolean(set.contains(&arguments[0].data().get_value(row))));
		}
		Ok(data)
	}
}

#[cfg(test)]
mod tests {
	use stele_core::MembershipSet;

	use super::*;

	fn bound() -> Arc<dyn BoundFunction> {
		InFunction.bind(&[
			ColumnDescriptor {
				column: None,
				ty: Type::Int8,
			},
			ColumnDescriptor {
				column: None,
				ty: Type::Set,
			},
		])
		.unwrap()
	}

	#[test]
	fn test_in_marks_contained_rows() {
		let set = Arc::new(MembershipSet::created(vec![Value::Int8(2), Value::Int8(3)]));
		let arguments =
			vec![Column::new("a", ColumnData::int8([1, 2, 3])), Column::new("s", ColumnData::set(set, 3))];
		let result = bound().execute(&arguments, &Type::Boolean, 3, false).unwrap();
		assert_eq!(result, ColumnData::bool([false, true, true]));
	}

	#[test]
	fn test_in_rejects_pending_set() {
		let set = Arc::new(MembershipSet::pending());
		let arguments =
			vec![Column::new("a", ColumnData::int8([1])), Column::new("s", ColumnData::set(set, 1))];
		let error = bound().execute(&arguments, &Type::Boolean, 1, false).unwrap_err();
		assert_eq!(error.code(), "FN_004");
	}

	#[test]
	fn test_in_rejects_non_set_argument() {
		let error = InFunction
			.bind(&[
				ColumnDescriptor {
					column: None,
					ty: Type::Int8,
				},
				ColumnDescriptor {
					column: None,
					ty: Type::Int8,
				},
			])
			.unwrap_err();
		assert_eq!(error.code(), "FN_003");
	}
}
