// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::sync::Arc;

use stele_core::{Column, ColumnData};
use stele_type::{
	Type, Value,
	diagnostic::function::{arity_mismatch, unsupported_argument_type},
	return_error,
};

use crate::function::{BoundFunction, ColumnDescriptor, ScalarFunction, all_constant};

#[derive(Debug, Clone, Copy)]
enum ArithmeticOp {
	Add,
	Multiply,
	Negate,
}

impl ArithmeticOp {
	fn apply_int8(&self, values: &[i64]) -> i64 {
		match self {
			ArithmeticOp::Add => values[0] + values[1],
			ArithmeticOp::Multiply => values[0] * values[1],
			ArithmeticOp::Negate => -values[0],
		}
	}

	fn apply_float8(&self, values: &[f64]) -> f64 {
		match self {
			ArithmeticOp::Add => values[0] + values[1],
			ArithmeticOp::Multiply => values[0] * values[1],
			ArithmeticOp::Negate => -values[0],
		}
	}
}

#[derive(Debug)]
struct BoundArithmetic {
	name: &'static str,
	op: ArithmeticOp,
	result_type: Type,
}

fn bind_numeric(
	name: &'static str,
	op: ArithmeticOp,
	arity: usize,
	arguments: &[ColumnDescriptor],
) -> crate::Result<Arc<dyn BoundFunction>> {
	if arguments.len() != arity {
		return_error!(arity_mismatch(name, arity, arguments.len()));
	}
	let result_type = arguments[0].ty.clone();
	if !matches!(result_type, Type::Int8 | Type::Float8) {
		return_error!(unsupported_argument_type(name, &result_type));
	}
	for argument in &arguments[1..] {
		if argument.ty != result_type {
			return_error!(unsupported_argument_type(name, &argument.ty));
		}
	}
	Ok(Arc::new(BoundArithmetic {
		name,
		op,
		result_type,
	}))
}

impl BoundFunction for BoundArithmetic {
	fn name(&self) -> &str {
		self.name
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
		if all_constant(arguments) {
			let value = self.compute_row(arguments, result_type, 0);
			return Ok(ColumnData::constant(value, row_count));
		}
		if dry_run {
			return Ok(ColumnData::with_capacity(result_type, 0));
		}
		let mut data = ColumnData::with_capacity(result_type, row_count);
		for row in 0..row_count {
			data.push_value(self.compute_row(arguments, result_type, row));
		}
		Ok(data)
	}
}

impl BoundArithmetic {
	fn compute_row(&self, arguments: &[Column], result_type: &Type, row: usize) -> Value {
		match result_type {
			Type::Float8 => {
				let values: Vec<f64> = arguments
					.iter()
					.map(|argument| match argument.data().get_value(row) {
						Value::Float8(v) => v,
						_ => 0.0,
					})
					.collect();
				Value::Float8(self.op.apply_float8(&values))
			}
			_ => {
				let values: Vec<i64> = arguments
					.iter()
					.map(|argument| match argument.data().get_value(row) {
						Value::Int8(v) => v,
						_ => 0,
					})
					.collect();
				Value::Int8(self.op.apply_int8(&values))
			}
		}
	}
}

#[derive(Debug)]
pub struct AddFunction;

impl ScalarFunction for AddFunction {
	fn name(&self) -> &str {
		"add"
	}

	fn bind(&self, arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
		bind_numeric("add", ArithmeticOp::Add, 2, arguments)
	}
}

#[derive(Debug)]
pub struct MultiplyFunction;

impl ScalarFunction for MultiplyFunction {
	fn name(&self) -> &str {
		"multiply"
	}

	fn bind(&self, arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
		bind_numeric("multiply", ArithmeticOp::Multiply, 2, arguments)
	}
}

#[derive(Debug)]
pub struct NegateFunction;

impl ScalarFunction for NegateFunction {
	fn name(&self) -> &str {
		"negate"
	}

	fn bind(&self, arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
		bind_numeric("negate", ArithmeticOp::Negate, 1, arguments)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn descriptor(ty: Type) -> ColumnDescriptor {
		ColumnDescriptor {
			column: None,
			ty,
		}
	}

	#[test]
	fn test_add_full_columns() {
		let bound = AddFunction.bind(&[descriptor(Type::Int8), descriptor(Type::Int8)]).unwrap();
		let arguments =
			vec![Column::new("a", ColumnData::int8([1, 2, 3])), Column::new("b", ColumnData::int8([10, 20, 30]))];
		let result = bound.execute(&arguments, &Type::Int8, 3, false).unwrap();
		assert_eq!(result, ColumnData::int8([11, 22, 33]));
	}

	#[test]
	fn test_add_constants_produces_constant() {
		let bound = AddFunction.bind(&[descriptor(Type::Int8), descriptor(Type::Int8)]).unwrap();
		let arguments = vec![
			Column::new("a", ColumnData::constant(Value::Int8(2), 1)),
			Column::new("b", ColumnData::constant(Value::Int8(3), 1)),
		];
		let result = bound.execute(&arguments, &Type::Int8, 1, true).unwrap();
		assert!(result.is_constant());
		assert_eq!(result.get_value(0), Value::Int8(5));
	}

	#[test]
	fn test_bind_rejects_wrong_arity() {
		let error = NegateFunction.bind(&[descriptor(Type::Int8), descriptor(Type::Int8)]).unwrap_err();
		assert_eq!(error.code(), "FN_002");
	}

	#[test]
	fn test_bind_rejects_text_argument() {
		let error = AddFunction.bind(&[descriptor(Type::Utf8), descriptor(Type::Utf8)]).unwrap_err();
		assert_eq!(error.code(), "FN_003");
	}

	#[test]
	fn test_bind_rejects_mixed_numeric_types() {
		let error = AddFunction.bind(&[descriptor(Type::Int8), descriptor(Type::Float8)]).unwrap_err();
		assert_eq!(error.code(), "FN_003");
	}
}
