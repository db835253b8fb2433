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

#[derive(Debug)]
pub struct ConcatFunction;

impl ScalarFunction for ConcatFunction {
	fn name(&self) -> &str {
		"concat"
	}

	fn bind(&self, arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
		if arguments.len() < 2 {
			return_error!(arity_mismatch("concat", 2, arguments.len()));
		}
		for argument in arguments {
			if argument.ty != Type::Utf8 {
				return_error!(unsupported_argument_type("concat", &argument.ty));
			}
		}
		Ok(Arc::new(BoundConcat {
			result_type: Type::Utf8,
		}))
	}
}

#[derive(Debug)]
struct BoundConcat {
	result_type: Type,
}

impl BoundFunction for BoundConcat {
	fn name(&self) -> &str {
		"concat"
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
			return Ok(ColumnData::constant(Value::Utf8(concat_row(arguments, 0)), row_count));
		}
		if dry_run {
			return Ok(ColumnData::with_capacity(result_type, 0));
		}
		let mut data = ColumnData::with_capacity(result_type, row_count);
		for row in 0..row_count {
			data.push_value(Value::Utf8(concat_row(arguments, row)));
		}
		Ok(data)
	}
}

fn concat_row(arguments: &[Column], row: usize) -> String {
	let mut out = String::new();
	for argument in arguments {
		if let Value::Utf8(text) = argument.data().get_value(row) {
			out.push_str(&text);
		}
	}
	out
}
