// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

use crate::{error::diagnostic::Diagnostic, fragment::Fragment, value::r#type::Type};

pub fn unknown_function(name: &str) -> Diagnostic {
	Diagnostic {
		code: "FN_001".to_string(),
		statement: None,
		message: format!("Unknown function: {}", name),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: None,
		help: Some("check function name spelling or available functions".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn arity_mismatch(function: &str, expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "FN_002".to_string(),
		statement: None,
		message: format!("Function '{}' expects {} arguments, got {}", function, expected, actual),
		column: None,
		fragment: Fragment::owned_internal(function),
		label: None,
		help: Some(format!("provide exactly {} arguments", expected)),
		notes: vec![],
		cause: None,
	}
}

pub fn unsupported_argument_type(function: &str, ty: &Type) -> Diagnostic {
	Diagnostic {
		code: "FN_003".to_string(),
		statement: None,
		message: format!("Function '{}' cannot be applied to {}", function, ty.name()),
		column: None,
		fragment: Fragment::owned_internal(function),
		label: None,
		help: Some("cast the argument to a supported type first".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn set_not_created(function: &str) -> Diagnostic {
	Diagnostic {
		code: "FN_004".to_string(),
		statement: None,
		message: format!("Function '{}' was given a membership set that is still being built", function),
		column: None,
		fragment: Fragment::owned_internal(function),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
