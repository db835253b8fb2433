// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

use crate::{error::diagnostic::Diagnostic, fragment::Fragment, value::r#type::Type};

pub fn duplicate_column(name: &str) -> Diagnostic {
	Diagnostic {
		code: "EXPR_001".to_string(),
		statement: None,
		message: format!("Column '{}' already exists", name),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: Some("a node already produces this name".to_string()),
		help: Some("use a different result name, or request replacement explicitly".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn unknown_identifier(name: &str) -> Diagnostic {
	Diagnostic {
		code: "EXPR_002".to_string(),
		statement: None,
		message: format!("Unknown identifier: '{}'", name),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: Some("no node produces this name".to_string()),
		help: Some("check for typos or add the column as an input first".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn unknown_column(name: &str, available: &str) -> Diagnostic {
	Diagnostic {
		code: "EXPR_002".to_string(),
		statement: None,
		message: format!("Unknown column: {}, there are only columns {}", name, available),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: Some("requested output is not produced by this graph".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn array_join_requires_array(name: &str, ty: &Type) -> Diagnostic {
	Diagnostic {
		code: "EXPR_003".to_string(),
		statement: None,
		message: "ARRAY JOIN requires array argument".to_string(),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: Some(format!("'{}' has type {}", name, ty.name())),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn array_join_of_not_array(name: &str) -> Diagnostic {
	Diagnostic {
		code: "EXPR_003".to_string(),
		statement: None,
		message: format!("ARRAY JOIN of not array: {}", name),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: Some("the joined column is not array-valued at execution time".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}
