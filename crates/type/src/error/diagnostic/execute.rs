// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

pub fn not_found_column_in_block(name: &str) -> Diagnostic {
	Diagnostic {
		code: "EXEC_001".to_string(),
		statement: None,
		message: format!("Not found column in block: {}", name),
		column: None,
		fragment: Fragment::owned_internal(name),
		label: Some("the program requires this column as input".to_string()),
		help: Some("ensure the input block carries every required column".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn too_many_temporary_columns(names: &str, maximum: u64) -> Diagnostic {
	Diagnostic {
		code: "EXEC_002".to_string(),
		statement: None,
		message: format!("Too many temporary columns: {}. Maximum: {}", names, maximum),
		column: None,
		fragment: Fragment::None,
		label: None,
		help: Some("raise max_temporary_columns or simplify the expression".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn too_many_temporary_non_const_columns(names: &[String], maximum: u64) -> Diagnostic {
	Diagnostic {
		code: "EXEC_003".to_string(),
		statement: None,
		message: format!(
			"Too many temporary non-const columns:\n{}. Maximum: {}",
			names.join("\n"),
			maximum
		),
		column: None,
		fragment: Fragment::None,
		label: None,
		help: Some("raise max_temporary_non_const_columns or simplify the expression".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn logical_error(message: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "EXEC_004".to_string(),
		statement: None,
		message: message.into(),
		column: None,
		fragment: Fragment::None,
		label: Some("internal invariant violated".to_string()),
		help: Some("this is a defect in the engine, not in the query".to_string()),
		notes: vec![],
		cause: None,
	}
}
