// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use stele_core::{Column, ColumnData};
use stele_type::{Type, diagnostic::function::unknown_function, return_error};

pub mod math;
pub mod membership;
pub mod text;

/// A prospective argument at bind time: its type, plus its value when the
/// producing node is constant.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
	pub column: Option<ColumnData>,
	pub ty: Type,
}

/// An operator as looked up by name. Binding against concrete argument
/// types yields the callable that runs on column batches.
pub trait ScalarFunction: Send + Sync + std::fmt::Debug {
	fn name(&self) -> &str;

	fn bind(&self, arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>>;
}

pub trait BoundFunction: Send + Sync + std::fmt::Debug {
	fn name(&self) -> &str;

	fn result_type(&self) -> &Type;

	fn is_deterministic(&self) -> bool {
		true
	}

	fn is_suitable_for_constant_folding(&self) -> bool {
		true
	}

	/// Some functions return a constant no matter whether their arguments
	/// are constant. Such a declared constant is stored on the node but is
	/// not folded any further.
	fn result_if_always_constant(&self, _arguments: &[ColumnDescriptor]) -> Option<ColumnData> {
		None
	}

	fn execute(
		&self,
		arguments: &[Column],
		result_type: &Type,
		row_count: usize,
		dry_run: bool,
	) -> crate::Result<ColumnData>;
}

pub struct FunctionRegistry {
	functions: HashMap<String, Arc<dyn ScalarFunction>>,
}

impl FunctionRegistry {
	pub fn new() -> Self {
		Self {
			functions: HashMap::new(),
		}
	}

	pub fn register<F>(&mut self, function: F)
	where
		F: ScalarFunction + 'static,
	{
		self.functions.insert(function.name().to_string(), Arc::new(function));
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn ScalarFunction>> {
		self.functions.get(name).cloned()
	}

	pub fn resolve(&self, name: &str) -> crate::Result<Arc<dyn ScalarFunction>> {
		match self.get(name) {
			Some(function) => Ok(function),
			None => return_error!(unknown_function(name)),
		}
	}
}

impl Default for FunctionRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// The registry of shipped scalar functions.
pub fn registry() -> &'static FunctionRegistry {
	static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(|| {
		let mut registry = FunctionRegistry::new();
		registry.register(math::AddFunction);
		registry.register(math::MultiplyFunction);
		registry.register(math::NegateFunction);
		registry.register(text::ConcatFunction);
		registry.register(membership::InFunction);
		registry
	});
	&REGISTRY
}

pub(crate) fn all_constant(arguments: &[Column]) -> bool {
	arguments.iter().all(|argument| argument.data().is_constant())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_resolves_shipped_functions() {
		for name in ["add", "multiply", "negate", "concat", "in"] {
			assert!(registry().get(name).is_some(), "{} should be registered", name);
		}
	}

	#[test]
	fn test_resolve_unknown_function_fails() {
		let error = registry().resolve("no_such_function").unwrap_err();
		assert_eq!(error.code(), "FN_001");
	}
}
