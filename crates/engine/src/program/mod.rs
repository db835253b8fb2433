// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use stele_core::ColumnData;
use stele_type::{Type, diagnostic::execute::logical_error, return_error};

use crate::{
	EngineSettings,
	expression::{Node, NodeId, NodeKind},
};

mod compile;
mod execute;

/// The compiled form of an expression graph: a flat, buffer-addressed
/// instruction list. Immutable once built; one program may be executed
/// concurrently against independent blocks.
#[derive(Debug)]
pub struct ExpressionProgram {
	pub(crate) nodes: Vec<Node>,
	pub(crate) instructions: Vec<Instruction>,
	pub(crate) inputs: Vec<ProgramColumn>,
	pub(crate) outputs: Vec<ProgramColumn>,
	pub(crate) slot_count: usize,
	pub(crate) project_input: bool,
	pub(crate) settings: EngineSettings,
}

/// A named, typed column bound to a buffer slot; the program's input and
/// output shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramColumn {
	pub name: String,
	pub ty: Type,
	pub slot: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Instruction {
	pub(crate) node: NodeId,
	pub(crate) slot: usize,
	pub(crate) arguments: Vec<Argument>,
	pub(crate) is_used_in_result: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argument {
	pub slot: usize,
	/// The slot may be cleared once this consumer ran; this is the
	/// argument's last use and it is not part of the final output.
	pub release_after_use: bool,
}

impl ExpressionProgram {
	pub fn inputs(&self) -> &[ProgramColumn] {
		&self.inputs
	}

	pub fn outputs(&self) -> &[ProgramColumn] {
		&self.outputs
	}

	pub fn required_column_names(&self) -> Vec<String> {
		self.inputs.iter().map(|input| input.name.clone()).collect()
	}

	pub fn slot_count(&self) -> usize {
		self.slot_count
	}

	pub fn instruction_count(&self) -> usize {
		self.instructions.len()
	}

	pub fn project_input(&self) -> bool {
		self.project_input
	}

	/// In project-input mode execution replaces the whole block instead of
	/// amending it.
	pub fn set_project_input(&mut self, project_input: bool) {
		self.project_input = project_input;
	}

	pub fn has_array_join(&self) -> bool {
		self.instructions
			.iter()
			.any(|instruction| matches!(self.nodes[instruction.node.0].kind, NodeKind::ArrayJoin))
	}

	/// Detects `name in (empty set)`: scans backward for a membership test
	/// producing `name`, then checks whether the set it probes is a
	/// completed, zero-row membership table. A pure optimization hint.
	pub fn is_always_false_column(&self, column_name: &str) -> bool {
		let mut set_to_check: Option<&str> = None;
		for instruction in self.instructions.iter().rev() {
			let node = &self.nodes[instruction.node.0];
			if let NodeKind::Function(function) = &node.kind {
				if node.result_name == column_name && node.children.len() > 1 && function.name() == "in" {
					set_to_check = Some(self.nodes[node.children[1].0].result_name.as_str());
					break;
				}
			}
		}

		let Some(set_name) = set_to_check else {
			return false;
		};

		for instruction in &self.instructions {
			let node = &self.nodes[instruction.node.0];
			if matches!(node.kind, NodeKind::Constant) && node.result_name == set_name {
				// A set wrapped in a constant always carries rows; only
				// plain set columns can be empty.
				if let Some(ColumnData::Set(container)) = &node.column {
					if container.set().is_created() && container.set().total_row_count() == 0 {
						return true;
					}
				}
			}
		}
		false
	}

	pub fn dump(&self) -> String {
		let mut out = String::new();
		out.push_str("input:\n");
		for input in &self.inputs {
			out.push_str(&format!("{} {}\n", input.name, input.ty.name()));
		}

		out.push_str("\nactions:\n");
		for instruction in &self.instructions {
			out.push_str(&self.render_instruction(instruction));
			out.push('\n');
		}

		out.push_str("\noutput:\n");
		for output in &self.outputs {
			out.push_str(&format!("{} {}\n", output.name, output.ty.name()));
		}
		out
	}

	pub(crate) fn render_instruction(&self, instruction: &Instruction) -> String {
		let node = &self.nodes[instruction.node.0];
		let child_name = |id: &NodeId| self.nodes[id.0].result_name.as_str();
		match &node.kind {
			NodeKind::Constant => {
				format!("CONSTANT {} {}", node.result_name, node.result_type.name())
			}
			NodeKind::Alias => {
				let mut out = format!("ALIAS {} = {}", node.result_name, child_name(&node.children[0]));
				if instruction.arguments[0].release_after_use {
					out.push_str(" (removing)");
				}
				out
			}
			NodeKind::Function(function) => format!(
				"FUNCTION {} {} = {}({})",
				node.result_name,
				node.result_type.name(),
				function.name(),
				node.children.iter().map(child_name).collect::<Vec<_>>().join(", ")
			),
			NodeKind::ArrayJoin => {
				format!("ARRAY JOIN {} -> {}", child_name(&node.children[0]), node.result_name)
			}
			NodeKind::Input => String::new(),
		}
	}
}

/// Picks the column whose single value has the smallest upper size bound,
/// e.g. to keep one cheap column around purely for its row count. Types
/// without a bound weigh in at 100 bytes.
pub fn smallest_column(columns: &[(String, Type)]) -> crate::Result<String> {
	let mut smallest: Option<(usize, &str)> = None;
	for (name, ty) in columns {
		let size = ty.maximum_value_size().unwrap_or(100);
		if smallest.is_none_or(|(min_size, _)| size < min_size) {
			smallest = Some((size, name));
		}
	}

	match smallest {
		Some((_, name)) => Ok(name.to_string()),
		None => return_error!(logical_error("No available columns")),
	}
}
