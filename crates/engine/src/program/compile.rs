// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::collections::VecDeque;

use stele_type::{
	diagnostic::execute::{logical_error, too_many_temporary_columns},
	return_error,
};
use tracing::instrument;

use crate::{
	expression::{ExpressionGraph, Node, NodeId, NodeKind},
	program::{Argument, ExpressionProgram, Instruction, ProgramColumn},
};

#[derive(Debug, Default)]
struct NodeState {
	parents: Vec<NodeId>,
	num_expected_children: usize,
	num_created_children: usize,
	/// The superseded node this one re-binds; it must be scheduled first.
	renamed_child: Option<NodeId>,
	slot: Option<usize>,
	num_created_parents: usize,
	used_in_result: bool,
}

impl ExpressionGraph {
	/// Single topological pass over the graph: assigns every non-input
	/// node a reusable buffer slot, computes per-argument last uses and
	/// emits the flat instruction list. Consumes the graph.
	#[instrument(name = "expression::compile", level = "trace", skip_all)]
	pub fn compile(mut self) -> crate::Result<ExpressionProgram> {
		let node_count = self.nodes.len();
		let mut states: Vec<NodeState> = (0..node_count).map(|_| NodeState::default()).collect();

		for id in 0..node_count {
			let node = &self.nodes[id];
			states[id].num_expected_children += node.children.len();
			states[id].used_in_result =
				node.superseded_by.is_none() && self.index.contains_key(&node.result_name);

			for child in &node.children {
				states[child.0].parents.push(NodeId(id));
			}

			if let Some(replacement) = node.superseded_by {
				states[replacement.0].renamed_child = Some(NodeId(id));
				states[replacement.0].num_expected_children += 1;
			}
		}

		// Two priority classes: ordinary nodes run before array joins
		// whenever both are ready, deferring row-count changes as late as
		// their dependencies allow.
		let mut ready: VecDeque<NodeId> = VecDeque::new();
		let mut ready_array_joins: VecDeque<NodeId> = VecDeque::new();

		for id in 0..node_count {
			if self.nodes[id].children.is_empty() && states[id].renamed_child.is_none() {
				ready.push_back(NodeId(id));
			}
		}

		let mut instructions = Vec::new();
		let mut inputs = Vec::new();
		let mut outputs = Vec::new();
		let mut free_slots: Vec<usize> = Vec::new();
		let mut slot_count = 0usize;

		while let Some(id) = ready.pop_front().or_else(|| ready_array_joins.pop_front()) {
			// The result slot is taken before any argument slot is
			// released, so a result never aliases a live argument.
			let slot = match free_slots.pop() {
				Some(slot) => slot,
				None => {
					let slot = slot_count;
					slot_count += 1;
					slot
				}
			};
			states[id.0].slot = Some(slot);

			let children = self.nodes[id.0].children.clone();
			let mut arguments = Vec::with_capacity(children.len());
			let mut released = Vec::new();
			for child in &children {
				let Some(child_slot) = states[child.0].slot else {
					return_error!(logical_error(format!(
						"Argument was not calculated for {}",
						self.nodes[child.0].result_name
					)));
				};

				let child_state = &mut states[child.0];
				child_state.num_created_parents += 1;
				let release = !child_state.used_in_result
					&& child_state.num_created_parents == child_state.parents.len();
				if release {
					released.push(child_slot);
				}
				arguments.push(Argument {
					slot: child_slot,
					release_after_use: release,
				});
			}
			// Repeated arguments over one slot share its single last use.
			for argument in &mut arguments {
				if released.contains(&argument.slot) {
					argument.release_after_use = true;
				}
			}
			free_slots.extend(released);

			let node = &self.nodes[id.0];
			let used_in_result = states[id.0].used_in_result;
			let column = ProgramColumn {
				name: node.result_name.clone(),
				ty: node.result_type.clone(),
				slot,
			};
			match node.kind {
				NodeKind::Input => inputs.push(column.clone()),
				_ => instructions.push(Instruction {
					node: id,
					slot,
					arguments,
					is_used_in_result: used_in_result,
				}),
			}
			if used_in_result {
				outputs.push(column);
			}

			for parent in states[id.0].parents.clone() {
				unblock(&self.nodes, &mut states, &mut ready, &mut ready_array_joins, parent);
			}
			if let Some(replacement) = self.nodes[id.0].superseded_by {
				unblock(&self.nodes, &mut states, &mut ready, &mut ready_array_joins, replacement);
			}
		}

		let settings = self.settings.clone();
		if settings.max_temporary_columns > 0 && (slot_count as u64) > settings.max_temporary_columns {
			return_error!(too_many_temporary_columns(&self.dump_names(), settings.max_temporary_columns));
		}

		Ok(ExpressionProgram {
			nodes: self.nodes,
			instructions,
			inputs,
			outputs,
			slot_count,
			project_input: self.project_input,
			settings,
		})
	}
}

fn unblock(
	nodes: &[Node],
	states: &mut [NodeState],
	ready: &mut VecDeque<NodeId>,
	ready_array_joins: &mut VecDeque<NodeId>,
	id: NodeId,
) {
	let state = &mut states[id.0];
	state.num_created_children += 1;
	if state.num_created_children == state.num_expected_children {
		if matches!(nodes[id.0].kind, NodeKind::ArrayJoin) {
			ready_array_joins.push_back(id);
		} else {
			ready.push_back(id);
		}
	}
}

#[cfg(test)]
mod tests {
	use stele_core::{Column, ColumnData};
	use stele_type::{Type, Value};

	use super::*;
	use crate::{EngineSettings, function::registry};

	fn settings() -> EngineSettings {
		EngineSettings::default()
	}

	#[test]
	fn test_every_node_is_scheduled_exactly_once() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_input("b", Type::Int8, false).unwrap();
		let add = registry().resolve("add").unwrap();
		graph.add_function(&*add, &["a", "b"], Some("s".to_string()), &settings()).unwrap();
		graph.add_alias("s", "t", false).unwrap();

		let program = graph.compile().unwrap();
		assert_eq!(program.inputs().len(), 2);
		assert_eq!(program.instruction_count(), 2);
	}

	#[test]
	fn test_released_slots_are_reused() {
		// c1 = a + a; c2 = c1 + c1; only c2 is an output, so the slots of
		// a and c1 free up and the pool never grows past the live set.
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		let add = registry().resolve("add").unwrap();
		graph.add_function(&*add, &["a", "a"], Some("c1".to_string()), &settings()).unwrap();
		graph.add_function(&*add, &["c1", "c1"], Some("c2".to_string()), &settings()).unwrap();
		graph.prune_to_outputs(&["c2".to_string()]).unwrap();

		let program = graph.compile().unwrap();
		assert_eq!(program.slot_count(), 2);
	}

	#[test]
	fn test_outputs_keep_their_slots_live() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		let add = registry().resolve("add").unwrap();
		graph.add_function(&*add, &["a", "a"], Some("b".to_string()), &settings()).unwrap();
		graph.add_function(&*add, &["b", "b"], Some("c".to_string()), &settings()).unwrap();

		// All three names stay current outputs, so nothing is released.
		let program = graph.compile().unwrap();
		assert_eq!(program.slot_count(), 3);
		let output_names: Vec<&str> = program.outputs().iter().map(|o| o.name.as_str()).collect();
		assert_eq!(output_names, vec!["a", "b", "c"]);
	}

	#[test]
	fn test_max_temporary_columns_is_enforced() {
		let limited = EngineSettings {
			max_temporary_columns: 2,
			..EngineSettings::default()
		};
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_input("b", Type::Int8, false).unwrap();
		let add = registry().resolve("add").unwrap();
		graph.add_function(&*add, &["a", "b"], Some("s".to_string()), &limited).unwrap();

		let error = graph.compile().unwrap_err();
		assert_eq!(error.code(), "EXEC_002");
	}

	#[test]
	fn test_replacement_waits_for_superseded_node() {
		// "b" aliases "a", then a constant re-binds "b". The constant has
		// no children but must still schedule after the alias it replaces.
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_alias("a", "b", false).unwrap();
		graph.add_constant(Column::new("b", ColumnData::constant(Value::Int8(9), 1)), true).unwrap();

		let program = graph.compile().unwrap();
		let rendered = program.dump();
		let alias_line = rendered.lines().position(|l| l.starts_with("ALIAS b")).unwrap();
		let constant_line = rendered.lines().position(|l| l.starts_with("CONSTANT b")).unwrap();
		assert!(alias_line < constant_line);
	}

	#[test]
	fn test_array_joins_are_deferred_when_tied() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("arr", Type::array(Type::Int8), false).unwrap();
		graph.add_input("n", Type::Int8, false).unwrap();
		graph.add_array_join("arr", "element").unwrap();
		let add = registry().resolve("add").unwrap();
		graph.add_function(&*add, &["n", "n"], Some("doubled".to_string()), &settings()).unwrap();

		// Both the array join and the function become ready once their
		// inputs are scheduled; the ordinary node must run first.
		let program = graph.compile().unwrap();
		let rendered = program.dump();
		let function_line = rendered.lines().position(|l| l.starts_with("FUNCTION doubled")).unwrap();
		let array_join_line = rendered.lines().position(|l| l.starts_with("ARRAY JOIN")).unwrap();
		assert!(function_line < array_join_line);
	}
}
