// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use stele_core::{Column, ColumnData, Columns};
use stele_type::{
	Fragment,
	diagnostic::{
		execute::{logical_error, not_found_column_in_block, too_many_temporary_non_const_columns},
		expression::array_join_of_not_array,
	},
	return_error,
};
use tracing::instrument;

use crate::{
	expression::NodeKind,
	program::{ExpressionProgram, Instruction},
};

/// Per-call scratch state: one positional buffer per slot plus the current
/// row count. Never outlives a single `execute` call.
struct ExecutionContext {
	buffers: Vec<Option<Column>>,
	row_count: usize,
}

impl ExpressionProgram {
	/// Runs the program against `block`: binds the required inputs,
	/// executes every instruction in compiled order and assembles the
	/// declared outputs back into the block.
	#[instrument(name = "expression::execute", level = "trace", skip_all)]
	pub fn execute(&self, block: &mut Columns) -> crate::Result<()> {
		let mut context = ExecutionContext {
			buffers: vec![None; self.slot_count],
			row_count: block.row_count(),
		};

		for input in &self.inputs {
			let Some(column) = block.take_by_name(&input.name) else {
				return_error!(not_found_column_in_block(&input.name));
			};
			context.buffers[input.slot] = Some(column);
		}

		for instruction in &self.instructions {
			let result = self
				.execute_instruction(instruction, &mut context, block)
				.and_then(|_| self.check_limits(&context));
			if let Err(error) = result {
				return Err(error
					.with_note(format!("while executing '{}'", self.render_instruction(instruction))));
			}
		}

		if self.project_input {
			block.clear();
		}

		// The outputs cover every node marked used-in-result, including
		// required inputs that were moved out of the block at bind time.
		debug_assert!(self.instructions.iter().filter(|i| i.is_used_in_result).all(|instruction| {
			self.outputs.iter().any(|output| output.slot == instruction.slot)
		}));
		for output in &self.outputs {
			let Some(mut column) = context.buffers[output.slot].take() else {
				return_error!(logical_error(format!("result column '{}' was not produced", output.name)));
			};
			column.name = Fragment::owned_internal(output.name.as_str());

			match block.position_by_name(&output.name) {
				Some(position) => block.replace(position, column),
				None => block.insert(column),
			}
		}
		Ok(())
	}

	fn execute_instruction(
		&self,
		instruction: &Instruction,
		context: &mut ExecutionContext,
		block: &mut Columns,
	) -> crate::Result<()> {
		let node = &self.nodes[instruction.node.0];
		match &node.kind {
			NodeKind::Constant => {
				let Some(data) = &node.column else {
					return_error!(logical_error(format!(
						"constant node '{}' carries no value",
						node.result_name
					)));
				};
				context.buffers[instruction.slot] =
					Some(Column::new(node.result_name.as_str(), data.clone_resized(context.row_count)));
			}

			NodeKind::Alias => {
				let argument = instruction.arguments[0];
				let source = if argument.release_after_use {
					context.buffers[argument.slot].take()
				} else {
					context.buffers[argument.slot].clone()
				};
				let Some(mut column) = source else {
					return_error!(logical_error(format!(
						"alias source for '{}' is missing",
						node.result_name
					)));
				};
				column.name = Fragment::owned_internal(node.result_name.as_str());
				context.buffers[instruction.slot] = Some(column);
			}

			NodeKind::Function(function) => {
				if context.buffers[instruction.slot].is_some() {
					return_error!(logical_error("Result column is not empty"));
				}

				let mut arguments: Vec<Column> = Vec::with_capacity(instruction.arguments.len());
				for (i, argument) in instruction.arguments.iter().enumerate() {
					let column = match context.buffers[argument.slot].take() {
						Some(column) => column,
						// The same slot can feed several arguments of
						// one call; later uses copy the first.
						None => {
							let previous = instruction.arguments[..i]
								.iter()
								.position(|a| a.slot == argument.slot);
							match previous {
								Some(previous) => arguments[previous].clone(),
								None => return_error!(logical_error(format!(
									"argument column for '{}' is missing",
									node.result_name
								))),
							}
						}
					};
					arguments.push(column);
				}

				let result = function.execute(&arguments, &node.result_type, context.row_count, false)?;

				for (argument, column) in instruction.arguments.iter().zip(arguments) {
					if !argument.release_after_use && context.buffers[argument.slot].is_none() {
						context.buffers[argument.slot] = Some(column);
					}
				}

				context.buffers[instruction.slot] = Some(Column::new(node.result_name.as_str(), result));
			}

			NodeKind::ArrayJoin => {
				let argument = instruction.arguments[0];
				let Some(source) = context.buffers[argument.slot].take() else {
					return_error!(logical_error(format!(
						"array join source for '{}' is missing",
						node.result_name
					)));
				};
				// A source that stays live is replicated along with
				// everything else; it must not be counted twice.
				if !argument.release_after_use {
					context.buffers[argument.slot] = Some(source.clone());
				}

				let data = source.data.convert_to_full();
				let ColumnData::Array(array) = data else {
					return_error!(array_join_of_not_array(&node.result_name));
				};
				let offsets = array.offsets().to_vec();

				for buffer in context.buffers.iter_mut() {
					if let Some(column) = buffer {
						let replicated = column.data.replicate(&offsets);
						column.data = replicated;
					}
				}
				for column in block.iter_mut() {
					let replicated = column.data.replicate(&offsets);
					column.data = replicated;
				}

				context.row_count = offsets.last().copied().unwrap_or(0) as usize;
				context.buffers[instruction.slot] =
					Some(Column::new(node.result_name.as_str(), array.into_values()));
			}

			NodeKind::Input => {
				return_error!(logical_error("Cannot execute INPUT action"));
			}
		}
		Ok(())
	}

	fn check_limits(&self, context: &ExecutionContext) -> crate::Result<()> {
		if self.settings.max_temporary_non_const_columns > 0 {
			let non_const: Vec<String> = context
				.buffers
				.iter()
				.flatten()
				.filter(|column| !column.data().is_constant())
				.map(|column| column.name().to_string())
				.collect();
			if (non_const.len() as u64) > self.settings.max_temporary_non_const_columns {
				return_error!(too_many_temporary_non_const_columns(
					&non_const,
					self.settings.max_temporary_non_const_columns
				));
			}
		}
		Ok(())
	}
}
