// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::collections::{HashMap, HashSet};

use stele_type::{
	Type,
	diagnostic::{execute::logical_error, expression::array_join_requires_array},
	return_error,
};
use tracing::instrument;

use crate::{expression::ExpressionGraph, program::ExpressionProgram};

/// One logical pipeline, partitioned into ordered steps at array-join and
/// join boundaries. `finalize` shrinks every step to the minimal set of
/// outputs the rest of the chain needs.
#[derive(Debug, Default)]
pub struct ExpressionChain {
	steps: Vec<Step>,
}

#[derive(Debug)]
pub enum Step {
	Expression(ExpressionStep),
	ArrayJoin(ArrayJoinStep),
	Join(JoinStep),
}

/// A plain expression segment. The graph is pruned during `finalize` and
/// compiled on first use.
#[derive(Debug)]
pub struct ExpressionStep {
	graph: Option<ExpressionGraph>,
	program: Option<ExpressionProgram>,
	required_output: Vec<String>,
	can_remove_required_output: Vec<bool>,
	additional_input: HashSet<String>,
}

/// The row-flattening contract carried between two expression segments.
#[derive(Debug, Clone)]
pub struct ArrayJoinSpec {
	pub columns: HashSet<String>,
}

#[derive(Debug)]
pub struct ArrayJoinStep {
	array_join: ArrayJoinSpec,
	required_columns: Vec<(String, Type)>,
	result_columns: Vec<(String, Type)>,
	required_output: Vec<String>,
	can_remove_required_output: Vec<bool>,
	additional_input: HashSet<String>,
}

/// Join key and column-addition metadata; matching itself is external.
#[derive(Debug, Clone)]
pub struct JoinSpec {
	pub key_names_left: Vec<String>,
	pub columns_added: Vec<(String, Type)>,
}

#[derive(Debug)]
pub struct JoinStep {
	join: JoinSpec,
	required_columns: Vec<(String, Type)>,
	result_columns: Vec<(String, Type)>,
	required_output: Vec<String>,
	can_remove_required_output: Vec<bool>,
	additional_input: HashSet<String>,
}

impl ExpressionStep {
	pub fn new(graph: ExpressionGraph) -> Self {
		Self {
			graph: Some(graph),
			program: None,
			required_output: Vec::new(),
			can_remove_required_output: Vec::new(),
			additional_input: HashSet::new(),
		}
	}

	pub fn graph_mut(&mut self) -> Option<&mut ExpressionGraph> {
		self.graph.as_mut()
	}

	pub fn program(&self) -> Option<&ExpressionProgram> {
		self.program.as_ref()
	}

	/// Compiles the pruned graph on first use; the program is cached.
	pub fn build_program(&mut self) -> crate::Result<&ExpressionProgram> {
		if self.program.is_none() {
			let Some(graph) = self.graph.take() else {
				return_error!(logical_error("expression step has neither graph nor program"));
			};
			self.program = Some(graph.compile()?);
		}
		match self.program.as_ref() {
			Some(program) => Ok(program),
			None => return_error!(logical_error("expression step failed to build its program")),
		}
	}

	fn required_columns(&self) -> Vec<(String, Type)> {
		match (&self.program, &self.graph) {
			(Some(program), _) => {
				program.inputs().iter().map(|input| (input.name.clone(), input.ty.clone())).collect()
			}
			(None, Some(graph)) => graph.input_columns(),
			(None, None) => Vec::new(),
		}
	}

	fn result_columns(&self) -> Vec<(String, Type)> {
		match (&self.program, &self.graph) {
			(Some(program), _) => {
				program.outputs().iter().map(|output| (output.name.clone(), output.ty.clone())).collect()
			}
			(None, Some(graph)) => graph.output_columns(),
			(None, None) => Vec::new(),
		}
	}

	fn finalize(&mut self, required_output: &[String]) -> crate::Result<()> {
		if let Some(graph) = self.graph.as_mut() {
			graph.prune_to_outputs(required_output)?;
		}
		Ok(())
	}

	fn prepend_project_input(&mut self) {
		if let Some(graph) = self.graph.as_mut() {
			graph.set_project_input(true);
		}
		if let Some(program) = self.program.as_mut() {
			program.set_project_input(true);
		}
	}

	fn dump(&self) -> String {
		match &self.program {
			Some(program) => program.dump(),
			None => {
				let outputs: Vec<String> = self.result_columns().into_iter().map(|(name, _)| name).collect();
				format!("expression (not compiled), outputs: {}\n", outputs.join(", "))
			}
		}
	}
}

impl ArrayJoinStep {
	pub fn new(array_join: ArrayJoinSpec, columns: Vec<(String, Type)>) -> crate::Result<Self> {
		let required_columns = columns.clone();
		let mut result_columns = Vec::with_capacity(columns.len());
		for (name, ty) in columns {
			if array_join.columns.contains(&name) {
				let Some(element) = ty.element_type().cloned() else {
					return_error!(array_join_requires_array(&name, &ty));
				};
				result_columns.push((name, element));
			} else {
				result_columns.push((name, ty));
			}
		}
		Ok(Self {
			array_join,
			required_columns,
			result_columns,
			required_output: Vec::new(),
			can_remove_required_output: Vec::new(),
			additional_input: HashSet::new(),
		})
	}

	pub fn array_join(&self) -> &ArrayJoinSpec {
		&self.array_join
	}

	fn finalize(&mut self, required_output: &[String]) {
		let names: HashSet<&str> = required_output.iter().map(String::as_str).collect();
		let joined = &self.array_join.columns;
		self.result_columns.retain(|(name, _)| joined.contains(name) || names.contains(name.as_str()));
		self.required_columns.retain(|(name, _)| joined.contains(name) || names.contains(name.as_str()));
	}

	fn dump(&self) -> String {
		let mut columns: Vec<&str> = self.array_join.columns.iter().map(String::as_str).collect();
		columns.sort_unstable();
		format!("ARRAY JOIN {}\n", columns.join(", "))
	}
}

impl JoinStep {
	pub fn new(join: JoinSpec, columns: Vec<(String, Type)>) -> Self {
		let required_columns = columns.clone();
		let mut result_columns = columns;
		result_columns.extend(join.columns_added.iter().cloned());
		Self {
			join,
			required_columns,
			result_columns,
			required_output: Vec::new(),
			can_remove_required_output: Vec::new(),
			additional_input: HashSet::new(),
		}
	}

	pub fn join(&self) -> &JoinSpec {
		&self.join
	}

	fn finalize(&mut self, required_output: &[String]) {
		let mut required_names: HashSet<String> = required_output.iter().cloned().collect();
		for name in &self.join.key_names_left {
			required_names.insert(name.clone());
		}
		self.required_columns.retain(|(name, _)| required_names.contains(name));

		// The result additionally keeps everything the join itself adds.
		for (name, _) in &self.join.columns_added {
			required_names.insert(name.clone());
		}
		self.result_columns.retain(|(name, _)| required_names.contains(name));
	}

	fn dump(&self) -> String {
		format!(
			"JOIN keys: {}, adds: {}\n",
			self.join.key_names_left.join(", "),
			self.join.columns_added.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(", ")
		)
	}
}

impl Step {
	pub fn required_output(&self) -> &[String] {
		match self {
			Step::Expression(step) => &step.required_output,
			Step::ArrayJoin(step) => &step.required_output,
			Step::Join(step) => &step.required_output,
		}
	}

	/// Declares one more output this step must keep; removable until the
	/// finalize pass learns a later step shares it.
	pub fn add_required_output(&mut self, name: impl Into<String>) {
		let (required, can_remove) = match self {
			Step::Expression(step) => (&mut step.required_output, &mut step.can_remove_required_output),
			Step::ArrayJoin(step) => (&mut step.required_output, &mut step.can_remove_required_output),
			Step::Join(step) => (&mut step.required_output, &mut step.can_remove_required_output),
		};
		required.push(name.into());
		can_remove.push(true);
	}

	pub fn can_remove_required_output(&self) -> &[bool] {
		match self {
			Step::Expression(step) => &step.can_remove_required_output,
			Step::ArrayJoin(step) => &step.can_remove_required_output,
			Step::Join(step) => &step.can_remove_required_output,
		}
	}

	pub fn additional_input(&self) -> &HashSet<String> {
		match self {
			Step::Expression(step) => &step.additional_input,
			Step::ArrayJoin(step) => &step.additional_input,
			Step::Join(step) => &step.additional_input,
		}
	}

	/// Marks a name as synthesized inside this step rather than consumed
	/// from the previous step's output.
	pub fn add_additional_input(&mut self, name: impl Into<String>) {
		let additional = match self {
			Step::Expression(step) => &mut step.additional_input,
			Step::ArrayJoin(step) => &mut step.additional_input,
			Step::Join(step) => &mut step.additional_input,
		};
		additional.insert(name.into());
	}

	pub fn required_columns(&self) -> Vec<(String, Type)> {
		match self {
			Step::Expression(step) => step.required_columns(),
			Step::ArrayJoin(step) => step.required_columns.clone(),
			Step::Join(step) => step.required_columns.clone(),
		}
	}

	pub fn result_columns(&self) -> Vec<(String, Type)> {
		match self {
			Step::Expression(step) => step.result_columns(),
			Step::ArrayJoin(step) => step.result_columns.clone(),
			Step::Join(step) => step.result_columns.clone(),
		}
	}

	fn set_required_output(&mut self, required_output: Vec<String>, can_remove: Vec<bool>) {
		match self {
			Step::Expression(step) => {
				step.required_output = required_output;
				step.can_remove_required_output = can_remove;
			}
			Step::ArrayJoin(step) => {
				step.required_output = required_output;
				step.can_remove_required_output = can_remove;
			}
			Step::Join(step) => {
				step.required_output = required_output;
				step.can_remove_required_output = can_remove;
			}
		}
	}

	fn finalize(&mut self, required_output: &[String]) -> crate::Result<()> {
		match self {
			Step::Expression(step) => step.finalize(required_output),
			Step::ArrayJoin(step) => {
				step.finalize(required_output);
				Ok(())
			}
			Step::Join(step) => {
				step.finalize(required_output);
				Ok(())
			}
		}
	}

	fn prepend_project_input(&mut self) {
		if let Step::Expression(step) = self {
			step.prepend_project_input();
		}
	}

	pub fn dump(&self) -> String {
		match self {
			Step::Expression(step) => step.dump(),
			Step::ArrayJoin(step) => step.dump(),
			Step::Join(step) => step.dump(),
		}
	}

	pub fn as_expression_mut(&mut self) -> Option<&mut ExpressionStep> {
		match self {
			Step::Expression(step) => Some(step),
			_ => None,
		}
	}
}

impl ExpressionChain {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	pub fn steps_mut(&mut self) -> &mut [Step] {
		&mut self.steps
	}

	pub fn push_step(&mut self, step: Step) {
		self.steps.push(step);
	}

	pub fn last_step_mut(&mut self) -> Option<&mut Step> {
		self.steps.last_mut()
	}

	/// Opens a new expression step consuming the previous step's result
	/// columns.
	pub fn add_step(&mut self) -> crate::Result<&mut Step> {
		let Some(last) = self.steps.last() else {
			return_error!(logical_error("Cannot add action to empty ExpressionChain"));
		};
		let graph = ExpressionGraph::from_inputs(last.result_columns())?;
		self.steps.push(Step::Expression(ExpressionStep::new(graph)));
		match self.steps.last_mut() {
			Some(step) => Ok(step),
			None => return_error!(logical_error("chain lost its freshly added step")),
		}
	}

	/// Right-to-left pass computing each step's minimal required outputs,
	/// then a forward pass inserting drop-extra-columns projections.
	#[instrument(name = "chain::finalize", level = "trace", skip_all)]
	pub fn finalize(&mut self) -> crate::Result<()> {
		for i in (0..self.steps.len()).rev() {
			let mut required_output = self.steps[i].required_output().to_vec();
			let mut can_remove = self.steps[i].can_remove_required_output().to_vec();
			let mut positions: HashMap<String, usize> = required_output
				.iter()
				.enumerate()
				.map(|(position, name)| (name.clone(), position))
				.collect();

			if i + 1 < self.steps.len() {
				let additional_input = self.steps[i + 1].additional_input().clone();
				for (name, _) in self.steps[i + 1].required_columns() {
					if additional_input.contains(&name) {
						continue;
					}
					match positions.get(&name) {
						None => {
							positions.insert(name.clone(), required_output.len());
							required_output.push(name);
						}
						Some(&position) => {
							// A later step shares this output; it must
							// survive the step's own cleanup.
							if !can_remove.is_empty() {
								can_remove[position] = false;
							}
						}
					}
				}
			}

			self.steps[i].set_required_output(required_output.clone(), can_remove);
			self.steps[i].finalize(&required_output)?;
		}

		// Eject unused columns at the start of a step when the previous
		// one emits strictly more than it consumes, unless that would
		// drop every column and lose the row count.
		for i in 1..self.steps.len() {
			let columns_from_previous = self.steps[i - 1].result_columns().len();
			if !self.steps[i].result_columns().is_empty()
				&& columns_from_previous > self.steps[i].required_columns().len()
			{
				self.steps[i].prepend_project_input();
			}
		}
		Ok(())
	}

	pub fn dump_chain(&self) -> String {
		let mut out = String::new();
		for (i, step) in self.steps.iter().enumerate() {
			out.push_str(&format!("step {}\n", i));
			out.push_str("required output:\n");
			for name in step.required_output() {
				out.push_str(name);
				out.push('\n');
			}
			out.push('\n');
			out.push_str(&step.dump());
			out.push('\n');
		}
		out
	}
}
