// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::{collections::HashMap, fmt, sync::Arc};

use stele_core::{Column, ColumnData};
use stele_type::{
	Type,
	diagnostic::expression::{array_join_requires_array, duplicate_column, unknown_column, unknown_identifier},
	return_error,
};

use crate::{
	EngineSettings,
	function::{BoundFunction, ColumnDescriptor, ScalarFunction},
};

mod split;

/// Stable handle of a node within its owning graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Clone)]
pub(crate) enum NodeKind {
	Input,
	Constant,
	Alias,
	Function(Arc<dyn BoundFunction>),
	ArrayJoin,
}

impl fmt::Debug for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKind::Input => f.write_str("Input"),
			NodeKind::Constant => f.write_str("Constant"),
			NodeKind::Alias => f.write_str("Alias"),
			NodeKind::Function(function) => write!(f, "Function({})", function.name()),
			NodeKind::ArrayJoin => f.write_str("ArrayJoin"),
		}
	}
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
	pub(crate) kind: NodeKind,
	pub(crate) result_name: String,
	pub(crate) result_type: Type,
	/// Eagerly computed constant value, when the node folds.
	pub(crate) column: Option<ColumnData>,
	pub(crate) children: Vec<NodeId>,
	/// Set when another node re-bound this node's name. The node stays
	/// reachable as a child but is no longer a current output.
	pub(crate) superseded_by: Option<NodeId>,
	pub(crate) allow_constant_folding: bool,
}

/// A DAG of scalar computations over named columns. Nodes live in an arena
/// owned by the graph; every edge is an index into that arena.
#[derive(Debug, Clone, Default)]
pub struct ExpressionGraph {
	pub(crate) nodes: Vec<Node>,
	pub(crate) index: HashMap<String, NodeId>,
	pub(crate) settings: EngineSettings,
	pub(crate) project_input: bool,
}

impl ExpressionGraph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_inputs(inputs: impl IntoIterator<Item = (String, Type)>) -> crate::Result<Self> {
		let mut graph = Self::new();
		for (name, ty) in inputs {
			graph.add_input(&name, ty, false)?;
		}
		Ok(graph)
	}

	pub(crate) fn add_node(&mut self, node: Node, can_replace: bool) -> crate::Result<NodeId> {
		if self.index.contains_key(&node.result_name) && !can_replace {
			return_error!(duplicate_column(&node.result_name));
		}
		Ok(self.import_node(node))
	}

	/// Appends a node, superseding any current binding of its name.
	pub(crate) fn import_node(&mut self, node: Node) -> NodeId {
		let existing = self.index.get(&node.result_name).copied();

		let id = NodeId(self.nodes.len());
		let name = node.result_name.clone();
		self.nodes.push(node);

		if let Some(old) = existing {
			self.nodes[old.0].superseded_by = Some(id);
		}
		self.index.insert(name, id);
		id
	}

	/// The node currently bound to `name`.
	pub(crate) fn node(&self, name: &str) -> crate::Result<NodeId> {
		match self.index.get(name) {
			Some(id) => Ok(*id),
			None => return_error!(unknown_identifier(name)),
		}
	}

	pub fn add_input(&mut self, name: &str, ty: Type, can_replace: bool) -> crate::Result<NodeId> {
		self.add_node(
			Node {
				kind: NodeKind::Input,
				result_name: name.to_string(),
				result_type: ty,
				column: None,
				children: Vec::new(),
				superseded_by: None,
				allow_constant_folding: true,
			},
			can_replace,
		)
	}

	/// Adds a literal column value under the column's name.
	pub fn add_constant(&mut self, column: Column, can_replace: bool) -> crate::Result<NodeId> {
		self.add_node(
			Node {
				kind: NodeKind::Constant,
				result_name: column.name().to_string(),
				result_type: column.data().get_type(),
				column: Some(column.data),
				children: Vec::new(),
				superseded_by: None,
				allow_constant_folding: true,
			},
			can_replace,
		)
	}

	pub fn add_alias(&mut self, source_name: &str, alias: &str, can_replace: bool) -> crate::Result<NodeId> {
		let child = self.node(source_name)?;
		let child_node = &self.nodes[child.0];

		let node = Node {
			kind: NodeKind::Alias,
			result_name: alias.to_string(),
			result_type: child_node.result_type.clone(),
			column: child_node.column.clone(),
			children: vec![child],
			superseded_by: None,
			allow_constant_folding: child_node.allow_constant_folding,
		};
		self.add_node(node, can_replace)
	}

	pub fn add_array_join(&mut self, source_name: &str, result_name: &str) -> crate::Result<NodeId> {
		let child = self.node(source_name)?;
		let child_type = self.nodes[child.0].result_type.clone();

		let Some(element_type) = child_type.element_type().cloned() else {
			return_error!(array_join_requires_array(source_name, &child_type));
		};

		self.add_node(
			Node {
				kind: NodeKind::ArrayJoin,
				result_name: result_name.to_string(),
				result_type: element_type,
				column: None,
				children: vec![child],
				superseded_by: None,
				allow_constant_folding: true,
			},
			false,
		)
	}

	pub fn add_function(
		&mut self,
		function: &dyn ScalarFunction,
		argument_names: &[&str],
		result_name: Option<String>,
		settings: &EngineSettings,
	) -> crate::Result<NodeId> {
		self.settings = settings.clone();

		let mut children = Vec::with_capacity(argument_names.len());
		let mut descriptors = Vec::with_capacity(argument_names.len());
		let mut all_const = true;
		let mut allow_constant_folding = true;

		for name in argument_names {
			let child = self.node(name)?;
			let child_node = &self.nodes[child.0];
			children.push(child);
			allow_constant_folding &= child_node.allow_constant_folding;

			let descriptor = ColumnDescriptor {
				column: child_node.column.clone(),
				ty: child_node.result_type.clone(),
			};
			if !descriptor.column.as_ref().is_some_and(|column| column.is_constant()) {
				all_const = false;
			}
			descriptors.push(descriptor);
		}

		let bound = function.bind(&descriptors)?;
		let result_type = bound.result_type().clone();

		// If every argument is a constant and the function may run ahead
		// of time, evaluate it now and keep the result on the node. When
		// compiled operator bodies are cached, non-deterministic functions
		// must not be unfolded this way.
		let mut column = None;
		if all_const
			&& allow_constant_folding
			&& bound.is_suitable_for_constant_folding()
			&& (!settings.compile_expressions || bound.is_deterministic())
		{
			let row_count = descriptors.first().and_then(|d| d.column.as_ref()).map_or(0, |c| c.len());
			let arguments: Vec<Column> = descriptors
				.iter()
				.zip(argument_names)
				.map(|(descriptor, name)| {
					debug_assert!(descriptor.column.is_some());
					Column::new(*name, descriptor.column.clone().unwrap_or(ColumnData::undefined(0)))
				})
				.collect();

			let folded = bound.execute(&arguments, &result_type, row_count, true)?;

			// A non-constant result means the fold told us nothing.
			if folded.is_constant() {
				let folded = if folded.is_empty() {
					folded.clone_resized(1)
				} else {
					folded
				};
				column = Some(folded);
			}
		}

		if column.is_none() && bound.is_suitable_for_constant_folding() {
			if let Some(declared) = bound.result_if_always_constant(&descriptors) {
				column = Some(declared);
				allow_constant_folding = false;
			}
		}

		let result_name = result_name.unwrap_or_else(|| format!("{}({})", bound.name(), argument_names.join(", ")));

		self.add_node(
			Node {
				kind: NodeKind::Function(bound),
				result_name,
				result_type,
				column,
				children,
				superseded_by: None,
				allow_constant_folding,
			},
			false,
		)
	}

	/// Drops every node not reachable from `required_names` via child
	/// edges, compacting the arena and remapping all handles.
	pub fn prune_to_outputs(&mut self, required_names: &[String]) -> crate::Result<()> {
		let mut visited = vec![false; self.nodes.len()];
		let mut stack = Vec::new();
		let mut new_index = HashMap::new();

		for name in required_names {
			let Some(id) = self.index.get(name).copied() else {
				return_error!(unknown_column(name, &self.dump_names()));
			};
			new_index.insert(name.clone(), id);
			if !visited[id.0] {
				visited[id.0] = true;
				stack.push(id);
			}
		}

		while let Some(id) = stack.pop() {
			for child in self.nodes[id.0].children.clone() {
				if !visited[child.0] {
					visited[child.0] = true;
					stack.push(child);
				}
			}
		}

		let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
		let mut kept = Vec::new();
		for (id, node) in self.nodes.drain(..).enumerate() {
			if visited[id] {
				remap[id] = Some(NodeId(kept.len()));
				kept.push(node);
			}
		}

		for node in &mut kept {
			for child in &mut node.children {
				debug_assert!(remap[child.0].is_some(), "children of kept nodes are reachable");
				*child = remap[child.0].unwrap_or(*child);
			}
			// A superseding node with the same name may have been removed.
			node.superseded_by = node.superseded_by.and_then(|id| remap[id.0]);
		}

		self.nodes = kept;
		self.index = new_index
			.into_iter()
			.filter_map(|(name, id)| remap[id.0].map(|new_id| (name, new_id)))
			.collect();
		Ok(())
	}

	/// Current outputs: one entry per non-superseded, currently indexed
	/// node, in construction order.
	pub fn output_columns(&self) -> Vec<(String, Type)> {
		self.nodes
			.iter()
			.filter(|node| node.superseded_by.is_none() && self.index.contains_key(&node.result_name))
			.map(|node| (node.result_name.clone(), node.result_type.clone()))
			.collect()
	}

	/// The graph's `Input` nodes, in construction order.
	pub fn input_columns(&self) -> Vec<(String, Type)> {
		self.nodes
			.iter()
			.filter(|node| matches!(node.kind, NodeKind::Input))
			.map(|node| (node.result_name.clone(), node.result_type.clone()))
			.collect()
	}

	pub fn names(&self) -> Vec<String> {
		self.output_columns().into_iter().map(|(name, _)| name).collect()
	}

	pub fn dump_names(&self) -> String {
		self.nodes.iter().map(|node| node.result_name.as_str()).collect::<Vec<_>>().join(", ")
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn set_project_input(&mut self, project_input: bool) {
		self.project_input = project_input;
	}
}

#[cfg(test)]
mod tests {
	use stele_type::Value;

	use super::*;
	use crate::function::registry;

	fn add() -> Arc<dyn ScalarFunction> {
		registry().resolve("add").unwrap()
	}

	#[test]
	fn test_duplicate_input_without_replacement_fails() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("x", Type::Int8, false).unwrap();
		let error = graph.add_input("x", Type::Int8, false).unwrap_err();
		assert_eq!(error.code(), "EXPR_001");
	}

	#[test]
	fn test_duplicate_input_with_replacement_supersedes() {
		let mut graph = ExpressionGraph::new();
		let first = graph.add_input("x", Type::Int8, false).unwrap();
		let second = graph.add_input("x", Type::Utf8, true).unwrap();

		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[first.0].superseded_by, Some(second));
		assert_eq!(graph.node("x").unwrap(), second);
		assert_eq!(graph.output_columns(), vec![("x".to_string(), Type::Utf8)]);
	}

	#[test]
	fn test_alias_of_unknown_source_fails() {
		let mut graph = ExpressionGraph::new();
		let error = graph.add_alias("missing", "alias", false).unwrap_err();
		assert_eq!(error.code(), "EXPR_002");
	}

	#[test]
	fn test_array_join_requires_array_type() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("scalar", Type::Int8, false).unwrap();
		let error = graph.add_array_join("scalar", "element").unwrap_err();
		assert_eq!(error.code(), "EXPR_003");

		graph.add_input("arr", Type::array(Type::Int8), false).unwrap();
		let node = graph.add_array_join("arr", "element").unwrap();
		assert_eq!(graph.nodes[node.0].result_type, Type::Int8);
	}

	#[test]
	fn test_constant_folding_of_constant_arguments() {
		let mut graph = ExpressionGraph::new();
		graph.add_constant(Column::new("two", ColumnData::constant(Value::Int8(2), 1)), false).unwrap();
		graph.add_constant(Column::new("three", ColumnData::constant(Value::Int8(3), 1)), false).unwrap();
		let node = graph
			.add_function(&*add(), &["two", "three"], Some("five".to_string()), &EngineSettings::default())
			.unwrap();

		let column = graph.nodes[node.0].column.as_ref().expect("folded constant");
		assert!(column.is_constant());
		assert_eq!(column.get_value(0), Value::Int8(5));
		assert!(graph.nodes[node.0].allow_constant_folding);
	}

	#[test]
	fn test_no_folding_for_non_constant_arguments() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_constant(Column::new("one", ColumnData::constant(Value::Int8(1), 1)), false).unwrap();
		let node = graph
			.add_function(&*add(), &["a", "one"], None, &EngineSettings::default())
			.unwrap();

		assert!(graph.nodes[node.0].column.is_none());
		assert_eq!(graph.nodes[node.0].result_name, "add(a, one)");
	}

	#[test]
	fn test_folding_skips_non_deterministic_when_compiling() {
		#[derive(Debug)]
		struct RandomLikeFunction;
		#[derive(Debug)]
		struct BoundRandomLike {
			result_type: Type,
		}

		impl ScalarFunction for RandomLikeFunction {
			fn name(&self) -> &str {
				"random_like"
			}

			fn bind(&self, _arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
				Ok(Arc::new(BoundRandomLike {
					result_type: Type::Int8,
				}))
			}
		}

		impl BoundFunction for BoundRandomLike {
			fn name(&self) -> &str {
				"random_like"
			}

			fn result_type(&self) -> &Type {
				&self.result_type
			}

			fn is_deterministic(&self) -> bool {
				false
			}

			fn execute(
				&self,
				_arguments: &[Column],
				_result_type: &Type,
				row_count: usize,
				_dry_run: bool,
			) -> crate::Result<ColumnData> {
				Ok(ColumnData::constant(Value::Int8(4), row_count))
			}
		}

		let settings = EngineSettings {
			compile_expressions: true,
			..EngineSettings::default()
		};

		let mut graph = ExpressionGraph::new();
		graph.add_constant(Column::new("seed", ColumnData::constant(Value::Int8(1), 1)), false).unwrap();
		let node = graph.add_function(&RandomLikeFunction, &["seed"], None, &settings).unwrap();
		assert!(graph.nodes[node.0].column.is_none());

		// Without cached compilation the same function folds.
		let mut graph = ExpressionGraph::new();
		graph.add_constant(Column::new("seed", ColumnData::constant(Value::Int8(1), 1)), false).unwrap();
		let node = graph
			.add_function(&RandomLikeFunction, &["seed"], None, &EngineSettings::default())
			.unwrap();
		assert!(graph.nodes[node.0].column.is_some());
	}

	#[test]
	fn test_declared_constant_disables_further_folding() {
		#[derive(Debug)]
		struct AlwaysOneFunction;
		#[derive(Debug)]
		struct BoundAlwaysOne {
			result_type: Type,
		}

		impl ScalarFunction for AlwaysOneFunction {
			fn name(&self) -> &str {
				"always_one"
			}

			fn bind(&self, _arguments: &[ColumnDescriptor]) -> crate::Result<Arc<dyn BoundFunction>> {
				Ok(Arc::new(BoundAlwaysOne {
					result_type: Type::Int8,
				}))
			}
		}

		impl BoundFunction for BoundAlwaysOne {
			fn name(&self) -> &str {
				"always_one"
			}

			fn result_type(&self) -> &Type {
				&self.result_type
			}

			fn result_if_always_constant(&self, _arguments: &[ColumnDescriptor]) -> Option<ColumnData> {
				Some(ColumnData::constant(Value::Int8(1), 1))
			}

			fn execute(
				&self,
				_arguments: &[Column],
				_result_type: &Type,
				row_count: usize,
				_dry_run: bool,
			) -> crate::Result<ColumnData> {
				Ok(ColumnData::constant(Value::Int8(1), row_count))
			}
		}

		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		let node = graph
			.add_function(&AlwaysOneFunction, &["a"], None, &EngineSettings::default())
			.unwrap();

		assert!(graph.nodes[node.0].column.is_some());
		assert!(!graph.nodes[node.0].allow_constant_folding);
	}

	#[test]
	fn test_prune_to_outputs_removes_unreachable_nodes() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_input("b", Type::Int8, false).unwrap();
		graph.add_function(&*add(), &["a", "a"], Some("doubled".to_string()), &EngineSettings::default()).unwrap();
		graph.add_function(&*add(), &["a", "b"], Some("sum".to_string()), &EngineSettings::default()).unwrap();

		graph.prune_to_outputs(&["doubled".to_string()]).unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.names(), vec!["doubled".to_string()]);
		assert_eq!(graph.input_columns(), vec![("a".to_string(), Type::Int8)]);
	}

	#[test]
	fn test_prune_is_idempotent() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_input("b", Type::Int8, false).unwrap();
		graph.add_function(&*add(), &["a", "b"], Some("sum".to_string()), &EngineSettings::default()).unwrap();

		graph.prune_to_outputs(&["sum".to_string()]).unwrap();
		let nodes_after_first = graph.nodes.len();
		let names_after_first = graph.names();

		graph.prune_to_outputs(&["sum".to_string()]).unwrap();
		assert_eq!(graph.nodes.len(), nodes_after_first);
		assert_eq!(graph.names(), names_after_first);
	}

	#[test]
	fn test_prune_to_unknown_output_fails() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		let error = graph.prune_to_outputs(&["nope".to_string()]).unwrap_err();
		assert_eq!(error.code(), "EXPR_002");
		assert!(error.to_string().contains("there are only columns"));
	}

	#[test]
	fn test_prune_clears_stale_superseding_links() {
		let mut graph = ExpressionGraph::new();
		graph.add_input("a", Type::Int8, false).unwrap();
		graph.add_alias("a", "b", false).unwrap();
		graph.add_function(&*add(), &["b", "b"], Some("c".to_string()), &EngineSettings::default()).unwrap();
		// Rebind "b"; the alias stays reachable as a child of "c" only.
		graph.add_input("b", Type::Int8, true).unwrap();

		// Pruning to "c" keeps the superseded alias but drops its
		// replacement, so the link into the removed node is cleared.
		graph.prune_to_outputs(&["c".to_string()]).unwrap();
		assert_eq!(graph.nodes.len(), 3);
		assert!(graph.nodes.iter().all(|node| node.superseded_by.is_none()));
	}
}
