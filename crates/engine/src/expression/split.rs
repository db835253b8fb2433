// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

use std::collections::HashSet;

use crate::expression::{ExpressionGraph, Node, NodeId, NodeKind};

impl ExpressionGraph {
	/// Moves everything that does not depend on the array-joined columns
	/// into a new, earlier graph, leaving the dependent residual in place.
	///
	/// Expected chain: earlier graph -> array join -> residual (self).
	///
	/// The residual consumes every output of the earlier graph (those
	/// columns flow through the array join's row replication) plus the
	/// array-joined inputs themselves. Alias nodes are assigned per side
	/// by their own dependence, so a rename never drags an unrelated value
	/// across the boundary. Returns `None`, leaving the graph unchanged,
	/// when either side would come out empty.
	pub fn split_before_array_join(&mut self, array_joined_columns: &HashSet<String>) -> Option<ExpressionGraph> {
		let mut dependent = vec![false; self.nodes.len()];
		for id in 0..self.nodes.len() {
			let node = &self.nodes[id];
			let mut depends = dependent[id];
			if matches!(node.kind, NodeKind::Input) && array_joined_columns.contains(&node.result_name) {
				depends = true;
			}
			if node.children.iter().any(|child| dependent[child.0]) {
				depends = true;
			}
			dependent[id] = depends;
			// A node re-binding a dependent name stays on the dependent
			// side; the rename handshake must not cross the array join.
			if depends {
				if let Some(replacement) = node.superseded_by {
					dependent[replacement.0] = true;
				}
			}
		}

		// Do not split if either side would come out empty: the earlier
		// graph needs inputs of its own and something beyond inputs, and
		// the residual must keep real work too.
		let has_split_inputs = self
			.nodes
			.iter()
			.enumerate()
			.any(|(id, node)| matches!(node.kind, NodeKind::Input) && !dependent[id]);
		let has_split_actions = self
			.nodes
			.iter()
			.enumerate()
			.any(|(id, node)| !matches!(node.kind, NodeKind::Input) && !dependent[id]);
		let has_residual_actions = self
			.nodes
			.iter()
			.enumerate()
			.any(|(id, node)| !matches!(node.kind, NodeKind::Input) && dependent[id]);
		if !has_split_inputs || !has_split_actions || !has_residual_actions {
			return None;
		}

		let mut split = ExpressionGraph {
			settings: self.settings.clone(),
			..ExpressionGraph::default()
		};
		let mut split_ids: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
		for id in 0..self.nodes.len() {
			if dependent[id] {
				continue;
			}
			let node = &self.nodes[id];
			let children: Vec<NodeId> = node
				.children
				.iter()
				.map(|child| {
					debug_assert!(split_ids[child.0].is_some());
					split_ids[child.0].unwrap_or(NodeId(0))
				})
				.collect();
			let new_id = split.import_node(Node {
				kind: node.kind.clone(),
				result_name: node.result_name.clone(),
				result_type: node.result_type.clone(),
				column: node.column.clone(),
				children,
				superseded_by: None,
				allow_constant_folding: node.allow_constant_folding,
			});
			split_ids[id] = Some(new_id);
		}

		let mut residual = ExpressionGraph {
			settings: self.settings.clone(),
			..ExpressionGraph::default()
		};
		for (name, ty) in split.output_columns() {
			residual.import_node(Node {
				kind: NodeKind::Input,
				result_name: name,
				result_type: ty,
				column: None,
				children: Vec::new(),
				superseded_by: None,
				allow_constant_folding: true,
			});
		}

		let mut residual_ids: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
		for id in 0..self.nodes.len() {
			if !dependent[id] {
				continue;
			}
			let node = &self.nodes[id];

			let mut children = Vec::with_capacity(node.children.len());
			for child in &node.children {
				if dependent[child.0] {
					debug_assert!(residual_ids[child.0].is_some());
					children.push(residual_ids[child.0].unwrap_or(NodeId(0)));
					continue;
				}
				// A moved value is consumed through the boundary under
				// its current name.
				let child_node = &self.nodes[child.0];
				match residual.index.get(&child_node.result_name) {
					Some(bound) => children.push(*bound),
					None => children.push(residual.import_node(Node {
						kind: NodeKind::Input,
						result_name: child_node.result_name.clone(),
						result_type: child_node.result_type.clone(),
						column: None,
						children: Vec::new(),
						superseded_by: None,
						allow_constant_folding: true,
					})),
				}
			}

			let new_id = residual.import_node(Node {
				kind: node.kind.clone(),
				result_name: node.result_name.clone(),
				result_type: node.result_type.clone(),
				column: node.column.clone(),
				children,
				superseded_by: None,
				allow_constant_folding: node.allow_constant_folding,
			});
			residual_ids[id] = Some(new_id);
		}

		*self = residual;
		Some(split)
	}
}
