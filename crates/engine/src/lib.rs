// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Stele

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod chain;
pub mod expression;
pub mod function;
pub mod program;
mod settings;

pub use chain::{ArrayJoinSpec, ExpressionChain, JoinSpec, Step};
pub use expression::{ExpressionGraph, NodeId};
pub use program::{ExpressionProgram, smallest_column};
pub use settings::EngineSettings;
pub use stele_type::{Error, Result};
