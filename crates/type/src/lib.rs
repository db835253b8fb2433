// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

pub mod error;
pub mod fragment;
pub mod value;

pub use error::{Error, Result, diagnostic};
pub use fragment::Fragment;
pub use value::{Value, r#type::Type};
