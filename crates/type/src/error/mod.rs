// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Stele

use std::fmt::{Display, Formatter};

pub mod diagnostic;

pub use diagnostic::Diagnostic;

#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.0.code, self.0.message)?;
		for note in &self.0.notes {
			write!(f, "\n{}", note)?;
		}
		Ok(())
	}
}

impl Error {
	pub fn diagnostic(self) -> Diagnostic {
		self.0
	}

	pub fn code(&self) -> &str {
		&self.0.code
	}

	/// Appends a note to the underlying diagnostic, e.g. the textual
	/// rendering of the instruction that was running when the error
	/// occurred.
	pub fn with_note(mut self, note: impl Into<String>) -> Self {
		self.0.notes.push(note.into());
		self
	}
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::Error($diagnostic))
	};
}
