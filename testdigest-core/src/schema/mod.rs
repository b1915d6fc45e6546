// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The raw report schema and its validator.
//!
//! Reports arrive as loosely-structured JSON whose shape drifts across tool versions. The
//! validator in this module checks a decoded [`serde_json::Value`] once, up front, and produces
//! a fully-typed [`RawReport`]. Everything downstream operates on typed fields.

mod model;
mod validate;

pub use model::*;
pub use validate::validate;
