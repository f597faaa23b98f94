use std::path::Path;

use nestopt::nest::{NestError, OptionalValue, Result, Value};
use serde::Serialize;

use crate::cmd::literal::{parse_value, render_value};

/// Read and parse a JSON value literal file.
pub(crate) fn read_literal(path: &Path) -> Result<Value> {
	let raw = std::fs::read(path)?;
	let json: serde_json::Value = serde_json::from_slice(&raw).map_err(|err| NestError::InvalidValueLiteral {
		reason: format!("{}: {err}", path.display()),
	})?;
	parse_value(&json)
}

/// Use a top-level optional literal as-is; wrap anything else.
pub(crate) fn into_optional(value: Value) -> OptionalValue {
	match value {
		Value::Optional(optional) => optional,
		other => OptionalValue::from_value(other),
	}
}

/// Read a literal file as an optional.
pub(crate) fn read_optional(path: &Path) -> Result<OptionalValue> {
	read_literal(path).map(into_optional)
}

/// Print a serializable payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	let text = serde_json::to_string_pretty(payload).map_err(std::io::Error::from)?;
	println!("{text}");
	Ok(())
}

/// JSON report shared by commands that produce an optional.
#[derive(Serialize)]
pub(crate) struct OptionalJson {
	pub(crate) has_value: bool,
	pub(crate) element_spec: String,
	pub(crate) value: serde_json::Value,
}

impl OptionalJson {
	pub(crate) fn new(optional: &OptionalValue) -> Result<Self> {
		Ok(Self {
			has_value: optional.has_value(),
			element_spec: optional.element_spec().to_string(),
			value: if optional.has_value() { render_value(&optional.get_value()?)? } else { serde_json::Value::Null },
		})
	}
}

/// Print an optional report as text or JSON.
pub(crate) fn print_optional(optional: &OptionalValue, json: bool) -> Result<()> {
	let report = OptionalJson::new(optional)?;
	if json {
		return emit_json(&report);
	}

	println!("has_value: {}", report.has_value);
	println!("element_spec: {}", report.element_spec);
	println!("value: {}", report.value);
	Ok(())
}
