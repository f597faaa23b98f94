#![allow(missing_docs)]

use std::process::{Command, Output};

use nestopt_testkit::{fixture_json, fixture_path, scratch_file};
use serde_json::{Value, json};

#[test]
fn describe_reports_descriptor_and_slots() {
	let json = run_json(&["describe", &fixture("nest.json"), "--json"]);

	assert_eq!(json["kind"], "mapping");
	assert_eq!(json["descriptor"], "{a: float32[], b: (string[1], string[])}");
	assert_eq!(json["num_slots"], 3);
	assert_eq!(json["slot_specs"], json!(["float32[]", "string[1]", "string[]"]));
}

#[test]
fn describe_sparse_leaves_take_one_slot_each() {
	let json = run_json(&["describe", &fixture("sparse.json"), "--json"]);

	assert_eq!(json["descriptor"], "(sparse int64[1], sparse float32[2,2])");
	assert_eq!(json["slot_specs"], json!(["sparse int64[1]", "sparse float32[2,2]"]));
}

#[test]
fn wrap_reports_single_variant_slot() {
	let json = run_json(&["wrap", &fixture("scalar.json"), "--json"]);

	assert_eq!(json["has_value"], true);
	assert_eq!(json["element_spec"], "float32[]");
	assert_eq!(json["descriptor"], "optional(float32[])");
	assert_eq!(json["num_slots"], 1);
	assert_eq!(json["slot_spec"], "variant[]");
	assert_eq!(json["compression"], "none");
	assert!(json["wire_bytes"].as_u64().is_some_and(|bytes| bytes > 0));
}

#[test]
fn wrap_empty_builds_absent_optional() {
	let json = run_json(&["wrap", "--empty", "float32[]", "--json"]);

	assert_eq!(json["has_value"], false);
	assert_eq!(json["element_spec"], "float32[]");
	assert_eq!(json["slot_spec"], "variant[]");
}

#[test]
fn roundtrip_preserves_nested_optionals() {
	for name in ["nest.json", "sparse.json", "nested_a.json", "empty_pair.json", "device_copy.json"] {
		for compress in [false, true] {
			let path = fixture(name);
			let mut args = vec!["roundtrip", path.as_str(), "--json"];
			if compress {
				args.push("--compress");
			}
			let json = run_json(&args);
			assert_eq!(json["identical"], true, "{name} compress={compress}");
			assert_eq!(json["compression"], if compress { "zstd" } else { "none" });
		}
	}
}

#[test]
fn roundtrip_echoes_device_copy_payload() {
	let json = run_json(&["roundtrip", &fixture("device_copy.json"), "--json"]);

	assert_eq!(json["decoded"]["has_value"], true);
	assert_eq!(json["decoded"]["value"], fixture_json("device_copy.json"));
}

#[test]
fn add_sums_present_optionals() {
	let json = run_json(&["add", &fixture("pair_a.json"), &fixture("pair_b.json"), "--json"]);

	assert_eq!(json["has_value"], true);
	assert_eq!(json["element_spec"], "(float32[], float32[])");
	assert_eq!(json["value"], json!([4.0, 6.0]));
}

#[test]
fn add_recurses_into_nested_optionals() {
	let json = run_json(&["add", &fixture("nested_a.json"), &fixture("nested_b.json"), "--json"]);

	assert_eq!(json["value"][0], json!(11.0));
	assert_eq!(json["value"][1]["optional"], json!({"tensor": {"dtype": "float32", "shape": [2], "data": [4.0, 6.0]}}));
}

#[test]
fn add_of_absent_optionals_is_absent() {
	let json = run_json(&["add", &fixture("empty_pair.json"), &fixture("empty_pair.json"), "--json"]);

	assert_eq!(json["has_value"], false);
	assert_eq!(json["value"], Value::Null);
}

#[test]
fn add_rejects_presence_mismatch() {
	let output = run(&["add", &fixture("pair_a.json"), &fixture("empty_pair.json"), "--json"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("presence mismatch"));
}

#[test]
fn zeros_keeps_structure_and_absence() {
	let json = run_json(&["zeros", &fixture("pair_a.json"), "--json"]);
	assert_eq!(json["value"], json!([0.0, 0.0]));

	let json = run_json(&["zeros", &fixture("empty_pair.json"), "--json"]);
	assert_eq!(json["has_value"], false);
	assert_eq!(json["element_spec"], "(float32[], float32[])");
}

#[test]
fn check_reports_compatibility_and_common_descriptor() {
	let json = run_json(&["check", "int32[3]", "int32[5]", "--json"]);
	assert_eq!(json["compatible"], false);
	assert_eq!(json["common"], "int32[?]");

	let json = run_json(&["check", "optional(float32[])", "float32[]", "--json"]);
	assert_eq!(json["compatible"], false);
	assert_eq!(json["common"], Value::Null);
}

#[test]
fn malformed_input_exits_with_error() {
	let path = scratch_file("cli_bad_literal.json", r#"{"tensor": {"dtype": "complex64", "data": []}}"#);
	let output = run(&["describe", &path.display().to_string()]);

	assert_eq!(output.status.code(), Some(1));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.starts_with("error: invalid value literal"), "unexpected stderr: {stderr}");

	let output = run(&["check", "float32[", "float32[]"]);
	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&output.stderr).contains("invalid descriptor"));
}

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_nestopt"))
		.args(args)
		.env_remove("RUST_LOG")
		.output()
		.expect("command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(
		output.status.success(),
		"nestopt {args:?} failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn fixture(name: &str) -> String {
	let path = fixture_path(name);
	assert!(path.exists(), "missing fixture {}", path.display());
	path.display().to_string()
}
