//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a value literal under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Parse a fixture as JSON.
pub fn fixture_json(name: &str) -> serde_json::Value {
	let path = fixture_path(name);
	let raw = std::fs::read(&path).unwrap_or_else(|err| panic!("fixture {} is readable: {err}", path.display()));
	serde_json::from_slice(&raw).unwrap_or_else(|err| panic!("fixture {} is valid json: {err}", path.display()))
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Write `contents` to a per-test scratch file under the target directory.
///
/// Used for literals that only make sense inside one test, such as malformed input.
pub fn scratch_file(name: &str, contents: &str) -> PathBuf {
	let dir = target_dir().join("nestopt-scratch");
	std::fs::create_dir_all(&dir).unwrap_or_else(|err| panic!("scratch dir {} is creatable: {err}", dir.display()));
	let path = dir.join(name);
	std::fs::write(&path, contents).unwrap_or_else(|err| panic!("scratch file {} is writable: {err}", path.display()));
	path
}
