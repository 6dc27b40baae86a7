//! Definition search path configuration.

use std::path::PathBuf;

/// Path-list environment variable with extra definition roots.
pub const DEFINITIONS_PATH_ENV: &str = "KSCRIPT_DEFINITIONS_PATH";

/// Returns the directories searched for definitions, most specific first.
///
/// Order: `KSCRIPT_DEFINITIONS_PATH` entries, user config dir, then
/// locations relative to the executable. Entries are not checked for
/// existence.
pub fn definition_search_paths() -> Vec<PathBuf> {
	let mut paths = Vec::new();

	if let Some(list) = std::env::var_os(DEFINITIONS_PATH_ENV) {
		paths.extend(std::env::split_paths(&list).filter(|p| !p.as_os_str().is_empty()));
	}

	// ~/.config/kscript/definitions
	if let Some(config_dir) = dirs::config_dir() {
		paths.push(config_dir.join("kscript").join("definitions"));
	}

	if let Ok(exe_path) = std::env::current_exe() {
		if let Some(exe_dir) = exe_path.parent() {
			paths.push(exe_dir.join("definitions"));
			// Installed layout: <prefix>/bin/exe, <prefix>/share/kscript/definitions
			paths.push(exe_dir.join("..").join("share").join("kscript").join("definitions"));
		}
	}

	paths
}
