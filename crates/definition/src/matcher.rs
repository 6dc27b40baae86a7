//! File name predicates.
//!
//! A [`FileMatcher`] decides whether a file belongs to a script definition.
//! Legacy templates match the file name against a regex; structured
//! descriptors and the standard definition match on a compound extension.

use std::fmt;
use std::path::Path;

use regex::Regex;
use thiserror::Error;

/// Default file name pattern for legacy templates.
pub const DEFAULT_FILE_PATTERN: &str = r".*\.kts";

/// Default extension for structured descriptors and the standard definition.
pub const DEFAULT_EXTENSION: &str = "kts";

/// Errors raised while building a matcher.
#[derive(Error, Debug, Clone)]
pub enum MatcherError {
	#[error("invalid file pattern '{pattern}': {reason}")]
	InvalidPattern { pattern: String, reason: String },

	#[error("file extension must not be empty")]
	EmptyExtension,
}

/// Predicate deciding whether a file name belongs to a definition.
#[derive(Clone)]
pub enum FileMatcher {
	/// The whole file name (last path component) must match the regex.
	Pattern(Regex),
	/// The file name ends with `.{extension}`; when `path_pattern` is set the
	/// whole given name must also match it.
	Extension {
		extension: String,
		path_pattern: Option<Regex>,
	},
}

impl FileMatcher {
	/// Builds a whole-name regex matcher.
	pub fn pattern(pattern: &str) -> Result<Self, MatcherError> {
		Ok(Self::Pattern(anchored(pattern)?))
	}

	/// Builds an extension matcher. A leading dot on `extension` is ignored.
	pub fn extension(extension: &str, path_pattern: Option<&str>) -> Result<Self, MatcherError> {
		let extension = extension.trim_start_matches('.');
		if extension.is_empty() {
			return Err(MatcherError::EmptyExtension);
		}
		Ok(Self::Extension {
			extension: extension.to_string(),
			path_pattern: path_pattern.map(anchored).transpose()?,
		})
	}

	/// Returns true if `name` (a file name or path) is matched.
	pub fn matches(&self, name: &str) -> bool {
		let file_name = file_name(name);
		match self {
			Self::Pattern(re) => re.is_match(file_name),
			Self::Extension {
				extension,
				path_pattern,
			} => {
				has_extension(file_name, extension)
					&& path_pattern.as_ref().is_none_or(|re| re.is_match(name))
			}
		}
	}
}

impl fmt::Debug for FileMatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
			Self::Extension {
				extension,
				path_pattern,
			} => f
				.debug_struct("Extension")
				.field("extension", extension)
				.field("path_pattern", &path_pattern.as_ref().map(Regex::as_str))
				.finish(),
		}
	}
}

fn anchored(pattern: &str) -> Result<Regex, MatcherError> {
	Regex::new(&format!("^(?:{pattern})$")).map_err(|e| MatcherError::InvalidPattern {
		pattern: pattern.to_string(),
		reason: e.to_string(),
	})
}

fn file_name(name: &str) -> &str {
	Path::new(name)
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or(name)
}

// `a.main.kts` has extension `main.kts`; `main.kts` alone does not.
fn has_extension(file_name: &str, extension: &str) -> bool {
	file_name
		.strip_suffix(extension)
		.and_then(|stem| stem.strip_suffix('.'))
		.is_some_and(|stem| !stem.is_empty())
}
