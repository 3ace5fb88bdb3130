//! Injected, read-only environment mapping for marker variables
//!
//! The engine never discovers platform attributes itself; the hosting tool
//! captures them once and hands the mapping in. A captured environment can be
//! serialized and replayed against markers on a different machine, which is
//! what makes cross-environment dependency resolution possible.

use serde::{Deserialize, Serialize};

use crate::expression::{MarkerVariable, ValueCategory};

/// The single capability the evaluator needs: resolve a variable to its value.
///
/// Resolution is total. Every variable in the closed set has either a real
/// resolved value or its category default, so lookups cannot fail.
pub trait Environment {
	fn resolve(&self, variable: MarkerVariable) -> &str;
}

impl<E: Environment + ?Sized> Environment for &E {
	fn resolve(&self, variable: MarkerVariable) -> &str {
		(**self).resolve(variable)
	}
}

/// A concrete environment mapping with one value per marker variable.
///
/// Hosts populate the fields from the interpreter and operating system they
/// resolve dependencies for. The two derived version fields
/// (`python_full_version`, `implementation_version`) follow the
/// `"{major}.{minor}.{micro}"` convention, with a single-letter release-level
/// suffix plus serial appended for non-final releases (e.g. `3.5.0b1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEnvironment {
	pub os_name: String,
	pub sys_platform: String,
	pub platform_release: String,
	pub platform_machine: String,
	pub platform_python_implementation: String,
	pub implementation_name: String,
	pub platform_version: String,
	pub platform_dist_name: String,
	pub platform_dist_version: String,
	pub platform_dist_id: String,
	pub python_version: String,
	pub python_full_version: String,
	pub implementation_version: String,
}

impl Default for MarkerEnvironment {
	/// The defined fallbacks for attributes the host could not determine:
	/// empty string for string-category variables, `"0"` for version-category
	/// variables
	fn default() -> Self {
		Self {
			os_name: String::new(),
			sys_platform: String::new(),
			platform_release: String::new(),
			platform_machine: String::new(),
			platform_python_implementation: String::new(),
			implementation_name: String::new(),
			platform_version: String::new(),
			platform_dist_name: String::new(),
			platform_dist_version: "0".to_string(),
			platform_dist_id: String::new(),
			python_version: "0".to_string(),
			python_full_version: "0".to_string(),
			implementation_version: "0".to_string(),
		}
	}
}

impl Environment for MarkerEnvironment {
	fn resolve(&self, variable: MarkerVariable) -> &str {
		match variable {
			MarkerVariable::OsName => &self.os_name,
			MarkerVariable::SysPlatform => &self.sys_platform,
			MarkerVariable::PlatformRelease => &self.platform_release,
			MarkerVariable::PlatformMachine => &self.platform_machine,
			MarkerVariable::PlatformPythonImplementation => &self.platform_python_implementation,
			MarkerVariable::ImplementationName => &self.implementation_name,
			MarkerVariable::PlatformVersion => &self.platform_version,
			MarkerVariable::PlatformDistName => &self.platform_dist_name,
			MarkerVariable::PlatformDistVersion => &self.platform_dist_version,
			MarkerVariable::PlatformDistId => &self.platform_dist_id,
			MarkerVariable::PythonVersion => &self.python_version,
			MarkerVariable::PythonFullVersion => &self.python_full_version,
			MarkerVariable::ImplementationVersion => &self.implementation_version,
		}
	}
}
