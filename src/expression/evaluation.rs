//! Evaluates a marker AST against an injected environment mapping

use std::cmp::Ordering;
use thiserror::Error;

use crate::environment::Environment;
use crate::expression::ast::{
	ComparisonOperator, LogicalOperator, MarkerExpr, Operand, ValueCategory,
};
use crate::version::{compare_versions, VersionParseError};

#[derive(Debug, PartialEq, Eq, Error)]
pub enum EvaluationError {
	#[error("version comparison failed: {0}")]
	Version(#[from] VersionParseError),
	/// Category-illegal operators are rejected at parse time, so this arm is
	/// unreachable for ASTs produced by [`crate::parse`]; reaching it means
	/// the AST was constructed by hand against the category rules.
	#[error("operator reached evaluation for an incompatible operand category: {op}")]
	UnsupportedOperator { op: String },
}

/// Walks the AST and returns the boolean the expression evaluates to.
///
/// Both branches of `and`/`or` are evaluated unconditionally: evaluation is
/// pure, so short-circuiting could only hide an error in the pruned branch.
pub fn evaluate(
	expression: &MarkerExpr<'_>,
	env: &impl Environment,
) -> Result<bool, EvaluationError> {
	match expression {
		MarkerExpr::Comparison {
			left,
			operator,
			right,
		} => {
			let lhs = resolve_operand(left, env);
			let rhs = resolve_operand(right, env);
			tracing::debug!(
				"comparing '{}' {} '{}' as {} operands",
				lhs,
				operator,
				rhs,
				left.category(),
			);
			match left.category() {
				ValueCategory::String => compare_strings(lhs, *operator, rhs),
				ValueCategory::Version => compare_version_operands(lhs, *operator, rhs),
			}
		}
		MarkerExpr::Logical {
			left,
			operator,
			right,
		} => {
			let left_value = evaluate(left, env)?;
			let right_value = evaluate(right, env)?;
			let result = match operator {
				LogicalOperator::And => left_value && right_value,
				LogicalOperator::Or => left_value || right_value,
			};
			tracing::trace!(
				"{} {} {} => {}",
				left_value,
				operator,
				right_value,
				result
			);
			Ok(result)
		}
		MarkerExpr::Group(inner) => evaluate(inner, env),
	}
}

/// Resolves an operand to its text: variables through the environment
/// (resolution is total; every variable has a value or its category default),
/// literals to their own text.
fn resolve_operand<'v>(operand: &Operand<'v>, env: &'v impl Environment) -> &'v str {
	match operand {
		Operand::Variable(variable) => env.resolve(*variable),
		Operand::StrLiteral(text) | Operand::VersionLiteral(text) => text,
	}
}

/// String comparator: exact, case-sensitive, no normalization.
/// `left in right` tests `left` for contiguous substring containment in `right`.
fn compare_strings(
	left: &str,
	operator: ComparisonOperator,
	right: &str,
) -> Result<bool, EvaluationError> {
	match operator {
		ComparisonOperator::Eq => Ok(left == right),
		ComparisonOperator::Ne => Ok(left != right),
		ComparisonOperator::In => Ok(right.contains(left)),
		ComparisonOperator::NotIn => Ok(!right.contains(left)),
		other => Err(EvaluationError::UnsupportedOperator {
			op: format!("`{}` on string operands", other),
		}),
	}
}

/// Version comparator dispatch: parse both sides as structured versions and
/// compare the resulting ordering against the operator
fn compare_version_operands(
	left: &str,
	operator: ComparisonOperator,
	right: &str,
) -> Result<bool, EvaluationError> {
	let ordering = compare_versions(left, right)?;
	match operator {
		ComparisonOperator::Eq => Ok(ordering == Ordering::Equal),
		ComparisonOperator::Ne => Ok(ordering != Ordering::Equal),
		ComparisonOperator::Lt => Ok(ordering == Ordering::Less),
		ComparisonOperator::Le => Ok(ordering != Ordering::Greater),
		ComparisonOperator::Gt => Ok(ordering == Ordering::Greater),
		ComparisonOperator::Ge => Ok(ordering != Ordering::Less),
		other => Err(EvaluationError::UnsupportedOperator {
			op: format!("`{}` on version operands", other),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::environment::MarkerEnvironment;
	use crate::expression::parsing::parse;

	fn linux_env() -> MarkerEnvironment {
		MarkerEnvironment {
			os_name: "posix".to_string(),
			sys_platform: "linux".to_string(),
			platform_machine: "x86_64".to_string(),
			python_version: "3.12".to_string(),
			python_full_version: "3.12.1".to_string(),
			..Default::default()
		}
	}

	fn eval(marker: &str, env: &MarkerEnvironment) -> Result<bool, EvaluationError> {
		evaluate(&parse(marker).unwrap(), env)
	}

	#[test]
	fn test_evaluate_platform_equality() {
		let mut env = linux_env();
		assert!(!eval("sys_platform == 'win32'", &env).unwrap());

		env.sys_platform = "win32".to_string();
		assert!(eval("sys_platform == 'win32'", &env).unwrap());
	}

	#[test]
	fn test_evaluate_or_of_exact_versions() {
		let marker = "python_version == '2.4' or python_version == '2.5'";
		for (version, expected) in [("2.4", true), ("2.5", true), ("2.6", false), ("3.12", false)]
		{
			let env = MarkerEnvironment {
				python_version: version.to_string(),
				..Default::default()
			};
			assert_eq!(eval(marker, &env).unwrap(), expected, "python_version = {}", version);
		}
	}

	#[test]
	fn test_evaluate_and_or_truth_tables() {
		let env = linux_env();
		// A = true, B = false
		let a = "os_name == 'posix'";
		let b = "os_name == 'nt'";

		assert!(eval(&format!("{} and {}", a, a), &env).unwrap());
		assert!(!eval(&format!("{} and {}", a, b), &env).unwrap());
		assert!(!eval(&format!("{} and {}", b, a), &env).unwrap());
		assert!(!eval(&format!("{} and {}", b, b), &env).unwrap());

		assert!(eval(&format!("{} or {}", a, a), &env).unwrap());
		assert!(eval(&format!("{} or {}", a, b), &env).unwrap());
		assert!(eval(&format!("{} or {}", b, a), &env).unwrap());
		assert!(!eval(&format!("{} or {}", b, b), &env).unwrap());
	}

	#[test]
	fn test_evaluate_grouping_changes_result() {
		// A = true, B = false, C = false: `A or B and C` is true,
		// `(A or B) and C` is false
		let env = linux_env();
		let a = "os_name == 'posix'";
		let b = "os_name == 'nt'";
		let c = "sys_platform == 'win32'";

		assert!(eval(&format!("{} or {} and {}", a, b, c), &env).unwrap());
		assert!(!eval(&format!("({} or {}) and {}", a, b, c), &env).unwrap());
	}

	#[test]
	fn test_evaluate_substring_membership() {
		let env = MarkerEnvironment {
			sys_platform: "freebsd14".to_string(),
			..Default::default()
		};
		assert!(eval("'bsd' in sys_platform", &env).unwrap());
		assert!(!eval("'linux' in sys_platform", &env).unwrap());
		assert!(eval("'linux' not in sys_platform", &env).unwrap());

		// Membership direction: left tested as substring of right
		assert!(eval("sys_platform in 'freebsd14-stable'", &env).unwrap());
	}

	#[test]
	fn test_evaluate_string_comparison_is_exact() {
		let env = linux_env();
		// No case folding, no trimming
		assert!(!eval("os_name == 'POSIX'", &env).unwrap());
		assert!(!eval("os_name == ' posix'", &env).unwrap());
		assert!(eval("os_name != 'POSIX'", &env).unwrap());
	}

	#[test]
	fn test_evaluate_version_ordering_not_lexical() {
		let env = MarkerEnvironment {
			python_version: "3.10".to_string(),
			..Default::default()
		};
		// Lexically "3.10" < "3.9"; numerically it is greater
		assert!(eval("python_version > '3.9'", &env).unwrap());
		assert!(eval("python_version >= '3.10'", &env).unwrap());
		assert!(eval("python_version <= '3.10'", &env).unwrap());
		assert!(eval("python_version < '3.11'", &env).unwrap());
		assert!(eval("python_version == '3.10.0'", &env).unwrap());
		assert!(eval("python_version != '3.9'", &env).unwrap());
	}

	#[test]
	fn test_evaluate_default_environment_fallbacks() {
		let env = MarkerEnvironment::default();
		// Unresolvable string variables default to the empty string
		assert!(eval("platform_dist_name == ''", &env).unwrap());
		// Unresolvable version variables default to "0"
		assert!(eval("platform_dist_version == '0'", &env).unwrap());
	}

	#[test]
	fn test_evaluate_malformed_version_literal_is_an_error() {
		let env = linux_env();
		assert!(matches!(
			eval("python_version >= 'not-a-version'", &env),
			Err(EvaluationError::Version(_))
		));
	}

	#[test]
	fn test_evaluate_does_not_short_circuit() {
		let env = linux_env();
		// The left branch is already true; a short-circuiting `or` would
		// return before noticing the malformed literal on the right
		assert!(matches!(
			eval(
				"sys_platform == 'linux' or python_version == 'bogus!'",
				&env
			),
			Err(EvaluationError::Version(_))
		));
		// Same for a false left branch under `and`
		assert!(matches!(
			eval(
				"sys_platform == 'win32' and python_version == 'bogus!'",
				&env
			),
			Err(EvaluationError::Version(_))
		));
	}

	#[test]
	fn test_unsupported_operator_on_hand_built_ast() {
		// Bypasses the parser's category checks on purpose
		let expr = MarkerExpr::Comparison {
			left: Operand::StrLiteral("a"),
			operator: ComparisonOperator::Lt,
			right: Operand::StrLiteral("b"),
		};
		assert!(matches!(
			evaluate(&expr, &MarkerEnvironment::default()),
			Err(EvaluationError::UnsupportedOperator { .. })
		));
	}
}
