//! Parser and evaluator for environment marker expressions.
//!
//! An environment marker is a boolean expression attached to a dependency
//! declaration that decides, at install time, whether that dependency applies
//! to the current execution environment:
//!
//! ```text
//! sys_platform == 'win32' and python_version < '3.11'
//! ```
//!
//! The engine is a pure pipeline: [`tokenize`] turns the expression into a
//! token stream, [`parse`] builds an AST with fixed precedence
//! (`or` < `and` < comparison < grouping), and [`evaluate`] walks the AST
//! against an injected [`Environment`] mapping. Version-category operands are
//! compared through the structured order in [`version`], never lexically.
//!
//! The crate never reads platform attributes itself; hosts capture a
//! [`MarkerEnvironment`] once and hand it in. All components are pure
//! functions over immutable inputs and are freely callable from concurrent
//! threads.
//!
//! ```
//! use env_markers::{eval_marker, MarkerEnvironment};
//!
//! let env = MarkerEnvironment {
//! 	sys_platform: "linux".to_string(),
//! 	python_version: "3.12".to_string(),
//! 	..Default::default()
//! };
//! assert!(eval_marker("sys_platform == 'linux' and python_version >= '3.8'", &env).unwrap());
//! ```

pub mod environment;
pub mod expression;
pub mod version;

pub use environment::{Environment, MarkerEnvironment};
pub use expression::{
	evaluate, parse, tokenize, ComparisonOperator, EvaluationError, LogicalOperator, MarkerExpr,
	MarkerVariable, Operand, ParseError, Token, ValueCategory,
};
pub use version::{compare_versions, PreReleaseKind, Version, VersionParseError};

use thiserror::Error;

/// Umbrella error for the one-shot [`eval_marker`] entry point
#[derive(Debug, PartialEq, Eq, Error)]
pub enum MarkerError {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error(transparent)]
	Evaluation(#[from] EvaluationError),
}

/// Parses and evaluates a marker expression in one call.
///
/// Every failure is a hard error: a syntactically invalid marker or a
/// malformed version literal never silently evaluates to a default boolean.
/// A dependency resolver integrating this engine should treat any error as a
/// resolution failure rather than skip the requirement.
pub fn eval_marker(expression: &str, env: &impl Environment) -> Result<bool, MarkerError> {
	tracing::debug!("evaluating marker expression: {}", expression);
	let expr = parse(expression)?;
	Ok(evaluate(&expr, env)?)
}
