//! This module defines the token stream and abstract syntax tree for marker expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens produced by the lexer, consumed left-to-right by the parser.
/// The stream always ends with `End` to simplify parser lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
	Ident(&'a str),
	Str(&'a str),
	Op(ComparisonOperator),
	And,
	Or,
	LParen,
	RParen,
	End,
}

/// The two comparison domains a marker variable belongs to.
/// String-category operands compare textually, version-category operands
/// compare through the structured version order in [`crate::version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueCategory {
	String,
	Version,
}

impl fmt::Display for ValueCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValueCategory::String => write!(f, "string"),
			ValueCategory::Version => write!(f, "version"),
		}
	}
}

/// The closed set of recognized marker variable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerVariable {
	OsName,
	SysPlatform,
	PlatformRelease,
	PlatformMachine,
	PlatformPythonImplementation,
	ImplementationName,
	PlatformVersion,
	PlatformDistName,
	PlatformDistVersion,
	PlatformDistId,
	PythonVersion,
	PythonFullVersion,
	ImplementationVersion,
}

impl MarkerVariable {
	/// Every recognized variable, in declaration order
	pub const ALL: [MarkerVariable; 13] = [
		MarkerVariable::OsName,
		MarkerVariable::SysPlatform,
		MarkerVariable::PlatformRelease,
		MarkerVariable::PlatformMachine,
		MarkerVariable::PlatformPythonImplementation,
		MarkerVariable::ImplementationName,
		MarkerVariable::PlatformVersion,
		MarkerVariable::PlatformDistName,
		MarkerVariable::PlatformDistVersion,
		MarkerVariable::PlatformDistId,
		MarkerVariable::PythonVersion,
		MarkerVariable::PythonFullVersion,
		MarkerVariable::ImplementationVersion,
	];

	/// Resolves a bare identifier to a variable, or `None` for names outside
	/// the closed set
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"os_name" => Some(MarkerVariable::OsName),
			"sys_platform" => Some(MarkerVariable::SysPlatform),
			"platform_release" => Some(MarkerVariable::PlatformRelease),
			"platform_machine" => Some(MarkerVariable::PlatformMachine),
			"platform_python_implementation" => Some(MarkerVariable::PlatformPythonImplementation),
			"implementation_name" => Some(MarkerVariable::ImplementationName),
			"platform_version" => Some(MarkerVariable::PlatformVersion),
			"platform_dist_name" => Some(MarkerVariable::PlatformDistName),
			"platform_dist_version" => Some(MarkerVariable::PlatformDistVersion),
			"platform_dist_id" => Some(MarkerVariable::PlatformDistId),
			"python_version" => Some(MarkerVariable::PythonVersion),
			"python_full_version" => Some(MarkerVariable::PythonFullVersion),
			"implementation_version" => Some(MarkerVariable::ImplementationVersion),
			_ => None,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			MarkerVariable::OsName => "os_name",
			MarkerVariable::SysPlatform => "sys_platform",
			MarkerVariable::PlatformRelease => "platform_release",
			MarkerVariable::PlatformMachine => "platform_machine",
			MarkerVariable::PlatformPythonImplementation => "platform_python_implementation",
			MarkerVariable::ImplementationName => "implementation_name",
			MarkerVariable::PlatformVersion => "platform_version",
			MarkerVariable::PlatformDistName => "platform_dist_name",
			MarkerVariable::PlatformDistVersion => "platform_dist_version",
			MarkerVariable::PlatformDistId => "platform_dist_id",
			MarkerVariable::PythonVersion => "python_version",
			MarkerVariable::PythonFullVersion => "python_full_version",
			MarkerVariable::ImplementationVersion => "implementation_version",
		}
	}

	/// The comparison domain of the variable. Fixed per variable; it decides
	/// which comparator the evaluator dispatches to.
	pub const fn category(self) -> ValueCategory {
		match self {
			MarkerVariable::PythonVersion
			| MarkerVariable::PythonFullVersion
			| MarkerVariable::ImplementationVersion
			| MarkerVariable::PlatformDistVersion => ValueCategory::Version,
			_ => ValueCategory::String,
		}
	}
}

impl fmt::Display for MarkerVariable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// Marker comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	In,
	NotIn,
}

impl ComparisonOperator {
	pub const fn lexeme(self) -> &'static str {
		match self {
			ComparisonOperator::Eq => "==",
			ComparisonOperator::Ne => "!=",
			ComparisonOperator::Lt => "<",
			ComparisonOperator::Le => "<=",
			ComparisonOperator::Gt => ">",
			ComparisonOperator::Ge => ">=",
			ComparisonOperator::In => "in",
			ComparisonOperator::NotIn => "not in",
		}
	}

	/// Whether the operator is legal for the given comparison domain.
	/// Substring membership only makes sense for strings; ordering only for
	/// versions.
	pub const fn supported_for(self, category: ValueCategory) -> bool {
		match category {
			ValueCategory::String => matches!(
				self,
				ComparisonOperator::Eq
					| ComparisonOperator::Ne
					| ComparisonOperator::In
					| ComparisonOperator::NotIn
			),
			ValueCategory::Version => matches!(
				self,
				ComparisonOperator::Eq
					| ComparisonOperator::Ne
					| ComparisonOperator::Lt
					| ComparisonOperator::Le
					| ComparisonOperator::Gt
					| ComparisonOperator::Ge
			),
		}
	}
}

impl fmt::Display for ComparisonOperator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.lexeme())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
	And,
	Or,
}

impl fmt::Display for LogicalOperator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LogicalOperator::And => write!(f, "and"),
			LogicalOperator::Or => write!(f, "or"),
		}
	}
}

/// One side of a comparison. A literal's variant is fixed at parse time from
/// its grammar position (the category of the variable it faces), not from its
/// own syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
	Variable(MarkerVariable),
	StrLiteral(&'a str),
	VersionLiteral(&'a str),
}

impl Operand<'_> {
	pub fn category(&self) -> ValueCategory {
		match self {
			Operand::Variable(variable) => variable.category(),
			Operand::StrLiteral(_) => ValueCategory::String,
			Operand::VersionLiteral(_) => ValueCategory::Version,
		}
	}
}

impl fmt::Display for Operand<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Operand::Variable(variable) => write!(f, "{}", variable),
			Operand::StrLiteral(text) | Operand::VersionLiteral(text) => {
				if text.contains('\'') {
					write!(f, "\"{}\"", text)
				} else {
					write!(f, "'{}'", text)
				}
			}
		}
	}
}

/// Marker expression AST. Parenthesized sub-expressions are kept as `Group`
/// nodes so that re-serializing an AST reproduces the grouping it was parsed
/// with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerExpr<'a> {
	Comparison {
		left: Operand<'a>,
		operator: ComparisonOperator,
		right: Operand<'a>,
	},
	Logical {
		left: Box<MarkerExpr<'a>>,
		operator: LogicalOperator,
		right: Box<MarkerExpr<'a>>,
	},
	Group(Box<MarkerExpr<'a>>),
}

impl fmt::Display for MarkerExpr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MarkerExpr::Comparison {
				left,
				operator,
				right,
			} => write!(f, "{} {} {}", left, operator, right),
			MarkerExpr::Logical {
				left,
				operator,
				right,
			} => write!(f, "{} {} {}", left, operator, right),
			MarkerExpr::Group(inner) => write!(f, "({})", inner),
		}
	}
}
