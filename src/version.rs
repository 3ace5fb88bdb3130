//! Structured version identifiers and their total order
//!
//! Lexical comparison of version strings gives wrong answers (`"2.10"` sorts
//! before `"2.9"`, `"1.0rc10"` before `"1.0rc2"`). Versions are therefore
//! parsed into a release/pre/post/dev tuple and compared segment-wise
//! numerically.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version identifier: `{input}`")]
pub struct VersionParseError {
	pub input: String,
}

/// Pre-release phases in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreReleaseKind {
	Alpha,
	Beta,
	ReleaseCandidate,
}

impl PreReleaseKind {
	const fn lexeme(self) -> &'static str {
		match self {
			PreReleaseKind::Alpha => "a",
			PreReleaseKind::Beta => "b",
			PreReleaseKind::ReleaseCandidate => "rc",
		}
	}
}

/// Accepted pre-release spellings, longest first so `alpha` is never read as
/// `a` followed by garbage
const PRE_MARKERS: &[(&str, PreReleaseKind)] = &[
	("preview", PreReleaseKind::ReleaseCandidate),
	("alpha", PreReleaseKind::Alpha),
	("beta", PreReleaseKind::Beta),
	("pre", PreReleaseKind::ReleaseCandidate),
	("rc", PreReleaseKind::ReleaseCandidate),
	("a", PreReleaseKind::Alpha),
	("b", PreReleaseKind::Beta),
	("c", PreReleaseKind::ReleaseCandidate),
];

const POST_MARKERS: &[&str] = &["post", "rev", "r"];

/// A parsed version identifier: dotted release segments plus optional
/// pre-release, post-release and dev-release markers.
///
/// Equality is defined on the normalized tuple, so `"1.0"`, `"1.00"` and
/// `"1.0.0"` are all equal.
#[derive(Debug, Clone)]
pub struct Version {
	release: Vec<u64>,
	pre: Option<(PreReleaseKind, u64)>,
	post: Option<u64>,
	dev: Option<u64>,
}

impl Version {
	pub fn release(&self) -> &[u64] {
		&self.release
	}

	pub fn is_prerelease(&self) -> bool {
		self.pre.is_some() || self.dev.is_some()
	}
}

/// Pre-release ordering key: a dev-only version sorts before any pre-release
/// of the same release, and every pre-release sorts before the final release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
	DevOnly,
	Pre(PreReleaseKind, u64),
	Final,
}

/// Dev ordering key: a dev release sorts before the release it leads up to
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
	Dev(u64),
	Release,
}

impl Version {
	fn pre_key(&self) -> PreKey {
		match self.pre {
			Some((kind, number)) => PreKey::Pre(kind, number),
			None if self.dev.is_some() && self.post.is_none() => PreKey::DevOnly,
			None => PreKey::Final,
		}
	}

	fn post_key(&self) -> (bool, u64) {
		match self.post {
			Some(number) => (true, number),
			None => (false, 0),
		}
	}

	fn dev_key(&self) -> DevKey {
		match self.dev {
			Some(number) => DevKey::Dev(number),
			None => DevKey::Release,
		}
	}
}

/// Release segments compare element-wise numerically with missing trailing
/// segments treated as zero
fn compare_release(left: &[u64], right: &[u64]) -> Ordering {
	let len = left.len().max(right.len());
	for i in 0..len {
		let l = left.get(i).copied().unwrap_or(0);
		let r = right.get(i).copied().unwrap_or(0);
		match l.cmp(&r) {
			Ordering::Equal => continue,
			ordering => return ordering,
		}
	}
	Ordering::Equal
}

impl PartialEq for Version {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Version {}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		compare_release(&self.release, &other.release)
			.then_with(|| self.pre_key().cmp(&other.pre_key()))
			.then_with(|| self.post_key().cmp(&other.post_key()))
			.then_with(|| self.dev_key().cmp(&other.dev_key()))
	}
}

/// Consumes a leading run of ASCII digits, rejecting values that overflow u64
fn take_number(rest: &mut &str) -> Option<u64> {
	let digits_len = rest
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(rest.len());
	if digits_len == 0 {
		return None;
	}
	let (digits, tail) = rest.split_at(digits_len);
	let number = digits.parse().ok()?;
	*rest = tail;
	Some(number)
}

/// Markers may be joined with an optional `.`, `-` or `_` separator
fn strip_separator(rest: &str) -> &str {
	rest.strip_prefix(['.', '-', '_']).unwrap_or(rest)
}

impl FromStr for Version {
	type Err = VersionParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || VersionParseError {
			input: s.to_string(),
		};

		let lower = s.trim().to_ascii_lowercase();
		let mut rest: &str = lower.strip_prefix('v').unwrap_or(&lower);

		// Release segments: digits ('.' digits)*
		let mut release = vec![take_number(&mut rest).ok_or_else(err)?];
		while let Some(tail) = rest.strip_prefix('.') {
			if !tail.starts_with(|c: char| c.is_ascii_digit()) {
				// A suffix marker follows, e.g. `.post1` or `.dev2`
				break;
			}
			let mut cursor = tail;
			let segment = take_number(&mut cursor).ok_or_else(err)?;
			release.push(segment);
			rest = cursor;
		}

		// Optional pre-release marker, numeric suffix defaults to 0
		let mut pre = None;
		{
			let candidate = strip_separator(rest);
			for (marker, kind) in PRE_MARKERS {
				if let Some(tail) = candidate.strip_prefix(marker) {
					let mut cursor = strip_separator(tail);
					let number = take_number(&mut cursor).unwrap_or(0);
					pre = Some((*kind, number));
					rest = cursor;
					break;
				}
			}
		}

		// Optional post-release marker
		let mut post = None;
		{
			let candidate = strip_separator(rest);
			for marker in POST_MARKERS {
				if let Some(tail) = candidate.strip_prefix(marker) {
					let mut cursor = strip_separator(tail);
					let number = take_number(&mut cursor).unwrap_or(0);
					post = Some(number);
					rest = cursor;
					break;
				}
			}
		}

		// Optional dev-release marker
		let mut dev = None;
		{
			let candidate = strip_separator(rest);
			if let Some(tail) = candidate.strip_prefix("dev") {
				let mut cursor = strip_separator(tail);
				let number = take_number(&mut cursor).unwrap_or(0);
				dev = Some(number);
				rest = cursor;
			}
		}

		if !rest.is_empty() {
			return Err(err());
		}

		Ok(Version {
			release,
			pre,
			post,
			dev,
		})
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
		write!(f, "{}", release.join("."))?;
		if let Some((kind, number)) = self.pre {
			write!(f, "{}{}", kind.lexeme(), number)?;
		}
		if let Some(number) = self.post {
			write!(f, ".post{}", number)?;
		}
		if let Some(number) = self.dev {
			write!(f, ".dev{}", number)?;
		}
		Ok(())
	}
}

/// Total-order comparison between two version identifier strings.
/// This is the comparator the evaluator uses for version-category operands.
pub fn compare_versions(left: &str, right: &str) -> Result<Ordering, VersionParseError> {
	let left: Version = left.parse()?;
	let right: Version = right.parse()?;
	Ok(left.cmp(&right))
}
