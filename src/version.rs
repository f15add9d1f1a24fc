use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, VersionMachineError};

/// Matches a `__version__ = "X.Y.Z<phase>"` declaration with either quote style.
static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"__version__ = ['"](?P<major>[0-9]+)\.(?P<minor>[0-9]+)\.(?P<patch>[0-9]+)(?P<phase>[^'"]+)?['"]"#)
        .expect("declaration pattern is valid")
});

/// Matches a bare version string such as `1.2.3` or `1.2.3-rc1`.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<major>[0-9]+)\.(?P<minor>[0-9]+)\.(?P<patch>[0-9]+)(?P<phase>[^'"]*)$"#)
        .expect("version pattern is valid")
});

/// A non-negative decimal integer of any length.
///
/// Stored as its canonical digit string (no leading zeros), so components are
/// never truncated and bumping never overflows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber(String);

impl VersionNumber {
    pub fn zero() -> Self {
        VersionNumber("0".to_string())
    }

    /// Builds a number from a run of ASCII digits; callers guarantee the input is all digits.
    fn from_digits(digits: &str) -> Self {
        match digits.trim_start_matches('0') {
            "" => VersionNumber::zero(),
            trimmed => VersionNumber(trimmed.to_string()),
        }
    }

    /// Returns this number plus one.
    pub fn increment(&self) -> Self {
        let mut reversed = String::with_capacity(self.0.len() + 1);
        let mut carry = true;
        for digit in self.0.chars().rev() {
            match (carry, digit) {
                (true, '9') => reversed.push('0'),
                (true, d) => {
                    reversed.push(char::from(d as u8 + 1));
                    carry = false;
                }
                (false, d) => reversed.push(d),
            }
        }
        if carry {
            reversed.push('1');
        }
        VersionNumber(reversed.chars().rev().collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        VersionNumber::zero()
    }
}

impl From<u64> for VersionNumber {
    fn from(value: u64) -> Self {
        VersionNumber(value.to_string())
    }
}

impl FromStr for VersionNumber {
    type Err = VersionMachineError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionMachineError::invalid_version(format!(
                "'{}' is not a decimal number",
                s
            )));
        }
        Ok(VersionNumber::from_digits(s))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that `phase` can be written into a declaration and read back unchanged.
///
/// Quotes would close the declaration early and line breaks would split it.
/// A leading digit would be read back as part of the patch number.
pub fn parse_phase(phase: &str) -> Result<String> {
    if let Some(bad) = phase.chars().find(|c| matches!(c, '\'' | '"' | '\n' | '\r')) {
        return Err(VersionMachineError::invalid_version(format!(
            "phase '{}' contains {:?}, which cannot appear in a declaration",
            phase.escape_debug(),
            bad
        )));
    }
    if phase.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(VersionMachineError::invalid_version(format!(
            "phase '{}' must not start with a digit",
            phase
        )));
    }
    Ok(phase.to_string())
}

/// A version with numeric major, minor and patch components and a free-text phase suffix.
///
/// The phase is appended verbatim with no separator, so it carries its own
/// punctuation (`-rc1`, `.dev0`, `b2`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: VersionNumber,
    pub minor: VersionNumber,
    pub patch: VersionNumber,
    pub phase: String,
}

impl Version {
    /// Creates a new Version without a phase suffix.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major: major.into(),
            minor: minor.into(),
            patch: patch.into(),
            phase: String::new(),
        }
    }

    /// Returns this version with its phase replaced.
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    fn numeric_field(&self, kind: IncrementKind) -> Option<&VersionNumber> {
        match kind {
            IncrementKind::Major => Some(&self.major),
            IncrementKind::Minor => Some(&self.minor),
            IncrementKind::Patch => Some(&self.patch),
            IncrementKind::Phase => None,
        }
    }

    fn from_captures(captures: &regex::Captures<'_>) -> Self {
        let field = |name: &str| {
            captures
                .name(name)
                .map(|m| VersionNumber::from_digits(m.as_str()))
                .unwrap_or_default()
        };

        Version {
            major: field("major"),
            minor: field("minor"),
            patch: field("patch"),
            phase: captures
                .name("phase")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}{}",
            self.major, self.minor, self.patch, self.phase
        )
    }
}

impl FromStr for Version {
    type Err = VersionMachineError;

    fn from_str(s: &str) -> Result<Self> {
        let captures = VERSION_RE.captures(s.trim()).ok_or_else(|| {
            VersionMachineError::invalid_version(format!(
                "'{}' - expected MAJOR.MINOR.PATCH with an optional phase suffix",
                s
            ))
        })?;
        let version = Version::from_captures(&captures);
        parse_phase(&version.phase)?;
        Ok(version)
    }
}

/// Which version field a bump targets.
///
/// The discriminant is the field's rank: coarser fields have smaller ranks, and
/// bumping a field resets every numeric field of finer rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncrementKind {
    Major = 0,
    Minor = 1,
    Patch = 2,
    Phase = 3,
}

impl IncrementKind {
    pub const ALL: [IncrementKind; 4] = [
        IncrementKind::Major,
        IncrementKind::Minor,
        IncrementKind::Patch,
        IncrementKind::Phase,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            IncrementKind::Major => "MAJOR",
            IncrementKind::Minor => "MINOR",
            IncrementKind::Patch => "PATCH",
            IncrementKind::Phase => "PHASE",
        }
    }
}

impl fmt::Display for IncrementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IncrementKind {
    type Err = VersionMachineError;

    /// Accepts any casing of `major`, `minor`, `patch` or `phase`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        IncrementKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| VersionMachineError::InvalidIncrement(s.to_string()))
    }
}

/// An increment kind plus the phase value to set, if the caller supplied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementDirective {
    pub kind: IncrementKind,
    pub phase: Option<String>,
}

impl IncrementDirective {
    pub fn new(kind: IncrementKind) -> Self {
        IncrementDirective { kind, phase: None }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }
}

impl From<IncrementKind> for IncrementDirective {
    fn from(kind: IncrementKind) -> Self {
        IncrementDirective::new(kind)
    }
}

/// Computes the version that follows `current` under `directive`.
///
/// - An `override_version` is returned unchanged and bypasses all arithmetic.
/// - The field whose rank equals the directive's rank is incremented by one.
/// - Coarser fields are copied; finer numeric fields are reset to 0.
/// - The phase is carried through unless the directive supplies one.
///
/// # Example
/// ```
/// use version_machine::version::{compute_future_version, IncrementKind, Version};
///
/// let next = compute_future_version(&Version::new(0, 0, 1), &IncrementKind::Minor.into(), None);
/// assert_eq!(next.to_string(), "0.1.0");
/// ```
pub fn compute_future_version(
    current: &Version,
    directive: &IncrementDirective,
    override_version: Option<&Version>,
) -> Version {
    if let Some(forced) = override_version {
        return forced.clone();
    }

    let target_rank = directive.kind.rank();
    let next = |kind: IncrementKind| -> VersionNumber {
        let old = current.numeric_field(kind).cloned().unwrap_or_default();
        if kind.rank() == target_rank {
            old.increment()
        } else if kind.rank() > target_rank {
            VersionNumber::zero()
        } else {
            old
        }
    };

    Version {
        major: next(IncrementKind::Major),
        minor: next(IncrementKind::Minor),
        patch: next(IncrementKind::Patch),
        phase: directive
            .phase
            .clone()
            .unwrap_or_else(|| current.phase.clone()),
    }
}

/// The region of a target's content that declares its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSource {
    /// The exact declaration text as it appears in the content.
    pub text: String,
    pub version: Version,
}

impl VersionSource {
    /// Finds the first `__version__` declaration in `content`, or `None` when there is none.
    pub fn locate(content: &str) -> Option<Self> {
        let captures = DECLARATION_RE.captures(content)?;
        let whole = captures.get(0)?;

        Some(VersionSource {
            text: whole.as_str().to_string(),
            version: Version::from_captures(&captures),
        })
    }

    /// The declared version, or `0.0.0` when `source` is `None`.
    pub fn version_or_default(source: Option<&Self>) -> Version {
        source.map(|s| s.version.clone()).unwrap_or_default()
    }
}

/// Formats a version declaration, always with double quotes.
pub fn declaration(version_text: &str) -> String {
    format!("__version__ = \"{}\"", version_text)
}

/// Replaces the first occurrence of `current_source_text` with a declaration of `new_version_text`.
///
/// An empty `current_source_text` means the content had no declaration; the
/// content is returned unchanged rather than gaining a new one.
pub fn rewrite(content: &str, current_source_text: &str, new_version_text: &str) -> String {
    if current_source_text.is_empty() {
        return content.to_string();
    }
    content.replacen(current_source_text, &declaration(new_version_text), 1)
}
