//! Runtime value holders for the test structure: tests, test parts, sections
//! and item references, plus the timing and session-control policies they
//! may declare.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::{ItemRefId, SectionId, TestId, TestPartId};

/// Returns `true` when `identifier` is a valid QTI identifier.
///
/// Identifiers start with a letter or underscore and continue with letters,
/// digits, `_`, `-` or `.`; a trailing `.` is not allowed.
pub fn is_valid_identifier(identifier: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("identifier pattern is a valid regex")
    });
    pattern.is_match(identifier) && !identifier.ends_with('.')
}

/// How a candidate may move between the items of a test part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    #[default]
    Linear,
    Nonlinear,
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Nonlinear => write!(f, "nonlinear"),
        }
    }
}

/// When candidate responses of a test part are submitted for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    #[default]
    Individual,
    Simultaneous,
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Simultaneous => write!(f, "simultaneous"),
        }
    }
}

/// Time constraint declared by one level of the structure.
///
/// Each declaring level is enforced independently by the session clock.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_time_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time_secs: Option<u64>,
    #[serde(default)]
    pub allow_late_submission: bool,
}

impl TimeLimits {
    pub fn new(min_time_secs: Option<u64>, max_time_secs: Option<u64>) -> Self {
        Self {
            min_time_secs,
            max_time_secs,
            allow_late_submission: false,
        }
    }

    /// Only an upper bound.
    pub fn max(secs: u64) -> Self {
        Self::new(None, Some(secs))
    }

    pub fn with_late_submission(mut self, allow: bool) -> Self {
        self.allow_late_submission = allow;
        self
    }

    pub fn min_time(&self) -> Option<Duration> {
        self.min_time_secs.map(Duration::from_secs)
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_secs.map(Duration::from_secs)
    }
}

/// Item session policy. Unset fields take the QTI defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSessionControl {
    /// `0` means unlimited attempts.
    pub max_attempts: u32,
    pub show_feedback: bool,
    pub allow_review: bool,
    pub show_solution: bool,
    pub allow_comment: bool,
    pub allow_skipping: bool,
    pub validate_responses: bool,
}

impl Default for ItemSessionControl {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            show_feedback: false,
            allow_review: true,
            show_solution: false,
            allow_comment: false,
            allow_skipping: true,
            validate_responses: false,
        }
    }
}

impl ItemSessionControl {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_allow_skipping(mut self, allow: bool) -> Self {
        self.allow_skipping = allow;
        self
    }

    pub fn with_allow_review(mut self, allow: bool) -> Self {
        self.allow_review = allow;
        self
    }

    pub fn with_validate_responses(mut self, validate: bool) -> Self {
        self.validate_responses = validate;
        self
    }

    pub fn is_unlimited_attempts(&self) -> bool {
        self.max_attempts == 0
    }
}

/// Opaque expression payload, stored verbatim for an external evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(serde_json::Value);

impl Expression {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A branch rule: when `condition` holds, the session jumps to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRule {
    pub target: String,
    pub condition: Expression,
}

impl BranchRule {
    pub fn new(target: impl Into<String>, condition: Expression) -> Self {
        Self {
            target: target.into(),
            condition,
        }
    }
}

/// The assessment test at the root of the structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub(crate) id: TestId,
    pub(crate) identifier: String,
    pub title: Option<String>,
    pub(crate) time_limits: Option<TimeLimits>,
    pub(crate) item_session_control: Option<ItemSessionControl>,
}

impl Test {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: TestId::new(),
            identifier: identifier.into(),
            title: None,
            time_limits: None,
            item_session_control: None,
        }
    }

    pub fn id(&self) -> TestId {
        self.id
    }
}

/// A test part, owned by one test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestPart {
    pub(crate) id: TestPartId,
    pub(crate) test: TestId,
    pub(crate) identifier: String,
    pub navigation_mode: NavigationMode,
    pub submission_mode: SubmissionMode,
    pub(crate) time_limits: Option<TimeLimits>,
    pub(crate) item_session_control: Option<ItemSessionControl>,
}

impl TestPart {
    /// Create a linear, individual test part belonging to `test`.
    pub fn new(test: &Test, identifier: impl Into<String>) -> Self {
        Self {
            id: TestPartId::new(),
            test: test.id,
            identifier: identifier.into(),
            navigation_mode: NavigationMode::default(),
            submission_mode: SubmissionMode::default(),
            time_limits: None,
            item_session_control: None,
        }
    }

    pub fn with_modes(mut self, navigation: NavigationMode, submission: SubmissionMode) -> Self {
        self.navigation_mode = navigation;
        self.submission_mode = submission;
        self
    }

    pub fn id(&self) -> TestPartId {
        self.id
    }

    /// Id of the owning test.
    pub fn test_id(&self) -> TestId {
        self.test
    }
}

/// A section, either directly under a test part or nested in another section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub(crate) id: SectionId,
    pub(crate) test_part: TestPartId,
    pub(crate) parent: Option<SectionId>,
    pub(crate) identifier: String,
    pub title: Option<String>,
    pub visible: bool,
    pub(crate) time_limits: Option<TimeLimits>,
    pub(crate) item_session_control: Option<ItemSessionControl>,
}

impl Section {
    /// Create a top-level section of `test_part`.
    pub fn new(test_part: &TestPart, identifier: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            test_part: test_part.id,
            parent: None,
            identifier: identifier.into(),
            title: None,
            visible: true,
            time_limits: None,
            item_session_control: None,
        }
    }

    /// Create a section nested inside `parent`.
    pub fn nested(parent: &Section, identifier: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            test_part: parent.test_part,
            parent: Some(parent.id),
            identifier: identifier.into(),
            title: None,
            visible: true,
            time_limits: None,
            item_session_control: None,
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn test_part_id(&self) -> TestPartId {
        self.test_part
    }

    pub fn parent_id(&self) -> Option<SectionId> {
        self.parent
    }
}

/// A reference to an assessment item, with the rules bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRef {
    pub(crate) id: ItemRefId,
    pub(crate) identifier: String,
    pub href: Option<String>,
    pub categories: Vec<String>,
    pub preconditions: Vec<Expression>,
    pub branch_rules: Vec<BranchRule>,
    pub(crate) time_limits: Option<TimeLimits>,
    pub(crate) item_session_control: Option<ItemSessionControl>,
}

impl ItemRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: ItemRefId::new(),
            identifier: identifier.into(),
            href: None,
            categories: Vec::new(),
            preconditions: Vec::new(),
            branch_rules: Vec::new(),
            time_limits: None,
            item_session_control: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for category in categories {
            let category = category.into();
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        self
    }

    pub fn with_precondition(mut self, precondition: Expression) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn with_branch_rule(mut self, rule: BranchRule) -> Self {
        self.branch_rules.push(rule);
        self
    }

    pub fn id(&self) -> ItemRefId {
        self.id
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
