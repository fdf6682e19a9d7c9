//! Serializable test definition documents.
//!
//! A document describes a test whose selection and ordering have already been
//! applied: `content` lists are in presentation order, and an item listed
//! twice is presented twice.
//!
//! ```json
//! {
//!   "identifier": "T",
//!   "items": [{ "identifier": "Q01", "categories": ["math"] }],
//!   "test_parts": [{
//!     "identifier": "P1",
//!     "content": [{
//!       "kind": "section",
//!       "identifier": "S1",
//!       "content": [{ "kind": "item_ref", "identifier": "Q01" }]
//!     }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::model::{
    BranchRule, Expression, ItemSessionControl, NavigationMode, SubmissionMode, TimeLimits,
};

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDocument {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limits: Option<TimeLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_session_control: Option<ItemSessionControl>,
    /// Item references available to the test parts, referenced by identifier.
    #[serde(default)]
    pub items: Vec<ItemRefDocument>,
    pub test_parts: Vec<TestPartDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRefDocument {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limits: Option<TimeLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_session_control: Option<ItemSessionControl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branch_rules: Vec<BranchRule>,
}

impl ItemRefDocument {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            href: None,
            categories: Vec::new(),
            time_limits: None,
            item_session_control: None,
            preconditions: Vec::new(),
            branch_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPartDocument {
    pub identifier: String,
    #[serde(default)]
    pub navigation_mode: NavigationMode,
    #[serde(default)]
    pub submission_mode: SubmissionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limits: Option<TimeLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_session_control: Option<ItemSessionControl>,
    #[serde(default)]
    pub content: Vec<ContentDocument>,
}

impl TestPartDocument {
    pub fn new(identifier: impl Into<String>, content: Vec<ContentDocument>) -> Self {
        Self {
            identifier: identifier.into(),
            navigation_mode: NavigationMode::default(),
            submission_mode: SubmissionMode::default(),
            time_limits: None,
            item_session_control: None,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limits: Option<TimeLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_session_control: Option<ItemSessionControl>,
    #[serde(default)]
    pub content: Vec<ContentDocument>,
}

impl SectionDocument {
    pub fn new(identifier: impl Into<String>, content: Vec<ContentDocument>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            visible: true,
            time_limits: None,
            item_session_control: None,
            content,
        }
    }
}

/// One entry of a test part's or section's content, in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDocument {
    Section(SectionDocument),
    ItemRef { identifier: String },
}

impl ContentDocument {
    pub fn item(identifier: impl Into<String>) -> Self {
        ContentDocument::ItemRef {
            identifier: identifier.into(),
        }
    }
}
