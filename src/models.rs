use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Test categories & formats
// ---------------------------------------------------------------------------

/// Kind of coverage a generated test case targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TestCategory {
    Positive,
    Negative,
    #[serde(rename = "E2E", alias = "End-to-End")]
    EndToEnd,
    #[serde(rename = "Edge Case")]
    EdgeCase,
    Performance,
}

impl TestCategory {
    pub const ALL: [TestCategory; 5] = [
        TestCategory::Positive,
        TestCategory::Negative,
        TestCategory::EndToEnd,
        TestCategory::EdgeCase,
        TestCategory::Performance,
    ];

    /// Wire name, as used in JSON bodies and in prompts.
    pub fn as_str(self) -> &'static str {
        match self {
            TestCategory::Positive => "Positive",
            TestCategory::Negative => "Negative",
            TestCategory::EndToEnd => "E2E",
            TestCategory::EdgeCase => "Edge Case",
            TestCategory::Performance => "Performance",
        }
    }

    /// Parse a wire name. `End-to-End` is accepted as a synonym of `E2E`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "End-to-End" => Some(TestCategory::EndToEnd),
            _ => Self::ALL.into_iter().find(|c| c.as_str() == name),
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape requested for generated test cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TestFormat {
    /// Structured steps: imperative actions plus one expected result.
    Manual,
    /// Behavior-driven: Given / When / Then clause sequences.
    #[serde(rename = "BDD")]
    Bdd,
}

impl TestFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TestFormat::Manual => "Manual",
            TestFormat::Bdd => "BDD",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Manual" => Some(TestFormat::Manual),
            "BDD" => Some(TestFormat::Bdd),
            _ => None,
        }
    }
}

impl fmt::Display for TestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Generation request
// ---------------------------------------------------------------------------

/// A user story to turn into test cases.
///
/// Values of this type are produced by [`crate::schema::validate_request`], so
/// `story_title` / `acceptance_criteria` are non-blank and `categories` is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub story_title: String,
    pub acceptance_criteria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "jiraId")]
    pub issue_tracker_id: Option<String>,
    pub categories: Vec<TestCategory>,
    pub format: TestFormat,
}

// ---------------------------------------------------------------------------
// Test cases
// ---------------------------------------------------------------------------

/// One generated test case, discriminated by its `format` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "format")]
pub enum TestCase {
    #[serde(rename = "Manual", rename_all = "camelCase")]
    Manual {
        id: String,
        title: String,
        steps: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        test_data: Option<String>,
        expected_result: String,
        category: String,
    },
    #[serde(rename = "BDD", rename_all = "camelCase")]
    Bdd {
        id: String,
        title: String,
        given: Vec<String>,
        when: Vec<String>,
        then: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        test_data: Option<String>,
        category: String,
    },
}

impl TestCase {
    pub fn id(&self) -> &str {
        match self {
            TestCase::Manual { id, .. } | TestCase::Bdd { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TestCase::Manual { title, .. } | TestCase::Bdd { title, .. } => title,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            TestCase::Manual { category, .. } | TestCase::Bdd { category, .. } => category,
        }
    }

    pub fn format(&self) -> TestFormat {
        match self {
            TestCase::Manual { .. } => TestFormat::Manual,
            TestCase::Bdd { .. } => TestFormat::Bdd,
        }
    }
}

// ---------------------------------------------------------------------------
// Generation response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub app: String,
    pub uptime_seconds: u64,
    pub generation_service_configured: bool,
    pub issue_tracker_configured: bool,
}
