//! Prompt construction for test-case generation.
//!
//! Everything here is pure string assembly: identical requests always yield
//! byte-identical prompts.

use crate::models::{GenerationRequest, TestFormat};

/// Fixed instructions sent as the system message for every request.
pub const SYSTEM_PROMPT: &str = r#"You are a senior QA engineer who writes thorough, precise test cases from user stories. You produce test cases either as Manual (structured steps) or as BDD (Gherkin clauses).

You MUST answer with a single JSON object and nothing else. Its shape depends on the requested format.

Manual format:
{
  "cases": [
    {
      "id": "TC-001",
      "title": "string",
      "format": "Manual",
      "steps": ["string"],
      "testData": "string (optional)",
      "expectedResult": "string",
      "category": "string"
    }
  ]
}

BDD format:
{
  "cases": [
    {
      "id": "TC-001",
      "title": "string",
      "format": "BDD",
      "testData": "string (optional)",
      "category": "string",
      "given": ["string"],
      "when": ["string"],
      "then": ["string"]
    }
  ]
}

Rules:
- Number test case ids sequentially: TC-001, TC-002, ...
- Set "category" to the test category the case covers.
- Manual cases:
  * Write short imperative steps that each perform one action or check.
  * Example steps: ["Open the login page", "Enter valid credentials", "Press the Sign in button"]
- BDD cases:
  * "given" holds preconditions. The first entry starts with "Given", later entries start with "And".
  * "when" holds actions. The first entry starts with "When", later entries start with "And".
  * "then" holds outcomes. The first entry starts with "Then", later entries start with "And".
  * Never include "steps" or "expectedResult" in a BDD case.
- Never mix the two shapes inside one case.

Return ONLY the JSON object, without markdown fences or commentary."#;

/// Guidance injected for Manual requests.
pub const STEP_GUIDANCE: &str = "Write every test case as clear, imperative steps followed by a single expected result.";

/// Closing reminder for Manual requests.
pub const STEP_REMINDER: &str = "Remember to:
- Use clear, imperative steps
- Include every action and verification needed
- Keep each step short and actionable
- Give each case exactly one expectedResult";

/// Guidance injected for BDD requests.
pub const BDD_GUIDANCE: &str = r#"Write every test case in Gherkin style using Given-When-Then. Follow these rules strictly:

1. Each test case MUST contain all three arrays:
   - "given" for preconditions
   - "when" for actions
   - "then" for outcomes

2. Statement wording:
   - The first "given" statement MUST start with "Given" and describe the starting state
   - The first "when" statement MUST start with "When" and describe the action taken
   - The first "then" statement MUST start with "Then" and describe a verifiable outcome
   - Every further statement in a section MUST start with "And"

3. Content:
   - Given: system state, user state, or data setup
   - When: user interactions or system events
   - Then: observable outcomes or system responses

4. Do NOT include the "steps" array or the "expectedResult" field in BDD cases.

Example:
"given": ["Given the user is on the login page", "And the user has a registered account"]
"when": ["When the user enters a valid username", "And the user enters the matching password", "And the user presses Sign in"]
"then": ["Then the dashboard is displayed", "And a welcome message names the user"]"#;

/// Closing reminder for BDD requests.
pub const BDD_REMINDER: &str = r#"CRITICAL BDD reminders:
1. Every test case has all three arrays: given, when, then
2. Each section opens with its keyword (Given / When / Then) and continues with "And"
3. No "steps" array and no "expectedResult" field
4. Given establishes preconditions, When describes one concrete interaction, Then states verifiable outcomes
5. Use business-focused language and keep each statement independently verifiable"#;

/// System and user messages for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt pair for a validated request.
pub fn build_prompt(request: &GenerationRequest) -> Prompt {
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: build_user_prompt(request),
    }
}

/// Comma-joined category names in request order.
pub fn category_list(request: &GenerationRequest) -> String {
    request
        .categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_user_prompt(request: &GenerationRequest) -> String {
    let categories = category_list(request);
    let (guidance, reminder) = match request.format {
        TestFormat::Bdd => (BDD_GUIDANCE, BDD_REMINDER),
        TestFormat::Manual => (STEP_GUIDANCE, STEP_REMINDER),
    };

    let mut prompt = format!(
        "Generate comprehensive test cases in {} format for the user story below, covering these test categories: {}.\n\n{}\n\nStory Title: {}\n\nAcceptance Criteria:\n{}\n",
        request.format, categories, guidance, request.story_title, request.acceptance_criteria,
    );

    if let Some(description) = present(&request.description) {
        prompt.push_str(&format!("\nDescription:\n{}\n", description));
    }
    if let Some(info) = present(&request.additional_info) {
        prompt.push_str(&format!("\nAdditional Information:\n{}\n", info));
    }

    // Restated on purpose; models drift from instructions given only once.
    prompt.push_str(&format!(
        "\nGenerate test cases covering the specified categories: {}.\n\n{}\n\nReturn only the JSON object.",
        categories, reminder,
    ));
    prompt
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestCategory;

    fn login(format: TestFormat) -> GenerationRequest {
        GenerationRequest {
            story_title: "Login".into(),
            acceptance_criteria: "User can log in with valid credentials".into(),
            description: None,
            additional_info: None,
            issue_tracker_id: None,
            categories: vec![TestCategory::Positive],
            format,
        }
    }

    /// Category list after the first and the last "categories" marker.
    fn stated_lists(user: &str) -> (String, String) {
        let first_marker = "covering these test categories: ";
        let last_marker = "covering the specified categories: ";
        let grab = |marker: &str| {
            let start = user.find(marker).unwrap() + marker.len();
            let rest = &user[start..];
            rest[..rest.find(".\n").unwrap()].to_string()
        };
        (grab(first_marker), grab(last_marker))
    }

    #[test]
    fn manual_login_example() {
        let prompt = build_prompt(&login(TestFormat::Manual));
        assert!(prompt.user.contains("Login"));
        assert!(prompt.user.contains("User can log in with valid credentials"));
        assert!(prompt.user.contains("Positive"));
        assert!(prompt.user.contains(STEP_GUIDANCE));
        for gherkin in ["Given", "When", "Then", "\"given\"", "\"when\"", "\"then\""] {
            assert!(!prompt.user.contains(gherkin), "unexpected {gherkin}");
        }
    }

    #[test]
    fn bdd_prompt_carries_gherkin_rules_only() {
        let prompt = build_prompt(&login(TestFormat::Bdd));
        for word in ["given", "when", "then"] {
            assert!(prompt.user.contains(word));
        }
        assert!(prompt.user.contains(BDD_GUIDANCE));
        assert!(prompt.user.contains(BDD_REMINDER));
        assert!(!prompt.user.contains(STEP_GUIDANCE));
        assert!(!prompt.user.contains(STEP_REMINDER));
    }

    #[test]
    fn identical_input_gives_identical_prompt() {
        let mut request = login(TestFormat::Bdd);
        request.description = Some("Returning users".into());
        assert_eq!(build_prompt(&request), build_prompt(&request.clone()));
    }

    #[test]
    fn category_list_is_restated_in_input_order() {
        let mut request = login(TestFormat::Manual);
        request.categories = vec![
            TestCategory::Performance,
            TestCategory::EdgeCase,
            TestCategory::EndToEnd,
        ];
        let prompt = build_prompt(&request);
        let (first, last) = stated_lists(&prompt.user);
        assert_eq!(first, "Performance, Edge Case, E2E");
        assert_eq!(first, last);
    }

    #[test]
    fn optional_sections_only_when_present() {
        let mut request = login(TestFormat::Manual);
        let bare = build_prompt(&request).user;
        assert!(!bare.contains("Description:"));
        assert!(!bare.contains("Additional Information:"));

        request.description = Some("   ".into());
        request.additional_info = Some("Locked accounts exist".into());
        let user = build_prompt(&request).user;
        assert!(!user.contains("Description:"));
        assert!(user.contains("\nAdditional Information:\nLocked accounts exist\n"));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let mut request = login(TestFormat::Manual);
        request.description = Some("D".into());
        request.additional_info = Some("A".into());
        let user = build_prompt(&request).user;
        let order = [
            "Story Title: Login",
            "Acceptance Criteria:\n",
            "Description:\nD",
            "Additional Information:\nA",
            STEP_REMINDER,
            "Return only the JSON object.",
        ];
        let positions: Vec<usize> = order.iter().map(|s| user.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn system_prompt_is_format_agnostic() {
        assert_eq!(
            build_prompt(&login(TestFormat::Manual)).system,
            build_prompt(&login(TestFormat::Bdd)).system
        );
        assert!(SYSTEM_PROMPT.contains("\"format\": \"Manual\""));
        assert!(SYSTEM_PROMPT.contains("\"format\": \"BDD\""));
    }
}
