//! Shape checks for untyped JSON.
//!
//! Both the inbound request body and the model's output arrive as
//! `serde_json::Value`. Instead of a single serde error, the checks here walk
//! the value and collect every violation with the dotted path of the offending
//! field (`cases.2.given.0`), so callers get actionable diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::models::{GenerationRequest, GenerationResponse, TestCase, TestCategory, TestFormat};

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A single failed check: which field, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

/// Non-empty list of violations produced by a failed shape check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }

    /// True when some violation sits exactly at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let path = if v.path.is_empty() { "(root)" } else { &v.path };
            write!(f, "{}: {}", path, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn fail(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Violations> {
        match value {
            Some(v) if self.violations.is_empty() => Ok(v),
            _ => Err(Violations(self.violations)),
        }
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value.as_object() {
            Some(obj) => Some(obj),
            None => {
                self.fail(path, expected("object", value));
                None
            }
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, prefix: &str, key: &str) -> Option<String> {
        let path = join(prefix, key);
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.fail(&path, "Required");
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.fail(&path, expected("string", other));
                None
            }
        }
    }

    /// Like [`Checker::string`], but blank values fail with `blank_message`.
    fn non_blank(
        &mut self,
        obj: &Map<String, Value>,
        prefix: &str,
        key: &str,
        blank_message: &str,
    ) -> Option<String> {
        let s = self.string(obj, prefix, key)?;
        if s.trim().is_empty() {
            self.fail(&join(prefix, key), blank_message);
            return None;
        }
        Some(s)
    }

    /// Absent and `null` both mean "not supplied". Returns `Err(())` on a
    /// wrong-typed value so callers can tell it apart from absence.
    fn optional_string(
        &mut self,
        obj: &Map<String, Value>,
        prefix: &str,
        key: &str,
    ) -> Result<Option<String>, ()> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => {
                self.fail(&join(prefix, key), expected("string", other));
                Err(())
            }
        }
    }

    fn string_array(
        &mut self,
        obj: &Map<String, Value>,
        prefix: &str,
        key: &str,
    ) -> Option<Vec<String>> {
        let path = join(prefix, key);
        let items = match obj.get(key) {
            None | Some(Value::Null) => {
                self.fail(&path, "Required");
                return None;
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.fail(&path, expected("array", other));
                return None;
            }
        };

        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => out.push(s.to_string()),
                None => {
                    self.fail(&join(&path, &i.to_string()), expected("string", item));
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(kind: &str, got: &Value) -> String {
    format!("Expected {}, received {}", kind, type_name(got))
}

// ---------------------------------------------------------------------------
// Inbound request
// ---------------------------------------------------------------------------

/// Check an inbound request body and produce a typed [`GenerationRequest`].
pub fn validate_request(value: &Value) -> Result<GenerationRequest, Violations> {
    let mut c = Checker::default();
    let Some(obj) = c.object(value, "") else {
        return c.finish(None);
    };

    let story_title = c.non_blank(obj, "", "storyTitle", "Story title is required");
    let acceptance_criteria =
        c.non_blank(obj, "", "acceptanceCriteria", "Acceptance criteria is required");
    let description = c.optional_string(obj, "", "description");
    let additional_info = c.optional_string(obj, "", "additionalInfo");
    let issue_tracker_id = if obj.contains_key("issueTrackerId") {
        c.optional_string(obj, "", "issueTrackerId")
    } else {
        c.optional_string(obj, "", "jiraId")
    };
    let categories = categories(&mut c, obj);
    let format = format_field(&mut c, obj, "");

    let request = (|| {
        Some(GenerationRequest {
            story_title: story_title?,
            acceptance_criteria: acceptance_criteria?,
            description: description.ok()?,
            additional_info: additional_info.ok()?,
            issue_tracker_id: issue_tracker_id.ok()?,
            categories: categories?,
            format: format?,
        })
    })();
    c.finish(request)
}

fn categories(c: &mut Checker, obj: &Map<String, Value>) -> Option<Vec<TestCategory>> {
    let items = match obj.get("categories") {
        None | Some(Value::Null) => {
            c.fail("categories", "Required");
            return None;
        }
        Some(Value::Array(items)) => items,
        Some(other) => {
            c.fail("categories", expected("array", other));
            return None;
        }
    };
    if items.is_empty() {
        c.fail("categories", "At least one test category is required");
        return None;
    }

    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        let path = format!("categories.{}", i);
        match item.as_str().map(|s| (s, TestCategory::parse(s))) {
            Some((_, Some(category))) => out.push(category),
            Some((name, None)) => {
                c.fail(&path, invalid_enum(name, TestCategory::ALL.map(TestCategory::as_str)));
                ok = false;
            }
            None => {
                c.fail(&path, expected("string", item));
                ok = false;
            }
        }
    }
    ok.then_some(out)
}

fn format_field(c: &mut Checker, obj: &Map<String, Value>, prefix: &str) -> Option<TestFormat> {
    let name = c.string(obj, prefix, "format")?;
    let parsed = TestFormat::parse(&name);
    if parsed.is_none() {
        c.fail(
            &join(prefix, "format"),
            invalid_enum(&name, [TestFormat::Manual.as_str(), TestFormat::Bdd.as_str()]),
        );
    }
    parsed
}

fn invalid_enum<const N: usize>(got: &str, allowed: [&str; N]) -> String {
    let options = allowed
        .iter()
        .map(|a| format!("'{}'", a))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("Invalid value '{}'. Expected {}", got, options)
}

// ---------------------------------------------------------------------------
// Model output
// ---------------------------------------------------------------------------

/// Check a parsed model response and produce a typed [`GenerationResponse`].
///
/// `model`, `promptTokens` and `completionTokens` are optional here since the
/// gateway's own metadata replaces them afterwards.
pub fn validate_response(value: &Value) -> Result<GenerationResponse, Violations> {
    let mut c = Checker::default();
    let Some(obj) = c.object(value, "") else {
        return c.finish(None);
    };

    let cases = match obj.get("cases") {
        None | Some(Value::Null) => {
            c.fail("cases", "Required");
            None
        }
        Some(Value::Array(items)) => {
            let parsed: Vec<Option<TestCase>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| test_case(&mut c, item, &format!("cases.{}", i)))
                .collect();
            parsed.into_iter().collect::<Option<Vec<_>>>()
        }
        Some(other) => {
            c.fail("cases", expected("array", other));
            None
        }
    };
    let response = cases.map(|cases| GenerationResponse {
        cases,
        model: obj.get("model").and_then(Value::as_str).map(str::to_string),
        prompt_tokens: token_count(obj, "promptTokens"),
        completion_tokens: token_count(obj, "completionTokens"),
    });
    c.finish(response)
}

/// Model-echoed usage metadata. The gateway's figures replace it, so a
/// missing, negative or non-integer echo reads as 0 instead of failing.
fn token_count(obj: &Map<String, Value>, key: &str) -> u64 {
    obj.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Keys of the other variant are ignored: a case is judged on the fields its
/// own `format` requires.
fn test_case(c: &mut Checker, value: &Value, path: &str) -> Option<TestCase> {
    let obj = c.object(value, path)?;
    let format = format_field(c, obj, path)?;

    let id = c.string(obj, path, "id");
    let title = c.string(obj, path, "title");
    let category = c.string(obj, path, "category");
    let test_data = c.optional_string(obj, path, "testData");

    match format {
        TestFormat::Manual => {
            let steps = c.string_array(obj, path, "steps");
            let expected_result = c.string(obj, path, "expectedResult");
            Some(TestCase::Manual {
                id: id?,
                title: title?,
                steps: steps?,
                test_data: test_data.ok()?,
                expected_result: expected_result?,
                category: category?,
            })
        }
        TestFormat::Bdd => {
            let given = clauses(c, obj, path, "given", "Given");
            let when = clauses(c, obj, path, "when", "When");
            let then = clauses(c, obj, path, "then", "Then");
            Some(TestCase::Bdd {
                id: id?,
                title: title?,
                given: given?,
                when: when?,
                then: then?,
                test_data: test_data.ok()?,
                category: category?,
            })
        }
    }
}

/// A Gherkin section: every statement opens with the section keyword or `And`.
fn clauses(
    c: &mut Checker,
    obj: &Map<String, Value>,
    prefix: &str,
    key: &str,
    keyword: &str,
) -> Option<Vec<String>> {
    let statements = c.string_array(obj, prefix, key)?;
    let path = join(prefix, key);
    let mut ok = true;
    for (i, statement) in statements.iter().enumerate() {
        if !opens_with(statement, keyword) && !opens_with(statement, "And") {
            c.fail(
                &join(&path, &i.to_string()),
                format!("Must begin with \"{}\" or \"And\"", keyword),
            );
            ok = false;
        }
    }
    ok.then_some(statements)
}

fn opens_with(statement: &str, keyword: &str) -> bool {
    statement
        .split_whitespace()
        .next()
        .map(|word| word.trim_end_matches(|ch: char| !ch.is_alphanumeric()))
        .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn login_request() -> Value {
        json!({
            "storyTitle": "Login",
            "acceptanceCriteria": "User can log in with valid credentials",
            "categories": ["Positive", "Edge Case"],
            "format": "Manual"
        })
    }

    fn manual_case() -> Value {
        json!({
            "id": "TC-001",
            "title": "Valid login",
            "format": "Manual",
            "steps": ["Open the login page", "Submit valid credentials"],
            "expectedResult": "Dashboard is shown",
            "category": "Positive"
        })
    }

    fn bdd_case() -> Value {
        json!({
            "id": "TC-002",
            "title": "Valid login",
            "format": "BDD",
            "testData": "user=alice",
            "given": ["Given the user is on the login page", "And the user has an account"],
            "when": ["When the user submits valid credentials"],
            "then": ["Then the dashboard is shown"],
            "category": "Positive"
        })
    }

    #[test]
    fn accepts_minimal_request() {
        let request = validate_request(&login_request()).unwrap();
        assert_eq!(request.story_title, "Login");
        assert_eq!(
            request.categories,
            vec![TestCategory::Positive, TestCategory::EdgeCase]
        );
        assert_eq!(request.format, TestFormat::Manual);
        assert_eq!(request.description, None);
    }

    #[test]
    fn request_keeps_duplicate_categories_in_order() {
        let mut body = login_request();
        body["categories"] = json!(["Negative", "Positive", "Negative"]);
        let request = validate_request(&body).unwrap();
        assert_eq!(
            request.categories,
            vec![TestCategory::Negative, TestCategory::Positive, TestCategory::Negative]
        );
    }

    #[test]
    fn request_accepts_jira_id_alias_and_null_optionals() {
        let mut body = login_request();
        body["jiraId"] = json!("PROJ-12");
        body["description"] = Value::Null;
        let request = validate_request(&body).unwrap();
        assert_eq!(request.issue_tracker_id.as_deref(), Some("PROJ-12"));
        assert_eq!(request.description, None);
    }

    #[test]
    fn request_reports_every_violation() {
        let body = json!({
            "storyTitle": "   ",
            "categories": [],
            "format": "Gherkin",
            "description": 7
        });
        let err = validate_request(&body).unwrap_err();
        assert!(err.has_path("storyTitle"));
        assert!(err.has_path("acceptanceCriteria"));
        assert!(err.has_path("categories"));
        assert!(err.has_path("format"));
        assert!(err.has_path("description"));
        assert_eq!(err.as_slice().len(), 5);
    }

    #[test]
    fn request_rejects_unknown_category_with_index() {
        let mut body = login_request();
        body["categories"] = json!(["Positive", "Security"]);
        let err = validate_request(&body).unwrap_err();
        assert!(err.has_path("categories.1"));
        assert!(err.to_string().contains("Security"));
    }

    #[test]
    fn request_rejects_non_object() {
        let err = validate_request(&json!(["Login"])).unwrap_err();
        assert!(err.has_path(""));
        assert!(err.to_string().starts_with("(root)"));
    }

    #[test]
    fn response_accepts_both_variants() {
        let body = json!({ "cases": [manual_case(), bdd_case()] });
        let response = validate_response(&body).unwrap();
        assert_eq!(response.cases.len(), 2);
        assert_eq!(response.cases[0].format(), TestFormat::Manual);
        assert_eq!(response.cases[1].format(), TestFormat::Bdd);
        assert_eq!(response.prompt_tokens, 0);
        assert_eq!(response.model, None);
    }

    #[test]
    fn response_missing_cases_names_the_field() {
        let err = validate_response(&json!({ "model": "x" })).unwrap_err();
        assert!(err.has_path("cases"));
    }

    #[test]
    fn bdd_case_missing_given_is_rejected() {
        let mut case = bdd_case();
        case.as_object_mut().unwrap().remove("given");
        let err = validate_response(&json!({ "cases": [case] })).unwrap_err();
        assert!(err.has_path("cases.0.given"));
    }

    #[test]
    fn case_claiming_bdd_with_manual_shape_is_rejected() {
        let mut case = manual_case();
        case["format"] = json!("BDD");
        let err = validate_response(&json!({ "cases": [case] })).unwrap_err();
        assert!(err.has_path("cases.0.given"));
        assert!(err.has_path("cases.0.when"));
        assert!(err.has_path("cases.0.then"));
        assert!(!err.has_path("cases.0.steps"));
    }

    #[test]
    fn bdd_case_with_extra_step_fields_keeps_its_clauses() {
        let mut case = bdd_case();
        case["steps"] = json!(["BDD step 1"]);
        case["expectedResult"] = json!("Expected result 1");
        let response = validate_response(&json!({ "cases": [case] })).unwrap();
        match &response.cases[0] {
            TestCase::Bdd { given, then, .. } => {
                assert_eq!(given.len(), 2);
                assert_eq!(then, &["Then the dashboard is shown"]);
            }
            other => panic!("expected a BDD case, got {other:?}"),
        }
    }

    #[test]
    fn manual_case_with_extra_gherkin_arrays_is_accepted() {
        let mut case = manual_case();
        case["then"] = json!(["Then something"]);
        let response = validate_response(&json!({ "cases": [case] })).unwrap();
        assert_eq!(response.cases[0].format(), TestFormat::Manual);
    }

    #[test]
    fn empty_arrays_are_accepted() {
        let mut manual = manual_case();
        manual["steps"] = json!([]);
        let mut bdd = bdd_case();
        bdd["then"] = json!([]);
        let response = validate_response(&json!({ "cases": [manual, bdd] })).unwrap();
        assert_eq!(response.cases.len(), 2);
    }

    #[test]
    fn gherkin_statements_must_open_with_keyword() {
        let mut case = bdd_case();
        case["when"] = json!(["When the user clicks login", "Then submits"]);
        let err = validate_response(&json!({ "cases": [case] })).unwrap_err();
        assert!(err.has_path("cases.0.when.1"));
        assert_eq!(err.as_slice().len(), 1);
    }

    #[test]
    fn keyword_check_ignores_case_and_punctuation() {
        assert!(opens_with("given, a user", "Given"));
        assert!(opens_with("  AND the cart is empty", "And"));
        assert!(!opens_with("Givenness matters", "Given"));
        assert!(!opens_with("", "Then"));
    }

    #[test]
    fn wrong_typed_arrays_are_reported() {
        let mut case = manual_case();
        case["steps"] = json!("click things");
        let mut other = manual_case();
        other["steps"] = json!(["ok", 3]);
        let err = validate_response(&json!({ "cases": [case, other] })).unwrap_err();
        assert!(err.has_path("cases.0.steps"));
        assert!(err.has_path("cases.1.steps.1"));
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let mut case = manual_case();
        case["format"] = json!("Exploratory");
        let err = validate_response(&json!({ "cases": [case] })).unwrap_err();
        assert!(err.has_path("cases.0.format"));
    }

    #[test]
    fn odd_metadata_echo_reads_as_defaults() {
        let response = validate_response(&json!({
            "cases": [],
            "model": 7,
            "promptTokens": 0.0,
            "completionTokens": -1
        }))
        .unwrap();
        assert_eq!(response.model, None);
        assert_eq!(response.prompt_tokens, 0);
        assert_eq!(response.completion_tokens, 0);
    }

    #[test]
    fn validated_response_revalidates_to_itself() {
        let body = json!({
            "cases": [manual_case(), bdd_case()],
            "model": "llama",
            "promptTokens": 120,
            "completionTokens": 48
        });
        let first = validate_response(&body).unwrap();
        let again = validate_response(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }
}
