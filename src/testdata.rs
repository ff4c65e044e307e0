//! Model-free helpers: synthetic test cases for UI work, and CSV export.

use serde_json::Value;

use crate::models::{GenerationRequest, GenerationResponse, TestCase, TestFormat};

pub const SYNTHETIC_MODEL: &str = "test-data-generator";

const CSV_COLUMNS: [&str; 10] = [
    "id",
    "title",
    "category",
    "format",
    "testData",
    "expectedResult",
    "steps",
    "given",
    "when",
    "then",
];

/// Two placeholder cases per requested category, in the requested format.
pub fn synthesize(request: &GenerationRequest) -> GenerationResponse {
    let cases = request
        .categories
        .iter()
        .enumerate()
        .flat_map(|(index, category)| {
            let tag: String = category
                .as_str()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase();
            (1..=2u32).map(move |n| {
                let id = format!("{}-{}-{}", tag, index + 1, n);
                match request.format {
                    TestFormat::Bdd => TestCase::Bdd {
                        id,
                        title: format!("{} - {} BDD {}", request.story_title, category, n),
                        given: vec![format!("Given precondition {}", n)],
                        when: vec![format!("When action {}", n)],
                        then: vec![format!("Then expected outcome {}", n)],
                        test_data: Some(format!("sample data {}", n)),
                        category: category.to_string(),
                    },
                    TestFormat::Manual => TestCase::Manual {
                        id,
                        title: format!("{} - {} Manual {}", request.story_title, category, n),
                        steps: vec![format!("Step 1 for {}", n), format!("Step 2 for {}", n)],
                        test_data: Some(format!("field1=value{};field2=value{}", n, n * 2)),
                        expected_result: format!("Expected result {}", n),
                        category: category.to_string(),
                    },
                }
            })
        })
        .collect();

    GenerationResponse {
        cases,
        model: Some(SYNTHETIC_MODEL.to_string()),
        prompt_tokens: 0,
        completion_tokens: 0,
    }
}

/// Render loosely-shaped case objects as CSV. Array cells are joined with
/// `" | "`; missing or null cells are empty.
pub fn render_csv(cases: &[Value]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;
    for case in cases {
        writer.write_record(CSV_COLUMNS.iter().map(|column| cell(&case[*column])))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(" | "),
        other => other.to_string(),
    }
}
