use serde::{Deserialize, Serialize};

use crate::lenient;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    #[default]
    Unsolved,
    Attempted,
    Solved,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCase {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string_opt")]
    pub input: Option<String>,
    #[serde(deserialize_with = "lenient::string_opt")]
    pub output: Option<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_sample: bool,
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_hidden: bool,
    #[serde(deserialize_with = "lenient::uint")]
    pub order: u32,
    #[serde(deserialize_with = "lenient::uint")]
    pub weight: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Problem {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub difficulty: Difficulty,
    pub description: String,
    pub input_format: String,
    pub output_format: String,
    pub constraints: String,
    pub sample_input: String,
    pub sample_output: String,
    pub explanation: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    pub time_limit: f64,   // in milliseconds
    #[serde(deserialize_with = "lenient::float")]
    pub memory_limit: f64, // in megabytes
    pub starter_code: String,
    #[serde(deserialize_with = "lenient::items")]
    pub tags: Vec<Tag>,
    #[serde(deserialize_with = "lenient::items")]
    pub test_cases: Vec<TestCase>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub status: SolveStatus,
    #[serde(deserialize_with = "lenient::float_opt")]
    pub acceptance: Option<f64>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_bookmarked: bool,
}

impl Problem {
    /// Erases input and expected output of hidden test cases.
    pub fn redact_hidden(mut self) -> Self {
        for case in self.test_cases.iter_mut().filter(|case| case.is_hidden) {
            case.input = None;
            case.output = None;
        }
        self
    }

    pub fn sample_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.test_cases.iter().filter(|case| case.is_sample)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemRef {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub code: String,
    pub language: String,
    pub status: String,
    #[serde(deserialize_with = "lenient::float_opt")]
    pub execution_time: Option<f64>, // in milliseconds
    #[serde(deserialize_with = "lenient::float_opt")]
    pub memory_used: Option<f64>,    // in kilobytes
    #[serde(deserialize_with = "lenient::uint_opt")]
    pub test_cases_passed: Option<u32>,
    #[serde(deserialize_with = "lenient::uint_opt")]
    pub total_test_cases: Option<u32>,
    pub submitted_at: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub problem: Option<ProblemRef>,
    #[serde(deserialize_with = "lenient::string_opt")]
    pub contest_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DifficultyCount {
    #[serde(deserialize_with = "lenient::or_default")]
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "lenient::uint")]
    pub count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    #[serde(deserialize_with = "lenient::uint")]
    pub solved: u32,
    #[serde(deserialize_with = "lenient::uint")]
    pub attempted: u32,
    #[serde(deserialize_with = "lenient::uint")]
    pub total: u32,
    #[serde(deserialize_with = "lenient::uint")]
    pub unsolved: u32,
    #[serde(deserialize_with = "lenient::items")]
    pub solved_by_difficulty: Vec<DifficultyCount>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Bookmark {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "lenient::items")]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContestProblem {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub label: String,
    pub title: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "lenient::float")]
    pub points: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Contest {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub rules: Option<String>,
    pub status: String, // DRAFT, SCHEDULED, LIVE or COMPLETED
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(deserialize_with = "lenient::uint")]
    pub duration: u32, // in minutes
    #[serde(deserialize_with = "lenient::boolean")]
    pub show_leaderboard: bool,
    #[serde(deserialize_with = "lenient::items")]
    pub problems: Vec<ContestProblem>,
    #[serde(deserialize_with = "lenient::uint_opt")]
    pub participants: Option<u32>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub is_registered: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardEntry {
    #[serde(deserialize_with = "lenient::uint")]
    pub rank: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub student_id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient::float")]
    pub score: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub penalty: f64,
    #[serde(deserialize_with = "lenient::uint")]
    pub solved_count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Student {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Credential {
    pub access_token: String,
    #[serde(alias = "user")]
    pub student: Student,
}

/// A language the execution backend can run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOption {
    pub judge_id: u32,
    pub key: String,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SolveStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub code: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_input: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub code: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contest_id: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_api_prefix() -> String {
    "/api/student".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_preferred_languages() -> Vec<String> {
    vec!["javascript".to_string(), "python".to_string()]
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_preferred_languages")]
    pub preferred_languages: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
            preferred_languages: default_preferred_languages(),
            username: None,
            password: None,
            token: None,
        }
    }
}
