//! Case study domain model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of rich-text fields on a case study
pub const RICH_TEXT_FIELD_COUNT: usize = 5;

/// Names of the rich-text fields, in scan order
pub const RICH_TEXT_FIELD_NAMES: [&str; RICH_TEXT_FIELD_COUNT] = [
    "problem_description",
    "solution_description",
    "outcomes",
    "tools_used",
    "project_learnings",
];

/// A portfolio case study
///
/// The five rich-text fields hold sanitized markup in which every embedded
/// image is referenced by its bare blob id (the canonical stored form). The
/// client logo is the one standalone image slot outside the rich text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub id: i64,
    pub title: String,
    pub client_name: Option<String>,
    pub client_link: Option<String>,
    pub client_logo_id: Option<i64>,
    pub industry: Option<String>,
    pub summary: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub problem_description: Option<String>,
    pub solution_description: Option<String>,
    pub outcomes: Option<String>,
    pub tools_used: Option<String>,
    pub project_learnings: Option<String>,
}

impl CaseStudy {
    /// The rich-text field slots, in scan order
    pub fn rich_text_fields(&self) -> [&Option<String>; RICH_TEXT_FIELD_COUNT] {
        [
            &self.problem_description,
            &self.solution_description,
            &self.outcomes,
            &self.tools_used,
            &self.project_learnings,
        ]
    }

    /// Mutable access to the rich-text field slots, in scan order
    pub fn rich_text_fields_mut(&mut self) -> [&mut Option<String>; RICH_TEXT_FIELD_COUNT] {
        [
            &mut self.problem_description,
            &mut self.solution_description,
            &mut self.outcomes,
            &mut self.tools_used,
            &mut self.project_learnings,
        ]
    }
}

/// The write payload for create and update
///
/// Rich-text fields may carry inline data-URI images; a field left as `None`
/// in an update is not touched. `client_logo`, when present and non-empty,
/// is a data URI for the standalone logo slot. Scalar fields merge on
/// `Some` at update time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStudyUpload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_link: Option<String>,
    #[serde(default)]
    pub client_logo: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub problem_description: Option<String>,
    #[serde(default)]
    pub solution_description: Option<String>,
    #[serde(default)]
    pub outcomes: Option<String>,
    #[serde(default)]
    pub tools_used: Option<String>,
    #[serde(default)]
    pub project_learnings: Option<String>,
}

impl CaseStudyUpload {
    /// The supplied rich-text field slots, in scan order
    pub fn rich_text_fields(&self) -> [&Option<String>; RICH_TEXT_FIELD_COUNT] {
        [
            &self.problem_description,
            &self.solution_description,
            &self.outcomes,
            &self.tools_used,
            &self.project_learnings,
        ]
    }

    /// The logo data URI, with the original's empty-string-means-absent rule
    pub fn logo_data_uri(&self) -> Option<&str> {
        self.client_logo.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rich_text_field_order() {
        let cs = CaseStudy {
            problem_description: Some("p".into()),
            project_learnings: Some("l".into()),
            ..Default::default()
        };
        let fields = cs.rich_text_fields();
        assert_eq!(fields.len(), RICH_TEXT_FIELD_NAMES.len());
        assert_eq!(fields[0].as_deref(), Some("p"));
        assert_eq!(fields[4].as_deref(), Some("l"));
        assert!(fields[1].is_none());
    }

    #[test]
    fn test_upload_from_json() {
        let upload: CaseStudyUpload = serde_json::from_str(
            r#"{
                "title": "Acme rollout",
                "client_name": "Acme",
                "start_date": "2024-03-01",
                "problem_description": "<p>slow</p>"
            }"#,
        )
        .unwrap();
        assert_eq!(upload.title.as_deref(), Some("Acme rollout"));
        assert_eq!(
            upload.start_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(upload.problem_description.as_deref(), Some("<p>slow</p>"));
        assert!(upload.outcomes.is_none());
    }

    #[test]
    fn test_empty_logo_treated_as_absent() {
        let upload = CaseStudyUpload {
            client_logo: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(upload.logo_data_uri(), None);
    }
}
