use bbl_types::{Subject, TeacherTopic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contents of `subject.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPackage {
    pub subject: Subject,
    #[serde(default)]
    pub teacher_topics: Vec<TeacherTopic>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}
