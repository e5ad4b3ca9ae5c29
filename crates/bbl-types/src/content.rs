use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaRef;

/// A lesson within a subject.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "lesson")]
    pub lesson_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
}

/// A subject in the content catalog: an ordered list of topics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Subject {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            topics: Vec::new(),
        }
    }

    pub fn has_topic(&self, id: &str) -> bool {
        self.topics.iter().any(|t| t.id == id)
    }
}

/// A topic authored on this device (typically a recording), persisted
/// separately from the built-in catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherTopic {
    #[serde(default)]
    pub id: String,
    /// Id of the owning subject.
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "lesson")]
    pub lesson_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

impl TeacherTopic {
    /// Projection into a catalog topic.
    pub fn to_topic(&self) -> Topic {
        Topic {
            id: self.id.clone(),
            title: self.title.clone(),
            lesson_html: self.lesson_html.clone(),
            media: self.media.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::MediaKey;

    #[test]
    fn subject_reads_legacy_field_names() {
        let json = r#"{"id":"math","title":"Math","desc":"Numbers","topics":[{"id":"t1","title":"Add","lesson":"<p>1+1</p>"}]}"#;
        let s: Subject = serde_json::from_str(json).unwrap();
        assert_eq!(s.description, "Numbers");
        assert_eq!(s.topics[0].lesson_html, "<p>1+1</p>");
        assert!(s.topics[0].media.is_none());
        assert!(s.has_topic("t1"));
        assert!(!s.has_topic("t2"));
    }

    #[test]
    fn subject_writes_camel_case() {
        let mut s = Subject::new("sci", "Science", "Stuff");
        s.topics.push(Topic {
            id: "t".into(),
            title: "Cells".into(),
            lesson_html: "<p>x</p>".into(),
            media: None,
        });
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["description"], "Stuff");
        assert_eq!(v["topics"][0]["lessonHtml"], "<p>x</p>");
        assert!(v["topics"][0].get("media").is_none());
    }

    #[test]
    fn teacher_topic_projects_to_topic() {
        let tt = TeacherTopic {
            id: "t_1".into(),
            subject: "math".into(),
            title: "Rec".into(),
            lesson_html: "<p>Recorded audio</p>".into(),
            media: Some(MediaRef::local(MediaKey::new_unchecked("m_1_aa"), "audio", "Rec")),
            created: Utc::now(),
        };
        let topic = tt.to_topic();
        assert_eq!(topic.id, "t_1");
        assert_eq!(topic.media, tt.media);
    }

    #[test]
    fn teacher_topic_without_created_gets_default() {
        let json = r#"{"id":"t_1","subject":"math","title":"Rec"}"#;
        let tt: TeacherTopic = serde_json::from_str(json).unwrap();
        assert_eq!(tt.subject, "math");
        assert!(tt.created <= Utc::now());
    }
}
