use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::{Subject, TeacherTopic, Topic};
use crate::key::generate_id;
use crate::media::MediaRef;

/// The persisted application document.
///
/// Only the fields the content subsystem owns are typed. Everything else
/// (profile, flashcards, exams, attempts...) is carried verbatim in
/// `extra` so a load/save cycle never drops data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentState {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub teacher_topics: Vec<TeacherTopic>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentState {
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn subject_mut(&mut self, id: &str) -> Option<&mut Subject> {
        self.subjects.iter_mut().find(|s| s.id == id)
    }

    /// Teacher topics owned by the given subject, in persisted order.
    pub fn teacher_topics_for<'a>(&'a self, subject_id: &'a str) -> impl Iterator<Item = &'a TeacherTopic> + 'a {
        self.teacher_topics.iter().filter(move |t| t.subject == subject_id)
    }

    /// Merge a subject into the catalog.
    ///
    /// An existing subject with the same id has the incoming topics appended
    /// to its list; its title and description are kept. Otherwise the
    /// subject is inserted as new. Incoming topics whose id already exists
    /// in the target get a fresh `import_*` id. Returns the number of topics
    /// appended.
    pub fn merge_subject(&mut self, incoming: Subject) -> usize {
        let Subject {
            id,
            title,
            description,
            topics,
        } = incoming;
        let count = topics.len();

        if self.subject(&id).is_none() {
            self.subjects.push(Subject::new(id.clone(), title, description));
        }
        let Some(target) = self.subject_mut(&id) else {
            return 0;
        };
        for mut topic in topics {
            if topic.id.is_empty() || target.has_topic(&topic.id) {
                topic.id = fresh_topic_id(target);
            }
            target.topics.push(topic);
        }
        count
    }

    /// Add a single topic to a subject, creating the subject if needed.
    pub fn add_topic(&mut self, subject_id: &str, topic: Topic, new_subject: impl FnOnce() -> Subject) {
        match self.subject_mut(subject_id) {
            Some(subject) => subject.topics.push(topic),
            None => {
                let mut subject = new_subject();
                subject.topics.push(topic);
                self.subjects.push(subject);
            }
        }
    }

    /// Every media reference held by catalog topics and teacher topics.
    pub fn media_refs(&self) -> impl Iterator<Item = &MediaRef> {
        self.subjects
            .iter()
            .flat_map(|s| s.topics.iter())
            .filter_map(|t| t.media.as_ref())
            .chain(self.teacher_topics.iter().filter_map(|t| t.media.as_ref()))
    }
}

fn fresh_topic_id(subject: &Subject) -> String {
    loop {
        let id = generate_id("import");
        if !subject.has_topic(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::MediaKey;

    fn topic(id: &str) -> Topic {
        Topic {
            id: id.into(),
            title: format!("Topic {id}"),
            ..Default::default()
        }
    }

    fn subject(id: &str, topics: &[&str]) -> Subject {
        let mut s = Subject::new(id, id.to_uppercase(), "");
        s.topics = topics.iter().map(|t| topic(t)).collect();
        s
    }

    #[test]
    fn merge_inserts_new_subject() {
        let mut state = ContentState::default();
        let added = state.merge_subject(subject("math", &["a", "b"]));
        assert_eq!(added, 2);
        assert_eq!(state.subjects.len(), 1);
        assert_eq!(state.subject("math").unwrap().topics.len(), 2);
    }

    #[test]
    fn merge_appends_to_existing_subject() {
        let mut state = ContentState::default();
        state.subjects.push(subject("math", &["a"]));
        state.merge_subject(Subject {
            title: "Other title".into(),
            ..subject("math", &["b"])
        });
        let math = state.subject("math").unwrap();
        assert_eq!(state.subjects.len(), 1);
        assert_eq!(math.title, "MATH");
        let ids: Vec<_> = math.topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn merge_renames_colliding_topic_ids() {
        let mut state = ContentState::default();
        state.subjects.push(subject("math", &["a"]));
        state.merge_subject(subject("math", &["a"]));
        let math = state.subject("math").unwrap();
        assert_eq!(math.topics.len(), 2);
        assert_eq!(math.topics[0].id, "a");
        assert!(math.topics[1].id.starts_with("import_"));
    }

    #[test]
    fn teacher_topics_filtered_by_subject() {
        let mut state = ContentState::default();
        for (id, subj) in [("1", "math"), ("2", "sci"), ("3", "math")] {
            state.teacher_topics.push(TeacherTopic {
                id: id.into(),
                subject: subj.into(),
                title: String::new(),
                lesson_html: String::new(),
                media: None,
                created: chrono::Utc::now(),
            });
        }
        let ids: Vec<_> = state.teacher_topics_for("math").map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let json = r#"{"profile":{"name":"Ada"},"subjects":[],"teacherTopics":[],"attempts":[1,2]}"#;
        let state: ContentState = serde_json::from_str(json).unwrap();
        assert_eq!(state.extra["profile"]["name"], "Ada");
        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["attempts"], serde_json::json!([1, 2]));
    }

    #[test]
    fn media_refs_spans_catalog_and_teacher_topics() {
        let mut state = ContentState::default();
        let mut s = subject("math", &["a"]);
        s.topics[0].media = Some(MediaRef::local(MediaKey::new_unchecked("k1"), "audio", "a"));
        state.subjects.push(s);
        state.teacher_topics.push(TeacherTopic {
            id: "t".into(),
            subject: "math".into(),
            title: String::new(),
            lesson_html: String::new(),
            media: Some(MediaRef::local(MediaKey::new_unchecked("k2"), "audio", "b")),
            created: chrono::Utc::now(),
        });
        assert_eq!(state.media_refs().count(), 2);
    }
}
