//! ID-or-name references for tasks, meetings, projects, and topics.
//!
//! A reference string from chat may be a numeric id ("42") or a fragment
//! of a title ("budget report"). Policy, uniform across the four entity
//! types: parse as an integer and look the id up first; otherwise run a
//! case-insensitive substring search and demand exactly one hit,
//! surfacing up to [`MAX_CANDIDATES`] candidates when there are more.
//! Project references get one extra chance: an exact case-insensitive
//! name match narrows a multi-hit result before giving up.

use crate::error::{Candidate, StoreError, ToolError};
use crate::models::{Meeting, Project, Task, Topic};
use crate::store::Store;

/// Cap on candidates returned with an ambiguous resolution.
pub const MAX_CANDIDATES: usize = 5;

/// Outcome of resolving a reference string.
#[derive(Debug)]
pub enum Resolution<T> {
    Hit(T),
    NotFound,
    Ambiguous(Vec<Candidate>),
}

impl<T> Resolution<T> {
    /// Fold into a `Result`, producing the standard not-found and
    /// disambiguation errors for `entity`.
    pub fn required(self, entity: &'static str, input: &str) -> Result<T, ToolError> {
        match self {
            Resolution::Hit(row) => Ok(row),
            Resolution::NotFound => Err(ToolError::NotFound {
                entity,
                input: input.to_string(),
            }),
            Resolution::Ambiguous(matches) => Err(ToolError::Ambiguous {
                message: format!("Multiple {entity}s match '{input}'. Please be more specific."),
                matches,
            }),
        }
    }
}

/// Rows that can surface as disambiguation candidates.
trait NamedRow {
    fn row_id(&self) -> i64;
    fn row_name(&self) -> &str;
}

impl NamedRow for Task {
    fn row_id(&self) -> i64 {
        self.id
    }
    fn row_name(&self) -> &str {
        &self.name
    }
}

impl NamedRow for Meeting {
    fn row_id(&self) -> i64 {
        self.id
    }
    fn row_name(&self) -> &str {
        &self.name
    }
}

impl NamedRow for Project {
    fn row_id(&self) -> i64 {
        self.id
    }
    fn row_name(&self) -> &str {
        &self.name
    }
}

impl NamedRow for Topic {
    fn row_id(&self) -> i64 {
        self.id
    }
    fn row_name(&self) -> &str {
        &self.name
    }
}

/// Apply the zero/one/many policy to a substring result set.
fn narrow<T: NamedRow>(mut rows: Vec<T>) -> Resolution<T> {
    match rows.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Hit(rows.remove(0)),
        _ => Resolution::Ambiguous(
            rows.iter()
                .take(MAX_CANDIDATES)
                .map(|r| Candidate {
                    id: r.row_id(),
                    name: r.row_name().to_string(),
                })
                .collect(),
        ),
    }
}

fn parse_id(input: &str) -> Option<i64> {
    input.trim().parse().ok()
}

pub async fn resolve_task(store: &dyn Store, input: &str) -> Result<Resolution<Task>, StoreError> {
    if let Some(id) = parse_id(input) {
        if let Some(task) = store.task_by_id(id).await? {
            return Ok(Resolution::Hit(task));
        }
    }
    Ok(narrow(store.tasks_by_name(input).await?))
}

pub async fn resolve_meeting(
    store: &dyn Store,
    input: &str,
) -> Result<Resolution<Meeting>, StoreError> {
    if let Some(id) = parse_id(input) {
        if let Some(meeting) = store.meeting_by_id(id).await? {
            return Ok(Resolution::Hit(meeting));
        }
    }
    Ok(narrow(store.meetings_by_name(input).await?))
}

/// Projects additionally narrow a multi-hit substring result with an
/// exact case-insensitive name match ("Website" among "Website" and
/// "Website Redesign").
pub async fn resolve_project(
    store: &dyn Store,
    input: &str,
) -> Result<Resolution<Project>, StoreError> {
    if let Some(id) = parse_id(input) {
        if let Some(project) = store.project_by_id(id).await? {
            return Ok(Resolution::Hit(project));
        }
    }
    let rows = store.projects_by_name(input).await?;
    if rows.len() > 1 {
        if let Some(exact) = rows
            .iter()
            .find(|p| p.name.to_lowercase() == input.to_lowercase())
        {
            return Ok(Resolution::Hit(exact.clone()));
        }
    }
    Ok(narrow(rows))
}

pub async fn resolve_topic(
    store: &dyn Store,
    input: &str,
) -> Result<Resolution<Topic>, StoreError> {
    if let Some(id) = parse_id(input) {
        if let Some(topic) = store.topic_by_id(id).await? {
            return Ok(Resolution::Hit(topic));
        }
    }
    Ok(narrow(store.topics_by_name(input).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[tokio::test]
    async fn numeric_input_resolves_by_id_first() {
        let store = MemStore::new();
        let id = store.seed_task("Draft 42 slides", None, None, None);
        // The task's own id, not the "42" in its name, decides the hit.
        let res = resolve_task(&store, &id.to_string()).await.unwrap();
        assert!(matches!(res, Resolution::Hit(t) if t.id == id));
    }

    #[tokio::test]
    async fn numeric_miss_falls_back_to_substring() {
        let store = MemStore::new();
        let id = store.seed_task("Chapter 99 review", None, None, None);
        let res = resolve_task(&store, "99").await.unwrap();
        assert!(matches!(res, Resolution::Hit(t) if t.id == id));
    }

    #[tokio::test]
    async fn multi_hit_caps_candidates_at_five() {
        let store = MemStore::new();
        for i in 0..7 {
            store.seed_task(&format!("report {i}"), None, None, None);
        }
        let res = resolve_task(&store, "report").await.unwrap();
        match res {
            Resolution::Ambiguous(candidates) => assert_eq!(candidates.len(), MAX_CANDIDATES),
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn project_narrows_to_exact_name_among_many() {
        let store = MemStore::new();
        let website = store.seed_project("Website", None);
        store.seed_project("Website Redesign", None);
        let res = resolve_project(&store, "website").await.unwrap();
        assert!(matches!(res, Resolution::Hit(p) if p.id == website));
    }

    #[tokio::test]
    async fn project_without_exact_match_stays_ambiguous() {
        let store = MemStore::new();
        store.seed_project("Website Redesign", None);
        store.seed_project("Website Content", None);
        let res = resolve_project(&store, "website").await.unwrap();
        assert!(matches!(res, Resolution::Ambiguous(_)));
    }

    #[tokio::test]
    async fn required_formats_the_standard_errors() {
        let store = MemStore::new();
        let res = resolve_meeting(&store, "standup").await.unwrap();
        let err = res.required("meeting", "standup").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find a meeting matching 'standup'"
        );

        store.seed_meeting("Standup Monday", None, None, None);
        store.seed_meeting("Standup Friday", None, None, None);
        let res = resolve_meeting(&store, "standup").await.unwrap();
        let err = res.required("meeting", "standup").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple meetings match 'standup'. Please be more specific."
        );
    }
}
