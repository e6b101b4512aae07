//! In-memory implementation of the storage seam.
//!
//! Backs the test suite and demos: same ordering, filtering, and
//! link-uniqueness semantics as [`super::PgStore`], with plain vectors and
//! FK-pair sets behind a mutex. Seeding helpers accept raw stored values
//! (e.g. a NULL task status) so normalization behavior can be exercised.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StoreError;
use crate::models::{
    Meeting, MeetingBrief, Member, MemberBrief, NewProject, NewTask, NewTopic, Project,
    StatusFilter, Task, TaskBrief, TaskStatus, Topic,
};

use super::{Store, TopicLink, TopicLinkOutcome};

#[derive(Default)]
struct Inner {
    members: Vec<Member>,
    tasks: Vec<Task>,
    meetings: Vec<Meeting>,
    projects: Vec<Project>,
    topics: Vec<Topic>,
    // FK pairs; set semantics enforced by the link operations.
    task_members: HashSet<(i64, i64)>,
    meeting_members: HashSet<(i64, i64)>,
    meeting_topics: HashSet<(i64, i64)>,
    meeting_tasks: HashSet<(i64, i64)>,
    meeting_projects: HashSet<(i64, i64)>,
    project_members: HashSet<(i64, i64)>,
    project_tasks: HashSet<(i64, i64)>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store with the same observable behavior as the Postgres
/// implementation.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-write;
        // the data is still usable for inspection.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---- seeding helpers ----

    pub fn seed_member(
        &self,
        name: &str,
        chat_id: Option<i64>,
        role: Option<&str>,
        subgroup: Option<&str>,
        email: Option<&str>,
    ) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.members.push(Member {
            id,
            name: name.to_string(),
            chat_id,
            role: role.map(str::to_string),
            subgroup: subgroup.map(str::to_string),
            email: email.map(str::to_string),
        });
        id
    }

    /// `status` is the raw stored value; `None` models a NULL column.
    pub fn seed_task(
        &self,
        name: &str,
        description: Option<&str>,
        deadline: Option<NaiveDate>,
        status: Option<&str>,
    ) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.tasks.push(Task {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            deadline,
            status: TaskStatus::from_stored(status),
        });
        id
    }

    pub fn seed_meeting(
        &self,
        name: &str,
        kind: Option<&str>,
        summary: Option<&str>,
        ingested_at: Option<DateTime<Utc>>,
    ) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.meetings.push(Meeting {
            id,
            name: name.to_string(),
            kind: kind.map(str::to_string),
            summary: summary.map(str::to_string),
            ingested_at,
        });
        id
    }

    pub fn seed_project(&self, name: &str, description: Option<&str>) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.projects.push(Project {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
        });
        id
    }

    pub fn seed_topic(&self, name: &str, description: Option<&str>) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.topics.push(Topic {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
        });
        id
    }

    pub fn link_task_member(&self, task_id: i64, member_id: i64) {
        self.lock().task_members.insert((task_id, member_id));
    }

    pub fn link_meeting_member(&self, meeting_id: i64, member_id: i64) {
        self.lock().meeting_members.insert((meeting_id, member_id));
    }

    pub fn link_meeting_topic_pair(&self, meeting_id: i64, topic_id: i64) {
        self.lock().meeting_topics.insert((meeting_id, topic_id));
    }

    pub fn link_meeting_task(&self, meeting_id: i64, task_id: i64) {
        self.lock().meeting_tasks.insert((meeting_id, task_id));
    }

    pub fn link_meeting_project(&self, meeting_id: i64, project_id: i64) {
        self.lock().meeting_projects.insert((meeting_id, project_id));
    }

    pub fn link_project_member(&self, project_id: i64, member_id: i64) {
        self.lock().project_members.insert((project_id, member_id));
    }

    pub fn link_project_task(&self, project_id: i64, task_id: i64) {
        self.lock().project_tasks.insert((project_id, task_id));
    }

    /// Number of task↔member rows currently stored (for link-uniqueness
    /// assertions).
    pub fn task_assignment_count(&self) -> usize {
        self.lock().task_members.len()
    }

    /// Total number of tasks (for all-or-nothing assertions).
    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn opt_contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| contains_ci(h, needle))
}

/// Deadline ascending, NULLs last, id as tiebreak (matches the SQL
/// `ORDER BY task_deadline ASC NULLS LAST, task_id`).
fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.deadline.is_none(), t.deadline, t.id));
}

/// Newest first; meetings without a timestamp sort last.
fn sort_meetings(meetings: &mut [Meeting]) {
    meetings.sort_by(|a, b| match (a.ingested_at, b.ingested_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

#[async_trait]
impl Store for MemStore {
    async fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        let mut members = self.lock().members.clone();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn member_by_chat_id(&self, chat_id: i64) -> Result<Option<Member>, StoreError> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.chat_id == Some(chat_id))
            .cloned())
    }

    async fn task_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.lock().tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn tasks_by_name(&self, fragment: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .lock()
            .tasks
            .iter()
            .filter(|t| contains_ci(&t.name, fragment))
            .cloned()
            .collect())
    }

    async fn list_tasks(&self, filter: StatusFilter) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| filter.accepts(t.status))
            .cloned()
            .collect();
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    async fn tasks_for_member(&self, member_id: i64) -> Result<Vec<Task>, StoreError> {
        let inner = self.lock();
        let mut tasks: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| inner.task_members.contains(&(t.id, member_id)))
            .cloned()
            .collect();
        drop(inner);
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    async fn task_assignees(&self, task_id: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        let mut names: Vec<String> = inner
            .members
            .iter()
            .filter(|m| inner.task_members.contains(&(task_id, m.id)))
            .map(|m| m.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn set_task_status(&self, task_id: i64, status: TaskStatus) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(task) = inner.tasks.iter_mut().find(|t| t.id == task_id) {
            task.status = status;
        }
        Ok(())
    }

    async fn create_task(&self, new: NewTask, assignee_ids: &[i64]) -> Result<Task, StoreError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let task = Task {
            id,
            name: new.name,
            description: new.description,
            deadline: new.deadline,
            status: new.status,
        };
        inner.tasks.push(task.clone());
        for member_id in assignee_ids {
            inner.task_members.insert((id, *member_id));
        }
        Ok(task)
    }

    async fn task_assignment_exists(
        &self,
        task_id: i64,
        member_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self.lock().task_members.contains(&(task_id, member_id)))
    }

    async fn add_task_assignment(&self, task_id: i64, member_id: i64) -> Result<(), StoreError> {
        self.lock().task_members.insert((task_id, member_id));
        Ok(())
    }

    async fn remove_task_assignment(
        &self,
        task_id: i64,
        member_id: i64,
    ) -> Result<u64, StoreError> {
        let removed = self.lock().task_members.remove(&(task_id, member_id));
        Ok(u64::from(removed))
    }

    async fn meeting_by_id(&self, id: i64) -> Result<Option<Meeting>, StoreError> {
        Ok(self.lock().meetings.iter().find(|m| m.id == id).cloned())
    }

    async fn meetings_by_name(&self, fragment: &str) -> Result<Vec<Meeting>, StoreError> {
        Ok(self
            .lock()
            .meetings
            .iter()
            .filter(|m| contains_ci(&m.name, fragment))
            .cloned()
            .collect())
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        let mut meetings = self.lock().meetings.clone();
        sort_meetings(&mut meetings);
        Ok(meetings)
    }

    async fn meetings_for_member(&self, member_id: i64) -> Result<Vec<Meeting>, StoreError> {
        let inner = self.lock();
        let mut meetings: Vec<Meeting> = inner
            .meetings
            .iter()
            .filter(|m| inner.meeting_members.contains(&(m.id, member_id)))
            .cloned()
            .collect();
        drop(inner);
        sort_meetings(&mut meetings);
        Ok(meetings)
    }

    async fn attended_meeting_ids(&self, member_id: i64) -> Result<HashSet<i64>, StoreError> {
        Ok(self
            .lock()
            .meeting_members
            .iter()
            .filter(|(_, m)| *m == member_id)
            .map(|(meeting, _)| *meeting)
            .collect())
    }

    async fn meeting_attendees(&self, meeting_id: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        let mut names: Vec<String> = inner
            .members
            .iter()
            .filter(|m| inner.meeting_members.contains(&(meeting_id, m.id)))
            .map(|m| m.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn meeting_topics(&self, meeting_id: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        let mut names: Vec<String> = inner
            .topics
            .iter()
            .filter(|t| inner.meeting_topics.contains(&(meeting_id, t.id)))
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn meeting_tasks(&self, meeting_id: i64) -> Result<Vec<TaskBrief>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .tasks
            .iter()
            .filter(|t| inner.meeting_tasks.contains(&(meeting_id, t.id)))
            .map(|t| TaskBrief {
                name: t.name.clone(),
                status: t.status,
                deadline: t.deadline,
            })
            .collect())
    }

    async fn meeting_projects(&self, meeting_id: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        let mut names: Vec<String> = inner
            .projects
            .iter()
            .filter(|p| inner.meeting_projects.contains(&(meeting_id, p.id)))
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn link_meeting_topic(
        &self,
        meeting_id: i64,
        link: TopicLink<'_>,
    ) -> Result<TopicLinkOutcome, StoreError> {
        let mut inner = self.lock();
        let (topic_id, topic_name) = match link {
            TopicLink::Existing(id) => {
                let name = inner
                    .topics
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| t.name.clone())
                    .ok_or_else(|| StoreError::Internal(format!("topic {id} no longer exists")))?;
                (id, name)
            }
            TopicLink::Create(name) => {
                let id = inner.next_id();
                inner.topics.push(Topic {
                    id,
                    name: name.to_string(),
                    description: None,
                });
                (id, name.to_string())
            }
        };
        let already_linked = !inner.meeting_topics.insert((meeting_id, topic_id));
        Ok(TopicLinkOutcome {
            topic_id,
            topic_name,
            already_linked,
        })
    }

    async fn project_by_id(&self, id: i64) -> Result<Option<Project>, StoreError> {
        Ok(self.lock().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn projects_by_name(&self, fragment: &str) -> Result<Vec<Project>, StoreError> {
        Ok(self
            .lock()
            .projects
            .iter()
            .filter(|p| contains_ci(&p.name, fragment))
            .cloned()
            .collect())
    }

    async fn project_by_exact_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        Ok(self
            .lock()
            .projects
            .iter()
            .find(|p| p.name.to_lowercase() == name.to_lowercase())
            .cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut projects = self.lock().projects.clone();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn project_members(&self, project_id: i64) -> Result<Vec<MemberBrief>, StoreError> {
        let inner = self.lock();
        let mut briefs: Vec<MemberBrief> = inner
            .members
            .iter()
            .filter(|m| inner.project_members.contains(&(project_id, m.id)))
            .map(|m| MemberBrief {
                name: m.name.clone(),
                role: m.role.clone(),
            })
            .collect();
        briefs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(briefs)
    }

    async fn project_tasks(&self, project_id: i64) -> Result<Vec<TaskBrief>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .tasks
            .iter()
            .filter(|t| inner.project_tasks.contains(&(project_id, t.id)))
            .map(|t| TaskBrief {
                name: t.name.clone(),
                status: t.status,
                deadline: t.deadline,
            })
            .collect())
    }

    async fn project_member_count(&self, project_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .lock()
            .project_members
            .iter()
            .filter(|(p, _)| *p == project_id)
            .count() as i64)
    }

    async fn member_projects(&self, member_id: i64) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        let mut names: Vec<String> = inner
            .projects
            .iter()
            .filter(|p| inner.project_members.contains(&(p.id, member_id)))
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_project(
        &self,
        new: NewProject,
        member_ids: &[i64],
    ) -> Result<Project, StoreError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let project = Project {
            id,
            name: new.name,
            description: new.description,
        };
        inner.projects.push(project.clone());
        for member_id in member_ids {
            inner.project_members.insert((id, *member_id));
        }
        Ok(project)
    }

    async fn project_membership_exists(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .project_members
            .contains(&(project_id, member_id)))
    }

    async fn add_project_member(&self, project_id: i64, member_id: i64) -> Result<(), StoreError> {
        self.lock().project_members.insert((project_id, member_id));
        Ok(())
    }

    async fn topic_by_id(&self, id: i64) -> Result<Option<Topic>, StoreError> {
        Ok(self.lock().topics.iter().find(|t| t.id == id).cloned())
    }

    async fn topics_by_name(&self, fragment: &str) -> Result<Vec<Topic>, StoreError> {
        Ok(self
            .lock()
            .topics
            .iter()
            .filter(|t| contains_ci(&t.name, fragment))
            .cloned()
            .collect())
    }

    async fn topic_by_exact_name(&self, name: &str) -> Result<Option<Topic>, StoreError> {
        Ok(self
            .lock()
            .topics
            .iter()
            .find(|t| t.name.to_lowercase() == name.to_lowercase())
            .cloned())
    }

    async fn create_topic(&self, new: NewTopic) -> Result<Topic, StoreError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let topic = Topic {
            id,
            name: new.name,
            description: new.description,
        };
        inner.topics.push(topic.clone());
        Ok(topic)
    }

    async fn topic_meetings(&self, topic_id: i64) -> Result<Vec<MeetingBrief>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .meetings
            .iter()
            .filter(|m| inner.meeting_topics.contains(&(m.id, topic_id)))
            .map(|m| MeetingBrief {
                name: m.name.clone(),
                kind: m.kind.clone(),
            })
            .collect())
    }

    async fn search_members(&self, query: &str, limit: usize) -> Result<Vec<Member>, StoreError> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| {
                contains_ci(&m.name, query)
                    || opt_contains_ci(m.email.as_deref(), query)
                    || opt_contains_ci(m.role.as_deref(), query)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_meetings(&self, query: &str, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        Ok(self
            .lock()
            .meetings
            .iter()
            .filter(|m| {
                contains_ci(&m.name, query) || opt_contains_ci(m.summary.as_deref(), query)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_projects(&self, query: &str, limit: usize) -> Result<Vec<Project>, StoreError> {
        Ok(self
            .lock()
            .projects
            .iter()
            .filter(|p| {
                contains_ci(&p.name, query) || opt_contains_ci(p.description.as_deref(), query)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_tasks(&self, query: &str, limit: usize) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .lock()
            .tasks
            .iter()
            .filter(|t| {
                contains_ci(&t.name, query) || opt_contains_ci(t.description.as_deref(), query)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_topics(&self, query: &str, limit: usize) -> Result<Vec<Topic>, StoreError> {
        Ok(self
            .lock()
            .topics
            .iter()
            .filter(|t| {
                contains_ci(&t.name, query) || opt_contains_ci(t.description.as_deref(), query)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
