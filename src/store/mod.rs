//! Storage seam.
//!
//! [`Store`] is the async boundary between the tool operations and the
//! relational database: row lookups, case-insensitive substring searches,
//! join reads over the junction tables, and composite writes that must be
//! one durable transaction. [`PgStore`] is the production Postgres
//! implementation; [`MemStore`] is the in-process implementation the test
//! suite runs against.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    Meeting, MeetingBrief, Member, MemberBrief, NewProject, NewTask, NewTopic, Project,
    StatusFilter, Task, TaskBrief, TaskStatus, Topic,
};

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

/// How `link_meeting_topic` should obtain its topic.
#[derive(Debug, Clone)]
pub enum TopicLink<'a> {
    /// Link an already-existing topic by id.
    Existing(i64),
    /// Create a topic with this name inside the same transaction, then
    /// link it.
    Create(&'a str),
}

/// Outcome of `link_meeting_topic`.
#[derive(Debug, Clone)]
pub struct TopicLinkOutcome {
    pub topic_id: i64,
    pub topic_name: String,
    /// True when the meeting↔topic pair already existed; no row was
    /// written in that case.
    pub already_linked: bool,
}

/// Async access to the meeting/task-tracking schema.
///
/// Reads that feed ordered listings return rows already ordered (tasks by
/// deadline ascending with NULLs last, meetings newest first). Composite
/// writes (`create_task`, `create_project`, `link_meeting_topic`) commit
/// exactly one transaction.
#[async_trait]
pub trait Store: Send + Sync {
    // ---- members ----
    async fn list_members(&self) -> Result<Vec<Member>, StoreError>;
    async fn member_by_chat_id(&self, chat_id: i64) -> Result<Option<Member>, StoreError>;

    // ---- tasks ----
    async fn task_by_id(&self, id: i64) -> Result<Option<Task>, StoreError>;
    /// Case-insensitive substring match on the task name.
    async fn tasks_by_name(&self, fragment: &str) -> Result<Vec<Task>, StoreError>;
    async fn list_tasks(&self, filter: StatusFilter) -> Result<Vec<Task>, StoreError>;
    async fn tasks_for_member(&self, member_id: i64) -> Result<Vec<Task>, StoreError>;
    async fn task_assignees(&self, task_id: i64) -> Result<Vec<String>, StoreError>;
    async fn set_task_status(&self, task_id: i64, status: TaskStatus) -> Result<(), StoreError>;
    /// Insert the task and all assignment rows in one transaction.
    async fn create_task(&self, new: NewTask, assignee_ids: &[i64]) -> Result<Task, StoreError>;
    async fn task_assignment_exists(
        &self,
        task_id: i64,
        member_id: i64,
    ) -> Result<bool, StoreError>;
    async fn add_task_assignment(&self, task_id: i64, member_id: i64) -> Result<(), StoreError>;
    /// Returns the number of rows removed (0 when the pair did not exist).
    async fn remove_task_assignment(&self, task_id: i64, member_id: i64)
        -> Result<u64, StoreError>;

    // ---- meetings ----
    async fn meeting_by_id(&self, id: i64) -> Result<Option<Meeting>, StoreError>;
    async fn meetings_by_name(&self, fragment: &str) -> Result<Vec<Meeting>, StoreError>;
    async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError>;
    async fn meetings_for_member(&self, member_id: i64) -> Result<Vec<Meeting>, StoreError>;
    async fn attended_meeting_ids(&self, member_id: i64) -> Result<HashSet<i64>, StoreError>;
    async fn meeting_attendees(&self, meeting_id: i64) -> Result<Vec<String>, StoreError>;
    async fn meeting_topics(&self, meeting_id: i64) -> Result<Vec<String>, StoreError>;
    async fn meeting_tasks(&self, meeting_id: i64) -> Result<Vec<TaskBrief>, StoreError>;
    async fn meeting_projects(&self, meeting_id: i64) -> Result<Vec<String>, StoreError>;
    /// Resolve-or-create the topic and link it to the meeting in one
    /// transaction; reports (without writing) when the link already exists.
    async fn link_meeting_topic(
        &self,
        meeting_id: i64,
        link: TopicLink<'_>,
    ) -> Result<TopicLinkOutcome, StoreError>;

    // ---- projects ----
    async fn project_by_id(&self, id: i64) -> Result<Option<Project>, StoreError>;
    async fn projects_by_name(&self, fragment: &str) -> Result<Vec<Project>, StoreError>;
    /// Exact case-insensitive name lookup (duplicate-creation guard and
    /// the multi-hit narrowing retry).
    async fn project_by_exact_name(&self, name: &str) -> Result<Option<Project>, StoreError>;
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn project_members(&self, project_id: i64) -> Result<Vec<MemberBrief>, StoreError>;
    async fn project_tasks(&self, project_id: i64) -> Result<Vec<TaskBrief>, StoreError>;
    async fn project_member_count(&self, project_id: i64) -> Result<i64, StoreError>;
    async fn member_projects(&self, member_id: i64) -> Result<Vec<String>, StoreError>;
    /// Insert the project and all membership rows in one transaction.
    async fn create_project(
        &self,
        new: NewProject,
        member_ids: &[i64],
    ) -> Result<Project, StoreError>;
    async fn project_membership_exists(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> Result<bool, StoreError>;
    async fn add_project_member(&self, project_id: i64, member_id: i64) -> Result<(), StoreError>;

    // ---- topics ----
    async fn topic_by_id(&self, id: i64) -> Result<Option<Topic>, StoreError>;
    async fn topics_by_name(&self, fragment: &str) -> Result<Vec<Topic>, StoreError>;
    async fn topic_by_exact_name(&self, name: &str) -> Result<Option<Topic>, StoreError>;
    async fn create_topic(&self, new: NewTopic) -> Result<Topic, StoreError>;
    async fn topic_meetings(&self, topic_id: i64) -> Result<Vec<MeetingBrief>, StoreError>;

    // ---- free-text search ----
    async fn search_members(&self, query: &str, limit: usize) -> Result<Vec<Member>, StoreError>;
    async fn search_meetings(&self, query: &str, limit: usize) -> Result<Vec<Meeting>, StoreError>;
    async fn search_projects(&self, query: &str, limit: usize)
        -> Result<Vec<Project>, StoreError>;
    async fn search_tasks(&self, query: &str, limit: usize) -> Result<Vec<Task>, StoreError>;
    async fn search_topics(&self, query: &str, limit: usize) -> Result<Vec<Topic>, StoreError>;
}
