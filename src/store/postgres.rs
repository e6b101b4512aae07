//! Postgres implementation of the storage seam.
//!
//! Plain runtime queries (no compile-time checked macros) so the crate
//! builds without a reachable database. Each composite write opens one
//! transaction and commits it before returning.

use std::collections::HashSet;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

use crate::error::StoreError;
use crate::models::{
    Meeting, MeetingBrief, Member, MemberBrief, NewProject, NewTask, NewTopic, Project,
    StatusFilter, Task, TaskBrief, TaskStatus, Topic,
};

use super::{Store, TopicLink, TopicLinkOutcome};

const MEMBER_COLUMNS: &str =
    "member_id AS id, member_name AS name, chat_id, role, subgroup, email";
const TASK_COLUMNS: &str =
    "task_id AS id, task_name AS name, task_description AS description, \
     task_deadline AS deadline, task_status AS status";
const MEETING_COLUMNS: &str =
    "meeting_id AS id, meeting_name AS name, meeting_kind AS kind, \
     meeting_summary AS summary, ingested_at";
const PROJECT_COLUMNS: &str =
    "project_id AS id, project_name AS name, project_description AS description";
const TOPIC_COLUMNS: &str = "topic_id AS id, topic_name AS name, topic_description AS description";

/// Status normalization happens at the row boundary so no read path ever
/// sees a raw stored value.
impl<'r> sqlx::FromRow<'r, PgRow> for Task {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: Option<String> = row.try_get("status")?;
        Ok(Task {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            deadline: row.try_get("deadline")?,
            status: TaskStatus::from_stored(status.as_deref()),
        })
    }
}

/// Postgres-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `DATABASE_URL` (read from the environment, with
    /// `.env` honored).
    pub async fn connect() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL not found in environment variables")?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .context("failed to connect to database")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY member_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn member_by_chat_id(&self, chat_id: i64) -> Result<Option<Member>, StoreError> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE chat_id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn task_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn tasks_by_name(&self, fragment: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE task_name ILIKE '%' || $1 || '%' \
             ORDER BY task_id"
        ))
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn list_tasks(&self, filter: StatusFilter) -> Result<Vec<Task>, StoreError> {
        let predicate = match filter {
            StatusFilter::All => "TRUE",
            StatusFilter::Complete => "task_status = 'complete'",
            StatusFilter::Incomplete => "(task_status = 'incomplete' OR task_status IS NULL)",
        };
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {predicate} \
             ORDER BY task_deadline ASC NULLS LAST, task_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn tasks_for_member(&self, member_id: i64) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             JOIN task_members USING (task_id) \
             WHERE task_members.member_id = $1 \
             ORDER BY task_deadline ASC NULLS LAST, task_id"
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn task_assignees(&self, task_id: i64) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT m.member_name FROM members m \
             JOIN task_members tm ON m.member_id = tm.member_id \
             WHERE tm.task_id = $1 \
             ORDER BY m.member_name",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn set_task_status(&self, task_id: i64, status: TaskStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE tasks SET task_status = $2 WHERE task_id = $1")
            .bind(task_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        info!(task_id, status = status.as_str(), "updated task status");
        Ok(())
    }

    async fn create_task(&self, new: NewTask, assignee_ids: &[i64]) -> Result<Task, StoreError> {
        let mut tx = self.pool.begin().await?;
        let task_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO tasks (task_name, task_description, task_deadline, task_status) \
             VALUES ($1, $2, $3, $4) RETURNING task_id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.deadline)
        .bind(new.status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        for member_id in assignee_ids {
            sqlx::query("INSERT INTO task_members (task_id, member_id) VALUES ($1, $2)")
                .bind(task_id)
                .bind(member_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!(task_id, assignees = assignee_ids.len(), "created task");
        Ok(Task {
            id: task_id,
            name: new.name,
            description: new.description,
            deadline: new.deadline,
            status: new.status,
        })
    }

    async fn task_assignment_exists(
        &self,
        task_id: i64,
        member_id: i64,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM task_members WHERE task_id = $1 AND member_id = $2)",
        )
        .bind(task_id)
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_task_assignment(&self, task_id: i64, member_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO task_members (task_id, member_id) VALUES ($1, $2)")
            .bind(task_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        info!(task_id, member_id, "assigned member to task");
        Ok(())
    }

    async fn remove_task_assignment(
        &self,
        task_id: i64,
        member_id: i64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM task_members WHERE task_id = $1 AND member_id = $2")
            .bind(task_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn meeting_by_id(&self, id: i64) -> Result<Option<Meeting>, StoreError> {
        let meeting = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE meeting_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meeting)
    }

    async fn meetings_by_name(&self, fragment: &str) -> Result<Vec<Meeting>, StoreError> {
        let meetings = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings \
             WHERE meeting_name ILIKE '%' || $1 || '%' \
             ORDER BY meeting_id"
        ))
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;
        Ok(meetings)
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        let meetings = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings ORDER BY ingested_at DESC NULLS LAST"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(meetings)
    }

    async fn meetings_for_member(&self, member_id: i64) -> Result<Vec<Meeting>, StoreError> {
        let meetings = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings \
             JOIN meeting_members USING (meeting_id) \
             WHERE meeting_members.member_id = $1 \
             ORDER BY ingested_at DESC NULLS LAST"
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(meetings)
    }

    async fn attended_meeting_ids(&self, member_id: i64) -> Result<HashSet<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT meeting_id FROM meeting_members WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn meeting_attendees(&self, meeting_id: i64) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT m.member_name FROM members m \
             JOIN meeting_members mm ON m.member_id = mm.member_id \
             WHERE mm.meeting_id = $1 \
             ORDER BY m.member_name",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn meeting_topics(&self, meeting_id: i64) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT t.topic_name FROM topics t \
             JOIN meeting_topics mt ON t.topic_id = mt.topic_id \
             WHERE mt.meeting_id = $1 \
             ORDER BY t.topic_name",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn meeting_tasks(&self, meeting_id: i64) -> Result<Vec<TaskBrief>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Option<String>, Option<NaiveDate>)>(
            "SELECT t.task_name, t.task_status, t.task_deadline FROM tasks t \
             JOIN meeting_tasks mt ON t.task_id = mt.task_id \
             WHERE mt.meeting_id = $1 \
             ORDER BY t.task_id",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(task_brief).collect())
    }

    async fn meeting_projects(&self, meeting_id: i64) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT p.project_name FROM projects p \
             JOIN meeting_projects mp ON p.project_id = mp.project_id \
             WHERE mp.meeting_id = $1 \
             ORDER BY p.project_name",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn link_meeting_topic(
        &self,
        meeting_id: i64,
        link: TopicLink<'_>,
    ) -> Result<TopicLinkOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (topic_id, topic_name) = match link {
            TopicLink::Existing(id) => {
                let name = sqlx::query_scalar::<_, String>(
                    "SELECT topic_name FROM topics WHERE topic_id = $1",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::Internal(format!("topic {id} no longer exists")))?;
                (id, name)
            }
            TopicLink::Create(name) => {
                let id = sqlx::query_scalar::<_, i64>(
                    "INSERT INTO topics (topic_name) VALUES ($1) RETURNING topic_id",
                )
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;
                info!(topic_id = id, "created topic while linking to meeting");
                (id, name.to_string())
            }
        };

        let already_linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM meeting_topics WHERE meeting_id = $1 AND topic_id = $2)",
        )
        .bind(meeting_id)
        .bind(topic_id)
        .fetch_one(&mut *tx)
        .await?;

        if !already_linked {
            sqlx::query("INSERT INTO meeting_topics (meeting_id, topic_id) VALUES ($1, $2)")
                .bind(meeting_id)
                .bind(topic_id)
                .execute(&mut *tx)
                .await?;
            info!(meeting_id, topic_id, "linked topic to meeting");
        }
        tx.commit().await?;

        Ok(TopicLinkOutcome {
            topic_id,
            topic_name,
            already_linked,
        })
    }

    async fn project_by_id(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn projects_by_name(&self, fragment: &str) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE project_name ILIKE '%' || $1 || '%' \
             ORDER BY project_id"
        ))
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn project_by_exact_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE LOWER(project_name) = LOWER($1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY project_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn project_members(&self, project_id: i64) -> Result<Vec<MemberBrief>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT m.member_name, m.role FROM members m \
             JOIN project_members pm ON m.member_id = pm.member_id \
             WHERE pm.project_id = $1 \
             ORDER BY m.member_name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(name, role)| MemberBrief { name, role })
            .collect())
    }

    async fn project_tasks(&self, project_id: i64) -> Result<Vec<TaskBrief>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Option<String>, Option<NaiveDate>)>(
            "SELECT t.task_name, t.task_status, t.task_deadline FROM tasks t \
             JOIN project_tasks pt ON t.task_id = pt.task_id \
             WHERE pt.project_id = $1 \
             ORDER BY t.task_id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(task_brief).collect())
    }

    async fn project_member_count(&self, project_id: i64) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_members WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn member_projects(&self, member_id: i64) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT p.project_name FROM projects p \
             JOIN project_members pm ON p.project_id = pm.project_id \
             WHERE pm.member_id = $1 \
             ORDER BY p.project_name",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn create_project(
        &self,
        new: NewProject,
        member_ids: &[i64],
    ) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await?;
        let project_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO projects (project_name, project_description) \
             VALUES ($1, $2) RETURNING project_id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&mut *tx)
        .await?;
        for member_id in member_ids {
            sqlx::query("INSERT INTO project_members (project_id, member_id) VALUES ($1, $2)")
                .bind(project_id)
                .bind(member_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!(project_id, members = member_ids.len(), "created project");
        Ok(Project {
            id: project_id,
            name: new.name,
            description: new.description,
        })
    }

    async fn project_membership_exists(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM project_members WHERE project_id = $1 AND member_id = $2)",
        )
        .bind(project_id)
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_project_member(&self, project_id: i64, member_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO project_members (project_id, member_id) VALUES ($1, $2)")
            .bind(project_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        info!(project_id, member_id, "added member to project");
        Ok(())
    }

    async fn topic_by_id(&self, id: i64) -> Result<Option<Topic>, StoreError> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE topic_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(topic)
    }

    async fn topics_by_name(&self, fragment: &str) -> Result<Vec<Topic>, StoreError> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics \
             WHERE topic_name ILIKE '%' || $1 || '%' \
             ORDER BY topic_id"
        ))
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;
        Ok(topics)
    }

    async fn topic_by_exact_name(&self, name: &str) -> Result<Option<Topic>, StoreError> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE LOWER(topic_name) = LOWER($1)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(topic)
    }

    async fn create_topic(&self, new: NewTopic) -> Result<Topic, StoreError> {
        let topic_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO topics (topic_name, topic_description) \
             VALUES ($1, $2) RETURNING topic_id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
        info!(topic_id, "created topic");
        Ok(Topic {
            id: topic_id,
            name: new.name,
            description: new.description,
        })
    }

    async fn topic_meetings(&self, topic_id: i64) -> Result<Vec<MeetingBrief>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT m.meeting_name, m.meeting_kind FROM meetings m \
             JOIN meeting_topics mt ON m.meeting_id = mt.meeting_id \
             WHERE mt.topic_id = $1 \
             ORDER BY m.meeting_id",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(name, kind)| MeetingBrief { name, kind })
            .collect())
    }

    async fn search_members(&self, query: &str, limit: usize) -> Result<Vec<Member>, StoreError> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE member_name ILIKE '%' || $1 || '%' \
                OR email ILIKE '%' || $1 || '%' \
                OR role ILIKE '%' || $1 || '%' \
             ORDER BY member_name LIMIT $2"
        ))
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn search_meetings(&self, query: &str, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        let meetings = sqlx::query_as::<_, Meeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings \
             WHERE meeting_name ILIKE '%' || $1 || '%' \
                OR meeting_summary ILIKE '%' || $1 || '%' \
             ORDER BY meeting_id LIMIT $2"
        ))
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(meetings)
    }

    async fn search_projects(&self, query: &str, limit: usize) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE project_name ILIKE '%' || $1 || '%' \
                OR project_description ILIKE '%' || $1 || '%' \
             ORDER BY project_id LIMIT $2"
        ))
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn search_tasks(&self, query: &str, limit: usize) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE task_name ILIKE '%' || $1 || '%' \
                OR task_description ILIKE '%' || $1 || '%' \
             ORDER BY task_id LIMIT $2"
        ))
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn search_topics(&self, query: &str, limit: usize) -> Result<Vec<Topic>, StoreError> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics \
             WHERE topic_name ILIKE '%' || $1 || '%' \
                OR topic_description ILIKE '%' || $1 || '%' \
             ORDER BY topic_id LIMIT $2"
        ))
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(topics)
    }
}

fn task_brief((name, status, deadline): (String, Option<String>, Option<NaiveDate>)) -> TaskBrief {
    TaskBrief {
        name,
        status: TaskStatus::from_stored(status.as_deref()),
        deadline,
    }
}
