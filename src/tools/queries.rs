//! Read-only tool operations.
//!
//! Each method resolves its inputs, runs the joins it needs, and builds
//! the response payload. Dates render as `YYYY-MM-DD`; absent values
//! render as JSON null so the chat model can tell "none" from "unknown".

use chrono::{Local, NaiveDate};
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::models::{Meeting, Member, StatusFilter, Task, TaskBrief};
use crate::resolver::{resolve_meeting, resolve_project};
use crate::tools::{
    AllTasksArgs, MeetingIdentifierArgs, MemberNameArgs, ProjectNameArgs, SearchArgs, ToolExecutor,
    TopicNameArgs,
};

/// Per-category cap on free-text search results.
const SEARCH_LIMIT: usize = 10;

/// Longest summary excerpt shown for a missed meeting.
const SUMMARY_EXCERPT: usize = 200;

/// Longest description excerpt shown in project listings.
const DESCRIPTION_EXCERPT: usize = 100;

fn date_json(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => json!(d.to_string()),
        None => Value::Null,
    }
}

/// Truncate to at most `limit` characters, appending an ellipsis when
/// anything was cut. Counts chars, not bytes, so multi-byte text cannot
/// split mid-character.
fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{cut}...")
}

fn task_json(task: &Task) -> Value {
    json!({
        "task_id": task.id,
        "name": task.name,
        "description": task.description,
        "deadline": date_json(task.deadline),
        "status": task.status.as_str(),
    })
}

fn task_brief_json(brief: &TaskBrief) -> Value {
    json!({
        "name": brief.name,
        "status": brief.status.as_str(),
        "deadline": date_json(brief.deadline),
    })
}

fn meeting_brief_json(meeting: &Meeting) -> Value {
    json!({
        "meeting_id": meeting.id,
        "name": meeting.name,
        "type": meeting.kind,
        "date": date_json(meeting.date()),
    })
}

fn member_json(member: &Member) -> Value {
    json!({
        "member_id": member.id,
        "name": member.name,
        "email": member.email,
        "role": member.role,
        "subgroup": member.subgroup,
        "chat_id": member.chat_id,
    })
}

impl ToolExecutor {
    pub(super) async fn get_my_identity(&self, caller: Option<i64>) -> Result<Value, ToolError> {
        let member = self.require_caller(caller).await?;
        Ok(json!({
            "message": format!("You are {}.", member.name),
            "member": member_json(&member),
        }))
    }

    pub(super) async fn get_my_tasks(&self, caller: Option<i64>) -> Result<Value, ToolError> {
        let member = self.require_caller(caller).await?;
        let tasks = self.store.tasks_for_member(member.id).await?;
        if tasks.is_empty() {
            return Ok(json!({
                "message": format!("You ({}) have no tasks assigned.", member.name),
                "tasks": [],
            }));
        }
        Ok(json!({
            "message": format!("Found {} task(s) for {}", tasks.len(), member.name),
            "tasks": tasks.iter().map(task_json).collect::<Vec<_>>(),
        }))
    }

    pub(super) fn get_current_datetime() -> Value {
        let now = Local::now();
        json!({
            "current_datetime_iso": now.to_rfc3339(),
            "current_date": now.date_naive().to_string(),
            "current_time": now.format("%H:%M:%S").to_string(),
            "timezone": "server-local",
        })
    }

    pub(super) async fn get_all_tasks(&self, args: AllTasksArgs) -> Result<Value, ToolError> {
        let raw = args.status_filter.as_deref().unwrap_or("all");
        let filter = StatusFilter::parse(raw).ok_or_else(|| {
            ToolError::Validation(
                "Status filter must be 'all', 'complete', or 'incomplete'".to_string(),
            )
        })?;

        let tasks = self.store.list_tasks(filter).await?;
        let mut payloads = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let mut obj = task_json(task);
            obj["assigned_to"] = json!(self.store.task_assignees(task.id).await?);
            payloads.push(obj);
        }

        let mut message = format!("Found {} task(s)", payloads.len());
        if filter != StatusFilter::All {
            message.push_str(&format!(" with status '{raw}'"));
        }
        Ok(json!({ "message": message, "tasks": payloads }))
    }

    pub(super) async fn get_member_info(&self, args: MemberNameArgs) -> Result<Value, ToolError> {
        let member = self.require_member(&args.member_name).await?;
        let projects = self.store.member_projects(member.id).await?;
        let tasks = self.store.tasks_for_member(member.id).await?;
        Ok(json!({
            "member_id": member.id,
            "name": member.name,
            "email": member.email,
            "role": member.role,
            "subgroup": member.subgroup,
            "chat_id": member.chat_id,
            "projects": projects,
            "tasks": tasks
                .iter()
                .map(|t| json!({ "name": t.name, "status": t.status.as_str() }))
                .collect::<Vec<_>>(),
        }))
    }

    pub(super) async fn get_meeting_info(
        &self,
        args: MeetingIdentifierArgs,
    ) -> Result<Value, ToolError> {
        let meeting = resolve_meeting(self.store.as_ref(), &args.meeting_identifier)
            .await?
            .required("meeting", &args.meeting_identifier)?;

        let attendees = self.store.meeting_attendees(meeting.id).await?;
        let topics = self.store.meeting_topics(meeting.id).await?;
        let tasks = self.store.meeting_tasks(meeting.id).await?;
        let projects = self.store.meeting_projects(meeting.id).await?;

        Ok(json!({
            "meeting_id": meeting.id,
            "name": meeting.name,
            "type": meeting.kind,
            "summary": meeting.summary,
            "date": date_json(meeting.date()),
            "attendees": attendees,
            "topics": topics,
            "tasks": tasks
                .iter()
                .map(|t| json!({ "name": t.name, "status": t.status.as_str() }))
                .collect::<Vec<_>>(),
            "projects": projects,
        }))
    }

    pub(super) async fn get_meetings_for_member(
        &self,
        args: MemberNameArgs,
    ) -> Result<Value, ToolError> {
        let member = self.require_member(&args.member_name).await?;
        let meetings = self.store.meetings_for_member(member.id).await?;
        Ok(json!({
            "message": format!("Found {} meeting(s) for {}", meetings.len(), member.name),
            "meetings": meetings.iter().map(meeting_brief_json).collect::<Vec<_>>(),
        }))
    }

    pub(super) async fn get_missed_meetings(
        &self,
        caller: Option<i64>,
    ) -> Result<Value, ToolError> {
        let member = self.require_caller(caller).await?;
        let attended = self.store.attended_meeting_ids(member.id).await?;

        let mut missed = Vec::new();
        for meeting in self.store.list_meetings().await? {
            if attended.contains(&meeting.id) {
                continue;
            }
            let topics = self.store.meeting_topics(meeting.id).await?;
            missed.push(json!({
                "meeting_id": meeting.id,
                "name": meeting.name,
                "type": meeting.kind,
                "date": date_json(meeting.date()),
                "summary": meeting.summary.as_deref().map(|s| excerpt(s, SUMMARY_EXCERPT)),
                "topics": topics,
            }));
        }

        if missed.is_empty() {
            return Ok(json!({
                "message": format!("You ({}) have attended all meetings!", member.name),
                "missed_meetings": [],
            }));
        }
        Ok(json!({
            "message": format!("You missed {} meeting(s)", missed.len()),
            "missed_meetings": missed,
        }))
    }

    pub(super) async fn get_project_info(&self, args: ProjectNameArgs) -> Result<Value, ToolError> {
        let project = resolve_project(self.store.as_ref(), &args.project_name)
            .await?
            .required("project", &args.project_name)?;

        let members = self.store.project_members(project.id).await?;
        let tasks = self.store.project_tasks(project.id).await?;

        Ok(json!({
            "project_id": project.id,
            "name": project.name,
            "description": project.description,
            "team_members": members
                .iter()
                .map(|m| json!({ "name": m.name, "role": m.role }))
                .collect::<Vec<_>>(),
            "tasks": tasks.iter().map(task_brief_json).collect::<Vec<_>>(),
        }))
    }

    pub(super) async fn get_all_projects(&self) -> Result<Value, ToolError> {
        let projects = self.store.list_projects().await?;
        let mut payloads = Vec::with_capacity(projects.len());
        for project in &projects {
            let member_count = self.store.project_member_count(project.id).await?;
            payloads.push(json!({
                "project_id": project.id,
                "name": project.name,
                "description": project
                    .description
                    .as_deref()
                    .map(|d| excerpt(d, DESCRIPTION_EXCERPT)),
                "member_count": member_count,
            }));
        }
        Ok(json!({
            "message": format!("Found {} project(s)", payloads.len()),
            "projects": payloads,
        }))
    }

    pub(super) async fn get_all_members(&self) -> Result<Value, ToolError> {
        let members = self.store.list_members().await?;
        Ok(json!({
            "message": format!("Found {} member(s)", members.len()),
            "members": members
                .iter()
                .map(|m| json!({
                    "member_id": m.id,
                    "name": m.name,
                    "role": m.role,
                    "subgroup": m.subgroup,
                    "email": m.email,
                }))
                .collect::<Vec<_>>(),
        }))
    }

    pub(super) async fn get_topic_info(&self, args: TopicNameArgs) -> Result<Value, ToolError> {
        // First substring hit wins; topics are informal enough that
        // disambiguation would be noise.
        let topics = self.store.topics_by_name(&args.topic_name).await?;
        let Some(topic) = topics.into_iter().next() else {
            return Err(ToolError::NotFound {
                entity: "topic",
                input: args.topic_name,
            });
        };
        let meetings = self.store.topic_meetings(topic.id).await?;
        Ok(json!({
            "topic_id": topic.id,
            "name": topic.name,
            "description": topic.description,
            "discussed_in_meetings": meetings
                .iter()
                .map(|m| json!({ "name": m.name, "type": m.kind }))
                .collect::<Vec<_>>(),
        }))
    }

    pub(super) async fn search_database(&self, args: SearchArgs) -> Result<Value, ToolError> {
        let scope = args.search_in.as_deref().unwrap_or("all");
        const SCOPES: [&str; 6] = ["members", "meetings", "projects", "tasks", "topics", "all"];
        if !SCOPES.contains(&scope) {
            return Err(ToolError::Validation(format!(
                "search_in must be one of 'members', 'meetings', 'projects', 'tasks', 'topics', or 'all', got '{scope}'"
            )));
        }

        let query = &args.search_query;
        let mut results = Map::new();

        if scope == "members" || scope == "all" {
            let members = self.store.search_members(query, SEARCH_LIMIT).await?;
            if !members.is_empty() {
                results.insert(
                    "members".to_string(),
                    members
                        .iter()
                        .map(|m| json!({ "name": m.name, "role": m.role, "email": m.email }))
                        .collect(),
                );
            }
        }
        if scope == "meetings" || scope == "all" {
            let meetings = self.store.search_meetings(query, SEARCH_LIMIT).await?;
            if !meetings.is_empty() {
                results.insert(
                    "meetings".to_string(),
                    meetings
                        .iter()
                        .map(|m| json!({ "name": m.name, "type": m.kind }))
                        .collect(),
                );
            }
        }
        if scope == "projects" || scope == "all" {
            let projects = self.store.search_projects(query, SEARCH_LIMIT).await?;
            if !projects.is_empty() {
                results.insert(
                    "projects".to_string(),
                    projects
                        .iter()
                        .map(|p| {
                            json!({
                                "name": p.name,
                                "description": p
                                    .description
                                    .as_deref()
                                    .map(|d| excerpt(d, DESCRIPTION_EXCERPT)),
                            })
                        })
                        .collect(),
                );
            }
        }
        if scope == "tasks" || scope == "all" {
            let tasks = self.store.search_tasks(query, SEARCH_LIMIT).await?;
            if !tasks.is_empty() {
                results.insert(
                    "tasks".to_string(),
                    tasks
                        .iter()
                        .map(|t| json!({ "name": t.name, "status": t.status.as_str() }))
                        .collect(),
                );
            }
        }
        if scope == "topics" || scope == "all" {
            let topics = self.store.search_topics(query, SEARCH_LIMIT).await?;
            if !topics.is_empty() {
                results.insert(
                    "topics".to_string(),
                    topics.iter().map(|t| json!({ "name": t.name })).collect(),
                );
            }
        }

        if results.is_empty() {
            return Ok(json!({ "message": format!("No results found for '{query}'") }));
        }
        Ok(json!({
            "message": format!("Search results for '{query}'"),
            "results": Value::Object(results),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_counts_chars_not_bytes() {
        let short = "brief summary";
        assert_eq!(excerpt(short, 200), short);

        let long = "x".repeat(250);
        let cut = excerpt(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));

        // Multi-byte input must not split mid-character.
        let unicode = "é".repeat(150);
        let cut = excerpt(&unicode, 100);
        assert!(cut.starts_with("é"));
        assert!(cut.ends_with("..."));
    }
}
