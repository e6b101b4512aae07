//! Write tool operations.
//!
//! Edits and creations. Every member name is resolved before anything is
//! written, so a bad name in a list aborts the whole call; composite
//! inserts go through the store's transactional methods and land
//! all-or-nothing.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::models::{Member, NewProject, NewTask, NewTopic, TaskStatus};
use crate::resolver::{resolve_meeting, resolve_project, resolve_task};
use crate::store::TopicLink;
use crate::tools::{
    AddTopicToMeetingArgs, CreateProjectArgs, CreateTaskArgs, CreateTopicArgs, ProjectMemberArgs,
    TaskMemberArgs, ToolExecutor, UpdateTaskStatusArgs,
};

impl ToolExecutor {
    pub(super) async fn update_task_status(
        &self,
        args: UpdateTaskStatusArgs,
    ) -> Result<Value, ToolError> {
        let new_status = TaskStatus::parse(&args.new_status).ok_or_else(|| {
            ToolError::Validation("Status must be 'complete' or 'incomplete'".to_string())
        })?;

        let task = resolve_task(self.store.as_ref(), &args.task_identifier)
            .await?
            .required("task", &args.task_identifier)?;

        let old_status = task.status;
        self.store.set_task_status(task.id, new_status).await?;

        Ok(json!({
            "success": true,
            "message": format!(
                "Task '{}' status updated from '{old_status}' to '{new_status}'",
                task.name
            ),
            "task_id": task.id,
            "task_name": task.name,
            "old_status": old_status.as_str(),
            "new_status": new_status.as_str(),
        }))
    }

    pub(super) async fn assign_member_to_task(
        &self,
        args: TaskMemberArgs,
    ) -> Result<Value, ToolError> {
        let member = self.require_member(&args.member_name).await?;
        let task = resolve_task(self.store.as_ref(), &args.task_identifier)
            .await?
            .required("task", &args.task_identifier)?;

        if self.store.task_assignment_exists(task.id, member.id).await? {
            return Err(ToolError::Conflict(format!(
                "{} is already assigned to '{}'",
                member.name, task.name
            )));
        }
        self.store.add_task_assignment(task.id, member.id).await?;

        Ok(json!({
            "success": true,
            "message": format!("Assigned {} to task '{}'", member.name, task.name),
            "task_id": task.id,
            "task_name": task.name,
            "member_name": member.name,
        }))
    }

    pub(super) async fn remove_member_from_task(
        &self,
        args: TaskMemberArgs,
    ) -> Result<Value, ToolError> {
        let member = self.require_member(&args.member_name).await?;
        let task = resolve_task(self.store.as_ref(), &args.task_identifier)
            .await?
            .required("task", &args.task_identifier)?;

        let removed = self
            .store
            .remove_task_assignment(task.id, member.id)
            .await?;
        if removed == 0 {
            return Err(ToolError::Conflict(format!(
                "{} was not assigned to '{}'",
                member.name, task.name
            )));
        }
        Ok(json!({
            "success": true,
            "message": format!("Removed {} from task '{}'", member.name, task.name),
        }))
    }

    pub(super) async fn create_task(
        &self,
        args: CreateTaskArgs,
        caller: Option<i64>,
    ) -> Result<Value, ToolError> {
        let deadline = parse_deadline(args.deadline.as_deref())?;

        // Resolve everyone before touching the database.
        let mut assignees: Vec<Member> = Vec::with_capacity(args.assigned_to.len());
        for name in &args.assigned_to {
            assignees.push(self.require_member(name).await?);
        }
        if args.assign_to_current_user {
            let current = self.require_caller(caller).await?;
            if !assignees.iter().any(|m| m.id == current.id) {
                assignees.push(current);
            }
        }

        let new = NewTask {
            name: args.task_name.clone(),
            description: args.task_description,
            deadline,
            status: TaskStatus::Incomplete,
        };
        let ids: Vec<i64> = assignees.iter().map(|m| m.id).collect();
        let task = self.store.create_task(new, &ids).await?;
        tracing::info!(task_id = task.id, assignees = ids.len(), "created task");

        let names: Vec<&str> = assignees.iter().map(|m| m.name.as_str()).collect();
        let mut message = format!("Created task '{}'", task.name);
        if !names.is_empty() {
            message.push_str(&format!(" and assigned to {}", names.join(", ")));
        }
        Ok(json!({
            "success": true,
            "message": message,
            "task_id": task.id,
            "task_name": task.name,
            "deadline": task.deadline.map(|d| d.to_string()),
            "assigned_to": names,
        }))
    }

    pub(super) async fn create_project(&self, args: CreateProjectArgs) -> Result<Value, ToolError> {
        let mut members: Vec<Member> = Vec::with_capacity(args.team_members.len());
        for name in &args.team_members {
            members.push(self.require_member(name).await?);
        }

        if self
            .store
            .project_by_exact_name(&args.project_name)
            .await?
            .is_some()
        {
            return Err(ToolError::Conflict(format!(
                "A project named '{}' already exists",
                args.project_name
            )));
        }

        let new = NewProject {
            name: args.project_name.clone(),
            description: args.project_description,
        };
        let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
        let project = self.store.create_project(new, &ids).await?;
        tracing::info!(project_id = project.id, members = ids.len(), "created project");

        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        let mut message = format!("Created project '{}'", project.name);
        if !names.is_empty() {
            message.push_str(&format!(" with team: {}", names.join(", ")));
        }
        Ok(json!({
            "success": true,
            "message": message,
            "project_id": project.id,
            "project_name": project.name,
            "team_members": names,
        }))
    }

    pub(super) async fn add_member_to_project(
        &self,
        args: ProjectMemberArgs,
    ) -> Result<Value, ToolError> {
        let member = self.require_member(&args.member_name).await?;
        let project = resolve_project(self.store.as_ref(), &args.project_name)
            .await?
            .required("project", &args.project_name)?;

        if self
            .store
            .project_membership_exists(project.id, member.id)
            .await?
        {
            return Err(ToolError::Conflict(format!(
                "{} is already a member of '{}'",
                member.name, project.name
            )));
        }
        self.store.add_project_member(project.id, member.id).await?;

        Ok(json!({
            "success": true,
            "message": format!("Added {} to project '{}'", member.name, project.name),
        }))
    }

    pub(super) async fn create_topic(&self, args: CreateTopicArgs) -> Result<Value, ToolError> {
        if self
            .store
            .topic_by_exact_name(&args.topic_name)
            .await?
            .is_some()
        {
            return Err(ToolError::Conflict(format!(
                "A topic named '{}' already exists",
                args.topic_name
            )));
        }

        let topic = self
            .store
            .create_topic(NewTopic {
                name: args.topic_name,
                description: args.topic_description,
            })
            .await?;
        tracing::info!(topic_id = topic.id, "created topic");

        Ok(json!({
            "success": true,
            "message": format!("Created topic '{}'", topic.name),
            "topic_id": topic.id,
            "topic_name": topic.name,
        }))
    }

    pub(super) async fn add_topic_to_meeting(
        &self,
        args: AddTopicToMeetingArgs,
    ) -> Result<Value, ToolError> {
        let meeting = resolve_meeting(self.store.as_ref(), &args.meeting_identifier)
            .await?
            .required("meeting", &args.meeting_identifier)?;

        // The one operation that auto-creates its dependency: no substring
        // hit means a brand-new topic, created inside the link transaction.
        let existing = self.store.topics_by_name(&args.topic_name).await?;
        let link = match existing.first() {
            Some(topic) => TopicLink::Existing(topic.id),
            None => TopicLink::Create(&args.topic_name),
        };

        let outcome = self.store.link_meeting_topic(meeting.id, link).await?;
        if outcome.already_linked {
            return Err(ToolError::Conflict(format!(
                "Topic '{}' is already linked to meeting '{}'",
                outcome.topic_name, meeting.name
            )));
        }
        tracing::info!(
            meeting_id = meeting.id,
            topic_id = outcome.topic_id,
            "linked topic to meeting"
        );

        Ok(json!({
            "success": true,
            "message": format!(
                "Linked topic '{}' to meeting '{}'",
                outcome.topic_name, meeting.name
            ),
        }))
    }
}

/// Parse an optional `YYYY-MM-DD` deadline. The literal string "null"
/// (any case) counts as absent; chat models emit it verbatim.
fn parse_deadline(raw: Option<&str>) -> Result<Option<NaiveDate>, ToolError> {
    let Some(raw) = raw else { return Ok(None) };
    if raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            ToolError::Validation("Invalid deadline format. Please use YYYY-MM-DD".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_accepts_iso_dates_and_literal_null() {
        assert_eq!(
            parse_deadline(Some("2026-09-01")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert_eq!(parse_deadline(Some("null")).unwrap(), None);
        assert_eq!(parse_deadline(Some("NULL")).unwrap(), None);
        assert_eq!(parse_deadline(None).unwrap(), None);
    }

    #[test]
    fn deadline_rejects_other_formats() {
        for bad in ["01/09/2026", "next tuesday", "2026-9-1x", ""] {
            let err = parse_deadline(Some(bad)).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid deadline format. Please use YYYY-MM-DD",
                "input: {bad:?}"
            );
        }
    }
}
