//! Tool routing and execution.
//!
//! [`ToolRequest`] is the closed set of operations the chat model may
//! invoke; parsing a name/arguments pair either yields a typed request or
//! a validation error, so the operation bodies never see raw JSON.
//! [`ToolExecutor`] owns the store and the member resolver and folds every
//! outcome into the uniform response envelope: no tool invocation ever
//! propagates a failure to the chat layer.

mod catalog;
mod mutations;
mod queries;

pub use catalog::{tool_definitions, ToolDefinition};

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ResolverConfig;
use crate::error::ToolError;
use crate::models::Member;
use crate::resolver::MemberResolver;
use crate::store::Store;

// ---- per-tool argument shapes ----

#[derive(Debug, Deserialize)]
pub struct AllTasksArgs {
    #[serde(default)]
    pub status_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MemberNameArgs {
    pub member_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MeetingIdentifierArgs {
    pub meeting_identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNameArgs {
    pub project_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicNameArgs {
    pub topic_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub search_query: String,
    #[serde(default)]
    pub search_in: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusArgs {
    pub task_identifier: String,
    pub new_status: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskMemberArgs {
    pub task_identifier: String,
    pub member_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskArgs {
    pub task_name: String,
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub assign_to_current_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectArgs {
    pub project_name: String,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub team_members: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectMemberArgs {
    pub project_name: String,
    pub member_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTopicArgs {
    pub topic_name: String,
    #[serde(default)]
    pub topic_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddTopicToMeetingArgs {
    pub meeting_identifier: String,
    pub topic_name: String,
}

/// A fully-typed tool invocation. One variant per catalog entry.
#[derive(Debug)]
pub enum ToolRequest {
    GetMyTasks,
    GetCurrentDatetime,
    GetMyIdentity,
    GetAllTasks(AllTasksArgs),
    GetMemberInfo(MemberNameArgs),
    GetMeetingInfo(MeetingIdentifierArgs),
    GetMeetingsForMember(MemberNameArgs),
    GetMissedMeetings,
    GetProjectInfo(ProjectNameArgs),
    GetAllProjects,
    GetAllMembers,
    GetTopicInfo(TopicNameArgs),
    SearchDatabase(SearchArgs),
    UpdateTaskStatus(UpdateTaskStatusArgs),
    AssignMemberToTask(TaskMemberArgs),
    RemoveMemberFromTask(TaskMemberArgs),
    CreateTask(CreateTaskArgs),
    CreateProject(CreateProjectArgs),
    AddMemberToProject(ProjectMemberArgs),
    CreateTopic(CreateTopicArgs),
    AddTopicToMeeting(AddTopicToMeetingArgs),
}

impl ToolRequest {
    /// Parse a tool name and raw argument object into a typed request.
    ///
    /// `null` arguments count as an empty object (chat models often send
    /// nothing for no-argument tools). A missing or mistyped field is a
    /// validation error naming the tool; a name outside the catalog is
    /// `UnknownTool`.
    pub fn parse(name: &str, args: Value) -> Result<Self, ToolError> {
        fn typed<T: serde::de::DeserializeOwned>(name: &str, args: Value) -> Result<T, ToolError> {
            let args = if args.is_null() { json!({}) } else { args };
            serde_json::from_value(args)
                .map_err(|e| ToolError::Validation(format!("Invalid arguments for '{name}': {e}")))
        }

        Ok(match name {
            "get_my_tasks" => Self::GetMyTasks,
            "get_current_datetime" => Self::GetCurrentDatetime,
            "get_my_identity" => Self::GetMyIdentity,
            "get_all_tasks" => Self::GetAllTasks(typed(name, args)?),
            "get_member_info" => Self::GetMemberInfo(typed(name, args)?),
            "get_meeting_info" => Self::GetMeetingInfo(typed(name, args)?),
            "get_meetings_for_member" => Self::GetMeetingsForMember(typed(name, args)?),
            "get_missed_meetings" => Self::GetMissedMeetings,
            "get_project_info" => Self::GetProjectInfo(typed(name, args)?),
            "get_all_projects" => Self::GetAllProjects,
            "get_all_members" => Self::GetAllMembers,
            "get_topic_info" => Self::GetTopicInfo(typed(name, args)?),
            "search_database" => Self::SearchDatabase(typed(name, args)?),
            "update_task_status" => Self::UpdateTaskStatus(typed(name, args)?),
            "assign_member_to_task" => Self::AssignMemberToTask(typed(name, args)?),
            "remove_member_from_task" => Self::RemoveMemberFromTask(typed(name, args)?),
            "create_task" => Self::CreateTask(typed(name, args)?),
            "create_project" => Self::CreateProject(typed(name, args)?),
            "add_member_to_project" => Self::AddMemberToProject(typed(name, args)?),
            "create_topic" => Self::CreateTopic(typed(name, args)?),
            "add_topic_to_meeting" => Self::AddTopicToMeeting(typed(name, args)?),
            other => return Err(ToolError::UnknownTool(other.to_string())),
        })
    }
}

/// Executes tool invocations against a store.
///
/// `caller` on [`ToolExecutor::execute`] is the chat identity of the
/// person speaking; tools that act on "me" resolve it to a member row and
/// fail with the identity-unlinked message when they cannot.
pub struct ToolExecutor {
    store: Arc<dyn Store>,
    members: MemberResolver,
}

impl ToolExecutor {
    pub fn new(store: Arc<dyn Store>, config: ResolverConfig) -> Self {
        let members = MemberResolver::new(Arc::clone(&store), config);
        Self { store, members }
    }

    /// The member resolver, exposed so callers can invalidate its index
    /// after out-of-band member-table changes.
    pub fn members(&self) -> &MemberResolver {
        &self.members
    }

    /// Execute one tool invocation. Always returns a response envelope;
    /// failures become `{"error": ...}` and only server-side faults are
    /// logged.
    pub async fn execute(&self, name: &str, args: Value, caller: Option<i64>) -> Value {
        match self.dispatch(name, args, caller).await {
            Ok(payload) => payload,
            Err(err) => {
                if err.is_server_fault() {
                    tracing::error!(tool = name, error = %err, "tool execution failed");
                }
                err.into_envelope()
            }
        }
    }

    async fn dispatch(
        &self,
        name: &str,
        args: Value,
        caller: Option<i64>,
    ) -> Result<Value, ToolError> {
        match ToolRequest::parse(name, args)? {
            ToolRequest::GetMyTasks => self.get_my_tasks(caller).await,
            ToolRequest::GetCurrentDatetime => Ok(Self::get_current_datetime()),
            ToolRequest::GetMyIdentity => self.get_my_identity(caller).await,
            ToolRequest::GetAllTasks(args) => self.get_all_tasks(args).await,
            ToolRequest::GetMemberInfo(args) => self.get_member_info(args).await,
            ToolRequest::GetMeetingInfo(args) => self.get_meeting_info(args).await,
            ToolRequest::GetMeetingsForMember(args) => self.get_meetings_for_member(args).await,
            ToolRequest::GetMissedMeetings => self.get_missed_meetings(caller).await,
            ToolRequest::GetProjectInfo(args) => self.get_project_info(args).await,
            ToolRequest::GetAllProjects => self.get_all_projects().await,
            ToolRequest::GetAllMembers => self.get_all_members().await,
            ToolRequest::GetTopicInfo(args) => self.get_topic_info(args).await,
            ToolRequest::SearchDatabase(args) => self.search_database(args).await,
            ToolRequest::UpdateTaskStatus(args) => self.update_task_status(args).await,
            ToolRequest::AssignMemberToTask(args) => self.assign_member_to_task(args).await,
            ToolRequest::RemoveMemberFromTask(args) => self.remove_member_from_task(args).await,
            ToolRequest::CreateTask(args) => self.create_task(args, caller).await,
            ToolRequest::CreateProject(args) => self.create_project(args).await,
            ToolRequest::AddMemberToProject(args) => self.add_member_to_project(args).await,
            ToolRequest::CreateTopic(args) => self.create_topic(args).await,
            ToolRequest::AddTopicToMeeting(args) => self.add_topic_to_meeting(args).await,
        }
    }

    /// Resolve the caller's chat identity to a member row.
    async fn require_caller(&self, caller: Option<i64>) -> Result<Member, ToolError> {
        let chat_id = caller.ok_or(ToolError::IdentityUnlinked)?;
        self.store
            .member_by_chat_id(chat_id)
            .await?
            .ok_or(ToolError::IdentityUnlinked)
    }

    /// Resolve a conversational member name or fail with the standard
    /// not-found error.
    async fn require_member(&self, name: &str) -> Result<Member, ToolError> {
        self.members
            .resolve(name)
            .await?
            .ok_or_else(|| ToolError::NotFound {
                entity: "member",
                input: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn executor() -> ToolExecutor {
        ToolExecutor::new(Arc::new(MemStore::new()), ResolverConfig::default())
    }

    #[test]
    fn every_catalog_entry_parses() {
        // Names in the catalog and names the router accepts must stay in
        // lockstep; feed each tool a plausible full argument set.
        let args = json!({
            "status_filter": "all",
            "member_name": "x",
            "meeting_identifier": "x",
            "project_name": "x",
            "topic_name": "x",
            "search_query": "x",
            "search_in": "all",
            "task_identifier": "x",
            "new_status": "complete",
            "task_name": "x",
            "task_description": "x",
            "deadline": "2026-01-01",
            "assigned_to": [],
            "assign_to_current_user": false,
            "project_description": "x",
            "team_members": [],
            "topic_description": "x"
        });
        for def in tool_definitions() {
            assert!(
                ToolRequest::parse(def.name, args.clone()).is_ok(),
                "catalog tool '{}' failed to parse",
                def.name
            );
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = ToolRequest::parse("drop_all_tables", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: drop_all_tables");
    }

    #[test]
    fn null_arguments_count_as_empty() {
        assert!(ToolRequest::parse("get_all_tasks", Value::Null).is_ok());
        assert!(ToolRequest::parse("get_member_info", Value::Null).is_err());
    }

    #[test]
    fn missing_required_field_is_a_validation_error() {
        let err = ToolRequest::parse("get_member_info", json!({})).unwrap_err();
        let msg = err.to_string();
        assert!(
            msg.starts_with("Invalid arguments for 'get_member_info':"),
            "{msg}"
        );
    }

    #[tokio::test]
    async fn unknown_tool_yields_error_envelope() {
        let env = executor().execute("not_a_tool", json!({}), None).await;
        assert_eq!(env["error"], "Unknown tool: not_a_tool");
    }

    #[tokio::test]
    async fn unlinked_caller_gets_identity_message() {
        let env = executor().execute("get_my_tasks", json!({}), None).await;
        assert_eq!(env["error"], crate::error::IDENTITY_UNLINKED);

        let env = executor()
            .execute("get_my_identity", json!({}), Some(404))
            .await;
        assert_eq!(env["error"], crate::error::IDENTITY_UNLINKED);
    }
}
