//! Tool catalog.
//!
//! One [`ToolDefinition`] per operation the chat model may call, with the
//! JSON Schema it must satisfy. The schemas are advisory for the model;
//! [`super::ToolRequest::parse`] is what actually enforces argument shape.

use serde::Serialize;
use serde_json::{json, Value};

/// A callable tool as advertised to the chat model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Every tool the executor understands.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // -------- retrieval --------
        ToolDefinition {
            name: "get_my_tasks",
            description: "Get all tasks assigned to the current user (the person chatting). Returns task details including name, description, deadline, and status.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_current_datetime",
            description: "Get the current date and time according to the server where the bot is running.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_my_identity",
            description: "Identify who the current chat user is. Returns their name, role, subgroup, email, and chat ID.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_all_tasks",
            description: "Get all tasks in the system, optionally filtered by status (complete/incomplete).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "status_filter": {
                        "type": "string",
                        "description": "Filter by status: 'complete', 'incomplete', or 'all'",
                        "enum": ["complete", "incomplete", "all"]
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_member_info",
            description: "Get information about a member by name, including email, role, subgroup, and chat ID.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "member_name": {
                        "type": "string",
                        "description": "The name of the member to look up (fuzzy matching supported)"
                    }
                },
                "required": ["member_name"]
            }),
        },
        ToolDefinition {
            name: "get_meeting_info",
            description: "Get information about a meeting including summary, attendees, topics discussed, and tasks assigned. Can search by name or ID.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "meeting_identifier": {
                        "type": "string",
                        "description": "Meeting name (partial match) or meeting ID"
                    }
                },
                "required": ["meeting_identifier"]
            }),
        },
        ToolDefinition {
            name: "get_meetings_for_member",
            description: "Get all meetings that a specific member attended.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "member_name": {
                        "type": "string",
                        "description": "The name of the member"
                    }
                },
                "required": ["member_name"]
            }),
        },
        ToolDefinition {
            name: "get_missed_meetings",
            description: "Get meetings that the current user did NOT attend, along with what was covered.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_project_info",
            description: "Get information about a project including description, team members, and related tasks.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "The name of the project (fuzzy matching supported)"
                    }
                },
                "required": ["project_name"]
            }),
        },
        ToolDefinition {
            name: "get_all_projects",
            description: "Get a list of all projects in the system.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_all_members",
            description: "Get a list of all members.",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_topic_info",
            description: "Get information about a topic and which meetings discussed it.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic_name": {
                        "type": "string",
                        "description": "The name of the topic"
                    }
                },
                "required": ["topic_name"]
            }),
        },
        ToolDefinition {
            name: "search_database",
            description: "General search across the database for any information. Use this when other specific tools don't fit.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "search_query": {
                        "type": "string",
                        "description": "What to search for"
                    },
                    "search_in": {
                        "type": "string",
                        "description": "Where to search: 'members', 'meetings', 'projects', 'tasks', 'topics', or 'all'",
                        "enum": ["members", "meetings", "projects", "tasks", "topics", "all"]
                    }
                },
                "required": ["search_query"]
            }),
        },
        // -------- edits --------
        ToolDefinition {
            name: "update_task_status",
            description: "Update a task's status to 'complete' or 'incomplete'. Use when user says they finished a task or need to reopen one.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_identifier": {
                        "type": "string",
                        "description": "Task name (partial match) or task ID"
                    },
                    "new_status": {
                        "type": "string",
                        "description": "New status: 'complete' or 'incomplete'",
                        "enum": ["complete", "incomplete"]
                    }
                },
                "required": ["task_identifier", "new_status"]
            }),
        },
        ToolDefinition {
            name: "assign_member_to_task",
            description: "Assign a member to an existing task.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_identifier": {
                        "type": "string",
                        "description": "Task name (partial match) or task ID"
                    },
                    "member_name": {
                        "type": "string",
                        "description": "Name of the member to assign"
                    }
                },
                "required": ["task_identifier", "member_name"]
            }),
        },
        ToolDefinition {
            name: "remove_member_from_task",
            description: "Remove a member from a task assignment.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_identifier": {
                        "type": "string",
                        "description": "Task name (partial match) or task ID"
                    },
                    "member_name": {
                        "type": "string",
                        "description": "Name of the member to remove"
                    }
                },
                "required": ["task_identifier", "member_name"]
            }),
        },
        // -------- creation --------
        ToolDefinition {
            name: "create_task",
            description: "Create a new task. Use this whenever the user says they are starting/creating a task. If any required information is missing, ask the user for it.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_name": {
                        "type": "string",
                        "description": "Name/title of the task"
                    },
                    "task_description": {
                        "type": "string",
                        "description": "Detailed description of what needs to be done"
                    },
                    "deadline": {
                        "type": "string",
                        "description": "Deadline in YYYY-MM-DD format, or null if none"
                    },
                    "assigned_to": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of member names to assign this task to. If the user says things like 'for me', you can either put their member name here or set assign_to_current_user=true."
                    },
                    "assign_to_current_user": {
                        "type": "boolean",
                        "description": "Set to true when the user clearly wants the task assigned to themselves (e.g. 'I'm starting a new task for me')."
                    }
                },
                "required": ["task_name"]
            }),
        },
        ToolDefinition {
            name: "create_project",
            description: "Create a new project with optional team members.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "Name of the project"
                    },
                    "project_description": {
                        "type": "string",
                        "description": "Description of the project"
                    },
                    "team_members": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of member names to add to this project"
                    }
                },
                "required": ["project_name"]
            }),
        },
        ToolDefinition {
            name: "add_member_to_project",
            description: "Add a member to an existing project.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "Name of the project"
                    },
                    "member_name": {
                        "type": "string",
                        "description": "Name of the member to add"
                    }
                },
                "required": ["project_name", "member_name"]
            }),
        },
        ToolDefinition {
            name: "create_topic",
            description: "Create a new discussion topic.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic_name": {
                        "type": "string",
                        "description": "Name of the topic"
                    },
                    "topic_description": {
                        "type": "string",
                        "description": "Description of the topic"
                    }
                },
                "required": ["topic_name"]
            }),
        },
        ToolDefinition {
            name: "add_topic_to_meeting",
            description: "Link an existing or new topic to a meeting.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "meeting_identifier": {
                        "type": "string",
                        "description": "Meeting name or ID"
                    },
                    "topic_name": {
                        "type": "string",
                        "description": "Name of the topic to link"
                    }
                },
                "required": ["meeting_identifier", "topic_name"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique() {
        let defs = tool_definitions();
        let mut names: Vec<_> = defs.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn every_schema_is_an_object_with_required_list() {
        for def in tool_definitions() {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(def.input_schema["required"].is_array(), "{}", def.name);
        }
    }
}
