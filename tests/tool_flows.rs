//! End-to-end tool flows over the in-memory store.
//!
//! Every call goes through `ToolExecutor::execute`, the same entry point
//! the chat layer uses, so these exercise parsing, resolution, the
//! operation body, and envelope rendering together.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};

use secretary_tools::{MemStore, ResolverConfig, ToolExecutor};

const ALICE_CHAT: i64 = 1001;

struct Fixture {
    store: Arc<MemStore>,
    executor: ToolExecutor,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemStore::new());
        let executor = ToolExecutor::new(store.clone(), ResolverConfig::default());
        Self { store, executor }
    }

    async fn call(&self, tool: &str, args: Value, caller: Option<i64>) -> Value {
        self.executor.execute(tool, args, caller).await
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Alice (linked to ALICE_CHAT), Bob, and two Cams who share a first name.
fn seed_members(store: &MemStore) -> (i64, i64) {
    let alice = store.seed_member(
        "Alice Nguyen",
        Some(ALICE_CHAT),
        Some("President"),
        Some("Events"),
        Some("alice@example.org"),
    );
    let bob = store.seed_member(
        "Bob Okafor",
        None,
        Some("Treasurer"),
        None,
        Some("bob@example.org"),
    );
    store.seed_member("Cam Reyes", None, None, None, None);
    store.seed_member("Cam Silva", None, None, None, None);
    (alice, bob)
}

// ---- identity ----

#[tokio::test]
async fn identity_round_trip() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    let env = fx.call("get_my_identity", json!({}), Some(ALICE_CHAT)).await;
    assert_eq!(env["message"], "You are Alice Nguyen.");
    assert_eq!(env["member"]["role"], "President");
    assert_eq!(env["member"]["chat_id"], ALICE_CHAT);
}

#[tokio::test]
async fn unlinked_chat_account_gets_fixed_message() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    for (tool, caller) in [
        ("get_my_identity", Some(9999)),
        ("get_my_tasks", None),
        ("get_missed_meetings", Some(9999)),
    ] {
        let env = fx.call(tool, json!({}), caller).await;
        assert_eq!(
            env["error"],
            "Could not find your member record. Your chat account may not be linked yet.",
            "tool: {tool}"
        );
    }
}

// ---- member resolution through tools ----

#[tokio::test]
async fn member_info_tolerates_noisy_names() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    for input in [
        "Bob Okafor",
        "bob okafor",
        "Bob",
        "Bob Okafor (the treasurer!)",
        "Bob Okafr",
    ] {
        let env = fx
            .call("get_member_info", json!({ "member_name": input }), None)
            .await;
        assert_eq!(env["name"], "Bob Okafor", "input: {input:?}");
    }
}

#[tokio::test]
async fn shared_first_name_misses_instead_of_guessing() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    let env = fx
        .call("get_member_info", json!({ "member_name": "Cam" }), None)
        .await;
    assert_eq!(env["error"], "Could not find a member matching 'Cam'");

    let env = fx
        .call("get_member_info", json!({ "member_name": "Cam Silva" }), None)
        .await;
    assert_eq!(env["name"], "Cam Silva");
}

// ---- task listings ----

#[tokio::test]
async fn tasks_order_by_deadline_with_nulls_last() {
    let fx = Fixture::new();
    let (alice, _) = seed_members(&fx.store);

    let late = fx
        .store
        .seed_task("Late", None, Some(date(2026, 12, 1)), None);
    let undated = fx.store.seed_task("Undated", None, None, None);
    let soon = fx
        .store
        .seed_task("Soon", None, Some(date(2026, 9, 5)), None);
    for id in [late, undated, soon] {
        fx.store.link_task_member(id, alice);
    }

    let env = fx.call("get_my_tasks", json!({}), Some(ALICE_CHAT)).await;
    let names: Vec<&str> = env["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Soon", "Late", "Undated"]);
}

#[tokio::test]
async fn null_status_rows_count_as_incomplete() {
    let fx = Fixture::new();
    fx.store.seed_task("No status", None, None, None);
    fx.store.seed_task("Odd status", None, None, Some("wip"));
    fx.store.seed_task("Done", None, None, Some("complete"));

    let env = fx
        .call("get_all_tasks", json!({ "status_filter": "incomplete" }), None)
        .await;
    assert_eq!(env["message"], "Found 2 task(s) with status 'incomplete'");
    for task in env["tasks"].as_array().unwrap() {
        assert_eq!(task["status"], "incomplete");
    }

    let env = fx
        .call("get_all_tasks", json!({ "status_filter": "complete" }), None)
        .await;
    assert_eq!(env["message"], "Found 1 task(s) with status 'complete'");

    let env = fx.call("get_all_tasks", json!({}), None).await;
    assert_eq!(env["message"], "Found 3 task(s)");
}

#[tokio::test]
async fn empty_task_list_message_names_the_caller() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    let env = fx.call("get_my_tasks", json!({}), Some(ALICE_CHAT)).await;
    assert_eq!(env["message"], "You (Alice Nguyen) have no tasks assigned.");
    assert_eq!(env["tasks"].as_array().map(Vec::len), Some(0));
}

// ---- disambiguation ----

#[tokio::test]
async fn ambiguous_task_reference_caps_candidates_at_five() {
    let fx = Fixture::new();
    for i in 1..=7 {
        fx.store
            .seed_task(&format!("Quarterly report part {i}"), None, None, None);
    }

    let env = fx
        .call(
            "update_task_status",
            json!({ "task_identifier": "report", "new_status": "complete" }),
            None,
        )
        .await;
    assert_eq!(
        env["error"],
        "Multiple tasks match 'report'. Please be more specific."
    );
    let matches = env["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 5);
    assert!(matches[0]["id"].is_i64());
    assert!(matches[0]["name"].is_string());
}

#[tokio::test]
async fn numeric_task_identifier_bypasses_name_search() {
    let fx = Fixture::new();
    let target = fx.store.seed_task("Book venue", None, None, None);
    fx.store.seed_task("Book catering", None, None, None);

    let env = fx
        .call(
            "update_task_status",
            json!({ "task_identifier": target.to_string(), "new_status": "complete" }),
            None,
        )
        .await;
    assert_eq!(env["success"], true);
    assert_eq!(env["task_id"], target);
    assert_eq!(
        env["message"],
        "Task 'Book venue' status updated from 'incomplete' to 'complete'"
    );
}

#[tokio::test]
async fn exact_project_name_narrows_multiple_substring_hits() {
    let fx = Fixture::new();
    fx.store.seed_project("Gala", Some("Annual gala"));
    fx.store.seed_project("Gala Sponsorship", None);

    let env = fx
        .call("get_project_info", json!({ "project_name": "gala" }), None)
        .await;
    assert_eq!(env["name"], "Gala");
    assert_eq!(env["description"], "Annual gala");
}

// ---- assignments ----

#[tokio::test]
async fn duplicate_assignment_is_rejected_and_nothing_is_written() {
    let fx = Fixture::new();
    seed_members(&fx.store);
    fx.store.seed_task("Audit books", None, None, None);

    let args = json!({ "task_identifier": "audit", "member_name": "Bob" });
    let env = fx.call("assign_member_to_task", args.clone(), None).await;
    assert_eq!(env["message"], "Assigned Bob Okafor to task 'Audit books'");
    assert_eq!(fx.store.task_assignment_count(), 1);

    let env = fx.call("assign_member_to_task", args, None).await;
    assert_eq!(
        env["error"],
        "Bob Okafor is already assigned to 'Audit books'"
    );
    assert_eq!(fx.store.task_assignment_count(), 1);
}

#[tokio::test]
async fn removing_a_missing_assignment_is_an_error() {
    let fx = Fixture::new();
    seed_members(&fx.store);
    fx.store.seed_task("Audit books", None, None, None);

    let env = fx
        .call(
            "remove_member_from_task",
            json!({ "task_identifier": "audit", "member_name": "Bob" }),
            None,
        )
        .await;
    assert_eq!(env["error"], "Bob Okafor was not assigned to 'Audit books'");
}

// ---- creation ----

#[tokio::test]
async fn create_task_is_all_or_nothing_on_bad_assignee() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    let env = fx
        .call(
            "create_task",
            json!({
                "task_name": "Book photographer",
                "assigned_to": ["Bob", "Zo Nobody"],
            }),
            None,
        )
        .await;
    assert_eq!(env["error"], "Could not find a member matching 'Zo Nobody'");
    assert_eq!(fx.store.task_count(), 0);
    assert_eq!(fx.store.task_assignment_count(), 0);
}

#[tokio::test]
async fn create_task_dedupes_self_assignment() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    let env = fx
        .call(
            "create_task",
            json!({
                "task_name": "Draft agenda",
                "deadline": "2026-09-15",
                "assigned_to": ["Alice Nguyen"],
                "assign_to_current_user": true,
            }),
            Some(ALICE_CHAT),
        )
        .await;
    assert_eq!(
        env["message"],
        "Created task 'Draft agenda' and assigned to Alice Nguyen"
    );
    assert_eq!(env["deadline"], "2026-09-15");
    assert_eq!(fx.store.task_assignment_count(), 1);
}

#[tokio::test]
async fn create_task_rejects_bad_deadline_and_accepts_literal_null() {
    let fx = Fixture::new();

    let env = fx
        .call(
            "create_task",
            json!({ "task_name": "X", "deadline": "someday" }),
            None,
        )
        .await;
    assert_eq!(env["error"], "Invalid deadline format. Please use YYYY-MM-DD");
    assert_eq!(fx.store.task_count(), 0);

    let env = fx
        .call(
            "create_task",
            json!({ "task_name": "X", "deadline": "null" }),
            None,
        )
        .await;
    assert_eq!(env["success"], true);
    assert_eq!(env["deadline"], Value::Null);
}

#[tokio::test]
async fn duplicate_project_and_topic_names_are_rejected_case_insensitively() {
    let fx = Fixture::new();
    fx.store.seed_project("Mentorship", None);
    fx.store.seed_topic("Budget Review", None);

    let env = fx
        .call("create_project", json!({ "project_name": "mentorship" }), None)
        .await;
    assert_eq!(env["error"], "A project named 'mentorship' already exists");

    let env = fx
        .call("create_topic", json!({ "topic_name": "BUDGET REVIEW" }), None)
        .await;
    assert_eq!(env["error"], "A topic named 'BUDGET REVIEW' already exists");
}

#[tokio::test]
async fn create_project_with_team_reports_names() {
    let fx = Fixture::new();
    seed_members(&fx.store);

    let env = fx
        .call(
            "create_project",
            json!({
                "project_name": "Mentorship",
                "project_description": "Pair new members with mentors",
                "team_members": ["Alice Nguyen", "Bob"],
            }),
            None,
        )
        .await;
    assert_eq!(
        env["message"],
        "Created project 'Mentorship' with team: Alice Nguyen, Bob Okafor"
    );

    let env = fx
        .call("get_project_info", json!({ "project_name": "Mentorship" }), None)
        .await;
    assert_eq!(env["team_members"].as_array().map(Vec::len), Some(2));
}

// ---- topic linking ----

#[tokio::test]
async fn topic_linking_creates_when_missing_and_rejects_duplicates() {
    let fx = Fixture::new();
    let meeting = fx.store.seed_meeting("August Sync", None, None, None);

    let args = json!({
        "meeting_identifier": meeting.to_string(),
        "topic_name": "Venue options",
    });
    let env = fx.call("add_topic_to_meeting", args.clone(), None).await;
    assert_eq!(
        env["message"],
        "Linked topic 'Venue options' to meeting 'August Sync'"
    );

    // Second link of the same pair reports the conflict instead of
    // writing a duplicate row.
    let env = fx.call("add_topic_to_meeting", args, None).await;
    assert_eq!(
        env["error"],
        "Topic 'Venue options' is already linked to meeting 'August Sync'"
    );

    // The topic was created and is now queryable.
    let env = fx
        .call("get_topic_info", json!({ "topic_name": "venue" }), None)
        .await;
    assert_eq!(env["name"], "Venue options");
    assert_eq!(
        env["discussed_in_meetings"][0]["name"],
        "August Sync"
    );
}

// ---- missed meetings ----

#[tokio::test]
async fn missed_meetings_excludes_attended_and_truncates_summaries() {
    let fx = Fixture::new();
    let (alice, _) = seed_members(&fx.store);

    let attended = fx.store.seed_meeting("July Sync", None, None, None);
    fx.store.link_meeting_member(attended, alice);

    let long_summary = "m".repeat(500);
    let missed = fx
        .store
        .seed_meeting("August Sync", Some("weekly"), Some(&long_summary), None);
    let topic = fx.store.seed_topic("Budget", None);
    fx.store.link_meeting_topic_pair(missed, topic);

    let env = fx.call("get_missed_meetings", json!({}), Some(ALICE_CHAT)).await;
    assert_eq!(env["message"], "You missed 1 meeting(s)");
    let entry = &env["missed_meetings"][0];
    assert_eq!(entry["name"], "August Sync");
    assert_eq!(entry["topics"][0], "Budget");
    let summary = entry["summary"].as_str().unwrap();
    assert_eq!(summary.len(), 203);
    assert!(summary.ends_with("..."));
}

#[tokio::test]
async fn full_attendance_gets_the_congratulation_message() {
    let fx = Fixture::new();
    let (alice, _) = seed_members(&fx.store);
    let meeting = fx.store.seed_meeting("July Sync", None, None, None);
    fx.store.link_meeting_member(meeting, alice);

    let env = fx.call("get_missed_meetings", json!({}), Some(ALICE_CHAT)).await;
    assert_eq!(env["message"], "You (Alice Nguyen) have attended all meetings!");
}

// ---- search ----

#[tokio::test]
async fn search_omits_empty_categories() {
    let fx = Fixture::new();
    seed_members(&fx.store);
    fx.store.seed_task("Email sponsors", None, None, None);

    let env = fx
        .call("search_database", json!({ "search_query": "sponsor" }), None)
        .await;
    assert_eq!(env["message"], "Search results for 'sponsor'");
    let results = env["results"].as_object().unwrap();
    assert!(results.contains_key("tasks"));
    assert!(!results.contains_key("members"));
    assert!(!results.contains_key("meetings"));
    assert!(!results.contains_key("projects"));
    assert!(!results.contains_key("topics"));
}

#[tokio::test]
async fn search_with_no_hits_has_no_results_key() {
    let fx = Fixture::new();
    let env = fx
        .call("search_database", json!({ "search_query": "xyzzy" }), None)
        .await;
    assert_eq!(env["message"], "No results found for 'xyzzy'");
    assert!(env.get("results").is_none());
}

#[tokio::test]
async fn search_scope_restricts_categories() {
    let fx = Fixture::new();
    seed_members(&fx.store);
    fx.store.seed_task("Call Bob's contact", None, None, None);

    let env = fx
        .call(
            "search_database",
            json!({ "search_query": "bob", "search_in": "members" }),
            None,
        )
        .await;
    let results = env["results"].as_object().unwrap();
    assert!(results.contains_key("members"));
    assert!(!results.contains_key("tasks"));

    let env = fx
        .call(
            "search_database",
            json!({ "search_query": "bob", "search_in": "everywhere" }),
            None,
        )
        .await;
    assert!(env["error"].as_str().unwrap().starts_with("search_in must be"));
}

// ---- envelope discipline ----

#[tokio::test]
async fn unknown_tool_and_bad_arguments_yield_error_envelopes() {
    let fx = Fixture::new();

    let env = fx.call("make_coffee", json!({}), None).await;
    assert_eq!(env["error"], "Unknown tool: make_coffee");

    let env = fx.call("get_member_info", json!({}), None).await;
    assert!(env["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid arguments for 'get_member_info':"));

    let env = fx
        .call(
            "update_task_status",
            json!({ "task_identifier": "x", "new_status": "done" }),
            None,
        )
        .await;
    assert_eq!(env["error"], "Status must be 'complete' or 'incomplete'");
}

#[tokio::test]
async fn get_current_datetime_reports_server_local_time() {
    let fx = Fixture::new();
    let env = fx.call("get_current_datetime", json!({}), None).await;
    assert_eq!(env["timezone"], "server-local");
    assert!(env["current_datetime_iso"].is_string());
    // current_date is a bare ISO date.
    let date = env["current_date"].as_str().unwrap();
    assert!(NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
}
