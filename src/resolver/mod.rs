//! Entity resolution.
//!
//! Tool arguments arrive as free text typed into a chat box. This module
//! turns that text into rows: [`MemberResolver`] handles person names
//! (exact, first-name, then fuzzy), and the [`reference`] functions handle
//! the id-or-name references used for tasks, meetings, projects, and
//! topics.

mod member;
pub mod reference;

pub use member::{MemberIndex, MemberResolver};
pub use reference::{
    resolve_meeting, resolve_project, resolve_task, resolve_topic, Resolution, MAX_CANDIDATES,
};
