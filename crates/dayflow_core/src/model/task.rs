//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical schedulable unit for daily planning.
//! - Provide the pause-derivation, snapshot and sort-order helpers the
//!   planner flows are built on.
//!
//! # Invariants
//! - `id` is stable and never reused for another live task.
//! - `actual_time` is never negative.
//! - `old_sort_no` changes only through `backup_sort_no`.
//! - `is_deleted` is the source of truth for tombstone state.

use chrono::{DateTime, Local};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task.
///
/// Opaque to every consumer; the contract is uniqueness, not format.
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = String;

/// Position given to a task before any explicit ordering, placing it
/// after everything the user has already arranged.
pub const DEFAULT_SORT_NO: i32 = 999;

fn dirty_by_default() -> bool {
    true
}

/// One unit of work scheduled for a specific day.
///
/// The entity is a data holder, not a validator: every field is freely
/// assignable and no cross-field checks run on assignment. Validation
/// belongs to the callers that feed it (UI, import paths).
///
/// Cloning copies `id` verbatim: a clone is a snapshot of the same
/// logical task for cancel/undo flows, not a new task. Persisting both
/// the original and a clone creates an identity collision in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID used for linking, dedup and auditing.
    pub id: TaskId,
    /// The day this task belongs to.
    pub date: DateTime<Local>,
    /// User-visible label.
    pub title: String,
    /// True while this is the actively worked item.
    pub is_doing: bool,
    /// Set when work begins; `None` until then.
    pub start_time: Option<DateTime<Local>>,
    /// Set when work ends; `None` while in progress.
    pub end_time: Option<DateTime<Local>>,
    /// Planned duration in minutes.
    pub estimate_time: i64,
    /// Links the task to a recurring definition; empty when one-off.
    pub repeat_id: String,
    /// Current position among same-day tasks. Lower sorts earlier.
    pub sort_no: i32,
    /// Position immediately before the most recent reorder, kept so the
    /// reordering collaborator can tell whether this task moved.
    pub old_sort_no: i32,
    /// Soft delete tombstone; deleted tasks stay around for history.
    pub is_deleted: bool,
    /// Scroll/focus target marker. Transient: recomputed on every sort
    /// pass and never persisted.
    #[serde(skip)]
    pub is_next: bool,
    /// Dirty flag read by the persistence collaborator; only tasks with
    /// `need_save` set are written. Starts true, so a fresh record is
    /// always a save candidate.
    #[serde(skip, default = "dirty_by_default")]
    pub need_save: bool,
    /// Free-form grouping label.
    pub section: String,
    /// Set once at construction.
    pub create_time: DateTime<Local>,
    /// Equals `create_time` at first; the persistence collaborator bumps
    /// it on each save.
    pub update_time: DateTime<Local>,
}

impl Task {
    /// Creates a task for `date` with a generated id.
    pub fn new(date: DateTime<Local>, title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), date, title)
    }

    /// Creates a task with a caller-provided id.
    ///
    /// Used by reconstruction paths where identity already exists in
    /// storage. The id is taken as-is; uniqueness is the supplier's
    /// contract.
    pub fn with_id(id: impl Into<TaskId>, date: DateTime<Local>, title: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            id: id.into(),
            date,
            title: title.into(),
            is_doing: false,
            start_time: None,
            end_time: None,
            estimate_time: 0,
            repeat_id: String::new(),
            sort_no: DEFAULT_SORT_NO,
            old_sort_no: DEFAULT_SORT_NO,
            is_deleted: false,
            is_next: false,
            need_save: true,
            section: String::new(),
            create_time: now,
            update_time: now,
        }
    }

    /// Elapsed working minutes, floored.
    ///
    /// Zero when work never started. While the task is in progress
    /// (`end_time` unset) the wall clock stands in for the end, so the
    /// value grows as time passes. Reading it mutates nothing.
    pub fn actual_time(&self) -> i64 {
        self.actual_time_at(Local::now())
    }

    /// Elapsed working minutes against an explicit `now`.
    ///
    /// Pinned-clock variant of [`Task::actual_time`] for callers that
    /// need reproducible values. Never negative: an end before the start
    /// reads as zero until the caller corrects the fields.
    pub fn actual_time_at(&self, now: DateTime<Local>) -> i64 {
        let Some(start) = self.start_time else {
            return 0;
        };
        let end = self.end_time.unwrap_or(now);
        ((end - start).num_seconds() / 60).max(0)
    }

    /// Derives the unfinished remainder of an interrupted task.
    ///
    /// The returned task is a fresh backlog entry: own id, not started,
    /// not doing, never a recurrence instance, always active, with
    /// `estimate_time` reduced by the minutes already worked (clamped at
    /// zero). It shares `sort_no` with the original so the pair sits
    /// together in the day view. `self` is left untouched; finishing or
    /// deleting the original is the caller's decision.
    pub fn create_pause_task(&self) -> Task {
        let mut remainder = Task::new(self.date, self.title.clone());
        remainder.estimate_time = (self.estimate_time - self.actual_time()).max(0);
        remainder.sort_no = self.sort_no;
        // The next sort pass overwrites this; copied anyway.
        remainder.old_sort_no = self.old_sort_no;
        debug!(
            "event=pause_task_derived module=model status=ok source_id={} id={} remaining_min={}",
            self.id, remainder.id, remainder.estimate_time
        );
        remainder
    }

    /// Saves the current position so the reordering collaborator can
    /// detect a change afterwards.
    ///
    /// Called immediately before `sort_no` is rewritten; comparing the
    /// two fields afterwards tells whether this task moved. Nothing else
    /// writes `old_sort_no`.
    pub fn backup_sort_no(&mut self) {
        self.old_sort_no = self.sort_no;
    }

    /// Marks this task as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        debug!("event=task_tombstoned module=model status=ok id={}", self.id);
    }

    /// Clears the soft delete flag.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    /// Returns whether this task should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
