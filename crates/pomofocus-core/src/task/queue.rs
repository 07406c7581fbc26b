use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Task, TaskId};

/// Ordered task list plus the index of the task receiving interval credit.
///
/// `current_index` is always a valid position while the queue is non-empty
/// and is held at 0 when it is empty. Lookups by an unknown id are no-ops.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    current_index: usize,
    #[serde(skip)]
    last_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&Task> {
        self.tasks.get(self.current_index)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks from the current one to the end of the list.
    pub fn pending(&self) -> &[Task] {
        self.tasks.get(self.current_index..).unwrap_or(&[])
    }

    pub fn total_required(&self) -> u32 {
        self.tasks.iter().map(Task::required_intervals).sum()
    }

    pub fn total_completed(&self) -> u32 {
        self.tasks.iter().map(Task::completed_intervals).sum()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a task. Blank names are rejected and return `None`.
    pub fn enqueue(&mut self, name: &str, required: u32, now: DateTime<Utc>) -> Option<TaskId> {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("rejected task with empty name");
            return None;
        }

        let stamp = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = TaskId(stamp.max(self.last_id + 1));
        self.last_id = id.0;

        if self.tasks.is_empty() {
            self.current_index = 0;
        }
        self.tasks.push(Task::new(id, name.to_string(), required, now));
        tracing::debug!(%id, name, "task added");
        Some(id)
    }

    /// Credit one finished work interval to the current task.
    ///
    /// Once the task reaches its target the queue moves on, wrapping to the
    /// first task after the last one. Returns the credited task id.
    pub fn credit_current(&mut self) -> Option<TaskId> {
        let len = self.tasks.len();
        let task = self.tasks.get_mut(self.current_index)?;
        task.credit();
        let id = task.id;
        if task.is_complete() {
            self.current_index = (self.current_index + 1) % len;
            tracing::info!(%id, next_index = self.current_index, "task complete, advancing");
        }
        Some(id)
    }

    /// Manual progress click: increment, or reset to zero once full.
    pub fn toggle_manual(&mut self, id: TaskId) -> bool {
        match self.find_mut(id) {
            Some(task) => {
                task.toggle();
                true
            }
            None => false,
        }
    }

    /// Change a task's target. Zero is rejected; progress is clamped down.
    pub fn set_required(&mut self, id: TaskId, required: u32) -> bool {
        if required == 0 {
            return false;
        }
        match self.find_mut(id) {
            Some(task) => {
                task.set_required(required);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(pos);

        if pos <= self.current_index {
            self.current_index = self.current_index.saturating_sub(1);
        }
        if self.current_index >= self.tasks.len() {
            self.current_index = self.tasks.len().saturating_sub(1);
        }
        tracing::debug!(%id, current_index = self.current_index, "task removed");
        Some(removed)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn find_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn queue(targets: &[u32]) -> (TaskQueue, Vec<TaskId>) {
        let mut q = TaskQueue::new();
        let ids = targets
            .iter()
            .enumerate()
            .map(|(i, &n)| q.enqueue(&format!("task {i}"), n, at()).unwrap())
            .collect();
        (q, ids)
    }

    #[test]
    fn enqueue_rejects_blank_names() {
        let mut q = TaskQueue::new();
        assert!(q.enqueue("   ", 2, at()).is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn enqueue_trims_and_clamps() {
        let mut q = TaskQueue::new();
        let id = q.enqueue("  Read paper ", 0, at()).unwrap();
        let t = q.get(id).unwrap();
        assert_eq!(t.name, "Read paper");
        assert_eq!(t.required_intervals(), 1);
        let id = q.enqueue("Big", 500, at()).unwrap();
        assert_eq!(q.get(id).unwrap().required_intervals(), 99);
    }

    #[test]
    fn ids_are_unique_within_one_millisecond() {
        let (_, ids) = queue(&[1, 1, 1]);
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    }

    #[test]
    fn enqueue_keeps_current_index() {
        let (mut q, _) = queue(&[1, 1]);
        q.credit_current();
        assert_eq!(q.current_index(), 1);
        q.enqueue("later", 1, at());
        assert_eq!(q.current_index(), 1);
    }

    #[test]
    fn credit_advances_once_after_target() {
        let (mut q, _) = queue(&[3, 1]);
        q.credit_current();
        q.credit_current();
        assert_eq!(q.current_index(), 0);
        q.credit_current();
        assert_eq!(q.current_index(), 1);
    }

    #[test]
    fn credit_wraps_after_last_task() {
        let (mut q, ids) = queue(&[1, 2]);
        q.credit_current();
        q.credit_current();
        q.credit_current();
        assert_eq!(q.current_index(), 0);
        assert_eq!(q.get(ids[1]).unwrap().completed_intervals(), 2);
    }

    #[test]
    fn credit_on_finished_task_stays_clamped() {
        let (mut q, ids) = queue(&[1]);
        q.credit_current();
        q.credit_current();
        assert_eq!(q.get(ids[0]).unwrap().completed_intervals(), 1);
        assert_eq!(q.current_index(), 0);
    }

    #[test]
    fn credit_on_empty_queue_is_noop() {
        let mut q = TaskQueue::new();
        assert!(q.credit_current().is_none());
    }

    #[test]
    fn toggle_manual_increments_then_resets() {
        let (mut q, ids) = queue(&[1]);
        assert!(q.toggle_manual(ids[0]));
        assert_eq!(q.get(ids[0]).unwrap().completed_intervals(), 1);
        q.toggle_manual(ids[0]);
        assert_eq!(q.get(ids[0]).unwrap().completed_intervals(), 0);
        assert!(!q.toggle_manual(TaskId(42)));
    }

    #[test]
    fn set_required_clamps_completed() {
        let (mut q, ids) = queue(&[5]);
        for _ in 0..3 {
            q.toggle_manual(ids[0]);
        }
        assert!(q.set_required(ids[0], 1));
        assert_eq!(q.get(ids[0]).unwrap().completed_intervals(), 1);
        assert!(!q.set_required(ids[0], 0));
        assert_eq!(q.get(ids[0]).unwrap().required_intervals(), 1);
    }

    #[test]
    fn remove_before_current_shifts_index() {
        let (mut q, ids) = queue(&[1, 1, 1]);
        q.credit_current();
        q.credit_current();
        assert_eq!(q.current_index(), 2);
        q.remove(ids[0]);
        assert_eq!(q.current_index(), 1);
        assert_eq!(q.current().unwrap().id, ids[2]);
    }

    #[test]
    fn remove_current_task_steps_back() {
        let (mut q, ids) = queue(&[1, 1, 1]);
        q.credit_current();
        assert_eq!(q.current_index(), 1);
        q.remove(ids[1]);
        assert_eq!(q.current_index(), 0);
        assert_eq!(q.current().unwrap().id, ids[0]);
    }

    #[test]
    fn remove_after_current_keeps_index() {
        let (mut q, ids) = queue(&[1, 1, 1]);
        q.remove(ids[2]);
        assert_eq!(q.current_index(), 0);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn remove_last_task_empties_queue() {
        let (mut q, ids) = queue(&[1]);
        assert!(q.remove(ids[0]).is_some());
        assert_eq!(q.current_index(), 0);
        assert!(q.current().is_none());
        assert!(q.remove(ids[0]).is_none());
    }

    #[test]
    fn pending_starts_at_current() {
        let (mut q, ids) = queue(&[1, 1]);
        q.credit_current();
        assert_eq!(q.pending().len(), 1);
        assert_eq!(q.pending()[0].id, ids[1]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u32),
        Credit,
        Toggle(usize),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..120).prop_map(Op::Add),
            Just(Op::Credit),
            (0usize..8).prop_map(Op::Toggle),
            (0usize..8).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn index_and_counts_stay_in_bounds(ops in proptest::collection::vec(op(), 0..60)) {
            let mut q = TaskQueue::new();
            for op in ops {
                match op {
                    Op::Add(n) => { q.enqueue("t", n, at()); }
                    Op::Credit => { q.credit_current(); }
                    Op::Toggle(i) => {
                        if let Some(id) = q.tasks().get(i).map(|t| t.id) {
                            q.toggle_manual(id);
                        }
                    }
                    Op::Remove(i) => {
                        if let Some(id) = q.tasks().get(i).map(|t| t.id) {
                            q.remove(id);
                        }
                    }
                }
                if q.is_empty() {
                    prop_assert_eq!(q.current_index(), 0);
                } else {
                    prop_assert!(q.current_index() < q.len());
                }
                for t in q.iter() {
                    prop_assert!(t.completed_intervals() <= t.required_intervals());
                    prop_assert!((1..=99).contains(&t.required_intervals()));
                }
            }
        }
    }
}
