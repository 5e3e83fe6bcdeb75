use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time;
use tracing::{debug, info};

use minute_empire_types::common::DocId;

/// Longest the loop sleeps before re-checking the heap, so freshly inserted
/// earlier tasks are noticed promptly.
const MAX_WAIT: Duration = Duration::from_secs(5);

/// Identifies the durable task a heap entry stands for. The scheduler holds
/// no game state: everything needed to execute lives in the documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    Construction { village_id: DocId, task_id: DocId },
    TroopTraining { village_id: DocId, task_id: DocId },
    TroopAction { action_id: DocId },
}

impl ScheduledTask {
    pub fn id(&self) -> &DocId {
        match self {
            ScheduledTask::Construction { task_id, .. } => task_id,
            ScheduledTask::TroopTraining { task_id, .. } => task_id,
            ScheduledTask::TroopAction { action_id } => action_id,
        }
    }
}

/// Runs one due task. Implementations must be idempotent: the `processed`
/// flag on the underlying document is the at-most-once guard, not the heap.
#[async_trait::async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: ScheduledTask, completion_time: DateTime<Utc>);
}

#[derive(Debug, Clone)]
struct Entry {
    /// Epoch seconds; the heap key.
    due_at: i64,
    /// Insertion order breaks ties between equal instants.
    seq: u64,
    completion_time: DateTime<Utc>,
    task: ScheduledTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due_at == other.due_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_at, self.seq).cmp(&(other.due_at, other.seq))
    }
}

#[derive(Default)]
struct State {
    heap: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

/// Wall-clock priority queue of pending game tasks. One background loop pops
/// due entries and hands them to the executor in an independent worker each.
pub struct TaskScheduler {
    state: Mutex<State>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn schedule(&self, task: ScheduledTask, completion_time: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state.seq += 1;
        let entry = Entry {
            due_at: completion_time.timestamp(),
            seq: state.seq,
            completion_time,
            task,
        };
        debug!(task_id = %entry.task.id(), due_at = %completion_time, "Scheduled task");
        state.heap.push(Reverse(entry));
    }

    /// Removes a scheduled task; O(n) heap rebuild. Returns whether a live
    /// entry was removed.
    pub fn cancel(&self, task_id: &DocId) -> bool {
        let mut state = self.state.lock().unwrap();
        let before = state.heap.len();
        state.heap.retain(|Reverse(entry)| entry.task.id() != task_id);
        state.heap.len() != before
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().heap.len()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .unwrap()
            .heap
            .peek()
            .map(|Reverse(entry)| entry.completion_time)
    }

    /// The scheduler loop. Runs until the process exits; each due task is
    /// spawned onto its own tokio task so slow callbacks never stall the
    /// queue.
    pub async fn run(self: Arc<Self>, executor: Arc<dyn TaskExecutor>) {
        info!("Task scheduler started");
        loop {
            let step = {
                let mut state = self.state.lock().unwrap();
                let now = Utc::now().timestamp();
                match state.heap.peek() {
                    None => Step::Idle,
                    Some(Reverse(entry)) if entry.due_at <= now => {
                        let Reverse(entry) = state.heap.pop().unwrap();
                        Step::Execute(entry)
                    }
                    Some(Reverse(entry)) => {
                        Step::Wait(Duration::from_secs((entry.due_at - now) as u64))
                    }
                }
            };

            match step {
                Step::Idle => time::sleep(MAX_WAIT).await,
                Step::Wait(until_due) => time::sleep(until_due.min(MAX_WAIT)).await,
                Step::Execute(entry) => {
                    let executor = executor.clone();
                    tokio::spawn(async move {
                        debug!(task_id = %entry.task.id(), "Executing task");
                        executor.execute(entry.task, entry.completion_time).await;
                    });
                }
            }
        }
    }
}

enum Step {
    Idle,
    Wait(Duration),
    Execute(Entry),
}
