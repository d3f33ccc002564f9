use std::collections::HashMap;

use futures::future::{AbortHandle, AbortRegistration};

/// Operation families tracked by [`TaskSet`]. Refetch and detail loads are
/// exclusive: starting one aborts the previous one of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Refetch,
    Detail,
    Mutation,
}

impl TaskKind {
    fn is_exclusive(self) -> bool {
        !matches!(self, TaskKind::Mutation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskTicket {
    pub kind: TaskKind,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct TaskSet {
    running: HashMap<u64, (TaskKind, AbortHandle)>,
    next_generation: u64,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: TaskKind) -> (TaskTicket, AbortRegistration) {
        if kind.is_exclusive() {
            self.abort_kind(kind);
        }

        self.next_generation = self.next_generation.wrapping_add(1);
        let generation = self.next_generation;
        let (handle, registration) = AbortHandle::new_pair();
        self.running.insert(generation, (kind, handle));

        (TaskTicket { kind, generation }, registration)
    }

    /// Returns false when the ticket was superseded or aborted.
    pub fn complete(&mut self, ticket: TaskTicket) -> bool {
        self.running.remove(&ticket.generation).is_some()
    }

    pub fn abort_kind(&mut self, kind: TaskKind) {
        self.running.retain(|_, (running_kind, handle)| {
            if *running_kind == kind {
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    pub fn abort_all(&mut self) {
        for (_, (_, handle)) in self.running.drain() {
            handle.abort();
        }
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.running
            .values()
            .any(|(running_kind, _)| *running_kind == kind)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use futures::future::Abortable;

    use super::*;

    fn run_future<T>(future: impl std::future::Future<Output = T>) -> T {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("tokio runtime");
        runtime.block_on(future)
    }

    #[test]
    fn exclusive_kind_supersedes_previous() {
        let mut tasks = TaskSet::new();
        let (first, first_registration) = tasks.begin(TaskKind::Refetch);
        let (second, _second_registration) = tasks.begin(TaskKind::Refetch);

        let aborted = run_future(Abortable::new(async { 1 }, first_registration));
        assert!(aborted.is_err());
        assert!(!tasks.complete(first));
        assert!(tasks.complete(second));
        assert!(tasks.is_empty());
    }

    #[test]
    fn mutations_run_side_by_side() {
        let mut tasks = TaskSet::new();
        let (first, _a) = tasks.begin(TaskKind::Mutation);
        let (second, _b) = tasks.begin(TaskKind::Mutation);

        assert_eq!(tasks.len(), 2);
        assert!(tasks.complete(first));
        assert!(tasks.complete(second));
    }

    #[test]
    fn abort_all_cancels_every_kind() {
        let mut tasks = TaskSet::new();
        let (ticket, registration) = tasks.begin(TaskKind::Detail);
        let (_, _other) = tasks.begin(TaskKind::Mutation);

        tasks.abort_all();

        assert!(run_future(Abortable::new(async { () }, registration)).is_err());
        assert!(!tasks.complete(ticket));
        assert!(!tasks.is_running(TaskKind::Mutation));
    }
}
