//! Scripted process doubles for driving the multiplexer without a pty

use std::cell::RefCell;
use std::rc::Rc;

use super::pty::{Process, ProcessId, PtyError, Result, SpawnRequest, Spawner};

/// Something that happened to a fake process
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Spawned {
        pane: usize,
        process: ProcessId,
        request: SpawnRequest,
    },
    Wrote {
        process: ProcessId,
        data: Vec<u8>,
    },
    Terminated {
        process: ProcessId,
    },
    Resized {
        process: ProcessId,
        cols: u16,
        rows: u16,
    },
}

/// Shared journal of fake process activity
#[derive(Debug, Default, Clone)]
pub struct Journal(Rc<RefCell<Vec<Action>>>);

impl Journal {
    pub fn spawns(&self) -> Vec<(usize, ProcessId, SpawnRequest)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Action::Spawned { pane, process, request } => Some((*pane, *process, request.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns().len()
    }

    pub fn written_to(&self, process: ProcessId) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Action::Wrote { process: p, data } if *p == process => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn was_terminated(&self, process: ProcessId) -> bool {
        self.0
            .borrow()
            .iter()
            .any(|a| matches!(a, Action::Terminated { process: p } if *p == process))
    }

    /// Id of the most recent process spawned for `pane`
    pub fn last_process(&self, pane: usize) -> Option<ProcessId> {
        self.spawns()
            .into_iter()
            .rev()
            .find(|(p, _, _)| *p == pane)
            .map(|(_, id, _)| id)
    }

    fn record(&self, action: Action) {
        self.0.borrow_mut().push(action);
    }
}

pub struct FakeSpawner {
    journal: Journal,
    next_id: ProcessId,
    /// Commands containing this text fail to spawn
    pub fail_on: Option<String>,
}

impl FakeSpawner {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            next_id: 1,
            fail_on: None,
        }
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&mut self, pane: usize, request: &SpawnRequest) -> Result<Box<dyn Process>> {
        if let Some(needle) = &self.fail_on {
            if request.args.iter().any(|a| a.contains(needle.as_str())) {
                return Err(PtyError::Spawn(format!("no such command: {}", needle)));
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        self.journal.record(Action::Spawned {
            pane,
            process: id,
            request: request.clone(),
        });
        Ok(Box::new(FakeProcess {
            id,
            journal: self.journal.clone(),
        }))
    }
}

struct FakeProcess {
    id: ProcessId,
    journal: Journal,
}

impl Process for FakeProcess {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.journal.record(Action::Wrote {
            process: self.id,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.journal.record(Action::Terminated { process: self.id });
        Ok(())
    }

    fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        self.journal.record(Action::Resized {
            process: self.id,
            cols,
            rows,
        });
        Ok(())
    }
}
