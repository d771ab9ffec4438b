//! `MemoryExecutor` and its statement and cursor handles
//!
//! A registered row matches a probe when the bound parameters equal the
//! row's values position by position. Failures can be injected at each
//! stage (prepare, bind, execute, close) to exercise fault paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::validation::{
    ParameterSink, PreparedQuery, QueryExecutor, QueryFailure, QueryResource, RowCursor, Value,
};

/// A probe that reached `execute`, with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub text: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default, Clone)]
struct Faults {
    prepare: Option<String>,
    bind: Option<String>,
    execute: Option<String>,
    close: Option<String>,
}

#[derive(Debug, Default)]
struct Journal {
    open_handles: usize,
    closed_statements: usize,
    closed_cursors: usize,
    executed: Vec<ExecutedQuery>,
}

type SharedJournal = Arc<Mutex<Journal>>;

fn lock(journal: &SharedJournal) -> MutexGuard<'_, Journal> {
    journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Executor backed by rows kept in memory
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    rows: HashMap<String, Vec<Vec<Value>>>,
    faults: Faults,
    journal: SharedJournal,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a row that `query_text` probes can find
    pub fn insert_row(&mut self, query_text: &str, row: Vec<Value>) {
        self.rows.entry(query_text.to_string()).or_default().push(row);
    }

    /// Removes every row registered for `query_text`
    pub fn clear_rows(&mut self, query_text: &str) {
        self.rows.remove(query_text);
    }

    pub fn fail_prepare(&mut self, message: impl Into<String>) {
        self.faults.prepare = Some(message.into());
    }

    pub fn fail_bind(&mut self, message: impl Into<String>) {
        self.faults.bind = Some(message.into());
    }

    pub fn fail_execute(&mut self, message: impl Into<String>) {
        self.faults.execute = Some(message.into());
    }

    /// Every statement and cursor close fails with `message`
    pub fn fail_close(&mut self, message: impl Into<String>) {
        self.faults.close = Some(message.into());
    }

    pub fn clear_faults(&mut self) {
        self.faults = Faults::default();
    }

    /// Statements and cursors handed out and not yet closed
    pub fn open_handles(&self) -> usize {
        lock(&self.journal).open_handles
    }

    pub fn closed_statements(&self) -> usize {
        lock(&self.journal).closed_statements
    }

    pub fn closed_cursors(&self) -> usize {
        lock(&self.journal).closed_cursors
    }

    /// Probes executed so far, oldest first
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        lock(&self.journal).executed.clone()
    }
}

impl QueryExecutor for MemoryExecutor {
    type Query = MemoryStatement;

    fn prepare(&mut self, query_text: &str) -> Result<MemoryStatement, QueryFailure> {
        if let Some(ref message) = self.faults.prepare {
            return Err(QueryFailure::new(message.clone()));
        }
        lock(&self.journal).open_handles += 1;

        Ok(MemoryStatement {
            text: query_text.to_string(),
            rows: self.rows.get(query_text).cloned().unwrap_or_default(),
            params: Vec::new(),
            faults: self.faults.clone(),
            journal: Arc::clone(&self.journal),
            closed: false,
        })
    }
}

/// Statement handle produced by `MemoryExecutor::prepare`
#[derive(Debug)]
pub struct MemoryStatement {
    text: String,
    rows: Vec<Vec<Value>>,
    params: Vec<Option<Value>>,
    faults: Faults,
    journal: SharedJournal,
    closed: bool,
}

impl ParameterSink for MemoryStatement {
    fn bind(&mut self, position: usize, value: &Value) -> Result<(), QueryFailure> {
        if let Some(ref message) = self.faults.bind {
            return Err(QueryFailure::new(message.clone()));
        }
        if position == 0 {
            return Err(QueryFailure::new("placeholder positions start at 1"));
        }
        if self.params.len() < position {
            self.params.resize(position, None);
        }
        self.params[position - 1] = Some(value.clone());
        Ok(())
    }
}

impl PreparedQuery for MemoryStatement {
    type Cursor = MemoryCursor;

    fn execute(&mut self) -> Result<MemoryCursor, QueryFailure> {
        if let Some(ref message) = self.faults.execute {
            return Err(QueryFailure::new(message.clone()));
        }

        let mut params = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            match param {
                Some(value) => params.push(value.clone()),
                None => {
                    return Err(QueryFailure::new(format!("parameter {} not bound", i + 1)));
                }
            }
        }

        let matches = self.rows.iter().filter(|row| **row == params).count();

        let mut journal = lock(&self.journal);
        journal.open_handles += 1;
        journal.executed.push(ExecutedQuery {
            text: self.text.clone(),
            params,
        });

        Ok(MemoryCursor {
            remaining: matches,
            fail_close: self.faults.close.clone(),
            journal: Arc::clone(&self.journal),
            closed: false,
        })
    }
}

impl QueryResource for MemoryStatement {
    fn close(&mut self) -> Result<(), QueryFailure> {
        if !self.closed {
            self.closed = true;
            let mut journal = lock(&self.journal);
            journal.open_handles -= 1;
            journal.closed_statements += 1;
        }
        match self.faults.close {
            Some(ref message) => Err(QueryFailure::new(message.clone())),
            None => Ok(()),
        }
    }
}

/// Cursor over the rows that matched a probe
#[derive(Debug)]
pub struct MemoryCursor {
    remaining: usize,
    fail_close: Option<String>,
    journal: SharedJournal,
    closed: bool,
}

impl RowCursor for MemoryCursor {
    fn has_next(&mut self) -> Result<bool, QueryFailure> {
        if self.closed {
            return Err(QueryFailure::new("cursor is closed"));
        }
        if self.remaining == 0 {
            return Ok(false);
        }
        self.remaining -= 1;
        Ok(true)
    }
}

impl QueryResource for MemoryCursor {
    fn close(&mut self) -> Result<(), QueryFailure> {
        if !self.closed {
            self.closed = true;
            let mut journal = lock(&self.journal);
            journal.open_handles -= 1;
            journal.closed_cursors += 1;
        }
        match self.fail_close {
            Some(ref message) => Err(QueryFailure::new(message.clone())),
            None => Ok(()),
        }
    }
}
