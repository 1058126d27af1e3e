//! Mock collaborators shared by the engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Map, Value};
use skillflow_types::error::RepositoryError;
use skillflow_types::execution::{Execution, ExecutionContext, ExecutionFilter};
use skillflow_types::skill::{Skill, SkillFilter};
use skillflow_types::tool::{ToolContext, ToolOutcome};
use uuid::Uuid;

use crate::repository::execution::ExecutionStore;
use crate::repository::skill::SkillCatalog;
use crate::tool::{ToolError, ToolInvoker};

pub(crate) fn skill_from(value: Value) -> Skill {
    serde_json::from_value(value).unwrap()
}

pub(crate) fn execution_for(skill: &Skill, inputs: Value) -> Execution {
    let inputs: Map<String, Value> = inputs.as_object().cloned().unwrap();
    Execution::start(skill, inputs, &ExecutionContext::new("tester"))
}

// ---------------------------------------------------------------------------
// ScriptedInvoker
// ---------------------------------------------------------------------------

/// One scripted response. The last response for a tool repeats forever.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Ok(Value),
    /// The tool answers with `success = false`.
    Fail(String),
    /// The invoker itself errors.
    Error(String),
    /// Never answers (trips the step timeout).
    Hang,
}

pub(crate) struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, Map<String, Value>, ToolContext)>>,
}

impl ScriptedInvoker {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn script(self, tool: &str, responses: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(tool.to_string(), responses.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Map<String, Value>, ToolContext)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, tool: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(t, _, _)| t == tool).count()
    }

    fn next_response(&self, tool: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(tool)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl ToolInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        tool: &str,
        params: &Map<String, Value>,
        context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), params.clone(), context.clone()));

        match self.next_response(tool) {
            None => Err(ToolError::UnknownTool(tool.to_string())),
            Some(Scripted::Ok(data)) => Ok(ToolOutcome::ok(data)),
            Some(Scripted::Fail(msg)) => Ok(ToolOutcome::failure(msg)),
            Some(Scripted::Error(msg)) => Err(ToolError::Invocation(msg)),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ToolError::Invocation("hung call returned".to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockCatalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct MockCatalog {
    skills: Mutex<HashMap<Uuid, Skill>>,
}

impl MockCatalog {
    pub(crate) fn with_skill(self, skill: Skill) -> Self {
        self.skills.lock().unwrap().insert(skill.id, skill);
        self
    }
}

impl SkillCatalog for MockCatalog {
    async fn get(&self, id: &Uuid) -> Result<Option<Skill>, RepositoryError> {
        Ok(self.skills.lock().unwrap().get(id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>, RepositoryError> {
        Ok(self
            .skills
            .lock()
            .unwrap()
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list(&self, filter: &SkillFilter) -> Result<Vec<Skill>, RepositoryError> {
        Ok(self
            .skills
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn save(&self, skill: &Skill) -> Result<(), RepositoryError> {
        self.skills.lock().unwrap().insert(skill.id, skill.clone());
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        Ok(self.skills.lock().unwrap().remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Execution store that can be told to fail writes.
#[derive(Default)]
pub(crate) struct MockStore {
    executions: Mutex<HashMap<Uuid, Execution>>,
    fail_creates: bool,
    /// Number of upcoming `update_execution` calls that fail.
    failing_updates: AtomicUsize,
    updates: AtomicUsize,
}

impl MockStore {
    pub(crate) fn failing_creates() -> Self {
        Self {
            fail_creates: true,
            ..Default::default()
        }
    }

    pub(crate) fn failing_updates(count: usize) -> Self {
        Self {
            failing_updates: AtomicUsize::new(count),
            ..Default::default()
        }
    }

    pub(crate) fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.executions.lock().unwrap().len()
    }

    pub(crate) fn stored(&self, id: &Uuid) -> Option<Execution> {
        self.executions.lock().unwrap().get(id).cloned()
    }
}

impl ExecutionStore for MockStore {
    async fn create_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        if self.fail_creates {
            return Err(RepositoryError::Connection);
        }
        self.executions
            .lock()
            .unwrap()
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn update_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_updates.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_updates.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        self.executions
            .lock()
            .unwrap()
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn get_execution(&self, id: &Uuid) -> Result<Option<Execution>, RepositoryError> {
        Ok(self.stored(id))
    }

    async fn list_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>, RepositoryError> {
        let mut executions: Vec<Execution> = self
            .executions
            .lock()
            .unwrap()
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if let Some(limit) = filter.limit {
            executions.truncate(limit as usize);
        }
        Ok(executions)
    }
}
