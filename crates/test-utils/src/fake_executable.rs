use std::sync::{Arc, Mutex};
use std::time::Duration;

use voyeur::exec::{BoxFuture, Supervised};

/// Shared, ordered record of `start:<name>` / `stop:<name>` events.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    /// Snapshot of all events so far.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// How many times `event` (e.g. `"stop:api"`) was recorded.
    pub fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }
}

/// A fake executable that:
/// - records every start/stop into a [`Journal`]
/// - succeeds or fails its starts according to a [`StartScript`]
/// - optionally takes a while to start, to exercise interruption.
#[derive(Debug)]
pub struct FakeExecutable {
    name: String,
    journal: Journal,
    script: StartScript,
    start_delay: Option<Duration>,
}

impl FakeExecutable {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            script: StartScript::default(),
            start_delay: None,
        }
    }

    /// Every start of this executable fails.
    pub fn failing(name: &str, journal: &Journal) -> Self {
        let fake = Self::new(name, journal);
        fake.script.fail_always();
        fake
    }

    /// Make each start sleep for `delay` before reporting.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    /// Handle that lets a test script outcomes after the fake has been moved
    /// into a supervisor.
    pub fn script(&self) -> StartScript {
        self.script.clone()
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    failures_left: usize,
    always_fail: bool,
}

/// Scripted start results for one [`FakeExecutable`]. Starts succeed unless
/// told otherwise.
#[derive(Debug, Clone, Default)]
pub struct StartScript(Arc<Mutex<ScriptState>>);

impl StartScript {
    /// The next `times` starts return `false`.
    pub fn fail_next(&self, times: usize) {
        self.0.lock().unwrap().failures_left = times;
    }

    pub fn fail_always(&self) {
        self.0.lock().unwrap().always_fail = true;
    }

    /// Back to succeeding on every start.
    pub fn succeed(&self) {
        *self.0.lock().unwrap() = ScriptState::default();
    }

    fn next_outcome(&self) -> bool {
        let mut state = self.0.lock().unwrap();
        if state.always_fail {
            return false;
        }
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return false;
        }
        true
    }
}

impl Supervised for FakeExecutable {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> BoxFuture<'_, bool> {
        let journal = self.journal.clone();
        let name = self.name.clone();
        let script = self.script.clone();
        let delay = self.start_delay;

        Box::pin(async move {
            journal.push(format!("start:{name}"));
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            script.next_outcome()
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, ()> {
        let journal = self.journal.clone();
        let name = self.name.clone();
        Box::pin(async move {
            journal.push(format!("stop:{name}"));
        })
    }
}
