//! In-process datastore binding.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{
    CallbackError, ChangeIter, ChangeRecord, Datastore, DatastoreError, Edit, ModuleChangeHandler,
    Phase, Store, SubscribeFlags, SubscriptionId, TARGET, Value, filter_matches, module_of,
};

type Items = BTreeMap<String, String>;

struct Subscriber {
    id: SubscriptionId,
    module: String,
    flags: SubscribeFlags,
    handler: Arc<dyn ModuleChangeHandler>,
}

#[derive(Default)]
struct State {
    running: Items,
    startup: Items,
    subscribers: Vec<Subscriber>,
    pending: Vec<ChangeRecord>,
    copies: Vec<(String, Store, Store)>,
}

/// A thread-safe datastore holding running and startup stores in memory.
///
/// [`commit`](Self::commit) turns a list of edits into change records and
/// drives every subscriber of the touched modules through VERIFY and then
/// APPLY, or through VERIFY and then ABORT when one of them rejects the
/// transaction. Transactions are delivered one at a time.
#[derive(Default)]
pub struct MemoryDatastore {
    state: Mutex<State>,
    transaction: Mutex<()>,
    copied: Condvar,
    next_id: AtomicU64,
}

impl fmt::Debug for MemoryDatastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryDatastore")
            .field("running", &state.running.len())
            .field("startup", &state.startup.len())
            .field("subscribers", &state.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl MemoryDatastore {
    /// Creates an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `edits` as one transaction.
    ///
    /// Edits that change nothing produce no records. A transaction with no
    /// records notifies nobody. When a subscriber rejects the change in the
    /// VERIFY phase the running store is left untouched.
    pub fn commit(&self, edits: &[Edit]) -> Result<(), DatastoreError> {
        let _serial = self
            .transaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (working, records) = plan(&self.state().running, edits)?;
        if records.is_empty() {
            tracing::debug!(target: TARGET, "transaction changes nothing");
            return Ok(());
        }
        let by_module = group_by_module(records);

        let mut verified: Vec<(&str, Arc<dyn ModuleChangeHandler>)> = Vec::new();
        for (module, records) in &by_module {
            for handler in self.handlers(module, |flags| !flags.apply_only) {
                match self.deliver(module, records, &handler, Phase::Verify) {
                    Ok(()) => verified.push((module.as_str(), handler)),
                    Err(source) => {
                        self.abort(&by_module, &verified);
                        self.state().pending.clear();
                        return Err(DatastoreError::Rejected {
                            module: module.clone(),
                            source,
                        });
                    }
                }
            }
        }

        self.state().running = working;

        let mut first_failure = None;
        for (module, records) in &by_module {
            for handler in self.handlers(module, |_| true) {
                if let Err(source) = self.deliver(module, records, &handler, Phase::Apply) {
                    tracing::warn!(target: TARGET, module = %module, %source, "apply callback failed");
                    first_failure.get_or_insert(DatastoreError::ApplyFailed {
                        module: module.clone(),
                        source,
                    });
                }
            }
        }
        self.state().pending.clear();
        first_failure.map_or(Ok(()), Err)
    }

    fn abort(
        &self,
        by_module: &BTreeMap<String, Vec<ChangeRecord>>,
        verified: &[(&str, Arc<dyn ModuleChangeHandler>)],
    ) {
        for (module, handler) in verified {
            let Some(records) = by_module.get(*module) else {
                continue;
            };
            if let Err(error) = self.deliver(module, records, handler, Phase::Abort) {
                tracing::warn!(target: TARGET, module = %module, %error, "abort callback failed");
            }
        }
    }

    fn handlers(
        &self,
        module: &str,
        wanted: impl Fn(SubscribeFlags) -> bool,
    ) -> Vec<Arc<dyn ModuleChangeHandler>> {
        self.state()
            .subscribers
            .iter()
            .filter(|sub| sub.module == module && wanted(sub.flags))
            .map(|sub| Arc::clone(&sub.handler))
            .collect()
    }

    fn deliver(
        &self,
        module: &str,
        records: &[ChangeRecord],
        handler: &Arc<dyn ModuleChangeHandler>,
        phase: Phase,
    ) -> Result<(), CallbackError> {
        self.state().pending = records.to_vec();
        tracing::debug!(target: TARGET, module, %phase, records = records.len(), "delivering");
        handler.module_change(module, phase)
    }

    /// Snapshot of a store.
    #[must_use]
    pub fn items(&self, store: Store) -> BTreeMap<String, String> {
        let state = self.state();
        match store {
            Store::Running => state.running.clone(),
            Store::Startup => state.startup.clone(),
        }
    }

    /// Every `copy_config` call served so far.
    #[must_use]
    pub fn copies(&self) -> Vec<(String, Store, Store)> {
        self.state().copies.clone()
    }

    /// Blocks until at least `count` copies were served or `timeout` passed.
    /// Returns whether the count was reached.
    #[must_use]
    pub fn wait_for_copies(&self, count: usize, timeout: Duration) -> bool {
        let (state, _) = self
            .copied
            .wait_timeout_while(self.state(), timeout, |pending| pending.copies.len() < count)
            .unwrap_or_else(PoisonError::into_inner);
        state.copies.len() >= count
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }
}

impl Datastore for MemoryDatastore {
    fn subscribe(
        &self,
        module: &str,
        flags: SubscribeFlags,
        handler: Arc<dyn ModuleChangeHandler>,
    ) -> Result<SubscriptionId, DatastoreError> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.state().subscribers.push(Subscriber {
            id,
            module: module.to_owned(),
            flags,
            handler: Arc::clone(&handler),
        });

        if flags.enabled {
            let _serial = self
                .transaction
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let prefix = format!("/{module}:*");
            let records: Vec<ChangeRecord> = self
                .state()
                .running
                .iter()
                .filter(|(path, _)| filter_matches(&prefix, path))
                .map(|(path, payload)| ChangeRecord::created(Value::new(path, payload)))
                .collect();
            let outcome = self.deliver(module, &records, &handler, Phase::Enabled);
            self.state().pending.clear();
            if let Err(source) = outcome {
                self.state().subscribers.retain(|sub| sub.id != id);
                return Err(DatastoreError::Rejected {
                    module: module.to_owned(),
                    source,
                });
            }
        }
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), DatastoreError> {
        let mut state = self.state();
        let before = state.subscribers.len();
        state.subscribers.retain(|sub| sub.id != id);
        if state.subscribers.len() == before {
            return Err(DatastoreError::UnknownSubscription { id });
        }
        Ok(())
    }

    fn get_changes(&self, filter: &str) -> Result<ChangeIter, DatastoreError> {
        let records: Vec<ChangeRecord> = self
            .state()
            .pending
            .iter()
            .filter(|record| {
                record
                    .new
                    .as_ref()
                    .or(record.old.as_ref())
                    .is_some_and(|value| filter_matches(filter, &value.path))
            })
            .cloned()
            .collect();
        Ok(Box::new(records.into_iter()))
    }

    fn get_items(&self, filter: &str) -> Result<Vec<Value>, DatastoreError> {
        Ok(self
            .state()
            .running
            .iter()
            .filter(|(path, _)| filter_matches(filter, path))
            .map(|(path, payload)| Value::new(path, payload))
            .collect())
    }

    fn copy_config(
        &self,
        module: &str,
        source: Store,
        target: Store,
    ) -> Result<(), DatastoreError> {
        let mut state = self.state();
        if source != target {
            let prefix = format!("/{module}:*");
            let selected: Items = match source {
                Store::Running => &state.running,
                Store::Startup => &state.startup,
            }
            .iter()
            .filter(|(path, _)| filter_matches(&prefix, path))
            .map(|(path, payload)| (path.clone(), payload.clone()))
            .collect();
            let destination = match target {
                Store::Running => &mut state.running,
                Store::Startup => &mut state.startup,
            };
            destination.retain(|path, _| !filter_matches(&prefix, path));
            destination.extend(selected);
        }
        state.copies.push((module.to_owned(), source, target));
        self.copied.notify_all();
        Ok(())
    }
}

/// Applies `edits` to a copy of `running`, returning the copy and the
/// records describing the difference.
fn plan(running: &Items, edits: &[Edit]) -> Result<(Items, Vec<ChangeRecord>), DatastoreError> {
    let mut working = running.clone();
    let mut records = Vec::new();
    for edit in edits {
        match edit {
            Edit::Set { path, value } => set(&mut working, &mut records, path, value)?,
            Edit::Delete { path } => delete(&mut working, &mut records, path)?,
        }
    }
    Ok((working, records))
}

fn set(
    working: &mut Items,
    records: &mut Vec<ChangeRecord>,
    path: &str,
    value: &str,
) -> Result<(), DatastoreError> {
    if module_of(path).is_none() {
        return Err(DatastoreError::InvalidPath {
            path: path.to_owned(),
        });
    }

    for entry in list_entries(path) {
        ensure_entry(working, records, entry)?;
    }
    if path.ends_with(']') {
        return Ok(());
    }

    match working.insert(path.to_owned(), value.to_owned()) {
        None => records.push(ChangeRecord::created(Value::new(path, value))),
        Some(old) if old != value => records.push(ChangeRecord::modified(
            Value::new(path, old),
            Value::new(path, value),
        )),
        Some(_) => {}
    }
    Ok(())
}

/// Creates a list entry and its key leaves when absent.
fn ensure_entry(
    working: &mut Items,
    records: &mut Vec<ChangeRecord>,
    entry: &str,
) -> Result<(), DatastoreError> {
    if working.contains_key(entry) {
        return Ok(());
    }
    let segments = ncm_tree::parse_path(entry).map_err(|error| DatastoreError::InvalidPath {
        path: format!("{entry}: {error}"),
    })?;
    working.insert(entry.to_owned(), String::new());
    records.push(ChangeRecord::created(Value::new(entry, "")));

    let Some(segment) = segments.last() else {
        return Ok(());
    };
    for (key, value) in segment.attrs() {
        let key_path = format!("{entry}/{key}");
        if working.insert(key_path.clone(), value.clone()).is_none() {
            records.push(ChangeRecord::created(Value::new(key_path, value)));
        }
    }
    Ok(())
}

fn delete(
    working: &mut Items,
    records: &mut Vec<ChangeRecord>,
    path: &str,
) -> Result<(), DatastoreError> {
    let doomed: Vec<String> = working
        .range(path.to_owned()..)
        .map(|(key, _)| key)
        .take_while(|key| key.starts_with(path))
        .filter(|key| filter_matches(path, key))
        .cloned()
        .collect();
    if doomed.is_empty() {
        return Err(DatastoreError::NotFound {
            path: path.to_owned(),
        });
    }
    for key in doomed {
        if let Some(old) = working.remove(&key) {
            records.push(ChangeRecord::deleted(Value::new(key, old)));
        }
    }
    Ok(())
}

/// Prefixes of `path` that end in a list predicate, outermost first.
fn list_entries(path: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut quote = None;
    for (index, c) in path.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '/') if index > 0 => {
                if let Some(prefix) = path.get(..index).filter(|p| p.ends_with(']')) {
                    entries.push(prefix);
                }
            }
            (None, _) => {}
        }
    }
    if path.ends_with(']') {
        entries.push(path);
    }
    entries
}

fn group_by_module(records: Vec<ChangeRecord>) -> BTreeMap<String, Vec<ChangeRecord>> {
    let mut grouped: BTreeMap<String, Vec<ChangeRecord>> = BTreeMap::new();
    for record in records {
        let module = record
            .new
            .as_ref()
            .or(record.old.as_ref())
            .and_then(|value| module_of(&value.path))
            .map(str::to_owned);
        if let Some(module) = module {
            grouped.entry(module).or_default().push(record);
        }
    }
    grouped
}
