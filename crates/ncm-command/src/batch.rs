//! The transactional command batch.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::action::{Action, Command, Step};
use crate::error::{ActionError, CommandError};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::batch");

/// Ordered commands plus a category index used for de-duplication.
///
/// A batch belongs to one handler invocation: it is filled, committed or
/// rolled back once, then cleared.
pub struct CommandBatch<C> {
    label: String,
    commands: Vec<Command>,
    positions: HashMap<C, usize>,
    applied: usize,
    dry_run: bool,
    skip_finalize: bool,
}

impl<C> fmt::Debug for CommandBatch<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBatch")
            .field("label", &self.label)
            .field("commands", &self.commands)
            .field("positions", &self.positions)
            .field("applied", &self.applied)
            .field("dry_run", &self.dry_run)
            .field("skip_finalize", &self.skip_finalize)
            .finish()
    }
}

impl<C> CommandBatch<C>
where
    C: Copy + Eq + Hash + fmt::Debug,
{
    /// Creates an empty batch; `label` prefixes its log lines.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
            positions: HashMap::new(),
            applied: 0,
            dry_run: false,
            skip_finalize: false,
        }
    }

    /// Only log commands instead of running them.
    pub const fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Whether commands are only logged.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Appends a command unconditionally.
    pub fn add_cmd(
        &mut self,
        do_action: Option<Box<dyn Action>>,
        undo_action: Option<Box<dyn Action>>,
        finalize_action: Option<Box<dyn Action>>,
    ) {
        self.commands
            .push(Command::new(do_action, undo_action, finalize_action));
    }

    /// Appends a command unless `category` is already registered.
    pub fn once_cmd(
        &mut self,
        category: C,
        do_action: Option<Box<dyn Action>>,
        undo_action: Option<Box<dyn Action>>,
        finalize_action: Option<Box<dyn Action>>,
    ) {
        if self.positions.contains_key(&category) {
            return;
        }
        self.positions.insert(category, self.commands.len());
        self.add_cmd(do_action, undo_action, finalize_action);
    }

    /// Appends a command for `category`, or replaces the one registered
    /// earlier in place.
    pub fn set_cmd(
        &mut self,
        category: C,
        do_action: Option<Box<dyn Action>>,
        undo_action: Option<Box<dyn Action>>,
        finalize_action: Option<Box<dyn Action>>,
    ) {
        let command = Command::new(do_action, undo_action, finalize_action);
        match self
            .positions
            .get(&category)
            .and_then(|&position| self.commands.get_mut(position))
        {
            Some(slot) => *slot = command,
            None => {
                self.positions.insert(category, self.commands.len());
                self.commands.push(command);
            }
        }
    }

    /// Skips the finalize pass of the next commit.
    pub const fn skip_finalize(&mut self) {
        self.skip_finalize = true;
    }

    /// Position registered for `category`.
    #[must_use]
    pub fn position(&self, category: C) -> Option<usize> {
        self.positions.get(&category).copied()
    }

    /// Commands in batch order.
    #[must_use]
    pub const fn commands(&self) -> &[Command] {
        self.commands.as_slice()
    }

    /// Number of commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch holds no commands.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drops every command and category registration.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.positions.clear();
        self.applied = 0;
        self.skip_finalize = false;
    }

    /// Runs every `do` in order, then every `finalize` in order.
    ///
    /// When a `do` fails, the `undo` of each preceding command runs in
    /// reverse order before the error is returned; the failing command and
    /// its successors are left untouched and no `finalize` runs. A failing
    /// `finalize` stops the finalize pass and leaves the applied commands for
    /// [`rollback`](Self::rollback).
    pub fn commit(&mut self) -> Result<(), CommandError> {
        self.applied = 0;
        let mut failure = None;
        for (index, command) in self.commands.iter().enumerate() {
            if let Err(source) = self.run_step(index, command, Step::Do) {
                failure = Some(CommandError::Commit {
                    index,
                    command: command.describe(),
                    source,
                });
                break;
            }
            self.applied = index + 1;
        }

        if let Some(error) = failure {
            tracing::warn!(
                target: TARGET,
                batch = %self.label,
                error = %error,
                "commit failed, undoing applied commands"
            );
            self.rollback();
            return Err(error);
        }

        if self.skip_finalize {
            tracing::debug!(target: TARGET, batch = %self.label, "finalize skipped");
            return Ok(());
        }

        for (index, command) in self.commands.iter().enumerate() {
            if let Err(source) = self.run_step(index, command, Step::Finalize) {
                return Err(CommandError::Finalize {
                    index,
                    command: command.describe(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Undoes every applied command in reverse order.
    ///
    /// Undo failures are logged and the remaining undos still run. Each
    /// applied command is undone at most once.
    pub fn rollback(&mut self) {
        let applied = std::mem::take(&mut self.applied);
        for (index, command) in self.commands.iter().enumerate().take(applied).rev() {
            if let Err(source) = self.run_step(index, command, Step::Undo) {
                let error = CommandError::Rollback {
                    index,
                    command: command.describe(),
                    source,
                };
                tracing::warn!(
                    target: TARGET,
                    batch = %self.label,
                    error = %error,
                    "undo failed, continuing rollback"
                );
            }
        }
    }

    fn run_step(&self, index: usize, command: &Command, step: Step) -> Result<(), ActionError> {
        let Some(action) = command.action(step) else {
            return Ok(());
        };
        let line = action.describe();
        if self.dry_run {
            tracing::info!(
                target: TARGET,
                batch = %self.label,
                index,
                step = %step,
                command = %line,
                "dry run"
            );
            return Ok(());
        }

        let output = action.run()?;
        tracing::debug!(
            target: TARGET,
            batch = %self.label,
            index,
            step = %step,
            command = %line,
            output = %String::from_utf8_lossy(&output),
            "command completed"
        );
        Ok(())
    }
}
