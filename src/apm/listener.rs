use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::apm::event::{CommandStarted, CommandResult};
use crate::error::{Error, Result};

pub type StartHook = fn(&CommandStarted);
pub type CompletionHook = fn(&CommandResult);

pub struct Listener {
    no_start_hooks: AtomicBool,
    no_completion_hooks: AtomicBool,
    start_hooks: RwLock<Vec<StartHook>>,
    completion_hooks: RwLock<Vec<CompletionHook>>,
}

impl Default for Listener {
    fn default() -> Listener {
        Listener::new()
    }
}

impl Listener {
    pub fn new() -> Listener {
        Listener {
            no_start_hooks: AtomicBool::new(true),
            no_completion_hooks: AtomicBool::new(true),
            start_hooks: RwLock::new(Vec::new()),
            completion_hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn add_start_hook(&self, hook: StartHook) -> Result<()> {
        let mut guard = self.start_hooks.write()?;
        self.no_start_hooks.store(false, Ordering::SeqCst);
        guard.deref_mut().push(hook);
        Ok(())
    }

    pub fn add_completion_hook(&self, hook: CompletionHook) -> Result<()> {
        let mut guard = self.completion_hooks.write()?;
        self.no_completion_hooks.store(false, Ordering::SeqCst);
        guard.deref_mut().push(hook);
        Ok(())
    }

    pub fn run_start_hooks(&self, started: &CommandStarted) -> Result<()> {
        tracing::debug!("{}", started);

        if self.no_start_hooks.load(Ordering::SeqCst) {
            return Ok(());
        }

        let guard = self.start_hooks.read()
            .map_err(|e| Error::EventListenerError(Some(Box::new(Error::from(e)))))?;

        for hook in guard.deref().iter() {
            hook(started);
        }

        Ok(())
    }

    pub fn run_completion_hooks(&self, result: &CommandResult) -> Result<()> {
        tracing::debug!("{}", result);

        if self.no_completion_hooks.load(Ordering::SeqCst) {
            return Ok(());
        }

        let guard = self.completion_hooks.read()
            .map_err(|e| Error::EventListenerError(Some(Box::new(Error::from(e)))))?;

        for hook in guard.deref().iter() {
            hook(result);
        }

        Ok(())
    }
}
