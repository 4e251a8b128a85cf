//! Mock command interpreter for unit testing.
//!
//! Records every directive it is asked to run (including ones it fails)
//! and returns pre-configured failures.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::directive::{Directive, DirectiveKind};
use crate::error::GatewayError;
use crate::interpreter::CommandInterpreter;

#[derive(Default)]
pub struct MockInterpreter {
    executed: Mutex<Vec<Directive>>,
    next_errors: Mutex<VecDeque<GatewayError>>,
    kind_errors: Mutex<HashMap<DirectiveKind, GatewayError>>,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call, whatever its kind. Queued failures are used in order.
    pub fn with_next_error(self, err: GatewayError) -> Self {
        self.fail_next(err);
        self
    }

    /// Fail every directive of `kind` until cleared.
    pub fn with_kind_error(self, kind: DirectiveKind, err: GatewayError) -> Self {
        self.fail_kind(kind, err);
        self
    }

    pub fn fail_next(&self, err: GatewayError) {
        match self.next_errors.lock() {
            Ok(mut guard) => guard.push_back(err),
            Err(poisoned) => poisoned.into_inner().push_back(err),
        }
    }

    pub fn fail_kind(&self, kind: DirectiveKind, err: GatewayError) {
        match self.kind_errors.lock() {
            Ok(mut guard) => {
                guard.insert(kind, err);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(kind, err);
            }
        }
    }

    pub fn clear_failures(&self) {
        match self.next_errors.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
        match self.kind_errors.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// All directives received so far.
    pub fn directives(&self) -> Vec<Directive> {
        match self.executed.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Received directives rendered as host command strings.
    pub fn rendered(&self) -> Vec<String> {
        self.directives().iter().map(Directive::render).collect()
    }

    pub fn call_count(&self) -> usize {
        match self.executed.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn count_kind(&self, kind: DirectiveKind) -> usize {
        self.directives()
            .iter()
            .filter(|d| d.kind() == kind)
            .count()
    }

    /// Slot ids of received inject directives, in order.
    pub fn injected_ids(&self) -> Vec<String> {
        self.directives()
            .into_iter()
            .filter_map(|d| match d {
                Directive::Inject(inject) => Some(inject.id),
                _ => None,
            })
            .collect()
    }

    pub fn reset(&self) {
        match self.executed.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn take_error(&self, kind: DirectiveKind) -> Option<GatewayError> {
        let queued = match self.next_errors.lock() {
            Ok(mut guard) => guard.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        if queued.is_some() {
            return queued;
        }
        match self.kind_errors.lock() {
            Ok(guard) => guard.get(&kind).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&kind).cloned(),
        }
    }
}

#[async_trait]
impl CommandInterpreter for MockInterpreter {
    async fn execute(&self, directive: &Directive) -> Result<(), GatewayError> {
        match self.executed.lock() {
            Ok(mut guard) => guard.push(directive.clone()),
            Err(poisoned) => poisoned.into_inner().push(directive.clone()),
        }
        match self.take_error(directive.kind()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
