//! Input Bindings Module
//!
//! Data-driven table that maps named input actions to controller handlers,
//! per action context. [`BindingRecord`]s come from configuration;
//! [`BindingRegistry`] resolves them against an [`InputSource`] and keeps the
//! authoritative set of what is currently attached, so unlinking always
//! detaches exactly what was linked even if the current context moved since.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::action_maps::{ActionPhase, InputSource};
use crate::physics::EntityId;

/// Which edges of an action a record subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    Performed,
    Canceled,
    Both,
}

impl Trigger {
    pub fn phases(self) -> &'static [ActionPhase] {
        match self {
            Trigger::Performed => &[ActionPhase::Performed],
            Trigger::Canceled => &[ActionPhase::Canceled],
            Trigger::Both => &[ActionPhase::Performed, ActionPhase::Canceled],
        }
    }
}

/// The closed set of controller handlers an action can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandlerKind {
    Move,
    Jump,
    EnableLook,
    Look,
    Grab,
    EnableMoveMode,
    ObjectMove,
    EnableRotateMode,
    ObjectRotate,
}

/// Context a record applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingContext {
    /// Free-movement context
    Player,
    /// Held-object context
    Manipulate,
    /// Whichever context is current when linking
    Both,
}

/// Names of the two concrete contexts as the input source knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextNames {
    pub player: String,
    pub manipulate: String,
}

impl Default for ContextNames {
    fn default() -> Self {
        Self {
            player: "Player".to_string(),
            manipulate: "Manipulate".to_string(),
        }
    }
}

impl ContextNames {
    /// Concrete name of a non-`Both` context.
    pub fn name_of(&self, context: BindingContext) -> Option<&str> {
        match context {
            BindingContext::Player => Some(&self.player),
            BindingContext::Manipulate => Some(&self.manipulate),
            BindingContext::Both => None,
        }
    }
}

/// One declarative binding: `action_name` firing with `trigger` in `context`
/// runs `handler`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingRecord {
    pub action_name: String,
    pub trigger: Trigger,
    pub handler: HandlerKind,
    pub context: BindingContext,
}

impl BindingRecord {
    pub fn new(action_name: &str, trigger: Trigger, handler: HandlerKind, context: BindingContext) -> Self {
        Self {
            action_name: action_name.to_string(),
            trigger,
            handler,
            context,
        }
    }

    /// Whether this record should be live while `current` is the active context.
    pub fn applies_to(&self, current: &str, names: &ContextNames) -> bool {
        match names.name_of(self.context) {
            None => true,
            Some(name) => name == current,
        }
    }
}

/// A record after resolution: one concrete subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkedBinding {
    pub context: usize,
    pub action: String,
    pub phase: ActionPhase,
    pub handler: HandlerKind,
}

/// Linking lifecycle of one controller activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    /// A link was requested and waits for the next frame
    Pending,
    Linked,
    /// The context list was still unavailable at the deferred attempt
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("input contexts are not available yet")]
    ContextsUnavailable,
    #[error("input source has no current context")]
    NoCurrentContext,
    #[error("unknown input context `{0}`")]
    UnknownContext(String),
}

/// Outcome counts of one link pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkReport {
    /// New subscriptions attached
    pub attached: usize,
    /// Tuples that were already linked and left alone
    pub already_linked: usize,
    /// Records or edges skipped because context or action did not resolve
    pub skipped: usize,
}

/// Owns the set of subscriptions one controller has attached.
#[derive(Debug, Clone)]
pub struct BindingRegistry {
    owner: EntityId,
    linked: BTreeSet<LinkedBinding>,
    state: LinkState,
}

impl BindingRegistry {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            linked: BTreeSet::new(),
            state: LinkState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> LinkState {
        self.state
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.linked.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.linked.is_empty()
    }

    pub fn is_linked(&self, binding: &LinkedBinding) -> bool {
        self.linked.contains(binding)
    }

    pub fn linked(&self) -> impl Iterator<Item = &LinkedBinding> + '_ {
        self.linked.iter()
    }

    /// Resolve `records` against the current context and attach what is not
    /// attached yet.
    pub fn link(
        &mut self,
        records: &[BindingRecord],
        names: &ContextNames,
        source: &mut dyn InputSource,
    ) -> Result<LinkReport, LinkError> {
        let contexts = source.context_names().ok_or(LinkError::ContextsUnavailable)?;
        let current = source.current_context().ok_or(LinkError::NoCurrentContext)?;
        let Some(current_index) = contexts.iter().position(|c| *c == current) else {
            return Err(LinkError::UnknownContext(current));
        };

        let mut report = LinkReport::default();
        for record in records.iter().filter(|r| r.applies_to(&current, names)) {
            let context = match names.name_of(record.context) {
                None => Some(current_index),
                Some(name) => contexts.iter().position(|c| c == name),
            };
            let Some(context) = context else {
                debug!(action = %record.action_name, "binding context not found, skipping");
                report.skipped += 1;
                continue;
            };

            for &phase in record.trigger.phases() {
                let binding = LinkedBinding {
                    context,
                    action: record.action_name.clone(),
                    phase,
                    handler: record.handler,
                };
                if self.linked.contains(&binding) {
                    report.already_linked += 1;
                } else if source.subscribe(self.owner, &binding) {
                    self.linked.insert(binding);
                    report.attached += 1;
                } else {
                    debug!(action = %binding.action, context, "action not found, skipping");
                    report.skipped += 1;
                }
            }
        }

        self.state = LinkState::Linked;
        debug!(
            context = %current,
            attached = report.attached,
            already = report.already_linked,
            skipped = report.skipped,
            "linked bindings"
        );
        Ok(report)
    }

    /// Detach everything this registry attached. Returns how many were removed.
    pub fn unlink(&mut self, source: &mut dyn InputSource) -> usize {
        let mut detached = 0;
        for binding in std::mem::take(&mut self.linked) {
            if source.unsubscribe(self.owner, &binding) {
                detached += 1;
            } else {
                warn!(action = %binding.action, context = binding.context, "linked binding was already gone");
            }
        }
        self.state = LinkState::Idle;
        detached
    }

    /// Move to another context: unlink, switch, then link again.
    pub fn relink_for_context(
        &mut self,
        records: &[BindingRecord],
        names: &ContextNames,
        source: &mut dyn InputSource,
        context: &str,
    ) -> Result<LinkReport, LinkError> {
        self.unlink(source);
        if !source.switch_context(context) {
            warn!(context, "cannot switch to unknown input context");
            // Keep the old context live rather than leaving the controller deaf
            self.link(records, names, source)?;
            return Err(LinkError::UnknownContext(context.to_string()));
        }
        info!(context, "switched input context");
        self.link(records, names, source)
    }

    /// Arm a link attempt for the next [`Self::poll_pending`].
    pub fn request_link(&mut self) {
        self.state = LinkState::Pending;
    }

    /// Consume a pending link request. Runs once per frame; does nothing
    /// unless a request is pending.
    pub fn poll_pending(
        &mut self,
        records: &[BindingRecord],
        names: &ContextNames,
        source: &mut dyn InputSource,
    ) -> Option<Result<LinkReport, LinkError>> {
        if self.state != LinkState::Pending {
            return None;
        }
        let result = self.link(records, names, source);
        if let Err(err) = &result {
            warn!(error = %err, "deferred binding link failed");
            self.state = LinkState::Failed;
        }
        Some(result)
    }
}
