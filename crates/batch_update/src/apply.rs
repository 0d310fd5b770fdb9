//! Applies a bulk-shaped descriptor to one element.
//!
//! Application runs in two passes: every key is first classified into an
//! [`UpdateOperation`] without touching the element, then the operations are
//! executed in descriptor order. A failure in either pass is confined to its
//! key: it is logged with the key name and the remaining keys still run.

use crate::config::ApplyConfig;
use crate::error::ApplyError;
use crate::handle::{ElementHandle, HandleError};
use crate::operation::{AttributeChange, ClassAction, EventOp, UpdateOperation, classify_operation};
use crate::value::Descriptor;

const LOG_TARGET: &str = "batch_update.apply";

/// Per-element outcome of one application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementReport {
    pub applied: usize,
    pub failed: usize,
}

/// One classified key awaiting execution.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedUpdate {
    pub key: String,
    pub operation: Result<UpdateOperation, ApplyError>,
}

#[derive(Clone, Debug, Default)]
pub struct ElementApplier {
    config: ApplyConfig,
}

impl ElementApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ApplyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Classification pass only; the element is not mutated.
    pub fn plan<H: ElementHandle + ?Sized>(
        &self,
        element: &H,
        descriptor: &Descriptor,
    ) -> Vec<PlannedUpdate> {
        descriptor
            .iter()
            .map(|(key, value)| PlannedUpdate {
                key: key.to_string(),
                operation: classify_operation(element, key, value, &self.config),
            })
            .collect()
    }

    /// Apply `descriptor` and hand the element back for chaining.
    pub fn apply<'h, H: ElementHandle + ?Sized>(
        &self,
        element: &'h mut H,
        descriptor: &Descriptor,
    ) -> &'h mut H {
        self.apply_with_report(element, descriptor);
        element
    }

    pub fn apply_with_report<H: ElementHandle + ?Sized>(
        &self,
        element: &mut H,
        descriptor: &Descriptor,
    ) -> ElementReport {
        let plan = self.plan(element, descriptor);
        let mut report = ElementReport::default();
        for PlannedUpdate { key, operation } in plan {
            let outcome = operation.and_then(|op| {
                log::trace!(target: LOG_TARGET, "apply '{key}' as {}", op.label());
                execute(element, &key, op)
            });
            match outcome {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    log::warn!(target: LOG_TARGET, "failed to apply '{}': {err}", err.key());
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// Apply with the default configuration.
pub fn apply_element<'h, H: ElementHandle + ?Sized>(
    element: &'h mut H,
    descriptor: &Descriptor,
) -> &'h mut H {
    ElementApplier::default().apply(element, descriptor)
}

fn execute<H: ElementHandle + ?Sized>(
    element: &mut H,
    key: &str,
    op: UpdateOperation,
) -> Result<(), ApplyError> {
    let host = |source: HandleError| ApplyError::Handle {
        key: key.to_string(),
        source,
    };
    match op {
        UpdateOperation::Style(entries) => {
            for (property, value) in &entries {
                element.set_style(property, value).map_err(host)?;
            }
        }
        UpdateOperation::ClassList(actions) => {
            for action in &actions {
                match action {
                    ClassAction::Add(names) => {
                        for name in names {
                            element.add_class(name).map_err(host)?;
                        }
                    }
                    ClassAction::Remove(names) => {
                        for name in names {
                            element.remove_class(name).map_err(host)?;
                        }
                    }
                    ClassAction::Toggle(names) => {
                        for name in names {
                            element.toggle_class(name).map_err(host)?;
                        }
                    }
                    ClassAction::Replace { old, new } => {
                        element.replace_class(old, new).map_err(host)?;
                    }
                }
            }
        }
        UpdateOperation::Attribute(changes) => {
            for change in &changes {
                match change {
                    AttributeChange::Set { name, value } => {
                        element.set_attribute(name, value).map_err(host)?
                    }
                    AttributeChange::Remove { name } => {
                        element.remove_attribute(name).map_err(host)?
                    }
                }
            }
        }
        UpdateOperation::Dataset(entries) => {
            for (name, value) in &entries {
                element.set_data(name, value).map_err(host)?;
            }
        }
        UpdateOperation::Event(EventOp::Listen(specs)) => {
            for spec in specs {
                element
                    .add_event_listener(&spec.event_type, spec.handler, spec.options)
                    .map_err(host)?;
            }
        }
        UpdateOperation::Event(EventOp::Slot { slot, handler }) => {
            element.set_handler_slot(&slot, handler).map_err(host)?;
        }
        UpdateOperation::MethodCall { name, args } => {
            element.invoke_method(&name, &args).map_err(host)?;
        }
        UpdateOperation::Property { name, value } => {
            element.set_property(&name, &value).map_err(host)?;
        }
        UpdateOperation::Fallback { name, value } => {
            element.set_attribute(&name, &value).map_err(host)?;
        }
    }
    Ok(())
}
