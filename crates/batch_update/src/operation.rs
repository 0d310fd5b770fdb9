//! Pure classification of one descriptor key into an [`UpdateOperation`].
//!
//! Classification reads the element (to look up methods and properties) but
//! never mutates it. Rules are tried in a fixed order and the first match
//! wins:
//!
//! 1. `style`            2. `classList`        3. `attributes`
//! 4. `setAttribute` / `removeAttribute`       5. `dataset`
//! 6. `addEventListener` 7. `on*` slot with a handler value
//! 8. method name        9. property name      10. primitive fallback
//!
//! A key naming both a method and a property is a method call.

use crate::config::ApplyConfig;
use crate::error::ApplyError;
use crate::handle::{ElementHandle, ListenerOptions};
use crate::value::{Descriptor, EventHandler, Value};

/// Reserved descriptor keys.
pub mod keys {
    pub const STYLE: &str = "style";
    pub const CLASS_LIST: &str = "classList";
    pub const ATTRIBUTES: &str = "attributes";
    pub const SET_ATTRIBUTE: &str = "setAttribute";
    pub const REMOVE_ATTRIBUTE: &str = "removeAttribute";
    pub const DATASET: &str = "dataset";
    pub const ADD_EVENT_LISTENER: &str = "addEventListener";
}

const LOG_TARGET: &str = "batch_update.apply";

#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    Style(Vec<(String, String)>),
    ClassList(Vec<ClassAction>),
    Attribute(Vec<AttributeChange>),
    Dataset(Vec<(String, String)>),
    Event(EventOp),
    MethodCall { name: String, args: Vec<Value> },
    Property { name: String, value: Value },
    Fallback { name: String, value: String },
}

impl UpdateOperation {
    pub fn label(&self) -> &'static str {
        match self {
            UpdateOperation::Style(_) => "style",
            UpdateOperation::ClassList(_) => "class-list",
            UpdateOperation::Attribute(_) => "attribute",
            UpdateOperation::Dataset(_) => "dataset",
            UpdateOperation::Event(_) => "event",
            UpdateOperation::MethodCall { .. } => "method",
            UpdateOperation::Property { .. } => "property",
            UpdateOperation::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassAction {
    Add(Vec<String>),
    Remove(Vec<String>),
    Toggle(Vec<String>),
    Replace { old: String, new: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeChange {
    Set { name: String, value: String },
    Remove { name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListenerSpec {
    pub event_type: String,
    pub handler: EventHandler,
    pub options: ListenerOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventOp {
    Listen(Vec<ListenerSpec>),
    Slot { slot: String, handler: EventHandler },
}

pub fn classify_operation<H: ElementHandle + ?Sized>(
    element: &H,
    key: &str,
    value: &Value,
    config: &ApplyConfig,
) -> Result<UpdateOperation, ApplyError> {
    match key {
        keys::STYLE => return style_op(key, value),
        keys::CLASS_LIST => return class_list_op(key, value),
        keys::ATTRIBUTES => return attribute_map_op(key, value),
        keys::SET_ATTRIBUTE => return set_attribute_op(key, value),
        keys::REMOVE_ATTRIBUTE => return remove_attribute_op(key, value),
        keys::DATASET => return dataset_op(key, value),
        keys::ADD_EVENT_LISTENER => return listener_op(key, value),
        _ => {}
    }

    if config.is_event_slot(key) {
        if let Value::Handler(handler) = value {
            return Ok(UpdateOperation::Event(EventOp::Slot {
                slot: key.to_string(),
                handler: handler.clone(),
            }));
        }
    }

    if element.has_method(key) {
        let args = match value {
            Value::List(items) => items.clone(),
            other => vec![other.clone()],
        };
        return Ok(UpdateOperation::MethodCall {
            name: key.to_string(),
            args,
        });
    }

    if element.has_property(key) {
        return Ok(UpdateOperation::Property {
            name: key.to_string(),
            value: value.clone(),
        });
    }

    if config.attribute_fallback {
        if let Some(text) = value.to_text() {
            return Ok(UpdateOperation::Fallback {
                name: key.to_string(),
                value: text,
            });
        }
    }

    Err(ApplyError::UnsupportedValue {
        key: key.to_string(),
        kind: value.kind(),
    })
}

fn expect_map<'a>(
    key: &str,
    value: &'a Value,
    expected: &'static str,
) -> Result<&'a Descriptor, ApplyError> {
    value.as_map().ok_or_else(|| invalid(key, expected))
}

fn invalid(key: &str, expected: &'static str) -> ApplyError {
    ApplyError::InvalidValue {
        key: key.to_string(),
        expected,
    }
}

/// Map entries as text, skipping nulls.
fn text_entries(
    key: &str,
    map: &Descriptor,
    expected: &'static str,
) -> Result<Vec<(String, String)>, ApplyError> {
    let mut out = Vec::with_capacity(map.len());
    for (name, v) in map.iter() {
        if v.is_null() {
            continue;
        }
        let text = v.to_text().ok_or_else(|| invalid(key, expected))?;
        out.push((name.to_string(), text));
    }
    Ok(out)
}

fn style_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    let map = expect_map(key, value, "a map of style properties")?;
    Ok(UpdateOperation::Style(text_entries(
        key,
        map,
        "primitive style values",
    )?))
}

fn dataset_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    let map = expect_map(key, value, "a map of data entries")?;
    Ok(UpdateOperation::Dataset(text_entries(
        key,
        map,
        "primitive data values",
    )?))
}

fn names(key: &str, value: &Value) -> Result<Vec<String>, ApplyError> {
    const EXPECTED: &str = "a name or a list of names";
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(key, EXPECTED))
            })
            .collect(),
        _ => Err(invalid(key, EXPECTED)),
    }
}

fn class_list_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    let map = expect_map(key, value, "a map of class operations")?;
    let mut actions = Vec::with_capacity(map.len());
    for (op, v) in map.iter() {
        match op {
            "add" => actions.push(ClassAction::Add(names(key, v)?)),
            "remove" => actions.push(ClassAction::Remove(names(key, v)?)),
            "toggle" => actions.push(ClassAction::Toggle(names(key, v)?)),
            "replace" => {
                match <[String; 2]>::try_from(names(key, v)?) {
                    Ok([old, new]) => actions.push(ClassAction::Replace { old, new }),
                    Err(given) => log::debug!(
                        target: LOG_TARGET,
                        "classList replace needs [old, new], got {} name(s); skipped",
                        given.len()
                    ),
                }
            }
            other => {
                log::warn!(target: LOG_TARGET, "unknown classList operation '{other}'; skipped");
            }
        }
    }
    Ok(UpdateOperation::ClassList(actions))
}

fn attribute_map_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    let map = expect_map(key, value, "a map of attributes")?;
    let mut changes = Vec::with_capacity(map.len());
    for (name, v) in map.iter() {
        let change = match v {
            Value::Null | Value::Bool(false) => AttributeChange::Remove {
                name: name.to_string(),
            },
            other => AttributeChange::Set {
                name: name.to_string(),
                value: other
                    .to_text()
                    .ok_or_else(|| invalid(key, "primitive attribute values"))?,
            },
        };
        changes.push(change);
    }
    Ok(UpdateOperation::Attribute(changes))
}

fn set_attribute_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    const EXPECTED: &str = "a [name, value] pair or a map of attributes";
    let set = |name: &str, v: &Value| -> Result<AttributeChange, ApplyError> {
        Ok(AttributeChange::Set {
            name: name.to_string(),
            value: v.to_text().ok_or_else(|| invalid(key, EXPECTED))?,
        })
    };
    match value {
        Value::List(items) => match items.as_slice() {
            [Value::String(name), v] => Ok(UpdateOperation::Attribute(vec![set(name, v)?])),
            _ => Err(invalid(key, EXPECTED)),
        },
        Value::Map(map) => {
            let changes = map
                .iter()
                .map(|(name, v)| set(name, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(UpdateOperation::Attribute(changes))
        }
        _ => Err(invalid(key, EXPECTED)),
    }
}

fn remove_attribute_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    let changes = names(key, value)?
        .into_iter()
        .map(|name| AttributeChange::Remove { name })
        .collect();
    Ok(UpdateOperation::Attribute(changes))
}

fn listener_options(key: &str, value: Option<&Value>) -> Result<ListenerOptions, ApplyError> {
    match value {
        None | Some(Value::Null) => Ok(ListenerOptions::default()),
        Some(Value::Bool(capture)) => Ok(ListenerOptions {
            capture: *capture,
            ..ListenerOptions::default()
        }),
        Some(Value::Map(map)) => {
            let flag = |name: &str| map.get(name).is_some_and(Value::is_truthy);
            Ok(ListenerOptions {
                capture: flag("capture"),
                once: flag("once"),
                passive: flag("passive"),
            })
        }
        Some(_) => Err(invalid(key, "listener options as a bool or a map")),
    }
}

fn listener_op(key: &str, value: &Value) -> Result<UpdateOperation, ApplyError> {
    const EXPECTED: &str = "[type, handler, options] or a map of type to handler";
    let mut specs = Vec::new();
    match value {
        Value::List(items) => match items.as_slice() {
            [Value::String(event_type), Value::Handler(handler), rest @ ..] if rest.len() <= 1 => {
                specs.push(ListenerSpec {
                    event_type: event_type.clone(),
                    handler: handler.clone(),
                    options: listener_options(key, rest.first())?,
                });
            }
            _ => return Err(invalid(key, EXPECTED)),
        },
        Value::Map(map) => {
            for (event_type, v) in map.iter() {
                let (handler, options) = match v {
                    Value::Handler(h) => (h.clone(), ListenerOptions::default()),
                    Value::List(pair) => match pair.as_slice() {
                        [Value::Handler(h), rest @ ..] if rest.len() <= 1 => {
                            (h.clone(), listener_options(key, rest.first())?)
                        }
                        _ => return Err(invalid(key, EXPECTED)),
                    },
                    _ => return Err(invalid(key, EXPECTED)),
                };
                specs.push(ListenerSpec {
                    event_type: event_type.to_string(),
                    handler,
                    options,
                });
            }
        }
        _ => return Err(invalid(key, EXPECTED)),
    }
    Ok(UpdateOperation::Event(EventOp::Listen(specs)))
}
