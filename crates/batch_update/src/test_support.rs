//! Recording element used by unit tests.

use crate::handle::{ElementHandle, HandleError, LifeToken, ListenerOptions};
use crate::value::{EventHandler, Value};
use core_types::{HandleKey, next_handle_key};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct RecordingState {
    pub style: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub data: Vec<(String, String)>,
    pub listeners: Vec<(String, ListenerOptions)>,
    pub slots: Vec<String>,
    pub calls: Vec<(String, Vec<Value>)>,
    pub properties: Vec<(String, Value)>,
}

/// Shares state across clones so snapshots alias the same node.
///
/// Methods: `focus`, `scrollTo`. Properties: `focus`, `text`, `textContent`.
#[derive(Clone, Debug)]
pub struct RecordingElement {
    key: HandleKey,
    pub state: Rc<RefCell<RecordingState>>,
}

impl Default for RecordingElement {
    fn default() -> Self {
        Self {
            key: next_handle_key(),
            state: Rc::default(),
        }
    }
}

impl RecordingElement {
    pub fn style(&self, name: &str) -> Option<String> {
        lookup(&self.state.borrow().style, name)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        lookup(&self.state.borrow().attributes, name)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.state.borrow().classes.iter().any(|c| c == name)
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.state
            .borrow()
            .properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }
}

fn lookup(entries: &[(String, String)], name: &str) -> Option<String> {
    entries
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

fn upsert(entries: &mut Vec<(String, String)>, name: &str, value: &str) {
    match entries.iter_mut().find(|(k, _)| k == name) {
        Some((_, v)) => *v = value.to_string(),
        None => entries.push((name.to_string(), value.to_string())),
    }
}

fn check_token(name: &str) -> Result<(), HandleError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(HandleError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl ElementHandle for RecordingElement {
    fn key(&self) -> HandleKey {
        self.key
    }

    fn life_token(&self) -> Option<LifeToken> {
        let token: LifeToken = Rc::<RefCell<RecordingState>>::downgrade(&self.state);
        Some(token)
    }

    fn set_style(&mut self, property: &str, value: &str) -> Result<(), HandleError> {
        if property.is_empty() || !property.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(HandleError::InvalidStyleProperty(property.to_string()));
        }
        upsert(&mut self.state.borrow_mut().style, property, value);
        Ok(())
    }

    fn add_class(&mut self, name: &str) -> Result<(), HandleError> {
        check_token(name)?;
        let mut state = self.state.borrow_mut();
        if !state.classes.iter().any(|c| c == name) {
            state.classes.push(name.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, name: &str) -> Result<(), HandleError> {
        check_token(name)?;
        self.state.borrow_mut().classes.retain(|c| c != name);
        Ok(())
    }

    fn toggle_class(&mut self, name: &str) -> Result<bool, HandleError> {
        if self.has_class(name) {
            self.remove_class(name)?;
            Ok(false)
        } else {
            self.add_class(name)?;
            Ok(true)
        }
    }

    fn replace_class(&mut self, old: &str, new: &str) -> Result<bool, HandleError> {
        check_token(old)?;
        check_token(new)?;
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.classes.iter().position(|c| c == old) else {
            return Ok(false);
        };
        state.classes[pos] = new.to_string();
        Ok(true)
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), HandleError> {
        check_token(name)?;
        upsert(&mut self.state.borrow_mut().attributes, name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, name: &str) -> Result<(), HandleError> {
        self.state.borrow_mut().attributes.retain(|(k, _)| k != name);
        Ok(())
    }

    fn set_data(&mut self, key: &str, value: &str) -> Result<(), HandleError> {
        upsert(&mut self.state.borrow_mut().data, key, value);
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        event_type: &str,
        _handler: EventHandler,
        options: ListenerOptions,
    ) -> Result<(), HandleError> {
        self.state
            .borrow_mut()
            .listeners
            .push((event_type.to_string(), options));
        Ok(())
    }

    fn set_handler_slot(&mut self, slot: &str, _handler: EventHandler) -> Result<(), HandleError> {
        self.state.borrow_mut().slots.push(slot.to_string());
        Ok(())
    }

    fn has_method(&self, name: &str) -> bool {
        matches!(name, "focus" | "scrollTo")
    }

    fn invoke_method(&mut self, name: &str, args: &[Value]) -> Result<Value, HandleError> {
        self.state
            .borrow_mut()
            .calls
            .push((name.to_string(), args.to_vec()));
        Ok(Value::Null)
    }

    fn has_property(&self, name: &str) -> bool {
        matches!(name, "focus" | "textContent" | "text")
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), HandleError> {
        let mut state = self.state.borrow_mut();
        state.properties.retain(|(k, _)| k != name);
        state.properties.push((name.to_string(), value.clone()));
        Ok(())
    }
}
