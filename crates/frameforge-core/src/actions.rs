//! Symbolic event actions.
//!
//! Nodes never carry executable code. A binding names an action and its
//! arguments; the host registers a callback under that name.

use crate::shapes::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Event that triggers a binding.
pub const CLICK_EVENT: &str = "click";

/// A node's binding from an event to a named action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBinding {
    pub event: String,
    pub action: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ActionBinding {
    pub fn on_click(action: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            event: CLICK_EVENT.to_string(),
            action: action.into(),
            args,
        }
    }
}

type ActionFn = Box<dyn Fn(&NodeId, &[String])>;

/// Host-registered callbacks keyed by action name.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionFn>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("ActionRegistry").field("actions", &names).finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the callback for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&NodeId, &[String]) + 'static,
    {
        self.actions.insert(name.into(), Box::new(callback));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.actions.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Run every binding of `node` for `event`. Returns how many callbacks ran.
    pub fn dispatch(&self, node: &Node, event: &str) -> usize {
        let mut ran = 0;
        for binding in node.actions.iter().filter(|b| b.event == event) {
            match self.actions.get(&binding.action) {
                Some(callback) => {
                    callback(&node.id, &binding.args);
                    ran += 1;
                }
                None => log::warn!(
                    "No action registered for '{}' on node {}",
                    binding.action,
                    node.id
                ),
            }
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::NodeType;
    use kurbo::Point;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_runs_bound_callbacks() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let mut registry = ActionRegistry::new();
        registry.register("navigate", move |id, args| {
            sink.borrow_mut().push((id.clone(), args.to_vec()));
        });

        let mut node = Node::create(NodeType::Button, Point::ZERO).with_id("btn");
        node.actions
            .push(ActionBinding::on_click("navigate", vec!["/home".into()]));
        node.actions.push(ActionBinding::on_click("missing", vec![]));

        assert_eq!(registry.dispatch(&node, CLICK_EVENT), 1);
        assert_eq!(registry.dispatch(&node, "hover"), 0);
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_str(), "btn");
        assert_eq!(calls[0].1, vec!["/home".to_string()]);
    }

    #[test]
    fn test_unregister() {
        let mut registry = ActionRegistry::new();
        registry.register("noop", |_, _| {});
        assert!(registry.contains("noop"));
        assert!(registry.unregister("noop"));
        assert!(!registry.contains("noop"));
    }
}
