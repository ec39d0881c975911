// Common test doubles for pipeline integration tests

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use haproxy_sync::activate::{ServiceAction, ServiceController};
use haproxy_sync::errors::{ActivationError, InventoryError};
use haproxy_sync::inventory::{InventorySource, RoleList, UpstreamRole};

/// Inventory source serving a canned role list, or failing outright.
pub struct FakeInventory {
    roles: Vec<UpstreamRole>,
    fail: bool,
}

impl FakeInventory {
    /// Serve roles decoded from the collaborator's JSON wire format.
    pub fn from_wire(raw: &str) -> Self {
        let list: RoleList = serde_json::from_str(raw).expect("test inventory decodes");
        Self {
            roles: list.roles,
            fail: false,
        }
    }

    /// Simulate a collaborator that reports failure.
    pub fn failing() -> Self {
        Self {
            roles: Vec::new(),
            fail: true,
        }
    }
}

impl InventorySource for FakeInventory {
    fn list_roles(&self) -> Result<Vec<UpstreamRole>, InventoryError> {
        if self.fail {
            return Err(InventoryError::Query {
                command: "szradm".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "queryenv unavailable".to_string(),
            });
        }
        Ok(self.roles.clone())
    }
}

/// Controller that records every interaction instead of touching a service.
pub struct RecordingController {
    active: bool,
    calls: Rc<RefCell<Vec<String>>>,
}

impl RecordingController {
    pub fn new(active: bool) -> (Self, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                active,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl ServiceController for RecordingController {
    fn validate(&self, _path: &Path) -> Result<(), ActivationError> {
        self.calls.borrow_mut().push("validate".to_string());
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.calls.borrow_mut().push("status".to_string());
        self.active
    }

    fn apply(&self, action: ServiceAction) -> Result<(), ActivationError> {
        self.calls.borrow_mut().push(format!("apply {action}"));
        Ok(())
    }
}
