//! Application services.
//!
//! Each service is a cheap-to-clone value holding `Arc<dyn ...Store>` handles.
//! Services normalise and validate their input, run the ownership gate, and
//! only then touch the store.

pub mod identity;
pub mod projects;
pub mod tasks;

use serde::{Deserialize, Serialize};

pub use identity::AuthService;
pub use projects::ProjectService;
pub use tasks::TaskService;

/// Acknowledgement returned by delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
