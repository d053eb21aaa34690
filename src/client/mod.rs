//! Client half of the workspace: a typed HTTP client, an explicit session
//! store, and the outline table's view state.

pub mod api;
pub mod state;
pub mod table;

pub use api::{ApiClient, ClientError};
pub use state::ClientState;
pub use table::{Column, CommitOutcome, Edit, EditField, OutlineApi, OutlineTable, Tab};
