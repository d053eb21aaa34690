pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{NewInvitation, NewOrganization, NewUser, Store, StoreError};
