pub mod api;
pub use cementcycle_config::{config, persistence, types};
pub use cementcycle_core::{assistant, notify, scoring};
