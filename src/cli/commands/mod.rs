mod config;
mod populate;
mod status;

pub use config::ConfigCommand;
pub use populate::PopulateArgs;

pub use config::handle_config;
pub use populate::handle_populate;
pub use status::handle_status;
