pub mod collect;
pub mod commands;
pub mod data;

pub use collect::CollectCommandHandler;
pub use commands::Cli;
pub use data::DataCommandHandler;
