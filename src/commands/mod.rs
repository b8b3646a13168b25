pub mod export;
pub mod serve;

pub use export::ExportCommand;
pub use serve::ServeCommand;
