pub mod traits;
pub mod manager;
pub mod notifiers;

pub use manager::PluginManager;
pub use traits::Notifier;
