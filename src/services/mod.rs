pub mod condition;
pub mod delivery;
pub mod dispatcher;
pub mod process_checker;
pub mod process_inspector;
pub mod registry;
pub mod template;
pub mod watchdog;

pub use delivery::{HttpDeliveryClient, RetryPolicy};
pub use dispatcher::AlertDispatcher;
pub use process_inspector::SysinfoInspector;
pub use registry::ChannelRegistry;
pub use watchdog::{ChannelAlerter, Watchdog};
