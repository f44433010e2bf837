pub mod channel;
pub mod process;
pub mod service;

pub use channel::{BodyFormat, DeliveryCondition, HttpMethod, MinuteWindow, NotificationChannel};
pub use process::{ProcessDetails, ProcessEntry, ProcessSnapshot};
pub use service::ServiceDescriptor;
