pub mod broker;
pub mod settings;

pub use broker::{BrokerConfig, DEFAULT_QUEUE_CAPACITY};
pub use settings::Settings;
