//! Events Layer - 消息总线实现

mod bus;

pub use bus::BroadcastMessageBus;
