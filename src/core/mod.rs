pub mod completion;
pub mod config;
pub mod constants;
pub mod controller;
pub mod credentials;
pub mod failover;
pub mod keyring;
pub mod message;
pub mod session;
pub mod storage;
pub mod ticker;
