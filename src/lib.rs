// Library for tests to access modules

pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod runner;
pub mod sampler;
pub mod version;
