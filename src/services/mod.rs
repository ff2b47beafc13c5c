pub mod migration;
pub mod report;
pub mod server;
