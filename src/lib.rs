pub mod cli;
pub mod engine;
pub mod errors;
pub mod model;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod statement;
pub mod surface;
pub mod writeback;
