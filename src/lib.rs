// studio-edge library surface
//
// The binary wires these together; the intake module is also consumed
// directly by the form frontends.

pub mod cli;
pub mod config;
pub mod intake;
pub mod proxy;
pub mod routes;
pub mod server;
pub mod upload;
