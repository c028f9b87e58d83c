//! Inbound adapters that translate external requests into engine calls while
//! keeping framework details at the edge.

pub mod http;
