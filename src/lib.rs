//! hotel_ops library - Hotel operations API
//!
//! Provides the database backends (pooled PostgreSQL or an HTTP RPC tunnel),
//! cursor pagination, and the actix-web list endpoints built on them.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod pagination;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
