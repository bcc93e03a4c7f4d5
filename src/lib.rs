pub mod api;
pub mod bus;
pub mod chat;
pub mod cli;
pub mod config;
pub mod interface;
pub mod pages;
pub mod session;
