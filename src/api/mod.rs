//! API handlers for Newsdesk REST endpoints

pub mod health;
pub mod news;
pub mod openapi;
pub mod sources;
