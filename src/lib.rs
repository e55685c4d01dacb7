//! Huddle - Team Chat Backend
//!
//! This crate implements a Slack-style team chat service: users register
//! and log in, create or join workspaces, post messages in channels,
//! exchange direct messages, and see live updates (new messages, typing
//! indicators, presence) over a WebSocket connection alongside the REST API.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
