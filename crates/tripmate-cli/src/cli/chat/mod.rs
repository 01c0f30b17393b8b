//! Interactive chat room experience.
//!
//! This module implements the room loop: history and realtime messages in
//! one ordered stream, slash commands, plan workflow notices and plan
//! downloads. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
