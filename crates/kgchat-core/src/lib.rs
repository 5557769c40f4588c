//! Domain types shared by every kgchat crate: conversation messages, tool and
//! provider traits, token accounting and the competency-question records.

pub mod competency;
pub mod context;
pub mod errors;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod state;
pub mod stream;
pub mod tokens;
pub mod tools;
