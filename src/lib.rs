pub mod api;
pub mod chat;
pub mod config;
pub mod openai;
pub mod pipeline;
pub mod thread_context;
