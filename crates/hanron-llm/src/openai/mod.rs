mod client;

pub use client::{OpenAIClient, HUGGINGFACE_ROUTER_BASE, OPENAI_API_BASE};
