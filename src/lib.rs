pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod source;
pub mod state;
pub mod vector_math;
