//! Provider adapters and the machinery shared between them: prompt assembly,
//! JSON extraction, schema validation, bounded retry, and the registry that
//! constructs adapters from stored configuration.

mod bedrock;
mod cerebras;
mod claude;
mod gemini;
mod http;
mod openai;
mod openai_compatible;
mod prompt_builder;
mod provider;
mod registry;
mod response_parsing;
pub mod schema_validator;
mod sigv4;

pub use bedrock::BedrockProvider;
pub use cerebras::CerebrasProvider;
pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use http::RetryPolicy;
pub use openai::OpenAiProvider;
pub use prompt_builder::{BuiltPrompt, build_clean_prompt, build_organize_prompt};
pub use provider::TabProvider;
pub use registry::{
    ProviderDescriptor, config_schema_for, create_provider, descriptor, descriptors,
};
