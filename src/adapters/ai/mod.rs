//! Generation Adapters.
//!
//! Implementations of the GenerationService port.
//!
//! ## Available Adapters
//!
//! - `MockGenerator` - Configurable mock for testing
//! - `HttpGenerator` - OpenAI-compatible chat completions endpoint

mod http_generator;
mod mock_generator;

pub use http_generator::{HttpGenerator, HttpGeneratorConfig};
pub use mock_generator::{MockGenerator, MockGeneratorError, MockReply, RecordedGeneration};
