//! Primer Gen - Incremental catalog generation
//!
//! Provides the generation capabilities (text, image, speech) behind small
//! traits, the network providers that implement them (ModelScope, Doubao,
//! Edge TTS) plus an offline mock, layered configuration, and the
//! [`GenerationRunner`] that fills in missing catalog fields one group at a time.

pub mod capability;
pub mod config;
pub mod extract;
pub mod http;
pub mod prompt;
pub mod providers;
pub mod runner;
pub mod seed;
pub mod task;

pub use capability::{
    Capability, ImageGenerator, ImageRequest, Language, SpeechGenerator, TextGenerator, TextPrompt,
};
pub use config::PrimerConfig;
pub use extract::{extract_json_block, parse_text_fields};
pub use prompt::{PromptBuilder, PromptStyle};
pub use runner::{CredentialPools, GenerationRunner, Generators, GroupTally, RunOptions, RunSummary};
pub use seed::{Seed, SeedList};
pub use task::{PollPolicy, RemoteTask, TaskStatus};
