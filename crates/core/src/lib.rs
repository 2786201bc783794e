//! # stylecraft core
//!
//! Domain types, traits, and error definitions for the stylecraft
//! style-recipe adaptation stage. This crate performs no I/O: it defines
//! the domain model the other crates implement against.
//!
//! - [`provider::Provider`] is the seam to the LLM transport.
//! - [`visual_concept`] holds the recipe and output schema types.
//! - [`run_state`] is the state shared between pipeline stages.

pub mod brand_kit;
pub mod error;
pub mod message;
pub mod provider;
pub mod run_state;
pub mod schema;
pub mod visual_concept;

// Re-export key types at crate root for ergonomics
pub use brand_kit::{BrandColor, BrandColors, BrandKitOverride};
pub use error::ProviderError;
pub use message::{Message, Role};
pub use provider::{Completion, Provider, ProviderRequest, ProviderResponse, ResponseSchema, Usage};
pub use run_state::{
    AdaptationContext, GeneratedImagePrompt, PresetKind, RunState, StageOutput, TriggerKind,
};
pub use schema::{ExpectedSchema, FieldKind, SchemaField};
pub use visual_concept::{StyleRecipe, VisualConceptDetails};
