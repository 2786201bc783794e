//! Prompt compiler for style adaptation.
//!
//! Builds the system and user prompts from run-state inputs. Prompt text
//! is deterministic: the same inputs always produce byte-identical
//! prompts.

pub mod language;
pub mod palette;
pub mod system;
pub mod user;

pub use language::language_display_name;
pub use palette::{PaletteLayer, build_palette_prompt};
pub use system::build_system_prompt;
pub use user::{UserPromptInput, build_user_prompt};
