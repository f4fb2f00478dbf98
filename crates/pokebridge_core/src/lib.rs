pub mod bridge;
pub mod core_api;
pub mod creature;
pub mod error;
pub mod export;
pub mod fixture;
pub mod gen3;
pub mod gender;
pub mod layout;
pub mod progress;
pub mod reader;
pub mod species;
pub mod text;

pub use bridge::{SaveHandle, StorageBridge};
pub use error::SaveError;
pub use gen3::variant::{FormatVariant, Title};
pub use gen3::{DecodeOptions, Document, SlotTieBreak};
