//! Creature records: lookup by flexible identifier and the response-code
//! protocol shared by all operations.

mod envelope;
mod model;
mod resolver;
mod service;
mod store;

pub use envelope::{translate, Envelope, Locale, Payload, ResponseCode};
pub use model::{normalize_name, Creature, CreatureDraft, CreaturePatch, NewCreature};
pub use resolver::{resolve, Identifier, Numeric};
pub use service::CreatureService;
pub use store::{CreatureFilter, CreatureStore, UpdateOutcome};
