//! Response envelope and the fixed response-code table.
//!
//! Every creature operation answers with an [`Envelope`]; callers switch on
//! [`Envelope::code`] and only then look at [`Envelope::data`].

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::json;

use super::model::Creature;
use crate::db::{DbError, DuplicateKey};

/// Outcome vocabulary shared by all operations.
///
/// The numeric wire codes are fixed for client compatibility. `DeleteNoop`
/// and `DeleteConflict` share `107`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Created,
    CreateConflict,
    Updated,
    UpdateConflict,
    Found,
    NotFound,
    Deleted,
    DeleteNoop,
    DeleteConflict,
    InternalError,
}

impl ResponseCode {
    pub const fn code(self) -> u16 {
        match self {
            Self::Created => 100,
            Self::CreateConflict => 101,
            Self::Updated => 102,
            Self::UpdateConflict => 103,
            Self::Found => 104,
            Self::NotFound => 105,
            Self::Deleted => 106,
            Self::DeleteNoop | Self::DeleteConflict => 107,
            Self::InternalError => 500,
        }
    }

    /// Short machine-oriented label used as the envelope message.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::CreateConflict => "not created",
            Self::Updated => "updated",
            Self::UpdateConflict => "not updated",
            Self::Found => "found",
            Self::NotFound => "not found",
            Self::Deleted => "deleted",
            Self::DeleteNoop | Self::DeleteConflict => "not deleted",
            Self::InternalError => "Internal Server Error",
        }
    }

    pub const fn description(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Es => match self {
                Self::Created => "Pokemon creado con éxito",
                Self::CreateConflict => {
                    "No se creo el pokemon debido a que ya se encuentra agregado"
                }
                Self::Updated => "Pokemon actualizado con éxito",
                Self::UpdateConflict => "No se actualizo el pokemon debido a que ya existe",
                Self::Found => "Pokemon encontrado",
                Self::NotFound => "No se encontró ningun pokemon",
                Self::Deleted => "Pokemon eliminado con éxito",
                Self::DeleteNoop => "Pokemon eliminado debido a que no existe",
                Self::DeleteConflict => "No se eliminó el pokemon debido a que no existe",
                Self::InternalError => {
                    "No se puede realizar la petición debido a un error interno, por favor póngase en contacto con los responsables"
                }
            },
            Locale::En => match self {
                Self::Created => "Pokemon created successfully",
                Self::CreateConflict => "Pokemon was not created because it already exists",
                Self::Updated => "Pokemon updated successfully",
                Self::UpdateConflict => "Pokemon was not updated because the value already exists",
                Self::Found => "Pokemon found",
                Self::NotFound => "No pokemon was found",
                Self::Deleted => "Pokemon deleted successfully",
                Self::DeleteNoop => "Pokemon was not deleted because it does not exist",
                Self::DeleteConflict => "Pokemon was not deleted because of a conflict",
                Self::InternalError => {
                    "The request could not be completed due to an internal error, please contact the maintainers"
                }
            },
        }
    }

    /// Delete outcomes omit the `data` field instead of sending `null`.
    const fn omits_data(self) -> bool {
        matches!(self, Self::Deleted | Self::DeleteNoop)
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.label())
    }
}

/// Language of the human-readable `description`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Self::Es),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported locale '{other}' (expected 'es' or 'en')")),
        }
    }
}

/// Envelope payload slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Field left out of the serialized envelope.
    Omitted,
    Null,
    Record(Box<Creature>),
}

impl Payload {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Self::Omitted)
    }

    pub fn record(&self) -> Option<&Creature> {
        match self {
            Self::Record(creature) => Some(&**creature),
            Self::Omitted | Self::Null => None,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Record(creature) => creature.serialize(serializer),
            Self::Omitted | Self::Null => serializer.serialize_none(),
        }
    }
}

/// The `{code, message, description, data}` response returned by every
/// creature operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub code: ResponseCode,
    pub message: String,
    pub description: String,
    #[serde(skip_serializing_if = "Payload::is_omitted")]
    pub data: Payload,
}

impl Envelope {
    /// Envelope for `code` with its standard message and an empty payload.
    pub fn new(code: ResponseCode, locale: Locale) -> Self {
        Self {
            code,
            message: code.label().to_string(),
            description: code.description(locale).to_string(),
            data: if code.omits_data() {
                Payload::Omitted
            } else {
                Payload::Null
            },
        }
    }

    pub fn with_record(mut self, creature: Creature) -> Self {
        self.data = Payload::Record(Box::new(creature));
        self
    }

    /// Conflict envelope whose message names the offending key and value,
    /// e.g. `not created {"name":"pikachu"}`.
    pub fn conflict(code: ResponseCode, duplicate: &DuplicateKey, locale: Locale) -> Self {
        let mut envelope = Self::new(code, locale);
        let key_value = json!({ duplicate.key.as_str(): duplicate.value });
        envelope.message = format!("{} {key_value}", code.label());
        envelope.data = Payload::Null;
        envelope
    }

    pub fn internal(locale: Locale) -> Self {
        Self::new(ResponseCode::InternalError, locale)
    }

    pub fn is(&self, code: ResponseCode) -> bool {
        self.code == code
    }

    pub fn record(&self) -> Option<&Creature> {
        self.data.record()
    }

    /// Splits a `Found` envelope into its record; any other envelope is
    /// handed back unchanged.
    pub fn into_found(self) -> Result<Creature, Self> {
        let Self {
            code,
            message,
            description,
            data,
        } = self;
        match (code, data) {
            (ResponseCode::Found, Payload::Record(creature)) => Ok(*creature),
            (code, data) => Err(Self {
                code,
                message,
                description,
                data,
            }),
        }
    }
}

/// Maps a store failure onto an envelope.
///
/// Uniqueness violations become the caller's conflict envelope; every other
/// failure collapses to the generic internal error, with no store detail.
pub fn translate<F>(error: &DbError, fallback: F, locale: Locale) -> Envelope
where
    F: FnOnce(&DuplicateKey) -> Envelope,
{
    match error.duplicate_key() {
        Some(duplicate) => fallback(duplicate),
        None => Envelope::internal(locale),
    }
}
