//! Flexible identifier resolution.
//!
//! A single opaque string may name a creature by sequence number, by
//! store-assigned id or by name. The cascade is ordered and stops at the
//! first hit:
//!
//! 1. numeric → lookup by sequence number
//! 2. syntactically a store id → lookup by id
//! 3. otherwise → lookup by normalized name
//!
//! A miss in one step falls through to the next, so `"25"` can still resolve
//! a creature named `25` when no creature has number 25.

use pokedex_id::{CreatureId, SequenceNumber};
use tracing::debug;

use super::model::{normalize_name, Creature};
use super::store::{CreatureFilter, CreatureStore};
use crate::db::DbError;

/// How an identifier reads as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    NotNumeric,
    /// A number that is a valid sequence number.
    Sequence(SequenceNumber),
    /// A number no record can carry (zero, negative, fractional, too large).
    Unmatchable,
}

/// An identifier classified into the identity spaces it could belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier<'a> {
    raw: &'a str,
}

impl<'a> Identifier<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Surrounding whitespace is ignored; blank input is never numeric.
    /// Decimal text and unsigned `0x`/`0o`/`0b` literals count as numbers.
    pub fn numeric(&self) -> Numeric {
        let trimmed = self.raw.trim();
        if trimmed.is_empty() {
            return Numeric::NotNumeric;
        }
        match parse_number(trimmed) {
            Some(value) if value.is_finite() => match SequenceNumber::from_f64(value) {
                Ok(no) => Numeric::Sequence(no),
                Err(_) => Numeric::Unmatchable,
            },
            _ => Numeric::NotNumeric,
        }
    }

    /// The identifier as a store id, if it has the exact id syntax.
    pub fn store_id(&self) -> Option<CreatureId> {
        if CreatureId::is_valid(self.raw) {
            self.raw.parse().ok()
        } else {
            None
        }
    }

    pub fn name(&self) -> String {
        normalize_name(self.raw)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let radix = match text.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return text.parse::<f64>().ok(),
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// Runs the resolution cascade against `store`.
///
/// Absence is `Ok(None)`; only store failures are errors.
pub async fn resolve(
    store: &dyn CreatureStore,
    identifier: &str,
) -> Result<Option<Creature>, DbError> {
    let ident = Identifier::new(identifier);

    match ident.numeric() {
        Numeric::Sequence(no) => {
            if let Some(creature) = store.find_one(&CreatureFilter::No(no)).await? {
                debug!(%identifier, %no, "resolved by sequence number");
                return Ok(Some(creature));
            }
        }
        Numeric::Unmatchable => {
            debug!(%identifier, "numeric identifier outside sequence range");
        }
        Numeric::NotNumeric => {}
    }

    if let Some(id) = ident.store_id() {
        if let Some(creature) = store.find_by_id(id).await? {
            debug!(%identifier, "resolved by store id");
            return Ok(Some(creature));
        }
    }

    let creature = store.find_one(&CreatureFilter::Name(ident.name())).await?;
    if creature.is_some() {
        debug!(%identifier, "resolved by name");
    }
    Ok(creature)
}
