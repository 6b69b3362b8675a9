//! Account metadata the schedule needs to resolve currencies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{CurrencyCode, Identifiable, NamedEntity};

/// Minimal view of a funding account: its identity and the currency it holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRef {
    pub id: Uuid,
    pub name: String,
    pub currency: CurrencyCode,
}

impl AccountRef {
    pub fn new(name: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency,
        }
    }
}

impl Identifiable for AccountRef {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for AccountRef {
    fn name(&self) -> &str {
        &self.name
    }
}
