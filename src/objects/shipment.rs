use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all="camelCase")]
pub struct Shipment {
    id: i64,
    number: String,
    created_at: String,
    carrier: Option<String>,
    // Number of chips submitted, which may be more than were stored.
    quantity: u32,
    notes: String,
}

impl Shipment {
    pub fn new(
        id: i64,
        number: String,
        created_at: String,
        carrier: Option<String>,
        quantity: u32,
        notes: String,
    ) -> Shipment {
        Shipment {
            id,
            number,
            created_at,
            carrier,
            quantity,
            notes,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}
