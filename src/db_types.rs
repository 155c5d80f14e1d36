use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::time::OffsetDateTime;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Trailer category of a load. Labels are matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "equipment_type")]
pub enum EquipmentType {
    #[serde(rename = "Dry Van")]
    #[sqlx(rename = "Dry Van")]
    DryVan,
    #[serde(rename = "Reefer")]
    #[sqlx(rename = "Reefer")]
    Reefer,
    #[serde(rename = "Flatbed")]
    #[sqlx(rename = "Flatbed")]
    Flatbed,
    #[serde(rename = "Step Deck")]
    #[sqlx(rename = "Step Deck")]
    StepDeck,
    #[serde(rename = "Power Only")]
    #[sqlx(rename = "Power Only")]
    PowerOnly,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 5] = [
        EquipmentType::DryVan,
        EquipmentType::Reefer,
        EquipmentType::Flatbed,
        EquipmentType::StepDeck,
        EquipmentType::PowerOnly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EquipmentType::DryVan => "Dry Van",
            EquipmentType::Reefer => "Reefer",
            EquipmentType::Flatbed => "Flatbed",
            EquipmentType::StepDeck => "Step Deck",
            EquipmentType::PowerOnly => "Power Only",
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EquipmentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|e| e.label() == s).ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "call_outcome", rename_all = "lowercase")]
pub enum CallOutcome {
    Transferred,
    Canceled,
}

impl FromStr for CallOutcome {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transferred" => Ok(CallOutcome::Transferred),
            "canceled" => Ok(CallOutcome::Canceled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "caller_sentiment", rename_all = "lowercase")]
pub enum CallerSentiment {
    Positive,
    Neutral,
    Negative,
}

impl FromStr for CallerSentiment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(CallerSentiment::Positive),
            "neutral" => Ok(CallerSentiment::Neutral),
            "negative" => Ok(CallerSentiment::Negative),
            _ => Err(()),
        }
    }
}

/// A freight shipment. Written by the ingest process, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Load {
    pub load_id: String,
    pub origin_city: String,
    pub destination_city: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pickup_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub pickup_end: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub delivery_end: OffsetDateTime,
    pub equipment_type: EquipmentType,
    pub loadboard_rate: Decimal,
    pub notes: Option<String>,
    pub weight: Decimal,
    pub commodity_type: String,
    pub num_of_pieces: i32,
    pub miles: Decimal,
    pub dimensions: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct InboundCall {
    pub call_id: Uuid,
    pub outcome: CallOutcome,
    pub caller_sentiment: CallerSentiment,
    pub carrier_name: Option<String>,
    pub mc_number: Option<i64>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated inbound call, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInboundCall {
    pub outcome: CallOutcome,
    pub caller_sentiment: CallerSentiment,
    pub carrier_name: Option<String>,
    pub mc_number: Option<i64>,
    pub notes: Option<String>,
}
