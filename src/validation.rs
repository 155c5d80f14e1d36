use crate::consts::{
    DEFAULT_PAGE_LIMIT, MAX_CITY_LEN, MAX_PAGE_LIMIT, MIN_ACTIVE_FILTERS, MIN_CITY_LEN,
};
use crate::db_types::{CallOutcome, CallerSentiment, EquipmentType, NewInboundCall};
use crate::error::AppError;

use serde::{Deserialize, Serialize};

/// Raw `GET /api/loads` query string, as sent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoadQueryParams {
    pub origin_city: Option<String>,
    pub destination_city: Option<String>,
    pub equipment_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Normalized filter fields. Only present fields are serialized, which is
/// also the `filters` echo in the load response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<EquipmentType>,
}

/// Requested page, `page >= 1` and `1 <= limit <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// No filter field given: the whole table, newest first.
    Unfiltered,
    Filtered {
        filters: LoadFilters,
        window: PageWindow,
    },
}

/// Limits applied to incoming parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_active_filters: usize,
    pub min_city_len: usize,
    pub max_city_len: usize,
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_active_filters: MIN_ACTIVE_FILTERS,
            min_city_len: MIN_CITY_LEN,
            max_city_len: MAX_CITY_LEN,
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Trimmed value, or `None` when absent or blank.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ValidationRules {
    pub fn validate_load_query(&self, params: &LoadQueryParams) -> Result<LoadRequest, AppError> {
        let origin = present(&params.origin_city);
        let destination = present(&params.destination_city);
        let equipment = present(&params.equipment_type);

        let active = [origin, destination, equipment]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if active == 0 {
            return Ok(LoadRequest::Unfiltered);
        }
        if active < self.min_active_filters {
            return Err(AppError::validation(
                "At least 2 of: origin_city, destination_city, equipment_type required",
            ));
        }

        let filters = LoadFilters {
            origin_city: origin
                .map(|c| self.validate_city("origin_city", c))
                .transpose()?,
            destination_city: destination
                .map(|c| self.validate_city("destination_city", c))
                .transpose()?,
            equipment_type: equipment.map(parse_equipment_type).transpose()?,
        };
        let window = self.validate_window(params)?;

        Ok(LoadRequest::Filtered { filters, window })
    }

    fn validate_city(&self, field: &str, city: &str) -> Result<String, AppError> {
        let len = city.chars().count();
        if len < self.min_city_len || len > self.max_city_len {
            return Err(AppError::validation(format!(
                "{field} must be between {} and {} characters",
                self.min_city_len, self.max_city_len
            )));
        }
        Ok(city.to_string())
    }

    fn validate_window(&self, params: &LoadQueryParams) -> Result<PageWindow, AppError> {
        let page = match present(&params.page) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(page) if page >= 1 => u32::try_from(page)
                    .map_err(|_| AppError::validation("page is too large"))?,
                _ => return Err(AppError::validation("page must be a positive integer")),
            },
        };

        let limit_error = || {
            AppError::validation(format!("limit must be between 1 and {}", self.max_limit))
        };
        let limit = match present(&params.limit) {
            None => self.default_limit,
            Some(raw) => match raw.parse::<i64>() {
                Ok(limit) if limit >= 1 && limit <= i64::from(self.max_limit) => {
                    u32::try_from(limit).map_err(|_| limit_error())?
                }
                _ => return Err(limit_error()),
            },
        };

        Ok(PageWindow { page, limit })
    }
}

fn parse_equipment_type(raw: &str) -> Result<EquipmentType, AppError> {
    raw.parse().map_err(|_| {
        let valid = EquipmentType::ALL
            .iter()
            .map(|e| e.label())
            .collect::<Vec<_>>()
            .join(", ");
        AppError::validation(format!("Invalid equipment_type. Must be one of: {valid}"))
    })
}

/// MC numbers arrive either as JSON numbers or as free-form strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum McNumberInput {
    Number(i64),
    Text(String),
}

/// Raw `POST /api/inbound-calls` body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InboundCallPayload {
    pub outcome: Option<String>,
    pub caller_sentiment: Option<String>,
    pub carrier_name: Option<String>,
    pub mc_number: Option<McNumberInput>,
    pub notes: Option<String>,
}

pub fn validate_inbound_call(payload: &InboundCallPayload) -> Result<NewInboundCall, AppError> {
    let (Some(outcome), Some(sentiment)) =
        (non_blank(&payload.outcome), non_blank(&payload.caller_sentiment))
    else {
        return Err(AppError::validation(
            "Missing required fields: outcome, caller_sentiment",
        ));
    };

    let outcome: CallOutcome = outcome.parse().map_err(|_| {
        AppError::validation("Invalid outcome. Must be transferred or canceled")
    })?;
    let caller_sentiment: CallerSentiment = sentiment.parse().map_err(|_| {
        AppError::validation("Invalid caller_sentiment. Must be positive, neutral, or negative")
    })?;

    let mc_number = match &payload.mc_number {
        None => None,
        Some(McNumberInput::Number(n)) => Some(*n),
        Some(McNumberInput::Text(text)) if text.trim().is_empty() => None,
        Some(McNumberInput::Text(text)) => Some(parse_mc_number(text)?),
    };

    Ok(NewInboundCall {
        outcome,
        caller_sentiment,
        carrier_name: present(&payload.carrier_name).map(str::to_lowercase),
        mc_number,
        notes: payload.notes.clone().filter(|n| !n.is_empty()),
    })
}

/// Like [`present`] but hands back the value untrimmed.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Keeps the digits of e.g. `"MC-123456"` and parses them.
fn parse_mc_number(text: &str) -> Result<i64, AppError> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(AppError::validation("Invalid mc_number. Must contain digits"));
    }
    digits
        .parse()
        .map_err(|_| AppError::validation("Invalid mc_number. Value is too large"))
}
