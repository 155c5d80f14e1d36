//! Turns validated load filters into a storage query and computes the page
//! metadata returned alongside the results.

use crate::db_types::EquipmentType;
use crate::validation::{LoadFilters, LoadRequest, PageWindow};

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPredicate {
    /// Case-insensitive substring match.
    OriginCityContains(String),
    /// Case-insensitive substring match.
    DestinationCityContains(String),
    EquipmentTypeIs(EquipmentType),
}

impl LoadPredicate {
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            LoadPredicate::OriginCityContains(city) => {
                qb.push("origin_city ILIKE ")
                    .push_bind(like_pattern(city))
                    .push(" ESCAPE '\\'");
            }
            LoadPredicate::DestinationCityContains(city) => {
                qb.push("destination_city ILIKE ")
                    .push_bind(like_pattern(city))
                    .push(" ESCAPE '\\'");
            }
            LoadPredicate::EquipmentTypeIs(equipment) => {
                qb.push("equipment_type = ").push_bind(*equipment);
            }
        }
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// What to read from the `loads` table. Results are always newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadQuerySpec {
    pub predicates: Vec<LoadPredicate>,
    /// `None` reads every matching row.
    pub window: Option<PageWindow>,
}

impl LoadQuerySpec {
    pub fn unfiltered() -> Self {
        Self {
            predicates: Vec::new(),
            window: None,
        }
    }

    pub fn filtered(filters: &LoadFilters, window: PageWindow) -> Self {
        let mut predicates = Vec::new();
        if let Some(city) = &filters.origin_city {
            predicates.push(LoadPredicate::OriginCityContains(city.clone()));
        }
        if let Some(city) = &filters.destination_city {
            predicates.push(LoadPredicate::DestinationCityContains(city.clone()));
        }
        if let Some(equipment) = filters.equipment_type {
            predicates.push(LoadPredicate::EquipmentTypeIs(equipment));
        }
        Self {
            predicates,
            window: Some(window),
        }
    }

    pub fn from_request(request: &LoadRequest) -> Self {
        match request {
            LoadRequest::Unfiltered => Self::unfiltered(),
            LoadRequest::Filtered { filters, window } => Self::filtered(filters, *window),
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.push_sql(qb);
        }
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM loads");
        self.push_where(&mut qb);
        qb
    }

    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT * FROM loads");
        self.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC");
        if let Some(window) = self.window {
            qb.push(" LIMIT ")
                .push_bind(i64::from(window.limit))
                .push(" OFFSET ")
                .push_bind(window.offset() as i64);
        }
        qb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(window: PageWindow, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(window.limit));
        Self {
            page: window.page,
            limit: u64::from(window.limit),
            total,
            total_pages,
            has_next_page: u64::from(window.page) < total_pages,
            has_prev_page: window.page > 1,
        }
    }

    /// Metadata for an unpaginated listing: everything on page one.
    pub fn single_page(total: u64) -> Self {
        Self {
            page: 1,
            limit: total,
            total,
            total_pages: 1,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}
