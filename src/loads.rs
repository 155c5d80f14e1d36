use crate::db_types::Load;
use crate::error::AppError;
use crate::query::{LoadQuerySpec, Pagination};
use crate::store::LoadStore;
use crate::validation::{LoadFilters, LoadRequest};

use serde::Serialize;
use tracing::{debug, error};

/// Body of `GET /api/loads`.
#[derive(Debug, Serialize)]
pub struct LoadPage {
    pub data: Vec<Load>,
    pub pagination: Pagination,
    pub filters: LoadFilters,
}

const FETCH_FAILED: &str = "Failed to fetch loads";

/// Runs a validated load request. Either the whole page is returned or an
/// error; storage causes are logged and never reach the client.
pub async fn query_loads(store: &dyn LoadStore, request: LoadRequest) -> Result<LoadPage, AppError> {
    let spec = LoadQuerySpec::from_request(&request);

    match request {
        LoadRequest::Unfiltered => {
            let data = store.fetch_loads(&spec).await.map_err(|e| {
                error!(error=%e, "failed to fetch all loads");
                AppError::Storage(FETCH_FAILED)
            })?;
            let pagination = Pagination::single_page(data.len() as u64);
            debug!(total = pagination.total, "fetched unfiltered loads");
            Ok(LoadPage {
                data,
                pagination,
                filters: LoadFilters::default(),
            })
        }
        LoadRequest::Filtered { filters, window } => {
            let total = store.count_loads(&spec).await.map_err(|e| {
                error!(error=%e, filters=?filters, "failed to count loads");
                AppError::Storage(FETCH_FAILED)
            })?;
            let data = store.fetch_loads(&spec).await.map_err(|e| {
                error!(error=%e, filters=?filters, "failed to fetch loads with filters");
                AppError::Storage(FETCH_FAILED)
            })?;
            let pagination = Pagination::new(window, total);
            debug!(
                total,
                page = window.page,
                returned = data.len(),
                "fetched filtered loads"
            );
            Ok(LoadPage {
                data,
                pagination,
                filters,
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db_types::EquipmentType;
    use crate::store::memory::{BrokenStore, MemoryStore};
    use crate::validation::PageWindow;
    use rust_decimal::Decimal;
    use time::{macros::datetime, Duration};

    /// `n` loads `origin -> destination`, created one hour apart.
    pub(crate) fn loads(n: usize, origin: &str, destination: &str, equipment: EquipmentType) -> Vec<Load> {
        let base = datetime!(2025-01-01 00:00 UTC);
        (0..n)
            .map(|i| Load {
                load_id: format!("{}{:03}", &origin[..2], i),
                origin_city: origin.into(),
                destination_city: destination.into(),
                pickup_start: datetime!(2025-03-01 08:00 UTC),
                pickup_end: datetime!(2025-03-01 12:00 UTC),
                delivery_start: datetime!(2025-03-03 08:00 UTC),
                delivery_end: datetime!(2025-03-03 12:00 UTC),
                equipment_type: equipment,
                loadboard_rate: Decimal::new(180_000, 2),
                notes: None,
                weight: Decimal::new(38_000, 0),
                commodity_type: "Paper".into(),
                num_of_pieces: 12,
                miles: Decimal::new(720, 0),
                dimensions: "48x40x60".into(),
                created_at: base + Duration::hours(i as i64),
            })
            .collect()
    }

    fn filtered(origin: &str, equipment: EquipmentType, page: u32, limit: u32) -> LoadRequest {
        LoadRequest::Filtered {
            filters: LoadFilters {
                origin_city: Some(origin.into()),
                destination_city: None,
                equipment_type: Some(equipment),
            },
            window: PageWindow { page, limit },
        }
    }

    #[tokio::test]
    async fn filtered_query_pages_newest_first() {
        let mut all = loads(25, "Chicago", "Dallas", EquipmentType::DryVan);
        all.extend(loads(5, "Chicago", "Dallas", EquipmentType::Reefer));
        all.extend(loads(4, "Denver", "Dallas", EquipmentType::DryVan));
        let store = MemoryStore::with_loads(all);

        let page = query_loads(&store, filtered("chicago", EquipmentType::DryVan, 2, 10))
            .await
            .unwrap();

        assert_eq!(page.pagination, Pagination::new(PageWindow { page: 2, limit: 10 }, 25));
        assert_eq!(page.data.len(), 10);
        assert!(page
            .data
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        // page 2 of newest-first: rows 14..=5
        assert_eq!(page.data[0].load_id, "Ch014");
    }

    #[tokio::test]
    async fn last_page_is_partial() {
        let store = MemoryStore::with_loads(loads(25, "Chicago", "Dallas", EquipmentType::DryVan));
        let page = query_loads(&store, filtered("Chicago", EquipmentType::DryVan, 3, 10))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 5);
        assert!(!page.pagination.has_next_page);
    }

    #[tokio::test]
    async fn unfiltered_query_returns_everything_as_one_page() {
        let store = MemoryStore::with_loads(loads(7, "Austin", "Tulsa", EquipmentType::Flatbed));
        let page = query_loads(&store, LoadRequest::Unfiltered).await.unwrap();
        assert_eq!(page.data.len(), 7);
        assert_eq!(page.pagination, Pagination::single_page(7));
        assert_eq!(page.filters, LoadFilters::default());
    }

    #[tokio::test]
    async fn storage_failure_is_generic() {
        let err = query_loads(&BrokenStore, filtered("Chicago", EquipmentType::DryVan, 1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(FETCH_FAILED)));
        assert!(!err.to_string().contains("pool"));
    }
}
