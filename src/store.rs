use crate::db_types::{InboundCall, Load, NewInboundCall};
use crate::error::StoreError;
use crate::query::LoadQuerySpec;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[async_trait]
pub trait LoadStore: Send + Sync {
    async fn count_loads(&self, spec: &LoadQuerySpec) -> Result<u64, StoreError>;
    async fn fetch_loads(&self, spec: &LoadQuerySpec) -> Result<Vec<Load>, StoreError>;
}

#[async_trait]
pub trait CallStore: Send + Sync {
    async fn insert_call(&self, call: NewInboundCall) -> Result<InboundCall, StoreError>;
    async fn all_calls(&self) -> Result<Vec<InboundCall>, StoreError>;
}

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoadStore for PgStore {
    async fn count_loads(&self, spec: &LoadQuerySpec) -> Result<u64, StoreError> {
        let (count,): (i64,) = spec
            .count_query()
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }

    async fn fetch_loads(&self, spec: &LoadQuerySpec) -> Result<Vec<Load>, StoreError> {
        let loads = spec
            .select_query()
            .build_query_as::<Load>()
            .fetch_all(&self.pool)
            .await?;
        Ok(loads)
    }
}

#[async_trait]
impl CallStore for PgStore {
    async fn insert_call(&self, call: NewInboundCall) -> Result<InboundCall, StoreError> {
        let inserted = sqlx::query_as::<_, InboundCall>(
            r#"
            INSERT INTO inbound_calls (call_id, outcome, caller_sentiment, carrier_name, mc_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING call_id, outcome, caller_sentiment, carrier_name, mc_number, notes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(call.outcome)
        .bind(call.caller_sentiment)
        .bind(call.carrier_name)
        .bind(call.mc_number)
        .bind(call.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn all_calls(&self) -> Result<Vec<InboundCall>, StoreError> {
        let calls = sqlx::query_as::<_, InboundCall>(
            r#"
            SELECT call_id, outcome, caller_sentiment, carrier_name, mc_number, notes, created_at
            FROM inbound_calls
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(calls)
    }
}

/// In-process stores for tests.
#[cfg(test)]
pub mod memory {
    use super::*;
    use crate::query::LoadPredicate;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    /// Mirrors the `ILIKE` / `=` semantics of the SQL predicates.
    fn predicate_matches(predicate: &LoadPredicate, load: &Load) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        match predicate {
            LoadPredicate::OriginCityContains(city) => contains(&load.origin_city, city),
            LoadPredicate::DestinationCityContains(city) => contains(&load.destination_city, city),
            LoadPredicate::EquipmentTypeIs(equipment) => load.equipment_type == *equipment,
        }
    }

    fn spec_matches(spec: &LoadQuerySpec, load: &Load) -> bool {
        spec.predicates.iter().all(|p| predicate_matches(p, load))
    }

    #[derive(Default)]
    pub struct MemoryStore {
        pub loads: Mutex<Vec<Load>>,
        pub calls: Mutex<Vec<InboundCall>>,
    }

    impl MemoryStore {
        pub fn with_loads(loads: Vec<Load>) -> Self {
            Self {
                loads: Mutex::new(loads),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl LoadStore for MemoryStore {
        async fn count_loads(&self, spec: &LoadQuerySpec) -> Result<u64, StoreError> {
            let loads = self.loads.lock().unwrap();
            Ok(loads.iter().filter(|l| spec_matches(spec, l)).count() as u64)
        }

        async fn fetch_loads(&self, spec: &LoadQuerySpec) -> Result<Vec<Load>, StoreError> {
            let mut matching: Vec<Load> = self
                .loads
                .lock()
                .unwrap()
                .iter()
                .filter(|l| spec_matches(spec, l))
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(match spec.window {
                Some(window) => matching
                    .into_iter()
                    .skip(window.offset() as usize)
                    .take(window.limit as usize)
                    .collect(),
                None => matching,
            })
        }
    }

    #[async_trait]
    impl CallStore for MemoryStore {
        async fn insert_call(&self, call: NewInboundCall) -> Result<InboundCall, StoreError> {
            let inserted = InboundCall {
                call_id: Uuid::new_v4(),
                outcome: call.outcome,
                caller_sentiment: call.caller_sentiment,
                carrier_name: call.carrier_name,
                mc_number: call.mc_number,
                notes: call.notes,
                created_at: OffsetDateTime::now_utc(),
            };
            self.calls.lock().unwrap().push(inserted.clone());
            Ok(inserted)
        }

        async fn all_calls(&self) -> Result<Vec<InboundCall>, StoreError> {
            Ok(self.calls.lock().unwrap().clone())
        }
    }

    /// Fails every operation, standing in for a lost database.
    pub struct BrokenStore;

    fn down() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }

    #[async_trait]
    impl LoadStore for BrokenStore {
        async fn count_loads(&self, _spec: &LoadQuerySpec) -> Result<u64, StoreError> {
            Err(down())
        }

        async fn fetch_loads(&self, _spec: &LoadQuerySpec) -> Result<Vec<Load>, StoreError> {
            Err(down())
        }
    }

    #[async_trait]
    impl CallStore for BrokenStore {
        async fn insert_call(&self, _call: NewInboundCall) -> Result<InboundCall, StoreError> {
            Err(down())
        }

        async fn all_calls(&self) -> Result<Vec<InboundCall>, StoreError> {
            Err(down())
        }
    }

    mod tests {
        use super::*;
        use crate::db_types::EquipmentType;
        use crate::loads::tests::loads;
        use crate::validation::{LoadFilters, PageWindow};

        fn one(origin: &str, destination: &str, equipment: EquipmentType) -> Load {
            loads(1, origin, destination, equipment).remove(0)
        }

        #[test]
        fn city_predicates_ignore_case_and_match_substrings() {
            let l = one("Chicago, IL", "Dallas, TX", EquipmentType::Reefer);
            assert!(predicate_matches(&LoadPredicate::OriginCityContains("chic".into()), &l));
            assert!(predicate_matches(
                &LoadPredicate::DestinationCityContains("DALLAS".into()),
                &l
            ));
            assert!(!predicate_matches(&LoadPredicate::OriginCityContains("Dallas".into()), &l));
        }

        #[test]
        fn equipment_predicate_is_exact() {
            let l = one("Chicago", "Dallas", EquipmentType::Reefer);
            assert!(predicate_matches(&LoadPredicate::EquipmentTypeIs(EquipmentType::Reefer), &l));
            assert!(!predicate_matches(&LoadPredicate::EquipmentTypeIs(EquipmentType::DryVan), &l));
        }

        #[test]
        fn every_predicate_must_hold() {
            let filters = LoadFilters {
                origin_city: Some("Chicago".into()),
                destination_city: None,
                equipment_type: Some(EquipmentType::DryVan),
            };
            let spec = LoadQuerySpec::filtered(&filters, PageWindow { page: 1, limit: 50 });
            assert!(spec_matches(&spec, &one("Chicago", "Austin", EquipmentType::DryVan)));
            assert!(!spec_matches(&spec, &one("Chicago", "Austin", EquipmentType::Flatbed)));
        }
    }
}
