// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Read-through price provider.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use fluxion_exposure_types::{PriceSeries, TimePoint};

use crate::error::Result;
use crate::repository::{PricePeriod, PriceRepository};

/// External day-ahead price feed. Implementations do their own transport;
/// failures come back as [`PriceCacheError::Source`](crate::PriceCacheError::Source).
pub trait PriceSource {
    /// Prices per MWh for `[start, end)`
    fn fetch(
        &self,
        area_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimePoint>>;
}

/// Answers price requests from a repository, downloading only the
/// periods the repository does not hold yet.
#[derive(Debug)]
pub struct CachedPriceProvider<S, R> {
    source: S,
    repository: R,
    force_refresh: bool,
}

impl<S: PriceSource, R: PriceRepository> CachedPriceProvider<S, R> {
    pub fn new(source: S, repository: R) -> Self {
        Self {
            source,
            repository,
            force_refresh: false,
        }
    }

    /// Re-download the whole requested range even when it is cached
    #[must_use]
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Price series for `[start, end)`. Source errors propagate; nothing is retried.
    pub fn prices(
        &self,
        area_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let periods = if self.force_refresh {
            vec![PricePeriod { start, end }]
        } else {
            self.repository.missing_periods(area_code, start, end)?
        };

        for period in &periods {
            let fetched = self.source.fetch(area_code, period.start, period.end)?;
            let stored = self.repository.store(area_code, &fetched)?;
            debug!(
                area = area_code,
                start = %period.start,
                end = %period.end,
                fetched = fetched.len(),
                stored,
                "Filled price period"
            );
        }

        let points = self.repository.query(area_code, start, end)?;
        info!(
            area = area_code,
            downloaded_periods = periods.len(),
            points = points.len(),
            "Prices ready"
        );
        Ok(PriceSeries::from_points(area_code, &points))
    }
}
