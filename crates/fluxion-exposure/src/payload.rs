// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

//! Payload builder.
//!
//! Holds the selected sections; the pipeline asks [`PayloadBuilder::wants`]
//! before computing anything heavy, and setters drop unselected parts.

use std::collections::BTreeSet;

use fluxion_exposure_types::{
    Aggregates, AnalysisPayload, Diagnostics, Distributions, Extremes, Hero, JoinedRecord, Meta,
    Scenarios, Section,
};

#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    sections: BTreeSet<Section>,
    hero: Option<Hero>,
    aggregates: Option<Aggregates>,
    scenarios: Option<Scenarios>,
    hourly: Option<Vec<JoinedRecord>>,
    distributions: Option<Distributions>,
    extremes: Option<Extremes>,
}

impl PayloadBuilder {
    #[must_use]
    pub fn new(sections: BTreeSet<Section>) -> Self {
        Self {
            sections,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn wants(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        self.sections.iter().copied().collect()
    }

    pub fn set_hero(&mut self, hero: Hero) {
        if self.wants(Section::Hero) {
            self.hero = Some(hero);
        }
    }

    pub fn set_aggregates(&mut self, aggregates: Aggregates) {
        if self.wants(Section::Aggregates) {
            self.aggregates = Some(aggregates);
        }
    }

    pub fn set_scenarios(&mut self, scenarios: Scenarios) {
        if self.wants(Section::Scenarios) {
            self.scenarios = Some(scenarios);
        }
    }

    pub fn set_hourly(&mut self, records: Vec<JoinedRecord>) {
        if self.wants(Section::Hourly) {
            self.hourly = Some(records);
        }
    }

    pub fn set_distributions(&mut self, distributions: Option<Distributions>) {
        if self.wants(Section::Distributions) {
            self.distributions = distributions;
        }
    }

    pub fn set_extremes(&mut self, extremes: Extremes) {
        if self.wants(Section::Extremes) {
            self.extremes = Some(extremes);
        }
    }

    /// Finish the payload. `meta` and `diagnostics` are always present.
    #[must_use]
    pub fn build(self, meta: Meta, diagnostics: Diagnostics) -> AnalysisPayload {
        AnalysisPayload {
            meta,
            diagnostics,
            hero: self.hero,
            aggregates: self.aggregates,
            scenarios: self.scenarios,
            hourly: self.hourly,
            distributions: self.distributions,
            extremes: self.extremes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unselected_sections_are_dropped() {
        let mut builder = PayloadBuilder::new([Section::Meta, Section::Diagnostics].into());
        assert!(!builder.wants(Section::Hourly));

        builder.set_hourly(Vec::new());
        builder.set_extremes(Extremes {
            worst_negative_hour: None,
            costliest_negative_hours: Vec::new(),
            days: None,
        });
        assert!(builder.hourly.is_none());
        assert!(builder.extremes.is_none());
    }

    #[test]
    fn test_selected_section_is_kept() {
        let mut builder = PayloadBuilder::new([Section::Hourly].into());
        builder.set_hourly(Vec::new());
        assert_eq!(builder.hourly, Some(Vec::new()));
        assert_eq!(builder.sections(), vec![Section::Hourly]);
    }
}
