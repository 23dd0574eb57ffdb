//! Keyed primitive reconciliation
//!
//! Primitives for records that stay visible are moved, not rebuilt, so their
//! transient state (animation phase, open popup) survives a filter change.

use std::sync::Arc;

use fc_core::{FloatId, FloatRecord};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Rendered primitives keyed by float id, in draw order
#[derive(Debug, Clone)]
pub struct PrimitiveSet<P> {
    items: IndexMap<FloatId, P>,
}

impl<P> Default for PrimitiveSet<P> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<P> PrimitiveSet<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the set match `visible`.
    ///
    /// `create` builds a primitive for a new record; `update` refreshes one
    /// that is kept. Draw order follows `visible`.
    pub fn reconcile<C, U>(
        &mut self,
        visible: &[Arc<FloatRecord>],
        mut create: C,
        mut update: U,
    ) -> ReconcileReport
    where
        C: FnMut(&Arc<FloatRecord>) -> P,
        U: FnMut(&Arc<FloatRecord>, &mut P),
    {
        let mut report = ReconcileReport::default();
        let mut next = IndexMap::with_capacity(visible.len());

        for record in visible {
            if next.contains_key(&record.id) {
                continue;
            }
            let primitive = match self.items.swap_remove(&record.id) {
                Some(mut existing) => {
                    update(record, &mut existing);
                    report.kept += 1;
                    existing
                }
                None => {
                    report.added += 1;
                    create(record)
                }
            };
            next.insert(record.id.clone(), primitive);
        }

        report.removed = self.items.len();
        self.items = next;
        report
    }

    pub fn get(&self, id: &str) -> Option<&P> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut P> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn ids(&self) -> Vec<FloatId> {
        self.items.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FloatId, &P)> {
        self.items.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut P> {
        self.items.values_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chrono::TimeZone;
    use fc_core::{FloatRecord, GeoPosition, Measurements, Parameter, Quality, Region, Status};

    /// Record at the given position with a quality cycling on `index`
    pub fn float_at(index: usize, lat: f64, lon: f64) -> Arc<FloatRecord> {
        let quality = match index % 3 {
            0 => Quality::High,
            1 => Quality::Medium,
            _ => Quality::Low,
        };
        Arc::new(FloatRecord {
            id: format!("f{index}"),
            platform_number: format!("29{index:05}"),
            cycle_number: 1,
            position: GeoPosition::new(lat, lon).unwrap(),
            region: Region::IndianOcean,
            country: None,
            measurements: Measurements {
                temperature_c: 25.0,
                salinity_psu: 35.0,
                pressure_dbar: 800.0,
                oxygen_umol_kg: None,
            },
            quality,
            status: Status::Active,
            last_update: chrono::Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap(),
            parameters: BTreeSet::from([Parameter::Temperature, Parameter::Salinity]),
        })
    }

    pub fn floats(count: usize) -> Vec<Arc<FloatRecord>> {
        (0..count)
            .map(|i| float_at(i, -30.0 + i as f64, 40.0 + 2.0 * i as f64))
            .collect()
    }

    /// Owned records for loading into a store
    pub fn dataset(count: usize) -> Vec<FloatRecord> {
        floats(count).into_iter().map(|r| (*r).clone()).collect()
    }
}
