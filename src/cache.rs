use std::time::{Duration, Instant};

use tracing::debug;

use crate::source::Acquired;

/// Ostatnie udane pobranie danych, ważne przez `ttl`
pub struct AcquisitionCache {
    ttl: Duration,
    entry: Option<(Acquired, Instant)>,
}

impl AcquisitionCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    fn is_fresh(&self, at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(at) < self.ttl
    }

    #[cfg(test)]
    fn get(&self, now: Instant) -> Option<&Acquired> {
        self.entry
            .as_ref()
            .filter(|(_, at)| self.is_fresh(*at, now))
            .map(|(acquired, _)| acquired)
    }

    /// Returns the cached value or runs `fetch`; errors are never cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        now: Instant,
        fetch: impl FnOnce() -> Result<Acquired, E>,
    ) -> Result<&Acquired, E> {
        let entry = match self.entry.take() {
            Some((acquired, at)) if self.is_fresh(at, now) => (acquired, at),
            stale => {
                if stale.is_some() {
                    debug!(ttl = ?self.ttl, "Cached data expired");
                }
                (fetch()?, now)
            }
        };
        Ok(&self.entry.insert(entry).0)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::WideTable, source::Origin};

    fn acquired(origin: Origin) -> Acquired {
        Acquired { table: WideTable::default(), origin }
    }

    #[test]
    fn serves_cached_value_within_ttl() {
        let mut cache = AcquisitionCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        let mut calls = 0;
        for offset in [0, 10, 59] {
            let got = cache
                .get_or_try_insert_with(t0 + Duration::from_secs(offset), || {
                    calls += 1;
                    Ok::<_, ()>(acquired(Origin::Remote))
                })
                .unwrap();
            assert_eq!(got.origin, Origin::Remote);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn expires_regardless_of_origin() {
        let mut cache = AcquisitionCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache
            .get_or_try_insert_with(t0, || Ok::<_, ()>(acquired(Origin::LocalSnapshot)))
            .unwrap();
        assert!(cache.get(t0 + Duration::from_secs(30)).is_some());
        assert!(cache.get(t0 + Duration::from_secs(60)).is_none());

        let got = cache
            .get_or_try_insert_with(t0 + Duration::from_secs(61), || Ok::<_, ()>(acquired(Origin::Remote)))
            .unwrap();
        assert_eq!(got.origin, Origin::Remote);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = AcquisitionCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(cache.get_or_try_insert_with(t0, || Err::<Acquired, _>("down")).is_err());
        assert!(cache.get(t0).is_none());
    }

    #[test]
    fn invalidate_forces_refetch() {
        let mut cache = AcquisitionCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.get_or_try_insert_with(t0, || Ok::<_, ()>(acquired(Origin::Remote))).unwrap();
        cache.invalidate();
        assert!(cache.get(t0).is_none());
    }
}
