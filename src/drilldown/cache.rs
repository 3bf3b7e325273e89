//! Session-scoped pain-point cache.
//!
//! Entries are append-only: once a key holds an analysis, later writes for that key are ignored.
//! The only way to drop entries is [`PainPointCache::clear`], which a fresh graph analysis calls.
//! Requests that are still running are tracked per key so concurrent callers join one fetch.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use futures::future::{LocalBoxFuture, Shared};

use super::source::PainPointAnalysis;
use crate::error::ExplorerError;

/// Normalized `(industry, stakeholder, step)` triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
	industry: String,
	stakeholder: String,
	step: String,
}

/// Trim, lower-case and collapse whitespace runs to `_`.
fn normalize(component: &str) -> String {
	component
		.split_whitespace()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join("_")
}

impl CacheKey {
	/// Build a key, normalizing each component separately.
	pub fn new(industry: &str, stakeholder: &str, step: &str) -> Self {
		Self {
			industry: normalize(industry),
			stakeholder: normalize(stakeholder),
			step: normalize(step),
		}
	}
}

impl fmt::Display for CacheKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}_{}_{}", self.industry, self.stakeholder, self.step)
	}
}

/// What every waiter on a pain-point request receives.
pub type AnalysisResult = Result<Rc<PainPointAnalysis>, ExplorerError>;
/// A running pain-point request that further callers can await.
pub type PendingAnalysis = Shared<LocalBoxFuture<'static, AnalysisResult>>;

/// Pain-point analyses of the current session, keyed by [`CacheKey`].
#[derive(Default)]
pub struct PainPointCache {
	entries: HashMap<CacheKey, Rc<PainPointAnalysis>>,
	in_flight: HashMap<CacheKey, PendingAnalysis>,
	generation: u64,
}

impl PainPointCache {
	/// An empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stored analysis for a key.
	pub fn get(&self, key: &CacheKey) -> Option<Rc<PainPointAnalysis>> {
		self.entries.get(key).cloned()
	}

	/// Whether a key holds an analysis.
	pub fn contains(&self, key: &CacheKey) -> bool {
		self.entries.contains_key(key)
	}

	/// Number of stored analyses.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Bumped on every [`clear`](Self::clear); results started under an older generation are
	/// discarded when they settle.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Store an analysis unless the key already has one. Returns whether it was stored.
	pub fn insert(&mut self, key: CacheKey, analysis: Rc<PainPointAnalysis>) -> bool {
		if self.entries.contains_key(&key) {
			return false;
		}
		self.entries.insert(key, analysis);
		true
	}

	/// Running request for a key, if any.
	pub fn pending(&self, key: &CacheKey) -> Option<PendingAnalysis> {
		self.in_flight.get(key).cloned()
	}

	/// Whether a request for the key is running.
	pub fn is_pending(&self, key: &CacheKey) -> bool {
		self.in_flight.contains_key(key)
	}

	/// Register a running request so later callers join it.
	pub fn track(&mut self, key: CacheKey, request: PendingAnalysis) {
		self.in_flight.insert(key, request);
	}

	/// Record the outcome of a tracked request. Safe to call once per waiter.
	pub fn settle(&mut self, key: &CacheKey, generation: u64, result: &AnalysisResult) {
		if generation != self.generation {
			return;
		}
		self.in_flight.remove(key);
		if let Ok(analysis) = result {
			self.insert(key.clone(), analysis.clone());
		}
	}

	/// Forget everything; only a new graph analysis does this.
	pub fn clear(&mut self) {
		self.entries.clear();
		self.in_flight.clear();
		self.generation += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::drilldown::source::PainPoint;

	fn analysis(point: &str) -> Rc<PainPointAnalysis> {
		Rc::new(PainPointAnalysis {
			pain_points: vec![PainPoint {
				point: point.into(),
				sources: vec![],
			}],
		})
	}

	#[test]
	fn keys_normalize_case_and_whitespace() {
		let a = CacheKey::new("Healthcare", "CFO", "Approve Budget");
		let b = CacheKey::new(" healthcare ", "cfo", "approve   budget");
		assert_eq!(a, b);
		assert_eq!(a.to_string(), "healthcare_cfo_approve_budget");
	}

	#[test]
	fn components_do_not_bleed_into_each_other() {
		assert_ne!(
			CacheKey::new("a b", "c", "d"),
			CacheKey::new("a", "b c", "d")
		);
	}

	#[test]
	fn entries_are_append_only() {
		let mut cache = PainPointCache::new();
		let key = CacheKey::new("x", "y", "z");
		assert!(cache.insert(key.clone(), analysis("first")));
		assert!(!cache.insert(key.clone(), analysis("second")));
		assert_eq!(cache.get(&key).unwrap().pain_points[0].point, "first");
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn settle_from_an_old_generation_is_dropped() {
		let mut cache = PainPointCache::new();
		let key = CacheKey::new("x", "y", "z");
		let stale = cache.generation();
		cache.clear();
		cache.settle(&key, stale, &Ok(analysis("late")));
		assert!(cache.is_empty());

		cache.settle(&key, cache.generation(), &Ok(analysis("fresh")));
		assert!(cache.contains(&key));
	}
}
