//! Multi-expression tag matcher (spec.md §9, `MultiExpression.MultiExpressionIndex`): compiles
//! disjunctions of `(key, value|*)` tag predicates into an inverted index keyed by tag key, so a
//! feature's tags can be matched against many rules in roughly `O(|tags|)` instead of
//! `O(|rules| * |tags|)`.

use crate::source::TagValue;
use std::collections::BTreeMap;

/// One required `(key, value)` pair in a rule. `Any` matches the key being present with any
/// value; `Exact` additionally requires the stringified value to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPredicate {
	Any(String),
	Exact(String, String),
}

impl TagPredicate {
	fn key(&self) -> &str {
		match self {
			TagPredicate::Any(k) | TagPredicate::Exact(k, _) => k,
		}
	}

	fn matches(&self, tags: &BTreeMap<String, TagValue>) -> bool {
		match self {
			TagPredicate::Any(k) => tags.contains_key(k),
			TagPredicate::Exact(k, v) => tags.get(k).and_then(value_as_str).is_some_and(|s| s == v),
		}
	}
}

fn value_as_str(value: &TagValue) -> Option<&str> {
	value.as_str()
}

/// A single disjunction: a rule is a conjunction of `TagPredicate`s, all of which must hold for
/// the rule's `label` to be returned by [`MultiExpressionIndex::matches`].
#[derive(Debug, Clone)]
struct Rule {
	predicates: Vec<TagPredicate>,
	label: String,
}

/// Compiled index over a set of rules, one inverted bucket per required tag key.
#[derive(Debug, Clone, Default)]
pub struct MultiExpressionIndex {
	rules: Vec<Rule>,
	/// tag key -> indices into `rules` that require that key.
	by_key: BTreeMap<String, Vec<usize>>,
}

impl MultiExpressionIndex {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a rule: `predicates` must all match for `label` to be produced.
	pub fn add_rule(&mut self, predicates: Vec<TagPredicate>, label: impl Into<String>) {
		let rule_idx = self.rules.len();
		for p in &predicates {
			self.by_key.entry(p.key().to_string()).or_default().push(rule_idx);
		}
		self.rules.push(Rule {
			predicates,
			label: label.into(),
		});
	}

	/// Returns every rule label whose predicates are all satisfied by `tags`. Only rules that
	/// share at least one required key with `tags` are even considered.
	#[must_use]
	pub fn matches(&self, tags: &BTreeMap<String, TagValue>) -> Vec<&str> {
		let mut candidates: Vec<usize> = tags
			.keys()
			.filter_map(|k| self.by_key.get(k))
			.flatten()
			.copied()
			.collect();
		candidates.sort_unstable();
		candidates.dedup();

		candidates
			.into_iter()
			.filter_map(|i| {
				let rule = &self.rules[i];
				rule.predicates.iter().all(|p| p.matches(tags)).then_some(rule.label.as_str())
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, TagValue> {
		pairs.iter().map(|(k, v)| (k.to_string(), TagValue::from(*v))).collect()
	}

	#[test]
	fn exact_predicate_matches_only_that_value() {
		let mut idx = MultiExpressionIndex::new();
		idx.add_rule(vec![TagPredicate::Exact("amenity".into(), "airport".into())], "aerodrome_label");

		assert_eq!(idx.matches(&tags(&[("amenity", "airport")])), vec!["aerodrome_label"]);
		assert!(idx.matches(&tags(&[("amenity", "cafe")])).is_empty());
	}

	#[test]
	fn any_predicate_matches_presence_only() {
		let mut idx = MultiExpressionIndex::new();
		idx.add_rule(vec![TagPredicate::Any("name".into())], "named");

		assert_eq!(idx.matches(&tags(&[("name", "whatever")])), vec!["named"]);
		assert!(idx.matches(&tags(&[("amenity", "cafe")])).is_empty());
	}

	#[test]
	fn conjunction_requires_every_predicate() {
		let mut idx = MultiExpressionIndex::new();
		idx.add_rule(
			vec![
				TagPredicate::Exact("amenity".into(), "airport".into()),
				TagPredicate::Any("iata".into()),
			],
			"aerodrome_label",
		);

		assert!(idx.matches(&tags(&[("amenity", "airport")])).is_empty());
		assert_eq!(
			idx.matches(&tags(&[("amenity", "airport"), ("iata", "XXX")])),
			vec!["aerodrome_label"]
		);
	}

	#[test]
	fn multiple_rules_can_match_the_same_feature() {
		let mut idx = MultiExpressionIndex::new();
		idx.add_rule(vec![TagPredicate::Any("name".into())], "named");
		idx.add_rule(vec![TagPredicate::Exact("amenity".into(), "airport".into())], "aerodrome_label");

		let mut got = idx.matches(&tags(&[("name", "X"), ("amenity", "airport")]));
		got.sort_unstable();
		assert_eq!(got, vec!["aerodrome_label", "named"]);
	}

	#[test]
	fn unrelated_tags_are_never_scanned() {
		let mut idx = MultiExpressionIndex::new();
		idx.add_rule(vec![TagPredicate::Any("amenity".into())], "poi");
		assert!(idx.matches(&tags(&[("highway", "residential")])).is_empty());
	}
}
