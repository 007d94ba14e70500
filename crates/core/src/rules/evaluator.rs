//! Condition evaluator with a compiled-expression cache using Moka.
//!
//! Each rule's condition is parsed once and the tree is reused for every
//! entry in the batch. The cache belongs to the evaluator instance; create a
//! new evaluator or call [`ConditionEvaluator::clear`] between rule sets.

use std::collections::BTreeSet;
use std::sync::Arc;

use moka::sync::Cache;

use super::condition::{self, Expr, Record};
use super::error::RuleError;
use super::types::MappingRule;

/// Default cache capacity (number of compiled conditions).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// A parsed condition together with the text it was parsed from.
#[derive(Debug)]
struct CompiledCondition {
    source: String,
    expr: Expr,
}

/// Compiles and evaluates rule conditions.
///
/// Cloning is cheap and clones share the same cache, so one evaluator can
/// be handed to the validator and the applicator of a run.
#[derive(Clone)]
pub struct ConditionEvaluator {
    cache: Cache<String, Arc<CompiledCondition>>,
}

impl ConditionEvaluator {
    /// Creates an evaluator with the default cache capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates an evaluator holding at most `max_capacity` compiled conditions.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    fn compiled(&self, rule: &MappingRule) -> Result<Arc<CompiledCondition>, RuleError> {
        // Keyed by rule id; the stored source text guards against a
        // different rule set reusing the id with another condition.
        if let Some(hit) = self.cache.get(rule.rule_id.as_str())
            && hit.source == rule.condition
        {
            return Ok(hit);
        }

        let expr = condition::parse(&rule.condition)?;
        tracing::debug!(rule_id = %rule.rule_id, "Compiled rule condition");

        let compiled = Arc::new(CompiledCondition {
            source: rule.condition.clone(),
            expr,
        });
        self.cache.insert(rule.rule_id.clone(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Compiles a rule's condition, caching the result.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Syntax`] if the condition does not parse.
    pub fn compile(&self, rule: &MappingRule) -> Result<(), RuleError> {
        self.compiled(rule).map(|_| ())
    }

    /// Pre-compiles every rule and returns the failures as `(rule_id, error)`.
    #[must_use]
    pub fn compile_rules(&self, rules: &[MappingRule]) -> Vec<(String, RuleError)> {
        rules
            .iter()
            .filter_map(|rule| {
                self.compile(rule)
                    .err()
                    .map(|err| (rule.rule_id.clone(), err))
            })
            .collect()
    }

    /// Evaluates a rule's condition against a record.
    ///
    /// `Ok(matches)` on success. An `Err` means the rule does not match this
    /// record; the caller decides whether to report it.
    pub fn evaluate(&self, rule: &MappingRule, record: &dyn Record) -> Result<bool, RuleError> {
        self.compiled(rule)?.expr.evaluate(record)
    }

    /// Returns the field names a condition references.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Syntax`] if the condition does not parse.
    pub fn referenced_fields(condition: &str) -> Result<BTreeSet<String>, RuleError> {
        condition::parse(condition).map(|expr| expr.referenced_fields())
    }

    /// Returns true if a compiled tree for `rule_id` is cached.
    #[must_use]
    pub fn is_cached(&self, rule_id: &str) -> bool {
        self.cache.contains_key(rule_id)
    }

    /// Drops every compiled condition.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConditionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionEvaluator")
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}
