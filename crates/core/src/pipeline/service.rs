//! End-to-end processing of one batch.

use ledgerflow_shared::EngineConfig;
use ledgerflow_shared::types::RunId;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::PipelineError;
use super::types::{ProcessingInput, ProcessingReport, ProcessingSummary};
use crate::aggregation::QuarterlyAggregator;
use crate::hierarchy::AccountHierarchy;
use crate::journal::{JournalEntry, validate_entries};
use crate::ledger::{LedgerEntry, PostingIssue, validate_result};
use crate::rules::{
    ConditionEvaluator, LedgerType, RuleApplicator, RuleValidation, RuleValidator,
};

/// Runs entries through validation, rule application and aggregation.
///
/// Holds the engine configuration and one condition evaluator whose compiled
/// cache is reset at the start of every run.
#[derive(Debug, Clone)]
pub struct ProcessingPipeline {
    config: EngineConfig,
    evaluator: ConditionEvaluator,
}

impl ProcessingPipeline {
    /// Creates a pipeline for the given engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            evaluator: ConditionEvaluator::with_capacity(config.compiled_cache_capacity),
        }
    }

    /// Engine configuration in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes one batch.
    ///
    /// Stages run in order:
    /// 1. Validate entries; rejected entries are reported and skipped
    /// 2. Validate rules; stop if none survive
    /// 3. Remap legacy types through the type mapping, if any
    /// 4. Apply rules to every entry
    /// 5. Validate each entry's postings
    /// 6. Aggregate, roll up, check totals and compute level totals
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NoValidRules` when validation leaves no rule
    /// to apply. Every other problem is collected into the report.
    pub fn run(&self, input: ProcessingInput) -> Result<ProcessingReport, PipelineError> {
        let run_id = RunId::new();
        let ProcessingInput {
            entries,
            rules,
            hierarchy,
            type_mapping,
        } = input;
        let hierarchy = hierarchy.as_ref();
        let total_entries = entries.len();

        info!(
            %run_id,
            entries = entries.len(),
            rules = rules.len(),
            accounts = hierarchy.map_or(0, AccountHierarchy::len),
            "Starting processing run"
        );

        let (valid_entries, entry_issues) = validate_entries(&entries);
        info!(
            %run_id,
            valid = valid_entries.len(),
            rejected = entry_issues.len(),
            "Validated journal entries"
        );

        self.evaluator.clear();
        let validation = RuleValidator::new(self.evaluator.clone())
            .with_hierarchy(hierarchy)
            .with_level(self.config.validation_level)
            .validate(&rules);
        let blocking_rule_issues = validation.blocking_count();
        let warning_rule_issues = validation.warning_count();
        info!(
            %run_id,
            active = validation.valid_rules.len(),
            blocking = blocking_rule_issues,
            warnings = warning_rule_issues,
            "Validated mapping rules"
        );

        if validation.valid_rules.is_empty() {
            warn!(%run_id, total_rules = rules.len(), "No valid rules, stopping");
            return Err(PipelineError::NoValidRules {
                total_rules: rules.len(),
                blocking_issues: blocking_rule_issues,
            });
        }
        let RuleValidation {
            valid_rules,
            issues: rule_issues,
        } = validation;
        let active_rules = valid_rules.len();

        let entries = match &type_mapping {
            Some(mapping) if !mapping.is_empty() => mapping.apply_all(&valid_entries),
            _ => valid_entries,
        };

        let applicator =
            RuleApplicator::from_config(valid_rules, self.evaluator.clone(), &self.config);
        let results = applicator.apply_batch(&entries, hierarchy);

        let posting_issues: Vec<PostingIssue> = entries
            .iter()
            .zip(&results)
            .flat_map(|(entry, result)| {
                validate_result(entry, result, hierarchy, self.config.amount_tolerance)
            })
            .collect();
        let unmatched_entries: Vec<JournalEntry> = entries
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.no_match)
            .map(|(entry, _)| entry.clone())
            .collect();
        let postings: Vec<LedgerEntry> = results
            .iter()
            .flat_map(|r| r.postings.iter().cloned())
            .collect();
        info!(
            %run_id,
            postings = postings.len(),
            unmatched = unmatched_entries.len(),
            posting_issues = posting_issues.len(),
            "Applied mapping rules"
        );

        let aggregator =
            QuarterlyAggregator::new(hierarchy).with_tolerance(self.config.amount_tolerance);
        let aggregates = aggregator.aggregate(&postings);
        let rolled_up = aggregator.roll_up(&aggregates);
        let totals_issues = aggregator.validate_totals(&rolled_up);
        let level_totals = QuarterlyAggregator::level_totals(&rolled_up);
        let yearly = QuarterlyAggregator::aggregate_by_year(&rolled_up);
        info!(
            %run_id,
            aggregates = aggregates.len(),
            rolled_up = rolled_up.len(),
            mismatches = totals_issues.len(),
            "Aggregated postings"
        );

        let (total_cr, total_dr) = side_totals(&postings);
        let summary = ProcessingSummary {
            total_entries,
            valid_entries: entries.len(),
            rejected_entries: total_entries - entries.len(),
            total_rules: rules.len(),
            active_rules,
            matched_entries: results.iter().filter(|r| !r.no_match).count(),
            unmatched_entries: unmatched_entries.len(),
            postings: postings.len(),
            blocking_rule_issues,
            warning_rule_issues,
            application_issues: results.iter().map(|r| r.issues.len()).sum(),
            posting_issues: posting_issues.len(),
            totals_mismatches: totals_issues.len(),
            total_cr,
            total_dr,
            net: total_cr - total_dr,
        };
        info!(
            %run_id,
            matched = summary.matched_entries,
            net = %summary.net,
            "Processing run complete"
        );

        Ok(ProcessingReport {
            run_id,
            postings,
            results,
            unmatched_entries,
            aggregates,
            rolled_up,
            level_totals,
            yearly,
            rule_issues,
            entry_issues,
            posting_issues,
            totals_issues,
            summary,
        })
    }
}

/// Sums postings per side.
fn side_totals(postings: &[LedgerEntry]) -> (Decimal, Decimal) {
    postings
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(cr, dr), p| match p.ledger_type {
            LedgerType::Credit => (cr + p.amount, dr),
            LedgerType::Debit => (cr, dr + p.amount),
        })
}
