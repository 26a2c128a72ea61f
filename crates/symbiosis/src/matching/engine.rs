use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use super::score::compute_score;
use crate::broadcast::{EventBroadcaster, PipelineEvent};
use crate::db::Store;
use crate::error::{Result, SymbiosisError};
use crate::models::{IndustryProfile, MatchRecommendation, Output};
use crate::oracle::{ConversionEstimate, SymbiosisOracle};

/// Reasoning stored when the explanation call fails.
pub const FALLBACK_REASONING: &str = "Match identified based on input/output compatibility";

/// Outcome of one match run for a producer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRunSummary {
    pub producer_id: String,
    /// Outputs for which candidates were looked up.
    pub outputs_processed: usize,
    /// Outputs abandoned because classification or lookup failed.
    pub outputs_skipped: usize,
    pub recommendations_created: usize,
    /// Pairs dropped on conversion-estimate or insert failure.
    pub pairs_failed: usize,
}

/// Finds and stores symbiosis matches for a producer profile.
///
/// Failures are contained to the smallest unit they affect: a failed
/// lookup skips one output, a failed estimate or insert skips one pair.
#[derive(Clone)]
pub struct MatchEngine {
    oracle: Arc<dyn SymbiosisOracle>,
    store: Arc<dyn Store>,
    events: EventBroadcaster,
}

impl MatchEngine {
    pub fn new(
        oracle: Arc<dyn SymbiosisOracle>,
        store: Arc<dyn Store>,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            oracle,
            store,
            events,
        }
    }

    /// Runs [`generate_matches`](Self::generate_matches) as an independent
    /// background task. Errors are logged and returned through the handle.
    pub fn spawn(&self, producer_id: &str) -> JoinHandle<Result<MatchRunSummary>> {
        let engine = self.clone();
        let producer_id = producer_id.to_string();
        tokio::spawn(async move {
            let result = engine.generate_matches(&producer_id).await;
            if let Err(e) = &result {
                tracing::error!(producer_id = %producer_id, error = %e, "Match generation failed");
            }
            result
        })
    }

    pub async fn generate_matches(&self, producer_id: &str) -> Result<MatchRunSummary> {
        self.run(producer_id)
            .instrument(info_span!("match_run", producer_id = %producer_id))
            .await
    }

    async fn run(&self, producer_id: &str) -> Result<MatchRunSummary> {
        let producer = self
            .store
            .get_profile(producer_id)?
            .ok_or_else(|| SymbiosisError::NotFound {
                kind: "profile",
                id: producer_id.to_string(),
            })?;

        let pool: Vec<IndustryProfile> = self
            .store
            .list_profiles()?
            .into_iter()
            .filter(|p| p.id != producer.id)
            .collect();

        let mut summary = MatchRunSummary {
            producer_id: producer.id.clone(),
            ..MatchRunSummary::default()
        };

        if pool.is_empty() {
            tracing::info!("No other profiles to match against");
        } else {
            for output in &producer.outputs {
                self.match_output(&producer, output, &pool, &mut summary)
                    .instrument(info_span!("match_output", waste = %output.name))
                    .await;
            }
        }

        tracing::info!(
            outputs_processed = summary.outputs_processed,
            outputs_skipped = summary.outputs_skipped,
            recommendations = summary.recommendations_created,
            pairs_failed = summary.pairs_failed,
            "Match run finished"
        );
        self.events
            .send(PipelineEvent::MatchRunCompleted(summary.clone()));
        Ok(summary)
    }

    async fn match_output(
        &self,
        producer: &IndustryProfile,
        output: &Output,
        pool: &[IndustryProfile],
        summary: &mut MatchRunSummary,
    ) {
        let classification = match self.oracle.classify(&output.name, &output.state).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, skipping output");
                summary.outputs_skipped += 1;
                return;
            }
        };
        tracing::debug!(category = %classification.category, tags = ?classification.tags, "Classified waste stream");

        let names = match self.oracle.find_candidates(output, pool).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "Candidate lookup failed, skipping output");
                summary.outputs_skipped += 1;
                return;
            }
        };
        summary.outputs_processed += 1;

        // Repeated names in the reply collapse; same-named profiles are each evaluated.
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();

        for candidate in pool.iter().filter(|c| wanted.contains(c.name.as_str())) {

            let conversion = match self
                .oracle
                .estimate_conversion(output, &candidate.name)
                .await
            {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(candidate = %candidate.name, error = %e, "Conversion estimate failed, skipping pair");
                    summary.pairs_failed += 1;
                    continue;
                }
            };

            let reasoning = match self.oracle.explain(output, candidate, &conversion).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(candidate = %candidate.name, error = %e, "Explanation failed, using default reasoning");
                    FALLBACK_REASONING.to_string()
                }
            };

            let rec = build_recommendation(producer, candidate, output, conversion, reasoning);
            match self.store.insert_match(&rec) {
                Ok(()) => {
                    tracing::debug!(candidate = %candidate.name, score = rec.score, "Stored recommendation");
                    summary.recommendations_created += 1;
                }
                Err(e) => {
                    tracing::error!(candidate = %candidate.name, error = %e, "Failed to store recommendation");
                    summary.pairs_failed += 1;
                }
            }
        }
    }
}

fn build_recommendation(
    producer: &IndustryProfile,
    candidate: &IndustryProfile,
    output: &Output,
    conversion: ConversionEstimate,
    reasoning: String,
) -> MatchRecommendation {
    let mut rec = MatchRecommendation::new(&output.name, &producer.id, &candidate.id);
    rec.score = compute_score(&producer.location, &candidate.location, &conversion);
    rec.conversion_needed = conversion.conversion_needed;
    rec.conversion_description =
        Some(conversion.description).filter(|description| !description.is_empty());
    rec.recommended_converter = conversion.recommended_converter;
    rec.estimated_cost = Some(conversion.estimated_cost);
    rec.reasoning = reasoning;
    rec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Converter, Location};
    use crate::oracle::Complexity;

    #[test]
    fn test_build_recommendation_copies_conversion() {
        let producer = IndustryProfile::new("Mill", Location::new(0.0, 0.0), vec![], vec![]);
        let candidate = IndustryProfile::new("Kiln", Location::new(0.0, 0.0), vec![], vec![]);
        let output = Output::new("slag", "solid", "5 t");
        let conversion = ConversionEstimate {
            conversion_needed: true,
            description: String::new(),
            recommended_converter: Converter::Consumer,
            estimated_cost: "$5/t".to_string(),
            complexity: Complexity::Low,
        };

        let rec = build_recommendation(&producer, &candidate, &output, conversion, "ok".into());
        assert_eq!(rec.waste_id, "slag");
        assert_eq!(rec.producer_id, producer.id);
        assert_eq!(rec.candidate_id, candidate.id);
        assert!(rec.conversion_description.is_none());
        assert_eq!(rec.recommended_converter, Converter::Consumer);
        assert_eq!(rec.estimated_cost.as_deref(), Some("$5/t"));
        // 0.5 + 0.15 (low) + 0.15 (same site)
        assert!((rec.score - 0.8).abs() < 1e-9);
        assert!(!rec.confirmed);
    }
}
