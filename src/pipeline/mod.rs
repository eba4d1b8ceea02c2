//! The AI-response-to-structured-data pipeline
//!
//! `BUILD_PROMPT -> CALL_MODEL -> EXTRACT -> REPAIR -> VALIDATE`, one model
//! call per request and no retries. A failure carries the stage it happened
//! at and is logged with enough of the raw text to reproduce it offline.

pub mod extract;
pub mod parse;
pub mod prompt;
pub mod repair;
pub mod schema;

use crate::llm::{LlmGateway, ProviderError};
use crate::metrics::{Metrics, Operation, Outcome};
use crate::middleware::RequestId;
use crate::trip::{ChatRequest, ShuffleRequest, ShuffleResult, TripPlan, TripRequest};
use parse::{ParseStage, ParsedResponse, parse_model_output};
use repair::UnparsableResponseError;
use schema::SchemaMismatchError;
use std::sync::Arc;

/// Step of the pipeline a request is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    BuildPrompt,
    CallModel,
    Extract,
    Repair,
    Validate,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::BuildPrompt => "build_prompt",
            PipelineStage::CallModel => "call_model",
            PipelineStage::Extract => "extract",
            PipelineStage::Repair => "repair",
            PipelineStage::Validate => "validate",
        }
    }
}

/// Why a pipeline run failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Unparsable(#[from] UnparsableResponseError),

    #[error(transparent)]
    Schema(#[from] SchemaMismatchError),
}

impl PipelineError {
    /// Stage at which the run stopped
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Provider(_) => PipelineStage::CallModel,
            PipelineError::Unparsable(_) => PipelineStage::Repair,
            PipelineError::Schema(_) => PipelineStage::Validate,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            PipelineError::Provider(_) => Outcome::ProviderError,
            PipelineError::Unparsable(_) => Outcome::UnparsableResponse,
            PipelineError::Schema(_) => Outcome::SchemaMismatch,
        }
    }

    /// Message safe to return to API clients
    ///
    /// Provider detail (names, status bodies) stays in the logs.
    pub fn client_message(&self) -> String {
        match self {
            PipelineError::Provider(ProviderError::Timeout { .. }) => {
                "The AI service took too long to respond. Please try again.".to_string()
            }
            PipelineError::Provider(_) => {
                "The AI service is unavailable right now. Please try again.".to_string()
            }
            PipelineError::Unparsable(_) => {
                "AI returned invalid JSON format. Please try again.".to_string()
            }
            PipelineError::Schema(e) => format!(
                "AI response field '{}' {}. Please try again.",
                e.field(),
                e.problem()
            ),
        }
    }
}

/// Structured data produced by a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome<T> {
    pub data: T,
    /// Invariant violations that did not reject the result
    pub warnings: Vec<String>,
    /// How the model's JSON was recovered
    pub parse_stage: ParseStage,
}

/// Orchestrates prompt construction, the model call, parsing and validation
pub struct TripPipeline {
    gateway: Arc<LlmGateway>,
    metrics: Arc<Metrics>,
}

impl TripPipeline {
    pub fn new(gateway: Arc<LlmGateway>, metrics: Arc<Metrics>) -> Self {
        Self { gateway, metrics }
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    /// Generate a day-by-day itinerary
    ///
    /// A plan with the wrong number of days or repeated places is still
    /// returned; the violations are reported as warnings.
    pub async fn plan_trip(
        &self,
        request: &TripRequest,
        request_id: RequestId,
    ) -> Result<PipelineOutcome<TripPlan>, PipelineError> {
        let operation = Operation::TripPlan;
        let prompt = prompt::build_trip_prompt(request);

        let result = self
            .call_and_parse(operation, &prompt, request_id)
            .await
            .and_then(|(raw, parsed)| {
                let stage = parsed.stage;
                schema::into_trip_plan(parsed.value)
                    .map(|plan| (plan, stage))
                    .map_err(|e| self.log_failure(operation, request_id, &raw, e.into()))
            });

        let (plan, parse_stage) = self.finish(operation, result)?;

        let mut warnings = Vec::new();
        if plan.days.len() != request.days() as usize {
            warnings.push(format!(
                "Requested {} days but the plan contains {}",
                request.days(),
                plan.days.len()
            ));
        }
        let duplicates = plan.duplicate_place_names();
        if !duplicates.is_empty() {
            warnings.push(format!(
                "Places repeated across the plan: {}",
                duplicates.join(", ")
            ));
        }
        if !warnings.is_empty() {
            tracing::warn!(
                request_id = %request_id,
                destination = %request.destination(),
                warnings = ?warnings,
                "Trip plan violates itinerary invariants"
            );
        }

        tracing::info!(
            request_id = %request_id,
            destination = %request.destination(),
            days = plan.days.len(),
            places = plan.place_count(),
            parse_stage = parse_stage.as_str(),
            "Trip plan generated"
        );

        Ok(PipelineOutcome {
            data: plan,
            warnings,
            parse_stage,
        })
    }

    /// Suggest a replacement for one place
    ///
    /// Exclusions are enforced only through the prompt. A suggestion that
    /// repeats an excluded name is logged and still returned.
    pub async fn shuffle_place(
        &self,
        request: &ShuffleRequest,
        request_id: RequestId,
    ) -> Result<PipelineOutcome<ShuffleResult>, PipelineError> {
        let operation = Operation::Shuffle;
        let prompt = prompt::build_shuffle_prompt(request);

        let result = self
            .call_and_parse(operation, &prompt, request_id)
            .await
            .and_then(|(raw, parsed)| {
                let stage = parsed.stage;
                schema::into_shuffle_result(parsed.value)
                    .map(|result| (result, stage))
                    .map_err(|e| self.log_failure(operation, request_id, &raw, e.into()))
            });

        let (suggestion, parse_stage) = self.finish(operation, result)?;

        if suggestion.repeats_any(request.excluded_names()) {
            tracing::warn!(
                request_id = %request_id,
                original = %request.place_name(),
                suggestion = %suggestion.new_place,
                "Shuffle suggestion repeats an excluded place"
            );
        }

        tracing::info!(
            request_id = %request_id,
            original = %request.place_name(),
            suggestion = %suggestion.new_place,
            parse_stage = parse_stage.as_str(),
            "Replacement place suggested"
        );

        Ok(PipelineOutcome {
            data: suggestion,
            warnings: Vec::new(),
            parse_stage,
        })
    }

    /// Free-form travel chat; the model's text is returned as-is
    pub async fn chat(
        &self,
        request: &ChatRequest,
        request_id: RequestId,
    ) -> Result<String, PipelineError> {
        let operation = Operation::Chat;
        let prompt = prompt::build_chat_prompt(request);

        let result = self
            .gateway
            .complete(&prompt, request_id)
            .await
            .map_err(|e| self.log_failure(operation, request_id, "", e.into()));

        self.finish(operation, result)
    }

    /// Call the model and parse its output, returning the raw text with it
    async fn call_and_parse(
        &self,
        operation: Operation,
        prompt: &str,
        request_id: RequestId,
    ) -> Result<(String, ParsedResponse), PipelineError> {
        tracing::debug!(
            request_id = %request_id,
            operation = operation.as_str(),
            stage = PipelineStage::BuildPrompt.as_str(),
            prompt_length = prompt.len(),
            "Prompt built"
        );

        let raw = self
            .gateway
            .complete(prompt, request_id)
            .await
            .map_err(|e| self.log_failure(operation, request_id, "", e.into()))?;

        match parse_model_output(&raw) {
            Ok(parsed) => {
                self.metrics.record_parse_stage(parsed.stage);
                if parsed.stage.was_repaired() {
                    tracing::info!(
                        request_id = %request_id,
                        operation = operation.as_str(),
                        parse_stage = parsed.stage.as_str(),
                        "Model output required repair"
                    );
                }
                Ok((raw, parsed))
            }
            Err(e) => Err(self.log_failure(operation, request_id, &raw, e.into())),
        }
    }

    /// Record the outcome metric for a finished run
    fn finish<T>(
        &self,
        operation: Operation,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(e) => e.outcome(),
        };
        self.metrics.record_pipeline(operation, outcome);
        result
    }

    fn log_failure(
        &self,
        operation: Operation,
        request_id: RequestId,
        raw: &str,
        error: PipelineError,
    ) -> PipelineError {
        match &error {
            PipelineError::Unparsable(e) => tracing::error!(
                request_id = %request_id,
                operation = operation.as_str(),
                stage = error.stage().as_str(),
                response_length = e.response_length(),
                preview = %e.preview(),
                reasons = ?e.reasons(),
                "Model output could not be parsed"
            ),
            PipelineError::Schema(e) => tracing::error!(
                request_id = %request_id,
                operation = operation.as_str(),
                stage = error.stage().as_str(),
                shape = e.shape().as_str(),
                field = %e.field(),
                preview = %preview(raw),
                error = %e,
                "Model output has the wrong shape"
            ),
            PipelineError::Provider(e) => tracing::error!(
                request_id = %request_id,
                operation = operation.as_str(),
                stage = error.stage().as_str(),
                reason = e.reason(),
                error = %e,
                "Pipeline stopped at model call"
            ),
        }
        error
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(repair::PREVIEW_CHARS).collect()
}
