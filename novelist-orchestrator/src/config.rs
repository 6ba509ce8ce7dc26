use serde::{Deserialize, Serialize};

use novelist_core::{NovelistError, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Declarative graph engine, falling back to the sequential driver when
    /// it is unavailable.
    #[default]
    Graph,
    Sequential,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_refinements: u32,
    pub retrieval_top_k: usize,
    pub summary_count: usize,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub execution: ExecutionMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_refinements: 2,
            retrieval_top_k: 10,
            summary_count: 3,
            default_temperature: DEFAULT_TEMPERATURE,
            default_max_tokens: DEFAULT_MAX_TOKENS,
            execution: ExecutionMode::Graph,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_refinements(mut self, max_refinements: u32) -> Self {
        self.max_refinements = max_refinements;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn validate(&self) -> Result<(), NovelistError> {
        if self.retrieval_top_k == 0 {
            return Err(NovelistError::InvalidConfig(
                "retrieval_top_k must be greater than zero".to_string(),
            ));
        }
        if !self.default_temperature.is_finite() || self.default_temperature < 0.0 {
            return Err(NovelistError::InvalidConfig(format!(
                "default_temperature must be a non-negative number, got {}",
                self.default_temperature
            )));
        }
        if self.default_max_tokens == 0 {
            return Err(NovelistError::InvalidConfig(
                "default_max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on node executions for one graph run: the four forward
    /// stages, a refine/validate pair per allowed refinement, plus one.
    pub fn graph_max_steps(&self) -> usize {
        4 + 2 * self.max_refinements as usize + 1
    }
}
