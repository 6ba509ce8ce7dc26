use std::sync::Arc;

use novelist_core::{
    extract_json, strip_code_fence, ContentValidator, GenerationBackend, GenerationRequest,
    NovelistError, ValidationResult, Value, ValueMap,
};

use crate::prompts::validation_prompt;

const UNPARSED_ISSUE: &str = "内容存在逻辑问题";
const UNPARSED_SUGGESTION: &str = "请检查内容逻辑一致性";

/// Asks the generation backend to act as a continuity editor.
///
/// A structured answer is normalized with [`ValidationResult::from_value`].
/// A free-text answer fails when it mentions `false`, `冲突` (conflict) or
/// `问题` (problem) and passes otherwise. Backend errors are returned as
/// [`NovelistError::Validation`]; the validate stage decides what to do with
/// them.
#[derive(Clone)]
pub struct LlmLogicValidator {
    backend: Arc<dyn GenerationBackend>,
    temperature: f32,
}

impl LlmLogicValidator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn interpret(answer: &str) -> ValidationResult {
        match extract_json(answer) {
            Ok(value @ Value::Object(_)) => ValidationResult::from_value(&value),
            Ok(_) | Err(_) => {
                let cleaned = strip_code_fence(answer);
                tracing::warn!(answer = %cleaned, "validator answer is not a JSON object, using keyword heuristic");
                let lowered = cleaned.to_lowercase();
                if lowered.contains("false") || cleaned.contains("冲突") || cleaned.contains("问题") {
                    ValidationResult {
                        passed: false,
                        issues: vec![UNPARSED_ISSUE.to_string()],
                        suggestions: vec![UNPARSED_SUGGESTION.to_string()],
                    }
                } else {
                    ValidationResult::pass()
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ContentValidator for LlmLogicValidator {
    async fn validate(
        &self,
        content: &str,
        core_knowledge: &[String],
        locked_settings: &ValueMap,
    ) -> Result<ValidationResult, NovelistError> {
        let prompt = validation_prompt(content, core_knowledge, locked_settings)?;
        let answer = self
            .backend
            .generate(GenerationRequest::new(prompt).with_temperature(self.temperature))
            .await
            .map_err(|err| NovelistError::Validation(err.to_string()))?;
        Ok(Self::interpret(&answer))
    }
}
