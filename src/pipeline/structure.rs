//! Structurer: résumé text in, [`ResumeRecord`] out.
//!
//! One prompt, one model call, one parse. Every failure ends in the default
//! record plus a [`StructureError`] for the user; nothing here returns `Err`.

use crate::config::ForgeConfig;
use crate::error::{SchemaParseError, StructureError};
use crate::observer::{SessionObserver, Stage};
use crate::pipeline::clean::{clean_reply, first_json_object};
use crate::pipeline::llm::CompletionModel;
use crate::prompts::build_prompt;
use crate::record::{kind_of, ResumeRecord};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What one structuring run produced.
#[derive(Debug, Clone, Default)]
pub struct StructureOutcome {
    /// The parsed record, or the default record on failure.
    pub record: ResumeRecord,
    /// The reply exactly as the model sent it, when there was one.
    pub raw_reply: Option<String>,
    pub error: Option<StructureError>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

impl StructureOutcome {
    /// Default record plus the error that caused the fallback.
    pub fn fallback(error: StructureError, raw_reply: Option<String>) -> Self {
        Self {
            record: ResumeRecord::default(),
            raw_reply,
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Turns text into a record through a [`CompletionModel`].
pub struct Structurer {
    model: Arc<dyn CompletionModel>,
    prompt_template: Option<String>,
    skip_empty_input: bool,
}

impl Structurer {
    pub fn new(model: Arc<dyn CompletionModel>, config: &ForgeConfig) -> Self {
        Self {
            model,
            prompt_template: config.prompt_template.clone(),
            skip_empty_input: config.skip_empty_input,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Run the model on `text` and parse its reply.
    ///
    /// The raw reply reaches `observer.on_model_reply` whenever the model
    /// answered, whether or not it parses.
    pub async fn structure(&self, text: &str, observer: &dyn SessionObserver) -> StructureOutcome {
        observer.on_stage_start(Stage::Structure);

        if self.skip_empty_input && text.trim().is_empty() {
            info!("No résumé text; skipping the model call");
            return StructureOutcome::default();
        }

        let start = Instant::now();
        let prompt = build_prompt(self.prompt_template.as_deref(), text);
        debug!(
            "Prompting '{}' with {} chars",
            self.model.model_name(),
            prompt.len()
        );

        let completion = match self.model.complete(&prompt).await {
            Ok(c) => c,
            Err(e) => {
                warn!("Structuring fell back to the default record: {}", e);
                let error = StructureError::from(e);
                observer.on_structuring_error(&error, None);
                let mut outcome = StructureOutcome::fallback(error, None);
                outcome.duration_ms = start.elapsed().as_millis() as u64;
                return outcome;
            }
        };

        observer.on_model_reply(&completion.text);

        let mut outcome = match parse_reply(&completion.text) {
            Ok(record) => {
                info!(
                    "Structured résumé: {} skills, {} education, {} experience, {} certifications",
                    record.skills.len(),
                    record.education.len(),
                    record.experience.len(),
                    record.certifications.len()
                );
                StructureOutcome {
                    record,
                    raw_reply: Some(completion.text),
                    ..Default::default()
                }
            }
            Err(e) => {
                warn!("Model reply could not be parsed: {}", e);
                let error = StructureError::from(e);
                observer.on_structuring_error(&error, Some(&completion.text));
                StructureOutcome::fallback(error, Some(completion.text))
            }
        };

        outcome.prompt_tokens = completion.prompt_tokens;
        outcome.completion_tokens = completion.completion_tokens;
        outcome.duration_ms = start.elapsed().as_millis() as u64;
        outcome
    }
}

/// Parse a raw model reply into a record.
///
/// The reply is cleaned first. If the cleaned text is not JSON, the first
/// balanced object inside it is tried before giving up.
pub fn parse_reply(raw: &str) -> Result<ResumeRecord, SchemaParseError> {
    let cleaned = clean_reply(raw);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(v) => v,
        Err(err) => {
            let recovered = first_json_object(&cleaned)
                .and_then(|candidate| serde_json::from_str::<Value>(candidate).ok());
            match recovered {
                Some(v) => {
                    debug!("Recovered a JSON object embedded in the reply");
                    v
                }
                None => {
                    return Err(SchemaParseError::NotJson {
                        detail: err.to_string(),
                        line: err.line(),
                        column: err.column(),
                    })
                }
            }
        }
    };

    if !value.is_object() {
        return Err(SchemaParseError::NotAnObject {
            found: kind_of(&value),
        });
    }

    serde_json::from_value(value).map_err(|e| SchemaParseError::Schema {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelInvocationError;
    use crate::observer::NoopObserver;
    use crate::pipeline::llm::Completion;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned(Result<&'static str, ModelInvocationError>);

    #[async_trait]
    impl CompletionModel for Canned {
        async fn complete(&self, _prompt: &str) -> Result<Completion, ModelInvocationError> {
            self.0.clone().map(|text| Completion {
                text: text.to_string(),
                prompt_tokens: 10,
                completion_tokens: 5,
            })
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[derive(Default)]
    struct Recorder {
        replies: Mutex<Vec<String>>,
        errors: Mutex<Vec<(String, Option<String>)>>,
    }

    impl SessionObserver for Recorder {
        fn on_model_reply(&self, raw_reply: &str) {
            self.replies.lock().unwrap().push(raw_reply.to_string());
        }

        fn on_structuring_error(&self, error: &StructureError, raw_reply: Option<&str>) {
            self.errors
                .lock()
                .unwrap()
                .push((error.to_string(), raw_reply.map(String::from)));
        }
    }

    fn structurer(reply: Result<&'static str, ModelInvocationError>) -> Structurer {
        Structurer::new(Arc::new(Canned(reply)), &ForgeConfig::default())
    }

    #[test]
    fn parses_plain_object() {
        let r = parse_reply(r#"{"Name": "Jane Doe", "ContactInfo": {"Email": "jane@x.com"}}"#)
            .unwrap();
        assert_eq!(r.name, "Jane Doe");
        assert_eq!(r.contact.email, "jane@x.com");
    }

    #[test]
    fn parses_after_prefix() {
        let raw = "Here is the extracted data in valid JSON format:\n{\"Name\": \"Jane\"}";
        assert_eq!(parse_reply(raw).unwrap().name, "Jane");
    }

    #[test]
    fn parses_object_wrapped_in_prose() {
        let raw = "Sure, here you go:\n{\"Name\": \"Jane\"}\nLet me know if you need more.";
        assert_eq!(parse_reply(raw).unwrap().name, "Jane");
    }

    #[test]
    fn non_json_is_not_json() {
        let err = parse_reply("I cannot help with that.").unwrap_err();
        assert!(matches!(err, SchemaParseError::NotJson { line: 1, .. }));
    }

    #[test]
    fn array_is_not_an_object() {
        let err = parse_reply("[1, 2]").unwrap_err();
        assert_eq!(err, SchemaParseError::NotAnObject { found: "an array" });
    }

    #[test]
    fn lenient_decoding_absorbs_type_mismatches() {
        let r = parse_reply(
            r#"{"ContactInfo": {"Phone": [555, 1234]}, "Experience": {"Company": "Acme", "BulletPoints": "Shipped"}}"#,
        )
        .unwrap();
        assert_eq!(r.contact.phone, "555, 1234");
        assert_eq!(r.experience.len(), 1);
        assert_eq!(r.experience[0].bullet_points, vec!["Shipped"]);
    }

    #[tokio::test]
    async fn successful_reply_is_observed_and_parsed() {
        let obs = Recorder::default();
        let out = structurer(Ok(r#"{"Name": "Jane Doe"}"#))
            .structure("Jane Doe", &obs)
            .await;
        assert_eq!(out.record.name, "Jane Doe");
        assert!(out.error.is_none());
        assert_eq!(out.prompt_tokens, 10);
        assert_eq!(obs.replies.lock().unwrap().len(), 1);
        assert!(obs.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_and_surfaces_raw() {
        let obs = Recorder::default();
        let out = structurer(Ok("not json at all"))
            .structure("Jane Doe", &obs)
            .await;
        assert!(out.record.is_blank());
        assert!(matches!(out.error, Some(StructureError::Schema(_))));
        assert_eq!(out.raw_reply.as_deref(), Some("not json at all"));
        let errors = obs.errors.lock().unwrap();
        assert_eq!(errors[0].1.as_deref(), Some("not json at all"));
    }

    #[tokio::test]
    async fn model_failure_falls_back_without_reply() {
        let obs = Recorder::default();
        let out = structurer(Err(ModelInvocationError::Timeout { secs: 5 }))
            .structure("Jane Doe", &obs)
            .await;
        assert!(out.record.is_blank());
        assert!(out.raw_reply.is_none());
        assert!(obs.replies.lock().unwrap().is_empty());
        assert_eq!(obs.errors.lock().unwrap()[0].1, None);
    }

    #[tokio::test]
    async fn empty_text_is_still_sent_by_default() {
        let out = structurer(Ok(r#"{"Name": ""}"#))
            .structure("", &NoopObserver)
            .await;
        assert!(out.error.is_none());
        assert!(out.raw_reply.is_some());
    }

    #[tokio::test]
    async fn empty_text_can_skip_the_model() {
        let config = ForgeConfig::builder().skip_empty_input(true).build().unwrap();
        let s = Structurer::new(Arc::new(Canned(Ok("{}"))), &config);
        let out = s.structure("   ", &NoopObserver).await;
        assert!(out.raw_reply.is_none());
        assert!(out.record.is_blank());
    }
}
