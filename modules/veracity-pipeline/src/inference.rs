//! Gateway between the pipeline and the model. All structured inference goes
//! through [`infer_structured`], which owns the retry policy and the
//! distinction between transport failures and malformed model output.

use anyhow::Result;
use serde_json::Value;
use tracing::warn;

use ollama_client::{strip_code_blocks, TextGenerator};

const MAX_ATTEMPTS: usize = 3;

/// Result of a structured inference call that reached the model.
///
/// `Malformed` means the model answered but never produced output passing
/// shape validation within the attempt budget. Callers recover from it with
/// a stage-specific default; it is never an error.
#[derive(Debug, PartialEq)]
pub enum Outcome<T> {
    Valid(T),
    Malformed,
}

/// Run `prompt` through the generator until `validate` accepts the parsed
/// JSON, up to [`MAX_ATTEMPTS`] tries. Unparseable or shape-rejected replies
/// consume an attempt and are retried; a transport error on the final attempt
/// propagates as `Err`.
pub async fn infer_structured<T, F>(
    generator: &dyn TextGenerator,
    prompt: &str,
    validate: F,
) -> Result<Outcome<T>>
where
    F: Fn(&Value) -> Option<T>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let raw = match generator.generate(prompt, None).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(attempt, error = %e, "Inference transport error");
                if attempt == MAX_ATTEMPTS {
                    return Err(e);
                }
                continue;
            }
        };

        let cleaned = strip_code_blocks(&raw);
        let value: Value = match serde_json::from_str(cleaned) {
            Ok(value) => value,
            Err(e) => {
                warn!(attempt, error = %e, "Inference output is not JSON");
                continue;
            }
        };

        match validate(&value) {
            Some(parsed) => return Ok(Outcome::Valid(parsed)),
            None => {
                warn!(attempt, "Inference output failed shape validation");
                continue;
            }
        }
    }

    Ok(Outcome::Malformed)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use ollama_client::TextGenerator;

    /// Generator returning canned replies in order, repeating the last one.
    pub struct ScriptedGenerator {
        replies: Vec<Result<String, String>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        pub fn new(replies: Vec<Result<String, String>>) -> Self {
            Self {
                replies,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always_ok(reply: &str) -> Self {
            Self::new(vec![Ok(reply.to_string())])
        }

        pub fn always_err(message: &str) -> Self {
            Self::new(vec![Err(message.to_string())])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .replies
                .get(n)
                .or_else(|| self.replies.last())
                .expect("scripted generator needs at least one reply");
            match reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow!("{e}")),
            }
        }
    }
}
