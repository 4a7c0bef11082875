//! Dummy provider — answers deterministically without any network call.
//! Used for local development and for testing the full request round-trip
//! without a real API key.

use super::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    /// When set, `synthesize` fails — exercises the partial-success paths.
    pub speech_fails: bool,
}

impl DummyProvider {
    pub async fn answer(&self, question: &str) -> Result<String, ProviderError> {
        Ok(format!("You asked: \"{question}\". (The server is running!)"))
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        if self.speech_fails {
            return Err(ProviderError::Request("dummy speech failure".into()));
        }
        Ok(format!("[audio] {text}").into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answer_echoes_question() {
        let p = DummyProvider::default();
        let a = p.answer("What is tort law?").await.unwrap();
        assert!(a.contains("What is tort law?"));
    }

    #[tokio::test]
    async fn synthesize_returns_marked_bytes() {
        let p = DummyProvider::default();
        let audio = p.synthesize("hello").await.unwrap();
        assert_eq!(audio, b"[audio] hello");
    }

    #[tokio::test]
    async fn synthesize_can_be_forced_to_fail() {
        let p = DummyProvider { speech_fails: true };
        assert!(p.synthesize("hello").await.is_err());
    }
}
