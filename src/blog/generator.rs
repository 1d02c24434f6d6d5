//! Runs the topic and YouTube pipelines against an [`LlmClient`].

use super::{route_decision, target_language, Blog, BlogState, Route, Usecase};
use crate::config::{Prompts, Settings};
use crate::error::{BlogError, Result};
use crate::llm::{invoke_structured, response_text, ChatMessage, LlmClient, OpenAiLlm};
use crate::transcript::{TranscriptExtractor, TranscriptResult};
use crate::video::VideoReference;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Characters of transcript shown to the model when asking for a title.
const TITLE_TRANSCRIPT_CHARS: usize = 2000;

/// Blog generator. Cheap to share; holds no per-request state.
pub struct BlogGenerator {
    llm: Arc<dyn LlmClient>,
    extractor: Arc<TranscriptExtractor>,
    prompts: Prompts,
}

impl BlogGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, extractor: Arc<TranscriptExtractor>) -> Self {
        Self {
            llm,
            extractor,
            prompts: Prompts::default(),
        }
    }

    /// Build the production pipeline: Groq-compatible model, default strategy chain
    /// and prompts from the configured directory.
    pub fn from_settings(settings: &Settings, api_key: &str) -> Result<Self> {
        let llm = OpenAiLlm::new(&settings.llm, api_key)?;
        let extractor = TranscriptExtractor::from_settings(&settings.transcript)?;
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::new(Arc::new(llm), Arc::new(extractor)).with_prompts(prompts))
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn extractor(&self) -> &TranscriptExtractor {
        &self.extractor
    }

    /// Run the pipeline for `usecase`; `input` is the topic or the video URL.
    pub async fn generate(
        &self,
        usecase: Usecase,
        input: &str,
        language: Option<&str>,
    ) -> Result<BlogState> {
        info!(%usecase, "Generating blog");
        match usecase {
            Usecase::Topic => self.generate_from_topic(input, language).await,
            Usecase::Youtube => self.generate_from_youtube(input, language).await,
        }
    }

    /// Topic pipeline: title, then content, then optional translation.
    #[instrument(skip(self))]
    pub async fn generate_from_topic(&self, topic: &str, language: Option<&str>) -> Result<BlogState> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(BlogError::InvalidInput("Topic is required".to_string()));
        }
        let language = target_language(language);

        let vars = HashMap::from([("topic".to_string(), topic.to_string())]);

        info!("Generating title");
        let title = self.ask(&self.prompts.blog.topic_title, &vars).await?;
        let title = clean_title(&title);

        info!("Generating content");
        let content = self.ask(&self.prompts.blog.topic_content, &vars).await?;

        let blog = self.finish(Blog { title, content }, &language).await?;

        Ok(BlogState {
            topic: Some(topic.to_string()),
            current_language: language,
            blog: Some(blog),
            ..Default::default()
        })
    }

    /// YouTube pipeline: transcript, then title and content from it, then optional translation.
    #[instrument(skip(self))]
    pub async fn generate_from_youtube(&self, url: &str, language: Option<&str>) -> Result<BlogState> {
        let video = VideoReference::parse(url)?;
        let language = target_language(language);

        let transcript = self.transcript(&video).await?;
        let blog = self.blog_from_transcript(&transcript.text).await?;
        let blog = self.finish(blog, &language).await?;

        Ok(BlogState {
            youtube_url: Some(url.trim().to_string()),
            current_language: language,
            blog: Some(blog),
            transcript: Some(transcript.text),
            video_id: Some(transcript.video_id.to_string()),
            ..Default::default()
        })
    }

    /// Run the extractor alone.
    pub async fn transcript(&self, video: &VideoReference) -> Result<TranscriptResult> {
        let result = self.extractor.extract(video).await?;
        info!(
            "Transcript of {} characters via {}",
            result.text.len(),
            result.source_strategy
        );
        Ok(result)
    }

    /// Write a title and post from transcript text.
    pub async fn blog_from_transcript(&self, transcript: &str) -> Result<Blog> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(BlogError::InvalidInput("Transcript is required".to_string()));
        }

        let excerpt: String = transcript.chars().take(TITLE_TRANSCRIPT_CHARS).collect();
        let title_vars = HashMap::from([("transcript".to_string(), excerpt)]);
        info!("Generating title from transcript");
        let title = self.ask(&self.prompts.blog.transcript_title, &title_vars).await?;

        let content_vars = HashMap::from([("transcript".to_string(), transcript.to_string())]);
        info!("Generating content from transcript");
        let content = self.ask(&self.prompts.blog.transcript_content, &content_vars).await?;

        Ok(Blog {
            title: clean_title(&title),
            content,
        })
    }

    async fn finish(&self, blog: Blog, language: &str) -> Result<Blog> {
        match route_decision(language) {
            Route::End => Ok(blog),
            Route::Translate => self.translate(blog, language).await,
        }
    }

    /// Translate title and content, keeping the original title if the model
    /// cannot produce structured output.
    #[instrument(skip(self, blog))]
    pub async fn translate(&self, blog: Blog, language: &str) -> Result<Blog> {
        let vars = HashMap::from([
            ("language".to_string(), language.to_string()),
            ("title".to_string(), blog.title.clone()),
            ("content".to_string(), blog.content.clone()),
        ]);
        let prompt = self.prompts.render_with_custom(&self.prompts.blog.translation, &vars);
        let messages = [ChatMessage::user(prompt)];

        match invoke_structured::<Blog>(self.llm.as_ref(), &messages).await {
            Ok(translated) => Ok(Blog {
                title: clean_title(&translated.title),
                content: translated.content,
            }),
            Err(e) => {
                warn!("Structured translation failed, retrying as plain text: {}", e);
                let response = self.llm.invoke(&messages).await?;
                Ok(Blog {
                    title: blog.title,
                    content: response_text(&response)?,
                })
            }
        }
    }

    async fn ask(&self, template: &str, vars: &HashMap<String, String>) -> Result<String> {
        let prompt = self.prompts.render_with_custom(template, vars);
        let response = self.llm.invoke(&[ChatMessage::user(prompt)]).await?;
        debug!("Answered by {}", response.model);
        response_text(&response)
    }
}

/// Models like to return titles as Markdown headings.
fn clean_title(raw: &str) -> String {
    raw.trim().trim_matches('#').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::llm::ResponseMode;
    use crate::transcript::{StrategyKind, TranscriptStrategy};
    use async_trait::async_trait;

    struct StaticStrategy(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl TranscriptStrategy for StaticStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::CaptionsApi
        }

        async fn fetch(&self, _video: &VideoReference) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(BlogError::upstream)
        }
    }

    fn generator(llm: Arc<ScriptedLlm>, transcript: std::result::Result<&'static str, &'static str>) -> BlogGenerator {
        let extractor = TranscriptExtractor::new(vec![Arc::new(StaticStrategy(transcript))])
            .with_retry(crate::transcript::RetryPolicy::none());
        BlogGenerator::new(llm, Arc::new(extractor))
    }

    fn prompt_of(llm: &ScriptedLlm, index: usize) -> String {
        llm.requests.lock().unwrap()[index].0[0].content.clone()
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("## Rust in 2025 ##\n"), "Rust in 2025");
        assert_eq!(clean_title("  Plain  "), "Plain");
    }

    #[tokio::test]
    async fn test_topic_in_english_skips_translation() {
        let llm = Arc::new(ScriptedLlm::replying(&["# Fearless Concurrency", "Body text"]));
        let state = generator(llm.clone(), Ok("unused"))
            .generate_from_topic("Rust concurrency", None)
            .await
            .unwrap();

        assert_eq!(state.topic.as_deref(), Some("Rust concurrency"));
        assert_eq!(state.current_language, "english");
        assert_eq!(
            state.blog,
            Some(Blog {
                title: "Fearless Concurrency".to_string(),
                content: "Body text".to_string()
            })
        );
        assert_eq!(llm.calls(), 2);
        assert!(prompt_of(&llm, 0).contains("Rust concurrency"));
    }

    #[tokio::test]
    async fn test_topic_with_translation() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "Title",
            "Content",
            r#"{"title": "Titre", "content": "Contenu"}"#,
        ]));
        let state = generator(llm.clone(), Ok("unused"))
            .generate_from_topic("Rust", Some("french"))
            .await
            .unwrap();

        let blog = state.blog.unwrap();
        assert_eq!(blog.title, "Titre");
        assert_eq!(blog.content, "Contenu");
        assert_eq!(
            llm.modes(),
            vec![ResponseMode::Text, ResponseMode::Text, ResponseMode::Json]
        );
        let translation_prompt = prompt_of(&llm, 2);
        assert!(translation_prompt.contains("french"));
        assert!(translation_prompt.contains("Content"));
    }

    #[tokio::test]
    async fn test_translation_falls_back_to_plain_text() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "Title",
            "Content",
            "not json at all",
            "Contenu traduit",
        ]));
        let state = generator(llm.clone(), Ok("unused"))
            .generate_from_topic("Rust", Some("french"))
            .await
            .unwrap();

        let blog = state.blog.unwrap();
        assert_eq!(blog.title, "Title");
        assert_eq!(blog.content, "Contenu traduit");
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn test_blank_topic_is_rejected() {
        let llm = Arc::new(ScriptedLlm::default());
        let err = generator(llm.clone(), Ok("unused"))
            .generate_from_topic("   ", None)
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Topic is required");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(BlogError::Llm("boom".to_string()))]));
        let err = generator(llm, Ok("unused"))
            .generate_from_topic("Rust", None)
            .await
            .unwrap_err();
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_youtube_pipeline() {
        let llm = Arc::new(ScriptedLlm::replying(&["# Video Title", "Video post"]));
        let state = generator(llm.clone(), Ok("Hi there"))
            .generate_from_youtube("https://www.youtube.com/watch?v=abc123XYZ&t=30", Some("English"))
            .await
            .unwrap();

        assert_eq!(state.video_id.as_deref(), Some("abc123XYZ"));
        assert_eq!(state.transcript.as_deref(), Some("Hi there"));
        assert_eq!(state.current_language, "english");
        assert_eq!(state.blog.unwrap().title, "Video Title");
        assert!(prompt_of(&llm, 1).contains("Hi there"));
    }

    #[tokio::test]
    async fn test_title_sees_only_transcript_excerpt() {
        let long = "x".repeat(5000);
        let llm = Arc::new(ScriptedLlm::replying(&["T", "C"]));
        generator(llm.clone(), Ok("unused"))
            .blog_from_transcript(&long)
            .await
            .unwrap();

        let title_prompt = prompt_of(&llm, 0);
        let content_prompt = prompt_of(&llm, 1);
        assert!(title_prompt.contains(&"x".repeat(2000)));
        assert!(!title_prompt.contains(&"x".repeat(2001)));
        assert!(content_prompt.contains(&long));
    }

    #[tokio::test]
    async fn test_empty_transcript_is_rejected() {
        let llm = Arc::new(ScriptedLlm::default());
        let err = generator(llm, Ok("unused"))
            .blog_from_transcript("  ")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Transcript is required");
    }

    #[tokio::test]
    async fn test_youtube_invalid_url_never_calls_llm() {
        let llm = Arc::new(ScriptedLlm::default());
        let err = generator(llm.clone(), Ok("unused"))
            .generate_from_youtube("https://vimeo.com/123", None)
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Invalid YouTube URL format");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_youtube_extraction_failure_is_server_error() {
        let llm = Arc::new(ScriptedLlm::default());
        let err = generator(llm.clone(), Err("No transcript available: captions are disabled"))
            .generate_from_youtube("https://youtu.be/abc123XYZ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, BlogError::ExtractionFailed { .. }));
        assert!(!err.is_client_error());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_dispatches_on_usecase() {
        let llm = Arc::new(ScriptedLlm::replying(&["T", "C"]));
        let state = generator(llm, Ok("Hi there"))
            .generate("youtube".parse().unwrap(), "https://youtu.be/abc123XYZ", None)
            .await
            .unwrap();
        assert_eq!(state.video_id.as_deref(), Some("abc123XYZ"));
    }
}
