//! Prompt templates for blogsmith.
//!
//! Prompts can be customized by placing a `blog.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub blog: BlogPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the blog generation pipeline.
///
/// Available variables: `{{topic}}`, `{{transcript}}`, `{{language}}`,
/// `{{title}}` and `{{content}}`, depending on the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPrompts {
    pub topic_title: String,
    pub topic_content: String,
    pub transcript_title: String,
    pub transcript_content: String,
    pub translation: String,
}

impl Default for BlogPrompts {
    fn default() -> Self {
        Self {
            topic_title: r#"You are an expert blog content writer. Use Markdown formatting. Generate a blog title for {{topic}}. This title should be creative and SEO friendly.
Return only the title, nothing else."#
                .to_string(),

            topic_content: r#"You are an expert blog writer. Use Markdown formatting.
Generate detailed blog content with a detailed breakdown for {{topic}}."#
                .to_string(),

            transcript_title: r#"You are an expert blog content writer. Use Markdown formatting.
Based on the following YouTube video transcript, generate a creative and SEO-friendly blog title.

TRANSCRIPT:
{{transcript}}

Generate only the title, nothing else."#
                .to_string(),

            transcript_content: r#"You are an expert blog writer. Use Markdown formatting.
Based on the following YouTube video transcript, generate a detailed, well-structured blog post.
- Create engaging content with proper headings, subheadings, and formatting
- Summarize key points from the transcript
- Make it readable and informative
- Use Markdown formatting

TRANSCRIPT:
{{transcript}}"#
                .to_string(),

            translation: r#"Translate the following blog title and content into {{language}}.
- Maintain the original tone, style, and formatting.
- Adapt cultural references and idioms to be appropriate for {{language}}.
- Keep the Markdown formatting intact.

BLOG TITLE:
{{title}}

ORIGINAL CONTENT:
{{content}}

Return both the translated title and content maintaining the same structure.
Respond with a JSON object with the keys "title" and "content"."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let blog_path = custom_path.join("blog.toml");
            if blog_path.exists() {
                let content = std::fs::read_to_string(&blog_path)?;
                prompts.blog = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
