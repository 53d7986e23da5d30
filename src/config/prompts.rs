//! Prompt templates for Tenki.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a friendly weather assistant. Today is {{today}}.

You have tools to look up places and weather:
- Use 'getLocation' to turn a place name into coordinates
- Use 'getForecast' with latitude and longitude to get the weekly forecast
- Use 'getCurrentWeather', when available, for the conditions right now

Guidelines:
- Look up the location first unless the user already gave coordinates
- If a location lookup returns no results, ask the user to clarify the place
- If a tool fails, say so briefly instead of guessing numbers
- Answer in the language the user wrote in
- Keep answers short and mention the place you looked up"#
                .to_string(),
        }
    }
}

/// Fixed texts shown by the chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// Greeting seeded into every new transcript.
    pub greeting: String,
    /// Shown when a turn fails.
    pub apology: String,
    /// Shown when a message arrives before the agent is ready.
    pub not_ready: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            greeting: "Hello! Ask me anything about the weather.".to_string(),
            apology: "Sorry, something went wrong while answering. Please try again.".to_string(),
            not_ready: "The assistant is still starting up. Please wait a moment and try again."
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
            let custom_path = super::Settings::expand_path(dir);

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
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

    /// Render a prompt template with built-in, custom config and provided variables.
    /// Provided variables take precedence over custom config variables, which
    /// take precedence over built-ins.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = builtin_variables();
        merged.extend(self.variables.clone());
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The agent system prompt with all variables filled in.
    pub fn system_prompt(&self) -> String {
        self.render_with_custom(&self.agent.system, &HashMap::new())
    }
}

fn builtin_variables() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert(
        "today".to_string(),
        chrono::Local::now().format("%A, %Y-%m-%d").to_string(),
    );
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.agent.system.contains("getForecast"));
        assert!(!prompts.chat.greeting.is_empty());
        assert!(!prompts.chat.apology.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_system_prompt_fills_today() {
        let prompts = Prompts::default();
        let rendered = prompts.system_prompt();
        assert!(!rendered.contains("{{today}}"));
    }

    #[test]
    fn test_custom_variables_override_builtins() {
        let mut vars = HashMap::new();
        vars.insert("today".to_string(), "Monday".to_string());
        let mut prompts = Prompts::load(None, Some(&vars)).unwrap();
        prompts.agent.system = "Today is {{today}}.".to_string();
        assert_eq!(prompts.system_prompt(), "Today is Monday.");
    }

    #[test]
    fn test_load_custom_chat_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("chat.toml"),
            "greeting = \"こんにちは！\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.chat.greeting, "こんにちは！");
        assert_eq!(prompts.chat.apology, ChatPrompts::default().apology);
    }
}
