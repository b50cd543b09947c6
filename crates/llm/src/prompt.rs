//! Prompt Building
//!
//! Constructs the system prompt for the agency's chat assistant and the
//! generation request for each turn.

use lead_agent_config::{LlmSettings, ServiceCatalog};
use lead_agent_core::{ChatMessage, GenerateRequest};

const DEFAULT_AGENCY_NAME: &str = "our agency";

/// Builder for the assistant's system prompt
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    agency_name: String,
    services: Vec<(String, String)>,
    extra_instructions: Vec<String>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_AGENCY_NAME)
    }
}

impl PromptBuilder {
    pub fn new(agency_name: impl Into<String>) -> Self {
        Self {
            agency_name: agency_name.into(),
            services: Vec::new(),
            extra_instructions: Vec::new(),
        }
    }

    /// List the catalog's services in the prompt
    pub fn with_services(mut self, catalog: &ServiceCatalog) -> Self {
        self.services = catalog
            .services
            .iter()
            .map(|s| (s.name.clone(), s.description.clone()))
            .collect();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.extra_instructions.push(instruction.into());
        self
    }

    pub fn build(&self) -> String {
        let mut prompt = format!(
            "You are the friendly project consultant for {}, a digital agency. \
             Help website visitors understand how we can help with their project.\n",
            self.agency_name
        );

        if !self.services.is_empty() {
            prompt.push_str("\nServices we offer:\n");
            for (name, description) in &self.services {
                if description.is_empty() {
                    prompt.push_str(&format!("- {}\n", name));
                } else {
                    prompt.push_str(&format!("- {}: {}\n", name, description));
                }
            }
        }

        prompt.push_str(
            "\nDuring the conversation, naturally learn about the visitor's project goals, \
             budget range, timeline, company and their role in the decision. \
             Ask one question at a time and keep answers short and concrete. \
             Never invent prices; give ranges only when asked. \
             When the visitor seems ready, suggest booking a free consultation.\n",
        );

        for instruction in &self.extra_instructions {
            prompt.push('\n');
            prompt.push_str(instruction);
            prompt.push('\n');
        }

        prompt
    }
}

/// Build the generation request for one turn from stored history
pub fn build_chat_request(
    system_prompt: &str,
    history: &[ChatMessage],
    settings: &LlmSettings,
) -> GenerateRequest {
    GenerateRequest::new(system_prompt)
        .with_messages(history.iter().map(ChatMessage::to_llm_message).collect())
        .with_max_tokens(settings.max_tokens as u32)
        .with_temperature(settings.temperature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lead_agent_core::{MessageRole, Role};

    #[test]
    fn test_prompt_lists_services() {
        let prompt = PromptBuilder::new("Northwind Digital")
            .with_services(&ServiceCatalog::default())
            .build();

        assert!(prompt.contains("Northwind Digital"));
        assert!(prompt.contains("- Web Development:"));
        assert!(prompt.contains("- AI Solutions:"));
        assert!(prompt.contains("Tokenomics"));
        assert!(prompt.contains("budget"));
    }

    #[test]
    fn test_extra_instructions_appended() {
        let prompt = PromptBuilder::default()
            .with_instruction("Always answer in English.")
            .build();
        assert!(prompt.ends_with("Always answer in English.\n"));
    }

    #[test]
    fn test_build_chat_request() {
        let history = vec![
            ChatMessage {
                id: "1".to_string(),
                session_id: "s".to_string(),
                role: MessageRole::User,
                content: "I need a website".to_string(),
                created_at: Utc::now(),
                metadata: None,
            },
            ChatMessage {
                id: "2".to_string(),
                session_id: "s".to_string(),
                role: MessageRole::Assistant,
                content: "Great, tell me more".to_string(),
                created_at: Utc::now(),
                metadata: None,
            },
        ];

        let request = build_chat_request("sys", &history, &LlmSettings::default());
        assert_eq!(request.system, "sys");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].role, Role::Assistant);
        assert_eq!(request.max_tokens, Some(1024));
    }
}
