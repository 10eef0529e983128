//! Prompt templates and the fixed system instructions that go with them.

use crate::services::llm_provider::ChatRequest;

pub const ASSISTANT_SYSTEM: &str = "You are a helpful assistant.";
pub const PDF_ASSISTANT_SYSTEM: &str =
    "You are a helpful assistant that answers questions based on a PDF.";
pub const HR_SYSTEM: &str = "You are a helpful AI HR expert.";

#[derive(Debug, Clone, Copy)]
pub struct PromptProfile {
    pub system: &'static str,
    pub temperature: f64,
}

impl PromptProfile {
    pub fn request(self, prompt: String, model: Option<String>) -> ChatRequest {
        ChatRequest {
            system: self.system.to_string(),
            prompt,
            temperature: self.temperature,
            model,
        }
    }
}

pub const RETRIEVAL_QA: PromptProfile = PromptProfile {
    system: ASSISTANT_SYSTEM,
    temperature: 0.3,
};

pub const EXCERPT_QA: PromptProfile = PromptProfile {
    system: PDF_ASSISTANT_SYSTEM,
    temperature: 0.7,
};

pub const STUDY_PLAN: PromptProfile = PromptProfile {
    system: ASSISTANT_SYSTEM,
    temperature: 0.3,
};

pub const QUIZ: PromptProfile = PromptProfile {
    system: ASSISTANT_SYSTEM,
    temperature: 0.3,
};

pub const HR_FEEDBACK: PromptProfile = PromptProfile {
    system: HR_SYSTEM,
    temperature: 0.7,
};

pub fn retrieval_qa_prompt(chunks: &[&str], question: &str) -> String {
    let context = chunks.join(" ");
    format!("Context:\n{context}\n\nQuestion:\n{question}\n\nAnswer:")
}

pub fn excerpt_qa_prompt(excerpt: &str, question: &str) -> String {
    format!(
        "You are an AI assistant. A user has uploaded a PDF document. \
         Use the content below to answer the question.\n\n\
         PDF Content:\n{excerpt}\n\nQuestion:\n{question}\n\nAnswer:"
    )
}

pub fn study_plan_prompt(excerpt: &str, available_time: &str) -> String {
    format!(
        "Create a detailed study plan based on this content:\n\n{excerpt}\n\n\
         Time available: {available_time}\n\nStudy Plan:"
    )
}

pub fn quiz_prompt(count: usize, excerpt: &str) -> String {
    format!(
        "Generate {count} multiple-choice quiz questions based on this content:\n\n{excerpt}\n\n\
         Respond with only a JSON array and no other text. Each element must be an object of the form \
         {{\"question\": \"...\", \"options\": {{\"A\": \"...\", \"B\": \"...\", \"C\": \"...\", \"D\": \"...\"}}, \"answer\": \"A\"}} \
         where \"answer\" is the label of the correct option."
    )
}

pub fn hr_feedback_prompt(question: &str, answer: &str) -> String {
    format!(
        "You are simulating a mock HR interview. The candidate has answered the question.\n\
         Please analyze the answer and provide constructive feedback, including suggestions for improvement.\n\n\
         Interview Question:\n\"{question}\"\n\n\
         Candidate's Answer:\n\"{answer}\"\n"
    )
}
