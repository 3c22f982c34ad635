use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;

/// Generation, prompt and tool settings of a model-configured app.
///
/// Every field is an opaque (usually JSON-encoded) text value owned by the
/// app editor; this service only copies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSettings {
    pub provider: Option<String>,
    pub model_id: Option<String>,
    pub configs: Option<String>,
    pub opening_statement: Option<String>,
    pub suggested_questions: Option<String>,
    pub suggested_questions_after_answer: Option<String>,
    pub more_like_this: Option<String>,
    pub model: Option<String>,
    pub user_input_form: Option<String>,
    pub pre_prompt: Option<String>,
    pub agent_mode: Option<String>,
    pub speech_to_text: Option<String>,
    pub sensitive_word_avoidance: Option<String>,
    pub retriever_resource: Option<String>,
    pub dataset_query_variable: Option<String>,
    pub prompt_type: Option<String>,
    pub chat_prompt_config: Option<String>,
    pub completion_prompt_config: Option<String>,
    pub dataset_configs: Option<String>,
    pub external_data_tools: Option<String>,
    pub file_upload: Option<String>,
    pub text_to_speech: Option<String>,
}

impl ModelSettings {
    /// Column names in `app_model_configs`, in the order of [`Self::values`].
    pub const COLUMNS: [&'static str; 22] = [
        "provider",
        "model_id",
        "configs",
        "opening_statement",
        "suggested_questions",
        "suggested_questions_after_answer",
        "more_like_this",
        "model",
        "user_input_form",
        "pre_prompt",
        "agent_mode",
        "speech_to_text",
        "sensitive_word_avoidance",
        "retriever_resource",
        "dataset_query_variable",
        "prompt_type",
        "chat_prompt_config",
        "completion_prompt_config",
        "dataset_configs",
        "external_data_tools",
        "file_upload",
        "text_to_speech",
    ];

    pub fn values(&self) -> [Option<&str>; 22] {
        [
            self.provider.as_deref(),
            self.model_id.as_deref(),
            self.configs.as_deref(),
            self.opening_statement.as_deref(),
            self.suggested_questions.as_deref(),
            self.suggested_questions_after_answer.as_deref(),
            self.more_like_this.as_deref(),
            self.model.as_deref(),
            self.user_input_form.as_deref(),
            self.pre_prompt.as_deref(),
            self.agent_mode.as_deref(),
            self.speech_to_text.as_deref(),
            self.sensitive_word_avoidance.as_deref(),
            self.retriever_resource.as_deref(),
            self.dataset_query_variable.as_deref(),
            self.prompt_type.as_deref(),
            self.chat_prompt_config.as_deref(),
            self.completion_prompt_config.as_deref(),
            self.dataset_configs.as_deref(),
            self.external_data_tools.as_deref(),
            self.file_upload.as_deref(),
            self.text_to_speech.as_deref(),
        ]
    }

    pub fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            provider: row.try_get("provider")?,
            model_id: row.try_get("model_id")?,
            configs: row.try_get("configs")?,
            opening_statement: row.try_get("opening_statement")?,
            suggested_questions: row.try_get("suggested_questions")?,
            suggested_questions_after_answer: row.try_get("suggested_questions_after_answer")?,
            more_like_this: row.try_get("more_like_this")?,
            model: row.try_get("model")?,
            user_input_form: row.try_get("user_input_form")?,
            pre_prompt: row.try_get("pre_prompt")?,
            agent_mode: row.try_get("agent_mode")?,
            speech_to_text: row.try_get("speech_to_text")?,
            sensitive_word_avoidance: row.try_get("sensitive_word_avoidance")?,
            retriever_resource: row.try_get("retriever_resource")?,
            dataset_query_variable: row.try_get("dataset_query_variable")?,
            prompt_type: row.try_get("prompt_type")?,
            chat_prompt_config: row.try_get("chat_prompt_config")?,
            completion_prompt_config: row.try_get("completion_prompt_config")?,
            dataset_configs: row.try_get("dataset_configs")?,
            external_data_tools: row.try_get("external_data_tools")?,
            file_upload: row.try_get("file_upload")?,
            text_to_speech: row.try_get("text_to_speech")?,
        })
    }
}

/// A row in the `app_model_configs` table. The newest row per app (by
/// `created_at`) is the app's effective configuration.
#[derive(Debug, Clone)]
pub struct ModelConfigRecord {
    pub id: String,
    pub app_id: String,
    pub settings: ModelSettings,
    pub created_at: DateTime<Utc>,
}
