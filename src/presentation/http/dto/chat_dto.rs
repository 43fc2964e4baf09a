use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChatRequestDto {
    pub message: String,
    pub conversation_id: Option<String>,
}
