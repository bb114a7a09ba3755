// ABOUTME: Inline image encoding for multimodal completion requests
// ABOUTME: Durable image URLs may not be reachable by the model, so images travel as data URLs

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Encode image bytes as a `data:<mime>;base64,...` URL
pub fn inline_data_url(bytes: &[u8], content_type: &str) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(bytes))
}
