use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// The outermost `{ ... }` span of a completion, tolerating code fences and chatter
/// around the JSON body.
pub fn json_object_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::json_object_span;

    #[test]
    fn strips_fences_and_prose() {
        let reply = "Sure!\n```json\n{\"platform\": null, \"items\": []}\n```";
        assert_eq!(json_object_span(reply), Some("{\"platform\": null, \"items\": []}"));
    }

    #[test]
    fn rejects_replies_without_an_object() {
        assert_eq!(json_object_span("no items found"), None);
        assert_eq!(json_object_span("} backwards {"), None);
    }
}
