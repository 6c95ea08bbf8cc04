use super::*;

#[test]
fn chat_request_deserializes_from_the_widget_payload() {
    let request: ChatRequest =
        serde_json::from_str(r#"{"question":"Who is eligible for PM-KISAN?"}"#)
            .expect("request should parse");

    assert_eq!(request.question, "Who is eligible for PM-KISAN?");
}

#[test]
fn chat_request_rejects_a_missing_question() {
    assert!(serde_json::from_str::<ChatRequest>(r#"{}"#).is_err());
}

#[test]
fn chat_response_serializes_the_answer_field() {
    let response = ChatResponse {
        answer: "Rs. 6000 per year.".to_string(),
    };

    let json = serde_json::to_string(&response).expect("response should serialize");
    assert_eq!(json, r#"{"answer":"Rs. 6000 per year."}"#);
}

#[test]
fn fallback_messages_are_distinct() {
    let messages = [
        FALLBACK_KNOWLEDGE_BASE,
        FALLBACK_NO_CONTEXT,
        FALLBACK_GENERATION,
        PROMPT_FOR_QUESTION,
    ];
    for (i, a) in messages.iter().enumerate() {
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn chat_page_embeds_the_query_endpoint() {
    let page = include_str!("chat.html");
    assert!(page.contains("/api/chat"));
}
