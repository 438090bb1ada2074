use redsum_llm::{Content, ContentPart, Message};

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content, Content::Text("Hello, world!".to_string()));
    assert_eq!(content.to_text(), "Hello, world!");
}

#[test]
fn test_content_from_string() {
    let content: Content = "Test".into();
    assert_eq!(content.to_text(), "Test");
}

#[test]
fn test_multipart_content_to_text() {
    let content = Content::Parts(vec![
        ContentPart::Text { text: "one ".to_string() },
        ContentPart::Text { text: "two".to_string() },
    ]);
    assert_eq!(content.to_text(), "one two");
}

#[test]
fn test_message_roles() {
    assert_eq!(Message::system("You are helpful").role(), "system");
    assert_eq!(Message::human("Hello").role(), "user");
}

#[test]
fn test_message_serialization_human() {
    let msg = Message::human("Hello");
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("Hello"));
}

#[test]
fn test_message_deserialization() {
    let json = r#"{"role":"system","content":"Test"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.role(), "system");
    assert_eq!(msg.content().to_text(), "Test");
}

#[test]
fn test_unknown_role_rejected() {
    let json = r#"{"role":"assistant","content":"Test"}"#;
    assert!(serde_json::from_str::<Message>(json).is_err());
}
