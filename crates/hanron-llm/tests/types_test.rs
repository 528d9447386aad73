use hanron_llm::Message;

#[test]
fn test_message_system() {
    let msg = Message::system("You are a debate partner");
    assert_eq!(msg.role(), "system");
    assert!(msg.is_system());
}

#[test]
fn test_message_human() {
    let msg = Message::human("Cats are better than dogs.");
    assert_eq!(msg.role(), "user");
    assert_eq!(msg.content(), "Cats are better than dogs.");
}

#[test]
fn test_message_ai() {
    let msg = Message::ai("Dogs have been bred for cooperation.");
    assert_eq!(msg.role(), "assistant");
    assert!(!msg.is_system());
}

#[test]
fn test_message_serialization_human() {
    let msg = Message::human("Hello");
    let json = serde_json::to_string(&msg).unwrap();
    assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
}

#[test]
fn test_message_serialization_ai() {
    let msg = Message::ai("Response");
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"role\":\"assistant\""));
    assert!(!json.contains("name"));
}

#[test]
fn test_message_deserialization() {
    let json = r#"{"role":"system","content":"Stay on topic"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg, Message::system("Stay on topic"));
}
