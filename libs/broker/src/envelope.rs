use serde::Deserialize;

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Message")]
    message: String,
}

/// Returns the inner `Message` of a notification envelope, or the payload
/// unchanged when it is not one.
pub fn unwrap_envelope(payload: Vec<u8>) -> Vec<u8> {
    match serde_json::from_slice::<Envelope>(&payload) {
        Ok(envelope) => envelope.message.into_bytes(),
        Err(_) => payload,
    }
}
