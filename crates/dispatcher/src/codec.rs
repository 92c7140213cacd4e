//! Event payload encoding

use bytes::Bytes;
use contracts::{ContractError, PayloadFormat, QueryEvent};

/// Encode one event for the wire
pub fn encode_event(event: &QueryEvent, format: PayloadFormat) -> Result<Bytes, ContractError> {
    let data = match format {
        PayloadFormat::Json => {
            serde_json::to_vec(event).map_err(|e| ContractError::encode(format!("json error: {e}")))?
        }
        PayloadFormat::Bincode => bincode::serialize(event)
            .map_err(|e| ContractError::encode(format!("bincode error: {e}")))?,
    };
    Ok(Bytes::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_factory::EventFactory;

    #[test]
    fn json_payload_is_an_event_object() {
        let event = EventFactory::seeded(1).generate(1, false, false).next().unwrap();
        let payload = encode_event(&event, PayloadFormat::Json).unwrap();

        let decoded: QueryEvent = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn bincode_payload_is_smaller_than_json() {
        let event = EventFactory::seeded(2).generate(1, true, false).next().unwrap();
        let json = encode_event(&event, PayloadFormat::Json).unwrap();
        let binary = encode_event(&event, PayloadFormat::Bincode).unwrap();
        assert!(!binary.is_empty());
        assert!(binary.len() < json.len());
    }
}
