//! Event schemas and log decoding.
//!
//! Logs are decoded against a schema and exposed as named fields, so callers
//! look up `proposalId` by name rather than by position in the argument list.

use govctl_crypto::keccak256;
use govctl_types::{Address, B256, U256};

use crate::codec::{decode, decode_static};
use crate::error::AbiError;
use crate::token::{ParamType, Token};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub kind: ParamType,
    pub indexed: bool,
}

impl EventParam {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            indexed: false,
        }
    }

    pub fn indexed(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            indexed: true,
        }
    }
}

/// A (non-anonymous) event schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<EventParam>,
}

impl Event {
    pub fn new(name: impl Into<String>, inputs: Vec<EventParam>) -> Self {
        Self {
            name: name.into(),
            inputs,
        }
    }

    pub fn signature(&self) -> String {
        let params: Vec<String> = self.inputs.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// `topics[0]` of every log this event emits.
    pub fn topic(&self) -> B256 {
        keccak256(self.signature())
    }

    /// Whether a log's first topic identifies this event.
    pub fn matches(&self, topics: &[B256]) -> bool {
        topics.first() == Some(&self.topic())
    }

    /// Decode a log into named fields, in declaration order.
    ///
    /// Indexed fields of dynamic type only carry their keccak hash on-chain
    /// and are returned as 32-byte `FixedBytes`.
    pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<DecodedEvent, AbiError> {
        let first = topics.first().ok_or_else(|| AbiError::MissingTopic {
            event: self.name.clone(),
            field: "signature".to_string(),
        })?;
        if *first != self.topic() {
            return Err(AbiError::TopicMismatch {
                event: self.signature(),
                got: first.to_string(),
            });
        }

        if let Some(missing) = self.inputs.iter().filter(|p| p.indexed).nth(topics.len() - 1) {
            return Err(AbiError::MissingTopic {
                event: self.name.clone(),
                field: missing.name.clone(),
            });
        }

        let data_types: Vec<ParamType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let mut data_tokens = decode(&data_types, data)?.into_iter();
        let mut indexed_topics = topics[1..].iter();

        let mut fields = Vec::with_capacity(self.inputs.len());
        for param in &self.inputs {
            let token = if param.indexed {
                let topic = indexed_topics.next().ok_or_else(|| AbiError::MissingTopic {
                    event: self.name.clone(),
                    field: param.name.clone(),
                })?;
                if param.kind.is_dynamic() {
                    Token::FixedBytes(topic.to_vec())
                } else {
                    decode_static(&param.kind, topic.as_slice())?
                }
            } else {
                data_tokens.next().ok_or(AbiError::ArityMismatch {
                    expected: data_types.len(),
                    got: fields.len(),
                })?
            };
            fields.push((param.name.clone(), token));
        }

        Ok(DecodedEvent {
            name: self.name.clone(),
            fields,
        })
    }
}

/// A decoded log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEvent {
    pub name: String,
    pub fields: Vec<(String, Token)>,
}

impl DecodedEvent {
    pub fn field(&self, name: &str) -> Result<&Token, AbiError> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, token)| token)
            .ok_or_else(|| AbiError::NoSuchField(name.to_string()))
    }

    pub fn uint(&self, name: &str) -> Result<U256, AbiError> {
        self.field(name)?
            .as_uint()
            .ok_or_else(|| field_type(name, "uint"))
    }

    pub fn address(&self, name: &str) -> Result<Address, AbiError> {
        self.field(name)?
            .as_address()
            .ok_or_else(|| field_type(name, "address"))
    }

    pub fn string(&self, name: &str) -> Result<&str, AbiError> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| field_type(name, "string"))
    }
}

fn field_type(field: &str, expected: &str) -> AbiError {
    AbiError::FieldType {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn vote_cast() -> Event {
        Event::new(
            "VoteCast",
            vec![
                EventParam::indexed("voter", ParamType::Address),
                EventParam::new("proposalId", ParamType::Uint(256)),
                EventParam::new("support", ParamType::Uint(8)),
                EventParam::new("weight", ParamType::Uint(256)),
                EventParam::new("reason", ParamType::String),
            ],
        )
    }

    fn address_topic(address: Address) -> B256 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(address.as_slice());
        B256::from(word)
    }

    #[test]
    fn transfer_topic() {
        let transfer = Event::new(
            "Transfer",
            vec![
                EventParam::indexed("from", ParamType::Address),
                EventParam::indexed("to", ParamType::Address),
                EventParam::new("value", ParamType::Uint(256)),
            ],
        );
        assert_eq!(
            transfer.topic().to_string(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn decode_mixed_indexed_and_data_fields() {
        let voter: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        let event = vote_cast();
        let data = encode(&[
            Token::Uint(U256::from(77u64)),
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::from(500u64)),
            Token::String("I support this proposal".into()),
        ]);
        let decoded = event
            .decode_log(&[event.topic(), address_topic(voter)], &data)
            .unwrap();

        assert_eq!(decoded.name, "VoteCast");
        assert_eq!(decoded.address("voter").unwrap(), voter);
        assert_eq!(decoded.uint("proposalId").unwrap(), U256::from(77u64));
        assert_eq!(decoded.uint("weight").unwrap(), U256::from(500u64));
        assert_eq!(decoded.string("reason").unwrap(), "I support this proposal");
    }

    #[test]
    fn wrong_topic_is_rejected() {
        let event = vote_cast();
        let err = event.decode_log(&[B256::ZERO], &[]).unwrap_err();
        assert!(matches!(err, AbiError::TopicMismatch { .. }));
    }

    #[test]
    fn missing_indexed_topic() {
        let event = vote_cast();
        let err = event.decode_log(&[event.topic()], &[]).unwrap_err();
        assert!(matches!(err, AbiError::MissingTopic { .. }));
    }

    #[test]
    fn missing_topic_reported_before_data_is_read() {
        let event = vote_cast();
        // Well-formed data section, but the indexed voter topic is absent.
        let data = encode(&[
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::from(500u64)),
            Token::String("I support this proposal".into()),
        ]);
        match event.decode_log(&[event.topic()], &data) {
            Err(AbiError::MissingTopic { field, .. }) => assert_eq!(field, "voter"),
            other => panic!("expected MissingTopic, got {other:?}"),
        }
    }

    #[test]
    fn unknown_field_lookup() {
        let decoded = DecodedEvent {
            name: "ProposalExecuted".into(),
            fields: vec![("proposalId".into(), Token::Uint(U256::from(1u64)))],
        };
        assert_eq!(
            decoded.uint("id").unwrap_err(),
            AbiError::NoSuchField("id".into())
        );
        assert!(matches!(
            decoded.address("proposalId").unwrap_err(),
            AbiError::FieldType { .. }
        ));
    }
}
