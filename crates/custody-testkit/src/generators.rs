//! Proptest generators for property-based testing.

use proptest::prelude::*;

use custody_core::{verify, Keypair};

/// Generate a keypair from a random secret scalar.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_filter_map("secret out of range", |secret| {
        Keypair::from_secret(&secret).ok()
    })
}

/// Generate an identity name.
pub fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,15}".prop_map(String::from)
}

/// Generate a text message of at most `max_len` characters.
pub fn message(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..=max_len).prop_map(|chars| chars.into_iter().collect())
}

/// Generate a signed payload of at most `max_len` bytes: either text or
/// arbitrary binary data.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        message(max_len).prop_map(move |text| {
            let mut bytes = text.into_bytes();
            bytes.truncate(max_len);
            bytes
        }),
        prop::collection::vec(any::<u8>(), 0..=max_len),
    ]
}

/// A message signed by a generated key.
#[derive(Debug, Clone)]
pub struct SignedMessage {
    pub keypair: Keypair,
    pub name: String,
    pub message: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedMessage {
    /// Does the signature verify under the signer's own key?
    pub fn verifies(&self) -> bool {
        verify(&self.message, &self.signature, &self.keypair.public_key())
    }
}

impl Arbitrary for SignedMessage {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (keypair(), name(), payload(200))
            .prop_map(|(keypair, name, message)| {
                let signature = keypair.sign(&message);
                SignedMessage {
                    keypair,
                    name,
                    message,
                    signature,
                }
            })
            .boxed()
    }
}
