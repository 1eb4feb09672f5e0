use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("key error: {0}")]
    Key(String),

    #[error("keystore error: {0}")]
    Keystore(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error(transparent)]
    Crypto(#[from] govctl_crypto::CryptoError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
