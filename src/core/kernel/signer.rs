use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Signer trait for request authentication
///
/// Implementations own the credential. The transport only asks for the API
/// key (sent as a header) and for a signature over an exact byte sequence.
pub trait Signer: Send + Sync {
    /// API key sent in the `X-MBX-APIKEY` header
    fn api_key(&self) -> &str;

    /// Lowercase hex signature over `payload`
    fn signature(&self, payload: &[u8]) -> Result<String, ExchangeError>;

    /// Append `timestamp` and `recvWindow` to the encoded parameters, sign the
    /// result and append `signature`.
    ///
    /// # Arguments
    /// * `encoded` - Sorted, URL-encoded request parameters (may be empty)
    /// * `timestamp_ms` - Milliseconds since the Unix epoch
    /// * `recv_window_ms` - Server-side tolerance for clock skew
    ///
    /// # Returns
    /// The exact parameter string to transmit
    fn sign_request(
        &self,
        encoded: &str,
        timestamp_ms: i64,
        recv_window_ms: u64,
    ) -> Result<String, ExchangeError> {
        let mut payload = String::with_capacity(encoded.len() + 112);
        if !encoded.is_empty() {
            payload.push_str(encoded);
            payload.push('&');
        }
        payload.push_str(&format!(
            "timestamp={}&recvWindow={}",
            timestamp_ms, recv_window_ms
        ));

        let signature = self.signature(payload.as_bytes())?;
        payload.push_str("&signature=");
        payload.push_str(&signature);

        Ok(payload)
    }
}

/// HMAC-SHA256 signer.
///
/// A fresh MAC is keyed on every call, so the signer can be shared across
/// tasks behind an `Arc` without locking.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacSigner {
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl HmacSigner {
    /// Create a new HMAC signer
    ///
    /// # Arguments
    /// * `api_key` - API key from the exchange
    /// * `api_secret` - Secret used as the HMAC key, never transmitted
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}

impl Signer for HmacSigner {
    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn signature(&self, payload: &[u8]) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ExchangeError::SigningError(format!("Invalid secret key: {}", e)))?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Example credentials from the Binance API documentation
    const API_KEY: &str = "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A";
    const API_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    fn signer() -> HmacSigner {
        HmacSigner::new(API_KEY.to_string(), API_SECRET.to_string())
    }

    #[rstest]
    #[case(
        "timestamp=1578963600000",
        "d84e6641b1e328e7b418fff030caed655c266299c9355e36ce801ed14631eed4"
    )]
    #[case(
        "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559",
        "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
    )]
    fn test_documented_signatures(#[case] payload: &str, #[case] expected: &str) {
        assert_eq!(signer().signature(payload.as_bytes()).unwrap(), expected);
    }

    #[test]
    fn test_sign_request_appends_fields_in_order() {
        let signed = signer()
            .sign_request("price=0.1&symbol=LTCBTC", 1_499_827_319_559, 5000)
            .unwrap();

        let (unsigned, signature) = signed.split_once("&signature=").unwrap();
        assert_eq!(
            unsigned,
            "price=0.1&symbol=LTCBTC&timestamp=1499827319559&recvWindow=5000"
        );
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(signature, signer().signature(unsigned.as_bytes()).unwrap());
    }

    #[test]
    fn test_sign_request_without_params_has_no_leading_separator() {
        let signed = signer().sign_request("", 1_578_963_600_000, 5000).unwrap();
        assert!(signed.starts_with("timestamp=1578963600000&recvWindow=5000&signature="));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = signer();
        let first = signer.sign_request("symbol=BTCUSDT", 1_700_000_000_000, 6000).unwrap();
        for _ in 0..20 {
            assert_eq!(
                signer.sign_request("symbol=BTCUSDT", 1_700_000_000_000, 6000).unwrap(),
                first
            );
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains(API_KEY));
        assert!(!debug.contains(API_SECRET));
    }
}
