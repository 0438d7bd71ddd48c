//! Token parsing
//!
//! Accepts JWS compact serialization (`header.payload.signature`) as well as
//! the JWS JSON serializations of RFC 7515 §7.2. A compact token carries one
//! header; a JSON General token carries one per entry of `signatures`.
//!
//! Each signature entry is rebuilt into its compact form so verification can
//! go through `jsonwebtoken::decode` unchanged.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};
use serde::Deserialize;

use crate::error::TokenError;

/// JWT claims as an untyped JSON object
pub type TokenClaims = serde_json::Map<String, serde_json::Value>;

/// A parsed but unverified token
#[derive(Debug, Clone)]
pub struct SignedToken {
    blocks: Vec<SignatureBlock>,
    unverified_claims: TokenClaims,
}

/// One protected header together with the signature it covers
#[derive(Debug, Clone)]
pub struct SignatureBlock {
    header: Header,
    compact: String,
}

#[derive(Deserialize)]
struct JsonSerialization {
    payload: String,
    #[serde(default)]
    signatures: Vec<JsonSignature>,
    // Flattened form
    protected: Option<String>,
    signature: Option<String>,
}

#[derive(Deserialize)]
struct JsonSignature {
    protected: String,
    signature: String,
}

impl SignedToken {
    /// Parse a token without verifying anything
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the token is not a well-formed JWS or its
    /// payload is not a JSON object.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let token = token.trim();
        if token.starts_with('{') {
            Self::parse_json(token)
        } else {
            Self::parse_compact(token)
        }
    }

    fn parse_compact(token: &str) -> Result<Self, TokenError> {
        let mut segments = token.split('.');
        let (Some(_), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed("expected three dot-separated segments"));
        };

        let unverified_claims = decode_claims(payload)?;
        let block = SignatureBlock::from_compact(token.to_string())?;

        Ok(Self {
            blocks: vec![block],
            unverified_claims,
        })
    }

    fn parse_json(token: &str) -> Result<Self, TokenError> {
        let jws: JsonSerialization = serde_json::from_str(token)
            .map_err(|_| TokenError::Malformed("invalid JWS JSON serialization"))?;

        let mut entries = jws.signatures;
        match (jws.protected, jws.signature) {
            (Some(protected), Some(signature)) if entries.is_empty() => {
                entries.push(JsonSignature {
                    protected,
                    signature,
                });
            }
            (None, None) => {}
            _ => {
                return Err(TokenError::Malformed(
                    "mixed or incomplete flattened JWS members",
                ));
            }
        }

        if entries.is_empty() {
            return Err(TokenError::Malformed("JWS has no signatures"));
        }

        let unverified_claims = decode_claims(&jws.payload)?;
        let blocks = entries
            .into_iter()
            .map(|entry| {
                SignatureBlock::from_compact(format!(
                    "{}.{}.{}",
                    entry.protected, jws.payload, entry.signature
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            blocks,
            unverified_claims,
        })
    }

    /// Header blocks in token order
    pub fn blocks(&self) -> &[SignatureBlock] {
        &self.blocks
    }

    /// Claims read WITHOUT signature verification
    ///
    /// Only fit for locating the issuer's keys; never for authorization.
    pub fn unverified_claims(&self) -> &TokenClaims {
        &self.unverified_claims
    }

    /// Unverified `iss` claim, if it is a string
    pub fn unverified_issuer(&self) -> Option<&str> {
        self.unverified_claims
            .get("iss")
            .and_then(serde_json::Value::as_str)
    }
}

impl SignatureBlock {
    fn from_compact(compact: String) -> Result<Self, TokenError> {
        let header = decode_header(compact.as_str()).map_err(TokenError::Header)?;
        Ok(Self { header, compact })
    }

    /// Protected header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Key id, empty when the header has none
    pub fn kid(&self) -> &str {
        self.header.kid.as_deref().unwrap_or_default()
    }

    /// Signing algorithm named by the header
    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Compact serialization covering this block's signature
    pub fn compact(&self) -> &str {
        &self.compact
    }

    /// Verify the signature and return the now trusted claims
    ///
    /// Only the signature is checked here. Time-based claims are left to the
    /// caller's clock.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signature`] if verification fails.
    pub fn verify(&self, key: &DecodingKey) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(self.compact.as_str(), key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Signature)
    }
}

fn decode_claims(payload: &str) -> Result<TokenClaims, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}
