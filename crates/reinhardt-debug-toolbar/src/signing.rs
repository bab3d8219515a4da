//! Signed query tokens
//!
//! Captured queries are handed to the browser as opaque tokens so that a later
//! request to the select/explain views can replay them. A token binds the
//! statement and its parameters to the configured secret and a salt, and is
//! only ever produced for (and accepted with) read-only statements.
//!
//! Token layout: `base64url(json([statement, params])) "." base64url(mac)`,
//! where `mac = HMAC-SHA256(derived_key, payload_part)` and
//! `derived_key = HMAC-SHA256(secret, salt ++ "signer")`.

use crate::error::SigningError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Salt used for SQL query tokens.
pub const SQL_QUERY_SALT: &str = "fdt-sql-query";

/// Returns true when the statement starts with `select`, ignoring case and
/// surrounding whitespace.
///
/// # Examples
///
/// ```
/// use reinhardt_debug_toolbar::signing::is_select;
///
/// assert!(is_select("  SELECT * FROM users"));
/// assert!(!is_select("DELETE FROM users"));
/// ```
pub fn is_select(statement: &str) -> bool {
	statement
		.trim_start()
		.get(..6)
		.is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}

fn has_params(params: &Value) -> bool {
	match params {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(n) => n.as_f64() != Some(0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

/// Signs and verifies `(statement, params)` pairs.
#[derive(Clone)]
pub struct QuerySigner {
	key: Vec<u8>,
}

impl std::fmt::Debug for QuerySigner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QuerySigner").finish_non_exhaustive()
	}
}

impl QuerySigner {
	/// Create a signer for SQL query tokens.
	pub fn new(secret: &[u8]) -> Self {
		Self::with_salt(secret, SQL_QUERY_SALT)
	}

	/// Create a signer bound to a different signing context.
	///
	/// Tokens produced with one salt never verify under another.
	pub fn with_salt(secret: &[u8], salt: &str) -> Self {
		let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
		mac.update(salt.as_bytes());
		mac.update(b"signer");
		Self {
			key: mac.finalize().into_bytes().to_vec(),
		}
	}

	fn mac(&self) -> HmacSha256 {
		HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length")
	}

	/// Sign a captured query.
	///
	/// Returns `None` for statements that are not selects and for empty
	/// parameter sets; such queries get no replay links.
	pub fn sign(&self, statement: &str, params: &Value) -> Option<String> {
		if !has_params(params) || !is_select(statement) {
			return None;
		}

		let payload = serde_json::to_vec(&serde_json::json!([statement, params])).ok()?;
		let payload = URL_SAFE_NO_PAD.encode(payload);

		let mut mac = self.mac();
		mac.update(payload.as_bytes());
		let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

		Some(format!("{}.{}", payload, signature))
	}

	/// Open a token produced by [`QuerySigner::sign`].
	pub fn verify(&self, token: &str) -> Result<(String, Value), SigningError> {
		let (payload, signature) = token
			.split_once('.')
			.ok_or(SigningError::InvalidSignature)?;

		let signature = URL_SAFE_NO_PAD
			.decode(signature)
			.map_err(|_| SigningError::InvalidSignature)?;
		let mut mac = self.mac();
		mac.update(payload.as_bytes());
		mac.verify_slice(&signature)
			.map_err(|_| SigningError::InvalidSignature)?;

		let decoded = URL_SAFE_NO_PAD
			.decode(payload)
			.map_err(|_| SigningError::InvalidSignature)?;
		let value: Value =
			serde_json::from_slice(&decoded).map_err(|_| SigningError::InvalidSignature)?;

		let (statement, params) = match value {
			Value::Array(mut items) if items.len() == 2 => {
				let params = items.pop().unwrap_or(Value::Null);
				match items.pop() {
					Some(Value::String(statement)) => (statement, params),
					_ => return Err(SigningError::InvalidSignature),
				}
			}
			_ => return Err(SigningError::InvalidSignature),
		};

		if !is_select(&statement) {
			return Err(SigningError::RejectedStatement);
		}

		Ok((statement, params))
	}

	#[cfg(test)]
	fn sign_unchecked(&self, statement: &str, params: &Value) -> String {
		let payload = serde_json::to_vec(&serde_json::json!([statement, params])).unwrap();
		let payload = URL_SAFE_NO_PAD.encode(payload);
		let mut mac = self.mac();
		mac.update(payload.as_bytes());
		format!(
			"{}.{}",
			payload,
			URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
		)
	}
}
