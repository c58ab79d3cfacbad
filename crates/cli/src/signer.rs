//! OCI request signing (HTTP Signatures, rsa-sha256)

use alarm_lib::{ProvisionError, Result};
use base64::encode as b64;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request};
use sha2::{Digest, Sha256};

use crate::config::OciProfile;

/// Headers signed on every request
const GENERIC_HEADERS: [&str; 3] = ["date", "(request-target)", "host"];
/// Extra headers signed on requests that carry a body
const BODY_HEADERS: [&str; 3] = ["x-content-sha256", "content-type", "content-length"];

/// Signs requests with an API signing key
pub struct RequestSigner {
    key_id: String,
    key: PKey<Private>,
}

impl RequestSigner {
    /// Load the signing key named by a profile
    pub fn from_profile(profile: &OciProfile) -> Result<Self> {
        let pem = std::fs::read(&profile.key_file).map_err(|err| {
            ProvisionError::Configuration(format!(
                "failed to read key file {}: {err}",
                profile.key_file.display()
            ))
        })?;
        Self::from_pem(profile.key_id(), &pem, profile.pass_phrase.as_deref())
    }

    pub fn from_pem(key_id: String, pem: &[u8], pass_phrase: Option<&str>) -> Result<Self> {
        let rsa = match pass_phrase {
            Some(phrase) => Rsa::private_key_from_pem_passphrase(pem, phrase.as_bytes()),
            None => Rsa::private_key_from_pem(pem),
        }
        .map_err(|err| ProvisionError::Configuration(format!("invalid signing key: {err}")))?;
        let key = PKey::from_rsa(rsa)
            .map_err(|err| ProvisionError::Configuration(format!("invalid signing key: {err}")))?;

        Ok(Self { key_id, key })
    }

    /// Add `date`, `host`, body digest and `authorization` headers to `request`
    pub fn sign(&self, request: &mut Request) -> Result<()> {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        self.sign_at(request, &date)
    }

    fn sign_at(&self, request: &mut Request, date: &str) -> Result<()> {
        let url = request.url();
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(signing_error("request URL has no host")),
        };
        let target = match url.query() {
            Some(query) => format!(
                "{} {}?{}",
                lowercase_method(request.method()),
                url.path(),
                query
            ),
            None => format!("{} {}", lowercase_method(request.method()), url.path()),
        };

        let mut signed: Vec<(&'static str, String)> = GENERIC_HEADERS
            .into_iter()
            .zip([date.to_string(), target, host])
            .collect();

        if carries_body(request.method()) {
            let body = request
                .body()
                .and_then(|body| body.as_bytes())
                .unwrap_or_default();
            let values = [
                b64(Sha256::digest(body)),
                "application/json".to_string(),
                body.len().to_string(),
            ];
            signed.extend(BODY_HEADERS.into_iter().zip(values));
        }

        let signature = self.signature(&signing_string(&signed))?;
        let names: Vec<&str> = signed.iter().map(|(name, _)| *name).collect();
        let authorization = authorization_header(&self.key_id, &names, &signature);

        let headers = request.headers_mut();
        for (name, value) in signed.iter().filter(|(name, _)| *name != "(request-target)") {
            headers.insert(
                HeaderName::from_static(*name),
                HeaderValue::from_str(value).map_err(|err| signing_error(&err.to_string()))?,
            );
        }
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization).map_err(|err| signing_error(&err.to_string()))?,
        );
        Ok(())
    }

    fn signature(&self, signing_string: &str) -> Result<String> {
        let mut signer = openssl::sign::Signer::new(MessageDigest::sha256(), &self.key)
            .map_err(|err| signing_error(&err.to_string()))?;
        signer
            .update(signing_string.as_bytes())
            .map_err(|err| signing_error(&err.to_string()))?;
        let bytes = signer
            .sign_to_vec()
            .map_err(|err| signing_error(&err.to_string()))?;
        Ok(b64(bytes))
    }
}

fn lowercase_method(method: &Method) -> String {
    method.as_str().to_lowercase()
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn signing_error(message: &str) -> ProvisionError {
    ProvisionError::Configuration(format!("failed to sign request: {message}"))
}

/// Newline-joined `name: value` lines, in header order
pub fn signing_string(headers: &[(&str, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn authorization_header(key_id: &str, headers: &[&str], signature: &str) -> String {
    format!(
        "Signature version=\"1\",keyId=\"{key_id}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{signature}\"",
        headers.join(" ")
    )
}
