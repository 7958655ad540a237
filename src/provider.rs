// 🌐 Lookup Provider - external source of company data
//
// GET <base>/v1/registry/<14 digits>, Accept: application/json.
// Single attempt: no retry, no backoff.

use crate::error::ProviderError;
use crate::record::CompanyRecord;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use std::time::Duration;

const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Fetch company data for 14 canonical digits.
    ///
    /// The returned record's `registry_id` is whatever the provider said;
    /// the resolver overwrites it with the caller's spelling.
    async fn lookup(&self, digits: &str) -> Result<CompanyRecord, ProviderError>;
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

/// Company payload as the provider spells it
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderPayload {
    pub cnpj: Option<String>,
    pub nome: Option<String>,
    pub fantasia: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub cep: Option<String>,
    pub bairro: Option<String>,
    pub municipio: Option<String>,
    pub uf: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub efr: Option<String>,
    pub situacao: Option<String>,

    /// In-band request status ("OK" / "ERROR"), not the registration status
    pub status: Option<String>,
    pub message: Option<String>,
}

impl ProviderPayload {
    pub fn into_record(self, digits: &str) -> Result<CompanyRecord, ProviderError> {
        if self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ERROR"))
        {
            return Err(ProviderError::Rejected {
                message: self.message.unwrap_or_else(|| "unspecified error".to_string()),
            });
        }

        let registry_id = self.cnpj.unwrap_or_else(|| digits.to_string());

        Ok(CompanyRecord {
            id: None,
            registry_id,
            name: self.nome.unwrap_or_default(),
            trade_name: self.fantasia.unwrap_or_default(),
            street: self.logradouro.unwrap_or_default(),
            number: self.numero.unwrap_or_default(),
            complement: self.complemento.unwrap_or_default(),
            postal_code: self.cep.unwrap_or_default(),
            district: self.bairro.unwrap_or_default(),
            municipality: self.municipio.unwrap_or_default(),
            state: self.uf.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.telefone.unwrap_or_default(),
            registry_authority: self.efr.unwrap_or_default(),
            status: self.situacao.unwrap_or_default(),
            fetched_at: Utc::now(),
        })
    }
}

// ============================================================================
// HTTP PROVIDER
// ============================================================================

pub struct HttpLookupProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLookupProvider {
    /// `timeout` bounds the whole request. `None` leaves it unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpLookupProvider {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, digits: &str) -> String {
        format!("{}/v1/registry/{}", self.base_url, digits)
    }
}

#[async_trait]
impl LookupProvider for HttpLookupProvider {
    async fn lookup(&self, digits: &str) -> Result<CompanyRecord, ProviderError> {
        let url = self.url_for(digits);
        tracing::info!(%url, "querying lookup provider");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_BYTES {
                let mut cut = MAX_ERROR_BODY_BYTES;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            tracing::warn!(%url, status = status.as_u16(), "lookup provider returned an error");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let payload: ProviderPayload = serde_json::from_slice(&bytes)?;
        payload.into_record(digits)
    }
}
