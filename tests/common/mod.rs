#![allow(dead_code)]

use async_trait::async_trait;
use binance_api::core::kernel::{encode, RateLimitUsage, RestClient, Security};
use binance_api::ExchangeError;
use reqwest::Method;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// One call seen by [`MockRest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: String,
    /// Encoded parameters, before any signature
    pub params: String,
    pub security: Security,
}

impl RecordedCall {
    /// Decoded `key=value` pairs of the parameters
    pub fn pairs(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(&self.params).unwrap()
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Transport that records every call and answers with a canned body
#[derive(Clone, Default)]
pub struct MockRest {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    response: Arc<Mutex<Vec<u8>>>,
    window: Arc<AtomicU64>,
}

impl MockRest {
    pub fn returning(body: &str) -> Self {
        let mock = Self::default();
        mock.respond_with(body);
        mock
    }

    pub fn respond_with(&self, body: &str) {
        *self.response.lock().unwrap() = body.as_bytes().to_vec();
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no call recorded")
    }

    pub fn window(&self) -> u64 {
        self.window.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RestClient for MockRest {
    async fn execute<P>(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&P>,
        security: Security,
    ) -> Result<Vec<u8>, ExchangeError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let params = match params {
            Some(params) => encode(params)?,
            None => String::new(),
        };
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            endpoint: endpoint.to_string(),
            params,
            security,
        });
        Ok(self.response.lock().unwrap().clone())
    }

    fn set_window(&self, window_ms: u64) {
        self.window.store(window_ms, Ordering::Relaxed);
    }

    fn usage(&self) -> RateLimitUsage {
        RateLimitUsage::default()
    }
}
