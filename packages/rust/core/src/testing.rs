//! Scripted collaborators for pass tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use startupscout_crawler::{FetchResponse, PageFetcher};
use startupscout_services::{GeoLookup, Geolocator, TextGenerator};
use startupscout_shared::{
    Accelerator, GenerationParams, Result, ScoutError, StartupField, StartupRecord, StartupRow,
};
use startupscout_storage::{InsertOutcome, Registry};

pub fn accelerator(website: &str, name: &str) -> Accelerator {
    Accelerator {
        website: website.into(),
        name: name.into(),
    }
}

/// Serves canned pages by exact URL; anything else is a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requested(&self, url: &str) -> bool {
        self.requests
            .lock()
            .map(|r| r.iter().any(|u| u == url))
            .unwrap_or(false)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        Ok(match self.pages.get(url) {
            Some(body) => FetchResponse {
                status: 200,
                body: body.clone(),
            },
            None => FetchResponse {
                status: 404,
                body: String::new(),
            },
        })
    }
}

/// Answers every lookup with the same country.
pub struct FixedGeolocator {
    country: String,
}

impl FixedGeolocator {
    pub fn new(country: &str) -> Self {
        Self {
            country: country.into(),
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn lookup(&self, _domain: &str) -> Result<GeoLookup> {
        Ok(GeoLookup {
            status: "success".into(),
            country: Some(self.country.clone()),
        })
    }
}

/// Returns queued responses in order, then errors.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<Vec<Result<String>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop())
            .unwrap_or_else(|| Err(ScoutError::Enrichment("no scripted response".into())))
    }
}

/// Every operation fails with a storage error.
pub struct FailingRegistry;

fn unavailable<T>() -> Result<T> {
    Err(ScoutError::Storage("registry unavailable".into()))
}

#[async_trait]
impl Registry for FailingRegistry {
    async fn list_accelerators(&self) -> Result<Vec<Accelerator>> {
        unavailable()
    }

    async fn existing_startup_urls(&self) -> Result<HashSet<String>> {
        unavailable()
    }

    async fn append_startup_if_absent(&self, _record: &StartupRecord) -> Result<InsertOutcome> {
        unavailable()
    }

    async fn list_startups(&self) -> Result<Vec<StartupRow>> {
        unavailable()
    }

    async fn update_startup_field(
        &self,
        _row: i64,
        _field: StartupField,
        _value: &str,
    ) -> Result<()> {
        unavailable()
    }
}
