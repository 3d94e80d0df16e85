//! Hand-written port mocks shared by the unit tests.

#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::significant_drop_tightening
)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lmsforce_domain::{Course, HttpRequest, HttpResponse, UserProfile};
use serde_json::Value;

use crate::ports::{
    CourseCatalog, DirectoryError, HttpClient, HttpClientError, OptionStore, StoreError,
    UserDirectory,
};

/// In-memory option store that counts writes. Transients never expire.
#[derive(Default)]
pub struct MemoryStore {
    options: Mutex<HashMap<String, Value>>,
    transients: Mutex<HashMap<String, Value>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(self, key: &str, value: Value) -> Self {
        self.options
            .lock()
            .expect("Lock poisoned")
            .insert(key.to_string(), value);
        self
    }

    pub fn option(&self, key: &str) -> Option<Value> {
        self.options.lock().expect("Lock poisoned").get(key).cloned()
    }

    pub fn transient(&self, key: &str) -> Option<Value> {
        self.transients
            .lock()
            .expect("Lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().expect("Lock poisoned")
    }

    fn bump(&self) {
        *self.writes.lock().expect("Lock poisoned") += 1;
    }
}

#[async_trait]
impl OptionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.option(key))
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        let options = self.options.lock().expect("Lock poisoned");
        Ok(keys.iter().map(|k| options.get(*k).cloned()).collect())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.bump();
        self.options
            .lock()
            .expect("Lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.bump();
        self.options.lock().expect("Lock poisoned").extend(entries);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.bump();
        Ok(self
            .options
            .lock()
            .expect("Lock poisoned")
            .remove(key)
            .is_some())
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.bump();
        let mut options = self.options.lock().expect("Lock poisoned");
        for key in keys {
            options.remove(*key);
        }
        Ok(())
    }

    async fn get_transient(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.transient(key))
    }

    async fn set_transient(
        &self,
        key: &str,
        value: Value,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        self.bump();
        self.transients
            .lock()
            .expect("Lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_transient(&self, key: &str) -> Result<bool, StoreError> {
        self.bump();
        Ok(self
            .transients
            .lock()
            .expect("Lock poisoned")
            .remove(key)
            .is_some())
    }
}

/// HTTP client that replays scripted responses in order and records requests.
#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpClientError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .expect("Lock poisoned")
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, error: HttpClientError) -> Self {
        self.responses
            .lock()
            .expect("Lock poisoned")
            .push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("Lock poisoned").clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        self.requests.lock().expect("Lock poisoned").push(request);
        self.responses
            .lock()
            .expect("Lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(HttpClientError::Other("no scripted response".to_string())))
    }
}

/// Directory backed by fixed user and course lists.
#[derive(Default)]
pub struct MockDirectory {
    pub users: Vec<UserProfile>,
    pub courses: Vec<Course>,
}

#[async_trait]
impl UserDirectory for MockDirectory {
    async fn find_user(&self, user_id: u64) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self.users.iter().find(|u| u.id == user_id).cloned())
    }
}

#[async_trait]
impl CourseCatalog for MockDirectory {
    async fn find_course(&self, course_id: u64) -> Result<Option<Course>, DirectoryError> {
        Ok(self.courses.iter().find(|c| c.id == course_id).cloned())
    }
}
