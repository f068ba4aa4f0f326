//! Test doubles shared by the acquisition and client tests.

use crate::acquisition::error::FetchError;
use crate::acquisition::transport::Transport;
use futures_util::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Debug, Clone)]
pub enum Scripted {
    Body(Vec<u8>),
    NotFound,
    Transient,
}

/// Answers each URL from a queue of scripted responses. Unscripted URLs, and
/// URLs whose queue has run dry, answer "not found".
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, responses: Vec<Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn all_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.calls.lock().unwrap().push(url.to_string());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Scripted::NotFound);
        let result = match next {
            Scripted::Body(bytes) => Ok(bytes),
            Scripted::NotFound => Err(FetchError::AbsentPeriod(url.to_string())),
            Scripted::Transient => Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }),
        };
        Box::pin(async move { result })
    }
}

/// Builds an in-memory zip archive from `(name, contents)` pairs.
pub fn zip_payload(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
