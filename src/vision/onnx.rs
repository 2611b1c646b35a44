// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared ONNX Runtime session setup

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use tracing::{debug, info};

/// A CPU-only ONNX session guarded for shared use across requests
///
/// Inference takes `&mut Session`, so concurrent callers are serialized on the
/// mutex.
#[derive(Clone)]
pub struct SharedSession {
    session: Arc<Mutex<Session>>,
    input_name: String,
    label: &'static str,
}

impl std::fmt::Debug for SharedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSession")
            .field("label", &self.label)
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl SharedSession {
    /// Load an ONNX model with CPU execution
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects the model.
    pub fn load(model_path: &Path, label: &'static str, intra_threads: usize) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("{} model not found: {}", label, model_path.display());
        }

        info!("Loading {} model from {}", label, model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load {} model from {}", label, model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("{} model input {}: {:?}", label, input_name, input.input_type);
        }

        info!("✅ {} model loaded (CPU-only)", label);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            label,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Lock the session for one inference call
    pub fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| anyhow!("{} session mutex poisoned", self.label))
    }
}
