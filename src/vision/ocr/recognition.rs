// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition with CTC decoding

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use ort::value::Value;
use tracing::{debug, info};

use crate::vision::onnx::SharedSession;
use crate::vision::preprocessing::preprocess_for_recognition;

/// Recognized text for one line crop
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean probability of the emitted characters, 0 when none were emitted
    pub confidence: f32,
}

/// CTC text recognizer over the PaddleOCR rec model
#[derive(Clone)]
pub struct CtcRecognizer {
    session: SharedSession,
    dictionary: Arc<Vec<char>>,
}

impl std::fmt::Debug for CtcRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtcRecognizer")
            .field("session", &self.session)
            .field("dictionary_size", &self.dictionary.len())
            .finish()
    }
}

impl CtcRecognizer {
    pub fn new(model_path: &Path, dict_path: &Path, intra_threads: usize) -> Result<Self> {
        if !dict_path.exists() {
            anyhow::bail!("OCR character dictionary not found: {}", dict_path.display());
        }

        let dictionary = load_dictionary(dict_path)?;
        info!("Loaded character dictionary with {} characters", dictionary.len());

        Ok(Self {
            session: SharedSession::load(model_path, "OCR recognition", intra_threads)?,
            dictionary: Arc::new(dictionary),
        })
    }

    /// Recognize the single text line in `image`
    pub fn recognize(&self, image: &RgbImage) -> Result<RecognizedText> {
        let tensor = preprocess_for_recognition(image);

        let mut session = self.session.lock()?;
        let input = Value::from_array(tensor).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.session.input_name() => input])
            .context("Recognition inference failed")?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract recognition output")?;
        debug!("Recognition output shape: {:?}", output.shape());

        let probs = sequence_probabilities(output.view())?;
        Ok(ctc_greedy_decode(probs, &self.dictionary))
    }
}

/// Load a PaddleOCR character dictionary
///
/// One character per line. Index 0 is reserved for the CTC blank and a
/// trailing space class is appended, matching `use_space_char`.
pub fn load_dictionary(path: &Path) -> Result<Vec<char>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec!['\0'];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.trim_end_matches(['\r', '\n']).chars().next() {
            dictionary.push(ch);
        }
    }
    dictionary.push(' ');

    Ok(dictionary)
}

/// Reduce `[1, T, C]` to the `T x C` matrix
pub fn sequence_probabilities(output: ArrayViewD<'_, f32>) -> Result<ArrayView2<'_, f32>> {
    let view = match output.ndim() {
        3 if output.shape()[0] == 1 => output.index_axis_move(Axis(0), 0),
        2 => output,
        _ => anyhow::bail!("Unexpected recognition output shape: {:?}", output.shape()),
    };
    view.into_dimensionality::<Ix2>()
        .context("Unexpected recognition output rank")
}

/// Best-path CTC decoding
///
/// Takes the arg-max class per timestep, collapses repeats, and drops the
/// blank (index 0). Classes beyond the dictionary are skipped.
pub fn ctc_greedy_decode(probs: ArrayView2<'_, f32>, dictionary: &[char]) -> RecognizedText {
    let mut text = String::new();
    let mut scores = Vec::new();
    let mut previous = 0usize;

    for step in probs.outer_iter() {
        let (index, prob) = step
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });

        if index != 0 && index != previous {
            if let Some(&ch) = dictionary.get(index) {
                text.push(ch);
                scores.push(prob);
            }
        }
        previous = index;
    }

    let confidence = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f32>() / scores.len() as f32
    };

    RecognizedText { text, confidence }
}
