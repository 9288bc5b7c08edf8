use std::collections::VecDeque;

use super::error::GenerationError;
use super::types::GenerateChunk;

/// A finite, single-use sequence of generated text fragments.
///
/// Concatenating every fragment yields the full response. The sequence ends
/// either when the model signals completion or at the first error.
pub struct Fragments {
    source: Source,
    finished: bool,
}

enum Source {
    Buffered(VecDeque<Result<String, GenerationError>>),
    Ndjson {
        response: reqwest::Response,
        pending: Vec<u8>,
        done: bool,
    },
}

impl Fragments {
    /// A sequence holding a single, already complete text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_results([Ok(text.into())])
    }

    /// A sequence replaying the given items in order.
    pub fn from_results(items: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            source: Source::Buffered(items.into_iter().collect()),
            finished: false,
        }
    }

    /// Reads an Ollama NDJSON body lazily, one line per fragment.
    pub(crate) fn ndjson(response: reqwest::Response) -> Self {
        Self {
            source: Source::Ndjson {
                response,
                pending: Vec::new(),
                done: false,
            },
            finished: false,
        }
    }

    /// The next fragment, `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Option<Result<String, GenerationError>> {
        if self.finished {
            return None;
        }

        let item = match &mut self.source {
            Source::Buffered(items) => items.pop_front(),
            Source::Ndjson {
                response,
                pending,
                done,
            } => next_ndjson(response, pending, done).await,
        };

        match &item {
            None | Some(Err(_)) => self.finished = true,
            Some(Ok(_)) => {}
        }
        item
    }

    /// Drain the sequence, handing each fragment to `on_fragment`, and return the full text.
    pub async fn collect_text(
        mut self,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<String, GenerationError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            text.push_str(&fragment);
        }
        Ok(text)
    }
}

async fn next_ndjson(
    response: &mut reqwest::Response,
    pending: &mut Vec<u8>,
    done: &mut bool,
) -> Option<Result<String, GenerationError>> {
    if *done {
        return None;
    }
    loop {
        if let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            match parse_line(&line) {
                Ok(LineOutcome::Skip) => continue,
                Ok(LineOutcome::Fragment(text)) => return Some(Ok(text)),
                Ok(LineOutcome::Done(last)) => {
                    *done = true;
                    return last.map(Ok);
                }
                Err(e) => return Some(Err(e)),
            }
        }

        match response.chunk().await {
            Ok(Some(bytes)) => pending.extend_from_slice(&bytes),
            Ok(None) => {
                // Body ended; a last line may lack its newline.
                let rest = std::mem::take(pending);
                return match parse_line(&rest) {
                    Ok(LineOutcome::Done(last)) => {
                        *done = true;
                        last.map(Ok)
                    }
                    Ok(LineOutcome::Fragment(_) | LineOutcome::Skip) => Some(Err(
                        GenerationError::Malformed("stream ended before completion".into()),
                    )),
                    Err(e) => Some(Err(e)),
                };
            }
            Err(e) => return Some(Err(e.into())),
        }
    }
}

enum LineOutcome {
    Skip,
    Fragment(String),
    Done(Option<String>),
}

fn parse_line(line: &[u8]) -> Result<LineOutcome, GenerationError> {
    let line = std::str::from_utf8(line)
        .map_err(|e| GenerationError::Malformed(format!("invalid UTF-8 in stream: {e}")))?
        .trim();
    if line.is_empty() {
        return Ok(LineOutcome::Skip);
    }

    let chunk: GenerateChunk = serde_json::from_str(line)
        .map_err(|e| GenerationError::Malformed(format!("bad stream line: {e}")))?;

    if let Some(message) = chunk.error {
        return Err(GenerationError::Model(message));
    }
    if chunk.done {
        let last = (!chunk.response.is_empty()).then_some(chunk.response);
        return Ok(LineOutcome::Done(last));
    }
    if chunk.response.is_empty() {
        Ok(LineOutcome::Skip)
    } else {
        Ok(LineOutcome::Fragment(chunk.response))
    }
}
