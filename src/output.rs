//! Output writer: compact JSON, progress lines and raw payloads.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

pub struct Output<W: Write> {
    out: W,
}

impl<W: Write> Output<W> {
    pub fn new(out: W) -> Self {
        Output { out }
    }

    /// Serialise `value` as compact JSON, no trailing newline.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = serde_json::to_vec(value).context("failed to encode output")?;
        self.out.write_all(&encoded)?;
        self.out.flush()?;
        Ok(())
    }

    /// One line of progress output, e.g. the ID of a deleted item.
    pub fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_is_compact() {
        let mut out = Output::new(Vec::new());
        out.json(&json!({"id": "h1", "tags": ["a", "b"]})).unwrap();
        assert_eq!(
            String::from_utf8(out.into_inner()).unwrap(),
            r#"{"id":"h1","tags":["a","b"]}"#
        );
    }

    #[test]
    fn lines_and_raw_bytes() {
        let mut out = Output::new(Vec::new());
        out.line("s1").unwrap();
        out.raw(b"#!/bin/sh\n").unwrap();
        assert_eq!(out.into_inner(), b"s1\n#!/bin/sh\n".to_vec());
    }
}
