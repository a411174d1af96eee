//! Show the effective configuration with secrets redacted.

use std::io::Write;

use anyhow::Result;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    writeln!(writer, "{config:#?}")?;
    match config.fallback_ref() {
        Ok(fallback) => writeln!(writer, "fallback issue {fallback}: ok")?,
        Err(err) => writeln!(writer, "fallback issue: {err}")?,
    }
    Ok(())
}
