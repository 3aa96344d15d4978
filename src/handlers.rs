//! Line handlers shipped with the binary.

use crate::workers::{LineHandler, RecordOut};
use anyhow::{bail, Result};
use regex::Regex;

#[derive(Clone, Debug)]
pub enum BuiltinHandler {
    /// Emit every line unchanged.
    Copy,
    /// Emit lines matching the pattern; the rest are skipped, not counted as bad.
    Grep(Regex),
    /// `{key}\t{value}`, split at the first TAB. The value may contain more TABs.
    Kv { without_key: bool },
}

impl LineHandler for BuiltinHandler {
    fn handle(&mut self, line: &str, out: &mut RecordOut<'_>) -> Result<()> {
        match self {
            BuiltinHandler::Copy => out.push(line)?,
            BuiltinHandler::Grep(re) => {
                if re.is_match(line) {
                    out.push(line)?;
                }
            }
            BuiltinHandler::Kv { without_key } => {
                let Some((key, value)) = line.split_once('\t') else {
                    bail!("Number of tokens != 2");
                };
                if *without_key {
                    out.push(value)?;
                } else {
                    out.push(format!("{key}\t{value}"))?;
                }
            }
        }
        Ok(())
    }
}
