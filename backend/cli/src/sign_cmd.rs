//! `relaybot sign`: compute the `X-Line-Signature` for a request body, for
//! replaying webhooks against a local server.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use relaybot_channels::{sign_body, verify_signature};

use crate::terminal_output::{note_error, note_success};

fn read_body(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("Failed to read body file: {}", path.display())),
        _ => {
            let mut body = Vec::new();
            std::io::stdin()
                .read_to_end(&mut body)
                .context("Failed to read body from stdin")?;
            Ok(body)
        }
    }
}

/// Print the signature, or check `expected` against it.
pub fn run(body: Option<&Path>, secret: &str, expected: Option<&str>) -> Result<()> {
    if secret.is_empty() {
        bail!("channel secret is empty");
    }
    let body = read_body(body)?;

    match expected {
        None => println!("{}", sign_body(secret, &body)),
        Some(signature) => match verify_signature(secret, &body, signature) {
            Ok(()) => note_success("Signature matches"),
            Err(e) => {
                note_error(&format!("Signature does not match: {e}"));
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
