//! `json-find`: list the nodes reached through a given field name.
//!
//! Usage:
//!   json-find [--codec json|cbor|msgpack] <key> [<value>]
//!
//! The document is read from stdin. Every node whose parent key is `<key>`
//! (and whose text equals `<value>`, when given) is printed as its JSON
//! Pointer followed by the JSON of the object that holds it.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::io::{self, Read, Write};
use std::process;

use json_node::{Codec, CodecKind, JsonCodec, Node, Visit};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: json-find [--codec json|cbor|msgpack] <key> [<value>]";

struct Args {
    codec: CodecKind,
    key: String,
    value: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut codec = CodecKind::Json;
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            "--codec" => {
                let name = args.next().ok_or("--codec needs a value")?;
                codec = name.parse().map_err(|e| format!("{e}"))?;
            }
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let key = positional.next().ok_or(USAGE)?;
    let value = positional.next();
    Ok(Args { codec, key, value })
}

fn run(args: Args) -> Result<usize, Box<dyn std::error::Error>> {
    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input)?;
    let root = Node::from_bytes_with_codec(&input, args.codec.into_codec())?;
    info!(codec = root.codec().name(), len = input.len(), "document decoded");

    let json = JsonCodec::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;
    let matches = root.find(|n| {
        let key_ok = n.parent_key() == Some(args.key.as_str());
        let value_ok = args.value.as_deref().map_or(true, |v| n.to_string() == v);
        Visit::from(key_ok && value_ok)
    });
    for hit in matches {
        let Some(holder) = hit.parent() else { continue };
        let rendered = json.encode(holder.value())?;
        write!(out, "{}\t", hit.pointer())?;
        out.write_all(&rendered)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    Ok(count)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    match run(args) {
        Ok(count) => info!(count, "search finished"),
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
