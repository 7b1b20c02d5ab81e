use clap::{Arg, ArgAction, Command};
use crc32fast::Hasher as Crc32;
use csv_records::open_decoder;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let matches = Command::new("bench")
        .about("Decodes a CSV file into string maps and reports throughput")
        .arg(
            Arg::new("path")
                .long("path")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("verify")
                .long("verify")
                .help("CRC32 over every decoded cell, in header order")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .help("Stop after N rows")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let Some(path) = matches.get_one::<PathBuf>("path") else {
        anyhow::bail!("provide --path <file>");
    };
    let verify = matches.get_flag("verify");
    let limit = matches.get_one::<u64>("limit").copied();

    let start = Instant::now();
    let mut decoder = open_decoder(path).await?;
    let mut row: HashMap<String, String> = HashMap::new();
    let mut crc = Crc32::new();
    let mut rows: u64 = 0;

    while limit.map_or(true, |lim| rows < lim) && decoder.decode_next(&mut row).await? {
        rows += 1;
        if !verify {
            continue;
        }
        let Some(header) = decoder.header() else {
            continue;
        };
        // cells separated by '\x1f' (unit separator)
        for (i, name) in header.columns().iter().enumerate() {
            if i > 0 {
                crc.update(&[0x1f]);
            }
            if let Some(cell) = row.get(name) {
                crc.update(cell.as_bytes());
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let rps = rows as f64 / elapsed.max(f64::EPSILON);
    let headers = decoder
        .header()
        .map(|h| h.columns().to_vec())
        .unwrap_or_default();
    tracing::info!(rows, elapsed, "decode finished");

    if verify {
        println!(
            "source={} rows={} headers={:?} crc=0x{:08x}\nelapsed={:.1}s rows/sec={:.0}",
            path.display(),
            rows,
            headers,
            crc.finalize(),
            elapsed,
            rps
        );
    } else {
        println!(
            "source={} rows={} headers={:?}\nelapsed={:.1}s rows/sec={:.0}",
            path.display(),
            rows,
            headers,
            elapsed,
            rps
        );
    }
    Ok(())
}
