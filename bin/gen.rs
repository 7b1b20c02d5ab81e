use clap::{Arg, ArgAction, Command};
use csv_records::{impl_record, EncodeOptions, Encoder};
use std::io::{self, Write};

#[derive(Debug, Default)]
struct Item {
    sku: String,
    qty: u32,
    price: f64,
    active: bool,
}

impl_record!(Item {
    sku,
    qty,
    price,
    active,
});

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Writes synthetic typed records as CSV to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(Arg::new("delim").long("delim").default_value(","))
        .arg(
            Arg::new("no_header")
                .long("no-header")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("crlf").long("crlf").action(ArgAction::SetTrue))
        .get_matches();

    let rows = matches.get_one::<u64>("rows").copied().unwrap_or_default();
    let delim = matches
        .get_one::<String>("delim")
        .map(String::as_str)
        .unwrap_or(",");
    let [delimiter] = delim.as_bytes() else {
        anyhow::bail!("--delim must be a single byte, got {delim:?}");
    };

    let out = io::BufWriter::new(io::stdout().lock());
    let mut enc = Encoder::new(out).opts(EncodeOptions {
        delimiter: Some(*delimiter),
        skip_header: matches.get_flag("no_header"),
        use_crlf: matches.get_flag("crlf"),
    });

    // Deterministic data so runs can be diffed.
    let mut item = Item::default();
    for i in 0..rows {
        item.sku = format!("SKU{i:010}");
        item.qty = (i % 1000) as u32;
        item.price = (i % 10_000) as f64 / 100.0;
        item.active = i % 3 != 0;
        enc.encode_next(&item)?;
    }

    enc.into_inner()?.flush()?;
    Ok(())
}
