use std::net::IpAddr;

use csv_records::{impl_record, Decoder, Encoder};

#[derive(Debug, Default, Clone, PartialEq)]
struct Everything {
    string: String,
    renamed: String,
    int64: i64,
    unlisted: String,
    note: Option<String>,
    ip: Option<IpAddr>,
}

impl_record!(Everything {
    string => "String",
    renamed => "renamerized",
    int64 => "Int64",
    note => "StringPtr,omitempty",
    ip => "IP,omitempty",
});

#[test]
fn encode_then_decode_keeps_listed_fields() -> anyhow::Result<()> {
    let ip: IpAddr = "10.0.0.7".parse()?;
    let written = vec![
        Everything {
            string: "hello".into(),
            renamed: "world".into(),
            int64: -42,
            unlisted: "dropped".into(),
            note: Some("ptr".into()),
            ip: Some(ip),
        },
        Everything {
            string: "with,comma".into(),
            renamed: "with \"quote\"".into(),
            int64: 7,
            unlisted: String::new(),
            note: None,
            ip: None,
        },
    ];

    let mut e = Encoder::new(Vec::new());
    for r in &written {
        e.encode_next(r)?;
    }
    let bytes = e.into_inner()?;
    let text = String::from_utf8(bytes.clone())?;
    assert_eq!(
        text,
        "String,renamerized,Int64,StringPtr,IP\n\
         hello,world,-42,ptr,10.0.0.7\n\
         \"with,comma\",\"with \"\"quote\"\"\",7,,\n"
    );

    let mut d = Decoder::new(bytes.as_slice());
    let decoded: Vec<Everything> = d.records().collect::<Result<_, _>>()?;
    assert_eq!(decoded.len(), 2);
    for (got, want) in decoded.iter().zip(&written) {
        assert_eq!(got.string, want.string);
        assert_eq!(got.renamed, want.renamed);
        assert_eq!(got.int64, want.int64);
        assert_eq!(got.unlisted, "");
    }
    assert_eq!(decoded[0].note.as_deref(), Some("ptr"));
    assert_eq!(decoded[0].ip, Some(ip));
    assert_eq!(decoded[1].note, None);
    assert_eq!(decoded[1].ip, None);
    Ok(())
}
