use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr};

use csv_records::{impl_record, CsvRecordError, EncodeOptions, EncodeSource, Encoder, Kind, Value};

#[derive(Debug, Default, Clone)]
struct Row {
    foo: String,
    bar: String,
    baz: String,
}

impl_record!(Row {
    foo => "Foo",
    bar => "Bar",
    baz => "Baz",
});

fn row(foo: &str, bar: &str, baz: &str) -> Row {
    Row {
        foo: foo.into(),
        bar: bar.into(),
        baz: baz.into(),
    }
}

fn encode_all(sources: &[&dyn Source]) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    let mut e = Encoder::new(&mut buf);
    for s in sources {
        s.encode_into(&mut e)?;
    }
    drop(e);
    Ok(String::from_utf8(buf)?)
}

// Lets one case mix record types.
trait Source {
    fn encode_into(&self, e: &mut Encoder<&mut Vec<u8>>) -> csv_records::CsvResult<()>;
}

impl<T: EncodeSource> Source for T {
    fn encode_into(&self, e: &mut Encoder<&mut Vec<u8>>) -> csv_records::CsvResult<()> {
        e.encode_next(self)
    }
}

#[test]
fn encodes_same_shaped_records() -> anyhow::Result<()> {
    let out = encode_all(&[&row("a", "b", "c"), &row("d", "e", "f")])?;
    assert_eq!(out, "Foo,Bar,Baz\na,b,c\nd,e,f\n");
    Ok(())
}

#[test]
fn blank_fields_write_blank_cells() -> anyhow::Result<()> {
    let out = encode_all(&[&row("a", "", ""), &row("", "b", "")])?;
    assert_eq!(out, "Foo,Bar,Baz\na,,\n,b,\n");
    Ok(())
}

#[test]
fn narrower_record_fills_missing_columns() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct FooBar {
        foo: String,
        bar: String,
    }
    impl_record!(FooBar { foo => "Foo", bar => "Bar" });

    let out = encode_all(&[
        &row("a", "", ""),
        &FooBar { foo: "".into(), bar: "b".into() },
    ])?;
    assert_eq!(out, "Foo,Bar,Baz\na,,\n,b,\n");
    Ok(())
}

#[test]
fn unlisted_and_excluded_fields_are_not_columns() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Tagged {
        foo: String,
        bar: String,
        ignored: String,
        baz: String,
        scratch: String,
    }
    impl_record!(Tagged {
        foo => "renamed_foo",
        bar => "Bar",
        ignored => "-",
        baz => "Baz",
    });

    let t = Tagged {
        foo: "a".into(),
        bar: "b".into(),
        ignored: "c".into(),
        baz: "d".into(),
        scratch: "e".into(),
    };
    assert_eq!(encode_all(&[&t])?, "renamed_foo,Bar,Baz\na,b,d\n");
    Ok(())
}

#[test]
fn empty_first_record_locks_output() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Hidden {
        ignored: String,
        unexported: String,
    }
    impl_record!(Hidden { ignored => "-" });

    #[derive(Debug, Default)]
    struct Exported {
        exported: String,
    }
    impl_record!(Exported { exported => "Exported" });

    let hidden = Hidden { ignored: "you".into(), unexported: "won't".into() };
    let shown = Exported { exported: "see".into() };
    assert_eq!(encode_all(&[&hidden, &shown, &shown])?, "");

    let empty: HashMap<String, Value> = HashMap::new();
    let mut one = HashMap::new();
    one.insert("foo".to_string(), Value::from("a"));
    assert_eq!(encode_all(&[&empty, &one])?, "");
    Ok(())
}

#[test]
fn encodes_non_string_kinds() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Numbers {
        int: isize,
        int64: i64,
        uint64: u64,
        float64: f64,
        flag: bool,
    }
    impl_record!(Numbers {
        int => "Int",
        int64 => "Int64",
        uint64 => "Uint64",
        float64 => "Float64",
        flag => "Bool",
    });

    let n = Numbers {
        int: 123,
        int64: -123456789,
        uint64: 123456789,
        float64: 123.456,
        flag: true,
    };
    assert_eq!(
        encode_all(&[&n])?,
        "Int,Int64,Uint64,Float64,Bool\n123,-123456789,123456789,123.456000,true\n"
    );
    Ok(())
}

#[test]
fn three_field_scenario() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Mixed {
        int: i32,
        float: f64,
        flag: bool,
    }
    impl_record!(Mixed { int => "Int", float => "Float", flag => "Bool" });

    let m = Mixed { int: 123, float: 123.456, flag: true };
    assert_eq!(encode_all(&[&m])?, "Int,Float,Bool\n123,123.456000,true\n");
    Ok(())
}

#[test]
fn disjoint_records_write_only_overlap() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct FooBar {
        foo: String,
        bar: String,
    }
    impl_record!(FooBar { foo => "Foo", bar => "Bar" });

    #[derive(Debug, Default)]
    struct Baz {
        baz: String,
    }
    impl_record!(Baz { baz => "Baz" });

    #[derive(Debug, Default)]
    struct BarBaz {
        bar: String,
        baz: String,
    }
    impl_record!(BarBaz { bar => "Bar", baz => "Baz" });

    let out = encode_all(&[
        &FooBar { foo: "foo".into(), bar: "bar".into() },
        &Baz { baz: "baz".into() },
        &BarBaz { bar: "bar".into(), baz: "baz".into() },
    ])?;
    assert_eq!(out, "Foo,Bar\nfoo,bar\n,bar\n");
    Ok(())
}

#[test]
fn same_column_different_kinds() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct S {
        foo: String,
    }
    impl_record!(S { foo => "Foo" });
    #[derive(Debug, Default)]
    struct I {
        foo: i64,
    }
    impl_record!(I { foo => "Foo" });
    #[derive(Debug, Default)]
    struct B {
        foo: bool,
    }
    impl_record!(B { foo => "Foo" });

    let out = encode_all(&[&S { foo: "foo".into() }, &I { foo: 123 }, &B { foo: true }])?;
    assert_eq!(out, "Foo\nfoo\n123\ntrue\n");
    Ok(())
}

#[test]
fn nil_record_is_a_no_op() -> anyhow::Result<()> {
    let none: Option<Row> = None;
    let out = encode_all(&[&none, &Some(row("a", "b", "c")), &none])?;
    assert_eq!(out, "Foo,Bar,Baz\na,b,c\n");
    Ok(())
}

#[test]
fn encode_options() -> anyhow::Result<()> {
    let rows = [row("a", "b", "c"), row("d", "e", "f")];
    let cases = [
        (
            EncodeOptions { delimiter: Some(b'%'), ..Default::default() },
            "A%B%C\na%b%c\nd%e%f\n",
        ),
        (
            EncodeOptions { skip_header: true, ..Default::default() },
            "a,b,c\nd,e,f\n",
        ),
        (
            EncodeOptions { use_crlf: true, ..Default::default() },
            "A,B,C\r\na,b,c\r\nd,e,f\r\n",
        ),
    ];

    #[derive(Debug, Default)]
    struct Abc {
        a: String,
        b: String,
        c: String,
    }
    impl_record!(Abc { a => "A", b => "B", c => "C" });

    for (opts, want) in cases {
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf).opts(opts.clone());
        for r in &rows {
            e.encode_next(&Abc { a: r.foo.clone(), b: r.bar.clone(), c: r.baz.clone() })?;
        }
        drop(e);
        assert_eq!(String::from_utf8(buf)?, want, "options {opts:?}");
    }
    Ok(())
}

#[test]
fn options_after_first_row_are_ignored() -> anyhow::Result<()> {
    let mut e = Encoder::new(Vec::new());
    e.encode_next(&row("a", "b", "c"))?;
    let mut e = e.opts(EncodeOptions { delimiter: Some(b';'), ..Default::default() });
    e.encode_next(&row("d", "e", "f"))?;
    let out = String::from_utf8(e.into_inner()?)?;
    assert_eq!(out, "Foo,Bar,Baz\na,b,c\nd,e,f\n");
    Ok(())
}

#[test]
fn encodes_maps_with_sorted_columns() -> anyhow::Result<()> {
    let first: HashMap<String, Value> = [
        ("foo".to_string(), Value::from("a")),
        ("bar".to_string(), Value::from(true)),
        ("baz".to_string(), Value::from(1.23)),
    ]
    .into_iter()
    .collect();
    let second: HashMap<String, Value> = [
        ("foo".to_string(), Value::from("b")),
        ("bar".to_string(), Value::from(false)),
        ("baz".to_string(), Value::from(4.56)),
    ]
    .into_iter()
    .collect();
    assert_eq!(encode_all(&[&first, &second])?, "bar,baz,foo\ntrue,1.23,a\nfalse,4.56,b\n");

    let mut a = BTreeMap::new();
    a.insert("foo".to_string(), Value::from("a"));
    let mut b = BTreeMap::new();
    b.insert("bar".to_string(), Value::from("b"));
    assert_eq!(encode_all(&[&a, &b])?, "foo\na\n");
    Ok(())
}

#[test]
fn single_empty_cell_is_quoted_by_the_writer() -> anyhow::Result<()> {
    let mut a = BTreeMap::new();
    a.insert("foo".to_string(), Value::from(""));
    let mut b = BTreeMap::new();
    b.insert("foo".to_string(), Value::from(true));
    assert_eq!(encode_all(&[&a, &b])?, "foo\n\"\"\ntrue\n");
    Ok(())
}

#[test]
fn record_then_compatible_map() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct S {
        foo: String,
        bar: String,
    }
    impl_record!(S { foo => "foo", bar => "Bar" });

    let mut m = HashMap::new();
    m.insert("foo".to_string(), Value::from("c"));
    m.insert("Bar".to_string(), Value::from("d"));
    let out = encode_all(&[&S { foo: "a".into(), bar: "b".into() }, &m])?;
    assert_eq!(out, "foo,Bar\na,b\nc,d\n");
    Ok(())
}

#[test]
fn non_text_map_keys_are_rejected() {
    let mut m: HashMap<u32, Value> = HashMap::new();
    m.insert(1, Value::from("x"));
    let mut e = Encoder::new(Vec::new());
    assert!(matches!(
        e.encode_next(&m),
        Err(CsvRecordError::KeyType(Kind::Unsigned))
    ));
}

#[test]
fn custom_text_capability_and_optionals() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Host {
        addr: Option<IpAddr>,
        v4: Option<Ipv4Addr>,
        note: Option<String>,
    }
    impl_record!(Host { addr => "N", v4 => "V4,omitempty", note => "Note" });

    let h = Host {
        addr: Some(IpAddr::V4(Ipv4Addr::new(128, 0, 0, 1))),
        v4: None,
        note: None,
    };
    assert_eq!(encode_all(&[&h])?, "N,V4,Note\n128.0.0.1,,\n");
    Ok(())
}

#[test]
fn unsupported_kind_fails_the_call() {
    #[derive(Debug, Default)]
    struct Listy {
        name: String,
        items: Vec<u8>,
    }
    impl_record!(Listy { name => "Name", items => "Items" });

    let mut e = Encoder::new(Vec::new());
    let err = e
        .encode_next(&Listy { name: "x".into(), items: vec![1] })
        .unwrap_err();
    assert!(err.is_type_error());
    assert!(err.to_string().contains("Items"), "{err}");
}

#[test]
fn options_after_a_failed_first_record_are_ignored() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Listy {
        name: String,
        items: Vec<u8>,
    }
    impl_record!(Listy { name => "Name", items => "Items" });

    #[derive(Debug, Default)]
    struct Named {
        name: String,
    }
    impl_record!(Named { name => "Name" });

    let mut e = Encoder::new(Vec::new()).opts(EncodeOptions {
        skip_header: true,
        ..Default::default()
    });
    assert!(e.encode_next(&Listy { name: "x".into(), items: vec![1] }).is_err());
    assert_eq!(
        e.header().map(|h| h.columns().to_vec()),
        Some(vec!["Name".to_string(), "Items".to_string()])
    );

    let mut e = e.opts(EncodeOptions { delimiter: Some(b';'), ..Default::default() });
    e.encode_next(&Named { name: "y".into() })?;
    assert_eq!(String::from_utf8(e.into_inner()?)?, "y,\n");
    Ok(())
}
