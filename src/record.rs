//! Record shapes: the named, typed fields a struct exposes to mapping.
use crate::coerce::Cell;

/// One mappable field and its alias metadata.
///
/// Aliases follow the usual tag syntax: `"name"` renames, `"name,omitempty"`
/// renames and maps blank cells to an unset optional, `"-"` excludes the
/// field from mapping in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    ident: &'static str,
    name: String,
    omit_empty: bool,
    excluded: bool,
}

impl FieldDecl {
    pub fn parse(ident: &'static str, tag: &str) -> Self {
        let mut parts = tag.split(',');
        let alias = parts.next().unwrap_or_default();
        let omit_empty = parts.any(|p| p == "omitempty");
        let excluded = alias == "-";
        let name = if alias.is_empty() { ident } else { alias };
        Self {
            ident,
            name: name.to_string(),
            omit_empty,
            excluded,
        }
    }

    /// Declared Rust field name.
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// External column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }
}

/// Field declarations of a record type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    fields: Vec<FieldDecl>,
}

impl Shape {
    /// Builds a shape from `(ident, tag)` pairs; an empty tag keeps the ident.
    pub fn new(decls: &[(&'static str, &str)]) -> Self {
        Self {
            fields: decls
                .iter()
                .map(|&(ident, tag)| FieldDecl::parse(ident, tag))
                .collect(),
        }
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Column names this shape produces when it defines a stream's layout.
    pub fn columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| !f.excluded)
            .map(|f| f.name.clone())
            .collect()
    }
}

/// A struct whose fields map to CSV columns.
///
/// `cells` and `cells_mut` return the fields in the same order as
/// [`Record::shape`]. Usually implemented with [`impl_record!`](crate::impl_record).
pub trait Record {
    fn shape() -> &'static Shape;

    fn cells(&self) -> Vec<&dyn Cell>;

    fn cells_mut(&mut self) -> Vec<&mut dyn Cell>;
}

#[doc(hidden)]
pub fn tag_or_empty(tags: &[&'static str]) -> &'static str {
    tags.first().copied().unwrap_or_default()
}

/// Implements [`Record`], [`DecodeTarget`](crate::DecodeTarget) and
/// [`EncodeSource`](crate::EncodeSource) for a struct.
///
/// Fields are listed in column order, each optionally followed by `=> "tag"`.
/// Fields left out of the list are invisible to mapping.
///
/// ```
/// use csv_records::impl_record;
///
/// #[derive(Debug, Default)]
/// struct Row {
///     id: u64,
///     name: String,
///     note: Option<String>,
///     cache: Vec<u8>,
/// }
///
/// impl_record!(Row {
///     id => "ID",
///     name,
///     note => "note,omitempty",
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident $(=> $tag:literal)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn shape() -> &'static $crate::Shape {
                static SHAPE: ::std::sync::OnceLock<$crate::Shape> = ::std::sync::OnceLock::new();
                SHAPE.get_or_init(|| {
                    $crate::Shape::new(&[
                        $((stringify!($field), $crate::__tag_or_empty(&[$($tag)?]))),*
                    ])
                })
            }

            fn cells(&self) -> ::std::vec::Vec<&dyn $crate::Cell> {
                ::std::vec![$(&self.$field as &dyn $crate::Cell),*]
            }

            fn cells_mut(&mut self) -> ::std::vec::Vec<&mut dyn $crate::Cell> {
                ::std::vec![$(&mut self.$field as &mut dyn $crate::Cell),*]
            }
        }

        impl $crate::DecodeTarget for $ty {
            fn populate(
                &mut self,
                header: &$crate::HeaderIndex,
                row: &$crate::Row<'_>,
            ) -> $crate::CsvResult<()> {
                $crate::decode_record(self, header, row)
            }
        }

        impl $crate::EncodeSource for $ty {
            fn columns(&self) -> $crate::CsvResult<::std::vec::Vec<::std::string::String>> {
                Ok(<$ty as $crate::Record>::shape().columns())
            }

            fn project(
                &self,
                header: &$crate::HeaderIndex,
                row: &mut [::std::string::String],
            ) -> $crate::CsvResult<bool> {
                $crate::encode_record(self, header, row)
            }
        }
    };
}
