use std::collections::HashMap;

/// Column layout of one stream: ordered names plus a name -> position index.
///
/// Built once, from the header row on decode or from the first record's
/// columns on encode, and never mutated afterwards. When a name repeats, the
/// later position wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIndex {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            positions.insert(name.clone(), idx);
        }
        Self { columns, positions }
    }

    /// Column names in stream order, duplicates included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Distinct names with the position each one resolves to.
    pub fn positions(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.positions.iter().map(|(name, &idx)| (name.as_str(), idx))
    }
}

/// Cells of the row being decoded.
///
/// A row may be shorter than the header; reading past its end yields `""`.
#[derive(Debug, Clone, Default)]
pub struct Row<'a> {
    cells: Vec<&'a str>,
}

impl<'a> Row<'a> {
    pub fn new<I>(cells: I, trim_leading_space: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells = cells
            .into_iter()
            .map(|c| if trim_leading_space { c.trim_start() } else { c })
            .collect();
        Self { cells }
    }

    pub fn get(&self, position: usize) -> &'a str {
        self.cells.get(position).copied().unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.cells.iter().copied()
    }
}
