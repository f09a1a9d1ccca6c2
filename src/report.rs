use std::io::Write;

use crate::catalog::Catalog;
use crate::cli::ListArgs;
use crate::filter::FilterSet;
use crate::query::{self, Column, Justify, QuerySession, Row, RowSink, SortSpec};

/// Fixed-width text table for stdout.
pub struct TextTable<W: Write> {
    out: W,
    columns: Vec<Column>,
}

impl<W: Write> TextTable<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            columns: Vec::new(),
        }
    }

    fn line(&mut self, cells: &[&str]) -> std::io::Result<()> {
        let mut line = String::new();
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            let cell = cells.get(i).copied().unwrap_or("");
            let last = i + 1 == self.columns.len();
            match col.justify {
                Justify::Right => line.push_str(&format!("{cell:>width$}", width = col.width)),
                // No trailing padding on the last column.
                Justify::Left if last => line.push_str(cell),
                Justify::Left => line.push_str(&format!("{cell:<width$}", width = col.width)),
            }
        }
        writeln!(self.out, "{line}")
    }

    fn write_header(&mut self) -> std::io::Result<()> {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        self.line(&names)?;
        let rules: Vec<String> = self.columns.iter().map(|c| "-".repeat(c.width)).collect();
        let rules: Vec<&str> = rules.iter().map(String::as_str).collect();
        self.line(&rules)
    }
}

impl<W: Write> RowSink for TextTable<W> {
    fn set_columns(&mut self, columns: &[Column]) {
        self.columns = columns.to_vec();
    }

    fn replace_rows(&mut self, rows: Vec<Row>) {
        let result = self.write_header().and_then(|()| {
            for row in &rows {
                let cells: Vec<&str> = row.iter().map(String::as_str).collect();
                self.line(&cells)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            log::warn!("Failed to write table: {e}");
        }
    }
}

/// Print the catalog filtered and sorted per `args`. Omitted pack or type
/// options select every value of that dimension.
pub fn list(catalog: &Catalog, args: ListArgs) -> anyhow::Result<()> {
    let mut filters = FilterSet::new();
    if args.packs.is_empty() {
        filters.add_pack(catalog.distinct_packs());
    } else {
        filters.add_pack(args.packs);
    }
    if args.types.is_empty() {
        filters.add_type(catalog.distinct_types(None));
    } else {
        filters.add_type(args.types);
    }

    log::debug!("Listing packs {:?} types {:?}", filters.packs(), filters.types());
    let mut session = QuerySession::new(catalog);
    session.set_filters(filters);
    session.set_sort(SortSpec::new(args.sort));
    session.set_search(args.search);

    let stdout = std::io::stdout();
    let mut table = TextTable::new(stdout.lock());
    table.set_columns(&query::columns(catalog));
    session.publish(&mut table);
    eprintln!("{} of {} presets", session.results().len(), catalog.len());
    Ok(())
}

pub fn duplicates(catalog: &Catalog) -> anyhow::Result<()> {
    let groups = catalog.duplicate_addresses();
    println!("=== Shared bank/program addresses ===");
    if groups.is_empty() {
        println!("  (none)");
    }
    for ((cc0, pgm), presets) in &groups {
        println!("  cc0={cc0} pgm={pgm}");
        for p in presets {
            println!("          {} / {} / {}", p.pack, p.kind, p.name);
        }
    }
    Ok(())
}
