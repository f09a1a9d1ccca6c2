use std::cmp::Ordering;

use crate::catalog::{Catalog, Field, Preset};
use crate::checkbox::SelectionChanged;
use crate::filter::{Dimension, FilterSet};

/// One tie-break rule of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(field: Field) -> Self {
        Self { field, ascending: true }
    }

    pub fn desc(field: Field) -> Self {
        Self { field, ascending: false }
    }
}

/// Parses `field`, `field:asc` or `field:desc`.
impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, dir) = s.split_once(':').unwrap_or((s, "asc"));
        let field = name.parse()?;
        match dir.to_ascii_lowercase().as_str() {
            "asc" | "a" | "up" => Ok(SortKey::asc(field)),
            "desc" | "d" | "down" => Ok(SortKey::desc(field)),
            other => Err(format!("unknown sort direction '{other}' (expected asc or desc)")),
        }
    }
}

/// Ordered sort keys, most significant first. Empty keeps catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Direction of `field` if it takes part in the sort.
    pub fn direction_of(&self, field: Field) -> Option<bool> {
        self.keys.iter().find(|k| k.field == field).map(|k| k.ascending)
    }

    /// Header-click behaviour: flip the primary key, or promote another
    /// field to primary ascending and keep the rest as tie-breakers.
    pub fn toggle(&mut self, field: Field) {
        if let Some(first) = self.keys.first_mut()
            && first.field == field
        {
            first.ascending = !first.ascending;
            return;
        }
        self.keys.retain(|k| k.field != field);
        self.keys.insert(0, SortKey::asc(field));
    }

    pub fn compare(&self, a: &Preset, b: &Preset) -> Ordering {
        for key in &self.keys {
            let ord = compare_field(key.field, a, b);
            if ord != Ordering::Equal {
                return if key.ascending { ord } else { ord.reverse() };
            }
        }
        Ordering::Equal
    }
}

fn compare_field(field: Field, a: &Preset, b: &Preset) -> Ordering {
    match field {
        Field::Pack => a.pack.cmp(&b.pack),
        Field::Type => a.kind.cmp(&b.kind),
        Field::Cc0 => a.cc0.cmp(&b.cc0),
        Field::Pgm => a.pgm.cmp(&b.pgm),
        Field::Name => a.name.cmp(&b.name),
        Field::Characters => a.characters.cmp(&b.characters),
    }
}

/// Filter and sort the catalog.
///
/// Nothing is returned until both filter dimensions have a selection.
/// The sort is stable, so full ties keep catalog order.
pub fn evaluate<'c>(catalog: &'c Catalog, filters: &FilterSet, sort: &SortSpec) -> Vec<&'c Preset> {
    if !filters.is_active() {
        return Vec::new();
    }
    let mut result: Vec<&Preset> = catalog
        .presets()
        .iter()
        .filter(|p| filters.has_pack(&p.pack) && filters.has_type(&p.kind))
        .collect();
    if !sort.is_empty() {
        result.sort_by(|a, b| sort.compare(a, b));
    }
    result
}

/// A preset flattened to display strings, one per `Field`.
pub type Row = [String; Field::COUNT];

pub fn to_row(preset: &Preset) -> Row {
    Field::ALL.map(|f| f.render(preset))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: Field,
    pub name: &'static str,
    pub justify: Justify,
    pub width: usize,
}

/// Column layout for the catalog: numbers right-aligned, each column as
/// wide as its header or its widest value.
pub fn columns(catalog: &Catalog) -> Vec<Column> {
    let widths = catalog.max_field_widths();
    Field::ALL
        .iter()
        .map(|&field| Column {
            field,
            name: field.name(),
            justify: if field.is_numeric() {
                Justify::Right
            } else {
                Justify::Left
            },
            width: widths[field.index()].max(field.name().len()),
        })
        .collect()
}

/// Receiver of query output.
pub trait RowSink {
    fn set_columns(&mut self, columns: &[Column]);
    fn replace_rows(&mut self, rows: Vec<Row>);
}

/// Filters, sort order and search term for one browsing session.
pub struct QuerySession<'c> {
    catalog: &'c Catalog,
    filters: FilterSet,
    sort: SortSpec,
    search: Option<String>,
    results: Vec<&'c Preset>,
}

impl<'c> QuerySession<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            filters: FilterSet::new(),
            sort: SortSpec::default(),
            search: None,
            results: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn results(&self) -> &[&'c Preset] {
        &self.results
    }

    pub fn rows(&self) -> Vec<Row> {
        self.results.iter().map(|p| to_row(p)).collect()
    }

    pub fn apply_selection(&mut self, dimension: Dimension, change: &SelectionChanged) {
        log::debug!("{} filter -> {:?}", dimension.label(), change.labels);
        self.filters.replace(dimension, change.labels.clone());
        self.refresh();
    }

    pub fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.refresh();
    }

    pub fn toggle_sort(&mut self, field: Field) {
        self.sort.toggle(field);
        self.refresh();
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
        self.refresh();
    }

    pub fn set_search(&mut self, term: Option<String>) {
        self.search = term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.refresh();
    }

    /// Recompute the materialized result.
    pub fn refresh(&mut self) {
        let mut results = evaluate(self.catalog, &self.filters, &self.sort);
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            results.retain(|p| matches_search(p, &term));
        }
        self.results = results;
    }

    /// Hand the current rows to a display.
    pub fn publish(&self, sink: &mut dyn RowSink) {
        sink.replace_rows(self.rows());
    }
}

fn matches_search(preset: &Preset, lowered_term: &str) -> bool {
    preset.name.to_lowercase().contains(lowered_term)
        || preset
            .characters
            .iter()
            .any(|c| c.to_lowercase().contains(lowered_term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::preset;

    fn aerials_glow() -> Catalog {
        Catalog::from_presets(vec![
            preset("factory", "keys", 30, 4, "aerials"),
            preset("factory", "pads", 31, 1, "glow"),
        ])
    }

    fn filters(packs: &[&str], types: &[&str]) -> FilterSet {
        let mut f = FilterSet::new();
        f.add_pack(packs.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        f.add_type(types.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        f
    }

    fn names(result: &[&Preset]) -> Vec<String> {
        result.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn empty_dimension_yields_nothing() {
        let catalog = aerials_glow();
        let sort = SortSpec::default();
        assert!(evaluate(&catalog, &filters(&[], &["keys"]), &sort).is_empty());
        assert!(evaluate(&catalog, &filters(&["factory"], &[]), &sort).is_empty());
        assert!(evaluate(&catalog, &FilterSet::new(), &sort).is_empty());
    }

    #[test]
    fn single_type_filter() {
        let catalog = aerials_glow();
        let result = evaluate(&catalog, &filters(&["factory"], &["keys"]), &SortSpec::default());
        assert_eq!(names(&result), vec!["aerials"]);
    }

    #[test]
    fn multiple_types_keep_catalog_order() {
        let catalog = aerials_glow();
        let result = evaluate(
            &catalog,
            &filters(&["factory"], &["pads", "keys"]),
            &SortSpec::default(),
        );
        assert_eq!(names(&result), vec!["aerials", "glow"]);
    }

    #[test]
    fn filter_is_exact() {
        let catalog = Catalog::from_presets(vec![
            preset("factory", "keys", 1, 1, "a"),
            preset("factory", "bass", 1, 2, "b"),
            preset("exp", "keys", 2, 1, "c"),
            preset("exp", "lead", 2, 2, "d"),
            preset("other", "keys", 3, 1, "e"),
        ]);
        let f = filters(&["factory", "exp"], &["keys", "lead"]);
        let result = evaluate(&catalog, &f, &SortSpec::default());
        for p in &result {
            assert!(f.has_pack(&p.pack) && f.has_type(&p.kind));
        }
        let expected: Vec<_> = catalog
            .presets()
            .iter()
            .filter(|p| f.has_pack(&p.pack) && f.has_type(&p.kind))
            .collect();
        assert_eq!(result, expected);
        assert_eq!(names(&result), vec!["a", "c", "d"]);
    }

    #[test]
    fn multi_key_sort_with_descending_secondary() {
        let catalog = Catalog::from_presets(vec![
            preset("factory", "keys", 0, 4, "four"),
            preset("factory", "keys", 0, 10, "ten"),
            preset("factory", "keys", 0, 1, "one"),
        ]);
        let sort = SortSpec::new(vec![SortKey::asc(Field::Pack), SortKey::desc(Field::Pgm)]);
        let result = evaluate(&catalog, &filters(&["factory"], &["keys"]), &sort);
        let pgms: Vec<u8> = result.iter().map(|p| p.pgm).collect();
        assert_eq!(pgms, vec![10, 4, 1]);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let catalog = Catalog::from_presets(vec![
            preset("b", "keys", 5, 1, "first"),
            preset("a", "keys", 9, 2, "second"),
            preset("b", "keys", 5, 3, "third"),
            preset("a", "keys", 9, 4, "fourth"),
        ]);
        let sort = SortSpec::new(vec![SortKey::asc(Field::Cc0)]);
        let result = evaluate(&catalog, &filters(&["a", "b"], &["keys"]), &sort);
        assert_eq!(names(&result), vec!["first", "third", "second", "fourth"]);

        let sort = SortSpec::new(vec![SortKey::desc(Field::Type)]);
        let result = evaluate(&catalog, &filters(&["a", "b"], &["keys"]), &sort);
        assert_eq!(names(&result), vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn characters_sort_lexicographically() {
        let mut a = preset("p", "t", 0, 0, "a");
        a.characters = vec!["warm".into(), "soft".into()];
        let mut b = preset("p", "t", 0, 1, "b");
        b.characters = vec!["warm".into()];
        let mut c = preset("p", "t", 0, 2, "c");
        c.characters = vec!["airy".into()];
        let catalog = Catalog::from_presets(vec![a, b, c]);
        let sort = SortSpec::new(vec![SortKey::asc(Field::Characters)]);
        let result = evaluate(&catalog, &filters(&["p"], &["t"]), &sort);
        assert_eq!(names(&result), vec!["c", "b", "a"]);
    }

    #[test]
    fn toggle_flips_primary_or_promotes() {
        let mut sort = SortSpec::default();
        sort.toggle(Field::Name);
        assert_eq!(sort.keys(), [SortKey::asc(Field::Name)]);
        sort.toggle(Field::Name);
        assert_eq!(sort.keys(), [SortKey::desc(Field::Name)]);
        sort.toggle(Field::Pgm);
        assert_eq!(
            sort.keys(),
            [SortKey::asc(Field::Pgm), SortKey::desc(Field::Name)]
        );
        sort.toggle(Field::Name);
        assert_eq!(
            sort.keys(),
            [SortKey::asc(Field::Name), SortKey::asc(Field::Pgm)]
        );
        assert_eq!(sort.direction_of(Field::Pgm), Some(true));
        assert_eq!(sort.direction_of(Field::Pack), None);
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!("pgm:desc".parse::<SortKey>().unwrap(), SortKey::desc(Field::Pgm));
        assert_eq!("pack".parse::<SortKey>().unwrap(), SortKey::asc(Field::Pack));
        assert!("pack:sideways".parse::<SortKey>().is_err());
        assert!("tempo:asc".parse::<SortKey>().is_err());
    }

    #[test]
    fn rows_join_characters() {
        let mut p = preset("factory", "keys", 30, 4, "aerials");
        p.characters = vec!["bright".into(), "airy".into()];
        let row = to_row(&p);
        assert_eq!(row[Field::Cc0.index()], "30");
        assert_eq!(row[Field::Characters.index()], "bright, airy");
    }

    #[test]
    fn columns_right_align_numbers_and_fit_headers() {
        let catalog = aerials_glow();
        let cols = columns(&catalog);
        assert_eq!(cols.len(), Field::COUNT);
        assert_eq!(cols[Field::Pgm.index()].justify, Justify::Right);
        assert_eq!(cols[Field::Pgm.index()].width, 3);
        assert_eq!(cols[Field::Name.index()].justify, Justify::Left);
        assert_eq!(cols[Field::Name.index()].width, "aerials".len());
        assert_eq!(cols[Field::Characters.index()].width, "characters".len());
    }

    struct Recorder {
        columns: usize,
        batches: Vec<Vec<Row>>,
    }

    impl RowSink for Recorder {
        fn set_columns(&mut self, columns: &[Column]) {
            self.columns = columns.len();
        }

        fn replace_rows(&mut self, rows: Vec<Row>) {
            self.batches.push(rows);
        }
    }

    #[test]
    fn session_applies_selection_events() {
        let catalog = aerials_glow();
        let mut session = QuerySession::new(&catalog);
        let mut display = Recorder { columns: 0, batches: Vec::new() };
        display.set_columns(&columns(&catalog));

        session.apply_selection(
            Dimension::Pack,
            &SelectionChanged { labels: vec!["factory".into()] },
        );
        session.publish(&mut display);
        assert!(session.results().is_empty());

        session.apply_selection(
            Dimension::Type,
            &SelectionChanged { labels: vec!["pads".into()] },
        );
        session.publish(&mut display);
        assert_eq!(names(session.results()), vec!["glow"]);

        session.apply_selection(
            Dimension::Type,
            &SelectionChanged { labels: vec!["keys".into(), "pads".into()] },
        );
        session.toggle_sort(Field::Name);
        session.toggle_sort(Field::Name);
        session.publish(&mut display);

        assert_eq!(display.columns, Field::COUNT);
        assert_eq!(display.batches.len(), 3);
        assert!(display.batches[0].is_empty());
        let last: Vec<_> = display.batches[2]
            .iter()
            .map(|r| r[Field::Name.index()].clone())
            .collect();
        assert_eq!(last, vec!["glow", "aerials"]);
    }

    #[test]
    fn search_matches_name_or_characters() {
        let mut tagged = preset("factory", "keys", 1, 1, "ember");
        tagged.characters = vec!["Glassy".into()];
        let catalog = Catalog::from_presets(vec![
            tagged,
            preset("factory", "keys", 1, 2, "glass harp"),
            preset("factory", "keys", 1, 3, "rhodes"),
        ]);
        let mut session = QuerySession::new(&catalog);
        session.set_filters(filters(&["factory"], &["keys"]));
        assert_eq!(session.results().len(), 3);

        session.set_search(Some("GLASS".into()));
        assert_eq!(names(session.results()), vec!["ember", "glass harp"]);

        session.set_search(Some("   ".into()));
        assert_eq!(session.search(), None);
        assert_eq!(session.results().len(), 3);
    }

    #[test]
    fn search_term_is_trimmed() {
        let catalog = Catalog::from_presets(vec![
            preset("factory", "keys", 1, 2, "glass harp"),
            preset("factory", "keys", 1, 3, "rhodes"),
        ]);
        let mut session = QuerySession::new(&catalog);
        session.set_filters(filters(&["factory"], &["keys"]));

        session.set_search(Some(" glass ".into()));
        assert_eq!(session.search(), Some("glass"));
        assert_eq!(names(session.results()), vec!["glass harp"]);
    }
}
