// ── Tag filter compilation ──
//
// Config tag filters look like `Name` or `Env,prod,staging`. Each one
// becomes a `tag:<key>` filter on the DescribeInstances request.

use serde::Serialize;

/// Name prefix the EC2 API uses for tag filters.
pub const TAG_FILTER_PREFIX: &str = "tag:";

/// Separates the key from its values. Not a valid tag character in EC2.
pub const FILTER_SEPARATOR: char = ',';

/// Value that matches any tag value.
pub const WILDCARD: &str = "*";

/// A single `DescribeInstances` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

/// Ordered filters sent with every page request.
///
/// Only ever produced by [`compile_tag_filters`]; absence of filtering is
/// expressed as `Option::<FilterSet>::None`, never as an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Filter] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Compile config tag filter expressions into request filters.
///
/// Returns `None` when no expressions are given, which keeps the default
/// behaviour of querying every instance. Blank expressions are skipped.
/// Keys and values are passed through verbatim; the EC2 API rejects
/// anything malformed.
pub fn compile_tag_filters<S: AsRef<str>>(expressions: &[S]) -> Option<FilterSet> {
    if expressions.is_empty() {
        return None;
    }

    let filters = expressions
        .iter()
        .map(AsRef::as_ref)
        .filter(|expr| !expr.trim().is_empty())
        .map(tag_filter)
        .collect();

    Some(FilterSet(filters))
}

fn tag_filter(expression: &str) -> Filter {
    let mut parts = expression.split(FILTER_SEPARATOR);
    let key = parts.next().unwrap_or_default();
    let mut values: Vec<String> = parts.map(str::to_owned).collect();

    if values.is_empty() {
        values.push(WILDCARD.to_owned());
    }

    Filter {
        name: format!("{TAG_FILTER_PREFIX}{key}"),
        values,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_expressions_means_no_filtering() {
        let empty: [&str; 0] = [];
        assert_eq!(compile_tag_filters(&empty), None);
    }

    #[test]
    fn key_only_matches_any_value() {
        let set = compile_tag_filters(&["Name"]).unwrap();
        assert_eq!(
            set.as_slice(),
            &[Filter {
                name: "tag:Name".into(),
                values: vec!["*".into()],
            }]
        );
    }

    #[test]
    fn values_keep_order_and_duplicates() {
        let set = compile_tag_filters(&["Name,web,api", "Env,prod,prod"]).unwrap();
        let filters = set.as_slice();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].name, "tag:Name");
        assert_eq!(filters[0].values, vec!["web", "api"]);
        assert_eq!(filters[1].values, vec!["prod", "prod"]);
    }

    #[test]
    fn blank_expressions_are_skipped() {
        let set = compile_tag_filters(&["", "  ", "Role,db"]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].name, "tag:Role");
    }

    #[test]
    fn only_blank_expressions_yield_present_but_empty_set() {
        let set = compile_tag_filters(&[""]);
        assert_eq!(set, Some(FilterSet::default()));
    }

    #[test]
    fn malformed_input_passes_through() {
        let set = compile_tag_filters(&["a b,,x"]).unwrap();
        assert_eq!(set.as_slice()[0].name, "tag:a b");
        assert_eq!(set.as_slice()[0].values, vec!["", "x"]);
    }

    #[test]
    fn serializes_like_the_api_request() {
        let set = compile_tag_filters(&["Name,web"]).unwrap();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"[{"Name":"tag:Name","Values":["web"]}]"#
        );
    }
}
