use contracts::shared::filter_state::FilterState;
use url::Url;

/// Relative links are resolved against this; only the query is kept
const LINK_BASE: &str = "http://localhost/";

/// Query parameters of a link (pagination, sorting) as a `FilterState`.
///
/// Accepts `?page=2`, `/alunos/?page=2&curso=3` or a full URL; the fragment
/// is ignored. Empty values are dropped like any other filter value.
pub fn params_from_href(href: &str) -> FilterState {
    let Ok(url) = Url::parse(LINK_BASE).and_then(|base| base.join(href)) else {
        return FilterState::new();
    };
    url.query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
