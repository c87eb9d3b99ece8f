use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use serde::Serialize;
use url::Url;

use yamdb_model::{Page, PageRequest};

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult, INVALID_PAGE};

pub const PAGE_PARAM: &str = "page";

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Page selection parsed from `?page=` plus the absolute request URL used to
/// build the neighbour links.
///
/// A malformed page number is remembered rather than rejected so that
/// permission checks in the service still run first.
#[derive(Debug, Clone)]
pub struct Pager {
    page: Option<u32>,
    page_size: u32,
    url: Option<Url>,
}

impl Pager {
    pub fn new(raw_page: Option<&str>, page_size: u32, url: Option<Url>) -> Self {
        let page = match raw_page {
            None => Some(1),
            Some(raw) => raw.trim().parse::<u32>().ok().filter(|page| *page >= 1),
        };
        Self {
            page,
            page_size,
            url,
        }
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.page_size)
    }

    /// Wraps one page of results, or fails with 404 when the requested page
    /// was malformed or lies past the end.
    pub fn respond<T, U>(&self, page: Page<T>, f: impl FnMut(T) -> U) -> AppResult<Paginated<U>> {
        let request = self.request();
        if self.page.is_none() || !page.is_in_range(&request) {
            return Err(AppError::not_found(INVALID_PAGE));
        }

        let next = page
            .has_next(&request)
            .then(|| self.link(request.page + 1))
            .flatten();
        let previous = (request.page > 1)
            .then(|| self.link(request.page - 1))
            .flatten();
        let page = page.map(f);

        Ok(Paginated {
            count: page.count,
            next,
            previous,
            results: page.items,
        })
    }

    /// The current URL with `page` replaced; the first page drops the
    /// parameter entirely.
    fn link(&self, page: u32) -> Option<String> {
        let mut url = self.url.clone()?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != PAGE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.set_query(None);
        if !kept.is_empty() || page > 1 {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            if page > 1 {
                pairs.append_pair(PAGE_PARAM, &page.to_string());
            }
        }
        Some(url.to_string())
    }
}

impl FromRequestParts<AppState> for Pager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());

        let raw_page = uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == PAGE_PARAM)
                .map(|(_, value)| value.into_owned())
        });

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|authority| authority.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("http");
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = Url::parse(&format!("{scheme}://{host}{path_and_query}")).ok();

        Ok(Pager::new(raw_page.as_deref(), state.page_size(), url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pager(raw: Option<&str>, url: &str) -> Pager {
        Pager::new(raw, 10, Url::parse(url).ok())
    }

    fn numbers(count: u32, request: PageRequest) -> Page<u32> {
        let items: Vec<u32> = (1..=count).collect();
        request.slice(&items)
    }

    #[test]
    fn first_page_links_forward_only() {
        let pager = pager(None, "http://testserver/api/v1/genres/?search=dra");
        let body = pager
            .respond(numbers(25, pager.request()), |n| n)
            .unwrap();
        assert_eq!(body.count, 25);
        assert_eq!(body.results.len(), 10);
        assert_eq!(
            body.next.as_deref(),
            Some("http://testserver/api/v1/genres/?search=dra&page=2")
        );
        assert!(body.previous.is_none());
    }

    #[test]
    fn previous_of_second_page_drops_the_parameter() {
        let pager = pager(Some("2"), "http://testserver/api/v1/genres/?page=2");
        let body = pager
            .respond(numbers(15, pager.request()), |n| n)
            .unwrap();
        assert_eq!(body.previous.as_deref(), Some("http://testserver/api/v1/genres/"));
        assert!(body.next.is_none());
        assert_eq!(body.results, vec![11, 12, 13, 14, 15]);
    }

    #[test]
    fn malformed_or_out_of_range_pages_are_not_found() {
        for raw in ["abc", "0", "-1"] {
            let pager = pager(Some(raw), "http://testserver/api/v1/titles/");
            let err = pager
                .respond(numbers(3, pager.request()), |n| n)
                .unwrap_err();
            assert_eq!(err.detail, INVALID_PAGE);
        }

        let pager = pager(Some("5"), "http://testserver/api/v1/titles/?page=5");
        assert!(pager.respond(numbers(3, pager.request()), |n| n).is_err());
    }

    #[test]
    fn empty_first_page_is_valid() {
        let pager = pager(None, "http://testserver/api/v1/titles/");
        let body = pager
            .respond(numbers(0, pager.request()), |n| n)
            .unwrap();
        assert_eq!(body.count, 0);
        assert!(body.results.is_empty());
    }
}
