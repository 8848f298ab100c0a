//! `http::Response` support (feature `http`).

use std::fmt::Debug;

use http_body::Body;

use crate::value::{LogValue, ResponseView};

impl<B> ResponseView for http::Response<B>
where
    B: Body + Debug + Send + Sync + 'static,
{
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn reason(&self) -> &str {
        self.status().canonical_reason().unwrap_or("")
    }

    fn has_body(&self) -> bool {
        !self.body().is_end_stream()
    }
}

impl<B> LogValue for http::Response<B>
where
    B: Body + Debug + Send + Sync + 'static,
{
    fn as_response(&self) -> Option<&dyn ResponseView> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn response(status: u16, body: &str) -> http::Response<String> {
        let mut response = http::Response::new(body.to_string());
        *response.status_mut() = http::StatusCode::from_u16(status).unwrap();
        response
    }

    #[test]
    fn test_response_format() {
        assert_eq!(catalog::response(&response(200, "hello")), "[200-OK,true]");
        assert_eq!(catalog::response(&response(404, "")), "[404-Not Found,false]");
    }

    #[test]
    fn test_unknown_status_has_empty_reason() {
        assert_eq!(catalog::response(&response(599, "")), "[599-,false]");
    }
}
