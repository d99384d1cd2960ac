// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 报文解析器的性质测试：任意输入都不能导致 panic，合法输入必须被正确解析。

use bytes::Bytes;
use oneshot_http::{HttpRequestMethod, Request, Response};
use proptest::prelude::*;

fn method_strategy() -> impl Strategy<Value = HttpRequestMethod> {
    prop_oneof![
        Just(HttpRequestMethod::Get),
        Just(HttpRequestMethod::Head),
        Just(HttpRequestMethod::Post),
        Just(HttpRequestMethod::Put),
        Just(HttpRequestMethod::Delete),
        Just(HttpRequestMethod::Options),
    ]
}

proptest! {
    #[test]
    fn request_parser_never_panics(buffer in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = Request::try_from(&buffer, 0);
    }

    #[test]
    fn response_parser_never_panics(buffer in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = Response::try_from(&buffer);
    }

    #[test]
    fn request_parser_never_panics_on_http_like_text(
        line in "[A-Z]{0,8} /[ -~]{0,32} HTTP/1\\.[0-9]",
        header in "[ -~]{0,40}",
    ) {
        let raw = format!("{}\r\n{}\r\n\r\n", line, header);
        let _ = Request::try_from(raw.as_bytes(), 0);
    }

    #[test]
    fn built_request_is_parsed_back(
        method in method_strategy(),
        path in "/[a-z0-9/_-]{0,24}",
        value in "[a-zA-Z0-9 ]{0,24}",
        body in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let request = Request::new(method, &path)
            .with_header("X-Value", value.trim())
            .with_body(Bytes::from(body.clone()));

        let parsed = Request::try_from(&request.as_bytes(), 0).unwrap();

        prop_assert_eq!(parsed.method(), method);
        prop_assert_eq!(parsed.path(), path.as_str());
        prop_assert_eq!(parsed.header("x-value"), Some(value.trim()));
        prop_assert_eq!(parsed.body().as_ref(), body.as_slice());
    }

    #[test]
    fn built_response_is_parsed_back(
        code in 200u16..600,
        content in "[ -~]{0,128}",
    ) {
        let mut response = Response::new();
        response.set_status(code).set_content(content.clone(), "text/plain");

        let parsed = Response::try_from(&response.as_bytes()).unwrap();

        prop_assert_eq!(parsed.status_code(), code);
        prop_assert_eq!(parsed.text(), content);
        prop_assert_eq!(parsed.content_type(), Some("text/plain"));
    }
}
