use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use oneshot_http::{
    request::Request, response::Response, HttpRequestMethod, Registry,
};

fn simple_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET /hi HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: Test\r\n\r\n";

    c.bench_function("simple_request_parse", |b| {
        b.iter(|| {
            let buffer = black_box(request.to_vec());
            let _ = Request::try_from(&buffer, 0).unwrap();
        });
    });
}

fn complex_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET /path/to/resource?id=123&name=test%20value HTTP/1.1\r\n\
                    Host: localhost:8080\r\n\
                    User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
                    Accept: text/html,application/xhtml+xml\r\n\
                    Accept-Language: en-US,en;q=0.9\r\n\
                    Connection: close\r\n\
                    Upgrade-Insecure-Requests: 1\r\n\
                    \r\n";

    c.bench_function("complex_request_parse", |b| {
        b.iter(|| {
            let buffer = black_box(request.to_vec());
            let _ = Request::try_from(&buffer, 0).unwrap();
        });
    });
}

fn request_parse_different_methods_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_methods");

    let requests = [
        ("GET", b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()),
        ("HEAD", b"HEAD / HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()),
        (
            "POST",
            b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\n\r\nhello world".as_slice(),
        ),
        ("OPTIONS", b"OPTIONS / HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()),
    ];

    for (method, request) in requests.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(method), request, |b, request| {
            b.iter(|| {
                let buffer = black_box(request.to_vec());
                let _ = Request::try_from(&buffer, 0).unwrap();
            });
        });
    }

    group.finish();
}

fn request_parse_different_path_lengths_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_path_length");

    let paths = [
        ("short", "/"),
        ("medium", "/path/to/resource"),
        ("long", "/very/long/path/to/some/resource/with/many/segments/and/a/query?param1=value1&param2=value2&param3=value3"),
    ];

    for (name, path) in paths.iter() {
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
        group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
            b.iter(|| {
                let buffer = black_box(request.as_bytes().to_vec());
                let _ = Request::try_from(&buffer, 0).unwrap();
            });
        });
    }

    group.finish();
}

fn dispatch_benchmark(c: &mut Criterion) {
    let mut registry = Registry::new();
    for i in 0..100 {
        registry
            .register(
                HttpRequestMethod::Get,
                &format!("/route/{}", i),
                |_req: &Request, res: &mut Response| {
                    res.set_content("ok", "text/plain");
                },
            )
            .unwrap();
    }

    let mut group = c.benchmark_group("dispatch");
    for (name, path) in [("hit", "/route/42"), ("miss", "/missing")] {
        let request = Request::new(HttpRequestMethod::Get, path);
        group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
            b.iter(|| registry.dispatch(black_box(request), 0));
        });
    }
    group.finish();
}

fn response_serialize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_serialize");

    for size in [0usize, 1024, 64 * 1024] {
        let mut response = Response::new();
        response.set_content(Bytes::from(vec![b'a'; size]), "application/octet-stream");
        group.bench_with_input(BenchmarkId::from_parameter(size), &response, |b, response| {
            b.iter(|| black_box(response.as_bytes()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    simple_request_parse_benchmark,
    complex_request_parse_benchmark,
    request_parse_different_methods_benchmark,
    request_parse_different_path_lengths_benchmark,
    dispatch_benchmark,
    response_serialize_benchmark
);
criterion_main!(benches);
