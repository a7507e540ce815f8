//! End-to-end tests for catalogo-magnet
//!
//! API-mode tests talk to a one-shot HTTP stub on 127.0.0.1 that mimics the
//! two qBittorrent endpoints used here.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use catalogo_core::{CancelToken, HttpConfig, LanguageFilter};
use catalogo_magnet::{
    ApiError, ApiTarget, BatchPolicy, Credentials, Delivery, MagnetConfig, QbitClient,
    ThreadPacer, run, run_with,
};
use tempfile::TempDir;

const CATALOG: &str = "EPL Id,Título,Autor,Revisión,Idioma,Enlace(s)\n\
42,Año,Ana,2,Español,\"AAA, BBB,,CCC\"\n\
43,Plain,Bob,1,Inglés,DDD\n\
44,Empty,Eva,1,Español,\n";

struct Request {
    line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn form(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

fn read_request(stream: &mut TcpStream) -> Request {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).unwrap();
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        let (k, v) = header.split_once(':').unwrap();
        headers.push((k.trim().to_string(), v.trim().to_string()));
    }
    let len = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map_or(0, |(_, v)| v.parse::<usize>().unwrap());
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).unwrap();
    Request {
        line: line.trim_end().to_string(),
        headers,
        body: String::from_utf8(body).unwrap(),
    }
}

/// Serve `connections` requests, answering login with `login_body`.
fn spawn_stub(
    connections: usize,
    login_body: &'static str,
) -> (String, JoinHandle<(Vec<Request>, TcpListener)>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = std::thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let (body, cookie) = if request.line.contains("/api/v2/auth/login") {
                (login_body, "Set-Cookie: SID=stub-session; path=/\r\n")
            } else {
                ("Ok.", "")
            };
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n{cookie}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
            seen.push(request);
        }
        (seen, listener)
    });
    (url, handle)
}

fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("catalog.csv");
    std::fs::write(&path, CATALOG).unwrap();
    path
}

fn api_config(input: PathBuf, url: String, batch_size: usize) -> MagnetConfig {
    MagnetConfig {
        input,
        languages: None,
        delivery: Delivery::Api(ApiTarget {
            url,
            credentials: Credentials {
                username: "admin".to_string(),
                password: "adminadmin".to_string(),
            },
            policy: BatchPolicy {
                batch_size,
                delay: Duration::ZERO,
                long_delay: Duration::ZERO,
                long_pause_every: 10,
            },
            http: HttpConfig {
                connect_timeout: Duration::from_secs(5),
                request_timeout: Duration::from_secs(5),
            },
        }),
    }
}

#[test]
fn text_mode_writes_one_line_per_hash() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("magnets.txt");
    let config = MagnetConfig {
        input: write_catalog(dir.path()),
        languages: None,
        delivery: Delivery::Text {
            output: output.clone(),
        },
    };

    let summary = run(&config, &CancelToken::new()).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.links, 4);
    assert_eq!(summary.magnets, 4);
    assert_eq!(summary.written, Some(4));
    assert!(summary.submitted.is_none());

    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("magnet:?xt=urn:btih:AAA&dn=EPL_[42]_Ano_(r2)&tr="));
    assert!(lines[1].starts_with("magnet:?xt=urn:btih:BBB&"));
    assert!(lines[2].starts_with("magnet:?xt=urn:btih:CCC&"));
    assert!(lines[3].starts_with("magnet:?xt=urn:btih:DDD&dn=EPL_[43]_Plain_(r1)&"));
    assert!(lines.iter().all(|l| l.matches("&tr=").count() == 6));
}

#[test]
fn text_mode_respects_language_filter() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("magnets.txt");
    let config = MagnetConfig {
        input: write_catalog(dir.path()),
        languages: LanguageFilter::new(&["ingles"]),
        delivery: Delivery::Text {
            output: output.clone(),
        },
    };

    let summary = run(&config, &CancelToken::new()).unwrap();
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.magnets, 1);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("magnet:?xt=urn:btih:DDD&"));
}

#[test]
fn api_mode_logs_in_then_posts_batches_with_session_cookie() {
    let dir = TempDir::new().unwrap();
    let (url, stub) = spawn_stub(3, "Ok.");
    let config = api_config(write_catalog(dir.path()), url, 3);

    let summary = run_with(
        &config,
        |target| Ok(QbitClient::new(&target.url, &target.http)?),
        &mut ThreadPacer,
        &CancelToken::new(),
    )
    .unwrap();

    let report = summary.submitted.unwrap();
    assert_eq!(report.batches, 2);
    assert_eq!(report.sent, 4);

    let (requests, _) = stub.join().unwrap();
    assert_eq!(requests.len(), 3);

    assert!(requests[0].line.starts_with("POST /api/v2/auth/login "));
    assert_eq!(requests[0].form("username").as_deref(), Some("admin"));
    assert_eq!(requests[0].form("password").as_deref(), Some("adminadmin"));

    for add in &requests[1..] {
        assert!(add.line.starts_with("POST /api/v2/torrents/add "));
        assert!(add.header("cookie").unwrap_or("").contains("SID=stub-session"));
    }
    let first = requests[1].form("urls").unwrap();
    assert_eq!(first.lines().count(), 3);
    assert!(first.starts_with("magnet:?xt=urn:btih:AAA&dn=EPL_[42]_Ano_(r2)&tr="));
    let second = requests[2].form("urls").unwrap();
    assert!(second.starts_with("magnet:?xt=urn:btih:DDD&"));
}

#[test]
fn api_mode_rejected_login_sends_no_batch() {
    let dir = TempDir::new().unwrap();
    let (url, stub) = spawn_stub(1, "Fails.");
    let config = api_config(write_catalog(dir.path()), url, 400);

    let err = run_with(
        &config,
        |target| Ok(QbitClient::new(&target.url, &target.http)?),
        &mut ThreadPacer,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Auth { .. })
    ));

    let (requests, listener) = stub.join().unwrap();
    assert_eq!(requests.len(), 1);
    listener.set_nonblocking(true).unwrap();
    assert!(listener.accept().is_err(), "no request after failed login");
}
