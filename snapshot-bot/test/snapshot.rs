use std::io::{Read, Write};
use std::net::TcpListener;

use chrono::NaiveDate;

use snapshot_bot::automation::snapshot::{
    run_snapshot, MailRelayDelivery, PageCapture, RenderServiceCapture, SnapshotError,
};

/// Serve exactly one HTTP response on a random local port. Returns the
/// endpoint URL to point an adapter at.
fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind one-shot listener");
    let addr = listener.local_addr().expect("listener addr");

    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf);
            let header = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn capture_adapter_returns_rendered_bytes() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let endpoint = serve_once("200 OK", png.clone());

    let capture = RenderServiceCapture::new(endpoint).expect("capture adapter");
    let bytes = capture
        .capture("https://earnings-three.vercel.app/")
        .await
        .expect("capture");

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn capture_adapter_surfaces_render_failures() {
    let endpoint = serve_once("500 Internal Server Error", b"render crashed".to_vec());

    let capture = RenderServiceCapture::new(endpoint).expect("capture adapter");
    let err = capture
        .capture("https://earnings-three.vercel.app/")
        .await
        .unwrap_err();

    assert!(matches!(err, SnapshotError::Capture { status: 500 }));
}

#[tokio::test]
async fn full_pass_delivers_through_the_relay() {
    let png = vec![0x89, b'P', b'N', b'G'];
    let render_endpoint = serve_once("200 OK", png);
    let relay_endpoint = serve_once("204 No Content", Vec::new());

    let capture = RenderServiceCapture::new(render_endpoint).expect("capture adapter");
    let delivery = MailRelayDelivery::new(relay_endpoint).expect("delivery adapter");
    let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();

    run_snapshot(
        &capture,
        &delivery,
        "https://earnings-three.vercel.app/",
        "team@example.com",
        None,
        today,
    )
    .await
    .expect("full snapshot pass");
}

#[tokio::test]
async fn relay_failure_surfaces_with_status() {
    let render_endpoint = serve_once("200 OK", vec![1, 2, 3]);
    let relay_endpoint = serve_once("503 Service Unavailable", Vec::new());

    let capture = RenderServiceCapture::new(render_endpoint).expect("capture adapter");
    let delivery = MailRelayDelivery::new(relay_endpoint).expect("delivery adapter");
    let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();

    let err = run_snapshot(
        &capture,
        &delivery,
        "https://earnings-three.vercel.app/",
        "team@example.com",
        None,
        today,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SnapshotError::Delivery { status: 503 }));
}
