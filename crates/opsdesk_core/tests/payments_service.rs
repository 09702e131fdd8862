use chrono::{TimeZone, Utc};
use opsdesk_core::model::payment::{PaymentRecord, PaymentStatus};
use opsdesk_core::payments::parse_payments;
use opsdesk_core::service::payment_service::PaymentService;
use opsdesk_core::{HttpPaymentsSource, PageRequest, PaymentsError, PaymentsSource, SearchTerm};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

const BODY: &str = r#"{"payments": [
    {"id": "pay_1", "bookingId": "b1", "customerName": "Asha Kumar", "amount": 1500, "status": "captured", "method": "upi", "createdAt": "2024-05-03T10:05:00Z"},
    {"id": "pay_2", "booking_id": "b2", "customer_name": "Asha Kumar", "amount": 800, "status": "refunded", "createdAt": "2024-04-15T09:40:00Z"},
    {"id": "pay_3", "bookingId": "b5", "amount": 2000, "status": "pending", "createdAt": "2024-05-12T08:00:00Z"},
    {"id": "pay_4", "bookingId": "b4", "customerName": "Nina", "amount": 900, "status": "paid", "method": "card", "createdAt": "2024-03-20T11:30:00Z"},
    {"id": "pay_5", "amount": 300, "status": "failed"}
]}"#;

fn records() -> Vec<PaymentRecord> {
    parse_payments(BODY).unwrap()
}

/// Serves one HTTP response on a local port and returns the base URL.
fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
    });
    format!("http://{addr}")
}

#[test]
fn list_is_newest_first_and_filterable() {
    let source = records();
    let service = PaymentService::new(&source);

    let page = service
        .list(None, &SearchTerm::default(), PageRequest::default())
        .unwrap();
    let ids = page
        .items
        .iter()
        .map(|record| record.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["pay_3", "pay_1", "pay_2", "pay_4", "pay_5"]);

    let successful = service
        .list(
            Some(&PaymentStatus::Success),
            &SearchTerm::new("asha"),
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(successful.total_items, 1);
    assert_eq!(successful.items[0].booking_id.as_deref(), Some("b1"));
}

#[test]
fn summary_reports_collected_and_monthly_revenue() {
    let source = records();
    let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
    let summary = PaymentService::new(&source).summary(now, 3).unwrap();

    assert_eq!(summary.collected, 2400.0);
    assert_eq!(summary.refunded, 800.0);
    assert_eq!(summary.pending, 2000.0);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.success_rate, 40.0);
    let totals = summary
        .monthly_revenue
        .iter()
        .map(|point| point.total)
        .collect::<Vec<_>>();
    assert_eq!(totals, vec![900.0, 0.0, 1500.0]);
}

#[test]
fn http_source_reads_wrapped_body() {
    let base_url = serve_once("HTTP/1.1 200 OK", BODY);
    let source = HttpPaymentsSource::new(&base_url, Duration::from_secs(5)).unwrap();
    assert!(source.url().ends_with("/api/payments"));

    let fetched = source.fetch_payments().unwrap();
    assert_eq!(fetched.len(), 5);
    assert_eq!(fetched[1].status, PaymentStatus::Refunded);
}

#[test]
fn http_source_reports_error_status() {
    let base_url = serve_once("HTTP/1.1 503 Service Unavailable", "{}");
    let source = HttpPaymentsSource::new(&base_url, Duration::from_secs(5)).unwrap();

    let err = source.fetch_payments().unwrap_err();
    match err {
        PaymentsError::Status { status, url } => {
            assert_eq!(status, 503);
            assert!(url.starts_with(&base_url));
        }
        other => panic!("unexpected error: {other}"),
    }
}
